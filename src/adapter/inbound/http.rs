//! Inbound HTTP API.
//!
//! | Method | Path                    | Purpose                          |
//! |--------|-------------------------|----------------------------------|
//! | POST   | `/sessions`             | launch a session in `ready`      |
//! | GET    | `/sessions/:id`         | read a session                   |
//! | POST   | `/sessions/:id/signal`  | close or network-failure signal  |
//! | GET    | `/health`               | liveness and leadership          |

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::application::election::LeaderElection;
use crate::application::session::{CloseOutcome, SessionLifecycle};
use crate::domain::{
    AdminId, CloseReason, GameSession, ProviderType, SessionId, SessionSignal, SessionStatus,
    UserId,
};
use crate::error::{Error, SessionError};
use crate::port::outbound::store::SessionStore;

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub lifecycle: Arc<SessionLifecycle>,
    pub store: Arc<dyn SessionStore>,
    pub election: Arc<LeaderElection>,
}

#[derive(Debug, Deserialize)]
pub struct LaunchRequest {
    pub user_id: UserId,
    pub provider: ProviderType,
}

#[derive(Debug, Deserialize)]
pub struct SignalRequest {
    pub reason: CloseReason,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalOutcome {
    Closed,
    Ignored,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignalResponse {
    pub outcome: SignalOutcome,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub admin_id: AdminId,
    pub is_leader: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps crate errors onto HTTP status codes.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::Session(SessionError::NotFound(_)) => StatusCode::NOT_FOUND,
            Error::Domain(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Build the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/sessions", post(launch))
        .route("/sessions/:id", get(get_session))
        .route("/sessions/:id/signal", post(signal))
        .route("/health", get(health))
        .with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// # Errors
/// Returns an error if the server fails while accepting connections.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> crate::error::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "HTTP API listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn launch(
    State(state): State<ApiState>,
    Json(request): Json<LaunchRequest>,
) -> Result<(StatusCode, Json<GameSession>), ApiError> {
    let session = state
        .lifecycle
        .launch(request.user_id, request.provider)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn get_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<GameSession>, ApiError> {
    let id = SessionId::from(id);
    let found = state.store.get(&id).await?;
    let session = found.ok_or(Error::Session(SessionError::NotFound(id)))?;
    Ok(Json(session))
}

async fn signal(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<SignalRequest>,
) -> Result<Json<SignalResponse>, ApiError> {
    let outcome = state
        .lifecycle
        .signal(SessionSignal {
            session_id: SessionId::from(id),
            reason: request.reason,
        })
        .await?;
    let response = match outcome {
        // Reconciliation continues in the background; the client only needs
        // the terminal status.
        CloseOutcome::Closed { status, .. } => SignalResponse {
            outcome: SignalOutcome::Closed,
            status,
        },
        CloseOutcome::Ignored { status } => SignalResponse {
            outcome: SignalOutcome::Ignored,
            status,
        },
    };
    Ok(Json(response))
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        admin_id: state.election.admin_id().clone(),
        is_leader: state.election.is_leader(),
    })
}
