//! Runtime lifecycle.
//!
//! Startup order: store, wallet, notifiers, reconciliation, presence
//! heartbeat, presence join, election watcher, monitor, HTTP API. Shutdown
//! runs in reverse: leave presence first so another administrator can take
//! over the monitor, then stop the local monitor, server and heartbeat.
//!
//! Administrators elect among themselves through the database they share:
//! presence rows live next to the sessions they manage.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::http::{self, ApiState};
use crate::adapter::outbound::sqlite::{SqlitePresence, SqliteStore};
use crate::application::election::LeaderElection;
use crate::application::monitor::SessionMonitor;
use crate::application::reconcile::Reconciler;
use crate::application::session::{SessionLifecycle, SessionMachine};
use crate::error::Result;
use crate::infrastructure::bootstrap::{
    build_notifier_registry, build_presence, build_wallet, init_database,
};
use crate::infrastructure::config::service::ServerConfig;
use crate::infrastructure::config::settings::Config;
use crate::port::outbound::bets::BetActivityReader;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::notifier::NotifierRegistry;
use crate::port::outbound::partner::PartnerDirectory;
use crate::port::outbound::presence::PresenceChannel;
use crate::port::outbound::store::SessionStore;
use crate::port::outbound::wallet::WalletClient;

/// Fully wired services for one administrator process.
pub struct Services {
    pub lifecycle: Arc<SessionLifecycle>,
    pub election: Arc<LeaderElection>,
    pub store: Arc<dyn SessionStore>,
    monitor: SessionMonitor,
}

impl Services {
    /// Wire the application around `store`, which backs every storage port.
    pub fn wire<S>(
        config: &Config,
        store: Arc<S>,
        wallet: Arc<dyn WalletClient>,
        presence: Arc<dyn PresenceChannel>,
        notifiers: Arc<NotifierRegistry>,
    ) -> Self
    where
        S: SessionStore + BetActivityReader + PartnerDirectory + Ledger + 'static,
    {
        let reconciler = Arc::new(Reconciler::new(
            store.clone(),
            store.clone(),
            wallet,
            store.clone(),
            Arc::clone(&notifiers),
            config.reconciliation.max_hops,
        ));
        let lifecycle = Arc::new(SessionLifecycle::new(
            store.clone(),
            reconciler,
            Arc::clone(&notifiers),
        ));
        let election = Arc::new(LeaderElection::new(config.admin(), presence, notifiers));
        let machine = SessionMachine::new(
            config.monitor.machine(),
            store.clone(),
            store.clone(),
            store.clone(),
        );
        let monitor = SessionMonitor::new(store.clone(), machine, config.monitor.tick());

        Self {
            lifecycle,
            election,
            store,
            monitor,
        }
    }

    /// Join presence, start the monitor and serve until `shutdown` flips to
    /// `true` or its sender is dropped.
    ///
    /// # Errors
    /// Returns an error if presence cannot be joined or the API cannot bind.
    pub async fn run(self, server: &ServerConfig, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let Self {
            lifecycle,
            election,
            store,
            monitor,
        } = self;

        election.join().await?;
        let election_handle = election.start();
        let (monitor_handle, _reports) = monitor.start(election.leadership());
        info!(admin_id = %election.admin_id(), "Administrator online");

        let server_task = if server.enabled {
            let listener = TcpListener::bind(server.addr()?).await?;
            let router = http::router(ApiState {
                lifecycle,
                store,
                election: Arc::clone(&election),
            });
            let mut server_shutdown = shutdown.clone();
            Some(tokio::spawn(http::serve(listener, router, async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })))
        } else {
            None
        };

        let _ = shutdown.wait_for(|stop| *stop).await;
        info!("Shutting down");

        if let Err(e) = election.leave().await {
            warn!(error = %e, "Failed to leave presence channel");
        }
        election_handle.shutdown().await;
        monitor_handle.shutdown().await;
        if let Some(task) = server_task {
            match task.await {
                Ok(Err(e)) => warn!(error = %e, "HTTP API stopped with error"),
                Err(e) => warn!(error = %e, "HTTP API task panicked"),
                Ok(Ok(())) => {}
            }
        }
        Ok(())
    }
}

/// An administrator wired to the production adapters.
pub struct Administrator {
    pub services: Services,
    presence: Arc<SqlitePresence>,
    server: ServerConfig,
    heartbeat: std::time::Duration,
}

impl Administrator {
    /// Open the database and wire every service from `config`.
    ///
    /// # Errors
    /// Returns an error if the database or wallet client cannot be set up.
    pub fn open(config: &Config) -> Result<Self> {
        let pool = init_database(config)?;
        let store = Arc::new(SqliteStore::new(pool.clone()));
        let presence = build_presence(config, pool);
        let wallet = build_wallet(config)?;
        let notifiers = Arc::new(build_notifier_registry(config));
        info!(notifiers = notifiers.len(), "Notifiers initialized");

        let services = Services::wire(config, store, wallet, presence.clone(), notifiers);
        Ok(Self {
            services,
            presence,
            server: config.server.clone(),
            heartbeat: config.presence.heartbeat(),
        })
    }

    /// Heartbeat presence and run the services until `shutdown`.
    ///
    /// # Errors
    /// Returns an error if presence cannot be joined or the API cannot bind.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<()> {
        let heartbeat = self.presence.start(self.heartbeat);
        let result = self.services.run(&self.server, shutdown).await;
        heartbeat.shutdown().await;
        result
    }
}

/// Run with the production adapters until Ctrl-C.
pub async fn run(config: Config) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
        }
        let _ = shutdown_tx.send(true);
    });
    run_with_shutdown(config, shutdown_rx).await
}

/// Run with the production adapters and an externally controlled shutdown.
pub async fn run_with_shutdown(config: Config, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!(admin_id = %config.admin(), "Starting croupier");

    Administrator::open(&config)?.run(shutdown).await?;

    info!("croupier stopped");
    Ok(())
}
