//! Mock provider wallet.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::ProviderCredential;
use crate::error::ExternalWalletError;
use crate::port::outbound::wallet::WalletClient;

/// A wallet with a queue of scripted responses.
///
/// Each call pops the next response; once the queue is exhausted every call
/// returns the fallback balance.
pub struct ScriptedWallet {
    responses: Mutex<VecDeque<Result<Decimal, ExternalWalletError>>>,
    fallback: Decimal,
    calls: Arc<AtomicU32>,
    requests: Mutex<Vec<(String, String)>>,
}

impl ScriptedWallet {
    pub fn new(fallback: Decimal) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback,
            calls: Arc::new(AtomicU32::new(0)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_responses(self, responses: Vec<Result<Decimal, ExternalWalletError>>) -> Self {
        *self.responses.lock() = responses.into();
        self
    }

    /// A wallet whose every call fails with `error`.
    pub fn failing(error: ExternalWalletError) -> Self {
        let wallet = Self::new(Decimal::ZERO);
        wallet.responses.lock().extend((0..64).map(|_| Err(error.clone())));
        wallet
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(operator_code, username)` of every call so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl WalletClient for ScriptedWallet {
    async fn balance(
        &self,
        credential: &ProviderCredential,
        external_username: &str,
    ) -> Result<Decimal, ExternalWalletError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((
            credential.operator_code.clone(),
            external_username.to_string(),
        ));
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }
}
