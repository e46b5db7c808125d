//! In-memory store implementation.
//!
//! Implements every storage port (sessions, bets, partner directory and
//! ledger) over `parking_lot` maps. Used by tests and by `database =
//! ":memory:"`-style local runs where nothing needs to survive a restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;

use crate::domain::{
    GameSession, PartnerId, ProviderCredential, ProviderType, SessionId, SessionStatus,
    SessionUpdate, UserAccount, UserId,
};
use crate::error::{Error, Result};
use crate::port::outbound::bets::BetActivityReader;
use crate::port::outbound::ledger::Ledger;
use crate::port::outbound::partner::PartnerDirectory;
use crate::port::outbound::store::SessionStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<SessionId, GameSession>>,
    bets: RwLock<HashMap<UserId, Vec<DateTime<Utc>>>>,
    accounts: RwLock<HashMap<UserId, UserAccount>>,
    parents: RwLock<HashMap<PartnerId, Option<PartnerId>>>,
    credentials: RwLock<HashMap<(PartnerId, ProviderType), ProviderCredential>>,
    balances: RwLock<HashMap<UserId, Decimal>>,
    reconciled: RwLock<HashMap<SessionId, DateTime<Utc>>>,
    ledger_writes: AtomicUsize,
    fail_session_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a session without any status checks.
    pub fn insert_session(&self, session: GameSession) {
        self.sessions.write().insert(session.id.clone(), session);
    }

    pub fn session(&self, id: &SessionId) -> Option<GameSession> {
        self.sessions.read().get(id).cloned()
    }

    pub fn record_bet(&self, user: &UserId, placed_at: DateTime<Utc>) {
        self.bets
            .write()
            .entry(user.clone())
            .or_default()
            .push(placed_at);
    }

    pub fn add_account(&self, account: UserAccount) {
        self.accounts
            .write()
            .insert(account.user_id.clone(), account);
    }

    pub fn add_partner(&self, partner: PartnerId, parent: Option<PartnerId>) {
        self.parents.write().insert(partner, parent);
    }

    pub fn add_credential(&self, root: PartnerId, credential: ProviderCredential) {
        self.credentials
            .write()
            .insert((root, credential.provider), credential);
    }

    pub fn set_ledger_balance(&self, user: &UserId, balance: Decimal) {
        self.balances.write().insert(user.clone(), balance);
    }

    pub fn ledger_balance(&self, user: &UserId) -> Option<Decimal> {
        self.balances.read().get(user).copied()
    }

    /// Number of `Ledger::set_balance` calls so far.
    pub fn ledger_writes(&self) -> usize {
        self.ledger_writes.load(Ordering::SeqCst)
    }

    /// Make every session write fail, to exercise retry paths.
    pub fn fail_session_writes(&self, fail: bool) {
        self.fail_session_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(Error::Database("session writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn insert(&self, session: &GameSession) -> Result<()> {
        self.check_writable()?;
        self.insert_session(session.clone());
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<GameSession>> {
        Ok(self.session(id))
    }

    async fn list_by_status(&self, statuses: &[SessionStatus]) -> Result<Vec<GameSession>> {
        let mut sessions: Vec<GameSession> = self
            .sessions
            .read()
            .values()
            .filter(|s| statuses.contains(&s.status))
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.launched_at);
        Ok(sessions)
    }

    async fn compare_and_set(&self, update: &SessionUpdate) -> Result<bool> {
        self.check_writable()?;
        let mut sessions = self.sessions.write();
        match sessions.get_mut(&update.next.id) {
            Some(current) if current.status == update.expected => {
                *current = update.next.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_terminal(
        &self,
        id: &SessionId,
        status: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<bool> {
        self.check_writable()?;
        let mut sessions = self.sessions.write();
        match sessions.get_mut(id) {
            Some(current) if !current.status.is_terminal() => {
                *current = current.terminated(status, at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn claim_reconciliation(&self, id: &SessionId, at: DateTime<Utc>) -> Result<bool> {
        let mut reconciled = self.reconciled.write();
        if reconciled.contains_key(id) {
            return Ok(false);
        }
        reconciled.insert(id.clone(), at);
        Ok(true)
    }
}

#[async_trait]
impl BetActivityReader for MemoryStore {
    async fn latest_bet_after(
        &self,
        user: &UserId,
        after: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .bets
            .read()
            .get(user)
            .and_then(|bets| bets.iter().filter(|at| **at > after).max().copied()))
    }
}

#[async_trait]
impl PartnerDirectory for MemoryStore {
    async fn account(&self, user: &UserId) -> Result<Option<UserAccount>> {
        Ok(self.accounts.read().get(user).cloned())
    }

    async fn parent_of(&self, partner: &PartnerId) -> Result<Option<PartnerId>> {
        Ok(self.parents.read().get(partner).cloned().flatten())
    }

    async fn credential(
        &self,
        root: &PartnerId,
        provider: ProviderType,
    ) -> Result<Option<ProviderCredential>> {
        Ok(self
            .credentials
            .read()
            .get(&(root.clone(), provider))
            .cloned())
    }
}

#[async_trait]
impl Ledger for MemoryStore {
    async fn balance(&self, user: &UserId) -> Result<Decimal> {
        Ok(self.ledger_balance(user).unwrap_or(Decimal::ZERO))
    }

    async fn set_balance(&self, user: &UserId, balance: Decimal) -> Result<()> {
        self.ledger_writes.fetch_add(1, Ordering::SeqCst);
        self.set_ledger_balance(user, balance);
        Ok(())
    }
}
