//! Notifier port for event notifications.
//!
//! This module defines the trait for sending notifications about session
//! lifecycle events: restart notices for players whose connection failed,
//! reconciliation outcomes for operators, and leadership changes.

use rust_decimal::Decimal;

use crate::domain::{AdminId, ProviderType, SessionId, UserId};

/// Events that can trigger notifications.
#[derive(Debug, Clone)]
pub enum Event {
    /// A player's session was force-ended by a network failure; the player
    /// should see "network error, please restart".
    RestartRequired {
        session_id: SessionId,
        user_id: UserId,
    },
    /// Ledger refreshed from the provider wallet.
    ReconciliationCompleted(ReconciliationEvent),
    /// Reconciliation aborted; the ledger may be stale.
    ReconciliationFailed(ReconciliationEvent),
    /// This process gained or lost monitor leadership.
    LeadershipChanged { admin_id: AdminId, is_leader: bool },
}

/// Reconciliation outcome details.
#[derive(Debug, Clone)]
pub struct ReconciliationEvent {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub provider: ProviderType,
    /// New ledger balance on success.
    pub balance: Option<Decimal>,
    /// Failure description on error.
    pub reason: Option<String>,
}

/// Trait for notification handlers.
///
/// Implementations must be thread-safe and must not block: `notify` is
/// called from the monitor loop and from reconciliation tasks.
pub trait Notifier: Send + Sync {
    /// Handle an event.
    fn notify(&self, event: Event);
}

/// Registry of notifiers (composite pattern).
///
/// Broadcasts events to all registered notifiers.
pub struct NotifierRegistry {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { notifiers: vec![] }
    }

    /// Register a notifier.
    pub fn register(&mut self, notifier: Box<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    /// Notify all registered notifiers.
    pub fn notify_all(&self, event: Event) {
        for notifier in &self.notifiers {
            notifier.notify(event.clone());
        }
    }

    /// Number of registered notifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Check if registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A no-op notifier for when notifications are disabled.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: Event) {}
}

/// A logging notifier that logs events via tracing.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Event) {
        use tracing::{error, info, warn};
        match event {
            Event::RestartRequired {
                session_id,
                user_id,
            } => {
                warn!(
                    session_id = %session_id,
                    user_id = %user_id,
                    "Network error, player must restart the game"
                );
            }
            Event::ReconciliationCompleted(e) => {
                info!(
                    session_id = %e.session_id,
                    user_id = %e.user_id,
                    provider = %e.provider,
                    balance = ?e.balance,
                    "Ledger reconciled"
                );
            }
            Event::ReconciliationFailed(e) => {
                error!(
                    session_id = %e.session_id,
                    user_id = %e.user_id,
                    provider = %e.provider,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "Reconciliation failed, ledger may be stale"
                );
            }
            Event::LeadershipChanged {
                admin_id,
                is_leader,
            } => {
                info!(admin_id = %admin_id, is_leader, "Leadership changed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Counting(Arc<AtomicUsize>);

    impl Notifier for Counting {
        fn notify(&self, _event: Event) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn registry_broadcasts_to_every_notifier() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(Counting(Arc::clone(&count))));
        registry.register(Box::new(NullNotifier));

        registry.notify_all(Event::LeadershipChanged {
            admin_id: AdminId::new("a"),
            is_leader: true,
        });

        assert_eq!(registry.len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn empty_registry_is_empty() {
        assert!(NotifierRegistry::default().is_empty());
    }
}
