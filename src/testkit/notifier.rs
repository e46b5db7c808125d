//! Event-capturing notifier.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::port::outbound::notifier::{Event, Notifier, NotifierRegistry};

/// Records every event it receives.
///
/// Clones share the same buffer, so one clone can be registered while the
/// test keeps another for assertions.
#[derive(Clone)]
pub struct RecordingNotifier {
    events: Arc<Mutex<Vec<Event>>>,
    count: Arc<watch::Sender<usize>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        let (count, _) = watch::channel(0);
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            count: Arc::new(count),
        }
    }

    /// A registry holding only this recorder.
    pub fn registry(&self) -> Arc<NotifierRegistry> {
        let mut registry = NotifierRegistry::new();
        registry.register(Box::new(self.clone()));
        Arc::new(registry)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Wait until at least `n` events have been recorded.
    pub async fn wait_for(&self, n: usize) {
        let mut rx = self.count.subscribe();
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    pub fn restart_notices(&self) -> usize {
        self.count_matching(|e| matches!(e, Event::RestartRequired { .. }))
    }

    pub fn reconciliations_completed(&self) -> usize {
        self.count_matching(|e| matches!(e, Event::ReconciliationCompleted(_)))
    }

    pub fn reconciliations_failed(&self) -> usize {
        self.count_matching(|e| matches!(e, Event::ReconciliationFailed(_)))
    }

    fn count_matching(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().iter().filter(|e| predicate(e)).count()
    }
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: Event) {
        self.events.lock().push(event);
        self.count.send_modify(|count| *count += 1);
    }
}
