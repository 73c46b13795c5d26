use std::sync::{Arc, Mutex};

use log::debug;

type Listener = Box<dyn Fn() + Send + Sync>;

/// Explicit observer list for session-expiry notifications. The executor
/// emits exactly once per exhausted refresh-and-retry; UI collaborators
/// subscribe to drive their "please log in again" flow. Cheap to clone.
#[derive(Clone, Default)]
pub struct AuthEventBus {
    listeners: Arc<Mutex<Vec<Listener>>>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Box::new(listener));
    }

    pub fn emit(&self) {
        debug!("emitting authentication-failure event");
        let listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_subscriber_sees_every_emit() {
        let bus = AuthEventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let hits = hits.clone();
            bus.subscribe(move || {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        bus.emit();
        bus.emit();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
