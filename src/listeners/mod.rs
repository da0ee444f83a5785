mod subscription;

pub use subscription::{Subscription, SubscriptionError};

use std::{
    fmt,
    panic::{
        self,
        AssertUnwindSafe
    },
    sync::{
        atomic::{
            AtomicU64,
            Ordering
        },
        Arc
    }
};

use bitflags::bitflags;
use parking_lot::RwLock;

use crate::{
    error::{panic_message, ListenerError},
    events::Event,
    task::BoxError
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ListenerFlags: u8 {
        // Every triggered event, terminal or not.
        const TRIGGERED = 1 << 0;
        // Triggered events whose type is configured as terminal.
        const TERMINAL = 1 << 1;
        const COMPLETED = 1 << 2;
        const FAILED = 1 << 3;
    }
}

impl Default for ListenerFlags {
    fn default() -> Self {
        Self::TERMINAL | Self::COMPLETED
    }
}

impl ListenerFlags {
    pub fn matches(&self, occurrence: ListenerFlags) -> bool {
        self.intersects(occurrence)
    }
}

pub trait EventListener: Send + Sync {
    fn event_triggered(&self, event: &Event) -> Result<(), BoxError>;
}

impl<F> EventListener for F
where
    F: Fn(&Event) -> Result<(), BoxError> + Send + Sync
{
    fn event_triggered(&self, event: &Event) -> Result<(), BoxError> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Registered {
    id: ListenerId,
    flags: ListenerFlags,
    listener: Arc<dyn EventListener>,
}

pub (crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: RwLock<Vec<Registered>>,
}

impl ListenerRegistry {

    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn register<L>(&self, flags: ListenerFlags, listener: L) -> ListenerId
    where
        L: EventListener + 'static
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push(Registered {
            id,
            flags,
            listener: Arc::new(listener),
        });
        id
    }

    pub fn deregister(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|registered| registered.id != id);
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// Calls every listener interested in `occurrence`, in registration
    /// order. A failing or panicking listener does not stop the others.
    pub fn notify(&self, event: &Event, occurrence: ListenerFlags) -> Vec<ListenerError> {
        // Snapshot so listeners may register or deregister while being notified.
        let targets: Vec<(ListenerId, Arc<dyn EventListener>)> = self.listeners
            .read()
            .iter()
            .filter(|registered| registered.flags.matches(occurrence))
            .map(|registered| (registered.id, Arc::clone(&registered.listener)))
            .collect();

        let mut errors = Vec::new();
        for (id, listener) in targets {
            let message = match panic::catch_unwind(AssertUnwindSafe(|| {
                listener.event_triggered(event)
            })) {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("listener panicked: {}", panic_message(payload.as_ref())),
            };
            warn!("{} failed on {}: {}", id, event.event_type, message);
            errors.push(ListenerError {
                listener: id,
                event_type: event.event_type.clone(),
                message,
            });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_flag_matching() {
        let flags = ListenerFlags::default();
        assert!(flags.matches(ListenerFlags::TERMINAL));
        assert!(flags.matches(ListenerFlags::COMPLETED));
        assert!(flags.matches(ListenerFlags::TRIGGERED | ListenerFlags::TERMINAL));
        assert!(!flags.matches(ListenerFlags::TRIGGERED));
        assert!(!flags.matches(ListenerFlags::FAILED));
    }

    #[test]
    fn test_notify_in_registration_order() {
        let registry = ListenerRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let seen = Arc::clone(&seen);
            registry.register(ListenerFlags::all(), move |_: &Event| -> Result<(), BoxError> {
                seen.lock().push(n);
                Ok(())
            });
        }

        let errors = registry.notify(&Event::empty("x"), ListenerFlags::TRIGGERED);
        assert!(errors.is_empty());
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_failing_listeners_are_isolated() {
        let registry = ListenerRegistry::new();
        let reached = Arc::new(Mutex::new(0));

        let failing = registry.register(ListenerFlags::all(), |_: &Event| -> Result<(), BoxError> {
            Err("nope".into())
        });
        let panicking = registry.register(ListenerFlags::all(), |_: &Event| -> Result<(), BoxError> {
            panic!("listener blew up")
        });
        {
            let reached = Arc::clone(&reached);
            registry.register(ListenerFlags::all(), move |_: &Event| -> Result<(), BoxError> {
                *reached.lock() += 1;
                Ok(())
            });
        }

        let errors = registry.notify(&Event::empty("end"), ListenerFlags::TERMINAL);
        assert_eq!(*reached.lock(), 1);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].listener, failing);
        assert_eq!(errors[0].message, "nope");
        assert_eq!(errors[1].listener, panicking);
        assert!(errors[1].message.contains("listener blew up"));
    }

    #[test]
    fn test_deregister() {
        let registry = ListenerRegistry::new();
        let id = registry.register(ListenerFlags::all(), |_: &Event| -> Result<(), BoxError> { Ok(()) });
        assert_eq!(registry.len(), 1);
        assert!(registry.deregister(id));
        assert!(!registry.deregister(id));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_uninterested_listener_is_skipped() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(Mutex::new(0));
        {
            let hits = Arc::clone(&hits);
            registry.register(ListenerFlags::FAILED, move |_: &Event| -> Result<(), BoxError> {
                *hits.lock() += 1;
                Ok(())
            });
        }
        registry.notify(&Event::empty("x"), ListenerFlags::TRIGGERED);
        assert_eq!(*hits.lock(), 0);
    }
}
