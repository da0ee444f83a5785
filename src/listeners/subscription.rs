use std::{
    sync::Weak,
    time::Duration
};

use thiserror::Error;

use crate::{events::Event, task::BoxError};
use super::{
    EventListener,
    ListenerFlags,
    ListenerId,
    ListenerRegistry
};

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("The workflow has been dropped")]
    Disconnected(#[from] crossbeam_channel::RecvError),

    #[error("Timed out waiting for an event")]
    Timeout,

    #[error("No event available")]
    Empty,
}

impl From<crossbeam_channel::RecvTimeoutError> for SubscriptionError {
    fn from(e: crossbeam_channel::RecvTimeoutError) -> Self {
        match e {
            crossbeam_channel::RecvTimeoutError::Timeout => SubscriptionError::Timeout,
            crossbeam_channel::RecvTimeoutError::Disconnected => {
                SubscriptionError::Disconnected(crossbeam_channel::RecvError)
            }
        }
    }
}

impl From<crossbeam_channel::TryRecvError> for SubscriptionError {
    fn from(e: crossbeam_channel::TryRecvError) -> Self {
        match e {
            crossbeam_channel::TryRecvError::Empty => SubscriptionError::Empty,
            crossbeam_channel::TryRecvError::Disconnected => {
                SubscriptionError::Disconnected(crossbeam_channel::RecvError)
            }
        }
    }
}

pub (crate) struct ChannelListener {
    sender: crossbeam_channel::Sender<Event>,
}

impl EventListener for ChannelListener {
    fn event_triggered(&self, event: &Event) -> Result<(), BoxError> {
        // A dropped receiver deregisters itself; a send racing that is harmless.
        let _ = self.sender.send(event.clone());
        Ok(())
    }
}

/// Receives the events a listener with `flags` would see, for consumption
/// from any thread. Deregisters itself when dropped.
#[derive(Debug)]
pub struct Subscription {
    id: ListenerId,
    flags: ListenerFlags,
    receiver: crossbeam_channel::Receiver<Event>,
    registry: Weak<ListenerRegistry>,
}

impl Subscription {

    pub (crate) fn register(
        registry: &std::sync::Arc<ListenerRegistry>,
        flags: ListenerFlags
    ) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let id = registry.register(flags, ChannelListener { sender });
        Self {
            id,
            flags,
            receiver,
            registry: std::sync::Arc::downgrade(registry),
        }
    }

    pub fn id(&self) -> ListenerId { self.id }
    pub fn flags(&self) -> ListenerFlags { self.flags }

    pub fn recv(&self) -> Result<Event, SubscriptionError> {
        Ok(self.receiver.recv()?)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Event, SubscriptionError> {
        Ok(self.receiver.recv_timeout(timeout)?)
    }

    pub fn try_recv(&self) -> Result<Event, SubscriptionError> {
        Ok(self.receiver.try_recv()?)
    }

    pub fn try_iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.receiver.try_iter()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.deregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_subscription_receives_matching_events() {
        let registry = Arc::new(ListenerRegistry::new());
        let subscription = Subscription::register(&registry, ListenerFlags::TERMINAL);

        registry.notify(&Event::new("end", 5i32), ListenerFlags::TERMINAL);
        registry.notify(&Event::new("noise", 6i32), ListenerFlags::TRIGGERED);

        let event = subscription.try_recv().unwrap();
        assert_eq!(event.data::<i32>(), Some(&5));
        assert!(matches!(subscription.try_recv(), Err(SubscriptionError::Empty)));
    }

    #[test]
    fn test_drop_deregisters() {
        let registry = Arc::new(ListenerRegistry::new());
        let subscription = Subscription::register(&registry, ListenerFlags::all());
        assert_eq!(registry.len(), 1);
        drop(subscription);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_disconnected_after_registry_drop() {
        let registry = Arc::new(ListenerRegistry::new());
        let subscription = Subscription::register(&registry, ListenerFlags::all());
        drop(registry);
        assert!(matches!(
            subscription.recv_timeout(Duration::from_millis(10)),
            Err(SubscriptionError::Disconnected(_))
        ));
        assert!(matches!(subscription.try_recv(), Err(SubscriptionError::Disconnected(_))));

        let err = subscription.recv_timeout(Duration::from_millis(10)).unwrap_err();
        assert_eq!(err.to_string(), "The workflow has been dropped");
    }

    #[test]
    fn test_timeout_while_connected() {
        let registry = Arc::new(ListenerRegistry::new());
        let subscription = Subscription::register(&registry, ListenerFlags::all());
        assert!(matches!(
            subscription.recv_timeout(Duration::from_millis(10)),
            Err(SubscriptionError::Timeout)
        ));
    }
}
