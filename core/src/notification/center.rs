use crate::notification::event::{Notification, NotificationKind};
use crate::telemetry::log::LogManager;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

/// Callback invoked once per delivered notification of the kind it was registered for.
pub type Listener = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Handle returned by [`NotificationCenter::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

struct Registration {
    handle: ListenerHandle,
    listener: Listener,
}

struct Inner {
    registry: Mutex<HashMap<NotificationKind, Vec<Registration>>>,
    sender: UnboundedSender<Notification>,
    receiver: Mutex<UnboundedReceiver<Notification>>,
    next_handle: AtomicU64,
    logger: LogManager,
}

/// Typed publish/subscribe bus.
///
/// `emit` only queues; `dispatch_pending` delivers queued events serially, each one
/// to every listener registered for its kind before the next event is processed.
/// Cloning yields another handle to the same bus.
#[derive(Clone)]
pub struct NotificationCenter {
    inner: Arc<Inner>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(HashMap::new()),
                sender,
                receiver: Mutex::new(receiver),
                next_handle: AtomicU64::new(1),
                logger: LogManager::new("notification"),
            }),
        }
    }

    /// Registers `listener` for `kind`. Registering the same listener twice for
    /// one kind returns the existing handle.
    pub fn register(&self, kind: NotificationKind, listener: Listener) -> ListenerHandle {
        let mut registry = match self.inner.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entries = registry.entry(kind).or_default();
        if let Some(existing) = entries
            .iter()
            .find(|entry| Arc::ptr_eq(&entry.listener, &listener))
        {
            return existing.handle;
        }

        let handle = ListenerHandle(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));
        entries.push(Registration { handle, listener });
        handle
    }

    /// Removes a registration. Returns `false` if it was not registered for `kind`.
    pub fn unregister(&self, kind: NotificationKind, handle: ListenerHandle) -> bool {
        let mut registry = match self.inner.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(entries) = registry.get_mut(&kind) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.handle != handle);
        before != entries.len()
    }

    pub fn listener_count(&self, kind: NotificationKind) -> usize {
        self.listeners(kind).len()
    }

    fn listeners(&self, kind: NotificationKind) -> Vec<Listener> {
        let registry = match self.inner.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.listener.clone()).collect())
            .unwrap_or_default()
    }

    /// Queues a notification for the next dispatch.
    pub fn emit(&self, notification: Notification) {
        // The receiver lives in the same Arc, so the channel cannot be closed here.
        let _ = self.inner.sender.send(notification);
    }

    /// Delivers every queued notification, including ones emitted by listeners
    /// during this call. Returns the number of notifications processed.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let next = {
                let mut receiver = match self.inner.receiver.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                receiver.try_recv()
            };
            let notification = match next {
                Ok(notification) => notification,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };

            self.inner.logger.record_notification(&notification);
            // Snapshot so listeners may (un)register while being called.
            for listener in self.listeners(notification.kind()) {
                listener(&notification);
            }
            delivered += 1;
        }
        delivered
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counting_listener(counter: Arc<AtomicUsize>) -> Listener {
        Arc::new(move |_: &Notification| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn emit_is_deferred_until_dispatch() {
        let center = NotificationCenter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        center.register(
            NotificationKind::LocationTimeout,
            counting_listener(hits.clone()),
        );

        center.emit(Notification::LocationTimeout);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(center.dispatch_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn listeners_only_see_their_kind() {
        let center = NotificationCenter::new();
        let timeouts = Arc::new(AtomicUsize::new(0));
        let enabled = Arc::new(AtomicUsize::new(0));
        center.register(
            NotificationKind::LocationTimeout,
            counting_listener(timeouts.clone()),
        );
        center.register(
            NotificationKind::ProviderEnabled,
            counting_listener(enabled.clone()),
        );

        center.emit(Notification::ProviderEnabled);
        center.emit(Notification::ProviderEnabled);
        center.emit(Notification::OrientationAccuracyChanged { sufficient: true });
        assert_eq!(center.dispatch_pending(), 3);
        assert_eq!(timeouts.load(Ordering::SeqCst), 0);
        assert_eq!(enabled.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let center = NotificationCenter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let listener = counting_listener(hits.clone());
        let first = center.register(NotificationKind::ProviderDisabled, listener.clone());
        let second = center.register(NotificationKind::ProviderDisabled, listener);
        assert_eq!(first, second);
        assert_eq!(center.listener_count(NotificationKind::ProviderDisabled), 1);

        center.emit(Notification::ProviderDisabled);
        center.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unregistered_listener_is_not_called() {
        let center = NotificationCenter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = center.register(
            NotificationKind::ProviderDisabled,
            counting_listener(hits.clone()),
        );
        assert!(center.unregister(NotificationKind::ProviderDisabled, handle));
        assert!(!center.unregister(NotificationKind::ProviderDisabled, handle));
        assert!(!center.unregister(NotificationKind::LocationChanged, handle));

        center.emit(Notification::ProviderDisabled);
        assert_eq!(center.dispatch_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn events_emitted_by_listeners_are_delivered_in_same_dispatch() {
        let center = NotificationCenter::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let relay = center.clone();
        center.register(
            NotificationKind::ProviderEnabled,
            Arc::new(move |_: &Notification| relay.emit(Notification::LocationTimeout)),
        );
        center.register(
            NotificationKind::LocationTimeout,
            counting_listener(hits.clone()),
        );

        center.emit(Notification::ProviderEnabled);
        assert_eq!(center.dispatch_pending(), 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
