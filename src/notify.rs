// Publisher - keyed observer list used by every store
//
// Subscribers register against a key (a stream id, or `()` for stores with a
// single topic) and are called in subscription order. Callbacks only get the
// change by shared reference: they cannot reach the publisher or the store
// that owns it, so the subscriber list cannot change mid-notification and a
// callback cannot start a second mutation before the first one returned.

use crate::ids::{SubscriptionId, generate_subscription_id};
use std::fmt;

/// Boxed subscriber callback
pub type Callback<T> = Box<dyn FnMut(&T)>;

struct Subscriber<K, T> {
    id: SubscriptionId,
    key: K,
    callback: Callback<T>,
}

/// Keyed fan-out of change notifications
pub struct Publisher<K, T> {
    subscribers: Vec<Subscriber<K, T>>,
}

impl<K: PartialEq + fmt::Debug, T> Publisher<K, T> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Register a callback for `key`
    pub fn subscribe<F>(&mut self, key: K, callback: F) -> SubscriptionId
    where
        F: FnMut(&T) + 'static,
    {
        let id = generate_subscription_id();
        log::trace!("{} subscribed to {:?}", id, key);
        self.subscribers.push(Subscriber {
            id,
            key,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a subscription. Returns false if the id is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        before != self.subscribers.len()
    }

    /// Invoke every subscriber of `key`, oldest first
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&mut self, key: &K, change: &T) -> usize {
        let mut delivered = 0;
        for subscriber in self.subscribers.iter_mut().filter(|s| &s.key == key) {
            (subscriber.callback)(change);
            delivered += 1;
        }
        log::trace!("notified {} subscriber(s) of {:?}", delivered, key);
        delivered
    }

    /// Number of live subscriptions for `key`
    pub fn subscriber_count(&self, key: &K) -> usize {
        self.subscribers.iter().filter(|s| &s.key == key).count()
    }

    /// Drop every subscription for `key`
    pub fn remove_key(&mut self, key: &K) -> usize {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| &s.key != key);
        before - self.subscribers.len()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl<K: PartialEq + fmt::Debug, T> Default for Publisher<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, T> fmt::Debug for Publisher<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_notify_in_subscription_order() {
        let mut publisher: Publisher<&'static str, u32> = Publisher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = log.clone();
            publisher.subscribe("s", move |value: &u32| log.borrow_mut().push((name, *value)));
        }

        assert_eq!(publisher.notify(&"s", &7), 3);
        assert_eq!(
            *log.borrow(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn test_notify_only_matching_key() {
        let mut publisher: Publisher<&'static str, ()> = Publisher::new();
        let hits = Rc::new(RefCell::new(0));

        let counter = hits.clone();
        publisher.subscribe("a", move |_| *counter.borrow_mut() += 1);

        assert_eq!(publisher.notify(&"b", &()), 0);
        assert_eq!(publisher.notify(&"a", &()), 1);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut publisher: Publisher<(), ()> = Publisher::new();
        let id = publisher.subscribe((), |_| {});

        assert_eq!(publisher.subscriber_count(&()), 1);
        assert!(publisher.unsubscribe(id));
        assert!(!publisher.unsubscribe(id));
        assert!(publisher.is_empty());
    }

    #[test]
    fn test_remove_key() {
        let mut publisher: Publisher<u8, ()> = Publisher::new();
        publisher.subscribe(1, |_| {});
        publisher.subscribe(1, |_| {});
        publisher.subscribe(2, |_| {});

        assert_eq!(publisher.remove_key(&1), 2);
        assert_eq!(publisher.len(), 1);
    }
}
