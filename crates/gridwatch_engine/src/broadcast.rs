//! Latest-value topics.
//!
//! A [`Topic`] remembers the last value published to it. A new
//! [`Subscription`] first yields that value (when one exists) and then every
//! later publish, in publish order, until it is unsubscribed or dropped.
//! Each subscriber has its own unbounded queue, so a slow consumer never
//! loses values and never holds up the publisher or its siblings.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;

pub const CONNECTION_STATUS: &str = "connection-status";
pub const ENERGY_UPDATE: &str = "energy-update";
pub const WEATHER_UPDATE: &str = "weather-update";

type SubscriberId = u64;

struct TopicState<T> {
    latest: Option<T>,
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<T>)>,
}

pub struct Topic<T> {
    name: &'static str,
    shared: Arc<Mutex<TopicState<T>>>,
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic").field("name", &self.name).finish()
    }
}

impl<T: Clone> Topic<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            shared: Arc::new(Mutex::new(TopicState {
                latest: None,
                next_id: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stores `value` as the latest and queues it for every current subscriber.
    pub fn publish(&self, value: T) {
        let mut state = lock(&self.shared);
        // Receivers that went away without unsubscribing are pruned here.
        state
            .subscribers
            .retain(|(_, tx)| tx.send(value.clone()).is_ok());
        state.latest = Some(value);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = lock(&self.shared);
        if let Some(latest) = &state.latest {
            // The receiver is alive, so this cannot fail.
            let _ = tx.send(latest.clone());
        }
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push((id, tx));

        Subscription {
            id,
            topic: self.name,
            rx,
            shared: Arc::downgrade(&self.shared),
            active: true,
        }
    }

    pub fn latest(&self) -> Option<T> {
        lock(&self.shared).latest.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared).subscribers.len()
    }
}

/// Handle returned by [`Topic::subscribe`]. Dropping it unsubscribes.
pub struct Subscription<T> {
    id: SubscriberId,
    topic: &'static str,
    rx: mpsc::UnboundedReceiver<T>,
    shared: Weak<Mutex<TopicState<T>>>,
    active: bool,
}

impl<T> Subscription<T> {
    pub fn topic(&self) -> &'static str {
        self.topic
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Waits for the next value. Returns `None` once unsubscribed or when the
    /// topic itself has been dropped.
    pub async fn recv(&mut self) -> Option<T> {
        if !self.active {
            return None;
        }
        self.rx.recv().await
    }

    /// Returns an already queued value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        if !self.active {
            return None;
        }
        self.rx.try_recv().ok()
    }

    /// Stops delivery to this handle. Safe to call any number of times, and
    /// after the topic is gone.
    pub fn unsubscribe(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            let id = self.id;
            lock(&shared).subscribers.retain(|(sub_id, _)| *sub_id != id);
        }
        self.rx.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

fn lock<T>(shared: &Mutex<TopicState<T>>) -> MutexGuard<'_, TopicState<T>> {
    // Publishing cannot leave the state half-updated, so a poisoned lock is still usable.
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
