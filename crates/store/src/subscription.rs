//! Listener registry shared by the state stores.
//!
//! Stores notify consumers through plain callbacks rather than a framework
//! reactivity system: `subscribe` hands back a [`SubscriptionId`] and
//! `unsubscribe` detaches it. Listeners run synchronously in the same turn
//! as the mutation that triggered them.

/// Handle identifying one subscribed listener.
///
/// Returned by a store's `subscribe`; pass it back to `unsubscribe` to
/// detach. Dropping the handle does not detach the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Ordered set of listeners for one event type.
///
/// Listeners fire in subscription order. The registry never reuses an ID,
/// so a stale handle unsubscribes nothing instead of detaching a stranger.
pub(crate) struct Listeners<E> {
    entries: Vec<(SubscriptionId, Box<dyn FnMut(&E) + Send>)>,
    next_id: u64,
}

impl<E> Listeners<E> {
    pub(crate) const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    pub(crate) fn subscribe(&mut self, listener: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(listener)));
        id
    }

    /// Returns `true` if the handle matched a live listener.
    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self, event: &E) {
        for (_, listener) in &mut self.entries {
            listener(event);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}
