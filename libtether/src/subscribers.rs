//! Ordered listener lists shared by the state container and the action registry

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying one subscriber entry
///
/// Returned by every subscribe call and accepted by the matching
/// unsubscribe call. Handles are unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    fn next() -> Self {
        Subscription(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed))
    }
}

/// Listeners in subscription order, deduplicated by `Arc` identity
pub(crate) struct Subscribers<L: ?Sized> {
    entries: Vec<(Subscription, Arc<L>)>,
}

impl<L: ?Sized> Subscribers<L> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append `listener`, or return `None` if that same `Arc` is already present
    pub(crate) fn add(&mut self, listener: Arc<L>) -> Option<Subscription> {
        if self.contains(&listener) {
            return None;
        }
        Some(self.push(listener))
    }

    /// Append `listener` without the duplicate check
    pub(crate) fn push(&mut self, listener: Arc<L>) -> Subscription {
        let subscription = Subscription::next();
        self.entries.push((subscription, listener));
        subscription
    }

    pub(crate) fn remove(&mut self, subscription: Subscription) -> bool {
        match self.entries.iter().position(|(id, _)| *id == subscription) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    fn contains(&self, listener: &Arc<L>) -> bool {
        // compare data pointers only; vtable pointers are not stable
        let target = Arc::as_ptr(listener) as *const ();
        self.entries
            .iter()
            .any(|(_, existing)| Arc::as_ptr(existing) as *const () == target)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<L>> {
        self.entries.iter().map(|(_, listener)| listener)
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        self.iter().cloned().collect()
    }

    #[cfg(test)]
    pub(crate) fn subscriptions(&self) -> Vec<Subscription> {
        self.entries.iter().map(|(id, _)| *id).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
