/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Callbacks in subscription order.
pub(crate) struct Observers<F: ?Sized> {
    entries: Vec<(SubscriptionId, Box<F>)>,
    next: u64,
}

impl<F: ?Sized> Default for Observers<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
        }
    }
}

impl<F: ?Sized> Observers<F> {
    pub(crate) fn add(&mut self, observer: Box<F>) -> SubscriptionId {
        let id = SubscriptionId(self.next);
        self.next += 1;
        self.entries.push((id, observer));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sub, _)| *sub != id);
        self.entries.len() != before
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &F> {
        self.entries.iter().map(|(_, observer)| observer.as_ref())
    }
}
