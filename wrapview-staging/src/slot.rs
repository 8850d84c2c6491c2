//! Single-slot handoff
//!
//! A [`Slot`] holds at most one item. Producers `put` into it (replacing
//! whatever was there), consumers `take` from it. Taking empties the slot,
//! so every item is observed at most once. The slot itself is not
//! synchronised; it always lives inside a mutex-guarded record and is
//! touched only while that lock is held.

/// A consume-once, single-item channel
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<T> {
    item: Option<T>,
}

impl<T> Slot<T> {
    /// Create an empty slot
    pub const fn empty() -> Self {
        Self { item: None }
    }

    /// Store an item, returning the one it displaced (if it was never taken)
    pub fn put(&mut self, item: T) -> Option<T> {
        self.item.replace(item)
    }

    /// Remove and return the pending item
    pub fn take(&mut self) -> Option<T> {
        self.item.take()
    }

    /// Whether an item is waiting to be consumed
    pub fn is_full(&self) -> bool {
        self.item.is_some()
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}
