//! Set of files whose expansion is currently running.
//!
//! Starting an operation hands out a guard; the entry is removed when the
//! guard drops, including while unwinding from a panicking expander.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Mutex;

use crate::error::LockResultExt;

pub(crate) struct InProgressSet<T: Eq + Hash + Clone> {
    items: Mutex<HashSet<T>>,
}

/// Marks an item as in progress until dropped.
pub(crate) struct InProgressGuard<'a, T: Eq + Hash + Clone> {
    set: &'a InProgressSet<T>,
    item: T,
}

impl<T: Eq + Hash + Clone> InProgressSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            items: Mutex::new(HashSet::new()),
        }
    }

    /// Start an operation. Returns `None` if it is already in progress.
    pub(crate) fn try_start(&self, item: &T) -> Option<InProgressGuard<'_, T>> {
        let inserted = self
            .items
            .lock()
            .recover_poison("InProgressSet::try_start")
            .insert(item.clone());
        inserted.then(|| InProgressGuard {
            set: self,
            item: item.clone(),
        })
    }

    pub(crate) fn contains(&self, item: &T) -> bool {
        self.items
            .lock()
            .recover_poison("InProgressSet::contains")
            .contains(item)
    }

    fn finish(&self, item: &T) {
        self.items
            .lock()
            .recover_poison("InProgressSet::finish")
            .remove(item);
    }
}

impl<T: Eq + Hash + Clone> Default for InProgressSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash + Clone> Drop for InProgressGuard<'_, T> {
    fn drop(&mut self) {
        self.set.finish(&self.item);
    }
}
