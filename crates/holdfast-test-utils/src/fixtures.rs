//! Drop-tracking resources.
//!
//! - [`DropLog`]: shared record of which tracked resources have dropped,
//!   and how often.
//! - [`Tracked`]: a value tagged with an id that reports its drop to a
//!   `DropLog`.

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use indexmap::IndexMap;

#[derive(Default)]
struct LogInner {
    /// Drop count per id, in order of first drop.
    drops: IndexMap<u32, usize>,
}

/// Records drops of [`Tracked`] resources.
///
/// Cloning a `DropLog` shares the same record.
#[derive(Clone, Default)]
pub struct DropLog {
    inner: Rc<RefCell<LogInner>>,
}

impl DropLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `value` so that dropping it is recorded under `id`.
    pub fn track<T>(&self, id: u32, value: T) -> Tracked<T> {
        Tracked {
            id,
            value,
            log: self.clone(),
        }
    }

    /// How many times the resource `id` has been dropped.
    pub fn drops(&self, id: u32) -> usize {
        self.inner.borrow().drops.get(&id).copied().unwrap_or(0)
    }

    /// Total drops across all ids.
    pub fn total(&self) -> usize {
        self.inner.borrow().drops.values().sum()
    }

    /// Ids in the order they were first dropped.
    pub fn order(&self) -> Vec<u32> {
        self.inner.borrow().drops.keys().copied().collect()
    }

    /// Ids dropped more than once. Always empty in a correct run.
    pub fn double_drops(&self) -> Vec<u32> {
        self.inner
            .borrow()
            .drops
            .iter()
            .filter(|&(_, &n)| n > 1)
            .map(|(&id, _)| id)
            .collect()
    }

    fn record(&self, id: u32) {
        *self.inner.borrow_mut().drops.entry(id).or_insert(0) += 1;
        log::trace!(target: "holdfast::test", "tracked resource {id} dropped");
    }
}

impl fmt::Debug for DropLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.inner.borrow().drops.iter())
            .finish()
    }
}

/// A value whose drop is recorded in a [`DropLog`].
pub struct Tracked<T> {
    id: u32,
    value: T,
    log: DropLog,
}

impl<T> Tracked<T> {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> Drop for Tracked<T> {
    fn drop(&mut self) {
        self.log.record(self.id);
    }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracked")
            .field("id", &self.id)
            .field("value", &self.value)
            .finish()
    }
}
