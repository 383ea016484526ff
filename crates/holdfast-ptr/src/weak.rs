//! Non-owning observer of a shared ownership group.
//!
//! Holds a weak count on the block and reaches the resource only after
//! winning a strong reference.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use holdfast_core::{ControlBlock, GroupState, OwnershipError, Role};

use crate::shared::SharedBox;

const LOG_TARGET: &str = "holdfast::weak";

/// A weak reference: counted in the group's weak count, never keeps the
/// resource alive, and may outlive it.
///
/// Once the last [`SharedBox`] of the group is gone the reference is
/// [`expired`](Self::expired) for good; [`lock`](Self::lock) then returns
/// an empty `SharedBox`.
pub struct WeakRef<T> {
    block: Option<NonNull<ControlBlock<T>>>,
    _observes: PhantomData<ControlBlock<T>>,
}

impl<T> WeakRef<T> {
    /// A reference that observes nothing. It is expired from the start.
    pub const fn new() -> Self {
        Self {
            block: None,
            _observes: PhantomData,
        }
    }

    fn block(&self) -> Option<&ControlBlock<T>> {
        // SAFETY: this handle's weak reference keeps the block allocated.
        self.block.map(|b| unsafe { b.as_ref() })
    }

    /// Try to obtain an owning handle.
    ///
    /// Succeeds only while the group's strong count is positive; an
    /// expired or unbound reference yields [`SharedBox::empty`].
    pub fn lock(&self) -> SharedBox<T> {
        match (self.block, self.block()) {
            (Some(ptr), Some(block)) if block.try_acquire_strong() => {
                SharedBox::from_counted_block(ptr)
            }
            (Some(ptr), _) => {
                log::trace!(target: LOG_TARGET, "lock on expired block {ptr:p}");
                SharedBox::empty()
            }
            _ => SharedBox::empty(),
        }
    }

    /// Checked [`lock`](Self::lock) that says why it failed.
    pub fn upgrade(&self) -> Result<SharedBox<T>, OwnershipError> {
        let (Some(ptr), Some(block)) = (self.block, self.block()) else {
            return Err(OwnershipError::Empty);
        };
        if block.try_acquire_strong() {
            Ok(SharedBox::from_counted_block(ptr))
        } else {
            Err(OwnershipError::Expired)
        }
    }

    /// Strong count of the observed group, or 0.
    pub fn use_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::strong_count)
    }

    /// Weak count of the observed group, or 0.
    pub fn weak_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::weak_count)
    }

    /// True iff the strong count is zero, including when unbound.
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// State of the observed group, if bound.
    pub fn state(&self) -> Option<GroupState> {
        self.block().map(ControlBlock::state)
    }

    /// Observe `shared`'s group instead of the current one.
    pub fn assign(&mut self, shared: &SharedBox<T>) {
        *self = Self::from(shared);
    }

    /// Whether both references observe the same group.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        matches!((self.block, other.block), (Some(a), Some(b)) if a == b)
    }

    /// Move the reference out, leaving this one unbound.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Drop this weak reference and become unbound. A no-op when already
    /// unbound.
    pub fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: the reference was counted and is now unreachable.
            let _ = unsafe { ControlBlock::release(block, Role::Weak) };
        }
    }

    /// Exchange observed groups with `other`. Counts are untouched.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.block, &mut other.block);
    }
}

impl<T> From<&SharedBox<T>> for WeakRef<T> {
    fn from(shared: &SharedBox<T>) -> Self {
        let block = shared.block_ptr();
        if let Some(ptr) = block {
            // SAFETY: `shared` holds a strong reference, so the block is live.
            unsafe { ptr.as_ref() }.acquire(Role::Weak);
        }
        Self {
            block,
            _observes: PhantomData,
        }
    }
}

impl<T> Clone for WeakRef<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.block() {
            block.acquire(Role::Weak);
        }
        Self {
            block: self.block,
            _observes: PhantomData,
        }
    }
}

impl<T> Default for WeakRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for WeakRef<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> fmt::Debug for WeakRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRef")
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish()
    }
}
