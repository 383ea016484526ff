//! Shared-owner box over a [`ControlBlock`].
//!
//! Every non-empty `SharedBox` is counted in its block's strong count.
//! Cloning increments it, dropping or resetting runs the release
//! sequence: strong − 1, drop the resource at zero, free the block once
//! the weak count is zero as well.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::Deref;
use std::ptr::{self, NonNull};

use holdfast_core::{ControlBlock, Role};

use crate::weak::WeakRef;

/// An owning handle that may alias other `SharedBox`es of the same group.
pub struct SharedBox<T> {
    block: Option<NonNull<ControlBlock<T>>>,
    _owns: PhantomData<ControlBlock<T>>,
}

impl<T> SharedBox<T> {
    /// A handle with no control block. `use_count()` is 0.
    pub const fn empty() -> Self {
        Self {
            block: None,
            _owns: PhantomData,
        }
    }

    /// Allocate `value` in a new ownership group.
    pub fn new(value: T) -> Self {
        // SAFETY: fresh `Box::into_raw` pointer with no other owner.
        unsafe { Self::from_raw(Box::into_raw(Box::new(value))) }
    }

    /// A new ownership group over no resource.
    ///
    /// Unlike [`empty`](Self::empty) this allocates a control block, so
    /// `use_count()` is 1 and weak references observe a live group.
    pub fn null() -> Self {
        // SAFETY: null is always accepted.
        unsafe { Self::from_raw(ptr::null_mut()) }
    }

    /// Start a new ownership group for a raw resource.
    ///
    /// A control block is allocated even for a null pointer; see
    /// [`null`](Self::null).
    ///
    /// # Safety
    ///
    /// `resource` must be null or come from [`Box::into_raw`], and must
    /// not be owned by anything else.
    pub unsafe fn from_raw(resource: *mut T) -> Self {
        // SAFETY: forwarded from the caller.
        let block = unsafe { ControlBlock::allocate(resource) };
        Self::from_counted_block(block)
    }

    /// Wrap a block on which a strong reference has already been counted.
    pub(crate) fn from_counted_block(block: NonNull<ControlBlock<T>>) -> Self {
        Self {
            block: Some(block),
            _owns: PhantomData,
        }
    }

    pub(crate) fn block_ptr(&self) -> Option<NonNull<ControlBlock<T>>> {
        self.block
    }

    fn block(&self) -> Option<&ControlBlock<T>> {
        // SAFETY: this handle's strong reference keeps the block allocated.
        self.block.map(|b| unsafe { b.as_ref() })
    }

    /// Whether there is no resource to dereference, either because the
    /// handle has no block or because the group was built over null.
    pub fn is_empty(&self) -> bool {
        self.as_ptr().is_null()
    }

    /// Shared access to the resource, if any.
    pub fn get(&self) -> Option<&T> {
        let resource = self.block()?.resource();
        // SAFETY: while this handle is counted the strong count is
        // positive, so the resource has not been released.
        unsafe { resource.as_ref() }
    }

    /// The raw resource pointer, or null. Grants no right to free it.
    pub fn as_ptr(&self) -> *const T {
        self.block()
            .map_or(ptr::null(), |b| b.resource().cast_const())
    }

    /// Strong count of the group, or 0 without a block.
    pub fn use_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::strong_count)
    }

    /// Weak count of the group, or 0 without a block.
    pub fn weak_count(&self) -> usize {
        self.block().map_or(0, ControlBlock::weak_count)
    }

    /// Whether both handles belong to the same ownership group.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        matches!((self.block, other.block), (Some(a), Some(b)) if a == b)
    }

    /// A weak reference to this group.
    pub fn downgrade(&self) -> WeakRef<T> {
        WeakRef::from(self)
    }

    /// Move the content out, leaving this handle empty. Counts are
    /// unchanged.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Drop this handle's strong reference and become empty.
    ///
    /// A no-op on an empty handle.
    pub fn reset(&mut self) {
        if let Some(block) = self.block.take() {
            // SAFETY: the reference was counted and is now unreachable.
            let _ = unsafe { ControlBlock::release(block, Role::Strong) };
        }
    }

    /// Release the current group, then start a new one for `value`.
    pub fn reset_with(&mut self, value: T) {
        self.reset();
        *self = Self::new(value);
    }

    /// Release the current group, then start a new one for `resource`.
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw`](Self::from_raw). `resource` must not
    /// be the resource of any live group.
    pub unsafe fn reset_raw(&mut self, resource: *mut T) {
        self.reset();
        // SAFETY: forwarded from the caller.
        *self = unsafe { Self::from_raw(resource) };
    }

    /// Exchange groups with `other`. Counts are untouched.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.block, &mut other.block);
    }
}

impl<T> Clone for SharedBox<T> {
    fn clone(&self) -> Self {
        if let Some(block) = self.block() {
            block.acquire(Role::Strong);
        }
        Self {
            block: self.block,
            _owns: PhantomData,
        }
    }
}

impl<T> Default for SharedBox<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<&WeakRef<T>> for SharedBox<T> {
    /// Same as [`WeakRef::lock`].
    fn from(weak: &WeakRef<T>) -> Self {
        weak.lock()
    }
}

impl<T> Drop for SharedBox<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Deref for SharedBox<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => crate::deref_empty("SharedBox"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedBox")
            .field("value", &self.get())
            .field("use_count", &self.use_count())
            .field("weak_count", &self.weak_count())
            .finish()
    }
}
