//! Sole-owner box.
//!
//! Owns its resource through a raw pointer obtained from `Box`.

#![allow(unsafe_code)]

use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use holdfast_core::OwnershipError;

/// Owns at most one heap-allocated `T`, exclusively.
///
/// No two live boxes ever hold the same resource: ownership moves with
/// the value, and [`take`](Self::take) leaves an empty box behind.
/// Copying is rejected at compile time:
///
/// ```compile_fail
/// use holdfast_ptr::ExclusiveBox;
///
/// let a = ExclusiveBox::new(1);
/// let b = Clone::clone(&a);
/// ```
pub struct ExclusiveBox<T> {
    ptr: Option<NonNull<T>>,
    _owns: PhantomData<T>,
}

// SAFETY: the box is the unique owner of its `T`, exactly like `Box<T>`.
unsafe impl<T: Send> Send for ExclusiveBox<T> {}
// SAFETY: shared access only hands out `&T`.
unsafe impl<T: Sync> Sync for ExclusiveBox<T> {}

impl<T> ExclusiveBox<T> {
    /// An empty box.
    pub const fn empty() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
        }
    }

    /// Allocate `value` and take ownership of it.
    pub fn new(value: T) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(Box::new(value)))),
            _owns: PhantomData,
        }
    }

    /// Take ownership of a raw resource. A null pointer yields an empty box.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or come from [`Box::into_raw`], and nothing else
    /// may own or free it afterwards.
    pub unsafe fn from_raw(ptr: *mut T) -> Self {
        Self {
            ptr: NonNull::new(ptr),
            _owns: PhantomData,
        }
    }

    /// Whether the box holds nothing.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Shared access to the resource, if any.
    pub fn get(&self) -> Option<&T> {
        // SAFETY: a held pointer is owned by this box and stays valid
        // until it is released through `&mut self`.
        self.ptr.map(|p| unsafe { p.as_ref() })
    }

    /// Exclusive access to the resource, if any.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        // SAFETY: as in `get`, and `&mut self` rules out other borrows.
        self.ptr.map(|mut p| unsafe { p.as_mut() })
    }

    /// The raw resource pointer, or null. Ownership is unaffected.
    pub fn as_ptr(&self) -> *mut T {
        self.ptr.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Give up ownership and return the raw pointer (null if empty).
    ///
    /// The caller becomes responsible for freeing it, typically with
    /// [`Box::from_raw`].
    #[must_use = "the released pointer leaks unless it is freed"]
    pub fn release(&mut self) -> *mut T {
        self.ptr.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Move the content out, leaving this box empty.
    pub fn take(&mut self) -> Self {
        mem::take(self)
    }

    /// Drop the current resource, if any.
    pub fn reset(&mut self) {
        if let Some(p) = self.ptr.take() {
            // SAFETY: `p` was owned by this box and is no longer reachable
            // from it.
            drop(unsafe { Box::from_raw(p.as_ptr()) });
        }
    }

    /// Drop the current resource, then own a freshly allocated `value`.
    pub fn reset_with(&mut self, value: T) {
        self.reset();
        self.ptr = Some(NonNull::from(Box::leak(Box::new(value))));
    }

    /// Drop the current resource, then adopt `ptr` (null leaves the box
    /// empty).
    ///
    /// # Safety
    ///
    /// Same contract as [`from_raw`](Self::from_raw). In particular `ptr`
    /// must not be the pointer this box currently holds.
    pub unsafe fn reset_raw(&mut self, ptr: *mut T) {
        self.reset();
        self.ptr = NonNull::new(ptr);
    }

    /// Exchange resources with `other`. Nothing is allocated or dropped.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.ptr, &mut other.ptr);
    }

    /// Consume the box and return its value.
    pub fn into_inner(mut self) -> Result<T, OwnershipError> {
        match self.ptr.take() {
            // SAFETY: `p` was owned by this box, which is now empty.
            Some(p) => Ok(*unsafe { Box::from_raw(p.as_ptr()) }),
            None => Err(OwnershipError::Empty),
        }
    }
}

impl<T> Default for ExclusiveBox<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Box<T>> for ExclusiveBox<T> {
    fn from(value: Box<T>) -> Self {
        Self {
            ptr: Some(NonNull::from(Box::leak(value))),
            _owns: PhantomData,
        }
    }
}

impl<T> From<T> for ExclusiveBox<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Drop for ExclusiveBox<T> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T> Deref for ExclusiveBox<T> {
    type Target = T;

    #[track_caller]
    fn deref(&self) -> &T {
        match self.get() {
            Some(value) => value,
            None => crate::deref_empty("ExclusiveBox"),
        }
    }
}

impl<T> DerefMut for ExclusiveBox<T> {
    #[track_caller]
    fn deref_mut(&mut self) -> &mut T {
        match self.get_mut() {
            Some(value) => value,
            None => crate::deref_empty("ExclusiveBox"),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ExclusiveBox<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ExclusiveBox").field(&self.get()).finish()
    }
}
