//! The shared bookkeeping block behind `SharedBox` and `WeakRef`.
//!
//! A [`ControlBlock`] is heap-allocated once per ownership group and
//! holds the resource pointer plus the strong and weak counts. The
//! resource and the block are separate allocations: the resource is
//! dropped on the strong 1 → 0 transition, the block itself only once
//! both counts are zero.
//!
//! Handles never touch the counters directly. They go through the
//! role-tagged [`acquire`](ControlBlock::acquire) /
//! [`release`](ControlBlock::release) pair, plus
//! [`try_acquire_strong`](ControlBlock::try_acquire_strong) for upgrades.
//!
//! Control block allocation and deallocation happen only in this module.

#![allow(unsafe_code)]

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use crate::diagnostics;
use crate::state::{GroupState, ReleaseOutcome, Role};

const LOG_TARGET: &str = "holdfast::block";

/// Strong/weak bookkeeping for one ownership group.
///
/// Invariant: `strong > 0` implies the resource has not been released.
/// The resource pointer is nulled the moment it is released, so a second
/// release is a no-op.
pub struct ControlBlock<T> {
    resource: Cell<*mut T>,
    strong: Cell<usize>,
    weak: Cell<usize>,
    _owns: PhantomData<T>,
}

impl<T> ControlBlock<T> {
    /// Allocate a block for `resource` with strong = 1, weak = 0.
    ///
    /// The returned pointer carries the single strong reference; the
    /// caller must eventually hand it back through
    /// [`release`](Self::release) with [`Role::Strong`].
    ///
    /// A null `resource` is accepted and yields a live group with nothing
    /// to drop.
    ///
    /// # Safety
    ///
    /// `resource` must be null or a pointer obtained from
    /// [`Box::into_raw`] that nothing else owns. The block takes over
    /// responsibility for dropping it.
    pub unsafe fn allocate(resource: *mut T) -> NonNull<Self> {
        let block = NonNull::from(Box::leak(Box::new(Self {
            resource: Cell::new(resource),
            strong: Cell::new(1),
            weak: Cell::new(0),
            _owns: PhantomData,
        })));
        diagnostics::block_allocated();
        log::trace!(
            target: LOG_TARGET,
            "allocated block {block:p} (null resource: {})",
            resource.is_null()
        );
        block
    }

    /// The stored resource pointer, or null once released.
    #[inline]
    pub fn resource(&self) -> *mut T {
        self.resource.get()
    }

    /// Current value of the counter for `role`.
    #[inline]
    pub fn count(&self, role: Role) -> usize {
        self.counter(role).get()
    }

    /// Number of strong references.
    #[inline]
    pub fn strong_count(&self) -> usize {
        self.strong.get()
    }

    /// Number of weak references.
    #[inline]
    pub fn weak_count(&self) -> usize {
        self.weak.get()
    }

    /// Whether the group still has strong owners.
    pub fn state(&self) -> GroupState {
        if self.strong.get() > 0 {
            GroupState::Alive
        } else {
            GroupState::Expired
        }
    }

    /// Add one reference of `role`.
    ///
    /// This is the copy path: the caller already holds a reference of the
    /// same role, so a strong acquire never revives an expired group.
    /// Upgrades from weak to strong must use
    /// [`try_acquire_strong`](Self::try_acquire_strong) instead.
    ///
    /// Counter overflow aborts the process.
    #[inline]
    pub fn acquire(&self, role: Role) {
        debug_assert!(
            role == Role::Weak || self.strong.get() > 0,
            "strong acquire on an expired group"
        );
        increment(self.counter(role));
    }

    /// Add one strong reference if the group is still alive.
    ///
    /// Returns `false`, leaving the counts untouched, once the strong
    /// count has reached zero. Expiry is permanent.
    #[inline]
    pub fn try_acquire_strong(&self) -> bool {
        if self.strong.get() == 0 {
            return false;
        }
        increment(&self.strong);
        true
    }

    /// Give back one reference of `role` and run whatever transition
    /// that triggers.
    ///
    /// - strong 1 → 0: the resource is dropped. If no weak references
    ///   remain the block is freed as well.
    /// - weak 1 → 0 while strong is 0: the block is freed.
    ///
    /// The resource's destructor may itself release weak references to
    /// this same group; the block stays allocated until it returns.
    ///
    /// If that destructor panics, the pin taken for its duration is never
    /// returned and the block leaks, as with `std::rc::Rc`. The group still
    /// reads as expired and nothing is freed twice.
    ///
    /// # Safety
    ///
    /// `block` must point to a live block on which the caller holds a
    /// counted reference of `role`, and the caller must not use that
    /// reference again. When the outcome is
    /// [`ReleaseOutcome::BlockFreed`], `block` is dangling.
    pub unsafe fn release(block: NonNull<Self>, role: Role) -> ReleaseOutcome {
        // SAFETY: the caller's counted reference keeps the block allocated.
        let this = unsafe { block.as_ref() };
        let counter = this.counter(role);
        debug_assert!(counter.get() > 0, "{role} release with a zero count");
        let remaining = counter.get() - 1;
        counter.set(remaining);
        if remaining > 0 {
            return ReleaseOutcome::Retained;
        }

        match role {
            Role::Strong => {
                // Strong owners collectively pin the block while the
                // resource drops.
                increment(&this.weak);
                this.release_resource();
                let weak = this.weak.get() - 1;
                this.weak.set(weak);
                if weak > 0 {
                    return ReleaseOutcome::ResourceReleased;
                }
            }
            Role::Weak => {
                if this.strong.get() > 0 {
                    return ReleaseOutcome::Retained;
                }
            }
        }

        // SAFETY: both counts are zero, so no handle refers to the block.
        unsafe { Self::free(block) };
        ReleaseOutcome::BlockFreed
    }

    fn release_resource(&self) {
        let resource = self.resource.replace(ptr::null_mut());
        if resource.is_null() {
            return;
        }
        log::trace!(target: LOG_TARGET, "releasing resource {resource:p}");
        // SAFETY: `allocate` requires the pointer to come from
        // `Box::into_raw` with this block as sole owner. The stored
        // pointer is already null, so this runs at most once.
        drop(unsafe { Box::from_raw(resource) });
    }

    /// # Safety
    ///
    /// Both counts must be zero and `block` must not be used afterwards.
    unsafe fn free(block: NonNull<Self>) {
        log::trace!(target: LOG_TARGET, "freeing block {block:p}");
        diagnostics::block_freed();
        // SAFETY: `block` came from `Box::leak` in `allocate`.
        drop(unsafe { Box::from_raw(block.as_ptr()) });
    }

    #[inline]
    fn counter(&self, role: Role) -> &Cell<usize> {
        match role {
            Role::Strong => &self.strong,
            Role::Weak => &self.weak,
        }
    }
}

impl<T> Drop for ControlBlock<T> {
    fn drop(&mut self) {
        debug_assert!(
            self.resource.get().is_null(),
            "control block freed before its resource"
        );
    }
}

impl<T> fmt::Debug for ControlBlock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlBlock")
            .field("strong", &self.strong.get())
            .field("weak", &self.weak.get())
            .field("resource", &self.resource.get())
            .finish()
    }
}

#[inline]
fn increment(counter: &Cell<usize>) {
    match counter.get().checked_add(1) {
        Some(n) => counter.set(n),
        None => {
            log::error!(target: LOG_TARGET, "reference count overflow");
            std::process::abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct DropCount(Rc<Cell<usize>>);

    impl Drop for DropCount {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn tracked() -> (NonNull<ControlBlock<DropCount>>, Rc<Cell<usize>>) {
        let drops = Rc::new(Cell::new(0));
        let raw = Box::into_raw(Box::new(DropCount(Rc::clone(&drops))));
        // SAFETY: `raw` is a fresh `Box::into_raw` pointer.
        let block = unsafe { ControlBlock::allocate(raw) };
        (block, drops)
    }

    #[test]
    fn allocate_starts_alive_with_one_strong() {
        let (block, drops) = tracked();
        let b = unsafe { block.as_ref() };
        assert_eq!(b.strong_count(), 1);
        assert_eq!(b.weak_count(), 0);
        assert_eq!(b.state(), GroupState::Alive);
        assert!(!b.resource().is_null());

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn extra_strong_reference_retains_resource() {
        let (block, drops) = tracked();
        unsafe { block.as_ref() }.acquire(Role::Strong);
        assert_eq!(unsafe { block.as_ref() }.count(Role::Strong), 2);

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::Retained);
        assert_eq!(drops.get(), 0);

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn weak_reference_keeps_block_after_expiry() {
        let (block, drops) = tracked();
        unsafe { block.as_ref() }.acquire(Role::Weak);

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::ResourceReleased);
        assert_eq!(drops.get(), 1);

        let b = unsafe { block.as_ref() };
        assert_eq!(b.state(), GroupState::Expired);
        assert!(b.resource().is_null());
        assert_eq!(b.weak_count(), 1);
        assert!(!b.try_acquire_strong());
        assert_eq!(b.strong_count(), 0);

        let outcome = unsafe { ControlBlock::release(block, Role::Weak) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn weak_release_while_alive_is_retained() {
        let (block, drops) = tracked();
        unsafe { block.as_ref() }.acquire(Role::Weak);
        let outcome = unsafe { ControlBlock::release(block, Role::Weak) };
        assert_eq!(outcome, ReleaseOutcome::Retained);
        assert_eq!(unsafe { block.as_ref() }.weak_count(), 0);

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn try_acquire_strong_succeeds_while_alive() {
        let (block, _drops) = tracked();
        assert!(unsafe { block.as_ref() }.try_acquire_strong());
        assert_eq!(unsafe { block.as_ref() }.strong_count(), 2);
        let _ = unsafe { ControlBlock::release(block, Role::Strong) };
        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert!(outcome.freed_block());
    }

    #[test]
    fn null_resource_group_is_alive() {
        let block = unsafe { ControlBlock::<u32>::allocate(ptr::null_mut()) };
        let b = unsafe { block.as_ref() };
        assert_eq!(b.state(), GroupState::Alive);
        assert_eq!(b.strong_count(), 1);
        assert!(b.resource().is_null());
        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
    }

    /// Resource that holds a weak reference to its own group and drops it
    /// from its destructor.
    struct SelfObserver {
        block: Cell<Option<NonNull<ControlBlock<SelfObserver>>>>,
        drops: Rc<Cell<usize>>,
    }

    impl Drop for SelfObserver {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
            if let Some(block) = self.block.take() {
                let outcome = unsafe { ControlBlock::release(block, Role::Weak) };
                assert_eq!(outcome, ReleaseOutcome::Retained);
            }
        }
    }

    #[test]
    fn resource_dropping_its_own_weak_reference_frees_block_once() {
        let drops = Rc::new(Cell::new(0));
        let raw = Box::into_raw(Box::new(SelfObserver {
            block: Cell::new(None),
            drops: Rc::clone(&drops),
        }));
        let block = unsafe { ControlBlock::allocate(raw) };
        let b = unsafe { block.as_ref() };
        b.acquire(Role::Weak);
        unsafe { &*b.resource() }.block.set(Some(block));

        let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
        assert_eq!(outcome, ReleaseOutcome::BlockFreed);
        assert_eq!(drops.get(), 1);
    }

    #[test]
    fn debug_shows_counts() {
        let (block, _drops) = tracked();
        let text = format!("{:?}", unsafe { block.as_ref() });
        assert!(text.contains("strong: 1"));
        assert!(text.contains("weak: 0"));
        let _ = unsafe { ControlBlock::release(block, Role::Strong) };
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Copy, Debug)]
        enum Op {
            CloneStrong,
            Downgrade,
            Lock,
            DropStrong,
            DropWeak,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                Just(Op::CloneStrong),
                Just(Op::Downgrade),
                Just(Op::Lock),
                Just(Op::DropStrong),
                Just(Op::DropWeak),
            ]
        }

        proptest! {
            #[test]
            fn counts_track_model_and_resource_drops_once(
                ops in proptest::collection::vec(op(), 0..64),
            ) {
                let (block, drops) = tracked();
                let mut strong = 1usize;
                let mut weak = 0usize;
                let mut freed = false;

                for op in ops {
                    if freed {
                        break;
                    }
                    match op {
                        Op::CloneStrong if strong > 0 => {
                            unsafe { block.as_ref() }.acquire(Role::Strong);
                            strong += 1;
                        }
                        Op::Downgrade if strong > 0 => {
                            unsafe { block.as_ref() }.acquire(Role::Weak);
                            weak += 1;
                        }
                        Op::Lock if weak > 0 => {
                            let ok = unsafe { block.as_ref() }.try_acquire_strong();
                            prop_assert_eq!(ok, strong > 0);
                            if ok {
                                strong += 1;
                            }
                        }
                        Op::DropStrong if strong > 0 => {
                            let outcome = unsafe { ControlBlock::release(block, Role::Strong) };
                            strong -= 1;
                            freed = outcome.freed_block();
                            prop_assert_eq!(freed, strong == 0 && weak == 0);
                        }
                        Op::DropWeak if weak > 0 => {
                            let outcome = unsafe { ControlBlock::release(block, Role::Weak) };
                            weak -= 1;
                            freed = outcome.freed_block();
                            prop_assert_eq!(freed, strong == 0 && weak == 0);
                        }
                        _ => {}
                    }
                    if !freed {
                        let b = unsafe { block.as_ref() };
                        prop_assert_eq!(b.strong_count(), strong);
                        prop_assert_eq!(b.weak_count(), weak);
                        prop_assert_eq!(drops.get(), usize::from(strong == 0));
                    }
                }

                while !freed && strong > 0 {
                    strong -= 1;
                    freed = unsafe { ControlBlock::release(block, Role::Strong) }.freed_block();
                }
                while !freed && weak > 0 {
                    weak -= 1;
                    freed = unsafe { ControlBlock::release(block, Role::Weak) }.freed_block();
                }
                prop_assert!(freed);
                prop_assert_eq!(drops.get(), 1);
            }
        }
    }
}
