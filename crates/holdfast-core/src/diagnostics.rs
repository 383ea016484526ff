//! Live control block accounting.
//!
//! With the `diagnostics` feature enabled, every [`ControlBlock`]
//! allocation and deallocation on the current thread is tallied.
//! Tests compare [`live_blocks`] before and after a scenario to prove
//! that every ownership group reached the freed state.
//!
//! Without the feature the hooks compile to nothing.
//!
//! [`ControlBlock`]: crate::ControlBlock

#[cfg(feature = "diagnostics")]
use std::cell::Cell;

#[cfg(feature = "diagnostics")]
thread_local! {
    static LIVE_BLOCKS: Cell<usize> = const { Cell::new(0) };
}

/// Number of control blocks allocated and not yet freed on this thread.
#[cfg(feature = "diagnostics")]
pub fn live_blocks() -> usize {
    LIVE_BLOCKS.with(Cell::get)
}

#[inline]
pub(crate) fn block_allocated() {
    #[cfg(feature = "diagnostics")]
    LIVE_BLOCKS.with(|n| n.set(n.get() + 1));
}

#[inline]
pub(crate) fn block_freed() {
    #[cfg(feature = "diagnostics")]
    LIVE_BLOCKS.with(|n| n.set(n.get().saturating_sub(1)));
}
