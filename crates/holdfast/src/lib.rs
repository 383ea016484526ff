//! Holdfast: exclusive, shared and weak ownership on a hand-managed
//! control block.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the holdfast sub-crates. For most users, adding `holdfast` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use holdfast::prelude::*;
//!
//! // Sole ownership, moved out with `take`.
//! let mut a = ExclusiveBox::new(7);
//! let b = a.take();
//! assert!(a.get().is_none());
//! assert_eq!(*b, 7);
//!
//! // Shared ownership with a weak observer.
//! let s = SharedBox::new(5);
//! let t = s.clone();
//! let w = WeakRef::from(&s);
//! assert_eq!(s.use_count(), 2);
//! assert_eq!(w.use_count(), 2);
//!
//! drop(s);
//! drop(t);
//! assert!(w.expired());
//! assert!(w.lock().get().is_none());
//! assert_eq!(w.upgrade().err(), Some(OwnershipError::Expired));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`block`] | `holdfast-core` | `ControlBlock`, roles, group states, errors |
//! | [`ptr`] | `holdfast-ptr` | `ExclusiveBox`, `SharedBox`, `WeakRef` |
//!
//! # Features
//!
//! - `diagnostics`: per-thread live control block counter, see
//!   `block::diagnostics::live_blocks`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Control block, role tags and error types (`holdfast-core`).
pub use holdfast_core as block;

/// Owning and observing handles (`holdfast-ptr`).
pub use holdfast_ptr as ptr;

pub use holdfast_core::{GroupState, OwnershipError};
pub use holdfast_ptr::{ExclusiveBox, SharedBox, WeakRef};

/// Common imports for holdfast users.
///
/// ```rust
/// use holdfast::prelude::*;
/// ```
pub mod prelude {
    pub use holdfast_core::{GroupState, OwnershipError};
    pub use holdfast_ptr::{ExclusiveBox, SharedBox, WeakRef};
}
