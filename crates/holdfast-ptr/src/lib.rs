//! Exclusive, shared and weak owning pointers.
//!
//! Three handle types, all built on explicit allocate/free bookkeeping
//! rather than on `Rc`/`Arc`:
//!
//! ```text
//! ExclusiveBox<T> ──► T                       (sole owner, move-only)
//!
//! SharedBox<T> ─┐
//! SharedBox<T> ─┼──► ControlBlock<T> ──► T    (strong / weak counts)
//! WeakRef<T>  ──┘
//! ```
//!
//! # Moves
//!
//! A Rust move already makes the source unusable. Where a caller needs the
//! source to stay around as an observable empty handle, every type offers
//! `take()`, which hands back the content and leaves `Default` (empty)
//! behind.
//!
//! # Dereferencing empty handles
//!
//! `Deref` on an empty [`ExclusiveBox`] or [`SharedBox`] is a contract
//! violation and panics. Use `get()` for a checked `Option`.
//!
//! # Threading
//!
//! [`SharedBox`] and [`WeakRef`] are single-threaded:
//!
//! ```compile_fail
//! use holdfast_ptr::SharedBox;
//!
//! fn assert_send<T: Send>(_: T) {}
//! assert_send(SharedBox::new(1));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod exclusive;
pub mod shared;
pub mod weak;

pub use exclusive::ExclusiveBox;
pub use shared::SharedBox;
pub use weak::WeakRef;

pub use holdfast_core::OwnershipError;

#[cold]
#[track_caller]
pub(crate) fn deref_empty(handle: &str) -> ! {
    panic!("dereferenced empty {handle}: {}", OwnershipError::Empty)
}
