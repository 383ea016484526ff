//! Reference-counting bookkeeping for holdfast ownership primitives.
//!
//! This is the leaf crate of the workspace. It owns the one piece of
//! genuinely shared state in the design, the [`ControlBlock`], and the
//! small vocabulary types used to talk to it: which [`Role`] a handle
//! plays, which [`GroupState`] an ownership group is in, and what a
//! release did ([`ReleaseOutcome`]).
//!
//! # Ownership group lifecycle
//!
//! ```text
//! ControlBlock::allocate ──► Alive (strong > 0)
//!                              │
//!            last strong release, weak > 0 ──► Expired (strong == 0, weak > 0)
//!                              │                    │
//!            last strong release, weak == 0         │ last weak release
//!                              ▼                    ▼
//!                            Freed ◄────────────────┘
//! ```
//!
//! No transition leaves `Expired` except towards `Freed`: once the strong
//! count reaches zero, [`ControlBlock::try_acquire_strong`] refuses every
//! later upgrade.
//!
//! # Threading
//!
//! Counts live in [`Cell`](std::cell::Cell)s. A block is `!Send + !Sync`,
//! and so is every handle that points at one.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod block;
pub mod diagnostics;
pub mod error;
pub mod state;

pub use block::ControlBlock;
pub use error::OwnershipError;
pub use state::{GroupState, ReleaseOutcome, Role};
