//! Role tags and group states for control block operations.

use std::fmt;

/// Which kind of reference a handle holds on a [`ControlBlock`].
///
/// Both `SharedBox` and `WeakRef` go through the same
/// acquire/release entry points; the role selects the counter.
///
/// [`ControlBlock`]: crate::ControlBlock
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    /// Owning reference. Keeps the resource alive.
    Strong,
    /// Observing reference. Keeps only the block alive.
    Weak,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => write!(f, "strong"),
            Self::Weak => write!(f, "weak"),
        }
    }
}

/// Observable state of an ownership group.
///
/// A group whose block has been freed has no observers left, so it has
/// no variant here; that transition is reported by
/// [`ReleaseOutcome::BlockFreed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupState {
    /// At least one strong reference exists.
    Alive,
    /// Strong count is zero; weak references keep the block for queries.
    Expired,
}

/// What a single release did to its ownership group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum ReleaseOutcome {
    /// Counts were decremented; resource and block are untouched.
    Retained,
    /// The last strong reference went away while weak references remain.
    /// The resource is gone, the block stays.
    ResourceReleased,
    /// Both counts reached zero and the block was deallocated.
    BlockFreed,
}

impl ReleaseOutcome {
    /// Whether the block is gone after this release.
    pub fn freed_block(self) -> bool {
        matches!(self, Self::BlockFreed)
    }
}
