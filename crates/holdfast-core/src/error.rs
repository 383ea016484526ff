//! Ownership error types.

use std::error::Error;
use std::fmt;

/// Errors surfaced by the checked accessors of holdfast handles.
///
/// None of these are fatal. The unchecked paths (`Deref`, `lock()`)
/// either panic on contract violation or return an empty handle; the
/// checked paths return one of these instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OwnershipError {
    /// The handle holds no resource: it was never bound, was moved from,
    /// was reset, or was bound to a null resource.
    Empty,
    /// The weak handle's ownership group has already released its
    /// resource. Expiry is permanent.
    Expired,
}

impl fmt::Display for OwnershipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "handle does not hold a resource"),
            Self::Expired => write!(f, "ownership group has expired"),
        }
    }
}

impl Error for OwnershipError {}
