//! Ownership guard and soft-delete visibility rules.
//!
//! Services never mutate a post, comment or like directly. They hand the
//! store a check built from [`assert_owner`]; the store runs it against the
//! row it has locked inside the mutating transaction, after confirming the
//! row exists and is live.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::auth::Principal;

/// Authorization and lookup failures for ownable resources.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    /// The principal is not the owner of the resource.
    #[error("Not the owner of this resource")]
    Unauthorized,

    /// The resource never existed or has been soft-deleted.
    #[error("Resource not found")]
    NotFound,
}

/// A resource with an immutable owner and a soft-delete timestamp.
pub trait Owned {
    /// Numeric id of the owning user.
    fn owner_id(&self) -> i64;

    /// When the resource was soft-deleted, if it was.
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_live(&self) -> bool {
        self.deleted_at().is_none()
    }
}

/// Ownership check handed to store mutations, evaluated against the locked row.
pub type OwnerCheck<'a, R> = &'a (dyn Fn(&R) -> Result<(), AccessError> + Send + Sync);

/// Fail unless `principal` owns `resource`.
///
/// Ownership compares numeric user ids only. A soft-deleted resource is
/// reported as `NotFound` whoever asks, so the owner check never leaks the
/// existence of a deleted row.
pub fn assert_owner<R: Owned + ?Sized>(
    principal: &Principal,
    resource: &R,
) -> Result<(), AccessError> {
    if !resource.is_live() {
        return Err(AccessError::NotFound);
    }
    if resource.owner_id() != principal.user_id {
        return Err(AccessError::Unauthorized);
    }
    Ok(())
}

/// Collapse "missing" and "soft-deleted" into `NotFound`.
pub fn require_live<R: Owned>(resource: Option<R>) -> Result<R, AccessError> {
    match resource {
        Some(r) if r.is_live() => Ok(r),
        _ => Err(AccessError::NotFound),
    }
}
