//! Ownership authorization, applied the same way to users and items.
//!
//! Pure decisions over (requester id, requester superuser flag, resource
//! owner id): self-access allows, superuser allows, everything else denies.

use crate::store::UserRecord;

use super::super::error::ApiError;

/// Allow the resource owner or a superuser; deny everyone else.
pub fn ensure_owner_or_superuser(
    requester: &UserRecord,
    resource_owner_id: i64,
) -> Result<(), ApiError> {
    if requester.id == resource_owner_id || requester.is_superuser {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Not enough permissions"))
    }
}

/// Allow superusers only (user directory listing).
pub fn ensure_superuser(requester: &UserRecord) -> Result<(), ApiError> {
    if requester.is_superuser {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "Not enough permissions. Superuser access required.",
        ))
    }
}
