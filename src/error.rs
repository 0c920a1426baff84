//! Typed errors raised by the index-set layer itself.
//! Storage failures are never represented here: whatever the client returns is handed
//! back to the caller untouched, and "not found" classification stays with the client.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexSetError {
    /// A user-based index set was called without a tenant.
    #[error("userID must not be empty")]
    UserIdMustNotBeEmpty,
    /// A common index set was called with a tenant.
    #[error("userID must be empty")]
    UserIdMustBeEmpty,
    /// Rejected by a storage client before any IO happened.
    #[error("invalid object name '{name}': {reason}")]
    InvalidObjectName { name: String, reason: String },
}

impl IndexSetError {
    /// Stable machine-readable code.
    pub fn code_str(&self) -> &'static str {
        match self {
            IndexSetError::UserIdMustNotBeEmpty => "user_id_must_not_be_empty",
            IndexSetError::UserIdMustBeEmpty => "user_id_must_be_empty",
            IndexSetError::InvalidObjectName { .. } => "invalid_object_name",
        }
    }

    pub fn invalid_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        IndexSetError::InvalidObjectName { name: name.into(), reason: reason.into() }
    }

    /// Tenant/mode mismatches are programming errors; callers should not retry them.
    pub fn is_tenant_mismatch(&self) -> bool {
        matches!(self, IndexSetError::UserIdMustNotBeEmpty | IndexSetError::UserIdMustBeEmpty)
    }

    /// Find an `IndexSetError` anywhere in an anyhow chain.
    pub fn find_in(err: &anyhow::Error) -> Option<&IndexSetError> {
        err.chain().find_map(|e| e.downcast_ref::<IndexSetError>())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
