//! Error types for the identity service.

use nevpn_account_core::CoreError;
use nevpn_account_store::StoreError;
use thiserror::Error;

/// Message shown for any failed login, whatever the internal reason.
pub const GENERIC_LOGIN_FAILURE: &str = "Invalid email or password.";

/// Errors that can occur during identity operations.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Registration email is already taken.
    #[error("account already exists: {0}")]
    AlreadyExists(String),

    /// Login email has no account.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// Login password does not match.
    #[error("bad credentials")]
    BadCredentials,

    /// Operation requires a signed-in user.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Submitted email could not be normalized.
    #[error("invalid email: {0:?}")]
    InvalidEmail(String),

    /// Favorite or subscription identifier is blank.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Concurrent writers kept invalidating our users write.
    #[error("write conflict on slot {slot} after {attempts} attempts")]
    WriteConflict { slot: String, attempts: u32 },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Encoding error.
    #[error("encoding error: {0}")]
    Core(#[from] CoreError),
}

impl IdentityError {
    /// Login failures that must look identical to the user.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            IdentityError::UserNotFound(_) | IdentityError::BadCredentials
        )
    }

    /// Message safe to show in the account page.
    pub fn user_message(&self) -> &'static str {
        match self {
            IdentityError::UserNotFound(_) | IdentityError::BadCredentials => {
                GENERIC_LOGIN_FAILURE
            }
            IdentityError::AlreadyExists(_) => "An account with this email already exists.",
            IdentityError::NotAuthenticated => "Please sign in first.",
            IdentityError::InvalidEmail(_) => "Please enter a valid email address.",
            IdentityError::InvalidIdentifier(_) => "Nothing to save.",
            IdentityError::WriteConflict { .. }
            | IdentityError::Store(_)
            | IdentityError::Core(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Result type for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors raised while delivering an auth-attempt notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel refused or failed to take the event.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Lock around notifier state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type for notifier operations.
pub type NotifyResult<T> = std::result::Result<T, NotifyError>;
