//! Session pointer and session state.

use serde::{Deserialize, Serialize};

use crate::email::Email;

/// Names the currently authenticated user.
///
/// The pointer is not tied to the user table transactionally: it may name an
/// email that is no longer stored (a dangling pointer), which readers treat as
/// anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPointer {
    pub email: Email,
}

impl SessionPointer {
    pub fn new(email: Email) -> Self {
        Self { email }
    }
}

/// Authentication state of the profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated(Email),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn email(&self) -> Option<&Email> {
        match self {
            SessionState::Anonymous => None,
            SessionState::Authenticated(email) => Some(email),
        }
    }
}
