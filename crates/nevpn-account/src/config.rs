//! Configuration for the identity service.

/// Default name of the slot holding the serialized user table.
pub const DEFAULT_USERS_SLOT: &str = "nevpn-users";

/// Default name of the slot holding the serialized session pointer.
pub const DEFAULT_SESSION_SLOT: &str = "nevpn-session";

/// Configuration for the [`IdentityService`](crate::IdentityService).
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Slot name for the user table.
    pub users_slot: String,
    /// Slot name for the session pointer.
    pub session_slot: String,
    /// How many times a users write is retried after a stale revision.
    pub write_retries: u32,
    /// Whether register/login attempts are reported to the notifier.
    pub notify_auth_attempts: bool,
    /// Whether `current_user` clears a session pointer naming a missing user.
    pub clear_dangling_session: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            users_slot: DEFAULT_USERS_SLOT.to_string(),
            session_slot: DEFAULT_SESSION_SLOT.to_string(),
            write_retries: 3,
            notify_auth_attempts: true,
            clear_dangling_session: false,
        }
    }
}

impl IdentityConfig {
    pub fn with_slots(mut self, users: impl Into<String>, session: impl Into<String>) -> Self {
        self.users_slot = users.into();
        self.session_slot = session.into();
        self
    }

    pub fn with_write_retries(mut self, retries: u32) -> Self {
        self.write_retries = retries;
        self
    }

    pub fn with_notify_auth_attempts(mut self, enabled: bool) -> Self {
        self.notify_auth_attempts = enabled;
        self
    }

    pub fn with_clear_dangling_session(mut self, enabled: bool) -> Self {
        self.clear_dangling_session = enabled;
        self
    }
}
