//! The IdentityService: register, login, sessions and per-user lists.
//!
//! The service is the only writer of the users and session slots. UI code
//! calls into it and re-renders from [`IdentityService::current_user`].
//!
//! State per profile:
//!
//! ```text
//! Anonymous --register/login ok--> Authenticated(email) --logout--> Anonymous
//! ```
//!
//! `Authenticated` also reads as `Anonymous` when the session pointer names a
//! user that is no longer stored.

use nevpn_account_core::{
    Email, InsertResult, PasswordDigest, RecordLists, SessionState, UniqueList, UserRecord,
    UserTable,
};

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::notify::{
    AuthEvent, AuthEventKind, AuthNotifier, AuthOutcome, ClientMeta, FailureReason, NoopNotifier,
};
use crate::repository::{IdentityRepository, SaveOutcome, Snapshot};

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Favorites,
    Subscriptions,
}

impl ListKind {
    fn of(self, record: &UserRecord) -> &UniqueList {
        match self {
            ListKind::Favorites => &record.favorites,
            ListKind::Subscriptions => &record.subscriptions,
        }
    }

    fn of_mut(self, lists: RecordLists<'_>) -> &mut UniqueList {
        match self {
            ListKind::Favorites => lists.favorites,
            ListKind::Subscriptions => lists.subscriptions,
        }
    }
}

/// Local identity service.
pub struct IdentityService<R: IdentityRepository, N: AuthNotifier = NoopNotifier> {
    repo: R,
    notifier: N,
    config: IdentityConfig,
}

impl<R: IdentityRepository> IdentityService<R, NoopNotifier> {
    /// Create a service that does not report auth attempts anywhere.
    pub fn new(repo: R, config: IdentityConfig) -> Self {
        Self::with_notifier(repo, NoopNotifier, config)
    }
}

impl<R: IdentityRepository, N: AuthNotifier> IdentityService<R, N> {
    /// Create a service reporting auth attempts to `notifier`.
    pub fn with_notifier(repo: R, notifier: N, config: IdentityConfig) -> Self {
        Self {
            repo,
            notifier,
            config,
        }
    }

    /// Get the repository reference.
    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a new account and sign it in.
    ///
    /// Fails with `AlreadyExists` if the normalized email is taken; the
    /// existing record is left untouched.
    ///
    /// Once the record is stored the call succeeds, even if the session
    /// pointer cannot be written. The caller then stays signed out and can
    /// log in normally.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<UserRecord> {
        self.register_with_meta(name, email, password, &ClientMeta::default())
            .await
    }

    /// [`register`](Self::register), reporting `client` with the attempt.
    pub async fn register_with_meta(
        &self,
        name: &str,
        email: &str,
        password: &str,
        client: &ClientMeta,
    ) -> Result<UserRecord> {
        let result = self.do_register(name, email, password).await;
        self.report(AuthEventKind::Register, email, &result, client)
            .await;
        result
    }

    async fn do_register(&self, name: &str, email: &str, password: &str) -> Result<UserRecord> {
        let email = Email::parse(email).map_err(|_| IdentityError::InvalidEmail(email.to_string()))?;
        let digest = PasswordDigest::compute(password);

        let record = self
            .mutate_users(|table| {
                let record = UserRecord::new(email.clone(), Some(name), digest);
                match table.insert(record.clone()) {
                    InsertResult::Inserted => Ok((record, true)),
                    InsertResult::AlreadyExists => {
                        Err(IdentityError::AlreadyExists(email.to_string()))
                    }
                }
            })
            .await?;

        // The account is committed at this point. A failed sign-in must not
        // report the registration itself as failed.
        if let Err(e) = self.repo.set_session(&email).await {
            tracing::warn!(email = %email, error = %e, "registered account but could not sign it in");
        }
        tracing::debug!(email = %email, "registered account");
        Ok(record)
    }

    /// Sign in an existing account.
    ///
    /// Fails with `UserNotFound` or `BadCredentials`. On failure the session
    /// is left as it was.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord> {
        self.login_with_meta(email, password, &ClientMeta::default())
            .await
    }

    /// [`login`](Self::login), reporting `client` with the attempt.
    pub async fn login_with_meta(
        &self,
        email: &str,
        password: &str,
        client: &ClientMeta,
    ) -> Result<UserRecord> {
        let result = self.do_login(email, password).await;
        self.report(AuthEventKind::Login, email, &result, client)
            .await;
        result
    }

    async fn do_login(&self, email: &str, password: &str) -> Result<UserRecord> {
        // An email that doesn't normalize can't name a stored user.
        let email = Email::parse(email).map_err(|_| IdentityError::UserNotFound(email.to_string()))?;

        let users = self.repo.load_users().await?.value;
        let record = users
            .get(&email)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(email.to_string()))?;

        if !record.password_digest.matches(password) {
            return Err(IdentityError::BadCredentials);
        }

        self.repo.set_session(&email).await?;
        tracing::debug!(email = %email, "signed in");
        Ok(record)
    }

    /// Sign out. Idempotent.
    pub async fn logout(&self) -> Result<()> {
        self.repo.clear_session().await?;
        tracing::debug!("signed out");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Session Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Resolve the session pointer against the user table.
    ///
    /// Returns `None` when anonymous, and also when the pointer names a user
    /// that is not stored.
    pub async fn current_user(&self) -> Result<Option<UserRecord>> {
        let Some(pointer) = self.repo.load_session().await? else {
            return Ok(None);
        };

        let users = self.repo.load_users().await?.value;
        if let Some(record) = users.get(&pointer.email) {
            return Ok(Some(record.clone()));
        }

        tracing::debug!(email = %pointer.email, "session names a missing user");
        if self.config.clear_dangling_session {
            self.repo.clear_session().await?;
        }
        Ok(None)
    }

    pub async fn session_state(&self) -> Result<SessionState> {
        Ok(match self.current_user().await? {
            Some(user) => SessionState::Authenticated(user.email),
            None => SessionState::Anonymous,
        })
    }

    /// Header label: display name or email of the signed-in user.
    pub async fn header_label(&self) -> Result<Option<String>> {
        Ok(self
            .current_user()
            .await?
            .map(|user| user.display_label().to_string()))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Favorites and Subscriptions
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an article to the signed-in user's favorites.
    ///
    /// Returns whether it was appended; adding a present id is a no-op.
    pub async fn add_favorite(&self, article_id: &str) -> Result<bool> {
        self.append(ListKind::Favorites, article_id).await
    }

    /// Add a contact to the signed-in user's subscriptions.
    pub async fn add_subscription(&self, contact_id: &str) -> Result<bool> {
        self.append(ListKind::Subscriptions, contact_id).await
    }

    /// Favorites of the signed-in user; empty when anonymous.
    pub async fn favorites(&self) -> Result<Vec<String>> {
        self.list(ListKind::Favorites).await
    }

    /// Subscriptions of the signed-in user; empty when anonymous.
    pub async fn subscriptions(&self) -> Result<Vec<String>> {
        self.list(ListKind::Subscriptions).await
    }

    pub async fn is_favorite(&self, article_id: &str) -> Result<bool> {
        Ok(self
            .current_user()
            .await?
            .is_some_and(|user| user.favorites.contains(article_id.trim())))
    }

    async fn list(&self, kind: ListKind) -> Result<Vec<String>> {
        Ok(self
            .current_user()
            .await?
            .map(|user| kind.of(&user).to_vec())
            .unwrap_or_default())
    }

    async fn append(&self, kind: ListKind, id: &str) -> Result<bool> {
        let id = id.trim();
        if id.is_empty() {
            return Err(IdentityError::InvalidIdentifier(id.to_string()));
        }

        let email = self
            .current_user()
            .await?
            .map(|user| user.email)
            .ok_or(IdentityError::NotAuthenticated)?;

        self.mutate_users(|table| {
            // The record may have vanished since the session was resolved.
            let lists = table
                .lists_mut(&email)
                .ok_or(IdentityError::NotAuthenticated)?;
            let added = kind.of_mut(lists).insert(id);
            Ok((added, added))
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    /// Read-modify-write of the user table.
    ///
    /// `apply` returns its output and whether the table changed. Unchanged
    /// tables are not written. A stale write reloads and re-applies, up to
    /// `write_retries` extra times.
    async fn mutate_users<T, F>(&self, mut apply: F) -> Result<T>
    where
        F: FnMut(&mut UserTable) -> Result<(T, bool)>,
    {
        let attempts = self.config.write_retries.saturating_add(1);

        for attempt in 1..=attempts {
            let Snapshot {
                value: mut table,
                revision,
            } = self.repo.load_users().await?;

            let (output, changed) = apply(&mut table)?;
            if !changed {
                return Ok(output);
            }

            match self.repo.save_users(&table, revision).await? {
                SaveOutcome::Saved { .. } => return Ok(output),
                SaveOutcome::Stale => {
                    tracing::debug!(attempt, attempts, "user table write was stale, retrying");
                }
            }
        }

        Err(IdentityError::WriteConflict {
            slot: self.config.users_slot.clone(),
            attempts,
        })
    }

    async fn report<T>(
        &self,
        kind: AuthEventKind,
        raw_email: &str,
        result: &Result<T>,
        client: &ClientMeta,
    ) {
        if !self.config.notify_auth_attempts {
            return;
        }

        let outcome = match result {
            Ok(_) => AuthOutcome::Success,
            Err(e) => AuthOutcome::Failure(failure_reason(e)),
        };
        let email = Email::parse(raw_email)
            .map(Email::into_string)
            .unwrap_or_else(|_| raw_email.trim().to_string());

        let event = AuthEvent {
            kind,
            email,
            outcome,
            client: client.clone(),
            at: now_millis(),
        };

        if let Err(e) = self.notifier.notify(&event).await {
            tracing::warn!(kind = ?kind, error = %e, "auth notification failed");
        }
    }
}

fn failure_reason(error: &IdentityError) -> FailureReason {
    match error {
        IdentityError::AlreadyExists(_) => FailureReason::AlreadyExists,
        IdentityError::UserNotFound(_) | IdentityError::BadCredentials => {
            FailureReason::InvalidCredentials
        }
        IdentityError::InvalidEmail(_) => FailureReason::InvalidEmail,
        _ => FailureReason::Internal,
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
