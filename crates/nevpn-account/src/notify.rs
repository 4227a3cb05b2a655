//! Auth-attempt notifications.
//!
//! The site reports every register and login attempt to an outside channel.
//! [`AuthEvent`] carries the email, the outcome, and coarse client metadata.
//! It has no field for the submitted password, so no notifier can leak it.
//!
//! Delivery itself (HTTP, chat bots) lives outside this crate behind
//! [`AuthNotifier`].

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{NotifyError, NotifyResult};

/// Which form was submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    Register,
    Login,
}

/// Why an attempt failed, as far as the notification channel is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    AlreadyExists,
    /// Unknown email or wrong password. Not distinguished.
    InvalidCredentials,
    InvalidEmail,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure(FailureReason),
}

/// Coarse, non-secret client metadata supplied by the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// Screen size and depth, e.g. `1920x1080 @24`.
    pub screen: Option<String>,
    /// Window inner size, e.g. `1280x720`.
    pub viewport: Option<String>,
    pub page: Option<String>,
    pub referrer: Option<String>,
    /// `utm_*` query parameters as `(key, value)` pairs, in page order.
    pub utm: Vec<(String, String)>,
}

impl ClientMeta {
    /// UTM tags joined as `k=v & k=v`, or `None` when there are none.
    pub fn utm_summary(&self) -> Option<String> {
        if self.utm.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.utm.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        Some(parts.join(" & "))
    }
}

/// One register or login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// Normalized email when it parsed, the raw submission otherwise.
    pub email: String,
    pub outcome: AuthOutcome,
    pub client: ClientMeta,
    /// When the attempt finished (Unix ms).
    pub at: i64,
}

/// Receives auth-attempt events.
///
/// The service logs a returned [`NotifyError`] and moves on.
#[async_trait]
pub trait AuthNotifier: Send + Sync {
    async fn notify(&self, event: &AuthEvent) -> NotifyResult<()>;
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl AuthNotifier for NoopNotifier {
    async fn notify(&self, _event: &AuthEvent) -> NotifyResult<()> {
        Ok(())
    }
}

/// Emits each event as a tracing `info` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl AuthNotifier for TracingNotifier {
    async fn notify(&self, event: &AuthEvent) -> NotifyResult<()> {
        tracing::info!(
            kind = ?event.kind,
            email = %event.email,
            outcome = ?event.outcome,
            user_agent = event.client.user_agent.as_deref().unwrap_or("-"),
            platform = event.client.platform.as_deref().unwrap_or("-"),
            language = event.client.language.as_deref().unwrap_or("-"),
            timezone = event.client.timezone.as_deref().unwrap_or("-"),
            screen = event.client.screen.as_deref().unwrap_or("-"),
            viewport = event.client.viewport.as_deref().unwrap_or("-"),
            page = event.client.page.as_deref().unwrap_or("-"),
            referrer = event.client.referrer.as_deref().unwrap_or("-"),
            utm = event.client.utm_summary().as_deref().unwrap_or("-"),
            "auth attempt"
        );
        Ok(())
    }
}

/// Keeps every event in memory. Useful for testing.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<AuthEvent>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier that records events and then reports a delivery failure.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<AuthEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthNotifier for RecordingNotifier {
    async fn notify(&self, event: &AuthEvent) -> NotifyResult<()> {
        self.events
            .lock()
            .map_err(|e| NotifyError::Poisoned(e.to_string()))?
            .push(event.clone());
        if self.fail {
            return Err(NotifyError::Delivery("recording notifier set to fail".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl<N: AuthNotifier + ?Sized> AuthNotifier for std::sync::Arc<N> {
    async fn notify(&self, event: &AuthEvent) -> NotifyResult<()> {
        (**self).notify(event).await
    }
}
