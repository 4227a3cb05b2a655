//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::sync::Arc;

use nevpn_account::{
    IdentityConfig, IdentityService, RecordingNotifier, SlotRepository, UserRecord,
};
use nevpn_account_store::MemoryStore;

/// Service type used by [`TestFixture`].
pub type TestService = IdentityService<SlotRepository<MemoryStore>, Arc<RecordingNotifier>>;

/// Registration form values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestAccount {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl TestAccount {
    /// The account from the account-page walkthrough.
    pub fn ann() -> Self {
        Self {
            name: "Ann".to_string(),
            email: "Ann@X.com".to_string(),
            password: "p1".to_string(),
        }
    }

    /// An account with a random, unused email.
    pub fn random() -> Self {
        let tag: u64 = rand::random();
        Self {
            name: format!("user-{:x}", tag),
            email: format!("user-{:x}@example.test", tag),
            password: hex::encode(rand::random::<[u8; 8]>()),
        }
    }
}

/// A test fixture with an in-memory store and a recording notifier.
pub struct TestFixture {
    pub service: TestService,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestFixture {
    /// Create a new fixture with default configuration.
    pub fn new() -> Self {
        Self::with_config(IdentityConfig::default())
    }

    pub fn with_config(config: IdentityConfig) -> Self {
        let notifier = Arc::new(RecordingNotifier::new());
        let repo = SlotRepository::new(MemoryStore::new(), &config);
        Self {
            service: IdentityService::with_notifier(repo, notifier.clone(), config),
            notifier,
        }
    }

    /// Register `account`, panicking on failure.
    pub async fn register(&self, account: &TestAccount) -> UserRecord {
        self.service
            .register(&account.name, &account.email, &account.password)
            .await
            .expect("fixture registration failed")
    }

    /// Register a fresh random account and return it with its record.
    pub async fn register_random(&self) -> (TestAccount, UserRecord) {
        let account = TestAccount::random();
        let record = self.register(&account).await;
        (account, record)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
