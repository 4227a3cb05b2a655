//! End-to-end account scenarios over real slot stores.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nevpn_account::core::{encode_users, InsertResult, UserTable};
use nevpn_account::store::{MemoryStore, SlotStore, SqliteStore, StoreError};
use nevpn_account::{
    digest, AuthEventKind, AuthOutcome, ClientMeta, Email, FailureReason, IdentityConfig,
    IdentityError, IdentityRepository, IdentityService, PasswordDigest, RecordingNotifier,
    SaveOutcome, SessionPointer, SlotRepository, Snapshot, UserRecord,
};
use proptest::prelude::*;

type MemoryService = IdentityService<SlotRepository<MemoryStore>>;

fn memory_service() -> MemoryService {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let config = IdentityConfig::default();
    IdentityService::new(SlotRepository::new(MemoryStore::new(), &config), config)
}

#[tokio::test]
async fn duplicate_registration_is_rejected_and_first_record_kept() {
    let svc = memory_service();
    let first = svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    let err = svc.register("Impostor", "ANN@X.COM", "p2").await.unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyExists(ref e) if e == "ann@x.com"));

    let users = svc.repository().load_users().await.unwrap().value;
    assert_eq!(users.len(), 1);
    assert_eq!(users.get(&first.email), Some(&first));
    assert!(svc.login("ann@x.com", "p1").await.is_ok());
    assert!(svc.login("ann@x.com", "p2").await.is_err());
}

#[test]
fn digest_is_deterministic() {
    assert_eq!(digest("a"), digest("a"));
    assert_ne!(digest("a"), digest("b"));
}

#[tokio::test]
async fn login_after_register_establishes_session() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    svc.logout().await.unwrap();

    let user = svc.login("ann@x.com", "p1").await.unwrap();
    assert_eq!(user.email.as_str(), "ann@x.com");
    let current = svc.current_user().await.unwrap().unwrap();
    assert_eq!(current.email.as_str(), "ann@x.com");
}

#[tokio::test]
async fn wrong_password_leaves_session_unchanged() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    svc.register("Bob", "bob@x.com", "p2").await.unwrap();

    // Signed in as Bob; failed login as Ann keeps Bob
    let err = svc.login("ann@x.com", "wrong").await.unwrap_err();
    assert!(matches!(err, IdentityError::BadCredentials));
    let current = svc.current_user().await.unwrap().unwrap();
    assert_eq!(current.email.as_str(), "bob@x.com");

    // Anonymous stays anonymous
    svc.logout().await.unwrap();
    assert!(svc.login("ann@x.com", "wrong").await.is_err());
    assert!(svc.current_user().await.unwrap().is_none());
}

#[tokio::test]
async fn favorite_added_twice_is_stored_once() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    assert!(svc.add_favorite("art-1").await.unwrap());
    assert!(!svc.add_favorite("art-1").await.unwrap());

    let user = svc.current_user().await.unwrap().unwrap();
    assert_eq!(user.favorites.as_slice(), ["art-1".to_string()]);
}

#[tokio::test]
async fn favorites_keep_first_insertion_order_across_sessions() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    svc.add_favorite("art-2").await.unwrap();
    svc.add_favorite("art-1").await.unwrap();
    svc.logout().await.unwrap();

    svc.login("ann@x.com", "p1").await.unwrap();
    svc.add_favorite("art-2").await.unwrap();
    svc.add_favorite("art-3").await.unwrap();
    assert_eq!(svc.favorites().await.unwrap(), vec!["art-2", "art-1", "art-3"]);
}

#[tokio::test]
async fn logout_keeps_record_but_clears_current_user() {
    let svc = memory_service();
    let user = svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    svc.logout().await.unwrap();
    svc.logout().await.unwrap();

    assert!(svc.current_user().await.unwrap().is_none());
    let users = svc.repository().load_users().await.unwrap().value;
    assert!(users.contains(&user.email));
}

#[tokio::test]
async fn email_case_is_normalized_for_register_and_login() {
    let svc = memory_service();
    svc.register("Ann", "Ann@X.com", "p1").await.unwrap();

    let users = svc.repository().load_users().await.unwrap().value;
    let keys: Vec<&str> = users.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["ann@x.com"]);

    svc.logout().await.unwrap();
    let user = svc.login("ANN@x.com", "p1").await.unwrap();
    assert_eq!(user.name.as_deref(), Some("Ann"));
}

#[tokio::test]
async fn cleared_users_slot_makes_session_dangling() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    let repo = svc.repository();
    repo.store().remove(repo.users_slot()).await.unwrap();

    // Pointer still stored, but it resolves to nobody
    assert!(repo.load_session().await.unwrap().is_some());
    assert!(svc.current_user().await.unwrap().is_none());
    assert!(matches!(
        svc.add_favorite("art-1").await.unwrap_err(),
        IdentityError::NotAuthenticated
    ));
}

#[tokio::test]
async fn corrupt_users_slot_reads_as_no_users() {
    let svc = memory_service();
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    let repo = svc.repository();
    repo.store()
        .overwrite(repo.users_slot(), "\u{0}garbage")
        .await
        .unwrap();

    assert!(svc.current_user().await.unwrap().is_none());
    assert!(svc.login("ann@x.com", "p1").await.unwrap_err().is_credential_failure());

    // The account can be registered again over the corrupt slot
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    assert!(svc.current_user().await.unwrap().is_some());
}

#[tokio::test]
async fn accounts_persist_in_sqlite_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("account.db");
    let config = IdentityConfig::default();

    {
        let store = SqliteStore::open(&path).unwrap();
        let svc = IdentityService::new(SlotRepository::new(store, &config), config.clone());
        svc.register("Ann", "ann@x.com", "p1").await.unwrap();
        svc.add_favorite("art-1").await.unwrap();
        svc.add_subscription("contact-7").await.unwrap();
    }

    let store = SqliteStore::open(&path).unwrap();
    let svc = IdentityService::new(SlotRepository::new(store, &config), config);
    let user = svc.current_user().await.unwrap().unwrap();
    assert_eq!(user.email.as_str(), "ann@x.com");
    assert_eq!(user.favorites.as_slice(), ["art-1".to_string()]);
    assert_eq!(user.subscriptions.as_slice(), ["contact-7".to_string()]);
    assert_eq!(user.password_digest, PasswordDigest::compute("p1"));
}

#[tokio::test]
async fn snapshot_from_before_a_cleared_store_cannot_overwrite_new_accounts() {
    async fn run<S: SlotStore + 'static>(store: Arc<S>) {
        let config = IdentityConfig::default();
        let tab_a = IdentityService::new(
            SlotRepository::with_shared(store.clone(), &config),
            config.clone(),
        );
        let tab_b = IdentityService::new(
            SlotRepository::with_shared(store.clone(), &config),
            config.clone(),
        );

        tab_a.register("Ann", "ann@x.com", "p1").await.unwrap();
        let old = tab_a.repository().load_users().await.unwrap();
        assert_eq!(old.revision, Some(1));

        store.remove(&config.users_slot).await.unwrap();
        tab_b.register("Bob", "bob@x.com", "p2").await.unwrap();

        let outcome = tab_a
            .repository()
            .save_users(&old.value, old.revision)
            .await
            .unwrap();
        assert_eq!(outcome, SaveOutcome::Stale);

        let users = tab_b.repository().load_users().await.unwrap().value;
        assert_eq!(users.len(), 1);
        assert!(users.contains(&Email::parse("bob@x.com").unwrap()));
        assert!(tab_b.login("bob@x.com", "p2").await.is_ok());
    }

    run(Arc::new(MemoryStore::new())).await;
    run(Arc::new(SqliteStore::open_memory().unwrap())).await;
}

#[tokio::test]
async fn two_tabs_on_one_store_see_each_others_writes() {
    let config = IdentityConfig::default();
    let store = Arc::new(MemoryStore::new());
    let tab_a = IdentityService::new(
        SlotRepository::with_shared(store.clone(), &config),
        config.clone(),
    );
    let tab_b = IdentityService::new(SlotRepository::with_shared(store, &config), config);

    tab_a.register("Ann", "ann@x.com", "p1").await.unwrap();
    tab_b.register("Bob", "bob@x.com", "p2").await.unwrap();

    // Both tabs share the session slot, so the later login wins
    assert_eq!(
        tab_a.current_user().await.unwrap().unwrap().email.as_str(),
        "bob@x.com"
    );

    let (a, b) = tokio::join!(
        tab_a.register("Carol", "carol@x.com", "p3"),
        tab_b.register("Carol again", "CAROL@x.com", "p4"),
    );
    assert!(a.is_ok() ^ b.is_ok());

    let users = tab_a.repository().load_users().await.unwrap().value;
    assert_eq!(users.len(), 3);
}

/// Repository that lets another writer land a change right before our first save.
struct RacingRepository {
    inner: SlotRepository<MemoryStore>,
    raced: AtomicBool,
    always: bool,
}

impl RacingRepository {
    fn new(always: bool) -> Self {
        Self {
            inner: SlotRepository::new(MemoryStore::new(), &IdentityConfig::default()),
            raced: AtomicBool::new(false),
            always,
        }
    }

    async fn interfere(&self) {
        let mut table = self.inner.load_users().await.unwrap().value;
        let email = format!("other{}@x.com", table.len());
        let record = UserRecord::new(
            Email::parse(&email).unwrap(),
            None,
            PasswordDigest::compute("x"),
        );
        assert_eq!(table.insert(record), InsertResult::Inserted);
        let data = encode_users(&table).unwrap();
        self.inner
            .store()
            .overwrite(self.inner.users_slot(), &data)
            .await
            .unwrap();
    }
}

#[async_trait]
impl IdentityRepository for RacingRepository {
    async fn load_users(&self) -> nevpn_account::Result<Snapshot<UserTable>> {
        self.inner.load_users().await
    }

    async fn save_users(
        &self,
        table: &UserTable,
        base_revision: Option<u64>,
    ) -> nevpn_account::Result<SaveOutcome> {
        if self.always || !self.raced.swap(true, Ordering::SeqCst) {
            self.interfere().await;
        }
        self.inner.save_users(table, base_revision).await
    }

    async fn load_session(&self) -> nevpn_account::Result<Option<SessionPointer>> {
        self.inner.load_session().await
    }

    async fn set_session(&self, email: &Email) -> nevpn_account::Result<()> {
        self.inner.set_session(email).await
    }

    async fn clear_session(&self) -> nevpn_account::Result<()> {
        self.inner.clear_session().await
    }
}

#[tokio::test]
async fn stale_write_is_retried_without_losing_the_other_write() {
    let svc = IdentityService::new(RacingRepository::new(false), IdentityConfig::default());
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    let users = svc.repository().load_users().await.unwrap().value;
    assert_eq!(users.len(), 2);
    assert!(users.contains(&Email::parse("ann@x.com").unwrap()));
    assert!(users.contains(&Email::parse("other0@x.com").unwrap()));
}

#[tokio::test]
async fn persistent_contention_fails_with_write_conflict() {
    let config = IdentityConfig::default().with_write_retries(2);
    let svc = IdentityService::new(RacingRepository::new(true), config);

    let err = svc.register("Ann", "ann@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, IdentityError::WriteConflict { attempts: 3, .. }));
    assert!(svc.current_user().await.unwrap().is_none());
}

/// Repository whose session slot cannot be written.
struct ReadOnlySessionRepository {
    inner: SlotRepository<MemoryStore>,
}

#[async_trait]
impl IdentityRepository for ReadOnlySessionRepository {
    async fn load_users(&self) -> nevpn_account::Result<Snapshot<UserTable>> {
        self.inner.load_users().await
    }

    async fn save_users(
        &self,
        table: &UserTable,
        base_revision: Option<u64>,
    ) -> nevpn_account::Result<SaveOutcome> {
        self.inner.save_users(table, base_revision).await
    }

    async fn load_session(&self) -> nevpn_account::Result<Option<SessionPointer>> {
        self.inner.load_session().await
    }

    async fn set_session(&self, _email: &Email) -> nevpn_account::Result<()> {
        Err(StoreError::InvalidData("session slot is read-only".to_string()).into())
    }

    async fn clear_session(&self) -> nevpn_account::Result<()> {
        self.inner.clear_session().await
    }
}

#[tokio::test]
async fn register_succeeds_when_sign_in_cannot_be_saved() {
    let config = IdentityConfig::default();
    let svc = IdentityService::new(
        ReadOnlySessionRepository {
            inner: SlotRepository::new(MemoryStore::new(), &config),
        },
        config,
    );

    let user = svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    assert_eq!(user.email.as_str(), "ann@x.com");
    assert!(svc.current_user().await.unwrap().is_none());

    let users = svc.repository().load_users().await.unwrap().value;
    assert_eq!(users.get(&user.email), Some(&user));

    let err = svc.register("Ann", "ann@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, IdentityError::AlreadyExists(_)));
    let err = svc.login("ann@x.com", "p2").await.unwrap_err();
    assert!(matches!(err, IdentityError::BadCredentials));
}

#[tokio::test]
async fn auth_attempts_are_reported_without_secrets() {
    let config = IdentityConfig::default();
    let notifier = Arc::new(RecordingNotifier::new());
    let svc = IdentityService::with_notifier(
        SlotRepository::new(MemoryStore::new(), &config),
        notifier.clone(),
        config,
    );
    let client = ClientMeta {
        user_agent: Some("test-agent".into()),
        platform: Some("Linux x86_64".into()),
        language: Some("ru-RU".into()),
        timezone: Some("Europe/Moscow".into()),
        screen: Some("1920x1080 @24".into()),
        viewport: Some("1280x720".into()),
        page: Some("https://nevpn.example/account".into()),
        referrer: Some("https://search.example/".into()),
        utm: vec![("utm_source".into(), "tg".into())],
    };

    svc.register_with_meta("Ann", "Ann@X.com", "s3cret-pass", &client)
        .await
        .unwrap();
    let _ = svc.register("Ann", "ann@x.com", "s3cret-pass").await;
    let _ = svc.login_with_meta("ann@x.com", "wrong-pass", &client).await;
    let _ = svc.login("ghost@x.com", "s3cret-pass").await;
    svc.login("ann@x.com", "s3cret-pass").await.unwrap();

    let events = notifier.events();
    assert_eq!(events.len(), 5);

    assert_eq!(events[0].kind, AuthEventKind::Register);
    assert_eq!(events[0].email, "ann@x.com");
    assert_eq!(events[0].outcome, AuthOutcome::Success);
    assert_eq!(events[0].client, client);

    assert_eq!(
        events[1].outcome,
        AuthOutcome::Failure(FailureReason::AlreadyExists)
    );
    // Unknown user and wrong password look the same downstream
    assert_eq!(events[2].outcome, events[3].outcome);
    assert_eq!(
        events[2].outcome,
        AuthOutcome::Failure(FailureReason::InvalidCredentials)
    );
    assert_eq!(events[4].kind, AuthEventKind::Login);
    assert_eq!(events[4].outcome, AuthOutcome::Success);

    for event in &events {
        let rendered = format!("{:?}", event);
        assert!(!rendered.contains("s3cret-pass"));
        assert!(!rendered.contains("wrong-pass"));
    }
}

#[tokio::test]
async fn notifier_failure_does_not_change_the_result() {
    let config = IdentityConfig::default();
    let svc = IdentityService::with_notifier(
        SlotRepository::new(MemoryStore::new(), &config),
        RecordingNotifier::failing(),
        config,
    );

    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    assert!(svc.current_user().await.unwrap().is_some());
    assert_eq!(svc.notifier().events().len(), 1);
}

#[tokio::test]
async fn notifications_can_be_disabled() {
    let config = IdentityConfig::default().with_notify_auth_attempts(false);
    let svc = IdentityService::with_notifier(
        SlotRepository::new(MemoryStore::new(), &config),
        RecordingNotifier::new(),
        config,
    );

    svc.register("Ann", "ann@x.com", "p1").await.unwrap();
    assert!(svc.notifier().events().is_empty());
}

#[tokio::test]
async fn custom_slot_names_are_used() {
    let config = IdentityConfig::default().with_slots("users-v1", "session-v1");
    let svc = IdentityService::new(SlotRepository::new(MemoryStore::new(), &config), config);
    svc.register("Ann", "ann@x.com", "p1").await.unwrap();

    let names = svc.repository().store().slot_names().await.unwrap();
    assert_eq!(names, vec!["session-v1", "users-v1"]);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn login_accepts_any_case_of_the_registered_email(
        local in "[a-z]{1,10}",
        domain in "[a-z]{1,8}",
        upper_mask in any::<u32>(),
        password in "[ -~]{0,20}",
    ) {
        let email = format!("{}@{}.com", local, domain);
        let variant: String = email
            .chars()
            .enumerate()
            .map(|(i, c)| if upper_mask & (1 << (i % 32)) != 0 { c.to_ascii_uppercase() } else { c })
            .collect();

        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let svc = memory_service();
            svc.register("", &variant, &password).await.unwrap();
            svc.logout().await.unwrap();

            let user = svc.login(&email.to_uppercase(), &password).await.unwrap();
            assert_eq!(user.email.as_str(), email);
            let wrong = format!("{}!", password);
            assert!(svc.login(&email, &wrong).await.is_err());
        });
    }
}
