use recordbook_core::{
    AuthConfig, AuthError, AuthService, ConfigError, CredentialField, EntryContent, EntryDraft,
    RecordStore, Session, StoreError,
};

fn fast_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.hashing.iterations = 8;
    config
}

async fn setup() -> (RecordStore, AuthService) {
    let store = RecordStore::open_in_memory().await.unwrap();
    let service = AuthService::with_config(store.clone(), fast_config()).unwrap();
    (store, service)
}

async fn signed_in(service: &AuthService, username: &str) -> Session {
    service.register(username, "pass1234").await.unwrap();
    service.login(username, "pass1234").await.unwrap()
}

fn content(name: &str) -> EntryContent {
    EntryContent::new(name, "Addr", "Lic")
}

#[tokio::test]
async fn end_to_end_scenario_for_one_user() {
    let (_store, service) = setup().await;

    service.register("alice", "1234").await.unwrap();
    assert!(matches!(
        service.login("alice", "wrong").await,
        Err(AuthError::InvalidCredentials)
    ));
    let session = service.login("alice", "1234").await.unwrap();
    let alice = session.identity();
    assert_eq!(alice.as_str(), "alice");

    let added = service.add_entry(alice, content("N")).await.unwrap();
    assert_eq!(added.id, 1);
    assert_eq!(added.user_id, "alice");
    assert_eq!(service.list_owned_entries(alice).await.unwrap(), vec![added]);

    service.update_entry(alice, 1, content("N2")).await.unwrap();
    let listed = service.list_owned_entries(alice).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content.name, "N2");

    service.delete_entry(alice, 1).await.unwrap();
    assert!(service.list_owned_entries(alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn registering_same_username_twice_is_rejected() {
    let (store, service) = setup().await;

    service.register("alice", "1234").await.unwrap();
    let err = service.register("alice", "5678").await.unwrap_err();
    assert!(matches!(err, AuthError::UsernameTaken(ref name) if name == "alice"));

    // The first password still works; the second was never written.
    service.login("alice", "1234").await.unwrap();
    assert!(service.login("alice", "5678").await.is_err());
    assert_eq!(store.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn weak_credentials_are_rejected_without_writing() {
    let (store, service) = setup().await;

    let short_name = service.register("ab", "1234").await.unwrap_err();
    assert!(matches!(
        short_name,
        AuthError::WeakCredential {
            field: CredentialField::Username,
            min_chars: 3
        }
    ));

    let short_password = service.register("abc", "123").await.unwrap_err();
    assert!(matches!(
        short_password,
        AuthError::WeakCredential {
            field: CredentialField::Password,
            min_chars: 4
        }
    ));

    assert!(store.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn credential_minimums_follow_configuration() {
    let store = RecordStore::open_in_memory().await.unwrap();
    let mut config = fast_config();
    config.credentials.min_username_chars = 1;
    config.credentials.min_password_chars = 10;
    let service = AuthService::with_config(store, config).unwrap();

    service.register("x", "0123456789").await.unwrap();
    let err = service.register("y", "012345678").await.unwrap_err();
    assert!(matches!(err, AuthError::WeakCredential { min_chars: 10, .. }));
}

#[tokio::test]
async fn zero_hash_iterations_are_refused() {
    let store = RecordStore::open_in_memory().await.unwrap();
    let mut config = fast_config();
    config.hashing.iterations = 0;

    let err = AuthService::with_config(store, config).unwrap_err();
    assert_eq!(err, ConfigError::ZeroIterations);
}

#[tokio::test]
async fn unknown_user_and_wrong_password_look_the_same() {
    let (_store, service) = setup().await;
    service.register("alice", "1234").await.unwrap();

    let unknown = service.login("nobody", "1234").await.unwrap_err();
    let wrong = service.login("alice", "4321").await.unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn usernames_are_case_sensitive() {
    let (_store, service) = setup().await;

    service.register("alice", "1234").await.unwrap();
    service.register("Alice", "abcd").await.unwrap();

    assert!(service.login("ALICE", "1234").await.is_err());
    assert!(service.login("Alice", "1234").await.is_err());
    assert_eq!(
        service.login("Alice", "abcd").await.unwrap().identity().as_str(),
        "Alice"
    );
}

#[tokio::test]
async fn stored_credentials_never_contain_the_plaintext() {
    let (store, service) = setup().await;
    service.register("alice", "hunter22").await.unwrap();

    let user = store.get_user("alice").await.unwrap().unwrap();
    assert_ne!(user.password.hash, "hunter22");
    assert_eq!(user.password.hash.len(), 64);
    assert_eq!(user.password.salt.len(), 32);
    assert_eq!(user.password.iterations, 8);
}

#[tokio::test]
async fn users_registered_under_older_iteration_count_can_still_log_in() {
    let store = RecordStore::open_in_memory().await.unwrap();
    let old = AuthService::with_config(store.clone(), fast_config()).unwrap();
    old.register("alice", "1234").await.unwrap();

    let mut stronger = fast_config();
    stronger.hashing.iterations = 32;
    let new = AuthService::with_config(store, stronger).unwrap();

    new.login("alice", "1234").await.unwrap();
}

#[tokio::test]
async fn entries_of_one_identity_are_invisible_to_another() {
    let (_store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    let bob = signed_in(&service, "bob").await;

    let secret = service
        .add_entry(alice.identity(), content("alice only"))
        .await
        .unwrap();
    let mine = service
        .add_entry(bob.identity(), content("bob only"))
        .await
        .unwrap();

    let bob_view = service.list_owned_entries(bob.identity()).await.unwrap();
    assert_eq!(bob_view, vec![mine]);
    assert!(bob_view.iter().all(|entry| entry.id != secret.id));

    let err = service
        .get_owned_entry(bob.identity(), secret.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotOwned(id) if id == secret.id));
}

#[tokio::test]
async fn updating_someone_elses_entry_is_refused_and_leaves_it_unchanged() {
    let (store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    let bob = signed_in(&service, "bob").await;
    let entry = service
        .add_entry(alice.identity(), content("original"))
        .await
        .unwrap();

    let err = service
        .update_entry(bob.identity(), entry.id, content("hijacked"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::NotOwned(id) if id == entry.id));
    assert_eq!(store.get_entry(entry.id).await.unwrap(), Some(entry));
}

#[tokio::test]
async fn deleting_someone_elses_entry_is_refused_and_keeps_it() {
    let (store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    let bob = signed_in(&service, "bob").await;
    let entry = service
        .add_entry(alice.identity(), content("keep me"))
        .await
        .unwrap();

    let err = service
        .delete_entry(bob.identity(), entry.id)
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::NotOwned(_)));
    assert!(store.get_entry(entry.id).await.unwrap().is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_update_never_revives_a_deleted_entry() {
    let (store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;

    for round in 0..100 {
        let entry = service
            .add_entry(alice.identity(), content("racing"))
            .await
            .unwrap();

        let (updated, deleted) = tokio::join!(
            service.update_entry(alice.identity(), entry.id, content("edited")),
            service.delete_entry(alice.identity(), entry.id),
        );

        deleted.unwrap();
        assert!(
            matches!(updated, Ok(_) | Err(AuthError::NotFound(_))),
            "round {round}: unexpected update outcome {updated:?}"
        );
        assert!(
            store.get_entry(entry.id).await.unwrap().is_none(),
            "round {round}: entry {} is stored after its delete succeeded",
            entry.id
        );
    }
}

#[tokio::test]
async fn update_preserves_id_and_owner() {
    let (_store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    let entry = service
        .add_entry(alice.identity(), content("before"))
        .await
        .unwrap();

    let updated = service
        .update_entry(
            alice.identity(),
            entry.id,
            EntryContent::new("after", "Elm 3", "Z-1"),
        )
        .await
        .unwrap();

    assert_eq!(updated.id, entry.id);
    assert_eq!(updated.user_id, "alice");
    assert_eq!(updated.content, EntryContent::new("after", "Elm 3", "Z-1"));
}

#[tokio::test]
async fn update_or_get_of_missing_entry_is_not_found() {
    let (_store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;

    let update = service
        .update_entry(alice.identity(), 42, content("ghost"))
        .await
        .unwrap_err();
    let get = service.get_owned_entry(alice.identity(), 42).await.unwrap_err();

    assert!(matches!(update, AuthError::NotFound(42)));
    assert!(matches!(get, AuthError::NotFound(42)));
}

#[tokio::test]
async fn deleting_twice_succeeds_both_times() {
    let (store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    let keep = service.add_entry(alice.identity(), content("keep")).await.unwrap();
    let gone = service.add_entry(alice.identity(), content("gone")).await.unwrap();

    service.delete_entry(alice.identity(), gone.id).await.unwrap();
    service.delete_entry(alice.identity(), gone.id).await.unwrap();

    assert_eq!(store.list_entries().await.unwrap(), vec![keep]);
}

#[tokio::test]
async fn added_entries_get_fresh_positive_ids() {
    let (_store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;

    let first = service.add_entry(alice.identity(), content("1")).await.unwrap();
    service.delete_entry(alice.identity(), first.id).await.unwrap();
    let second = service.add_entry(alice.identity(), content("2")).await.unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);
    let listed = service.list_owned_entries(alice.identity()).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].content, content("2"));
}

#[tokio::test]
async fn orphaned_entries_stay_invisible() {
    let (store, service) = setup().await;
    let alice = signed_in(&service, "alice").await;
    store
        .add_entry(EntryDraft::new("ghost", content("orphan")))
        .await
        .unwrap();

    assert!(service
        .list_owned_entries(alice.identity())
        .await
        .unwrap()
        .is_empty());
    assert_eq!(store.list_entries().await.unwrap().len(), 1);
}

#[tokio::test]
async fn session_tracks_edit_target_until_logout() {
    let (_store, service) = setup().await;
    let mut session = signed_in(&service, "alice").await;
    let entry = service
        .add_entry(session.identity(), content("draft"))
        .await
        .unwrap();

    let loaded = service
        .get_owned_entry(session.identity(), entry.id)
        .await
        .unwrap();
    session.begin_edit(loaded.id);
    assert_eq!(session.editing(), Some(entry.id));

    let editing = session.finish_edit().unwrap();
    service
        .update_entry(session.identity(), editing, content("final"))
        .await
        .unwrap();
    assert_eq!(session.editing(), None);

    service.logout(session);
}

#[test]
fn store_errors_map_to_service_vocabulary() {
    let taken = AuthError::from(StoreError::DuplicateKey {
        collection: "users",
        key: "alice".to_string(),
    });
    assert!(matches!(taken, AuthError::UsernameTaken(ref name) if name == "alice"));

    let unavailable = AuthError::from(StoreError::UninitializedConnection {
        expected_version: 2,
        actual_version: 0,
    });
    assert!(matches!(unavailable, AuthError::StoreUnavailable(_)));
    assert_eq!(unavailable.to_string(), "record storage is unavailable");

    let failed = AuthError::from(StoreError::Interrupted("worker panicked".to_string()));
    assert!(matches!(failed, AuthError::TransactionFailed(_)));
    assert!(!failed.to_string().contains("worker"));
}
