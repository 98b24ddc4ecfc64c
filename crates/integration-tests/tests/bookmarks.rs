//! Bookmark set lifecycle: refresh on sign-in, toggles, and user switches.

use std::sync::Arc;
use std::time::Duration;

use herbal_garden_core::PlantId;
use herbal_garden_integration_tests::{FakeGarden, ops, paths};
use herbal_garden_web::services::GardenSession;
use herbal_garden_web::services::bookmarks::{self, ToggleFailure};

fn ids(session_ids: impl Iterator<Item = PlantId>) -> Vec<PlantId> {
    let mut ids: Vec<_> = session_ids.collect();
    ids.sort_unstable();
    ids
}

#[tokio::test]
async fn test_sign_in_loads_users_bookmarks() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[3, 7]);
    let session = GardenSession::start(fake.backend());

    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    let store = session.bookmarks().await;
    assert_eq!(ids(store.ids()), vec![PlantId::new(3), PlantId::new(7)]);
    drop(store);

    let syncs = fake.requests_to(paths::USERS_SYNC);
    assert_eq!(syncs.len(), 1);
    assert_eq!(syncs[0].body["google_id"], "u1");
    assert_eq!(syncs[0].body["email"], "u1@example.com");
    assert!(
        syncs[0]
            .authorization
            .as_deref()
            .is_some_and(|auth| auth.starts_with("Bearer id-u1-"))
    );
}

#[tokio::test]
async fn test_sync_failure_still_refreshes() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[2]);
    fake.fail(ops::SYNC_USER, 500, "boom");
    let session = GardenSession::start(fake.backend());

    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    assert!(session.bookmarks().await.contains(PlantId::new(2)));
}

#[tokio::test]
async fn test_refresh_failure_leaves_set_empty() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[3, 7]);
    fake.fail(ops::BOOKMARKS, 500, r#"{"detail":"database unavailable"}"#);
    let session = GardenSession::start(fake.backend());

    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    assert!(session.bookmarks().await.is_empty());
}

#[tokio::test]
async fn test_toggle_creates_bookmark() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    let outcome = bookmarks::toggle(&session, &backend, PlantId::new(5), "Ashwagandha")
        .await
        .expect("toggle should succeed");
    assert!(!outcome.was_bookmarked);
    assert_eq!(outcome.message("Ashwagandha"), "Bookmarked \"Ashwagandha\".");
    assert!(session.apply_toggle(outcome.ticket, outcome.plant, outcome.was_bookmarked).await);

    assert!(session.bookmarks().await.contains(PlantId::new(5)));
    assert!(fake.bookmarks_of("u1").contains(&5));

    let create = fake
        .requests()
        .into_iter()
        .find(|r| r.method == "POST" && r.path == paths::BOOKMARKS)
        .expect("create request recorded");
    assert_eq!(
        create.body,
        serde_json::json!({"plant_id": 5, "user_google_id": "u1"})
    );
    assert!(
        create
            .authorization
            .as_deref()
            .is_some_and(|auth| auth.starts_with("Bearer "))
    );
}

#[tokio::test]
async fn test_toggle_removes_bookmark() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[3]);
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    let outcome = bookmarks::toggle(&session, &backend, PlantId::new(3), "Tulsi")
        .await
        .expect("toggle should succeed");
    assert!(outcome.was_bookmarked);
    assert!(session.apply_toggle(outcome.ticket, outcome.plant, outcome.was_bookmarked).await);

    assert!(session.bookmarks().await.is_empty());
    assert!(fake.bookmarks_of("u1").is_empty());
    assert_eq!(fake.requests_to("/bookmarks/u1/3")[0].method, "DELETE");
}

#[tokio::test]
async fn test_conflict_leaves_set_unchanged() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    // Bookmarked elsewhere after this session loaded its set.
    fake.set_bookmarks("u1", &[2]);

    let failure = bookmarks::toggle(&session, &backend, PlantId::new(2), "Neem")
        .await
        .expect_err("toggle should conflict");
    assert_eq!(failure.to_string(), "Plant \"Neem\" is already bookmarked by you.");
    assert!(session.bookmarks().await.is_empty());
}

#[tokio::test]
async fn test_missing_bookmark_on_delete() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[7]);
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    fake.set_bookmarks("u1", &[]);

    let failure = bookmarks::toggle(&session, &backend, PlantId::new(7), "Turmeric")
        .await
        .expect_err("delete should miss");
    assert!(matches!(failure, ToggleFailure::NotFound { .. }));
    assert_eq!(
        failure.to_string(),
        "Bookmark for \"Turmeric\" not found. It might already be unbookmarked."
    );
    assert!(session.bookmarks().await.contains(PlantId::new(7)));
}

#[tokio::test]
async fn test_server_error_detail_in_message() {
    let fake = FakeGarden::start().await;
    fake.fail(ops::CREATE_BOOKMARK, 500, r#"{"detail":"database unavailable"}"#);
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    let failure = bookmarks::toggle(&session, &backend, PlantId::new(1), "Aloe Vera")
        .await
        .expect_err("toggle should fail");
    assert_eq!(
        failure.to_string(),
        "Failed to toggle bookmark for \"Aloe Vera\". Error: database unavailable"
    );
}

#[tokio::test]
async fn test_toggle_requires_sign_in() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.settled().await;

    let failure = bookmarks::toggle(&session, &backend, PlantId::new(1), "Aloe Vera")
        .await
        .expect_err("toggle needs a user");
    assert!(matches!(failure, ToggleFailure::SignInRequired));
    assert!(fake.requests_to(paths::BOOKMARKS).is_empty());
}

#[tokio::test]
async fn test_toggle_confirmed_after_user_switch_is_discarded() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u2", &[1]);
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;

    fake.delay(ops::CREATE_BOOKMARK, Duration::from_millis(300));
    let pending = {
        let session = Arc::clone(&session);
        let backend = backend.clone();
        tokio::spawn(async move {
            bookmarks::toggle(&session, &backend, PlantId::new(5), "Ashwagandha").await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    session.sign_out();
    session.sign_in(fake.sign_in("u2").await);
    session.settled().await;

    let outcome = pending
        .await
        .expect("toggle task")
        .expect("backend confirmed the toggle");
    assert!(!session.apply_toggle(outcome.ticket, outcome.plant, outcome.was_bookmarked).await);

    let store = session.bookmarks().await;
    assert_eq!(ids(store.ids()), vec![PlantId::new(1)]);
}

#[tokio::test]
async fn test_sign_out_clears_set() {
    let fake = FakeGarden::start().await;
    fake.set_bookmarks("u1", &[3, 7]);
    let session = GardenSession::start(fake.backend());
    session.sign_in(fake.sign_in("u1").await);
    session.settled().await;
    assert_eq!(session.bookmarks().await.len(), 2);

    session.sign_out();
    session.settled().await;

    assert!(session.bookmarks().await.is_empty());
    assert!(session.user().is_none());
}
