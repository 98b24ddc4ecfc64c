//! Firebase sign-in and token refresh against the fake provider.

use herbal_garden_integration_tests::{FakeGarden, paths};
use herbal_garden_web::identity::IdentityError;

#[tokio::test]
async fn test_sign_in_profile() {
    let fake = FakeGarden::start().await;
    let user = fake.sign_in("u1").await;

    assert_eq!(user.uid().as_str(), "u1");
    assert_eq!(user.greeting_name(), "Gardener u1");
    assert_eq!(user.email().map(|e| e.as_str()), Some("u1@example.com"));

    let request = &fake.requests_to(paths::SIGN_IN)[0];
    assert_eq!(request.query.as_deref(), Some("key=test-firebase-api-key"));
    assert_eq!(request.body["postBody"], "id_token=u1&providerId=google.com");
    assert_eq!(request.body["returnSecureToken"], true);
}

#[tokio::test]
async fn test_rejected_credential() {
    let fake = FakeGarden::start().await;

    let error = fake
        .identity()
        .sign_in_with_google("rejected-token")
        .await
        .expect_err("credential should be rejected");
    assert!(matches!(error, IdentityError::Rejected(ref code) if code == "INVALID_IDP_RESPONSE"));
}

#[tokio::test]
async fn test_blank_credential_is_cancelled() {
    let fake = FakeGarden::start().await;

    let error = fake
        .identity()
        .sign_in_with_google("  ")
        .await
        .expect_err("blank credential");
    assert!(matches!(error, IdentityError::Cancelled));
    assert!(fake.requests().is_empty());
}

#[tokio::test]
async fn test_fresh_token_is_reused() {
    let fake = FakeGarden::start().await;
    let user = fake.sign_in("u1").await;

    let first = user.id_token().await.expect("token");
    let second = user.id_token().await.expect("token");
    assert_eq!(first, second);
    assert!(fake.requests_to(paths::TOKEN).is_empty());
}

#[tokio::test]
async fn test_expiring_token_is_refreshed() {
    let fake = FakeGarden::start().await;
    fake.set_token_lifetime(30);
    let user = fake.sign_in("u1").await;

    fake.set_token_lifetime(3600);
    let token = user.id_token().await.expect("refreshed token");
    assert_eq!(token, "id-u1-2");

    let refreshes = fake.requests_to(paths::TOKEN);
    assert_eq!(refreshes.len(), 1);
    assert_eq!(refreshes[0].body["grant_type"], "refresh_token");
    assert_eq!(refreshes[0].body["refresh_token"], "refresh-u1");

    // The refreshed token is good for an hour.
    assert_eq!(user.id_token().await.expect("token"), "id-u1-2");
    assert_eq!(fake.requests_to(paths::TOKEN).len(), 1);
}
