//! Image identification uploads.

use std::sync::Arc;
use std::time::Duration;

use herbal_garden_core::{IdentifyError, IdentifyPhase, SelectedImage};
use herbal_garden_integration_tests::{FakeGarden, ops, paths};
use herbal_garden_web::services::{GardenSession, identify};

fn leaf() -> SelectedImage {
    SelectedImage::new("leaf.jpg", "image/jpeg", vec![0xff, 0xd8, 0xff, 0xe0])
        .expect("valid image")
}

#[tokio::test]
async fn test_upload_without_selection() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    let result = identify::identify(&session, &backend).await;
    assert_eq!(result, Err(IdentifyError::NoImage));
    assert_eq!(
        session.identification().await.phase(),
        &IdentifyPhase::Failed("Please select an image first.".to_string())
    );
    assert!(fake.requests_to(paths::IDENTIFY).is_empty());
}

#[tokio::test]
async fn test_non_image_is_rejected() {
    let fake = FakeGarden::start().await;
    let session = GardenSession::start(fake.backend());

    identify::select(&session, Ok(leaf())).await.expect("selected");
    let rejected = identify::select(
        &session,
        SelectedImage::new("notes.txt", "text/plain", b"hello".to_vec()),
    )
    .await;

    assert!(matches!(rejected, Err(IdentifyError::NotAnImage { .. })));
    let state = session.identification().await;
    assert!(state.image().is_none());
    assert_eq!(state.phase(), &IdentifyPhase::Idle);
}

#[tokio::test]
async fn test_identification_result() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    identify::select(&session, Ok(leaf())).await.expect("selected");
    identify::identify(&session, &backend).await.expect("uploaded");

    let state = session.identification().await;
    let IdentifyPhase::Identified(prediction) = state.phase() else {
        panic!("expected a prediction, got {:?}", state.phase());
    };
    assert_eq!(prediction.plant_name_or_na(), "Neem");
    assert_eq!(prediction.confidence_percent().as_deref(), Some("87.00%"));

    let upload = &fake.requests_to(paths::IDENTIFY)[0];
    assert_eq!(
        upload.body,
        serde_json::json!([{
            "name": "image",
            "file_name": "leaf.jpg",
            "content_type": "image/jpeg",
            "len": 4,
        }])
    );
}

#[tokio::test]
async fn test_missing_fields_render_defaults() {
    let fake = FakeGarden::start().await;
    fake.set_prediction(serde_json::json!({"plant_name": "Tulsi"}));
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    identify::select(&session, Ok(leaf())).await.expect("selected");
    identify::identify(&session, &backend).await.expect("uploaded");

    let state = session.identification().await;
    let IdentifyPhase::Identified(prediction) = state.phase() else {
        panic!("expected a prediction");
    };
    assert_eq!(prediction.description_or_na(), "N/A");
    assert_eq!(prediction.usage_or_default(), "No usage information available.");
    assert_eq!(prediction.confidence_percent(), None);
}

#[tokio::test]
async fn test_failure_details() {
    let cases = [
        (r#"{"detail":"Invalid image"}"#, "Failed to identify plant: Invalid image"),
        (
            r#"{"error":"Model not loaded"}"#,
            r#"Failed to identify plant: {"error":"Model not loaded"}"#,
        ),
        ("Bad Gateway", "Failed to identify plant: Bad Gateway"),
        ("", "Failed to identify plant: Unknown error occurred."),
    ];

    for (body, expected) in cases {
        let fake = FakeGarden::start().await;
        fake.fail(ops::IDENTIFY, 500, body);
        let backend = fake.backend();
        let session = GardenSession::start(backend.clone());

        identify::select(&session, Ok(leaf())).await.expect("selected");
        identify::identify(&session, &backend).await.expect("uploaded");

        assert_eq!(
            session.identification().await.phase(),
            &IdentifyPhase::Failed(expected.to_string()),
            "body: {body}"
        );
    }
}

#[tokio::test]
async fn test_new_selection_discards_pending_result() {
    let fake = FakeGarden::start().await;
    fake.delay(ops::IDENTIFY, Duration::from_millis(300));
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    identify::select(&session, Ok(leaf())).await.expect("selected");
    let upload = {
        let session = Arc::clone(&session);
        let backend = backend.clone();
        tokio::spawn(async move { identify::identify(&session, &backend).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let other = SelectedImage::new("flower.png", "image/png", vec![0x89, 0x50]).expect("valid");
    identify::select(&session, Ok(other)).await.expect("selected");
    upload.await.expect("upload task").expect("uploaded");

    let state = session.identification().await;
    assert_eq!(state.phase(), &IdentifyPhase::Selected);
    assert_eq!(state.image().map(SelectedImage::file_name), Some("flower.png"));
}
