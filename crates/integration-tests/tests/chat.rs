//! AI assistant transcript and canned plant questions.

use std::sync::Arc;
use std::time::Duration;

use herbal_garden_core::chat::{CHAT_FAILED_MESSAGE, FALLBACK_REPLY};
use herbal_garden_core::{ChatRejection, PlantId, PlantQuestion, Sender};
use herbal_garden_integration_tests::{FakeGarden, ops, paths};
use herbal_garden_web::services::questions::{self, QuestionAnswer};
use herbal_garden_web::services::{GardenSession, chat};

#[tokio::test]
async fn test_reply_follows_question() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    chat::send(&session, &backend, "What is tulsi good for?")
        .await
        .expect("message accepted");

    let transcript = session.transcript().await;
    let turns: Vec<_> = transcript
        .messages()
        .iter()
        .map(|m| (m.sender, m.text.as_str()))
        .collect();
    assert_eq!(
        turns,
        vec![
            (Sender::User, "What is tulsi good for?"),
            (Sender::Assistant, "You asked: What is tulsi good for?"),
        ]
    );
    assert!(!transcript.is_busy());
    assert_eq!(
        fake.requests_to(paths::CHAT)[0].body,
        serde_json::json!({"message": "What is tulsi good for?"})
    );
}

#[tokio::test]
async fn test_failed_reply_uses_fallback() {
    let fake = FakeGarden::start().await;
    fake.fail(ops::CHAT, 500, "model offline");
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    chat::send(&session, &backend, "hello").await.expect("message accepted");

    let transcript = session.transcript().await;
    assert_eq!(transcript.messages().len(), 2);
    assert_eq!(transcript.messages()[1].text, FALLBACK_REPLY);
    assert_eq!(transcript.error(), Some(CHAT_FAILED_MESSAGE));
}

#[tokio::test]
async fn test_blank_message_is_not_sent() {
    let fake = FakeGarden::start().await;
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    let rejected = chat::send(&session, &backend, "   ").await;
    assert_eq!(rejected, Err(ChatRejection::Empty));
    assert!(session.transcript().await.messages().is_empty());
    assert!(fake.requests_to(paths::CHAT).is_empty());
}

#[tokio::test]
async fn test_second_message_while_busy() {
    let fake = FakeGarden::start().await;
    fake.delay(ops::CHAT, Duration::from_millis(300));
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    let first = {
        let session = Arc::clone(&session);
        let backend = backend.clone();
        tokio::spawn(async move { chat::send(&session, &backend, "first").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        chat::send(&session, &backend, "second").await,
        Err(ChatRejection::Busy)
    );
    assert_eq!(first.await.expect("chat task"), Ok(()));

    let transcript = session.transcript().await;
    let texts: Vec<_> = transcript.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "You asked: first"]);
}

#[tokio::test]
async fn test_dropped_request_still_settles() {
    let fake = FakeGarden::start().await;
    fake.delay(ops::CHAT, Duration::from_millis(300));
    let backend = fake.backend();
    let session = GardenSession::start(backend.clone());

    let first = {
        let session = Arc::clone(&session);
        let backend = backend.clone();
        tokio::spawn(async move { chat::send(&session, &backend, "first").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    first.abort();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(!session.transcript().await.is_busy());
    chat::send(&session, &backend, "second")
        .await
        .expect("accepted once the first reply settled");

    let transcript = session.transcript().await;
    let texts: Vec<_> = transcript.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["first", "You asked: first", "second", "You asked: second"]
    );
}

#[tokio::test]
async fn test_plant_question_prompt() {
    let fake = FakeGarden::start().await;
    fake.set_chat_reply("**Avoid** with blood thinners.");
    let backend = fake.backend();
    let plant = backend.get_plant(PlantId::new(7)).await.expect("Turmeric exists");

    let answer = questions::ask(&backend, &plant, PlantQuestion::AllergenicMixtures).await;
    assert_eq!(
        answer,
        QuestionAnswer::Answered {
            question: PlantQuestion::AllergenicMixtures,
            markdown: "**Avoid** with blood thinners.".to_string(),
        }
    );

    let sent = &fake.requests_to(paths::CHAT)[0].body["message"];
    assert_eq!(
        sent.as_str(),
        Some(PlantQuestion::AllergenicMixtures.prompt("Turmeric").as_str())
    );
}

#[tokio::test]
async fn test_plant_question_failure() {
    let fake = FakeGarden::start().await;
    fake.fail(ops::CHAT, 502, r#"{"detail":"Upstream model error"}"#);
    let backend = fake.backend();
    let plant = backend.get_plant(PlantId::new(2)).await.expect("Neem exists");

    let answer = questions::ask(&backend, &plant, PlantQuestion::Allergies).await;
    assert_eq!(
        answer,
        QuestionAnswer::Failed {
            question: PlantQuestion::Allergies,
            message: "Failed to get AI response: Upstream model error".to_string(),
        }
    );
}

#[tokio::test]
async fn test_plant_question_without_name() {
    let fake = FakeGarden::start().await;
    fake.set_plants(vec![serde_json::json!({"plant_id": 9, "common_name": ""})]);
    let backend = fake.backend();
    let plant = backend.get_plant(PlantId::new(9)).await.expect("plant exists");

    let answer = questions::ask(&backend, &plant, PlantQuestion::Combinations).await;
    assert!(matches!(answer, QuestionAnswer::Failed { .. }));
    assert!(fake.requests_to(paths::CHAT).is_empty());
}
