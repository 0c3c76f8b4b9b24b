mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use brainbuddy::fallback::QUOTES;
use brainbuddy::gateway::Gateway;
use brainbuddy::store::{ProgressSnapshot, QuizScore, UserId};
use common::{Broken, Canned, Recording, Slow, TestApp};
use serde_json::{json, Value};
use time::macros::date;

fn quiz_reply(questions: usize) -> String {
    let questions: Vec<Value> = (0..questions)
        .map(|i| {
            json!({
                "question": format!("Question {}", i + 1),
                "options": ["a", "b", "c", "d"],
                "correctAnswer": i % 4,
                "explanation": "because"
            })
        })
        .collect();
    format!(
        "Here is your quiz!\n```json\n{}\n```",
        json!({ "title": "Volcano Quiz", "questions": questions })
    )
}

#[tokio::test]
async fn quiz_falls_back_without_a_model() {
    let app = TestApp::new(date!(2024 - 03 - 10));

    let (status, body) = app
        .post(
            "/api/generate-quiz",
            None,
            json!({ "text": "Volcanoes erupt.", "userId": "kid-1", "difficulty": "hard", "questionCount": 3 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["quiz"]["title"], "Hard Quiz");
    let questions = body["quiz"]["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    assert_eq!(questions[2]["correctAnswer"], 2);
}

#[tokio::test]
async fn missing_fields_are_rejected_everywhere() {
    let app = TestApp::new(date!(2024 - 03 - 10));

    for uri in [
        "/api/generate-quiz",
        "/api/generate-summary",
        "/api/chat",
        "/api/extract-text",
        "/api/nlp/grammar-check",
        "/api/nlp/vocabulary-enhancer",
        "/api/nlp/analyze-text",
        "/api/nlp/learning-recommendations",
    ] {
        let (status, body) = app.post(uri, None, json!({ "text": "" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "Missing required fields", "{}", uri);
    }
}

#[tokio::test]
async fn question_count_is_bounded() {
    let app = TestApp::new(date!(2024 - 03 - 10));

    for count in [0, 51] {
        let (status, _) = app
            .post(
                "/api/generate-quiz",
                None,
                json!({ "text": "t", "userId": "u", "questionCount": count }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn malformed_body_is_a_validation_error() {
    let app = TestApp::new(date!(2024 - 03 - 10));

    let (status, body) = app
        .post("/api/generate-summary", None, json!({ "text": 42, "userId": "u" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].is_string());
}

#[tokio::test]
async fn fenced_model_json_is_parsed() {
    let app = TestApp::with_model(date!(2024 - 03 - 10), Canned::new(quiz_reply(4)));

    let (status, body) = app
        .post(
            "/api/generate-quiz",
            None,
            json!({ "text": "Volcanoes erupt.", "userId": "kid-1", "questionCount": 4 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quiz"]["title"], "Volcano Quiz");
    assert_eq!(body["quiz"]["questions"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn reply_without_json_is_a_generation_failure() {
    let app = TestApp::with_model(
        date!(2024 - 03 - 10),
        Canned::new("Sorry, I can't make a quiz about that."),
    );

    let (status, body) = app
        .post("/api/generate-quiz", None, json!({ "text": "t", "userId": "u" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate quiz");
    assert!(body["details"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn quiz_without_questions_is_a_generation_failure() {
    let app = TestApp::with_model(
        date!(2024 - 03 - 10),
        Canned::new(r#"{"title":"T","questions":[]}"#),
    );

    let (status, body) = app
        .post(
            "/api/generate-quiz",
            None,
            json!({ "text": "t", "userId": "u", "questionCount": 5 }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate quiz");
    assert!(body["details"].as_str().unwrap().contains("no questions"));
}

#[tokio::test]
async fn vendor_failure_surfaces_details() {
    let app = TestApp::with_model(date!(2024 - 03 - 10), Arc::new(Broken));

    let (status, body) = app
        .post("/api/chat", None, json!({ "message": "hi", "userId": "u" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to process chat");
    assert!(body["details"].as_str().unwrap().contains("HTTP 503"));
}

#[tokio::test(start_paused = true)]
async fn slow_model_times_out() {
    let app = TestApp::build(
        date!(2024 - 03 - 10),
        Gateway::new(
            Some(Arc::new(Slow(Duration::from_secs(60)))),
            Duration::from_millis(45_000),
        ),
    );

    let (status, body) = app
        .post("/api/generate-summary", None, json!({ "text": "t", "userId": "u" }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to generate summary");
    assert!(body["details"].as_str().unwrap().contains("45000ms"));
}

#[tokio::test]
async fn chat_passes_context_to_the_model() {
    let model = Recording::new("Great question! 🌋");
    let app = TestApp::with_model(date!(2024 - 03 - 10), model.clone());

    let (status, body) = app
        .post(
            "/api/chat",
            None,
            json!({ "message": "Why do volcanoes erupt?", "context": "Earth science", "userId": "u" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Great question! 🌋");
    let prompt = model.last().prompt;
    assert!(prompt.contains("Context: Earth science"));
    assert!(prompt.contains("Why do volcanoes erupt?"));
}

#[tokio::test]
async fn quote_never_fails() {
    let app = TestApp::with_model(date!(2024 - 03 - 10), Arc::new(Broken));
    let (status, body) = app.post("/api/generate-quote", None, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(QUOTES.contains(&body["quote"].as_str().unwrap()));

    let app = TestApp::with_model(date!(2024 - 03 - 10), Canned::new("\"Hi\""));
    let (_, body) = app.post("/api/generate-quote", None, json!({})).await;
    assert!(QUOTES.contains(&body["quote"].as_str().unwrap()));

    let app = TestApp::with_model(
        date!(2024 - 03 - 10),
        Canned::new("\"Every step you take makes you stronger!\""),
    );
    let (_, body) = app
        .post("/api/generate-quote", None, json!({ "topic": "reading" }))
        .await;
    assert_eq!(body["quote"], "Every step you take makes you stronger!");
}

#[tokio::test]
async fn extract_text_sends_the_image() {
    let model = Recording::new("CHAPTER 1");
    let app = TestApp::with_model(date!(2024 - 03 - 10), model.clone());

    let (status, body) = app
        .post(
            "/api/extract-text",
            None,
            json!({ "imageData": "data:image/png;base64,iVBORw0KGgo=", "userId": "u" }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "text": "CHAPTER 1" }));
    let image = model.last().image.expect("image part");
    assert_eq!(image.mime_type, "image/png");
    assert_eq!(image.data, "iVBORw0KGgo=");
}

#[tokio::test]
async fn text_tools_fall_back_without_a_model() {
    let app = TestApp::new(date!(2024 - 03 - 10));
    let body = json!({ "text": "i like dogs", "userId": "u" });

    let (status, reply) = app.post("/api/nlp/grammar-check", None, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["grammarCheck"]["correctedText"], "i like dogs");

    let (_, reply) = app.post("/api/nlp/vocabulary-enhancer", None, body.clone()).await;
    assert_eq!(reply["vocabularyEnhancement"]["enhancedText"], "i like dogs");

    let (_, reply) = app.post("/api/nlp/analyze-text", None, body).await;
    assert_eq!(reply["analysis"]["sentiment"]["overall"], "neutral");
}

#[tokio::test]
async fn recommendations_include_history_from_the_store() {
    let model = Recording::new(r#"{"recommendations": [], "motivationalTips": ["Keep going"]}"#);
    let app = TestApp::with_model(date!(2024 - 03 - 10), model.clone());
    let kid = UserId::new("kid-1");
    app.store
        .record_quiz_attempt(&kid, QuizScore { score: 6, total_questions: 10 })
        .await;
    app.store
        .record_quiz_attempt(&kid, QuizScore { score: 9, total_questions: 10 })
        .await;
    app.store
        .set_progress(&kid, ProgressSnapshot { level: 4, xp_points: 350 })
        .await;

    let (status, body) = app
        .post(
            "/api/nlp/learning-recommendations",
            None,
            json!({ "userId": "kid-1", "subject": "Math", "recentTopics": ["fractions", "decimals"] }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recommendations"]["motivationalTips"][0], "Keep going");
    let prompt = model.last().prompt;
    assert!(prompt.contains("Recent quiz scores: 9/10, 6/10"));
    assert!(prompt.contains("level 4, 350 XP"));
    assert!(prompt.contains("fractions, decimals"));
    assert!(prompt.contains("Subject: Math"));
}
