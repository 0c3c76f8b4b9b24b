use axum::routing::{get, post};
use axum::Router;

use crate::error::AppError;
use crate::AppState;

pub mod generate;
pub mod nlp;
pub mod profile;
pub mod quests;
pub mod video;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/complete-quest", post(quests::complete_quest))
        .route("/api/streak", get(quests::streak))
        .route("/api/daily-quests", get(quests::daily_quests))
        .route(
            "/api/profile",
            get(profile::get_profile).patch(profile::update_profile),
        )
        .route("/api/generate-quiz", post(generate::generate_quiz))
        .route("/api/generate-summary", post(generate::generate_summary))
        .route("/api/chat", post(generate::chat))
        .route("/api/extract-text", post(generate::extract_text))
        .route("/api/generate-quote", post(generate::generate_quote))
        .route("/api/nlp/grammar-check", post(nlp::grammar_check))
        .route("/api/nlp/vocabulary-enhancer", post(nlp::vocabulary_enhancer))
        .route("/api/nlp/analyze-text", post(nlp::analyze_text))
        .route(
            "/api/nlp/learning-recommendations",
            post(nlp::learning_recommendations),
        )
        .route("/api/youtube-transcript", post(video::youtube_transcript))
        .route("/api/video-learn-analyze", post(video::video_learn_analyze))
}

/// `Some` only for a value with something other than whitespace in it.
pub(crate) fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn missing_fields() -> AppError {
    AppError::validation("Missing required fields")
}
