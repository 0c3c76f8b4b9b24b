use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{filled, missing_fields};
use crate::error::AppError;
use crate::fallback;
use crate::gateway::{GatewayError, InlineImage, JsonShape, ModelRequest};
use crate::prompts;
use crate::quiz::{validate_questions, Quiz};
use crate::AppState;

const DEFAULT_QUESTION_COUNT: i64 = 15;
const MAX_QUESTION_COUNT: i64 = 50;
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";
const MIN_QUOTE_CHARS: usize = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    text: Option<String>,
    user_id: Option<String>,
    difficulty: Option<String>,
    question_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    text: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    message: Option<String>,
    context: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTextRequest {
    image_data: Option<String>,
    user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteRequest {
    topic: Option<String>,
}

#[axum::debug_handler]
pub async fn generate_quiz(
    State(state): State<AppState>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let (Some(text), Some(_user_id)) = (filled(body.text), filled(body.user_id)) else {
        return Err(missing_fields());
    };

    let difficulty = filled(body.difficulty).unwrap_or_else(|| "medium".to_string());
    let question_count = body.question_count.unwrap_or(DEFAULT_QUESTION_COUNT);
    if !(1..=MAX_QUESTION_COUNT).contains(&question_count) {
        return Err(AppError::validation(format!(
            "questionCount must be between 1 and {}",
            MAX_QUESTION_COUNT
        )));
    }

    let count = question_count.to_string();
    let request = ModelRequest::from_template(
        prompts::QUIZ_PROMPT,
        &[
            ("difficulty", &difficulty),
            ("question_count", &count),
            ("text", &text),
        ],
    );

    // Range checked above, so the cast cannot truncate.
    let quiz: Quiz = state
        .gateway
        .json_or_else(&request, JsonShape::Object, || {
            fallback::quiz(&difficulty, question_count as usize)
        })
        .await
        .and_then(|quiz: Quiz| {
            validate_questions(&quiz.questions).map_err(GatewayError::MalformedResponse)?;
            Ok(quiz)
        })
        .map_err(AppError::generation("Failed to generate quiz"))?;

    debug!(questions = quiz.questions.len(), %difficulty, "quiz generated");
    Ok(Json(json!({ "success": true, "quiz": quiz })))
}

#[axum::debug_handler]
pub async fn generate_summary(
    State(state): State<AppState>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let (Some(text), Some(_user_id)) = (filled(body.text), filled(body.user_id)) else {
        return Err(missing_fields());
    };

    let request = ModelRequest::from_template(prompts::SUMMARY_PROMPT, &[("text", &text)]);
    let summary = state
        .gateway
        .text_or_else(&request, fallback::summary)
        .await
        .map_err(AppError::generation("Failed to generate summary"))?;

    Ok(Json(json!({ "success": true, "summary": summary })))
}

#[axum::debug_handler]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let (Some(message), Some(_user_id)) = (filled(body.message), filled(body.user_id)) else {
        return Err(missing_fields());
    };

    let context = filled(body.context)
        .map(|c| format!("Context: {}", c))
        .unwrap_or_default();
    let request = ModelRequest::from_template(
        prompts::CHAT_PROMPT,
        &[("context", &context), ("message", &message)],
    );

    let response = state
        .gateway
        .text_or_else(&request, fallback::chat_reply)
        .await
        .map_err(AppError::generation("Failed to process chat"))?;

    Ok(Json(json!({ "success": true, "response": response })))
}

/// Split an optional `data:<mime>;base64,` prefix off an uploaded image.
pub fn inline_image(image_data: &str) -> InlineImage {
    let image_data = image_data.trim();
    if let Some(rest) = image_data.strip_prefix("data:") {
        if let Some((header, data)) = rest.split_once(',') {
            let mime_type = header
                .split(';')
                .next()
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_IMAGE_MIME);
            return InlineImage {
                mime_type: mime_type.to_string(),
                data: data.to_string(),
            };
        }
    }

    InlineImage {
        mime_type: DEFAULT_IMAGE_MIME.to_string(),
        data: image_data.to_string(),
    }
}

#[axum::debug_handler]
pub async fn extract_text(
    State(state): State<AppState>,
    payload: Result<Json<ExtractTextRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let (Some(image_data), Some(_user_id)) = (filled(body.image_data), filled(body.user_id))
    else {
        return Err(missing_fields());
    };

    let request =
        ModelRequest::text(prompts::EXTRACT_TEXT_PROMPT).with_image(inline_image(&image_data));
    let text = state
        .gateway
        .text_or_else(&request, fallback::extracted_text)
        .await
        .map_err(AppError::generation("Failed to extract text"))?;

    Ok(Json(json!({ "success": true, "text": text })))
}

fn clean_quote(raw: &str) -> Option<String> {
    let quote = raw.trim().trim_matches('"').trim();
    (quote.chars().count() >= MIN_QUOTE_CHARS).then(|| quote.to_string())
}

/// Always answers 200 with some quote.
#[axum::debug_handler]
pub async fn generate_quote(
    State(state): State<AppState>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> Json<Value> {
    let body = payload.map(|Json(body)| body).unwrap_or_default();
    let topic = filled(body.topic).unwrap_or_else(|| "progress".to_string());

    let request = ModelRequest::from_template(prompts::QUOTE_PROMPT, &[("topic", &topic)]);
    let quote = match state.gateway.complete(&request).await {
        Ok(Some(raw)) => clean_quote(&raw).unwrap_or_else(fallback::quote),
        Ok(None) => fallback::quote(),
        Err(e) => {
            warn!(error = %e, "quote generation failed; using a canned quote");
            fallback::quote()
        }
    };

    Json(json!({ "quote": quote }))
}
