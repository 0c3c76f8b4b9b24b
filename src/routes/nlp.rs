use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::{filled, missing_fields};
use crate::error::AppError;
use crate::fallback;
use crate::gateway::{JsonShape, ModelRequest};
use crate::prompts;
use crate::store::{ProgressSnapshot, QuizScore, UserId};
use crate::AppState;

const RECENT_QUIZ_LIMIT: i64 = 10;

/// Body shared by the three text tools; `mode` is the per-tool option.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextToolRequest {
    text: Option<String>,
    user_id: Option<String>,
    #[serde(alias = "checkType", alias = "enhancementType", alias = "analysisType")]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationsRequest {
    user_id: Option<String>,
    subject: Option<String>,
    current_level: Option<String>,
    learning_style: Option<String>,
    #[serde(default)]
    recent_topics: Vec<String>,
}

struct TextTool {
    prompt: &'static str,
    mode_var: &'static str,
    default_mode: &'static str,
    output_key: &'static str,
    failure: &'static str,
    fallback: fn(&str) -> Value,
}

const GRAMMAR: TextTool = TextTool {
    prompt: prompts::GRAMMAR_PROMPT,
    mode_var: "check_type",
    default_mode: "grammar",
    output_key: "grammarCheck",
    failure: "Failed to check grammar",
    fallback: fallback::grammar_check,
};

const VOCABULARY: TextTool = TextTool {
    prompt: prompts::VOCABULARY_PROMPT,
    mode_var: "enhancement_type",
    default_mode: "synonyms",
    output_key: "vocabularyEnhancement",
    failure: "Failed to enhance vocabulary",
    fallback: fallback::vocabulary_enhancement,
};

const ANALYSIS: TextTool = TextTool {
    prompt: prompts::ANALYZE_TEXT_PROMPT,
    mode_var: "analysis_type",
    default_mode: "comprehensive",
    output_key: "analysis",
    failure: "Failed to analyze text",
    fallback: |_| fallback::text_analysis(),
};

async fn run_text_tool(
    state: &AppState,
    tool: &TextTool,
    payload: Result<Json<TextToolRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let (Some(text), Some(_user_id)) = (filled(body.text), filled(body.user_id)) else {
        return Err(missing_fields());
    };
    let mode = filled(body.mode).unwrap_or_else(|| tool.default_mode.to_string());

    let request =
        ModelRequest::from_template(tool.prompt, &[(tool.mode_var, &mode), ("text", &text)]);
    let output: Value = state
        .gateway
        .json_or_else(&request, JsonShape::Object, || (tool.fallback)(&text))
        .await
        .map_err(AppError::generation(tool.failure))?;

    let mut response = json!({ "success": true });
    response[tool.output_key] = output;
    Ok(Json(response))
}

#[axum::debug_handler]
pub async fn grammar_check(
    State(state): State<AppState>,
    payload: Result<Json<TextToolRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    run_text_tool(&state, &GRAMMAR, payload).await
}

#[axum::debug_handler]
pub async fn vocabulary_enhancer(
    State(state): State<AppState>,
    payload: Result<Json<TextToolRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    run_text_tool(&state, &VOCABULARY, payload).await
}

#[axum::debug_handler]
pub async fn analyze_text(
    State(state): State<AppState>,
    payload: Result<Json<TextToolRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    run_text_tool(&state, &ANALYSIS, payload).await
}

/// Prompt variables for the scores, `"No recent quizzes"` when empty.
pub fn format_scores(scores: &[QuizScore]) -> String {
    if scores.is_empty() {
        return "No recent quizzes".to_string();
    }
    scores
        .iter()
        .map(|s| format!("{}/{}", s.score, s.total_questions))
        .collect::<Vec<_>>()
        .join(", ")
}

#[axum::debug_handler]
pub async fn learning_recommendations(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationsRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let user_id = filled(body.user_id)
        .map(UserId::new)
        .ok_or_else(missing_fields)?;

    // History only personalizes the prompt, so a failed read is not fatal.
    let scores = state
        .store
        .recent_quiz_scores(&user_id, RECENT_QUIZ_LIMIT)
        .await
        .unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "could not load quiz history");
            Vec::new()
        });
    let progress = state
        .store
        .progress(&user_id)
        .await
        .unwrap_or_else(|e| {
            warn!(user_id = %user_id, error = %e, "could not load progress");
            None
        })
        .unwrap_or(ProgressSnapshot {
            level: 1,
            xp_points: 0,
        });

    let recent_topics = if body.recent_topics.is_empty() {
        "None specified".to_string()
    } else {
        body.recent_topics.join(", ")
    };
    let subject = filled(body.subject).unwrap_or_else(|| "General".to_string());
    let current_level = filled(body.current_level).unwrap_or_else(|| "Intermediate".to_string());
    let learning_style = filled(body.learning_style).unwrap_or_else(|| "Visual".to_string());
    let quiz_scores = format_scores(&scores);
    let level = progress.level.to_string();
    let xp = progress.xp_points.to_string();

    let request = ModelRequest::from_template(
        prompts::RECOMMENDATIONS_PROMPT,
        &[
            ("subject", &subject),
            ("current_level", &current_level),
            ("learning_style", &learning_style),
            ("recent_topics", &recent_topics),
            ("quiz_scores", &quiz_scores),
            ("level", &level),
            ("xp", &xp),
        ],
    );

    let recommendations: Value = state
        .gateway
        .json_or_else(&request, JsonShape::Object, fallback::recommendations)
        .await
        .map_err(AppError::generation("Failed to generate recommendations"))?;

    Ok(Json(json!({ "success": true, "recommendations": recommendations })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_are_listed_as_fractions() {
        let scores = [
            QuizScore {
                score: 8,
                total_questions: 10,
            },
            QuizScore {
                score: 3,
                total_questions: 5,
            },
        ];
        assert_eq!(format_scores(&scores), "8/10, 3/5");
        assert_eq!(format_scores(&[]), "No recent quizzes");
    }

    #[test]
    fn tool_option_accepts_each_endpoint_name() {
        for key in ["checkType", "enhancementType", "analysisType"] {
            let body: TextToolRequest =
                serde_json::from_value(json!({ "text": "hi", "userId": "u", key: "x" })).unwrap();
            assert_eq!(body.mode.as_deref(), Some("x"));
        }
    }
}
