use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};
use time::format_description::well_known::Rfc3339;
use tracing::info;

use super::filled;
use crate::error::AppError;
use crate::transcript::{extract_video_id, is_video_id, segment_count};
use crate::video::{analysis_from_reply, analysis_request, fallback_analysis, MIN_TRANSCRIPT_CHARS};
use crate::AppState;

const RAW_RESPONSE_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRequest {
    video_id: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    transcript: Option<String>,
    video_title: Option<String>,
}

fn requested_video_id(body: TranscriptRequest) -> Result<String, AppError> {
    if let Some(id) = filled(body.video_id) {
        let id = id.trim().to_string();
        if !is_video_id(&id) {
            return Err(AppError::validation_with(
                "Invalid video ID",
                "A YouTube video ID is 11 letters, digits, '-' or '_'",
            ));
        }
        return Ok(id);
    }

    match filled(body.url) {
        Some(url) => extract_video_id(&url).ok_or_else(|| {
            AppError::validation_with(
                "Invalid YouTube URL. Please provide a valid YouTube video URL.",
                "Supported formats: youtube.com/watch?v=ID, youtu.be/ID, youtube.com/embed/ID, youtube.com/shorts/ID",
            )
        }),
        None => Err(AppError::validation_with(
            "Video ID is required. Please provide either videoId or url parameter.",
            r#"Example: { "videoId": "dQw4w9WgXcQ" } or { "url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ" }"#,
        )),
    }
}

#[axum::debug_handler]
pub async fn youtube_transcript(
    State(state): State<AppState>,
    payload: Result<Json<TranscriptRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let video_id = requested_video_id(body)?;

    let transcript = state
        .transcripts
        .fetch(&video_id)
        .await
        .map_err(|attempts| AppError::TranscriptUnavailable {
            video_id: video_id.clone(),
            attempts,
        })?;

    Ok(Json(json!({
        "success": true,
        "segmentCount": segment_count(&transcript.text),
        "length": transcript.text.chars().count(),
        "transcript": transcript.text,
        "method": transcript.method.as_str(),
        "videoId": video_id,
    })))
}

fn preview(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    let mut out: String = raw.chars().take(RAW_RESPONSE_PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[axum::debug_handler]
pub async fn video_learn_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(body) = payload?;
    let transcript = body.transcript.unwrap_or_default();
    let length = transcript.chars().count();
    if length < MIN_TRANSCRIPT_CHARS {
        return Err(AppError::validation_with(
            format!(
                "Transcript is missing or too short. Please provide a transcript with at least {} characters.",
                MIN_TRANSCRIPT_CHARS
            ),
            format!("Received transcript length: {}", length),
        ));
    }
    let video_title = filled(body.video_title);
    let now = state.clock.now();

    let request = analysis_request(&transcript, video_title.as_deref());
    let failed = AppError::generation("AI content generation failed");
    let (parsed, raw) = match state.gateway.complete(&request).await {
        Ok(Some(raw)) => match analysis_from_reply(&raw, now) {
            Ok(parsed) => (parsed, raw),
            Err(e) => return Err(failed(e)),
        },
        Ok(None) => (
            fallback_analysis(&transcript, video_title.as_deref(), now),
            String::new(),
        ),
        Err(e) => return Err(failed(e)),
    };

    info!(
        title = %parsed.title,
        questions = parsed.quiz.total_questions,
        transcript_chars = length,
        "video analyzed"
    );

    Ok(Json(json!({
        "success": true,
        "parsed": parsed,
        "rawResponse": preview(&raw),
        "timestamp": now.format(&Rfc3339).unwrap_or_default(),
    })))
}
