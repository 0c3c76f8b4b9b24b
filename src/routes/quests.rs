use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::session::Session;
use crate::streak::record_completion;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CompleteQuestRequest {
    quest_id: Option<Value>,
}

fn quest_id(raw: Option<Value>) -> Result<i64, AppError> {
    let raw = raw.ok_or_else(|| AppError::validation("quest_id is required"))?;
    let id = match &raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    match id {
        Some(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation("quest_id must be a positive integer")),
    }
}

#[axum::debug_handler]
pub async fn complete_quest(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<CompleteQuestRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let user_id = session.user_id()?;
    let Json(body) = payload?;
    let quest_id = quest_id(body.quest_id)?;

    let streak = record_completion(
        state.store.as_ref(),
        state.clock.as_ref(),
        user_id,
        quest_id,
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "newStreak": streak.current_streak,
    })))
}

#[axum::debug_handler]
pub async fn streak(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Value>, AppError> {
    let user_id = session.user_id()?;

    let record = state
        .store
        .streak(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No streak found".to_string()))?;

    Ok(Json(json!({
        "streak": record.current_streak,
        "last_completed_at": record.last_completed_at,
    })))
}

#[axum::debug_handler]
pub async fn daily_quests(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let quests = state.store.quests_for(state.clock.today()).await?;
    Ok(Json(json!({ "quests": quests })))
}
