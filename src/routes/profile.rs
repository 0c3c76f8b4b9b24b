use std::ops::RangeInclusive;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use tracing::info;

use crate::error::AppError;
use crate::session::Session;
use crate::store::{Profile, ProfileUpdate};
use crate::AppState;

const AGE_RANGE: RangeInclusive<i32> = 3..=18;

fn profile_not_found() -> AppError {
    AppError::NotFound("Profile not found".to_string())
}

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Profile>, AppError> {
    let user_id = session.user_id()?;

    let profile = state
        .store
        .profile(user_id)
        .await?
        .ok_or_else(profile_not_found)?;

    Ok(Json(profile))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<Profile>, AppError> {
    let user_id = session.user_id()?;
    let Json(update) = payload?;

    if let Some(age) = update.age {
        if !AGE_RANGE.contains(&age) {
            return Err(AppError::validation(format!(
                "age must be between {} and {}",
                AGE_RANGE.start(),
                AGE_RANGE.end()
            )));
        }
    }

    let profile = state
        .store
        .update_profile(user_id, &update)
        .await?
        .ok_or_else(profile_not_found)?;

    info!(user_id = %user_id, "profile updated");
    Ok(Json(profile))
}
