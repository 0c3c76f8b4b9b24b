//! Row-level access to the learning tables.
//!
//! Handlers talk to a [`LearningStore`] handle that is built once at start-up
//! and carried in the router state. [`PgStore`] is the production backend;
//! [`MemoryStore`] keeps everything in process for tests and local demos.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::types::time::{Date, OffsetDateTime};
use thiserror::Error;
use time::serde::iso8601;

pub mod memory;
pub mod postgres;

pub use self::memory::MemoryStore;
pub use self::postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The database refused the write (constraint, foreign key, duplicate).
    #[error("{0}")]
    Rejected(String),

    /// A stored value could not be turned back into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Identity handed out by the sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct NewCompletion {
    pub user_id: UserId,
    pub quest_id: i64,
    pub completed_at: OffsetDateTime,
    pub completed_date: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StreakRecord {
    pub user_id: UserId,
    pub current_streak: i32,
    pub last_completed_at: Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct DailyQuest {
    pub id: i64,
    pub description: String,
    pub reward: i32,
    pub date_available: Date,
}

#[derive(Debug, Clone)]
pub struct NewQuest {
    pub description: String,
    pub reward: i32,
    pub date_available: Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Teacher,
    Parent,
    Admin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Teacher => "teacher",
            UserType::Parent => "parent",
            UserType::Admin => "admin",
        }
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(UserType::Student),
            "teacher" => Ok(UserType::Teacher),
            "parent" => Ok(UserType::Parent),
            "admin" => Ok(UserType::Admin),
            other => Err(format!("unknown user type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub user_type: UserType,
    pub age: Option<i32>,
    pub grade_level: Option<String>,
    #[serde(with = "iso8601")]
    pub created_at: OffsetDateTime,
    #[serde(with = "iso8601")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: UserId,
    pub email: String,
    pub full_name: Option<String>,
    pub user_type: UserType,
    pub age: Option<i32>,
    pub grade_level: Option<String>,
}

/// Partial profile edit; `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub age: Option<i32>,
    pub grade_level: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct QuizScore {
    pub score: i32,
    pub total_questions: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct ProgressSnapshot {
    pub level: i32,
    pub xp_points: i32,
}

#[async_trait]
pub trait LearningStore: Send + Sync {
    /// Append a completion row. Duplicates for the same day are rejected.
    async fn insert_completion(&self, completion: &NewCompletion) -> Result<(), StoreError>;

    /// Move the user's streak forward to `today` in one atomic step and
    /// return the stored result. See [`crate::streak::next_streak`].
    async fn advance_streak(&self, user_id: &UserId, today: Date)
        -> Result<StreakRecord, StoreError>;

    async fn streak(&self, user_id: &UserId) -> Result<Option<StreakRecord>, StoreError>;

    async fn quests_for(&self, date: Date) -> Result<Vec<DailyQuest>, StoreError>;

    async fn insert_quest(&self, quest: &NewQuest) -> Result<DailyQuest, StoreError>;

    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError>;

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, StoreError>;

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError>;

    /// Most recent attempts first.
    async fn recent_quiz_scores(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<QuizScore>, StoreError>;

    async fn progress(&self, user_id: &UserId) -> Result<Option<ProgressSnapshot>, StoreError>;
}
