use async_trait::async_trait;
use sqlx::types::time::{Date, OffsetDateTime};
use sqlx::PgPool;

use super::{
    DailyQuest, LearningStore, NewCompletion, NewProfile, NewQuest, Profile, ProfileUpdate,
    ProgressSnapshot, QuizScore, StoreError, StreakRecord, UserId,
};

const PROFILE_COLUMNS: &str = "id, email, full_name, avatar_url, user_type, age, grade_level, \
                               created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: String,
    email: String,
    full_name: Option<String>,
    avatar_url: Option<String>,
    user_type: String,
    age: Option<i32>,
    grade_level: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: UserId(row.id),
            email: row.email,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            user_type: row.user_type.parse().map_err(StoreError::Decode)?,
            age: row.age,
            grade_level: row.grade_level,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// Constraint violations carry a message worth showing to the caller.
fn rejected_or_database(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db) => StoreError::Rejected(db.message().to_string()),
        other => StoreError::Database(other),
    }
}

#[async_trait]
impl LearningStore for PgStore {
    async fn insert_completion(&self, completion: &NewCompletion) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO user_quest_completions
                (user_id, quest_id, completed_at, completed_date)
            VALUES ($1, $2, $3, $4)",
        )
        .bind(&completion.user_id)
        .bind(completion.quest_id)
        .bind(completion.completed_at)
        .bind(completion.completed_date)
        .execute(&self.pool)
        .await
        .map_err(rejected_or_database)?;

        Ok(())
    }

    async fn advance_streak(
        &self,
        user_id: &UserId,
        today: Date,
    ) -> Result<StreakRecord, StoreError> {
        // Same transition as streak::next_streak, computed by the database so
        // two concurrent completions cannot both read the old value.
        let record = sqlx::query_as::<_, StreakRecord>(
            "INSERT INTO user_streaks (user_id, current_streak, last_completed_at)
            VALUES ($1, 1, $2::date)
            ON CONFLICT (user_id) DO UPDATE SET
                current_streak = CASE
                    WHEN user_streaks.last_completed_at = $2::date - 1
                        THEN user_streaks.current_streak + 1
                    WHEN user_streaks.last_completed_at = $2::date
                        THEN user_streaks.current_streak
                    ELSE 1
                END,
                last_completed_at = $2::date
            RETURNING user_id, current_streak, last_completed_at",
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn streak(&self, user_id: &UserId) -> Result<Option<StreakRecord>, StoreError> {
        let record = sqlx::query_as::<_, StreakRecord>(
            "SELECT user_id, current_streak, last_completed_at
            FROM user_streaks
            WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn quests_for(&self, date: Date) -> Result<Vec<DailyQuest>, StoreError> {
        let quests = sqlx::query_as::<_, DailyQuest>(
            "SELECT id, description, reward, date_available
            FROM daily_quests
            WHERE date_available = $1
            ORDER BY id",
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(quests)
    }

    async fn insert_quest(&self, quest: &NewQuest) -> Result<DailyQuest, StoreError> {
        sqlx::query_as::<_, DailyQuest>(
            "INSERT INTO daily_quests (description, reward, date_available)
            VALUES ($1, $2, $3)
            RETURNING id, description, reward, date_available",
        )
        .bind(&quest.description)
        .bind(quest.reward)
        .bind(quest.date_available)
        .fetch_one(&self.pool)
        .await
        .map_err(rejected_or_database)
    }

    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM profiles WHERE id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "INSERT INTO profiles (id, email, full_name, user_type, age, grade_level)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(&profile.id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.user_type.as_str())
        .bind(profile.age)
        .bind(&profile.grade_level)
        .fetch_one(&self.pool)
        .await
        .map_err(rejected_or_database)?;

        Profile::try_from(row)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "UPDATE profiles SET
                full_name = COALESCE($2, full_name),
                avatar_url = COALESCE($3, avatar_url),
                age = COALESCE($4, age),
                grade_level = COALESCE($5, grade_level),
                updated_at = now()
            WHERE id = $1
            RETURNING {}",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .bind(&update.full_name)
        .bind(&update.avatar_url)
        .bind(update.age)
        .bind(&update.grade_level)
        .fetch_optional(&self.pool)
        .await
        .map_err(rejected_or_database)?;

        row.map(Profile::try_from).transpose()
    }

    async fn recent_quiz_scores(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<QuizScore>, StoreError> {
        let scores = sqlx::query_as::<_, QuizScore>(
            "SELECT score, total_questions
            FROM quiz_attempts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(scores)
    }

    async fn progress(&self, user_id: &UserId) -> Result<Option<ProgressSnapshot>, StoreError> {
        let progress = sqlx::query_as::<_, ProgressSnapshot>(
            "SELECT level, xp_points FROM user_progress WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(progress)
    }
}
