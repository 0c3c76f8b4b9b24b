use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::types::time::{Date, OffsetDateTime};
use tokio::sync::Mutex;

use super::{
    DailyQuest, LearningStore, NewCompletion, NewProfile, NewQuest, Profile, ProfileUpdate,
    ProgressSnapshot, QuizScore, StoreError, StreakRecord, UserId,
};
use crate::streak::next_streak;

#[derive(Default)]
struct Tables {
    quests: Vec<DailyQuest>,
    completions: HashSet<(UserId, i64, Date)>,
    streaks: HashMap<UserId, StreakRecord>,
    profiles: HashMap<UserId, Profile>,
    progress: HashMap<UserId, ProgressSnapshot>,
    // Oldest first.
    quiz_attempts: HashMap<UserId, Vec<QuizScore>>,
}

/// In-process store with the same constraints as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_quiz_attempt(&self, user_id: &UserId, score: QuizScore) {
        let mut tables = self.tables.lock().await;
        tables
            .quiz_attempts
            .entry(user_id.clone())
            .or_default()
            .push(score);
    }

    pub async fn set_progress(&self, user_id: &UserId, progress: ProgressSnapshot) {
        self.tables
            .lock()
            .await
            .progress
            .insert(user_id.clone(), progress);
    }

    pub async fn completion_count(&self, user_id: &UserId) -> usize {
        self.tables
            .lock()
            .await
            .completions
            .iter()
            .filter(|(user, _, _)| user == user_id)
            .count()
    }
}

#[async_trait]
impl LearningStore for MemoryStore {
    async fn insert_completion(&self, completion: &NewCompletion) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;

        if !tables.quests.iter().any(|q| q.id == completion.quest_id) {
            return Err(StoreError::Rejected(format!(
                "quest {} does not exist",
                completion.quest_id
            )));
        }

        let key = (
            completion.user_id.clone(),
            completion.quest_id,
            completion.completed_date,
        );
        if !tables.completions.insert(key) {
            return Err(StoreError::Rejected(format!(
                "quest {} already completed on {}",
                completion.quest_id, completion.completed_date
            )));
        }

        Ok(())
    }

    async fn advance_streak(
        &self,
        user_id: &UserId,
        today: Date,
    ) -> Result<StreakRecord, StoreError> {
        let mut tables = self.tables.lock().await;
        let next = next_streak(tables.streaks.get(user_id), user_id, today);
        tables.streaks.insert(user_id.clone(), next.clone());
        Ok(next)
    }

    async fn streak(&self, user_id: &UserId) -> Result<Option<StreakRecord>, StoreError> {
        Ok(self.tables.lock().await.streaks.get(user_id).cloned())
    }

    async fn quests_for(&self, date: Date) -> Result<Vec<DailyQuest>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .quests
            .iter()
            .filter(|q| q.date_available == date)
            .cloned()
            .collect())
    }

    async fn insert_quest(&self, quest: &NewQuest) -> Result<DailyQuest, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = tables.quests.iter().map(|q| q.id).max().unwrap_or(0) + 1;
        let stored = DailyQuest {
            id,
            description: quest.description.clone(),
            reward: quest.reward,
            date_available: quest.date_available,
        };
        tables.quests.push(stored.clone());
        Ok(stored)
    }

    async fn profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.lock().await.profiles.get(user_id).cloned())
    }

    async fn insert_profile(&self, profile: &NewProfile) -> Result<Profile, StoreError> {
        let mut tables = self.tables.lock().await;

        if tables.profiles.contains_key(&profile.id) {
            return Err(StoreError::Rejected(format!(
                "profile {} already exists",
                profile.id
            )));
        }
        if tables.profiles.values().any(|p| p.email == profile.email) {
            return Err(StoreError::Rejected(format!(
                "email {} is already registered",
                profile.email
            )));
        }

        let now = OffsetDateTime::now_utc();
        let stored = Profile {
            id: profile.id.clone(),
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            avatar_url: None,
            user_type: profile.user_type,
            age: profile.age,
            grade_level: profile.grade_level.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.profiles.insert(profile.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(profile) = tables.profiles.get_mut(user_id) else {
            return Ok(None);
        };

        if let Some(full_name) = &update.full_name {
            profile.full_name = Some(full_name.clone());
        }
        if let Some(avatar_url) = &update.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
        if let Some(age) = update.age {
            profile.age = Some(age);
        }
        if let Some(grade_level) = &update.grade_level {
            profile.grade_level = Some(grade_level.clone());
        }
        profile.updated_at = OffsetDateTime::now_utc();

        Ok(Some(profile.clone()))
    }

    async fn recent_quiz_scores(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<QuizScore>, StoreError> {
        let tables = self.tables.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(tables
            .quiz_attempts
            .get(user_id)
            .map(|attempts| attempts.iter().rev().take(limit).copied().collect())
            .unwrap_or_default())
    }

    async fn progress(&self, user_id: &UserId) -> Result<Option<ProgressSnapshot>, StoreError> {
        Ok(self.tables.lock().await.progress.get(user_id).copied())
    }
}
