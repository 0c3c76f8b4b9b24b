//! Session cookie to user identity.
//!
//! Sign-in happens at the external identity provider, which (like the
//! `brainbuddy issue-session` command) leaves a row in `sessions`. Handlers
//! receive a [`Session`] that is either authenticated or anonymous and decide
//! for themselves whether anonymous callers are allowed.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::PgPool;
use time::Duration;
use tokio::sync::RwLock;

use crate::error::AppError;
use crate::store::{StoreError, UserId};
use crate::AppState;

pub const SESSION_COOKIE: &str = "token";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The user behind an unexpired session token.
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, StoreError>;
}

/// Sessions kept in the `sessions` table.
#[derive(Clone)]
pub struct SessionTable {
    pool: PgPool,
}

impl SessionTable {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a session for `user_id` and return its token.
    pub async fn issue(&self, user_id: &UserId, ttl: Duration) -> Result<String, StoreError> {
        let token = new_token();
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at)
            VALUES ($1, $2, now() + make_interval(secs => $3))",
        )
        .bind(&token)
        .bind(user_id)
        .bind(ttl.as_seconds_f64())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }
}

#[async_trait]
impl IdentityProvider for SessionTable {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        let user = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id
            FROM sessions
            WHERE token = $1
                AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

/// Fixed token table for tests and local runs without a database.
#[derive(Default)]
pub struct StaticSessions {
    tokens: RwLock<HashMap<String, UserId>>,
}

impl StaticSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, token: impl Into<String>, user_id: UserId) {
        self.tokens.write().await.insert(token.into(), user_id);
    }
}

#[async_trait]
impl IdentityProvider for StaticSessions {
    async fn resolve(&self, token: &str) -> Result<Option<UserId>, StoreError> {
        Ok(self.tokens.read().await.get(token).cloned())
    }
}

pub fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated(UserId),
    Anonymous,
}

impl Session {
    pub fn user_id(&self) -> Result<&UserId, AppError> {
        match self {
            Session::Authenticated(user_id) => Ok(user_id),
            Session::Anonymous => Err(AppError::Unauthorized),
        }
    }
}

impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE) else {
            return Ok(Session::Anonymous);
        };

        match state.identity.resolve(token.value()).await? {
            Some(user_id) => Ok(Session::Authenticated(user_id)),
            None => Ok(Session::Anonymous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

    async fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        MIGRATOR.run(&pool).await.ok()?;
        Some(pool)
    }

    #[test]
    fn tokens_are_long_and_distinct() {
        let token = new_token();
        assert_eq!(token.len(), 48);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, new_token());
    }

    #[tokio::test]
    async fn test_issue_then_resolve() {
        let Some(pool) = test_pool().await else {
            eprintln!("Skipping test: TEST_DATABASE_URL not set");
            return;
        };
        let sessions = SessionTable::new(pool.clone());
        let user = UserId::new(format!("pg-test-{}", new_token()));

        let token = sessions.issue(&user, Duration::days(15)).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), Some(user.clone()));
        assert_eq!(sessions.resolve("not-a-token").await.unwrap(), None);

        let expired = sessions.issue(&user, Duration::seconds(-60)).await.unwrap();
        assert_eq!(sessions.resolve(&expired).await.unwrap(), None);

        sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(&user)
            .execute(&pool)
            .await
            .ok();
    }
}
