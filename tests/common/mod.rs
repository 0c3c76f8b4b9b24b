#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use brainbuddy::gateway::{Gateway, GatewayError, ModelRequest, TextModel};
use brainbuddy::session::{StaticSessions, SESSION_COOKIE};
use brainbuddy::store::{LearningStore, MemoryStore, NewQuest, UserId};
use brainbuddy::streak::Clock;
use brainbuddy::transcript::TranscriptFetcher;
use brainbuddy::{app, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use time::{Date, OffsetDateTime, Time};
use tower::ServiceExt;

/// A clock tests can move by hand.
pub struct FixedClock(Mutex<OffsetDateTime>);

impl FixedClock {
    pub fn on(date: Date) -> Arc<Self> {
        Arc::new(Self(Mutex::new(date.with_time(Time::from_hms(9, 30, 0).unwrap()).assume_utc())))
    }

    pub fn set_date(&self, date: Date) {
        let mut now = self.0.lock().unwrap();
        *now = now.replace_date(date);
    }

    pub fn advance_days(&self, days: i64) {
        let mut now = self.0.lock().unwrap();
        *now += time::Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        *self.0.lock().unwrap()
    }
}

/// Always replies with the same text.
pub struct Canned(pub String);

impl Canned {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self(reply.into()))
    }
}

#[async_trait]
impl TextModel for Canned {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, GatewayError> {
        Ok(self.0.clone())
    }
}

/// Replies after a delay.
pub struct Slow(pub Duration);

#[async_trait]
impl TextModel for Slow {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, GatewayError> {
        tokio::time::sleep(self.0).await;
        Ok("{}".to_string())
    }
}

/// Always fails like an unreachable vendor.
pub struct Broken;

#[async_trait]
impl TextModel for Broken {
    async fn generate(&self, _request: &ModelRequest) -> Result<String, GatewayError> {
        Err(GatewayError::Upstream("HTTP 503".to_string()))
    }
}

/// Canned reply that keeps every request it receives.
pub struct Recording {
    reply: String,
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl Recording {
    pub fn new(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> ModelRequest {
        self.requests.lock().unwrap().last().cloned().expect("model was not called")
    }
}

#[async_trait]
impl TextModel for Recording {
    async fn generate(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<StaticSessions>,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// App without a model, so every generative endpoint serves fallbacks.
    pub fn new(today: Date) -> Self {
        Self::build(today, Gateway::unconfigured())
    }

    pub fn with_model(today: Date, model: Arc<dyn TextModel>) -> Self {
        Self::build(today, Gateway::new(Some(model), Duration::from_secs(45)))
    }

    pub fn build(today: Date, gateway: Gateway) -> Self {
        let store = Arc::new(MemoryStore::new());
        let sessions = Arc::new(StaticSessions::new());
        let clock = FixedClock::on(today);

        let state = AppState {
            store: store.clone(),
            identity: sessions.clone(),
            gateway,
            clock: clock.clone(),
            // Nothing listens here; transcript tests only cover input checks.
            transcripts: TranscriptFetcher::with_base_url("http://127.0.0.1:9").unwrap(),
        };

        Self {
            router: app(state, None),
            store,
            sessions,
            clock,
        }
    }

    /// Register a session for `user` and return its cookie token.
    pub async fn sign_in(&self, user: &str) -> String {
        let token = format!("token-{}", user);
        self.sessions.insert(token.clone(), UserId::new(user)).await;
        token
    }

    pub async fn add_quest(&self, date: Date) -> i64 {
        self.store
            .insert_quest(&NewQuest {
                description: "Read a chapter".to_string(),
                reward: 10,
                date_available: date,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::COOKIE, format!("{}={}", SESSION_COOKIE, token));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&json).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }
}
