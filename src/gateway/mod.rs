//! Boundary around the hosted text model.
//!
//! Callers build a [`ModelRequest`] from a prompt template, hand it to the
//! [`Gateway`] together with the payload to use when no model is configured,
//! and get back either raw text or a value parsed out of the reply.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GeminiConfig;

pub mod gemini;

pub use self::gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("model call timed out after {0}ms")]
    Timeout(u64),

    #[error("model request failed: {0}")]
    Upstream(String),

    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    #[error("GEMINI_API_KEY is not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload without any `data:` prefix.
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            temperature: None,
            max_output_tokens: None,
        }
    }

    pub fn from_template(template: &str, vars: &[(&str, &str)]) -> Self {
        Self::text(render(template, vars))
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}

#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<String, GatewayError>;
}

/// Which kind of JSON value to look for in a free-text reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Object,
    Array,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            JsonShape::Object => ('{', '}'),
            JsonShape::Array => ('[', ']'),
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    model: Option<Arc<dyn TextModel>>,
    timeout: Duration,
}

impl Gateway {
    pub fn new(model: Option<Arc<dyn TextModel>>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// A gateway that always serves fallbacks.
    pub fn unconfigured() -> Self {
        Self::new(None, Duration::from_millis(crate::config::DEFAULT_GEMINI_TIMEOUT_MS))
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        let model = config.api_key.as_ref().map(|key| {
            Arc::new(GeminiClient::new(
                config.base_url.clone(),
                config.model.clone(),
                key.clone(),
            )) as Arc<dyn TextModel>
        });
        Self::new(model, config.timeout)
    }

    /// Call the model, or return `None` when none is configured.
    pub async fn complete(&self, request: &ModelRequest) -> Result<Option<String>, GatewayError> {
        let Some(model) = &self.model else {
            return Ok(None);
        };

        debug!(
            prompt_len = request.prompt.len(),
            has_image = request.image.is_some(),
            "calling text model"
        );

        let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        let text = tokio::time::timeout(self.timeout, model.generate(request))
            .await
            .map_err(|_| {
                warn!(timeout_ms, "text model timed out");
                GatewayError::Timeout(timeout_ms)
            })?
            .inspect_err(|e| warn!(error = %e, "text model call failed"))?;

        if text.trim().is_empty() {
            return Err(GatewayError::Upstream(
                "model returned an empty response".to_string(),
            ));
        }

        debug!(response_len = text.len(), "text model replied");
        Ok(Some(text))
    }

    /// Like [`Gateway::complete`] but a missing model is an error.
    pub async fn require(&self, request: &ModelRequest) -> Result<String, GatewayError> {
        self.complete(request)
            .await?
            .ok_or(GatewayError::NotConfigured)
    }

    pub async fn text_or_else<F>(
        &self,
        request: &ModelRequest,
        fallback: F,
    ) -> Result<String, GatewayError>
    where
        F: FnOnce() -> String,
    {
        Ok(match self.complete(request).await? {
            Some(text) => text,
            None => fallback(),
        })
    }

    pub async fn json_or_else<T, F>(
        &self,
        request: &ModelRequest,
        shape: JsonShape,
        fallback: F,
    ) -> Result<T, GatewayError>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        match self.complete(request).await? {
            Some(text) => parse_json(&text, shape),
            None => Ok(fallback()),
        }
    }
}

/// Substitute `{{name}}` placeholders in one left-to-right pass.
///
/// Unknown placeholders are kept verbatim and substituted text is never
/// scanned again.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        match after.find("}}") {
            Some(close) => {
                let name = after[..close].trim();
                match vars.iter().find(|(key, _)| *key == name) {
                    Some((_, value)) => out.push_str(value),
                    None => out.push_str(&rest[open..open + 2 + close + 2]),
                }
                rest = &after[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// The span from the first opening delimiter to the last closing one.
pub fn json_span(raw: &str, shape: JsonShape) -> Option<&str> {
    let (open, close) = shape.delimiters();
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

pub fn parse_json<T: DeserializeOwned>(raw: &str, shape: JsonShape) -> Result<T, GatewayError> {
    let span = json_span(raw, shape).ok_or_else(|| {
        GatewayError::MalformedResponse(match shape {
            JsonShape::Object => "no JSON object in model response".to_string(),
            JsonShape::Array => "no JSON array in model response".to_string(),
        })
    })?;

    serde_json::from_str(span).map_err(|e| GatewayError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn render_fills_known_placeholders() {
        let out = render(
            "Make a {{difficulty}} quiz with {{ count }} questions about {{text}}.",
            &[("difficulty", "hard"), ("count", "3"), ("text", "volcanoes")],
        );
        assert_eq!(out, "Make a hard quiz with 3 questions about volcanoes.");
    }

    #[test]
    fn render_keeps_unknown_and_unclosed_placeholders() {
        assert_eq!(render("a {{missing}} b", &[]), "a {{missing}} b");
        assert_eq!(render("tail {{open", &[("open", "x")]), "tail {{open");
        assert_eq!(render(r#"{"k": 1}"#, &[]), r#"{"k": 1}"#);
    }

    #[test]
    fn render_does_not_expand_substituted_text() {
        let out = render("{{a}} {{b}}", &[("a", "{{b}}"), ("b", "two")]);
        assert_eq!(out, "{{b}} two");
    }

    #[test]
    fn parse_json_tolerates_fences_and_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"title\": \"Plants\", \"n\": 2}\n```\nEnjoy.";
        let value: Value = parse_json(raw, JsonShape::Object).unwrap();
        assert_eq!(value, json!({"title": "Plants", "n": 2}));
    }

    #[test]
    fn parse_json_finds_arrays() {
        let raw = "Questions: [{\"q\": 1}, {\"q\": 2}] done";
        let value: Value = parse_json(raw, JsonShape::Array).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn parse_json_reports_missing_and_broken_json() {
        let missing = parse_json::<Value>("no json here", JsonShape::Object).unwrap_err();
        assert!(matches!(missing, GatewayError::MalformedResponse(_)));

        let broken = parse_json::<Value>("{\"a\": }", JsonShape::Object).unwrap_err();
        assert!(matches!(broken, GatewayError::MalformedResponse(_)));

        let reversed = parse_json::<Value>("} oops {", JsonShape::Object).unwrap_err();
        assert!(matches!(reversed, GatewayError::MalformedResponse(_)));
    }

    struct Echo;

    #[async_trait]
    impl TextModel for Echo {
        async fn generate(&self, request: &ModelRequest) -> Result<String, GatewayError> {
            Ok(request.prompt.clone())
        }
    }

    struct Slow;

    #[async_trait]
    impl TextModel for Slow {
        async fn generate(&self, _request: &ModelRequest) -> Result<String, GatewayError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok("too late".to_string())
        }
    }

    #[tokio::test]
    async fn unconfigured_gateway_uses_fallback() {
        let gateway = Gateway::unconfigured();
        let text = gateway
            .text_or_else(&ModelRequest::text("hi"), || "fallback".to_string())
            .await
            .unwrap();
        assert_eq!(text, "fallback");
        assert!(matches!(
            gateway.require(&ModelRequest::text("hi")).await,
            Err(GatewayError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn configured_gateway_calls_model() {
        let gateway = Gateway::new(Some(Arc::new(Echo)), Duration::from_secs(5));
        let text = gateway
            .text_or_else(&ModelRequest::text("hello"), || unreachable!())
            .await
            .unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn blank_reply_is_an_upstream_error() {
        let gateway = Gateway::new(Some(Arc::new(Echo)), Duration::from_secs(5));
        let err = gateway.complete(&ModelRequest::text("   ")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_model_times_out() {
        let gateway = Gateway::new(Some(Arc::new(Slow)), Duration::from_millis(45_000));
        let err = gateway.complete(&ModelRequest::text("hi")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Timeout(45_000)));
    }
}
