//! YouTube caption download.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";
pub const MIN_TRANSCRIPT_CHARS: usize = 20;

fn video_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:watch\?(?:[^#\s]*&)?v=|embed/|shorts/|v/|live/)|youtu\.be/)([\w-]{11})(?:[^\w-]|$)",
        )
        .expect("video id pattern")
    })
}

fn xml_text_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").expect("xml text pattern"))
}

/// Pull the 11-character video id out of any common YouTube URL form.
pub fn extract_video_id(url: &str) -> Option<String> {
    video_id_pattern()
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn is_video_id(candidate: &str) -> bool {
    candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptMethod {
    Manual,
    Xml,
}

impl TranscriptMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptMethod::Manual => "manual",
            TranscriptMethod::Xml => "xml",
        }
    }
}

impl fmt::Display for TranscriptMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub method: TranscriptMethod,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    #[serde(default)]
    pub language_code: String,
    /// `"asr"` for auto-generated captions.
    pub kind: Option<String>,
}

impl CaptionTrack {
    fn is_generated(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| k.contains("asr"))
    }
}

#[derive(Clone)]
pub struct TranscriptFetcher {
    http: reqwest::Client,
    base_url: String,
}

impl TranscriptFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_url("https://www.youtube.com")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Try each download method in turn; on total failure return every
    /// method's error message.
    pub async fn fetch(&self, video_id: &str) -> Result<Transcript, Vec<String>> {
        let mut attempts = Vec::new();

        match self.from_caption_tracks(video_id).await {
            Ok(text) => return Ok(self.found(video_id, text, TranscriptMethod::Manual)),
            Err(e) => {
                debug!(video_id, error = %e, "caption track download failed");
                attempts.push(format!("Manual method: {}", e));
            }
        }

        match self.from_timedtext_xml(video_id).await {
            Ok(text) => return Ok(self.found(video_id, text, TranscriptMethod::Xml)),
            Err(e) => {
                debug!(video_id, error = %e, "timedtext download failed");
                attempts.push(format!("XML method: {}", e));
            }
        }

        warn!(video_id, attempts = attempts.len(), "no transcript available");
        Err(attempts)
    }

    fn found(&self, video_id: &str, text: String, method: TranscriptMethod) -> Transcript {
        info!(video_id, %method, chars = text.chars().count(), "transcript fetched");
        Transcript { text, method }
    }

    async fn get_text(&self, url: &str) -> Result<String, String> {
        let response = self
            .http
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }
        response.text().await.map_err(|e| e.to_string())
    }

    async fn from_caption_tracks(&self, video_id: &str) -> Result<String, String> {
        let html = self
            .get_text(&format!("{}/watch?v={}", self.base_url, video_id))
            .await?;
        let player = player_response(&html)
            .ok_or_else(|| "could not find the player response on the watch page".to_string())?;
        let tracks = caption_tracks(&player);
        let track = pick_track(&tracks)
            .ok_or_else(|| "no caption tracks in player response".to_string())?;

        debug!(
            video_id,
            language = %track.language_code,
            generated = track.is_generated(),
            "selected caption track"
        );

        let body = self
            .get_text(&format!("{}&fmt=json3", track.base_url))
            .await?;
        let events: Value = serde_json::from_str(&body).map_err(|e| e.to_string())?;
        long_enough(json3_text(&events))
    }

    async fn from_timedtext_xml(&self, video_id: &str) -> Result<String, String> {
        let xml = self
            .get_text(&format!(
                "{}/api/timedtext?v={}&lang=en",
                self.base_url, video_id
            ))
            .await?;
        long_enough(xml_text(&xml))
    }
}

fn long_enough(text: String) -> Result<String, String> {
    if text.chars().count() < MIN_TRANSCRIPT_CHARS {
        Err("extracted transcript is too short".to_string())
    } else {
        Ok(text)
    }
}

/// Parse the JSON value assigned to `ytInitialPlayerResponse` in a watch page.
pub fn player_response(html: &str) -> Option<Value> {
    html.match_indices(PLAYER_RESPONSE_MARKER).find_map(|(at, _)| {
        let rest = &html[at + PLAYER_RESPONSE_MARKER.len()..];
        let rest = rest.trim_start_matches(|c: char| c == '"' || c == ']' || c.is_whitespace());
        let rest = rest.strip_prefix('=')?.trim_start();
        serde_json::Deserializer::from_str(rest)
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

pub fn caption_tracks(player: &Value) -> Vec<CaptionTrack> {
    player
        .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
        .cloned()
        .and_then(|tracks| serde_json::from_value(tracks).ok())
        .unwrap_or_default()
}

/// Manual English, then any English, then any manual track, then the first.
pub fn pick_track(tracks: &[CaptionTrack]) -> Option<&CaptionTrack> {
    let english = |t: &&CaptionTrack| t.language_code == "en" || t.language_code.starts_with("en-");
    tracks
        .iter()
        .find(|t| english(t) && !t.is_generated())
        .or_else(|| tracks.iter().find(english))
        .or_else(|| tracks.iter().find(|t| !t.is_generated()))
        .or_else(|| tracks.first())
}

pub fn json3_text(events: &Value) -> String {
    let pieces = events
        .get("events")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|event| event.get("segs").and_then(Value::as_array))
        .map(|segs| {
            segs.iter()
                .filter_map(|seg| seg.get("utf8").and_then(Value::as_str))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&pieces)
}

pub fn xml_text(xml: &str) -> String {
    let pieces = xml_text_pattern()
        .captures_iter(xml)
        .filter_map(|caps| caps.get(1))
        .map(|m| decode_entities(m.as_str()))
        .collect::<Vec<_>>()
        .join(" ");
    normalize_whitespace(&pieces)
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Rough sentence count used in transcript responses.
pub fn segment_count(text: &str) -> usize {
    text.split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Split `text` into chunks of at most `max_chars` characters, cutting
/// after a period when one sits more than 100 characters into the chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = rest
            .char_indices()
            .nth(max_chars.max(1))
            .map_or(rest.len(), |(at, _)| at);
        if end < rest.len() {
            if let Some(period) = rest[..end].rfind('.') {
                if rest[..period].chars().count() > 100 {
                    end = period + 1;
                }
            }
        }

        let chunk = rest[..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        rest = &rest[end..];
    }
    chunks
}
