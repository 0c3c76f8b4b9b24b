//! Lessons built from video transcripts: the one-shot analysis served over
//! HTTP and the chunked summary plus quiz pipeline used by the CLI.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::gateway::{parse_json, Gateway, GatewayError, JsonShape, ModelRequest};
use crate::prompts;
use crate::quiz::{validate_questions, QuizQuestion};
use crate::transcript::chunk_text;

pub const MIN_TRANSCRIPT_CHARS: usize = 50;
pub const MIN_ANALYSIS_QUESTIONS: usize = 3;
pub const CHUNK_CHARS: usize = 4000;
pub const PIPELINE_QUESTIONS: usize = 10;

const GENERIC_INDICATORS: &[&str] = &[
    "this video content covers various topics",
    "the transcript contains valuable information",
    "main concepts presented in the video",
    "general content analysis",
    "based on the general content",
    "this is a sample transcript",
    "educational purposes",
    "test the video analysis",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisReply {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    quiz: Option<ReplyQuiz>,
    difficulty: Option<String>,
    estimated_read_time: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyQuiz {
    questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoQuiz {
    pub id: String,
    pub title: String,
    pub questions: Vec<QuizQuestion>,
    pub difficulty_level: String,
    pub total_questions: usize,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoAnalysis {
    pub summary: String,
    pub quiz: VideoQuiz,
    pub title: String,
    pub key_points: Vec<String>,
    pub difficulty: String,
    pub estimated_read_time: String,
    pub tags: Vec<String>,
}

impl VideoAnalysis {
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        title: String,
        summary: String,
        key_points: Vec<String>,
        questions: Vec<QuizQuestion>,
        difficulty: Option<String>,
        estimated_read_time: Option<String>,
        tags: Vec<String>,
        now: OffsetDateTime,
    ) -> Self {
        let difficulty = difficulty
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "medium".to_string());
        let millis = now.unix_timestamp_nanos() / 1_000_000;

        Self {
            summary,
            quiz: VideoQuiz {
                id: format!("video-quiz-{}", millis),
                title: title.clone(),
                total_questions: questions.len(),
                questions,
                difficulty_level: difficulty.clone(),
                created_at: now,
            },
            title,
            key_points,
            difficulty,
            estimated_read_time: estimated_read_time
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "3-5 minutes".to_string()),
            tags,
        }
    }
}

pub fn analysis_request(transcript: &str, video_title: Option<&str>) -> ModelRequest {
    ModelRequest::from_template(
        prompts::VIDEO_ANALYSIS_PROMPT,
        &[
            ("video_title", video_title.unwrap_or("Untitled video")),
            ("transcript", transcript),
        ],
    )
}

/// Parse and check a model reply to [`analysis_request`].
pub fn analysis_from_reply(raw: &str, now: OffsetDateTime) -> Result<VideoAnalysis, GatewayError> {
    let reply: AnalysisReply = parse_json(raw, JsonShape::Object)?;

    let questions = match reply.quiz {
        Some(quiz) if !reply.title.trim().is_empty() && !reply.summary.trim().is_empty() => {
            quiz.questions
        }
        _ => {
            return Err(GatewayError::MalformedResponse(
                "Missing required fields in model response".to_string(),
            ))
        }
    };
    if questions.len() < MIN_ANALYSIS_QUESTIONS {
        return Err(GatewayError::MalformedResponse(format!(
            "Quiz must have at least {} questions",
            MIN_ANALYSIS_QUESTIONS
        )));
    }
    validate_questions(&questions).map_err(GatewayError::MalformedResponse)?;

    let summary_lower = reply.summary.to_lowercase();
    if GENERIC_INDICATORS.iter().any(|i| summary_lower.contains(i)) {
        warn!("video summary looks generic; the transcript may not have been used");
    }

    debug!(
        title = %reply.title,
        summary_len = reply.summary.len(),
        questions = questions.len(),
        "parsed video analysis"
    );

    Ok(VideoAnalysis::assemble(
        reply.title,
        reply.summary,
        reply.key_points,
        questions,
        reply.difficulty,
        reply.estimated_read_time,
        reply.tags,
        now,
    ))
}

fn options(right: &str, wrong: [&str; 3]) -> Vec<String> {
    std::iter::once(right)
        .chain(wrong)
        .map(str::to_string)
        .collect()
}

fn sentences(transcript: &str) -> Vec<String> {
    transcript
        .split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > 10)
        .map(str::to_string)
        .collect()
}

/// Analysis built without a model: the transcript's own sentences become the
/// summary and key points, with a short comprehension quiz.
pub fn fallback_analysis(
    transcript: &str,
    video_title: Option<&str>,
    now: OffsetDateTime,
) -> VideoAnalysis {
    let title = video_title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Video Lesson")
        .to_string();
    let sentences = sentences(transcript);
    let summary = if sentences.is_empty() {
        transcript.trim().to_string()
    } else {
        sentences.iter().take(4).cloned().collect::<Vec<_>>().join(" ")
    };
    let key_points: Vec<String> = sentences.iter().take(5).cloned().collect();

    let questions = vec![
        QuizQuestion {
            question: format!("What is \"{}\" mainly about?", title),
            options: options(
                "The ideas explained in the video",
                ["A cooking recipe", "A sports match", "A weather report"],
            ),
            correct_answer: 0,
            explanation: "The summary above describes what the video explains.".to_string(),
        },
        QuizQuestion {
            question: "What is a good way to remember what you watched?".to_string(),
            options: options(
                "Review the key points in your own words",
                ["Skip the summary", "Watch only the first minute", "Never take notes"],
            ),
            correct_answer: 0,
            explanation: "Explaining ideas in your own words helps them stick.".to_string(),
        },
        QuizQuestion {
            question: "What should you do if part of the video was confusing?".to_string(),
            options: options(
                "Rewatch that part or ask BrainBuddy",
                ["Give up", "Guess and move on", "Ignore it"],
            ),
            correct_answer: 0,
            explanation: "Going back over tricky parts is how learning happens.".to_string(),
        },
    ];

    VideoAnalysis::assemble(
        title,
        summary,
        key_points,
        questions,
        None,
        None,
        vec!["video".to_string(), "lesson".to_string()],
        now,
    )
}

/// Summarize each chunk of a long transcript, combining the pieces when
/// there is more than one.
pub async fn summarize_transcript(
    gateway: &Gateway,
    transcript: &str,
) -> Result<String, GatewayError> {
    let chunks = chunk_text(transcript, CHUNK_CHARS);
    info!(chunks = chunks.len(), "summarizing transcript");

    let mut summaries = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        let request =
            ModelRequest::from_template(prompts::TRANSCRIPT_SUMMARY_PROMPT, &[("transcript", chunk)])
                .temperature(0.2)
                .max_output_tokens(800);
        summaries.push(gateway.require(&request).await?.trim().to_string());
    }

    if summaries.len() == 1 {
        return Ok(summaries.remove(0));
    }

    let joined = summaries.join("\n\n");
    let request =
        ModelRequest::from_template(prompts::COMBINE_SUMMARIES_PROMPT, &[("summaries", &joined)])
            .temperature(0.2)
            .max_output_tokens(800);
    Ok(gateway.require(&request).await?.trim().to_string())
}

/// Ten questions from the transcript, or from the summary when the
/// transcript does not fit in one chunk.
pub async fn transcript_quiz(
    gateway: &Gateway,
    transcript: &str,
    summary: &str,
) -> Result<Vec<QuizQuestion>, GatewayError> {
    let source = if transcript.chars().count() <= CHUNK_CHARS {
        transcript
    } else {
        summary
    };
    let count = PIPELINE_QUESTIONS.to_string();
    let request = ModelRequest::from_template(
        prompts::TRANSCRIPT_QUIZ_PROMPT,
        &[("question_count", &count), ("source", source)],
    )
    .temperature(0.2)
    .max_output_tokens(1200);

    let raw = gateway.require(&request).await?;
    let questions: Vec<QuizQuestion> = parse_json(&raw, JsonShape::Array)?;
    if questions.len() != PIPELINE_QUESTIONS {
        return Err(GatewayError::MalformedResponse(format!(
            "expected {} questions, got {}",
            PIPELINE_QUESTIONS,
            questions.len()
        )));
    }
    validate_questions(&questions).map_err(GatewayError::MalformedResponse)?;
    Ok(questions)
}
