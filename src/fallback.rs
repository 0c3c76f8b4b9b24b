//! Canned content served when no model key is configured.

use rand::seq::SliceRandom;
use serde_json::{json, Value};

use crate::quiz::{Quiz, QuizQuestion};

const MAX_SAMPLE_QUESTIONS: usize = 5;

pub const CHAT_REPLIES: &[&str] = &[
    "Hi there! I'm BrainBuddy! 🎓 I'm here to help you learn. What subject are you working on today?",
    "That's a great question! 🤔 I can't use my full AI powers right now, but practice makes perfect! Keep studying! ✨",
    "Learning is awesome! 🌟 Every expert was once a beginner. You're doing great by asking questions!",
    "I love your curiosity! 💡 Keep exploring and learning new things. That's what makes you amazing!",
    "Study tip: break big topics into smaller pieces! 📚 Everything gets easier to understand. You've got this! 💪",
];

pub const QUOTES: &[&str] = &[
    "Progress, not perfection! Every step counts.",
    "Small steps every day lead to big results.",
    "Keep going! You're getting better every day.",
    "Learning is a journey, not a race.",
    "Mistakes are proof that you are trying!",
    "Celebrate your progress, no matter how small.",
    "Stay curious and keep moving forward!",
    "Every expert was once a beginner.",
    "Believe in yourself and your progress!",
    "Success is the sum of small efforts repeated day in and day out.",
];

fn pick(lines: &[&str]) -> String {
    lines
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

pub fn chat_reply() -> String {
    pick(CHAT_REPLIES)
}

pub fn quote() -> String {
    pick(QUOTES)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn quiz(difficulty: &str, question_count: usize) -> Quiz {
    let questions = (0..question_count.min(MAX_SAMPLE_QUESTIONS))
        .map(|i| {
            let n = i + 1;
            QuizQuestion {
                question: format!(
                    "Sample question {} about the content ({} level)",
                    n, difficulty
                ),
                options: ["A", "B", "C", "D"]
                    .iter()
                    .map(|letter| format!("This is option {} for question {}", letter, n))
                    .collect(),
                correct_answer: i % 4,
                explanation: format!(
                    "This is a sample explanation for question {}. With a model configured it \
                     would explain why the answer is right based on your content.",
                    n
                ),
            }
        })
        .collect();

    Quiz {
        title: format!("{} Quiz", capitalize(difficulty)),
        questions,
    }
}

pub fn summary() -> String {
    "# Summary of Your Content

## Key Points:
• This is a sample summary of your uploaded content
• The main topics and concepts would be highlighted here
• Important details would be broken down into easy-to-understand points
• Key learning objectives would be clearly stated

## What You Should Remember:
• Main concept 1: Brief explanation
• Main concept 2: Brief explanation
• Main concept 3: Brief explanation

## Next Steps:
• Review the key points above
• Try taking a quiz on this content
• Ask BrainBuddy if you have questions!

*Note: This is a sample summary. Add a Gemini API key to get AI-generated summaries.*"
        .to_string()
}

pub fn extracted_text() -> String {
    "Sample Text Extracted from Image

This is sample text that would normally be extracted from your image.
With a model configured, this would contain the actual text from your upload.

Things your image might contain:
• Important concepts and definitions
• Study notes and explanations
• Formulas or equations
• Lists and bullet points

Add a Gemini API key to extract real text from images."
        .to_string()
}

pub fn grammar_check(text: &str) -> Value {
    json!({
        "overallScore": 75,
        "issues": [{
            "type": "grammar",
            "severity": "suggestion",
            "message": "Consider using more descriptive words",
            "suggestion": "Try adding adjectives to make your writing more vivid",
            "position": { "start": 0, "end": text.chars().count() }
        }],
        "improvements": [{
            "category": "clarity",
            "suggestion": "Break long sentences into shorter ones",
            "example": "Instead of one long sentence, try two shorter ones"
        }],
        "correctedText": text,
        "writingTips": [
            "Read your work out loud to catch mistakes",
            "Use a variety of sentence structures"
        ]
    })
}

pub fn vocabulary_enhancement(text: &str) -> Value {
    json!({
        "enhancedText": text,
        "wordSuggestions": [{
            "originalWord": "good",
            "suggestions": [{
                "word": "excellent",
                "definition": "very good",
                "difficulty": "easy",
                "context": "when something is really good"
            }]
        }],
        "newVocabulary": [{
            "word": "excellent",
            "definition": "very good or outstanding",
            "example": "You did an excellent job on your homework!",
            "category": "adjective"
        }],
        "learningTips": [
            "Try using new words in your daily conversations",
            "Write down new words and their meanings"
        ],
        "difficultyLevel": "beginner"
    })
}

pub fn text_analysis() -> Value {
    json!({
        "sentiment": { "overall": "neutral", "confidence": 0.5, "emotions": ["neutral"] },
        "complexity": { "readingLevel": "middle", "difficultyScore": 0.5, "suggestedAge": "11-13" },
        "keyConcepts": [{
            "concept": "Main Topic",
            "importance": "high",
            "explanation": "This is the main subject being discussed"
        }],
        "vocabulary": { "difficultWords": [], "definitions": {}, "suggestedReplacements": {} },
        "learningRecommendations": [{
            "type": "summary",
            "reason": "To understand the main points",
            "priority": "high"
        }],
        "comprehensionQuestions": [{
            "question": "What is the main topic of this text?",
            "type": "main-idea"
        }]
    })
}

pub fn recommendations() -> Value {
    json!({
        "recommendations": [{
            "type": "quiz",
            "title": "Practice Quiz",
            "description": "Test your knowledge with a fun quiz",
            "difficulty": "medium",
            "estimatedTime": "15 minutes",
            "priority": "high"
        }],
        "nextTopics": [{
            "topic": "Advanced Concepts",
            "reason": "You're ready for more challenging material",
            "prerequisites": ["Basic understanding"],
            "resources": ["Interactive lessons", "Practice exercises"]
        }],
        "studyPlan": {
            "dailyGoal": "30 minutes",
            "weeklyFocus": "Building on current knowledge",
            "suggestedSchedule": [{
                "day": "Monday",
                "activity": "Review and practice",
                "duration": "20 minutes"
            }]
        },
        "motivationalTips": [
            "You're making great progress! Keep up the good work!",
            "Remember, every expert was once a beginner"
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::validate_questions;

    #[test]
    fn quiz_caps_sample_questions_and_rotates_answers() {
        let quiz = quiz("hard", 15);
        assert_eq!(quiz.title, "Hard Quiz");
        assert_eq!(quiz.questions.len(), 5);
        let answers: Vec<_> = quiz.questions.iter().map(|q| q.correct_answer).collect();
        assert_eq!(answers, vec![0, 1, 2, 3, 0]);
        assert!(validate_questions(&quiz.questions).is_ok());
    }

    #[test]
    fn quiz_respects_small_counts() {
        assert_eq!(quiz("medium", 2).questions.len(), 2);
        assert_eq!(quiz("", 1).title, " Quiz");
    }

    #[test]
    fn grammar_fallback_echoes_text() {
        let check = grammar_check("i like dogs");
        assert_eq!(check["correctedText"], "i like dogs");
        assert_eq!(check["issues"][0]["position"]["end"], 11);
    }

    #[test]
    fn canned_lines_come_from_their_lists() {
        assert!(QUOTES.contains(&quote().as_str()));
        assert!(CHAT_REPLIES.contains(&chat_reply().as_str()));
    }
}
