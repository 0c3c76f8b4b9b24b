use serde::{Deserialize, Serialize};

pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    #[serde(default)]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl QuizQuestion {
    /// Checks the four-option, in-range-answer shape. `index` is 0-based.
    pub fn validate(&self, index: usize) -> Result<(), String> {
        if self.question.trim().is_empty() || self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!("Question {} is invalid", index + 1));
        }
        if self.correct_answer >= OPTIONS_PER_QUESTION {
            return Err(format!("Question {} has invalid correctAnswer", index + 1));
        }
        Ok(())
    }
}

pub fn validate_questions(questions: &[QuizQuestion]) -> Result<(), String> {
    if questions.is_empty() {
        return Err("Quiz has no questions".to_string());
    }
    questions
        .iter()
        .enumerate()
        .try_for_each(|(i, q)| q.validate(i))
}
