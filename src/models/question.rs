use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// A multiple-choice question inside a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

/// Question content as submitted by an editor, before it gets an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
}

impl Question {
    pub fn new_id() -> String {
        format!("q_{}", Uuid::new_v4().simple())
    }

    /// Validate a draft and give it a fresh id.
    pub fn from_draft(draft: QuestionDraft) -> Result<Self, ValidationError> {
        draft.into_question(Self::new_id())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.text, &self.options, self.correct_answer)
    }

    pub fn is_correct(&self, answer: usize) -> bool {
        self.correct_answer == answer
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options.get(self.correct_answer).map(String::as_str)
    }
}

impl QuestionDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_content(&self.text, &self.options, self.correct_answer)
    }

    /// Validate and trim the draft into a question with the given id.
    pub fn into_question(self, id: String) -> Result<Question, ValidationError> {
        self.validate()?;
        Ok(Question {
            id,
            text: self.text.trim().to_string(),
            options: self.options.iter().map(|o| o.trim().to_string()).collect(),
            correct_answer: self.correct_answer,
        })
    }
}

fn validate_content(
    text: &str,
    options: &[String],
    correct_answer: usize,
) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyQuestionText);
    }

    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(ValidationError::OptionCount {
            min: MIN_OPTIONS,
            max: MAX_OPTIONS,
            got: options.len(),
        });
    }

    if options.iter().any(|o| o.trim().is_empty()) {
        return Err(ValidationError::EmptyOption);
    }

    if correct_answer >= options.len() {
        return Err(ValidationError::CorrectAnswerOutOfRange {
            index: correct_answer,
            options: options.len(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, options: &[&str], correct_answer: usize) -> QuestionDraft {
        QuestionDraft {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
        }
    }

    #[test]
    fn test_valid_draft_is_trimmed() {
        let q = Question::from_draft(draft("  What is 2+2? ", &[" 3", "4 "], 1)).unwrap();
        assert!(q.id.starts_with("q_"));
        assert_eq!(q.text, "What is 2+2?");
        assert_eq!(q.options, vec!["3", "4"]);
        assert_eq!(q.correct_option(), Some("4"));
        assert!(q.is_correct(1));
    }

    #[test]
    fn test_rejects_blank_text_and_options() {
        assert_eq!(
            draft("   ", &["a", "b"], 0).validate(),
            Err(ValidationError::EmptyQuestionText)
        );
        assert_eq!(
            draft("q", &["a", "  "], 0).validate(),
            Err(ValidationError::EmptyOption)
        );
    }

    #[test]
    fn test_option_count_bounds() {
        assert!(draft("q", &["a"], 0).validate().is_err());
        assert!(draft("q", &["a", "b"], 0).validate().is_ok());
        assert!(draft("q", &["a", "b", "c", "d", "e", "f"], 5).validate().is_ok());
        assert_eq!(
            draft("q", &["a", "b", "c", "d", "e", "f", "g"], 0).validate(),
            Err(ValidationError::OptionCount {
                min: 2,
                max: 6,
                got: 7
            })
        );
    }

    #[test]
    fn test_correct_answer_in_range() {
        assert_eq!(
            draft("q", &["a", "b"], 2).validate(),
            Err(ValidationError::CorrectAnswerOutOfRange {
                index: 2,
                options: 2
            })
        );
    }
}
