use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

use super::{Question, Subject};

/// A named set of multiple-choice questions authored by a teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub created_by: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Direction for reordering a question within its form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Up,
    Down,
}

impl Form {
    /// Create an empty form after checking its title and subject.
    pub fn new(title: &str, subject: &str, created_by: &str) -> Result<Self, ValidationError> {
        validate_header(title, subject)?;
        Ok(Self {
            id: format!("form_{}", Uuid::new_v4().simple()),
            title: title.trim().to_string(),
            subject: subject.to_string(),
            created_by: created_by.to_string(),
            questions: Vec::new(),
        })
    }

    /// Checks applied when a full form is saved from the editor.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_header(&self.title, &self.subject)?;

        if self.questions.is_empty() {
            return Err(ValidationError::NoQuestions);
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            question.validate()?;
            if !seen.insert(question.id.as_str()) {
                return Err(ValidationError::DuplicateQuestionId(question.id.clone()));
            }
        }

        Ok(())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.created_by == user_id
    }

    pub fn question_index(&self, question_id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == question_id)
    }

    /// Swap a question with its neighbour. Returns false at the boundaries.
    pub fn move_question(&mut self, index: usize, direction: MoveDirection) -> bool {
        if index >= self.questions.len() {
            return false;
        }
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1),
            MoveDirection::Down => index.checked_add(1).filter(|t| *t < self.questions.len()),
        };
        let Some(target) = target else {
            return false;
        };
        self.questions.swap(index, target);
        true
    }
}

fn validate_header(title: &str, subject: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if !Subject::exists(subject) {
        return Err(ValidationError::UnknownSubject(subject.to_string()));
    }
    Ok(())
}
