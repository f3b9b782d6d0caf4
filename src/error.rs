//! Error types shared across the crate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::data::LoadError;
use crate::models::Role;
use crate::protocol::ErrorCode;
use crate::storage::StorageError;

/// Input that breaks one of the authoring, answering or registration rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Question text must not be empty")]
    EmptyQuestionText,

    #[error("Every option must have text")]
    EmptyOption,

    #[error("A question needs between {min} and {max} options, got {got}")]
    OptionCount { min: usize, max: usize, got: usize },

    #[error("Correct answer {index} is out of range for {options} options")]
    CorrectAnswerOutOfRange { index: usize, options: usize },

    #[error("Question id {0} is used more than once")]
    DuplicateQuestionId(String),

    #[error("Form title must not be empty")]
    EmptyTitle,

    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("A form needs at least one question")]
    NoQuestions,

    #[error("Expected {expected} answers, got {got}")]
    AnswerCount { expected: usize, got: usize },

    #[error("Question {0} has not been answered")]
    Unanswered(usize),

    #[error("Answer {answer} to question {question} is not a valid option")]
    InvalidAnswer { question: usize, answer: usize },

    #[error("Please fill in all fields")]
    MissingFields,

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },

    #[error("Username must not contain whitespace")]
    UsernameWhitespace,
}

/// Authentication and authorization failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("You must be logged in")]
    NotAuthenticated,

    #[error("This action requires the {0} role")]
    WrongRole(Role),

    #[error("Only the author of this form can change it")]
    NotOwner,
}

/// Top-level error for quiz-forms operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("You have already submitted this form")]
    AlreadySubmitted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Protocol code reported to clients for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Validation(_) => ErrorCode::Validation,
            Error::Auth(AuthError::InvalidCredentials | AuthError::NotAuthenticated) => {
                ErrorCode::NotAuthenticated
            }
            Error::Auth(AuthError::UsernameTaken) => ErrorCode::Conflict,
            Error::Auth(AuthError::WrongRole(_) | AuthError::NotOwner) => ErrorCode::Forbidden,
            Error::NotFound { .. } => ErrorCode::NotFound,
            Error::AlreadySubmitted => ErrorCode::Conflict,
            Error::Storage(_) | Error::Load(_) | Error::Config(_) | Error::Io(_) => {
                ErrorCode::Internal
            }
        }
    }

    /// Internal errors are logged, not shown to clients verbatim.
    pub fn is_internal(&self) -> bool {
        self.code() == ErrorCode::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::from(ValidationError::EmptyTitle).code(),
            ErrorCode::Validation
        );
        assert_eq!(
            Error::from(AuthError::WrongRole(Role::Teacher)).code(),
            ErrorCode::Forbidden
        );
        assert_eq!(
            Error::from(AuthError::UsernameTaken).code(),
            ErrorCode::Conflict
        );
        assert_eq!(Error::not_found("Form", "x").code(), ErrorCode::NotFound);
        assert!(Error::from(std::io::Error::other("disk")).is_internal());
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::not_found("Form", "form_1").to_string(),
            "Form not found: form_1"
        );
        assert_eq!(
            Error::from(AuthError::WrongRole(Role::Student)).to_string(),
            "This action requires the student role"
        );
    }
}
