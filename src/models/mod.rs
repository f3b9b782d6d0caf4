//! Core entities: users, subjects, forms, questions and responses.

mod form;
mod question;
mod response;
mod subject;
mod user;

pub use form::{Form, MoveDirection};
pub use question::{Question, QuestionDraft, MAX_OPTIONS, MIN_OPTIONS};
pub use response::FormResponse;
pub use subject::Subject;
pub use user::{validate_username, Identity, Role, User, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH};
