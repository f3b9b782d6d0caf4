//! Application services over [`Storage`](crate::storage::Storage).

mod auth;
mod forms;

pub use auth::{AuthService, Registration, Session, DEFAULT_SESSION_TTL};
pub use forms::{FormService, FormSummary, StudentFormEntry, Submission, TeacherFormEntry};
