//! Protocol messages for client-server communication.
//!
//! All messages are serialized as JSON over WebSocket. Every client request
//! gets exactly one server reply, in request order.

use serde::{Deserialize, Serialize};

use crate::models::{Form, FormResponse, Identity, MoveDirection, QuestionDraft, Role, Subject};
use crate::scoring::FormReport;
use crate::services::{FormSummary, StudentFormEntry, Submission, TeacherFormEntry};

/// Default server port.
pub const DEFAULT_PORT: u16 = 8712;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Create an account and log in.
    Register {
        username: String,
        password: String,
        confirm_password: String,
        role: Role,
        #[serde(default)]
        subjects: Vec<String>,
    },

    Login {
        username: String,
        password: String,
    },

    /// Reattach a session from an earlier connection.
    Resume {
        token: String,
    },

    Logout,

    ListSubjects,

    /// Forms in one subject, or every form when `subject` is absent.
    ListForms {
        #[serde(default)]
        subject: Option<String>,
    },

    GetForm {
        form_id: String,
    },

    CreateForm {
        title: String,
        subject: String,
    },

    UpdateForm {
        form: Form,
    },

    DeleteForm {
        form_id: String,
    },

    AddQuestion {
        form_id: String,
        question: QuestionDraft,
    },

    UpdateQuestion {
        form_id: String,
        question_id: String,
        question: QuestionDraft,
    },

    RemoveQuestion {
        form_id: String,
        question_id: String,
    },

    MoveQuestion {
        form_id: String,
        index: usize,
        direction: MoveDirection,
    },

    /// `null` entries are unanswered questions.
    SubmitResponse {
        form_id: String,
        answers: Vec<Option<usize>>,
    },

    MyResults,

    FormResults {
        form_id: String,
    },

    TeacherDashboard,

    StudentDashboard,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Connection accepted, waiting for requests.
    ConnectionAck,

    /// Login, registration or resume succeeded.
    Authenticated { token: String, user: Identity },

    LoggedOut,

    Subjects { subjects: Vec<Subject> },

    Forms { forms: Vec<FormSummary> },

    /// Full form including correct answers (teachers only).
    FormDetail { form: Form },

    /// A form as a student sees it. `submission` is present once answered.
    StudentForm {
        form: PublicForm,
        submission: Option<Submission>,
    },

    FormSaved { form: Form },

    FormDeleted { form_id: String },

    Submitted { submission: Submission },

    StudentResults { responses: Vec<FormResponse> },

    Report { report: FormReport },

    TeacherDashboard { forms: Vec<TeacherFormEntry> },

    StudentDashboard { forms: Vec<StudentFormEntry> },

    Error { code: ErrorCode, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
    Validation,
    NotAuthenticated,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
}

/// A question without its correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
}

/// A form with the answers stripped out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicForm {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub questions: Vec<PublicQuestion>,
}

impl From<&Form> for PublicForm {
    fn from(form: &Form) -> Self {
        Self {
            id: form.id.clone(),
            title: form.title.clone(),
            subject: form.subject.clone(),
            questions: form
                .questions
                .iter()
                .map(|q| PublicQuestion {
                    id: q.id.clone(),
                    text: q.text.clone(),
                    options: q.options.clone(),
                })
                .collect(),
        }
    }
}

impl ServerMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code,
            message: message.into(),
        }
    }
}
