use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student's submitted answers to a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormResponse {
    pub id: String,
    pub form_id: String,
    pub student_id: String,
    /// Selected option index per question, in question order.
    pub answers: Vec<usize>,
    pub submitted_at: DateTime<Utc>,
    /// Percentage of correct answers, 0 to 100.
    pub score: f64,
}

impl FormResponse {
    pub fn new(form_id: &str, student_id: &str, answers: Vec<usize>, score: f64) -> Self {
        Self {
            id: format!("response_{}", Uuid::new_v4().simple()),
            form_id: form_id.to_string(),
            student_id: student_id.to_string(),
            answers,
            submitted_at: Utc::now(),
            score,
        }
    }
}
