//! Score computation and results aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Form, FormResponse, Question};

/// Outcome of grading one set of answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
}

/// Coarse band a percentage falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Excellent,
    Good,
    Pass,
    Fail,
}

impl Grade {
    pub fn from_percentage(percentage: f64) -> Self {
        match percentage as u32 {
            90.. => Grade::Excellent,
            70..=89 => Grade::Good,
            50..=69 => Grade::Pass,
            _ => Grade::Fail,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Excellent => "Excellent",
            Grade::Good => "Good",
            Grade::Pass => "Pass",
            Grade::Fail => "Fail",
        }
    }
}

/// Standing of a single response on the results page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Approved,
    Regular,
    Failed,
}

impl ResponseStatus {
    /// Approved from 70%, regular from 40%, failed below that.
    pub fn from_score(score: f64) -> Self {
        if score >= 70.0 {
            ResponseStatus::Approved
        } else if score >= 40.0 {
            ResponseStatus::Regular
        } else {
            ResponseStatus::Failed
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResponseStatus::Approved => "Approved",
            ResponseStatus::Regular => "Regular",
            ResponseStatus::Failed => "Failed",
        }
    }
}

/// `correct / total * 100`, or 0 when there is nothing to score.
pub fn percentage(correct: usize, total: usize) -> f64 {
    if total > 0 {
        (correct as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Grade answers against questions position by position.
///
/// Missing answers count as wrong; extra answers are ignored.
pub fn score(questions: &[Question], answers: &[usize]) -> Score {
    let correct = questions
        .iter()
        .zip(answers.iter())
        .filter(|(question, answer)| question.is_correct(**answer))
        .count();
    let total = questions.len();

    Score {
        correct,
        total,
        percentage: percentage(correct, total),
    }
}

pub fn average_score(responses: &[FormResponse]) -> f64 {
    if responses.is_empty() {
        return 0.0;
    }
    responses.iter().map(|r| r.score).sum::<f64>() / responses.len() as f64
}

/// Per-question feedback shown once a response is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerReview {
    pub question_index: usize,
    pub question_id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub your_answer: Option<usize>,
    pub correct_answer: usize,
    pub is_correct: bool,
}

pub fn review(form: &Form, answers: &[usize]) -> Vec<AnswerReview> {
    form.questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let your_answer = answers.get(i).copied();
            AnswerReview {
                question_index: i,
                question_id: question.id.clone(),
                question_text: question.text.clone(),
                options: question.options.clone(),
                your_answer,
                correct_answer: question.correct_answer,
                is_correct: your_answer.is_some_and(|a| question.is_correct(a)),
            }
        })
        .collect()
}

/// How the class did on a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionStat {
    pub question_id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct: usize,
    pub total: usize,
    pub percentage: f64,
    /// How many responses picked each option.
    pub option_counts: Vec<usize>,
    pub correct_answer: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSummary {
    pub response_id: String,
    pub student_id: String,
    pub student_name: Option<String>,
    pub score: f64,
    pub status: ResponseStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Aggregate results of a form, as shown to its teacher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormReport {
    pub form_id: String,
    pub title: String,
    pub subject: String,
    pub question_count: usize,
    pub response_count: usize,
    pub average_score: f64,
    /// Empty until the form has at least one question and one response.
    pub question_stats: Vec<QuestionStat>,
    pub responses: Vec<ResponseSummary>,
}

impl FormReport {
    /// Build a report. `student_name` resolves student ids to usernames.
    pub fn build<F>(form: &Form, responses: &[FormResponse], student_name: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let question_stats = if form.questions.is_empty() || responses.is_empty() {
            Vec::new()
        } else {
            form.questions
                .iter()
                .enumerate()
                .map(|(index, question)| question_stat(index, question, responses))
                .collect()
        };

        let mut summaries: Vec<ResponseSummary> = responses
            .iter()
            .map(|r| ResponseSummary {
                response_id: r.id.clone(),
                student_id: r.student_id.clone(),
                student_name: student_name(&r.student_id),
                score: r.score,
                status: ResponseStatus::from_score(r.score),
                submitted_at: r.submitted_at,
            })
            .collect();
        summaries.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));

        Self {
            form_id: form.id.clone(),
            title: form.title.clone(),
            subject: form.subject.clone(),
            question_count: form.questions.len(),
            response_count: responses.len(),
            average_score: average_score(responses),
            question_stats,
            responses: summaries,
        }
    }

    pub fn grade(&self) -> Grade {
        Grade::from_percentage(self.average_score)
    }
}

fn question_stat(index: usize, question: &Question, responses: &[FormResponse]) -> QuestionStat {
    let mut option_counts = vec![0; question.options.len()];
    let mut correct = 0;

    for answer in responses.iter().filter_map(|r| r.answers.get(index)) {
        if let Some(count) = option_counts.get_mut(*answer) {
            *count += 1;
        }
        if question.is_correct(*answer) {
            correct += 1;
        }
    }

    QuestionStat {
        question_id: question.id.clone(),
        text: question.text.clone(),
        options: question.options.clone(),
        correct,
        total: responses.len(),
        percentage: percentage(correct, responses.len()),
        option_counts,
        correct_answer: question.correct_answer,
    }
}
