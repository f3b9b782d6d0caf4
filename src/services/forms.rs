//! Form authoring, answering and results.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AuthError, Error, Result, ValidationError};
use crate::models::{Form, FormResponse, MoveDirection, Question, QuestionDraft, Subject};
use crate::scoring::{self, AnswerReview, FormReport};
use crate::storage::{RecordedResponse, Storage};

/// Listing entry for a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormSummary {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub created_by: String,
    pub question_count: usize,
}

impl From<&Form> for FormSummary {
    fn from(form: &Form) -> Self {
        Self {
            id: form.id.clone(),
            title: form.title.clone(),
            subject: form.subject.clone(),
            created_by: form.created_by.clone(),
            question_count: form.questions.len(),
        }
    }
}

/// A teacher's form together with how it has been answered so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeacherFormEntry {
    #[serde(flatten)]
    pub form: FormSummary,
    pub response_count: usize,
    pub average_score: f64,
}

/// A form available to a student and whether they have done it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentFormEntry {
    #[serde(flatten)]
    pub form: FormSummary,
    pub submitted: bool,
    pub score: Option<f64>,
}

/// A stored response plus the per-question review shown after submitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub response: FormResponse,
    pub review: Vec<AnswerReview>,
}

pub struct FormService {
    storage: Arc<Storage>,
}

impl FormService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    pub fn subjects(&self) -> Vec<Subject> {
        Subject::catalog()
    }

    // Form CRUD

    /// Create an empty form owned by `teacher_id`.
    pub fn create_form(&self, teacher_id: &str, title: &str, subject: &str) -> Result<Form> {
        let form = Form::new(title, subject, teacher_id)?;
        self.storage.save_form(form.clone())?;
        info!(form = %form.id, teacher = teacher_id, "Created form");
        Ok(form)
    }

    /// Replace a form's title, subject and questions.
    ///
    /// Questions without an id get a fresh one; the author never changes.
    pub fn update_form(&self, teacher_id: &str, mut form: Form) -> Result<Form> {
        form.title = form.title.trim().to_string();
        for question in form.questions.iter_mut() {
            if question.id.trim().is_empty() {
                question.id = Question::new_id();
            }
            question.text = question.text.trim().to_string();
            for option in question.options.iter_mut() {
                *option = option.trim().to_string();
            }
        }

        let form_id = form.id.clone();
        let saved = self.modify_owned(teacher_id, &form_id, |stored| {
            form.created_by = stored.created_by.clone();
            form.validate()?;
            *stored = form;
            Ok(stored.clone())
        })?;

        info!(form = %saved.id, questions = saved.questions.len(), "Updated form");
        Ok(saved)
    }

    /// Delete a form and every response to it.
    pub fn remove_form(&self, teacher_id: &str, form_id: &str) -> Result<()> {
        self.owned_form(teacher_id, form_id)?;
        let dropped = self
            .storage
            .delete_form_with_responses(form_id)?
            .ok_or_else(|| Error::not_found("Form", form_id))?;
        info!(form = form_id, responses = dropped, "Removed form");
        Ok(())
    }

    pub fn get_form(&self, form_id: &str) -> Result<Form> {
        self.storage
            .form_by_id(form_id)?
            .ok_or_else(|| Error::not_found("Form", form_id))
    }

    pub fn teacher_forms(&self, teacher_id: &str) -> Result<Vec<Form>> {
        Ok(self.storage.forms_by_teacher(teacher_id)?)
    }

    pub fn subject_forms(&self, subject: &str) -> Result<Vec<Form>> {
        if !Subject::exists(subject) {
            return Err(Error::not_found("Subject", subject));
        }
        Ok(self.storage.forms_by_subject(subject)?)
    }

    pub fn all_forms(&self) -> Result<Vec<Form>> {
        Ok(self.storage.forms()?)
    }

    /// Upsert imported forms as-is. Returns how many were stored.
    pub fn import_forms(&self, forms: Vec<Form>) -> Result<usize> {
        let count = forms.len();
        for form in forms {
            form.validate()?;
            self.storage.save_form(form)?;
        }
        info!(count = count, "Imported forms");
        Ok(count)
    }

    // Questions

    pub fn add_question(
        &self,
        teacher_id: &str,
        form_id: &str,
        draft: QuestionDraft,
    ) -> Result<Form> {
        let question = Question::from_draft(draft)?;
        self.modify_owned(teacher_id, form_id, |form| {
            form.questions.push(question);
            Ok(form.clone())
        })
    }

    pub fn update_question(
        &self,
        teacher_id: &str,
        form_id: &str,
        question_id: &str,
        draft: QuestionDraft,
    ) -> Result<Form> {
        let question = draft.into_question(question_id.to_string())?;
        self.modify_owned(teacher_id, form_id, |form| {
            let index = form
                .question_index(question_id)
                .ok_or_else(|| Error::not_found("Question", question_id))?;
            form.questions[index] = question;
            Ok(form.clone())
        })
    }

    pub fn remove_question(
        &self,
        teacher_id: &str,
        form_id: &str,
        question_id: &str,
    ) -> Result<Form> {
        self.modify_owned(teacher_id, form_id, |form| {
            let index = form
                .question_index(question_id)
                .ok_or_else(|| Error::not_found("Question", question_id))?;
            form.questions.remove(index);
            Ok(form.clone())
        })
    }

    /// Move a question one slot. Moving past either end leaves the form as is.
    pub fn move_question(
        &self,
        teacher_id: &str,
        form_id: &str,
        index: usize,
        direction: MoveDirection,
    ) -> Result<Form> {
        self.modify_owned(teacher_id, form_id, |form| {
            form.move_question(index, direction);
            Ok(form.clone())
        })
    }

    // Responses

    /// Grade and store a student's answers. `None` marks an unanswered question.
    pub fn submit_response(
        &self,
        form_id: &str,
        student_id: &str,
        answers: &[Option<usize>],
    ) -> Result<Submission> {
        let outcome = self.storage.record_response(form_id, student_id, |form| {
            let answers = check_answers(form, answers)?;
            let score = scoring::score(&form.questions, &answers);
            Ok::<_, Error>(FormResponse::new(form_id, student_id, answers, score.percentage))
        })?;

        let (form, response) = match outcome {
            RecordedResponse::Stored { form, response } => (form, response),
            RecordedResponse::Duplicate => return Err(Error::AlreadySubmitted),
            RecordedResponse::FormMissing => return Err(Error::not_found("Form", form_id)),
        };

        info!(
            form = form_id,
            student = student_id,
            score = response.score,
            "Response submitted"
        );
        Ok(Submission {
            review: scoring::review(&form, &response.answers),
            response,
        })
    }

    pub fn form_results(&self, form_id: &str) -> Result<Vec<FormResponse>> {
        Ok(self.storage.responses_by_form(form_id)?)
    }

    pub fn student_results(&self, student_id: &str) -> Result<Vec<FormResponse>> {
        Ok(self.storage.responses_by_student(student_id)?)
    }

    pub fn has_submitted(&self, form_id: &str, student_id: &str) -> Result<bool> {
        Ok(self.student_response(form_id, student_id)?.is_some())
    }

    pub fn student_response(
        &self,
        form_id: &str,
        student_id: &str,
    ) -> Result<Option<FormResponse>> {
        Ok(self.storage.student_response_to_form(form_id, student_id)?)
    }

    /// Aggregate results of one of the teacher's forms.
    pub fn form_report(&self, teacher_id: &str, form_id: &str) -> Result<FormReport> {
        let form = self.owned_form(teacher_id, form_id)?;
        self.report(&form)
    }

    /// Aggregate results of any form, without an ownership check.
    pub fn report_for(&self, form_id: &str) -> Result<FormReport> {
        let form = self.get_form(form_id)?;
        self.report(&form)
    }

    fn report(&self, form: &Form) -> Result<FormReport> {
        let responses = self.storage.responses_by_form(&form.id)?;
        let names: HashMap<String, String> = self
            .storage
            .users()?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(FormReport::build(form, &responses, |id| names.get(id).cloned()))
    }

    // Dashboards

    pub fn teacher_dashboard(&self, teacher_id: &str) -> Result<Vec<TeacherFormEntry>> {
        let forms = self.storage.forms_by_teacher(teacher_id)?;
        let responses = self.storage.responses()?;

        Ok(forms
            .iter()
            .map(|form| {
                let answered: Vec<FormResponse> = responses
                    .iter()
                    .filter(|r| r.form_id == form.id)
                    .cloned()
                    .collect();
                TeacherFormEntry {
                    form: FormSummary::from(form),
                    response_count: answered.len(),
                    average_score: scoring::average_score(&answered),
                }
            })
            .collect())
    }

    pub fn student_dashboard(&self, student_id: &str) -> Result<Vec<StudentFormEntry>> {
        let student = self
            .storage
            .user_by_id(student_id)?
            .ok_or_else(|| Error::not_found("User", student_id))?;
        let scores: HashMap<String, f64> = self
            .storage
            .responses_by_student(student_id)?
            .into_iter()
            .map(|r| (r.form_id, r.score))
            .collect();

        Ok(self
            .storage
            .forms()?
            .iter()
            .filter(|form| student.follows(&form.subject))
            .map(|form| {
                let score = scores.get(&form.id).copied();
                StudentFormEntry {
                    form: FormSummary::from(form),
                    submitted: score.is_some(),
                    score,
                }
            })
            .collect())
    }

    fn owned_form(&self, teacher_id: &str, form_id: &str) -> Result<Form> {
        let form = self.get_form(form_id)?;
        if !form.is_owned_by(teacher_id) {
            return Err(AuthError::NotOwner.into());
        }
        Ok(form)
    }

    fn modify_owned<R>(
        &self,
        teacher_id: &str,
        form_id: &str,
        f: impl FnOnce(&mut Form) -> Result<R>,
    ) -> Result<R> {
        self.storage
            .modify_form(form_id, |form| {
                if !form.is_owned_by(teacher_id) {
                    return Err(AuthError::NotOwner.into());
                }
                f(form)
            })?
            .ok_or_else(|| Error::not_found("Form", form_id))
    }
}

/// Every question answered with one of its own options.
fn check_answers(form: &Form, answers: &[Option<usize>]) -> Result<Vec<usize>, ValidationError> {
    if form.questions.is_empty() {
        return Err(ValidationError::NoQuestions);
    }
    if answers.len() != form.questions.len() {
        return Err(ValidationError::AnswerCount {
            expected: form.questions.len(),
            got: answers.len(),
        });
    }

    form.questions
        .iter()
        .zip(answers)
        .enumerate()
        .map(|(i, (question, answer))| match answer {
            None => Err(ValidationError::Unanswered(i + 1)),
            Some(a) if *a >= question.options.len() => Err(ValidationError::InvalidAnswer {
                question: i + 1,
                answer: *a,
            }),
            Some(a) => Ok(*a),
        })
        .collect()
}
