//! Request dispatch.
//!
//! Turns one [`ClientMessage`] into one [`ServerMessage`], applying the role
//! guard each operation needs.

use tracing::{debug, error};

use crate::error::{AuthError, Result};
use crate::models::{Identity, Role};
use crate::protocol::{ClientMessage, ErrorCode, PublicForm, ServerMessage};
use crate::scoring;
use crate::services::{FormSummary, Registration, Session, Submission};

use super::state::{Connection, ServerState};

/// Handle a request, mapping failures to an `Error` reply.
pub fn handle_message(
    state: &ServerState,
    conn: &mut Connection,
    msg: ClientMessage,
) -> ServerMessage {
    match dispatch(state, conn, msg) {
        Ok(reply) => reply,
        Err(e) if e.is_internal() => {
            error!(connection = %conn.id, "Request failed: {}", e);
            ServerMessage::error(ErrorCode::Internal, "Internal server error")
        }
        Err(e) => {
            debug!(connection = %conn.id, "Request rejected: {}", e);
            ServerMessage::error(e.code(), e.to_string())
        }
    }
}

fn dispatch(
    state: &ServerState,
    conn: &mut Connection,
    msg: ClientMessage,
) -> Result<ServerMessage> {
    match msg {
        ClientMessage::Register {
            username,
            password,
            confirm_password,
            role,
            subjects,
        } => {
            let session = state.auth.register(Registration {
                username,
                password,
                confirm_password,
                role,
                subjects,
            })?;
            Ok(attach(conn, state, session))
        }
        ClientMessage::Login { username, password } => {
            let session = state.auth.login(&username, &password)?;
            Ok(attach(conn, state, session))
        }
        ClientMessage::Resume { token } => {
            let user = state
                .auth
                .current_user(&token)
                .ok_or(AuthError::NotAuthenticated)?;
            Ok(attach(conn, state, Session { token, user }))
        }
        ClientMessage::Logout => {
            if let Some(token) = conn.token.take() {
                state.auth.logout(&token);
            }
            Ok(ServerMessage::LoggedOut)
        }
        ClientMessage::ListSubjects => {
            require(state, conn, None)?;
            Ok(ServerMessage::Subjects {
                subjects: state.forms.subjects(),
            })
        }
        ClientMessage::ListForms { subject } => {
            require(state, conn, None)?;
            let forms = match subject {
                Some(subject) => state.forms.subject_forms(&subject)?,
                None => state.forms.all_forms()?,
            };
            Ok(ServerMessage::Forms {
                forms: forms.iter().map(FormSummary::from).collect(),
            })
        }
        ClientMessage::GetForm { form_id } => {
            let user = require(state, conn, None)?;
            get_form(state, &user, &form_id)
        }
        ClientMessage::CreateForm { title, subject } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state.forms.create_form(&user.id, &title, &subject)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::UpdateForm { form } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state.forms.update_form(&user.id, form)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::DeleteForm { form_id } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            state.forms.remove_form(&user.id, &form_id)?;
            Ok(ServerMessage::FormDeleted { form_id })
        }
        ClientMessage::AddQuestion { form_id, question } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state.forms.add_question(&user.id, &form_id, question)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::UpdateQuestion {
            form_id,
            question_id,
            question,
        } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state
                .forms
                .update_question(&user.id, &form_id, &question_id, question)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::RemoveQuestion {
            form_id,
            question_id,
        } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state
                .forms
                .remove_question(&user.id, &form_id, &question_id)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::MoveQuestion {
            form_id,
            index,
            direction,
        } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            let form = state
                .forms
                .move_question(&user.id, &form_id, index, direction)?;
            Ok(ServerMessage::FormSaved { form })
        }
        ClientMessage::SubmitResponse { form_id, answers } => {
            let user = require(state, conn, Some(Role::Student))?;
            let submission = state.forms.submit_response(&form_id, &user.id, &answers)?;
            Ok(ServerMessage::Submitted { submission })
        }
        ClientMessage::MyResults => {
            let user = require(state, conn, Some(Role::Student))?;
            Ok(ServerMessage::StudentResults {
                responses: state.forms.student_results(&user.id)?,
            })
        }
        ClientMessage::FormResults { form_id } => {
            let user = require(state, conn, Some(Role::Teacher))?;
            Ok(ServerMessage::Report {
                report: state.forms.form_report(&user.id, &form_id)?,
            })
        }
        ClientMessage::TeacherDashboard => {
            let user = require(state, conn, Some(Role::Teacher))?;
            Ok(ServerMessage::TeacherDashboard {
                forms: state.forms.teacher_dashboard(&user.id)?,
            })
        }
        ClientMessage::StudentDashboard => {
            let user = require(state, conn, Some(Role::Student))?;
            Ok(ServerMessage::StudentDashboard {
                forms: state.forms.student_dashboard(&user.id)?,
            })
        }
    }
}

fn require(state: &ServerState, conn: &Connection, role: Option<Role>) -> Result<Identity> {
    state.auth.require(conn.token.as_deref(), role)
}

/// Bind a session to the connection, dropping any session it held before.
fn attach(conn: &mut Connection, state: &ServerState, session: Session) -> ServerMessage {
    if let Some(previous) = conn.token.replace(session.token.clone()) {
        if previous != session.token {
            state.auth.logout(&previous);
        }
    }
    debug!(connection = %conn.id, user = %session.user.username, "Session attached");
    ServerMessage::Authenticated {
        token: session.token,
        user: session.user,
    }
}

/// Teachers see the whole form; students see it without answers until they
/// have submitted, and with their review afterwards.
fn get_form(state: &ServerState, user: &Identity, form_id: &str) -> Result<ServerMessage> {
    let form = state.forms.get_form(form_id)?;

    match user.role {
        Role::Teacher => Ok(ServerMessage::FormDetail { form }),
        Role::Student => {
            let submission = state
                .forms
                .student_response(form_id, &user.id)?
                .map(|response| Submission {
                    review: scoring::review(&form, &response.answers),
                    response,
                });
            Ok(ServerMessage::StudentForm {
                form: PublicForm::from(&form),
                submission,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use super::*;
    use crate::models::{MoveDirection, QuestionDraft};
    use crate::server::state::SharedState;
    use crate::storage::Storage;

    fn setup() -> (SharedState, Connection) {
        let storage = Storage::in_memory();
        storage.initialize().unwrap();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000);
        (ServerState::shared(storage), Connection::new(addr))
    }

    fn login(state: &ServerState, conn: &mut Connection, username: &str, password: &str) {
        let reply = handle_message(
            state,
            conn,
            ClientMessage::Login {
                username: username.into(),
                password: password.into(),
            },
        );
        assert!(matches!(reply, ServerMessage::Authenticated { .. }), "{:?}", reply);
    }

    fn error_code(reply: &ServerMessage) -> Option<ErrorCode> {
        match reply {
            ServerMessage::Error { code, .. } => Some(*code),
            _ => None,
        }
    }

    #[test]
    fn test_requires_login() {
        let (state, mut conn) = setup();
        let reply = handle_message(&state, &mut conn, ClientMessage::ListSubjects);
        assert_eq!(error_code(&reply), Some(ErrorCode::NotAuthenticated));

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::Login {
                username: "teacher".into(),
                password: "nope".into(),
            },
        );
        assert_eq!(error_code(&reply), Some(ErrorCode::NotAuthenticated));
        assert!(conn.token.is_none());
    }

    #[test]
    fn test_role_guards() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "student", "student123");

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::CreateForm {
                title: "Sneaky".into(),
                subject: "1".into(),
            },
        );
        assert_eq!(error_code(&reply), Some(ErrorCode::Forbidden));

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::FormResults {
                form_id: "1".into(),
            },
        );
        assert_eq!(error_code(&reply), Some(ErrorCode::Forbidden));

        let reply = handle_message(&state, &mut conn, ClientMessage::StudentDashboard);
        assert!(matches!(reply, ServerMessage::StudentDashboard { ref forms } if forms.len() == 3));
    }

    #[test]
    fn test_teacher_authoring_flow() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "teacher", "teacher123");

        let form = match handle_message(
            &state,
            &mut conn,
            ClientMessage::CreateForm {
                title: "Pop quiz".into(),
                subject: "3".into(),
            },
        ) {
            ServerMessage::FormSaved { form } => form,
            other => panic!("unexpected reply: {:?}", other),
        };

        for text in ["First?", "Second?"] {
            let reply = handle_message(
                &state,
                &mut conn,
                ClientMessage::AddQuestion {
                    form_id: form.id.clone(),
                    question: QuestionDraft {
                        text: text.into(),
                        options: vec!["a".into(), "b".into()],
                        correct_answer: 0,
                    },
                },
            );
            assert!(matches!(reply, ServerMessage::FormSaved { .. }));
        }

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::MoveQuestion {
                form_id: form.id.clone(),
                index: 0,
                direction: MoveDirection::Down,
            },
        );
        match reply {
            ServerMessage::FormSaved { form } => assert_eq!(form.questions[0].text, "Second?"),
            other => panic!("unexpected reply: {:?}", other),
        }

        let reply = handle_message(&state, &mut conn, ClientMessage::TeacherDashboard);
        assert!(matches!(reply, ServerMessage::TeacherDashboard { ref forms } if forms.len() == 4));

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::DeleteForm {
                form_id: form.id.clone(),
            },
        );
        assert!(matches!(reply, ServerMessage::FormDeleted { .. }));
    }

    #[test]
    fn test_student_sees_form_without_answers_until_submitted() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "student", "student123");

        let get = || ClientMessage::GetForm {
            form_id: "2".into(),
        };
        match handle_message(&state, &mut conn, get()) {
            ServerMessage::StudentForm { form, submission } => {
                assert_eq!(form.questions.len(), 2);
                assert!(submission.is_none());
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::SubmitResponse {
                form_id: "2".into(),
                answers: vec![Some(2), Some(1)],
            },
        );
        match reply {
            ServerMessage::Submitted { submission } => {
                assert_eq!(submission.response.score, 50.0)
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        match handle_message(&state, &mut conn, get()) {
            ServerMessage::StudentForm { submission, .. } => {
                let submission = submission.unwrap();
                assert!(submission.review[0].is_correct);
                assert!(!submission.review[1].is_correct);
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        let again = handle_message(
            &state,
            &mut conn,
            ClientMessage::SubmitResponse {
                form_id: "2".into(),
                answers: vec![Some(2), Some(0)],
            },
        );
        assert_eq!(error_code(&again), Some(ErrorCode::Conflict));
    }

    #[test]
    fn test_resume_and_logout() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "teacher", "teacher123");
        let token = conn.token.clone().unwrap();

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40001);
        let mut second = Connection::new(addr);
        let reply = handle_message(
            &state,
            &mut second,
            ClientMessage::Resume {
                token: token.clone(),
            },
        );
        assert!(matches!(reply, ServerMessage::Authenticated { .. }));
        assert_eq!(second.identity(&state).map(|u| u.role), Some(Role::Teacher));

        let reply = handle_message(&state, &mut second, ClientMessage::Logout);
        assert!(matches!(reply, ServerMessage::LoggedOut));
        assert!(conn.identity(&state).is_none());

        let reply = handle_message(&state, &mut second, ClientMessage::Resume { token });
        assert_eq!(error_code(&reply), Some(ErrorCode::NotAuthenticated));
    }

    fn saved_form(reply: ServerMessage) -> crate::models::Form {
        match reply {
            ServerMessage::FormSaved { form } => form,
            other => panic!("unexpected reply: {:?}", other),
        }
    }

    #[test]
    fn test_teacher_edits_questions() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "teacher", "teacher123");

        let mut form = state.forms.get_form("1").unwrap();
        form.title = "Programming Basics".into();
        let form = saved_form(handle_message(
            &state,
            &mut conn,
            ClientMessage::UpdateForm { form },
        ));
        assert_eq!(form.title, "Programming Basics");

        let form = saved_form(handle_message(
            &state,
            &mut conn,
            ClientMessage::UpdateQuestion {
                form_id: "1".into(),
                question_id: "2".into(),
                question: QuestionDraft {
                    text: "Which keyword starts a loop?".into(),
                    options: vec!["for".into(), "let".into()],
                    correct_answer: 0,
                },
            },
        ));
        assert_eq!(form.questions[1].text, "Which keyword starts a loop?");
        assert_eq!(form.questions[1].options.len(), 2);

        let form = saved_form(handle_message(
            &state,
            &mut conn,
            ClientMessage::RemoveQuestion {
                form_id: "1".into(),
                question_id: "3".into(),
            },
        ));
        assert_eq!(form.questions.len(), 2);

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::RemoveQuestion {
                form_id: "1".into(),
                question_id: "3".into(),
            },
        );
        assert_eq!(error_code(&reply), Some(ErrorCode::NotFound));

        let mut empty = state.forms.get_form("2").unwrap();
        empty.questions.clear();
        let reply = handle_message(&state, &mut conn, ClientMessage::UpdateForm { form: empty });
        assert_eq!(error_code(&reply), Some(ErrorCode::Validation));
    }

    #[test]
    fn test_students_cannot_edit() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "student", "student123");
        let draft = QuestionDraft {
            text: "Changed?".into(),
            options: vec!["yes".into(), "no".into()],
            correct_answer: 0,
        };

        let requests = vec![
            ClientMessage::UpdateForm {
                form: state.forms.get_form("1").unwrap(),
            },
            ClientMessage::AddQuestion {
                form_id: "1".into(),
                question: draft.clone(),
            },
            ClientMessage::UpdateQuestion {
                form_id: "1".into(),
                question_id: "1".into(),
                question: draft,
            },
            ClientMessage::RemoveQuestion {
                form_id: "1".into(),
                question_id: "1".into(),
            },
            ClientMessage::MoveQuestion {
                form_id: "1".into(),
                index: 0,
                direction: MoveDirection::Down,
            },
            ClientMessage::DeleteForm {
                form_id: "1".into(),
            },
            ClientMessage::TeacherDashboard,
        ];
        for request in requests {
            let reply = handle_message(&state, &mut conn, request);
            assert_eq!(error_code(&reply), Some(ErrorCode::Forbidden));
        }
        assert_eq!(state.forms.get_form("1").unwrap().questions.len(), 3);
    }

    #[test]
    fn test_list_forms_by_subject() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "student", "student123");

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::ListForms {
                subject: Some("2".into()),
            },
        );
        match reply {
            ServerMessage::Forms { forms } => {
                assert_eq!(forms.len(), 1);
                assert_eq!(forms[0].id, "2");
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        let reply = handle_message(&state, &mut conn, ClientMessage::ListForms { subject: None });
        assert!(matches!(reply, ServerMessage::Forms { ref forms } if forms.len() == 3));

        let reply = handle_message(
            &state,
            &mut conn,
            ClientMessage::ListForms {
                subject: Some("42".into()),
            },
        );
        assert_eq!(error_code(&reply), Some(ErrorCode::NotFound));
    }

    #[test]
    fn test_my_results() {
        let (state, mut conn) = setup();
        login(&state, &mut conn, "student", "student123");

        let reply = handle_message(&state, &mut conn, ClientMessage::MyResults);
        assert!(matches!(
            reply,
            ServerMessage::StudentResults { ref responses } if responses.is_empty()
        ));

        handle_message(
            &state,
            &mut conn,
            ClientMessage::SubmitResponse {
                form_id: "3".into(),
                answers: vec![Some(2), Some(0)],
            },
        );
        match handle_message(&state, &mut conn, ClientMessage::MyResults) {
            ServerMessage::StudentResults { responses } => {
                assert_eq!(responses.len(), 1);
                assert_eq!(responses[0].form_id, "3");
                assert_eq!(responses[0].score, 100.0);
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40002);
        let mut teacher = Connection::new(addr);
        login(&state, &mut teacher, "teacher", "teacher123");
        let reply = handle_message(&state, &mut teacher, ClientMessage::MyResults);
        assert_eq!(error_code(&reply), Some(ErrorCode::Forbidden));
    }
}
