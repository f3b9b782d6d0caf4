use crate::models::{Form, Question, Role, User};

/// Accounts present on a fresh install.
pub fn sample_users() -> Vec<User> {
    let all_subjects = vec!["1".to_string(), "2".to_string(), "3".to_string()];
    vec![
        User::with_id(
            "teacher1".into(),
            "teacher",
            "teacher123",
            Role::Teacher,
            all_subjects.clone(),
        ),
        User::with_id(
            "student1".into(),
            "student",
            "student123",
            Role::Student,
            all_subjects,
        ),
    ]
}

/// One starter form per catalog subject, owned by the sample teacher.
pub fn sample_forms() -> Vec<Form> {
    vec![
        form(
            "1",
            "Programming Fundamentals",
            "1",
            vec![
                question(
                    "1",
                    "What is a variable?",
                    &[
                        "A container for storing data",
                        "A mathematical function",
                        "A kind of loop",
                        "A logical operator",
                    ],
                    0,
                ),
                question(
                    "2",
                    "Which control structure repeats a block of code?",
                    &["if-else", "switch", "for", "try-catch"],
                    2,
                ),
                question(
                    "3",
                    "What does OOP stand for?",
                    &[
                        "Object-Oriented Programming",
                        "Online Optimized Program",
                        "Organized Operating Process",
                        "Operation-Oriented Programming",
                    ],
                    0,
                ),
            ],
        ),
        form(
            "2",
            "Principles of Visual Composition",
            "2",
            vec![
                question(
                    "1",
                    "What is the rule of thirds?",
                    &[
                        "Splitting a design into three equal parts",
                        "A drawing technique using three colours",
                        "Dividing the frame into nine equal parts with two horizontal and two vertical lines",
                        "Using at most three elements in a composition",
                    ],
                    2,
                ),
                question(
                    "2",
                    "What is contrast in design?",
                    &[
                        "The difference between elements in a composition",
                        "A specific kind of light",
                        "Using only black and white",
                        "A Photoshop tool",
                    ],
                    0,
                ),
            ],
        ),
        form(
            "3",
            "Basic Modeling Techniques",
            "3",
            vec![
                question(
                    "1",
                    "What is polygonal modeling?",
                    &[
                        "A hand drawing technique",
                        "A kind of rendering",
                        "Building objects from vertices, edges and faces",
                        "A 3D file format",
                    ],
                    2,
                ),
                question(
                    "2",
                    "What is a vertex in 3D modeling?",
                    &[
                        "A point in 3D space",
                        "A line joining two points",
                        "A flat surface",
                        "A kind of light",
                    ],
                    0,
                ),
            ],
        ),
    ]
}

fn form(id: &str, title: &str, subject: &str, questions: Vec<Question>) -> Form {
    Form {
        id: id.to_string(),
        title: title.to_string(),
        subject: subject.to_string(),
        created_by: "teacher1".to_string(),
        questions,
    }
}

fn question(id: &str, text: &str, options: &[&str], correct_answer: usize) -> Question {
    Question {
        id: id.to_string(),
        text: text.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct_answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_forms_are_valid() {
        for form in sample_forms() {
            assert!(form.validate().is_ok(), "{} should be valid", form.title);
        }
    }

    #[test]
    fn test_sample_users_can_log_in() {
        let users = sample_users();
        assert!(users[0].verify_password("teacher123"));
        assert_eq!(users[1].role, Role::Student);
    }
}
