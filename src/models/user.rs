use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::ValidationError;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Teacher => write!(f, "teacher"),
            Role::Student => write!(f, "student"),
        }
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub salt: String,
    pub role: Role,
    /// Subject ids the user follows. Empty means every subject.
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// The part of a user a session carries around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub username: String,
    pub role: Role,
}

impl User {
    pub fn new(username: &str, password: &str, role: Role, subjects: Vec<String>) -> Self {
        Self::with_id(
            format!("user_{}", Uuid::new_v4().simple()),
            username,
            password,
            role,
            subjects,
        )
    }

    pub fn with_id(
        id: String,
        username: &str,
        password: &str,
        role: Role,
        subjects: Vec<String>,
    ) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        Self {
            id,
            username: username.to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            role,
            subjects,
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        hash_password(&self.salt, password) == self.password_hash
    }

    pub fn follows(&self, subject: &str) -> bool {
        self.subjects.is_empty() || self.subjects.iter().any(|s| s == subject)
    }

    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
        }
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Checks a (trimmed) username against the account rules.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(ValidationError::UsernameLength {
            min: USERNAME_MIN_LENGTH,
            max: USERNAME_MAX_LENGTH,
        });
    }

    if username.chars().any(char::is_whitespace) {
        return Err(ValidationError::UsernameWhitespace);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_salted() {
        let a = User::new("alice", "secret", Role::Student, vec![]);
        let b = User::new("bob", "secret", Role::Student, vec![]);

        assert_ne!(a.password_hash, "secret");
        assert_ne!(a.password_hash, b.password_hash);
        assert!(a.verify_password("secret"));
        assert!(!a.verify_password("Secret"));
    }

    #[test]
    fn test_follows() {
        let all = User::new("alice", "pw", Role::Student, vec![]);
        assert!(all.follows("3"));

        let some = User::new("bob", "pw", Role::Student, vec!["1".into()]);
        assert!(some.follows("1"));
        assert!(!some.follows("2"));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("abc").is_ok());
        assert!(validate_username(&"a".repeat(32)).is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
        assert_eq!(
            validate_username("a b c"),
            Err(ValidationError::UsernameWhitespace)
        );
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        assert_eq!(Role::Student.to_string(), "student");
    }
}
