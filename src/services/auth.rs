//! Accounts and login sessions.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{AuthError, Result, ValidationError};
use crate::models::{validate_username, Identity, Role, Subject, User};
use crate::storage::Storage;

/// Sign-up details as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// A logged-in session. The token is what clients present afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: Identity,
}

/// How long a session stays valid after login unless configured otherwise.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct SessionEntry {
    identity: Identity,
    issued_at: Instant,
}

pub struct AuthService {
    storage: Arc<Storage>,
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl AuthService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self::with_ttl(storage, DEFAULT_SESSION_TTL)
    }

    /// Sessions expire `ttl` after they were opened.
    pub fn with_ttl(storage: Arc<Storage>, ttl: Duration) -> Self {
        Self {
            storage,
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Create an account and log it in.
    pub fn register(&self, registration: Registration) -> Result<Session> {
        let username = registration.username.trim();

        if username.is_empty()
            || registration.password.is_empty()
            || registration.confirm_password.is_empty()
        {
            return Err(ValidationError::MissingFields.into());
        }
        if registration.password != registration.confirm_password {
            return Err(ValidationError::PasswordMismatch.into());
        }
        validate_username(username)?;
        if let Some(unknown) = registration.subjects.iter().find(|s| !Subject::exists(s)) {
            return Err(ValidationError::UnknownSubject(unknown.clone()).into());
        }

        let user = User::new(
            username,
            &registration.password,
            registration.role,
            registration.subjects,
        );
        let identity = user.identity();

        if !self.storage.save_user(user)? {
            return Err(AuthError::UsernameTaken.into());
        }

        info!(user = %identity.username, role = %identity.role, "Registered new user");
        Ok(self.open_session(identity))
    }

    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ValidationError::MissingFields.into());
        }

        let user = self
            .storage
            .user_by_username(username)?
            .filter(|u| u.verify_password(password))
            .ok_or(AuthError::InvalidCredentials)?;

        info!(user = %user.username, "User logged in");
        Ok(self.open_session(user.identity()))
    }

    /// Returns false if the token was not a live session.
    pub fn logout(&self, token: &str) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token);

        if let Some(entry) = &removed {
            debug!(user = %entry.identity.username, "Session closed");
        }
        removed.is_some()
    }

    /// The user behind a live, unexpired session.
    pub fn current_user(&self, token: &str) -> Option<Identity> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .filter(|entry| entry.issued_at.elapsed() < self.ttl)
            .map(|entry| entry.identity.clone())
    }

    /// Guard an operation: the caller must be logged in and, when `role` is
    /// given, hold that role.
    pub fn require(&self, token: Option<&str>, role: Option<Role>) -> Result<Identity> {
        let identity = token
            .and_then(|t| self.current_user(t))
            .ok_or(AuthError::NotAuthenticated)?;

        match role {
            Some(required) if identity.role != required => {
                Err(AuthError::WrongRole(required).into())
            }
            _ => Ok(identity),
        }
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let before = sessions.len();
        sessions.retain(|_, entry| entry.issued_at.elapsed() < self.ttl);
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept = swept, "Expired sessions removed");
        }
        swept
    }

    fn open_session(&self, identity: Identity) -> Session {
        self.sweep_expired();

        let token = Uuid::new_v4().simple().to_string();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                token.clone(),
                SessionEntry {
                    identity: identity.clone(),
                    issued_at: Instant::now(),
                },
            );
        Session {
            token,
            user: identity,
        }
    }
}
