//! Access gate
//!
//! Checks a submitted email/password pair against the configured secret pair
//! and hands out opaque session tokens. The generator only runs for callers
//! presenting a token issued here.
//!
//! - Credential comparison uses `subtle::ConstantTimeEq`.
//! - Tokens are UUID v4 in simple (hyphenless) form.
//! - Failed attempts leave no state behind.

mod error;

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::RwLock;

use subtle::ConstantTimeEq;
use uuid::Uuid;

pub use error::{GateError, Result};

/// The single accepted email/password pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Opaque session token returned by [`AccessGate::login`]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AccessToken(String);

impl AccessToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Most sessions kept at once; logging in beyond this ends the oldest one
pub const MAX_SESSIONS: usize = 256;

/// Live tokens, with issue order for eviction
#[derive(Default)]
struct Sessions {
    live: HashSet<String>,
    order: VecDeque<String>,
}

impl Sessions {
    fn insert(&mut self, token: String) {
        while self.order.len() >= MAX_SESSIONS {
            if let Some(oldest) = self.order.pop_front() {
                self.live.remove(&oldest);
                tracing::debug!("Evicted oldest session");
            }
        }
        self.live.insert(token.clone());
        self.order.push_back(token);
    }

    fn remove(&mut self, token: &str) -> bool {
        if !self.live.remove(token) {
            return false;
        }
        self.order.retain(|t| t != token);
        true
    }
}

impl fmt::Debug for Sessions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sessions").field("live", &self.live.len()).finish()
    }
}

/// Credential check plus the set of live session tokens.
///
/// Tokens do not expire. They end on logout, on restart, or when
/// [`MAX_SESSIONS`] newer logins push them out.
#[derive(Debug)]
pub struct AccessGate {
    credentials: Credentials,
    tokens: RwLock<Sessions>,
}

impl AccessGate {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            tokens: RwLock::new(Sessions::default()),
        }
    }

    /// Whether `email` and `password` both match the configured pair.
    ///
    /// Depends only on the inputs and the configured secrets.
    pub fn authenticate(&self, email: &str, password: &str) -> bool {
        let email_ok = email.as_bytes().ct_eq(self.credentials.email.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.credentials.password.as_bytes());
        (email_ok & password_ok).into()
    }

    /// Check credentials and issue a new session token
    pub fn login(&self, email: &str, password: &str) -> Result<AccessToken> {
        if !self.authenticate(email, password) {
            tracing::warn!("Rejected login attempt");
            return Err(GateError::InvalidCredentials);
        }

        let token = AccessToken::generate();
        self.tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(token.as_str().to_string());
        tracing::info!("Login successful");
        Ok(token)
    }

    /// Check a presented token; `None` means the caller sent none
    pub fn validate(&self, token: Option<&str>) -> Result<()> {
        let token = token.filter(|t| !t.is_empty()).ok_or(GateError::MissingToken)?;
        let known = self
            .tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .live
            .contains(token);
        if known {
            Ok(())
        } else {
            tracing::debug!("Rejected unknown session token");
            Err(GateError::InvalidToken)
        }
    }

    /// End a session. Unknown tokens are ignored.
    pub fn revoke(&self, token: &str) {
        let removed = self
            .tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(token);
        if removed {
            tracing::info!("Session ended");
        }
    }

    /// Number of live sessions
    pub fn active_sessions(&self) -> usize {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .live
            .len()
    }
}
