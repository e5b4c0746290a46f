use std::fmt;

use super::AppError;

/// The single username/password pair accepted by `login`.
///
/// This is a literal comparison; there are no sessions or tokens.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Succeeds only for an exact match of both fields.
    pub fn verify(&self, username: &str, password: &str) -> Result<(), AppError> {
        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(AppError::InvalidCredentials)
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new("admin", "1234")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
