//! API credential access.
//!
//! Credentials are read at authentication time, not cached by the client, so
//! changes take effect on the next authentication.

/// API login credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
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

    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// Source of API credentials (settings storage, environment, fixtures).
pub trait CredentialStore: Send + Sync {
    /// The currently configured credentials, if any.
    fn get(&self) -> Option<Credentials>;
}

/// Fixed credentials (tests, one-off tooling).
#[derive(Debug, Clone)]
pub struct StaticCredentialStore {
    credentials: Credentials,
}

impl StaticCredentialStore {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

impl CredentialStore for StaticCredentialStore {
    fn get(&self) -> Option<Credentials> {
        Some(self.credentials.clone())
    }
}

/// Credentials read from the process environment on every call.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    email_var: String,
    password_var: String,
}

impl EnvCredentialStore {
    pub fn new(email_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            email_var: email_var.into(),
            password_var: password_var.into(),
        }
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new("CATSYNC_API_EMAIL", "CATSYNC_API_PASSWORD")
    }
}

impl CredentialStore for EnvCredentialStore {
    fn get(&self) -> Option<Credentials> {
        let email = std::env::var(&self.email_var).ok()?;
        let password = std::env::var(&self.password_var).ok()?;
        Some(Credentials::new(email, password))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_credentials_are_incomplete() {
        assert!(!Credentials::new("  ", "secret").is_complete());
        assert!(!Credentials::new("ops@example.com", "").is_complete());
        assert!(Credentials::new("ops@example.com", "secret").is_complete());
    }
}
