//! Minimum length rules for new credentials.

use kmem_core::config::AuthConfig;
use kmem_core::error::AppError;

/// Checks usernames and passwords at signup.
#[derive(Debug, Clone)]
pub struct CredentialPolicy {
    username_min_length: usize,
    password_min_length: usize,
}

impl CredentialPolicy {
    /// Creates a new policy from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            username_min_length: config.username_min_length,
            password_min_length: config.password_min_length,
        }
    }

    /// Returns the first rule the pair violates.
    pub fn check(&self, username: &str, password: &str) -> Result<(), AppError> {
        // Usernames name directories under the upload root.
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.');
        if !username.chars().all(allowed) || username.starts_with('.') {
            return Err(AppError::validation(
                "Username may only contain letters, digits, '_', '-' and '.', and must not start with '.'",
            ));
        }

        if username.chars().count() < self.username_min_length {
            return Err(AppError::validation(format!(
                "Username must be at least {} characters long",
                self.username_min_length
            )));
        }

        if password.chars().count() < self.password_min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.password_min_length
            )));
        }

        Ok(())
    }
}
