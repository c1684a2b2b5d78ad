use std::fmt;

use serde::Serialize;

/// Body of `POST /api/auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    /// Email address; also the login name.
    pub email: String,
    /// Display name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

impl Registration {
    /// Create a new registration request.
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("email", &self.email)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Form body of `POST /api/auth/token`.
///
/// The server's OAuth2 password flow names the email field `username`.
#[derive(Serialize)]
pub(crate) struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_registration() {
        let registration = Registration::new("a@b.com", "kris", "pw");
        let json = serde_json::to_value(&registration).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@b.com", "username": "kris", "password": "pw"})
        );
    }

    #[test]
    fn debug_hides_password() {
        let registration = Registration::new("a@b.com", "kris", "hunter2");
        assert!(!format!("{:?}", registration).contains("hunter2"));
    }
}
