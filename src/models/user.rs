//! User model

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::{require_text, Validate, ValidationErrors};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email pattern")
});

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Database ID
    pub id: i64,
    /// Unique username
    pub username: String,
    /// Unique, lowercase email address
    pub email: String,
    /// Salted password hash (not serialized to JSON)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Serialize without password or timestamps (for auth responses)
    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public user info (no password)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// Registration payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    /// Trim the username and lowercase the email the way storage expects them
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_string();
        self.email = normalize_email(&self.email);
        self
    }
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        require_text(&mut errors, "username", &self.username);

        if self.email.trim().is_empty() {
            errors.add("email", "email is required");
        } else if !EMAIL_RE.is_match(&normalize_email(&self.email)) {
            errors.add("email", "email is not a valid address");
        }

        if self.password.is_empty() {
            errors.add("password", "password is required");
        } else if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add(
                "password",
                format!("password must be at least {} characters", MIN_PASSWORD_LENGTH),
            );
        }

        errors.into_result()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_normalized_lowercases_email() {
        let user = new_user("  freddie ", " Freddie@Queen.COM ", "bohemian").normalized();
        assert_eq!(user.username, "freddie");
        assert_eq!(user.email, "freddie@queen.com");
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_validation_reports_every_field() {
        let errors = new_user("", "not-an-email", "123").validate().unwrap_err();
        let fields: Vec<_> = errors.fields().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["username", "email", "password"]);
    }

    #[test]
    fn test_password_not_serialized() {
        let user = User {
            id: 1,
            username: "brian".to_string(),
            email: "brian@queen.com".to_string(),
            password: "secret-hash".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "brian");
    }
}
