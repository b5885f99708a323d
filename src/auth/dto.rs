use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::auth::repo_types::User;
use crate::validation::{blank_as_none, field_error, EMAIL_RE};

/// Request body for user registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The email field is required."),
        length(max = 255, message = "The email field must not be greater than 255 characters."),
        regex(path = *EMAIL_RE, message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password field must be at least 8 characters.")
    )]
    pub password: Option<String>,

    /// Checked in `check`, since a missing confirmation must fail too.
    #[serde(default)]
    pub password_confirmation: Option<String>,
}

impl RegisterRequest {
    /// Field rules plus the confirmation rule, all reported together.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if self.password.is_some()
            && self.password_confirmation.as_deref() != self.password.as_deref()
        {
            errors.add(
                "password_confirmation",
                field_error(
                    "confirmed",
                    "The password field confirmation does not match.".into(),
                ),
            );
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Request body for login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "The email field is required."),
        regex(path = *EMAIL_RE, message = "The email field must be a valid email address.")
    )]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(required(message = "The password field is required."))]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}
