//! Self-registration form

use crate::navigation::Route;
use keyconsole_client::KeyConsoleClient;
use keyconsole_core::RegisterRequest;
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{info, warn};
use validator::{Validate, ValidationError};

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());

/// Fields in the order they appear on the form
const FIELD_ORDER: [&str; 4] = ["email", "password", "confirm_password", "invite_code"];

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(error("required", "Email is required"));
    }
    match EMAIL_RE.as_ref() {
        Some(re) if re.is_match(email.trim()) => Ok(()),
        _ => Err(error("email", "Invalid email address")),
    }
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    match password.chars().count() {
        0 => Err(error("required", "Password is required")),
        8..=40 => Ok(()),
        _ => Err(error("length", "Password must be 8 to 40 characters")),
    }
}

fn validate_invite_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        Err(error("required", "Invite code is required"))
    } else {
        Ok(())
    }
}

/// Sign-up form contents
#[derive(Clone, Default, Validate)]
pub struct RegisterForm {
    /// Account email
    #[validate(custom(function = "validate_email"))]
    pub email: String,
    /// Password
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    /// Password, repeated
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
    /// Invite code handed out by an administrator
    #[validate(custom(function = "validate_invite_code"))]
    pub invite_code: String,
}

impl std::fmt::Debug for RegisterForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterForm")
            .field("email", &self.email)
            .field("invite_code", &self.invite_code)
            .finish_non_exhaustive()
    }
}

/// A failed field check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Form field name
    pub field: &'static str,
    /// Message shown under the field
    pub message: String,
}

impl RegisterForm {
    /// Every failing field, in form order
    pub fn errors(&self) -> Vec<FieldError> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };
        let by_field = errors.field_errors();

        FIELD_ORDER
            .iter()
            .filter_map(|&field| {
                let first = by_field.get(field)?.first()?;
                let message = first
                    .message
                    .as_ref()
                    .map_or_else(|| first.code.to_string(), ToString::to_string);
                Some(FieldError { field, message })
            })
            .collect()
    }

    /// Request body for the server
    pub fn to_request(&self) -> RegisterRequest {
        RegisterRequest {
            email: self.email.trim().to_string(),
            password: self.password.clone(),
            invite_code: self.invite_code.trim().to_string(),
        }
    }
}

/// Result of submitting the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// Nothing was sent; these fields need fixing
    Invalid(Vec<FieldError>),
    /// The server refused; message to show above the form
    Failed(String),
    /// Account created; go here next
    Registered(Route),
}

/// Submit `form`, validating it first
pub async fn submit(client: &KeyConsoleClient, form: &RegisterForm) -> RegisterOutcome {
    let errors = form.errors();
    if !errors.is_empty() {
        return RegisterOutcome::Invalid(errors);
    }

    match client.register(&form.to_request()).await {
        Ok(_) => {
            info!(email = %form.email, "registration succeeded");
            RegisterOutcome::Registered(Route::Login)
        }
        Err(err) => {
            warn!(email = %form.email, error = %err, "registration failed");
            RegisterOutcome::Failed(err.to_string())
        }
    }
}
