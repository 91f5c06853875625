use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "cat_lover")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
    /// Optional contact email.
    #[schema(example = "owner@example.com")]
    pub email: Option<String>,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::field(
            "username",
            "Username must be 1-32 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::field(
            "username",
            "Username must contain only letters, digits, and underscores",
        ));
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        return Err(AppError::field(
            "password",
            "Password must be 8-128 characters",
        ));
    }
    if let Some(email) = payload.email.as_deref().map(str::trim)
        && !email.is_empty()
        && !looks_like_email(email)
    {
        return Err(AppError::field("email", "Enter a valid email address."));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

/// Request body for token login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "cat_lover")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.username.trim().is_empty() {
        return Err(AppError::required("username"));
    }
    if payload.password.is_empty() {
        return Err(AppError::required("password"));
    }
    Ok(())
}

/// Request body for deleting the current account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeleteAccountRequest {
    #[schema(example = "s3cure_P@ss!")]
    pub current_password: String,
}

/// Issued authentication token.
#[derive(Serialize, utoipa::ToSchema)]
pub struct TokenResponse {
    /// Bearer token; send as `Authorization: Bearer <token>` or `Token <token>`.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub auth_token: String,
}

/// Public view of a user account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "cat_lover")]
    pub username: String,
    #[schema(example = "owner@example.com")]
    pub email: Option<String>,
}

impl From<crate::entity::user::Model> for UserResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}
