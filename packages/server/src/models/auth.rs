use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{user, user_email};
use crate::error::AppError;

pub const PERM_HACKATHON_CREATE: &str = "hackathon:create";
pub const PERM_HACKATHON_MANAGE: &str = "hackathon:manage";
pub const PERM_TEMPLATE_MANAGE: &str = "template:manage";

/// Permissions granted to a role. Unknown roles get none.
pub fn permissions_for_role(role: &str) -> Vec<String> {
    let perms: &[&str] = match role {
        user::ROLE_ADMIN => &[
            PERM_HACKATHON_CREATE,
            PERM_HACKATHON_MANAGE,
            PERM_TEMPLATE_MANAGE,
        ],
        _ => &[],
    };
    perms.iter().map(|p| p.to_string()).collect()
}

/// Request body for account sign-up.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Unique account name (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice_wonder")]
    pub name: String,
    /// Primary email address. Registrations made with it count as online.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_account_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 32 {
        return Err(AppError::Validation("Name must be 1-32 characters".into()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AppError::Validation(
            "Name must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub name: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Request body for attaching another email to the signed-in account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddEmailRequest {
    #[schema(example = "alice@work.example.com")]
    pub email: String,
}

/// Successful sign-up response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub name: String,
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice_wonder")]
    pub name: String,
    #[schema(example = "user")]
    pub role: String,
    #[schema(example = json!(["hackathon:create"]))]
    pub permissions: Vec<String>,
}

/// Current signed-in user's profile.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MeResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice_wonder")]
    pub name: String,
    #[schema(example = "user")]
    pub role: String,
    pub permissions: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserEmailResponse {
    pub id: i32,
    pub email: String,
    pub primary_email: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_email::Model> for UserEmailResponse {
    fn from(m: user_email::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            primary_email: m.primary_email,
            created_at: m.created_at,
        }
    }
}
