use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::{hackathon, register};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateHackathonRequest {
    /// URL-safe unique name (1-64 chars, letters, digits, '_' and '-').
    #[schema(example = "spring-2026")]
    pub name: String,
    #[schema(example = "Spring Hackathon 2026")]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
}

pub fn validate_create_hackathon(req: &CreateHackathonRequest) -> Result<(), AppError> {
    validate_hackathon_name(&req.name)?;
    validate_display_name(&req.display_name)?;
    validate_description(&req.description)
}

pub fn validate_hackathon_name(name: &str) -> Result<(), AppError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        return Err(AppError::Validation(
            "Hackathon name must be 1-64 characters".into(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Hackathon name must contain only letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

fn validate_display_name(display_name: &str) -> Result<(), AppError> {
    let display_name = display_name.trim();
    if display_name.is_empty() || display_name.chars().count() > 256 {
        return Err(AppError::Validation(
            "Display name must be 1-256 characters".into(),
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), AppError> {
    if description.len() > 1_000_000 {
        return Err(AppError::Validation(
            "Description must be at most 1MB".into(),
        ));
    }
    Ok(())
}

/// Partial update. Omitted fields keep their stored value; the name is fixed
/// at creation.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateHackathonRequest {
    #[schema(example = "Spring Hackathon 2026 (extended)")]
    pub display_name: Option<String>,
    pub description: Option<String>,
}

pub fn validate_update_hackathon(req: &UpdateHackathonRequest) -> Result<(), AppError> {
    if let Some(ref display_name) = req.display_name {
        validate_display_name(display_name)?;
    }
    if let Some(ref description) = req.description {
        validate_description(description)?;
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct NameAvailabilityRequest {
    #[schema(example = "spring-2026")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum NameUnavailableReason {
    Invalid,
    AlreadyExists,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct NameAvailabilityResponse {
    pub name: String,
    pub name_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<NameUnavailableReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NameAvailabilityResponse {
    pub fn available(name: String) -> Self {
        Self {
            name,
            name_available: true,
            reason: None,
            message: None,
        }
    }

    pub fn unavailable(name: String, reason: NameUnavailableReason, message: String) -> Self {
        Self {
            name,
            name_available: false,
            reason: Some(reason),
            message: Some(message),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonResponse {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<hackathon::Model> for HackathonResponse {
    fn from(m: hackathon::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            display_name: m.display_name,
            description: m.description,
            creator_id: m.creator_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct HackathonListItem {
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HackathonListResponse {
    pub data: Vec<HackathonListItem>,
    pub pagination: Pagination,
}

/// Attendance numbers for one hackathon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct HackathonStat {
    /// Enabled registrations, one per row.
    #[schema(example = 3)]
    pub total: u64,
    /// Hackathon id the numbers belong to.
    #[schema(example = 1)]
    pub hid: i32,
    /// Registrations whose email resolves to an existing account.
    #[schema(example = 1)]
    pub online: u64,
    /// `total - online`.
    #[schema(example = 2)]
    pub offline: u64,
}

impl HackathonStat {
    pub fn empty(hid: i32) -> Self {
        Self {
            total: 0,
            hid,
            online: 0,
            offline: 0,
        }
    }

    /// Derive `offline` from the two counted quantities.
    ///
    /// `online <= total` holds while `user_email.email` is unique. Should the
    /// store ever violate that, `online` is capped at `total` so the pair still
    /// sums to `total`.
    pub fn from_counts(hid: i32, total: u64, online: u64) -> Self {
        if online > total {
            tracing::warn!(hid, total, online, "Online count exceeds registrations");
        }
        let online = online.min(total);
        Self {
            total,
            hid,
            online,
            offline: total - online,
        }
    }
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CreateRegisterRequest {
    /// Email to register. Defaults to the caller's primary email.
    #[schema(example = "bob@example.com")]
    pub email: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRegisterRequest {
    pub enabled: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegisterResponse {
    pub id: i32,
    pub hackathon_id: i32,
    pub email: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl From<register::Model> for RegisterResponse {
    fn from(m: register::Model) -> Self {
        Self {
            id: m.id,
            hackathon_id: m.hackathon_id,
            email: m.email,
            enabled: m.enabled,
            created_at: m.created_at,
        }
    }
}
