use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::shared::{PageQuery, Pagination};
use crate::entity::template::{self, PROVIDER_DOCKER, PROVIDER_K8S};

const MAX_NAME_CHARS: usize = 64;
const MAX_DESCRIPTION_CHARS: usize = 1024;
const MAX_IMAGE_CHARS: usize = 128;
const MAX_YAML_BYTES: usize = 64 * 1024;

/// Why a template payload (or a stored template row) was rejected.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateSpecError {
    #[error("Template name must be 1-64 characters")]
    NameLength,
    #[error("Template name must contain only letters, digits, '_' and '-'")]
    NameCharset,
    #[error("Description must be at most 1024 characters")]
    DescriptionTooLong,
    #[error("Docker image must not be empty")]
    EmptyImage,
    #[error("Docker image must be at most 128 characters")]
    ImageTooLong,
    #[error("Docker image must not contain whitespace")]
    ImageWhitespace,
    #[error("yaml_template must not be empty")]
    EmptyYaml,
    #[error("yaml_template must be at most 65536 bytes")]
    YamlTooLarge,
    #[error("yaml_template is not valid YAML: {0}")]
    YamlSyntax(String),
    #[error("yaml_template must be a YAML mapping")]
    YamlNotMapping,
    #[error("yaml_template is missing '{0}'")]
    YamlMissingField(&'static str),
    #[error("Template document is not valid UTF-8")]
    NotUtf8,
    #[error("Template document could not be parsed: {0}")]
    Document(String),
    #[error("Stored template has unknown provider '{0}'")]
    UnknownProvider(String),
    #[error("Stored {provider} template has no {column}")]
    MissingColumn {
        provider: &'static str,
        column: &'static str,
    },
}

/// Where and how a contestant sandbox is provisioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum VirtualEnvironment {
    /// Single container started from an image reference.
    #[serde(alias = "DOCKER")]
    Docker {
        #[schema(example = "open-hackathon-server:test-only")]
        image: String,
    },
    /// Kubernetes manifest applied as-is.
    #[serde(alias = "K8S")]
    K8s { yaml_template: String },
}

impl VirtualEnvironment {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Docker { .. } => PROVIDER_DOCKER,
            Self::K8s { .. } => PROVIDER_K8S,
        }
    }

    /// Split into the `(provider, image, yaml_template)` columns of `template`.
    pub fn into_columns(self) -> (String, Option<String>, Option<String>) {
        let provider = self.provider().to_string();
        match self {
            Self::Docker { image } => (provider, Some(image.trim().to_string()), None),
            Self::K8s { yaml_template } => (provider, None, Some(yaml_template)),
        }
    }

    /// Rebuild from a stored row.
    pub fn from_model(m: &template::Model) -> Result<Self, TemplateSpecError> {
        match m.provider.as_str() {
            PROVIDER_DOCKER => m
                .image
                .clone()
                .map(|image| Self::Docker { image })
                .ok_or(TemplateSpecError::MissingColumn {
                    provider: PROVIDER_DOCKER,
                    column: "image",
                }),
            PROVIDER_K8S => m
                .yaml_template
                .clone()
                .map(|yaml_template| Self::K8s { yaml_template })
                .ok_or(TemplateSpecError::MissingColumn {
                    provider: PROVIDER_K8S,
                    column: "yaml_template",
                }),
            other => Err(TemplateSpecError::UnknownProvider(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), TemplateSpecError> {
        match self {
            Self::Docker { image } => validate_image(image),
            Self::K8s { yaml_template } => validate_yaml_template(yaml_template),
        }
    }
}

/// Body of `POST /api/template` and `PUT /api/template/{id}`.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TemplateRequest {
    #[schema(example = "ubuntu-vnc")]
    pub name: String,
    #[serde(default)]
    #[schema(example = "Ubuntu desktop reachable over VNC")]
    pub description: String,
    pub virtual_environment: VirtualEnvironment,
}

pub fn validate_template_request(req: &TemplateRequest) -> Result<(), TemplateSpecError> {
    validate_template_name(&req.name)?;
    if req.description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(TemplateSpecError::DescriptionTooLong);
    }
    req.virtual_environment.validate()
}

pub fn validate_template_name(name: &str) -> Result<(), TemplateSpecError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(TemplateSpecError::NameLength);
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(TemplateSpecError::NameCharset);
    }
    Ok(())
}

fn validate_image(image: &str) -> Result<(), TemplateSpecError> {
    let image = image.trim();
    if image.is_empty() {
        return Err(TemplateSpecError::EmptyImage);
    }
    if image.chars().count() > MAX_IMAGE_CHARS {
        return Err(TemplateSpecError::ImageTooLong);
    }
    if image.chars().any(char::is_whitespace) {
        return Err(TemplateSpecError::ImageWhitespace);
    }
    Ok(())
}

/// A manifest must at least name its API version, kind and object name.
fn validate_yaml_template(yaml: &str) -> Result<(), TemplateSpecError> {
    if yaml.trim().is_empty() {
        return Err(TemplateSpecError::EmptyYaml);
    }
    if yaml.len() > MAX_YAML_BYTES {
        return Err(TemplateSpecError::YamlTooLarge);
    }

    let doc: serde_yaml::Value =
        serde_yaml::from_str(yaml).map_err(|e| TemplateSpecError::YamlSyntax(e.to_string()))?;
    let root = doc.as_mapping().ok_or(TemplateSpecError::YamlNotMapping)?;

    let non_empty_str = |v: Option<&serde_yaml::Value>| {
        v.and_then(serde_yaml::Value::as_str)
            .is_some_and(|s| !s.trim().is_empty())
    };

    if !non_empty_str(root.get("apiVersion")) {
        return Err(TemplateSpecError::YamlMissingField("apiVersion"));
    }
    if !non_empty_str(root.get("kind")) {
        return Err(TemplateSpecError::YamlMissingField("kind"));
    }
    if !non_empty_str(root.get("metadata").and_then(|m| m.get("name"))) {
        return Err(TemplateSpecError::YamlMissingField("metadata.name"));
    }
    Ok(())
}

/// Parse an uploaded template file. JSON documents are valid YAML, so one
/// parser covers both formats.
pub fn parse_template_document(bytes: &[u8]) -> Result<TemplateRequest, TemplateSpecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| TemplateSpecError::NotUtf8)?;
    serde_yaml::from_str(text).map_err(|e| TemplateSpecError::Document(e.to_string()))
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct TemplateListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive substring match on the template name.
    pub search: Option<String>,
    /// Only templates of this provider (`docker` or `k8s`).
    pub provider: Option<String>,
}

impl TemplateListQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            per_page: self.per_page,
            search: self.search.clone(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TemplateResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub virtual_environment: VirtualEnvironment,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<template::Model> for TemplateResponse {
    type Error = TemplateSpecError;

    fn try_from(m: template::Model) -> Result<Self, Self::Error> {
        let virtual_environment = VirtualEnvironment::from_model(&m)?;
        Ok(Self {
            id: m.id,
            name: m.name,
            description: m.description,
            virtual_environment,
            creator_id: m.creator_id,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TemplateListResponse {
    pub data: Vec<TemplateResponse>,
    pub pagination: Pagination,
}
