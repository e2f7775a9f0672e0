//! Showcase domain models, status machine and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::crop::Crops;
use super::taxonomy::PracticeAreaResponse;
use super::user::InstructorResponse;
use super::{Pagination, file_url};
use crate::entity::showcase_image;

/// Moderation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShowcaseStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

/// Status-changing actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowcaseAction {
    Submit,
    Approve,
    Reject,
    Withdraw,
}

impl ShowcaseAction {
    fn verb(&self) -> &'static str {
        match self {
            Self::Submit => "submitted",
            Self::Approve => "approved",
            Self::Reject => "rejected",
            Self::Withdraw => "withdrawn",
        }
    }
}

impl ShowcaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Owners may edit content only before review or after a rejection.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }

    /// Apply an action, returning the next status or a user-facing error.
    pub fn apply(self, action: ShowcaseAction) -> Result<ShowcaseStatus, String> {
        use ShowcaseAction::*;
        use ShowcaseStatus::*;

        match (self, action) {
            (Draft | Rejected, Submit) => Ok(Pending),
            (Pending, Approve) => Ok(Approved),
            (Pending, Reject) => Ok(Rejected),
            (Pending | Approved, Withdraw) => Ok(Draft),
            (from, action) => Err(format!(
                "A showcase in {} status cannot be {}",
                from.as_str(),
                action.verb()
            )),
        }
    }
}

impl std::fmt::Display for ShowcaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Create/update body for a showcase.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ShowcaseRequest {
    #[validate(length(min = 1, max = 255, message = "The title field is required"))]
    pub title: String,
    #[validate(length(max = 255))]
    pub tagline: Option<String>,
    #[validate(length(max = 20000))]
    pub description: Option<String>,
    #[validate(url(message = "The project url must be a valid URL"))]
    pub project_url: Option<String>,
    #[validate(url(message = "The repository url must be a valid URL"))]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub practice_area_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    #[validate(
        custom(function = "not_blank", message = "A rejection reason is required"),
        length(max = 2000)
    )]
    pub reason: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Pick the thumbnail image and its crops.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ThumbnailSelection {
    pub image_id: Uuid,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub crops: Crops,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ShowcaseImageResponse {
    pub id: Uuid,
    pub url: String,
    pub content_type: String,
    pub sort_order: i32,
}

impl From<showcase_image::Model> for ShowcaseImageResponse {
    fn from(m: showcase_image::Model) -> Self {
        Self {
            id: m.id,
            url: file_url(&m.storage_key),
            content_type: m.content_type,
            sort_order: m.sort_order,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShowcaseResponse {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub tagline: Option<String>,
    pub description: Option<String>,
    pub project_url: Option<String>,
    pub repository_url: Option<String>,
    pub status: ShowcaseStatus,
    pub submitted_date: Option<DateTime<Utc>>,
    pub moderated_at: Option<DateTime<Utc>>,
    /// Only shown to the owner and moderators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub thumbnail_image_id: Option<Uuid>,
    #[schema(value_type = Option<Object>)]
    pub thumbnail_crops: Option<Crops>,
    pub images: Vec<ShowcaseImageResponse>,
    pub practice_areas: Vec<PracticeAreaResponse>,
    pub owner: Option<InstructorResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShowcaseListResponse {
    pub showcases: Vec<ShowcaseResponse>,
    pub pagination: Pagination,
}

/// Public listing filters.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ShowcaseListQuery {
    /// Practice area slug.
    pub practice_area: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Moderation queue filters; defaults to pending.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ModerationQuery {
    pub status: Option<ShowcaseStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
