//! Tags and practice areas.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::entity::{practice_area, tag};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(m: tag::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PracticeAreaResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<practice_area::Model> for PracticeAreaResponse {
    fn from(m: practice_area::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            slug: m.slug,
        }
    }
}

/// Create body shared by tags and practice areas.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TaxonomyRequest {
    #[validate(length(min = 1, max = 100, message = "The name field is required"))]
    pub name: String,
}
