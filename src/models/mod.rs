//! Domain models and DTOs for the academy API.

use utoipa::ToSchema;

pub mod course;
pub mod crop;
pub mod lesson;
pub mod progress;
pub mod showcase;
pub mod taxonomy;
pub mod user;

// Re-export commonly used types
pub use course::{
    AdminCourseResponse, CourseDetail, CourseRequest, CourseSummary, ExperienceLevel,
    PublishDateRequest, ReorderRequest, VisibilityRequest,
};
pub use crop::{Crop, Crops};
pub use lesson::{
    AdminLessonResponse, CopySuggestion, LessonDetail, LessonRequest, LessonSummary,
    TranscriptLineResponse, VideoHostKind,
};
pub use progress::{
    CourseProgress, DashboardEntry, DashboardResponse, LessonProgress, LessonProgressResponse,
};
pub use showcase::{
    ModerationQuery, RejectRequest, ShowcaseAction, ShowcaseImageResponse, ShowcaseListQuery,
    ShowcaseListResponse, ShowcaseRequest, ShowcaseResponse, ShowcaseStatus, ThumbnailSelection,
};
pub use taxonomy::{PracticeAreaResponse, TaxonomyRequest, TagResponse};
pub use user::{
    InstructorResponse, LinkedInUserInfo, ProfileResponse, SessionClaims, SetRoleRequest,
    UpdateProfileRequest, User, UserListResponse, UserResponse, UserRole,
};

/// Public URL for an object served by the files proxy.
pub fn file_url(key: &str) -> String {
    format!("/api/v1/files/{}", key)
}

/// Pagination parameters.
#[derive(Debug, Clone, Default, serde::Deserialize, ToSchema)]
pub struct PaginationParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    24
}

impl PaginationParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(default_page()).max(1)
    }

    /// Calculate the offset for database queries.
    pub fn offset(&self) -> u64 {
        (self.page().saturating_sub(1) as u64) * self.clamped_limit() as u64
    }

    /// Clamp limit to maximum allowed value.
    pub fn clamped_limit(&self) -> u32 {
        self.limit.unwrap_or(default_limit()).clamp(1, 100)
    }
}

/// Pagination metadata for responses.
#[derive(Debug, Clone, serde::Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl Pagination {
    /// Create pagination metadata.
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if total == 0 || limit == 0 {
            0
        } else {
            total.div_ceil(limit as u64) as u32
        };

        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_offset_and_clamp() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(500),
        };
        assert_eq!(params.clamped_limit(), 100);
        assert_eq!(params.offset(), 200);

        let first = PaginationParams {
            page: Some(0),
            limit: None,
        };
        assert_eq!(first.page(), 1);
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 24, 0).total_pages, 0);
        assert_eq!(Pagination::new(1, 24, 24).total_pages, 1);
        assert_eq!(Pagination::new(1, 24, 25).total_pages, 2);
    }
}
