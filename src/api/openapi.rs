//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models, services};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Academy Server",
        version = "0.1.0",
        description = "Courses, lessons, learner progress and community showcases"
    ),
    servers(
        (url = "/", description = "Local server")
    ),
    paths(
        // Health
        api::health::health,
        api::health::ready,
        api::files::serve_file,
        // Auth
        services::linkedin_oauth::linkedin_login,
        services::linkedin_oauth::linkedin_callback,
        services::linkedin_oauth::refresh,
        services::linkedin_oauth::get_current_user,
        services::linkedin_oauth::logout,
        // Catalogue
        api::courses::list_courses,
        api::courses::get_course,
        api::lessons::get_lesson,
        // Progress
        api::progress::start_lesson,
        api::progress::complete_lesson,
        api::progress::reset_lesson,
        api::progress::get_course_progress,
        api::progress::dashboard,
        // Taxonomy
        api::taxonomy::list_tags,
        api::taxonomy::list_practice_areas,
        api::taxonomy::create_tag,
        api::taxonomy::delete_tag,
        api::taxonomy::create_practice_area,
        api::taxonomy::delete_practice_area,
        // Users
        api::users::update_profile,
        api::users::get_user,
        api::users::list_users,
        api::users::set_role,
        // Course admin
        api::admin_courses::list_courses,
        api::admin_courses::create_course,
        api::admin_courses::reorder_courses,
        api::admin_courses::get_course,
        api::admin_courses::update_course,
        api::admin_courses::delete_course,
        api::admin_courses::set_publish_date,
        api::admin_courses::set_visibility,
        api::admin_courses::upload_thumbnail,
        // Lesson admin
        api::admin_lessons::list_lessons,
        api::admin_lessons::create_lesson,
        api::admin_lessons::reorder_lessons,
        api::admin_lessons::get_lesson,
        api::admin_lessons::update_lesson,
        api::admin_lessons::delete_lesson,
        api::admin_lessons::set_publish_date,
        api::admin_lessons::set_visibility,
        api::admin_lessons::upload_thumbnail,
        api::admin_lessons::sync_video,
        api::admin_lessons::suggest_copy,
        // Showcases
        api::showcases::list_showcases,
        api::showcases::my_showcases,
        api::showcases::get_showcase,
        api::showcases::create_showcase,
        api::showcases::update_showcase,
        api::showcases::delete_showcase,
        api::showcases::upload_image,
        api::showcases::delete_image,
        api::showcases::reorder_images,
        api::showcases::select_thumbnail,
        api::showcases::submit_showcase,
        api::showcases::withdraw_showcase,
        // Moderation
        api::moderation::moderation_queue,
        api::moderation::approve_showcase,
        api::moderation::reject_showcase,
    ),
    components(
        schemas(
            error::ErrorResponse,
            api::health::HealthResponse,
            api::health::ReadyResponse,
            api::admin_lessons::VideoSyncResponse,
            services::readiness::Readiness,
            models::Pagination,
            models::Crop,
            // Courses and lessons
            models::ExperienceLevel,
            models::CourseRequest,
            models::PublishDateRequest,
            models::VisibilityRequest,
            models::ReorderRequest,
            models::CourseSummary,
            models::CourseDetail,
            models::AdminCourseResponse,
            models::VideoHostKind,
            models::LessonRequest,
            models::LessonSummary,
            models::LessonDetail,
            models::AdminLessonResponse,
            models::TranscriptLineResponse,
            models::CopySuggestion,
            // Progress
            models::CourseProgress,
            models::LessonProgress,
            models::LessonProgressResponse,
            models::DashboardEntry,
            models::DashboardResponse,
            // Taxonomy
            models::TagResponse,
            models::PracticeAreaResponse,
            models::TaxonomyRequest,
            // Users
            models::UserRole,
            models::UserResponse,
            models::ProfileResponse,
            models::InstructorResponse,
            models::UpdateProfileRequest,
            models::SetRoleRequest,
            models::UserListResponse,
            // Showcases
            models::ShowcaseStatus,
            models::ShowcaseRequest,
            models::RejectRequest,
            models::ThumbnailSelection,
            models::ShowcaseImageResponse,
            models::ShowcaseResponse,
            models::ShowcaseListResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "LinkedIn sign-in and sessions"),
        (name = "courses", description = "Public course catalogue"),
        (name = "lessons", description = "Lesson pages and playback"),
        (name = "progress", description = "Learner progress"),
        (name = "taxonomy", description = "Tags and practice areas"),
        (name = "users", description = "Profiles"),
        (name = "showcases", description = "Community project showcases"),
        (name = "moderation", description = "Showcase review queue"),
        (name = "admin", description = "Content and user administration")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add the session cookie security scheme.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Cookie(
                        utoipa::openapi::security::ApiKeyValue::new(
                            services::linkedin_oauth::ACCESS_COOKIE,
                        ),
                    ),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_session_scheme_and_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("session_cookie"));
        assert!(doc.paths.paths.contains_key("/api/v1/courses/{slug}"));
        assert!(doc.paths.paths.contains_key("/api/v1/admin/lessons/{id}/sync"));
    }
}
