//! SeaORM entity definitions for PostgreSQL database.

pub mod course;
pub mod course_tag;
pub mod course_user;
pub mod lesson;
pub mod lesson_instructor;
pub mod lesson_tag;
pub mod lesson_user;
pub mod practice_area;
pub mod refresh_token;
pub mod showcase;
pub mod showcase_image;
pub mod showcase_practice_area;
pub mod tag;
pub mod transcript_line;
pub mod user;
