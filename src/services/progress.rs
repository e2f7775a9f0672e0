//! Learner progress computation.

use crate::entity::course_user;
use crate::models::CourseProgress;

/// `round(completed * 100 / total)`, 0 for an empty course, never above 100.
pub fn percentage(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = ((completed as f64) * 100.0 / (total as f64)).round();
    pct.clamp(0.0, 100.0) as u8
}

pub fn course_progress(
    completed: u64,
    total: u64,
    enrollment: Option<&course_user::Model>,
) -> CourseProgress {
    CourseProgress {
        completed_lessons: completed.min(total),
        total_lessons: total,
        percentage: percentage(completed, total),
        started_at: enrollment.map(|e| e.started_at),
        completed_at: enrollment.and_then(|e| e.completed_at),
    }
}

/// A course is complete once every published lesson is.
pub fn is_course_complete(completed: u64, total: u64) -> bool {
    total > 0 && completed >= total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(0, 3), 0);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn test_percentage_clamps() {
        // Lessons unpublished after completion can leave completed > total
        assert_eq!(percentage(5, 3), 100);
        assert_eq!(course_progress(5, 3, None).completed_lessons, 3);
    }

    #[test]
    fn test_course_completion() {
        assert!(!is_course_complete(0, 0));
        assert!(!is_course_complete(2, 3));
        assert!(is_course_complete(3, 3));
    }
}
