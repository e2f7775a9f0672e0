//! Session authentication for cookie-based sign-in.

mod extractor;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::UserRole;

pub use extractor::OptionalSession;

/// The signed-in user, taken from a verified access token.
///
/// The role is the one the token was issued with; a role change applies on
/// the next refresh.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub role: UserRole,
}

impl SessionUser {
    /// Fail with 403 unless the user holds `role` or a stronger one.
    pub fn require(&self, role: UserRole) -> AppResult<()> {
        if self.role.includes(role) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!("{} role required", role)))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.includes(UserRole::Admin)
    }

    pub fn is_moderator(&self) -> bool {
        self.role.includes(UserRole::Moderator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: UserRole) -> SessionUser {
        SessionUser {
            id: Uuid::now_v7(),
            name: "Test".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_follows_role_hierarchy() {
        assert!(session(UserRole::Admin).require(UserRole::Moderator).is_ok());
        assert!(session(UserRole::Moderator).require(UserRole::Moderator).is_ok());

        let err = session(UserRole::Member)
            .require(UserRole::Moderator)
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref m) if m == "moderator role required"));
        assert!(!session(UserRole::Moderator).is_admin());
    }
}
