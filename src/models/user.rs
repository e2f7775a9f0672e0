//! User models for LinkedIn sign-in and role management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::Pagination;
use crate::entity::user;

/// Role hierarchy: admin ⊇ moderator ⊇ member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Moderator,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "moderator" => Some(Self::Moderator),
            "member" => Some(Self::Member),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Admin => 2,
            Self::Moderator => 1,
            Self::Member => 0,
        }
    }

    /// Whether this role grants everything `required` grants.
    pub fn includes(&self, required: UserRole) -> bool {
        self.rank() >= required.rank()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User stored in database.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub linkedin_id: Option<String>,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub role: UserRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            linkedin_id: m.linkedin_id,
            name: m.name,
            email: m.email,
            avatar_url: m.avatar_url,
            headline: m.headline,
            bio: m.bio,
            website_url: m.website_url,
            // Unknown roles in the table degrade to the least privileged one
            role: UserRole::parse(&m.role).unwrap_or(UserRole::Member),
            last_login_at: m.last_login_at,
            created_at: m.created_at,
        }
    }
}

/// Public user info.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub headline: Option<String>,
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            avatar_url: u.avatar_url,
            headline: u.headline,
            role: u.role,
        }
    }
}

/// The signed-in user's own profile (returned by /auth/me).
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub website_url: Option<String>,
    pub role: UserRole,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for ProfileResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            avatar_url: u.avatar_url,
            headline: u.headline,
            bio: u.bio,
            website_url: u.website_url,
            role: u.role,
            last_login_at: u.last_login_at,
            created_at: u.created_at,
        }
    }
}

/// Lesson instructor card.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstructorResponse {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
    pub headline: Option<String>,
}

impl From<user::Model> for InstructorResponse {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            avatar_url: m.avatar_url,
            headline: m.headline,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 255, message = "The name field is required"))]
    pub name: String,
    #[validate(length(max = 255))]
    pub headline: Option<String>,
    #[validate(length(max = 5000))]
    pub bio: Option<String>,
    #[validate(url(message = "The website url must be a valid URL"))]
    pub website_url: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<ProfileResponse>,
    pub pagination: Pagination,
}

/// LinkedIn OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
pub struct LinkedInUserInfo {
    pub sub: String,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
    pub email: Option<String>,
}

impl LinkedInUserInfo {
    /// Display name, falling back to given + family name.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            "LinkedIn member".to_string()
        } else {
            parts.join(" ")
        }
    }
}

/// Session JWT claims.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iss: String,
    pub exp: usize,
    pub iat: usize,
    pub name: String,
    pub role: String,
}
