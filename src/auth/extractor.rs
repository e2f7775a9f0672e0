//! Actix-web extractors for the session cookie.
//!
//! The access token never appears in logs or error messages.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use std::future::{Ready, ready};
use tracing::debug;
use uuid::Uuid;

use super::SessionUser;
use crate::config::Config;
use crate::error::AppError;
use crate::models::UserRole;
use crate::services::linkedin_oauth::{ACCESS_COOKIE, verify_session_token};

/// Why a request carries no usable session.
#[derive(Debug, PartialEq)]
enum SessionFailure {
    Missing,
    Invalid,
}

fn session_from_request(req: &HttpRequest) -> Result<SessionUser, SessionFailure> {
    let cookie = req.cookie(ACCESS_COOKIE).ok_or(SessionFailure::Missing)?;
    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        debug!("Session check without Config app data");
        SessionFailure::Invalid
    })?;

    let claims = verify_session_token(cookie.value(), &config.linkedin_oauth.session_secret)
        .map_err(|e| {
            debug!("Rejected session token: {}", e);
            SessionFailure::Invalid
        })?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| SessionFailure::Invalid)?;
    let role = UserRole::parse(&claims.role).ok_or(SessionFailure::Invalid)?;

    Ok(SessionUser {
        id,
        name: claims.name,
        role,
    })
}

/// Requires a valid session; 401 otherwise.
///
/// ```ignore
/// async fn handler(session: SessionUser) -> AppResult<HttpResponse> { ... }
/// ```
impl FromRequest for SessionUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(session_from_request(req).map_err(|failure| match failure {
            SessionFailure::Missing => AppError::Unauthorized("Not signed in".to_string()),
            SessionFailure::Invalid => {
                AppError::Unauthorized("Session expired or invalid".to_string())
            }
        }))
    }
}

/// A session if one is present and valid. Never fails.
#[derive(Debug, Clone)]
pub struct OptionalSession(pub Option<SessionUser>);

impl OptionalSession {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|s| s.id)
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(SessionUser::is_admin)
    }
}

impl FromRequest for OptionalSession {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(OptionalSession(session_from_request(req).ok())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::models::User;
    use crate::services::linkedin_oauth::create_access_token;
    use actix_web::cookie::Cookie;
    use actix_web::test::TestRequest;
    use chrono::Utc;

    fn token_for(config: &Config, role: UserRole) -> (Uuid, String) {
        let user = User {
            id: Uuid::now_v7(),
            linkedin_id: None,
            name: "Session Test".to_string(),
            email: None,
            avatar_url: None,
            headline: None,
            bio: None,
            website_url: None,
            role,
            last_login_at: None,
            created_at: Utc::now(),
        };
        let token =
            create_access_token(&user, &config.linkedin_oauth.session_secret, 60).unwrap();
        (user.id, token)
    }

    #[test]
    fn test_valid_cookie_yields_session() {
        let config = test_config();
        let (id, token) = token_for(&config, UserRole::Moderator);
        let req = TestRequest::default()
            .app_data(web::Data::new(config))
            .cookie(Cookie::new(ACCESS_COOKIE, token))
            .to_http_request();

        let session = session_from_request(&req).unwrap();
        assert_eq!(session.id, id);
        assert_eq!(session.role, UserRole::Moderator);
    }

    #[test]
    fn test_missing_and_garbage_cookies() {
        let req = TestRequest::default()
            .app_data(web::Data::new(test_config()))
            .to_http_request();
        assert_eq!(session_from_request(&req).unwrap_err(), SessionFailure::Missing);

        let req = TestRequest::default()
            .app_data(web::Data::new(test_config()))
            .cookie(Cookie::new(ACCESS_COOKIE, "not-a-jwt"))
            .to_http_request();
        assert_eq!(session_from_request(&req).unwrap_err(), SessionFailure::Invalid);
    }
}
