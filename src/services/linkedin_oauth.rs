//! LinkedIn sign-in (OpenID Connect) routes.
//!
//! Sessions use a short-lived access token plus a rotating refresh token:
//! - Access token: HS256 JWT in the `academy_session` HttpOnly cookie
//! - Refresh token: opaque token in the `academy_refresh` HttpOnly cookie,
//!   only its SHA-256 hash is stored
//!
//! Endpoints:
//! 1. GET /auth/linkedin: redirect to LinkedIn with a CSRF `state`
//! 2. GET /auth/linkedin/callback: verify state, exchange code, issue tokens
//! 3. POST /auth/refresh: rotate the refresh token and issue a new pair
//! 4. GET /auth/me: current user profile, or `null`
//! 5. POST /auth/logout: revoke the refresh token and clear cookies

use actix_web::cookie::{Cookie, SameSite};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::{Config, LinkedInOAuthSettings};
use crate::db::{DbPool, refresh_tokens, users};
use crate::error::{AppError, AppResult};
use crate::models::{LinkedInUserInfo, ProfileResponse, SessionClaims, User};
use crate::services::subscriber;

/// Access token cookie name (short-lived JWT).
pub const ACCESS_COOKIE: &str = "academy_session";
/// Refresh token cookie name (long-lived opaque token).
pub const REFRESH_COOKIE: &str = "academy_refresh";
/// Random `state` sent to LinkedIn, checked on callback.
const OAUTH_STATE_COOKIE: &str = "academy_oauth_state";
/// Session JWT issuer.
pub const SESSION_ISSUER: &str = "academy";

const AUTHORIZE_URL: &str = "https://www.linkedin.com/oauth/v2/authorization";
const TOKEN_URL: &str = "https://www.linkedin.com/oauth/v2/accessToken";
const USERINFO_URL: &str = "https://api.linkedin.com/v2/userinfo";
const SCOPES: &str = "openid profile email";
const DEFAULT_CALLBACK: &str = "/api/v1/auth/linkedin/callback";

const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Configure sign-in routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(linkedin_login)
        .service(linkedin_callback)
        .service(refresh)
        .service(get_current_user)
        .service(logout);
}

fn build_http_client() -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .timeout(HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::External(format!("Failed to build HTTP client: {}", e)))
}

fn generate_random_hex() -> String {
    let random_bytes: [u8; 32] = rand::random();
    hex::encode(random_bytes)
}

fn session_cookie(name: &'static str, value: String, same_site: SameSite, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(same_site);
    cookie.set_secure(secure);
    cookie
}

fn expired_cookie(name: &'static str, secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie(name, String::new(), SameSite::Lax, secure);
    cookie.make_removal();
    cookie
}

fn enabled_settings(config: &Config) -> AppResult<&LinkedInOAuthSettings> {
    let oauth = &config.linkedin_oauth;
    if !oauth.enabled {
        return Err(AppError::InvalidInput(
            "LinkedIn sign-in is not configured".to_string(),
        ));
    }
    Ok(oauth)
}

fn auth_failed() -> AppError {
    AppError::Unauthorized("LinkedIn authentication failed".to_string())
}

/// Compare the callback `state` with the cookie copy in constant time.
fn state_matches(expected: &str, provided: &str) -> bool {
    !provided.is_empty() && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
}

fn authorize_url(client_id: &str, redirect_uri: &str, state: &str) -> String {
    format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&state={}&scope={}",
        AUTHORIZE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state),
        urlencoding::encode(SCOPES),
    )
}

/// Redirect to the LinkedIn authorization page.
///
/// GET /api/v1/auth/linkedin
#[utoipa::path(
    get,
    path = "/api/v1/auth/linkedin",
    tag = "auth",
    responses(
        (status = 302, description = "Redirect to LinkedIn"),
        (status = 400, description = "Sign-in not configured", body = crate::error::ErrorResponse)
    )
)]
#[get("/auth/linkedin")]
pub async fn linkedin_login(config: web::Data<Config>) -> AppResult<HttpResponse> {
    let oauth = enabled_settings(&config)?;
    let client_id = oauth.client_id.as_deref().ok_or_else(|| {
        AppError::InvalidInput("LinkedIn client ID not configured".to_string())
    })?;
    let redirect_uri = oauth.redirect_url.as_deref().unwrap_or(DEFAULT_CALLBACK);

    let state = generate_random_hex();
    let location = authorize_url(client_id, redirect_uri, &state);
    let state_cookie = session_cookie(
        OAUTH_STATE_COOKIE,
        state,
        SameSite::Lax,
        config.environment.is_production(),
    );

    Ok(HttpResponse::Found()
        .cookie(state_cookie)
        .append_header(("Location", location))
        .finish())
}

/// Handle the LinkedIn callback.
///
/// GET /api/v1/auth/linkedin/callback?code=...&state=...
#[utoipa::path(
    get,
    path = "/api/v1/auth/linkedin/callback",
    tag = "auth",
    params(
        ("code" = Option<String>, Query, description = "Authorization code"),
        ("state" = Option<String>, Query, description = "CSRF state")
    ),
    responses(
        (status = 302, description = "Signed in, redirect to the app"),
        (status = 401, description = "Authentication failed", body = crate::error::ErrorResponse)
    )
)]
#[get("/auth/linkedin/callback")]
pub async fn linkedin_callback(
    req: HttpRequest,
    query: web::Query<CallbackQuery>,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let oauth = enabled_settings(&config)?;

    let expected_state = req
        .cookie(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| {
            warn!("OAuth callback: missing state cookie");
            AppError::Unauthorized("OAuth state verification failed".to_string())
        })?;
    if !state_matches(&expected_state, query.state.as_deref().unwrap_or("")) {
        warn!("OAuth callback: state mismatch");
        return Err(AppError::Unauthorized(
            "OAuth state verification failed".to_string(),
        ));
    }

    if let Some(ref err) = query.error {
        warn!("OAuth callback: LinkedIn returned error: {}", err);
        return Err(auth_failed());
    }
    let code = query.code.as_deref().filter(|c| !c.is_empty()).ok_or_else(|| {
        warn!("OAuth callback: no code");
        auth_failed()
    })?;

    let client_id = oauth.client_id.as_deref().ok_or_else(|| {
        AppError::InvalidInput("LinkedIn client ID not configured".to_string())
    })?;
    let client_secret = oauth.client_secret.as_ref().ok_or_else(|| {
        AppError::InvalidInput("LinkedIn client secret not configured".to_string())
    })?;
    let redirect_uri = oauth.redirect_url.as_deref().unwrap_or(DEFAULT_CALLBACK);

    let http_client = build_http_client()?;
    let form = format!(
        "grant_type=authorization_code&code={}&client_id={}&client_secret={}&redirect_uri={}",
        urlencoding::encode(code),
        urlencoding::encode(client_id),
        urlencoding::encode(client_secret.expose_secret()),
        urlencoding::encode(redirect_uri),
    );
    let token_response: TokenResponse = http_client
        .post(TOKEN_URL)
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Accept", "application/json")
        .body(form)
        .send()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to exchange code: {}", e);
            auth_failed()
        })?
        .json()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to parse token response: {}", e);
            auth_failed()
        })?;

    if let Some(ref err) = token_response.error {
        warn!("OAuth: LinkedIn token error: {}", err);
        return Err(auth_failed());
    }
    let linkedin_token: SecretString = token_response
        .access_token
        .map(SecretString::from)
        .ok_or_else(|| {
            warn!("OAuth: no access_token in response");
            auth_failed()
        })?;

    let user_info: LinkedInUserInfo = http_client
        .get(USERINFO_URL)
        .bearer_auth(linkedin_token.expose_secret())
        .send()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to fetch userinfo: {}", e);
            auth_failed()
        })?
        .json()
        .await
        .map_err(|e| {
            warn!("OAuth: failed to parse userinfo: {}", e);
            auth_failed()
        })?;

    let (user, created) = users::upsert_from_linkedin(pool.connection(), &user_info).await?;
    info!(
        "LinkedIn login: user='{}' (id={}, new={})",
        user.name, user.id, created
    );
    if created {
        subscriber::notify_new_member(&config.subscriber, &user);
    }

    let is_prod = config.environment.is_production();
    let (access, refresh_cookie) = issue_token_pair(&user, oauth, &pool, is_prod).await?;

    Ok(HttpResponse::Found()
        .cookie(access)
        .cookie(refresh_cookie)
        .cookie(expired_cookie(OAUTH_STATE_COOKIE, is_prod))
        .append_header(("Location", "/"))
        .finish())
}

/// Rotate the refresh token and issue a new pair.
///
/// POST /api/v1/auth/refresh
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New session issued", body = ProfileResponse),
        (status = 401, description = "Missing or invalid refresh token", body = crate::error::ErrorResponse)
    )
)]
#[post("/auth/refresh")]
pub async fn refresh(
    req: HttpRequest,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let oauth = &config.linkedin_oauth;
    if !oauth.enabled {
        return Err(AppError::Unauthorized(
            "LinkedIn sign-in is not configured".to_string(),
        ));
    }

    let raw_token = req
        .cookie(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Unauthorized("No refresh token".to_string()))?;

    let token_hash = refresh_tokens::hash_token(&raw_token);
    let user_id = refresh_tokens::find_valid_by_hash(pool.connection(), &token_hash)
        .await?
        .ok_or_else(|| {
            warn!("Refresh: invalid or expired refresh token");
            AppError::Unauthorized("Invalid refresh token".to_string())
        })?;
    // Rotation is single-use: a concurrent refresh that lost the revoke gets nothing
    if !refresh_tokens::revoke_by_hash(pool.connection(), &token_hash).await? {
        warn!("Refresh: token for user {} was already rotated", user_id);
        return Err(AppError::Unauthorized(
            "Invalid refresh token".to_string(),
        ));
    }

    let user = users::find_by_id(pool.connection(), user_id)
        .await?
        .ok_or_else(|| {
            warn!("Refresh: user {} not found", user_id);
            AppError::Unauthorized("User not found".to_string())
        })?;

    let is_prod = config.environment.is_production();
    let (access, refresh) = issue_token_pair(&user, oauth, &pool, is_prod).await?;

    Ok(HttpResponse::Ok()
        .cookie(access)
        .cookie(refresh)
        .json(ProfileResponse::from(user)))
}

/// Current user from the access token, or `{ "user": null }`.
///
/// GET /api/v1/auth/me
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "auth",
    responses((status = 200, description = "Current user or null"))
)]
#[get("/auth/me")]
pub async fn get_current_user(
    req: HttpRequest,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let anonymous = || HttpResponse::Ok().json(serde_json::json!({ "user": null }));

    let Some(token) = req.cookie(ACCESS_COOKIE) else {
        return Ok(anonymous());
    };
    let Ok(claims) = verify_session_token(token.value(), &config.linkedin_oauth.session_secret)
    else {
        return Ok(anonymous());
    };
    let Ok(user_id) = uuid::Uuid::parse_str(&claims.sub) else {
        return Ok(anonymous());
    };

    match users::find_by_id(pool.connection(), user_id).await? {
        Some(user) => Ok(HttpResponse::Ok()
            .json(serde_json::json!({ "user": ProfileResponse::from(user) }))),
        None => Ok(anonymous()),
    }
}

/// Revoke the refresh token server-side and clear both cookies.
///
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Logged out"))
)]
#[post("/auth/logout")]
pub async fn logout(
    req: HttpRequest,
    config: web::Data<Config>,
    pool: web::Data<DbPool>,
) -> AppResult<HttpResponse> {
    let is_prod = config.environment.is_production();

    if let Some(refresh_cookie) = req.cookie(REFRESH_COOKIE) {
        let token_hash = refresh_tokens::hash_token(refresh_cookie.value());
        if let Err(e) = refresh_tokens::revoke_by_hash(pool.connection(), &token_hash).await {
            warn!("Logout: failed to revoke refresh token: {}", e);
        }
    }

    Ok(HttpResponse::Ok()
        .cookie(expired_cookie(ACCESS_COOKIE, is_prod))
        .cookie(expired_cookie(REFRESH_COOKIE, is_prod))
        .json(serde_json::json!({ "message": "Logged out" })))
}

/// Create the access JWT and a stored refresh token for `user`.
async fn issue_token_pair(
    user: &User,
    oauth: &LinkedInOAuthSettings,
    pool: &DbPool,
    is_production: bool,
) -> AppResult<(Cookie<'static>, Cookie<'static>)> {
    let access_token = create_access_token(
        user,
        &oauth.session_secret,
        oauth.access_token_ttl_secs,
    )?;

    let raw_refresh_token = refresh_tokens::generate_token();
    let refresh_hash = refresh_tokens::hash_token(&raw_refresh_token);
    refresh_tokens::insert(
        pool.connection(),
        user.id,
        &refresh_hash,
        oauth.refresh_token_ttl_secs,
    )
    .await?;

    Ok((
        session_cookie(ACCESS_COOKIE, access_token, SameSite::Lax, is_production),
        session_cookie(
            REFRESH_COOKIE,
            raw_refresh_token,
            SameSite::Strict,
            is_production,
        ),
    ))
}

pub fn create_access_token(user: &User, secret: &SecretString, ttl_secs: u64) -> AppResult<String> {
    let now = chrono::Utc::now();
    let exp = now + chrono::Duration::seconds(ttl_secs as i64);

    let claims = SessionClaims {
        sub: user.id.to_string(),
        iss: SESSION_ISSUER.to_string(),
        exp: exp.timestamp() as usize,
        iat: now.timestamp() as usize,
        name: user.name.clone(),
        role: user.role.as_str().to_string(),
    };

    let key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::External(format!("Failed to create access token: {}", e)))
}

/// Verify an access token JWT and return its claims.
pub fn verify_session_token(token: &str, secret: &SecretString) -> Result<SessionClaims, String> {
    let key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[SESSION_ISSUER]);
    validation.validate_aud = false;

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid session token: {}", e))
}

#[derive(serde::Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(serde::Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_user(role: UserRole) -> User {
        User {
            id: Uuid::now_v7(),
            linkedin_id: Some("li-123".to_string()),
            name: "Grace Hopper".to_string(),
            email: None,
            avatar_url: None,
            headline: None,
            bio: None,
            website_url: None,
            role,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let secret = SecretString::from("unit-test-secret");
        let user = sample_user(UserRole::Moderator);
        let token = create_access_token(&user, &secret, 60).unwrap();

        let claims = verify_session_token(&token, &secret).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.iss, SESSION_ISSUER);
        assert_eq!(claims.role, "moderator");
        assert_eq!(claims.name, "Grace Hopper");
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let user = sample_user(UserRole::Admin);
        let token = create_access_token(&user, &SecretString::from("one"), 60).unwrap();
        assert!(verify_session_token(&token, &SecretString::from("two")).is_err());
    }

    #[test]
    fn test_state_comparison() {
        assert!(state_matches("abc123", "abc123"));
        assert!(!state_matches("abc123", "abc124"));
        assert!(!state_matches("abc123", "abc"));
        assert!(!state_matches("", ""));
    }

    #[test]
    fn test_authorize_url_encodes_parameters() {
        let url = authorize_url("client", "https://academy.test/cb?x=1", "s1");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("redirect_uri=https%3A%2F%2Facademy.test%2Fcb%3Fx%3D1"));
        assert!(url.contains("scope=openid%20profile%20email"));
        assert!(url.contains("state=s1"));
    }
}
