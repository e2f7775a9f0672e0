//! Marketing subscriber webhook, fired once when a member first signs in.

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::SubscriberSettings;
use crate::models::User;

const HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

#[derive(Debug, Serialize, PartialEq)]
struct SubscriberPayload {
    email: String,
    name: String,
    source: &'static str,
}

fn payload_for(user: &User) -> Option<SubscriberPayload> {
    let email = user.email.as_deref()?.trim();
    if email.is_empty() {
        return None;
    }
    Some(SubscriberPayload {
        email: email.to_string(),
        name: user.name.clone(),
        source: "linkedin",
    })
}

/// Spawn the webhook call in the background. Failures are logged and never
/// reach the caller.
pub fn notify_new_member(settings: &SubscriberSettings, user: &User) {
    let Some(url) = settings.webhook_url.clone() else {
        return;
    };
    let Some(payload) = payload_for(user) else {
        debug!("Subscriber: user {} has no email, skipping", user.id);
        return;
    };
    let token = settings.webhook_token.clone();
    let user_id = user.id;

    tokio::spawn(async move {
        if let Err(e) = send(&url, token.as_ref(), &payload).await {
            warn!("Subscriber webhook failed for user {}: {}", user_id, e);
        } else {
            debug!("Subscriber webhook delivered for user {}", user_id);
        }
    });
}

async fn send(
    url: &str,
    token: Option<&SecretString>,
    payload: &SubscriberPayload,
) -> Result<(), String> {
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| e.to_string())?;

    let mut request = client.post(url).json(payload);
    if let Some(token) = token {
        request = request.bearer_auth(token.expose_secret());
    }

    let response = request.send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("HTTP {}", response.status()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(email: Option<&str>) -> User {
        User {
            id: Uuid::now_v7(),
            linkedin_id: None,
            name: "Ada".to_string(),
            email: email.map(str::to_string),
            avatar_url: None,
            headline: None,
            bio: None,
            website_url: None,
            role: UserRole::Member,
            last_login_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_payload_requires_email() {
        assert!(payload_for(&user(None)).is_none());
        assert!(payload_for(&user(Some("  "))).is_none());

        let payload = payload_for(&user(Some(" ada@example.com "))).unwrap();
        assert_eq!(payload.email, "ada@example.com");
        assert_eq!(payload.source, "linkedin");
    }
}
