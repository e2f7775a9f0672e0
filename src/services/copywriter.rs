//! LLM copywriter: drafts lesson marketing text from a transcript.
//!
//! Talks to any OpenAI-compatible `POST {api_url}/chat/completions`
//! endpoint. Suggestions are returned to the editor, never saved.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::CopywriterSettings;
use crate::error::{AppError, AppResult};
use crate::models::CopySuggestion;

const HTTP_CONNECT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
const HTTP_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
/// Transcript characters sent to the model.
const MAX_TRANSCRIPT_CHARS: usize = 24_000;
const MAX_TOKENS: u32 = 1200;

const SYSTEM_PROMPT: &str = "You write marketing copy for video lessons on a professional \
learning platform. Reply with a single JSON object with the keys \"tagline\" (one sentence, \
at most 120 characters), \"description\" (one short markdown paragraph) and \"copy\" \
(two to four markdown paragraphs selling the lesson). Do not invent facts that are not in \
the transcript.";

pub struct Copywriter {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    api_url: String,
    model: String,
}

impl Copywriter {
    pub fn new(settings: &CopywriterSettings) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::External(format!("Failed to build copywriter HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the model for a tagline, description and marketing copy.
    pub async fn suggest(&self, title: &str, transcript: &[String]) -> AppResult<CopySuggestion> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::InvalidInput("The copywriter is not configured".to_string())
        })?;
        if transcript.is_empty() {
            return Err(AppError::field(
                "transcript",
                "The lesson needs a transcript before copy can be suggested",
            ));
        }

        debug!("Requesting copy suggestion for lesson '{}'", title);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(api_key.expose_secret())
            .json(&serde_json::json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt(title, transcript) }
                ],
                "max_tokens": MAX_TOKENS,
                "response_format": { "type": "json_object" }
            }))
            .send()
            .await
            .map_err(|e| AppError::External(format!("Copywriter request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Copywriter returned HTTP {}", status);
            return Err(AppError::External(format!(
                "Copywriter returned HTTP {}",
                status
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Invalid copywriter response: {}", e)))?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default();

        parse_suggestion(content)
    }
}

fn user_prompt(title: &str, transcript: &[String]) -> String {
    let mut text = String::new();
    for line in transcript {
        if text.len() + line.len() + 1 > MAX_TRANSCRIPT_CHARS {
            break;
        }
        text.push_str(line);
        text.push('\n');
    }
    format!("Lesson title: {}\n\nTranscript:\n{}", title.trim(), text)
}

#[derive(Deserialize)]
struct RawSuggestion {
    #[serde(default)]
    tagline: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    copy: String,
}

/// Parse the model reply, tolerating a fenced ```json block.
fn parse_suggestion(content: &str) -> AppResult<CopySuggestion> {
    let trimmed = content.trim();
    let json = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => {
            return Err(AppError::External(
                "Copywriter reply contained no JSON object".to_string(),
            ));
        }
    };

    let raw: RawSuggestion = serde_json::from_str(json)
        .map_err(|e| AppError::External(format!("Copywriter reply was not valid JSON: {}", e)))?;
    let suggestion = CopySuggestion {
        tagline: raw.tagline.trim().to_string(),
        description: raw.description.trim().to_string(),
        copy: raw.copy.trim().to_string(),
    };

    if suggestion.tagline.is_empty()
        && suggestion.description.is_empty()
        && suggestion.copy.is_empty()
    {
        return Err(AppError::External(
            "Copywriter reply was empty".to_string(),
        ));
    }
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let s = parse_suggestion(
            r#"{"tagline":" Ship it ","description":"Learn shipping.","copy":"Long copy."}"#,
        )
        .unwrap();
        assert_eq!(s.tagline, "Ship it");
        assert_eq!(s.description, "Learn shipping.");
        assert_eq!(s.copy, "Long copy.");
    }

    #[test]
    fn test_parse_fenced_json() {
        let reply = "Here you go:\n```json\n{\"tagline\":\"T\",\"copy\":\"C\"}\n```";
        let s = parse_suggestion(reply).unwrap();
        assert_eq!(s.tagline, "T");
        assert_eq!(s.description, "");
        assert_eq!(s.copy, "C");
    }

    #[test]
    fn test_parse_rejects_prose_and_empty_objects() {
        assert!(parse_suggestion("I cannot help with that").is_err());
        assert!(parse_suggestion("{}").is_err());
    }

    #[test]
    fn test_prompt_truncates_long_transcripts() {
        let lines: Vec<String> = (0..10_000).map(|i| format!("line number {}", i)).collect();
        let prompt = user_prompt("Intro", &lines);
        assert!(prompt.starts_with("Lesson title: Intro"));
        assert!(prompt.len() < MAX_TRANSCRIPT_CHARS + 100);
        assert!(prompt.contains("line number 0\n"));
    }

    #[actix_rt::test]
    async fn test_unconfigured_copywriter_refuses() {
        let settings = CopywriterSettings {
            api_key: None,
            api_url: "http://127.0.0.1:1".to_string(),
            model: "test".to_string(),
        };
        let copywriter = Copywriter::new(&settings).unwrap();
        assert!(!copywriter.is_configured());
        let err = copywriter
            .suggest("Intro", &["hello".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
