//! Decoding of token and submit response bodies

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use crate::RedditError;

/// Error code the submit endpoint uses for a link that already has a post
pub const ALREADY_SUBMITTED_CODE: &str = "ALREADY_SUB";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub value: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.expires_at
    }

    /// Value for the `Authorization` header, e.g. `bearer abc123`
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.value)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    error: Option<String>,
}

/// Decode a token endpoint body, stamping expiry relative to `now`
pub fn decode_token(body: &str, now: DateTime<Utc>) -> Result<AccessToken, RedditError> {
    let parsed: TokenResponse = serde_json::from_str(body)
        .map_err(|e| RedditError::Authentication(format!("undecodable token response: {}", e)))?;

    if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
        return Err(RedditError::Authentication(error));
    }

    if parsed.access_token.is_empty() {
        return Err(RedditError::Authentication(
            "token response carried no access token".to_string(),
        ));
    }

    let expires_at = Duration::try_seconds(parsed.expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or_else(|| {
            RedditError::Authentication(format!("invalid expires_in: {}", parsed.expires_in))
        })?;

    Ok(AccessToken {
        value: parsed.access_token,
        token_type: parsed.token_type,
        expires_at,
    })
}

/// Outcome of a submit call that the caller is expected to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    AlreadySubmitted,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitResponse {
    #[serde(default)]
    json: SubmitBody,
}

#[derive(Debug, Default, Deserialize)]
struct SubmitBody {
    #[serde(default)]
    errors: Vec<Vec<serde_json::Value>>,
}

/// Classify a submit body returned with a success status.
///
/// Each error entry is `[code, message, field]`; fields may be null.
pub fn decode_submit(body: &str) -> Result<SubmitOutcome, RedditError> {
    let parsed: SubmitResponse = serde_json::from_str(body)
        .map_err(|_| RedditError::UnexpectedResponse(body.to_string()))?;

    let mut messages = Vec::new();

    for entry in &parsed.json.errors {
        for part in entry {
            let text = match part {
                serde_json::Value::Null => continue,
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };

            if text == ALREADY_SUBMITTED_CODE {
                return Ok(SubmitOutcome::AlreadySubmitted);
            }

            if !text.is_empty() {
                messages.push(text);
            }
        }
    }

    if messages.is_empty() {
        Ok(SubmitOutcome::Submitted)
    } else {
        Err(RedditError::Rejected(messages.join(". ")))
    }
}
