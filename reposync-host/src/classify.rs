//! Maps host error responses onto [`HostError`].
//!
//! GitHub reports failures as a JSON body with a top-level `message` and an
//! optional `errors` array whose items are either strings or objects with
//! `message`/`code` fields. All string matching on those payloads lives here.

use serde::Deserialize;
use serde_json::Value;

use crate::error::HostError;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<Value>,
}

impl ErrorBody {
    /// Every human-readable fragment in the payload, lowercased.
    fn fragments(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(m) = &self.message {
            out.push(m.to_lowercase());
        }
        for item in &self.errors {
            match item {
                Value::String(s) => out.push(s.to_lowercase()),
                Value::Object(map) => {
                    for key in ["message", "code"] {
                        if let Some(Value::String(s)) = map.get(key) {
                            out.push(s.to_lowercase());
                        }
                    }
                }
                _ => {}
            }
        }
        out
    }

    fn mentions(&self, needle: &str) -> bool {
        self.fragments().iter().any(|f| f.contains(needle))
    }
}

/// Classify a non-success response.
pub fn classify(status: u16, body: &str) -> HostError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {status}")
            } else {
                trimmed.to_owned()
            }
        });
    let body = parsed.unwrap_or_default();

    match status {
        401 => HostError::Unauthorized { message },
        403 if body.mentions("rate limit") => HostError::RateLimited { message },
        429 => HostError::RateLimited { message },
        403 => HostError::Forbidden { message },
        404 => HostError::NotFound { message },
        422 if body.mentions("already exists") || body.mentions("already_exists") => {
            HostError::AlreadyExists {
                message: detail_or(&body, "already exists", message),
            }
        }
        422 if body.mentions("fast forward") || body.mentions("fast-forward") => {
            HostError::NonFastForward { message }
        }
        _ => HostError::Status { status, message },
    }
}

/// Prefer the nested detail that matched, e.g. "name already exists on this account".
fn detail_or(body: &ErrorBody, needle: &str, fallback: String) -> String {
    body.errors
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("message").and_then(Value::as_str).map(str::to_owned),
            _ => None,
        })
        .find(|m| m.to_lowercase().contains(needle))
        .unwrap_or(fallback)
}
