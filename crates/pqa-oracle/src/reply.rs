//! Oracle reply envelope
//!
//! The oracle returns free text that usually, but not always, contains a
//! structured payload. Rather than letting callers fish JSON out of raw text
//! ad hoc, the client classifies every reply as structured-or-raw once, and
//! callers handle the raw fallback explicitly.

use crate::error::OracleError;
use serde_json::Value;

/// Structured-or-raw oracle reply
#[derive(Debug, Clone, PartialEq)]
pub enum OracleReply {
    /// Reply text contained a parseable JSON document
    Structured(Value),
    /// Free text with no extractable structure
    Raw(String),
}

impl OracleReply {
    /// Classify raw oracle output
    ///
    /// Attempts, in order: the whole text as JSON, the content of a fenced
    /// code block, then the outermost `{...}` or `[...]` span. Anything else
    /// is `Raw`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return Self::Structured(value);
        }

        if let Some(fenced) = extract_fenced(trimmed) {
            if let Ok(value) = serde_json::from_str::<Value>(fenced) {
                return Self::Structured(value);
            }
        }

        if let Some(span) = extract_delimited(trimmed, '{', '}')
            .or_else(|| extract_delimited(trimmed, '[', ']'))
        {
            if let Ok(value) = serde_json::from_str::<Value>(span) {
                return Self::Structured(value);
            }
        }

        Self::Raw(text.to_string())
    }

    /// Structured payload, if any
    #[inline]
    #[must_use]
    pub fn as_structured(&self) -> Option<&Value> {
        match self {
            Self::Structured(value) => Some(value),
            Self::Raw(_) => None,
        }
    }

    /// Consume into the structured payload
    ///
    /// # Errors
    /// `OracleError::MalformedReply` when the reply was raw text.
    pub fn into_structured(self) -> Result<Value, OracleError> {
        match self {
            Self::Structured(value) => Ok(value),
            Self::Raw(text) => {
                let preview: String = text.chars().take(120).collect();
                Err(OracleError::MalformedReply(format!(
                    "expected structured reply, got raw text: {preview}"
                )))
            }
        }
    }

    /// Best-effort text rendering (raw text, or compact JSON)
    #[must_use]
    pub fn display_text(&self) -> String {
        match self {
            Self::Structured(value) => value.to_string(),
            Self::Raw(text) => text.clone(),
        }
    }
}

/// Content of the first ```-fenced block, if present
fn extract_fenced(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Outermost delimited span, if present
fn extract_delimited(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_text_json() {
        let reply = OracleReply::from_text(r#"{"passed": true}"#);
        assert_eq!(reply.as_structured(), Some(&json!({"passed": true})));
    }

    #[test]
    fn fenced_json() {
        let reply = OracleReply::from_text("Here you go:\n```json\n{\"a\": 1}\n```\nDone.");
        assert_eq!(reply.as_structured(), Some(&json!({"a": 1})));
    }

    #[test]
    fn embedded_object() {
        let reply = OracleReply::from_text("The result is {\"a\": [1, 2]} as requested.");
        assert_eq!(reply.as_structured(), Some(&json!({"a": [1, 2]})));
    }

    #[test]
    fn embedded_array() {
        let reply = OracleReply::from_text("claims: [\"x\", \"y\"]");
        assert_eq!(reply.as_structured(), Some(&json!(["x", "y"])));
    }

    #[test]
    fn plain_prose_is_raw() {
        let reply = OracleReply::from_text("I could not produce a structured answer.");
        assert!(matches!(reply, OracleReply::Raw(_)));
    }

    #[test]
    fn raw_into_structured_is_malformed() {
        let err = OracleReply::from_text("nope").into_structured().unwrap_err();
        assert!(matches!(err, OracleError::MalformedReply(_)));
    }

    #[test]
    fn unbalanced_braces_fall_back_to_raw() {
        let reply = OracleReply::from_text("broken { \"a\": ");
        assert!(matches!(reply, OracleReply::Raw(_)));
    }
}
