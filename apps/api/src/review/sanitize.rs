//! Response Validator: turns an untrusted model reply into a `ResumeReview`.
//!
//! The reply is located, parsed into a loose JSON map, and each field is
//! coerced on its own. Nothing here can fail: an unusable reply becomes
//! `ResumeReview::fallback()`.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::review::models::{
    ResumeReview, DEFAULT_FORMAT_FEEDBACK, DEFAULT_SCORE, MAX_IMPROVEMENTS, MAX_KEYWORDS,
    MAX_STRENGTHS, MAX_SUGGESTIONS,
};

/// Log target for every fallback substitution, so operators can alert on it.
pub const FALLBACK_TARGET: &str = "resume_review::fallback";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyParseError {
    #[error("reply contains no JSON object")]
    NoJsonObject,

    #[error("no JSON object in the reply could be parsed")]
    Unparseable,
}

/// Builds a review from raw model output, substituting the fallback review
/// when no JSON object can be recovered.
pub fn review_from_reply(raw: &str) -> ResumeReview {
    match parse_reply(raw) {
        Ok(fields) => sanitize(&fields),
        Err(e) => {
            tracing::warn!(
                target: FALLBACK_TARGET,
                reason = "unparseable_reply",
                error = %e,
                raw_reply = raw,
                "Model reply could not be parsed; serving fallback review"
            );
            ResumeReview::fallback()
        }
    }
}

/// Finds and parses the JSON object in a reply.
///
/// The greedy span from the first `{` to the last `}` is tried first. If it
/// does not parse (stray braces in surrounding prose), every balanced object
/// is tried in order of its opening brace.
pub fn parse_reply(raw: &str) -> Result<Map<String, Value>, ReplyParseError> {
    let start = raw.find('{').ok_or(ReplyParseError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(ReplyParseError::NoJsonObject)?;
    if end < start {
        return Err(ReplyParseError::NoJsonObject);
    }

    if let Ok(map) = serde_json::from_str::<Map<String, Value>>(&raw[start..=end]) {
        return Ok(map);
    }

    raw.match_indices('{')
        .filter_map(|(open, _)| balanced_object(&raw[open..]))
        .find_map(|candidate| serde_json::from_str::<Map<String, Value>>(candidate).ok())
        .ok_or(ReplyParseError::Unparseable)
}

/// Returns the prefix of `text` (which starts with `{`) up to its matching
/// `}`, honouring JSON string literals and escapes.
fn balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Coerces a parsed reply into a review that satisfies every bound.
pub fn sanitize(fields: &Map<String, Value>) -> ResumeReview {
    ResumeReview {
        overall_score: coerce_score(fields.get("overallScore")),
        strengths: coerce_list(fields.get("strengths"), MAX_STRENGTHS),
        improvements: coerce_list(fields.get("improvements"), MAX_IMPROVEMENTS),
        suggestions: coerce_list(fields.get("suggestions"), MAX_SUGGESTIONS),
        keywords: coerce_list(fields.get("keywords"), MAX_KEYWORDS),
        format_feedback: fields
            .get("formatFeedback")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_FORMAT_FEEDBACK)
            .to_string(),
    }
}

fn coerce_score(value: Option<&Value>) -> u8 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match score {
        Some(s) if s.is_finite() => s.round().clamp(0.0, 100.0) as u8,
        _ => DEFAULT_SCORE,
    }
}

fn coerce_list(value: Option<&Value>, cap: usize) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(cap)
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sanitize_json(value: Value) -> ResumeReview {
        match value {
            Value::Object(map) => sanitize(&map),
            other => panic!("expected object, got {other}"),
        }
    }

    const GOOD_REPLY: &str = r#"Here is my analysis:
```json
{
  "overallScore": 82,
  "strengths": ["Clear impact metrics", "Strong Rust background"],
  "improvements": ["Summary is generic"],
  "suggestions": ["Lead with outcomes"],
  "keywords": ["Rust", "Tokio", "Kubernetes"],
  "formatFeedback": "Consistent headings; tighten spacing."
}
```
Good luck!"#;

    #[test]
    fn test_well_formed_reply_is_preserved() {
        let review = review_from_reply(GOOD_REPLY);
        assert_eq!(review.overall_score, 82);
        assert_eq!(review.strengths, vec!["Clear impact metrics", "Strong Rust background"]);
        assert_eq!(review.keywords, vec!["Rust", "Tokio", "Kubernetes"]);
        assert_eq!(review.format_feedback, "Consistent headings; tighten spacing.");
        assert!(review.is_well_formed());
    }

    #[test]
    fn test_plain_prose_reply_yields_fallback() {
        let review = review_from_reply("I'm sorry, I cannot review this resume right now.");
        assert_eq!(review, ResumeReview::fallback());
        assert_eq!(review.overall_score, 70);
    }

    #[test]
    fn test_empty_reply_yields_fallback() {
        assert_eq!(review_from_reply(""), ResumeReview::fallback());
    }

    #[test]
    fn test_broken_json_yields_fallback() {
        let review = review_from_reply(r#"{"overallScore": 80, "strengths": ["a", }"#);
        assert_eq!(review, ResumeReview::fallback());
    }

    #[test]
    fn test_reversed_braces_are_not_an_object() {
        assert_eq!(parse_reply("} nothing {"), Err(ReplyParseError::NoJsonObject));
    }

    #[test]
    fn test_stray_braces_in_prose_fall_back_to_balanced_scan() {
        let raw = r#"Scoring uses {weights}. Result: {"overallScore": 77, "formatFeedback": "ok {fine}"} Thanks {bye}"#;
        let map = parse_reply(raw).unwrap();
        assert_eq!(map["overallScore"], 77);
        assert_eq!(map["formatFeedback"], "ok {fine}");
    }

    #[test]
    fn test_score_is_clamped() {
        assert_eq!(sanitize_json(json!({"overallScore": 150})).overall_score, 100);
        assert_eq!(sanitize_json(json!({"overallScore": -5})).overall_score, 0);
        assert_eq!(sanitize_json(json!({"overallScore": 0})).overall_score, 0);
    }

    #[test]
    fn test_score_defaults_and_coercions() {
        assert_eq!(sanitize_json(json!({})).overall_score, 70);
        assert_eq!(sanitize_json(json!({"overallScore": "high"})).overall_score, 70);
        assert_eq!(sanitize_json(json!({"overallScore": null})).overall_score, 70);
        assert_eq!(sanitize_json(json!({"overallScore": " 88 "})).overall_score, 88);
        assert_eq!(sanitize_json(json!({"overallScore": 79.6})).overall_score, 80);
    }

    #[test]
    fn test_lists_are_truncated_in_order() {
        let strengths: Vec<String> = (1..=8).map(|i| format!("strength {i}")).collect();
        let review = sanitize_json(json!({ "strengths": strengths }));
        assert_eq!(
            review.strengths,
            vec!["strength 1", "strength 2", "strength 3", "strength 4", "strength 5"]
        );
    }

    #[test]
    fn test_keywords_cap_is_ten() {
        let keywords: Vec<String> = (0..15).map(|i| format!("kw{i}")).collect();
        let review = sanitize_json(json!({ "keywords": keywords }));
        assert_eq!(review.keywords.len(), 10);
        assert_eq!(review.keywords[9], "kw9");
    }

    #[test]
    fn test_blank_and_non_string_items_are_dropped_before_capping() {
        let review = sanitize_json(json!({
            "improvements": ["", "  ", "one", 42, null, "two", "\t", "three", "four", "five", "six"]
        }));
        assert_eq!(review.improvements, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn test_non_array_lists_become_empty() {
        let review = sanitize_json(json!({
            "strengths": "not a list",
            "suggestions": {"a": 1},
        }));
        assert!(review.strengths.is_empty());
        assert!(review.suggestions.is_empty());
        assert!(review.keywords.is_empty());
    }

    #[test]
    fn test_format_feedback_defaults() {
        for value in [json!({}), json!({"formatFeedback": "   "}), json!({"formatFeedback": 3})] {
            assert_eq!(sanitize_json(value).format_feedback, DEFAULT_FORMAT_FEEDBACK);
        }
    }

    #[test]
    fn test_arbitrary_replies_are_always_well_formed() {
        let replies = [
            r#"{"overallScore": 1e9, "strengths": [[1], {"x": 2}, "ok"]}"#,
            r#"{"overallScore": -1e9, "keywords": ["a","b","c","d","e","f","g","h","i","j","k","l"]}"#,
            r#"{"formatFeedback": "", "improvements": null}"#,
            r#"[1, 2, 3]"#,
            "{}",
            "no json here",
        ];
        for reply in replies {
            let review = review_from_reply(reply);
            assert!(review.is_well_formed(), "not well formed for {reply}");
        }
    }
}
