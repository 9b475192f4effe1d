use serde::Serialize;

use crate::errors::AppError;

/// Minimum number of characters a normalized resume must contain.
pub const MIN_RESUME_CHARS: usize = 50;

pub const MAX_STRENGTHS: usize = 5;
pub const MAX_IMPROVEMENTS: usize = 5;
pub const MAX_SUGGESTIONS: usize = 5;
pub const MAX_KEYWORDS: usize = 10;

pub const DEFAULT_SCORE: u8 = 70;
pub const DEFAULT_FORMAT_FEEDBACK: &str = "No specific format feedback provided.";

/// The review returned to callers. Every instance leaving the pipeline is
/// within the bounds above and has non-blank entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeReview {
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub suggestions: Vec<String>,
    pub keywords: Vec<String>,
    pub format_feedback: String,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ResumeReview {
    /// Substituted when the model reply contains no usable JSON object.
    pub fn fallback() -> Self {
        ResumeReview {
            overall_score: DEFAULT_SCORE,
            strengths: owned(&[
                "Resume provides basic information",
                "Some work experience listed",
            ]),
            improvements: owned(&[
                "Consider adding more specific achievements",
                "Improve formatting and structure",
            ]),
            suggestions: owned(&[
                "Add quantifiable results",
                "Include relevant keywords for your industry",
            ]),
            keywords: owned(&["professional", "experience", "skills"]),
            format_feedback:
                "Resume could benefit from better organization and clearer section headings."
                    .to_string(),
        }
    }

    /// Substituted when the model call itself failed for an unclassified reason.
    pub fn degraded() -> Self {
        ResumeReview {
            overall_score: 65,
            strengths: owned(&["Resume submitted for review", "Basic structure present"]),
            improvements: owned(&["Unable to complete full analysis", "Please try again later"]),
            suggestions: owned(&[
                "Check your internet connection",
                "Ensure resume text is properly formatted",
            ]),
            keywords: owned(&["resume", "professional", "analysis"]),
            format_feedback:
                "Resume format could not be fully analyzed due to technical issues.".to_string(),
        }
    }

    /// True when the review satisfies every bound of the result contract.
    pub fn is_well_formed(&self) -> bool {
        fn list_ok(items: &[String], cap: usize) -> bool {
            items.len() <= cap && items.iter().all(|s| !s.trim().is_empty())
        }

        self.overall_score <= 100
            && list_ok(&self.strengths, MAX_STRENGTHS)
            && list_ok(&self.improvements, MAX_IMPROVEMENTS)
            && list_ok(&self.suggestions, MAX_SUGGESTIONS)
            && list_ok(&self.keywords, MAX_KEYWORDS)
            && !self.format_feedback.trim().is_empty()
    }
}

/// Resume text after whitespace normalization, guaranteed to meet the
/// minimum length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText(String);

impl NormalizedText {
    pub fn new(text: String) -> Result<Self, AppError> {
        let actual = text.chars().count();
        if actual < MIN_RESUME_CHARS {
            return Err(AppError::InsufficientText {
                actual,
                minimum: MIN_RESUME_CHARS,
            });
        }
        Ok(NormalizedText(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallbacks_are_well_formed() {
        assert!(ResumeReview::fallback().is_well_formed());
        assert!(ResumeReview::degraded().is_well_formed());
        assert_eq!(ResumeReview::fallback().overall_score, 70);
        assert_eq!(ResumeReview::degraded().overall_score, 65);
    }

    #[test]
    fn test_review_serializes_camel_case() {
        let value = serde_json::to_value(ResumeReview::fallback()).unwrap();
        assert_eq!(value["overallScore"], 70);
        assert!(value["formatFeedback"].is_string());
        assert_eq!(value["keywords"].as_array().unwrap().len(), 3);
        assert!(value.get("overall_score").is_none());
    }

    #[test]
    fn test_normalized_text_boundary() {
        let short = "a".repeat(49);
        assert!(matches!(
            NormalizedText::new(short),
            Err(AppError::InsufficientText {
                actual: 49,
                minimum: 50
            })
        ));

        let exact = "a".repeat(50);
        assert_eq!(NormalizedText::new(exact.clone()).unwrap().as_str(), exact);
    }

    #[test]
    fn test_normalized_text_counts_characters_not_bytes() {
        // 25 two-byte characters: 50 bytes but only 25 characters.
        let text = "é".repeat(25);
        assert!(NormalizedText::new(text).is_err());
    }

    #[test]
    fn test_blank_entry_breaks_well_formedness() {
        let mut review = ResumeReview::fallback();
        review.keywords.push("   ".to_string());
        assert!(!review.is_well_formed());
    }
}
