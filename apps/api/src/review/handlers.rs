//! Axum route handlers for the Review API.

use axum::{extract::State, Json};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::{FailureKind, LlmError};
use crate::review::analysis::request_review;
use crate::review::models::{NormalizedText, ResumeReview};
use crate::review::normalize::normalize;
use crate::review::prompts::build_review_prompt;
use crate::review::sanitize::{review_from_reply, FALLBACK_TARGET};
use crate::review::submission::ResumeSubmission;
use crate::state::AppState;

/// POST /resume-review
///
/// Full pipeline: extract → normalize → prompt → LLM → sanitize.
/// Input errors surface as 400s; upstream auth and quota failures as 500/429.
/// Any other upstream failure is served as the degraded review unless the
/// fallback policy is disabled.
pub async fn handle_resume_review(
    State(state): State<AppState>,
    submission: ResumeSubmission,
) -> Result<Json<ResumeReview>, AppError> {
    let request_id = Uuid::new_v4();
    review_submission(&state, submission)
        .instrument(info_span!("resume_review", %request_id))
        .await
        .map(Json)
}

async fn review_submission(
    state: &AppState,
    submission: ResumeSubmission,
) -> Result<ResumeReview, AppError> {
    let raw_text = submission.into_text().await?;
    let resume = NormalizedText::new(normalize(&raw_text))?;
    info!(chars = resume.as_str().chars().count(), "Reviewing resume");

    let prompt = build_review_prompt(&resume);
    let reply = match request_review(state.llm.as_ref(), &prompt).await {
        Ok(reply) => reply,
        Err(e) => return upstream_failure(state, e),
    };

    let review = review_from_reply(&reply);
    debug_assert!(review.is_well_formed());
    info!(score = review.overall_score, "Review complete");
    Ok(review)
}

fn upstream_failure(state: &AppState, e: LlmError) -> Result<ResumeReview, AppError> {
    match e.kind() {
        FailureKind::Auth => Err(AppError::UpstreamAuth(e.to_string())),
        FailureKind::Quota => Err(AppError::UpstreamQuota(e.to_string())),
        FailureKind::Other if state.config.fallback_on_upstream_error => {
            warn!(
                target: FALLBACK_TARGET,
                reason = "upstream_error",
                error = %e,
                "Model call failed; serving degraded review"
            );
            Ok(ResumeReview::degraded())
        }
        FailureKind::Other => Err(AppError::Upstream(e.to_string())),
    }
}
