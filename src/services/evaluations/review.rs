use tracing::info;

use super::EvaluationService;
use crate::errors::{EvalSystemError, Result};
use crate::models::evaluations::{entities::Evaluation, requests::ReviewEvaluationRequest};
use crate::models::users::entities::Identity;

pub async fn review_evaluation(
    service: &EvaluationService,
    identity: &Identity,
    evaluation_id: i64,
    review: ReviewEvaluationRequest,
) -> Result<Evaluation> {
    identity.require_admin("review evaluations")?;

    if review.status.is_none() && review.answers.is_empty() {
        return Err(EvalSystemError::validation(
            "A review must change the status or edit at least one answer",
        ));
    }

    let edits = review.answers.len();
    let evaluation = service
        .storage()
        .review_evaluation(evaluation_id, identity.user_id, review)
        .await?;

    info!(
        "Evaluation {} reviewed by {} (status: {}, edited answers: {})",
        evaluation.id, identity.user_id, evaluation.status, edits
    );
    Ok(evaluation)
}
