use super::EvaluationService;
use crate::errors::{EvalSystemError, Result};
use crate::models::evaluations::{
    entities::EvaluationStatus,
    responses::{EvaluationDetails, PublicEvaluationDetails},
};
use crate::models::users::entities::Identity;

pub async fn public_details(
    service: &EvaluationService,
    evaluation_id: i64,
) -> Result<PublicEvaluationDetails> {
    match service.storage().get_evaluation_details(evaluation_id).await? {
        // 未通过的评价对公开视角不可见
        Some(details) if details.summary.status == EvaluationStatus::Approved => {
            Ok(details.into())
        }
        _ => Err(EvalSystemError::not_found(format!(
            "Evaluation {evaluation_id} not found"
        ))),
    }
}

pub async fn admin_details(
    service: &EvaluationService,
    identity: &Identity,
    evaluation_id: i64,
) -> Result<EvaluationDetails> {
    identity.require_admin("view evaluation details")?;
    service
        .storage()
        .get_evaluation_details(evaluation_id)
        .await?
        .ok_or_else(|| EvalSystemError::not_found(format!("Evaluation {evaluation_id} not found")))
}
