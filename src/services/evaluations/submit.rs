use tracing::{error, info, warn};

use super::EvaluationService;
use crate::errors::{ErrorKind, EvalSystemError, Result};
use crate::models::evaluations::{
    requests::SubmitEvaluationsRequest,
    responses::{CreatedEvaluation, FailedSubmission, SubmissionReport},
};
use crate::models::users::entities::Identity;

pub async fn submit_evaluations(
    service: &EvaluationService,
    identity: &Identity,
    request: SubmitEvaluationsRequest,
) -> Result<SubmissionReport> {
    if request.evaluations.is_empty() {
        return Err(EvalSystemError::validation(
            "At least one evaluation must be submitted",
        ));
    }

    let mut report = SubmissionReport::default();
    for (index, submission) in request.evaluations.into_iter().enumerate() {
        match service
            .storage()
            .create_evaluation(identity.user_id, submission)
            .await
        {
            Ok(evaluation) => {
                info!(
                    "Evaluation {} submitted by {} for class {} (score: {:?})",
                    evaluation.id, identity.user_id, evaluation.class_id, evaluation.score
                );
                report.created.push(CreatedEvaluation {
                    index,
                    evaluation_id: evaluation.id,
                    score: evaluation.score,
                });
            }
            Err(e) => {
                if e.kind() == ErrorKind::Internal {
                    error!(
                        "Evaluation #{} from {} failed and was rolled back: {}",
                        index, identity.user_id, e
                    );
                } else {
                    warn!(
                        "Evaluation #{} from {} rejected: {}",
                        index, identity.user_id, e
                    );
                }
                report.failed.push(FailedSubmission {
                    index,
                    code: e.code(),
                    message: e.message().to_string(),
                });
            }
        }
    }
    Ok(report)
}
