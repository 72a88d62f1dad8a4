use super::EvaluationService;
use crate::errors::Result;
use crate::models::evaluations::{
    entities::EvaluationStatus, requests::EvaluationListQuery, responses::EvaluationListResponse,
};
use crate::models::users::entities::Identity;

pub async fn list_public(
    service: &EvaluationService,
    mut query: EvaluationListQuery,
) -> Result<EvaluationListResponse> {
    // 公开视角固定只看已通过的评价，不开放学期筛选
    query.status = Some(EvaluationStatus::Approved);
    query.semester = None;
    service.storage().list_evaluations(query).await
}

pub async fn list_admin(
    service: &EvaluationService,
    identity: &Identity,
    query: EvaluationListQuery,
) -> Result<EvaluationListResponse> {
    identity.require_admin("list all evaluations")?;
    service.storage().list_evaluations(query).await
}
