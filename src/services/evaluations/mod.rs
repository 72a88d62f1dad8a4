pub mod detail;
pub mod list;
pub mod review;
pub mod submit;

use std::sync::Arc;

use crate::errors::Result;
use crate::models::evaluations::{
    entities::Evaluation,
    requests::{EvaluationListQuery, ReviewEvaluationRequest, SubmitEvaluationsRequest},
    responses::{EvaluationDetails, EvaluationListResponse, PublicEvaluationDetails, SubmissionReport},
};
use crate::models::users::entities::Identity;
use crate::storage::Storage;

pub struct EvaluationService {
    storage: Arc<dyn Storage>,
}

impl EvaluationService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub(crate) fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    // 批量提交评价，每条提交是独立的原子单元
    pub async fn submit(
        &self,
        identity: &Identity,
        request: SubmitEvaluationsRequest,
    ) -> Result<SubmissionReport> {
        submit::submit_evaluations(self, identity, request).await
    }

    // 管理员审核：状态流转与回答修订
    pub async fn review(
        &self,
        identity: &Identity,
        evaluation_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        review::review_evaluation(self, identity, evaluation_id, review).await
    }

    // 公开列表：只含已通过的评价
    pub async fn list_public(&self, query: EvaluationListQuery) -> Result<EvaluationListResponse> {
        list::list_public(self, query).await
    }

    // 管理员列表：可按状态与学期筛选
    pub async fn list_admin(
        &self,
        identity: &Identity,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        list::list_admin(self, identity, query).await
    }

    pub async fn public_details(&self, evaluation_id: i64) -> Result<PublicEvaluationDetails> {
        detail::public_details(self, evaluation_id).await
    }

    pub async fn admin_details(
        &self,
        identity: &Identity,
        evaluation_id: i64,
    ) -> Result<EvaluationDetails> {
        detail::admin_details(self, identity, evaluation_id).await
    }
}
