use std::sync::Arc;

use tracing::info;

use crate::errors::{EvalSystemError, Result};
use crate::models::common::Page;
use crate::models::feedbacks::{
    entities::Feedback,
    requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
};
use crate::models::users::entities::Identity;
use crate::storage::Storage;

pub struct FeedbackService {
    storage: Arc<dyn Storage>,
}

impl FeedbackService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // 创建反馈，同一事务内把评分计入教师聚合
    pub async fn create(&self, identity: &Identity, req: CreateFeedbackRequest) -> Result<Feedback> {
        let feedback = self.storage.create_feedback(identity.user_id, req).await?;
        info!(
            "Feedback {} created by {} for teacher {} (rating: {})",
            feedback.id, identity.user_id, feedback.teacher_id, feedback.rating
        );
        Ok(feedback)
    }

    pub async fn get(&self, id: i64) -> Result<Feedback> {
        self.storage
            .get_feedback(id)
            .await?
            .ok_or_else(|| EvalSystemError::not_found(format!("Feedback {id} not found")))
    }

    // 作者或管理员可修改
    pub async fn update(
        &self,
        identity: &Identity,
        id: i64,
        update: UpdateFeedbackRequest,
    ) -> Result<Feedback> {
        let existing = self.get(id).await?;
        identity.require_owner_or_admin(existing.user_id, "update this feedback")?;

        let feedback = self.storage.update_feedback(id, update).await?;
        info!(
            "Feedback {} updated by {} (rating: {} -> {})",
            id, identity.user_id, existing.rating, feedback.rating
        );
        Ok(feedback)
    }

    // 作者或管理员可删除（软删除）
    pub async fn delete(&self, identity: &Identity, id: i64) -> Result<Feedback> {
        let existing = self.get(id).await?;
        identity.require_owner_or_admin(existing.user_id, "delete this feedback")?;

        let feedback = self.storage.delete_feedback(id).await?;
        info!("Feedback {} deleted by {}", id, identity.user_id);
        Ok(feedback)
    }

    pub async fn list(&self, mut query: FeedbackListQuery) -> Result<Page<Feedback>> {
        query.user_id = None;
        self.storage.list_feedbacks(query).await
    }

    // 当前用户自己的反馈
    pub async fn list_mine(
        &self,
        identity: &Identity,
        mut query: FeedbackListQuery,
    ) -> Result<Page<Feedback>> {
        query.user_id = Some(identity.user_id);
        self.storage.list_feedbacks(query).await
    }
}
