//! 反馈文档操作

use super::{MemoryState, MemoryStorage, next_id, now};
use crate::consistency::rating::RatingChange;
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, paginate_after},
    feedbacks::{
        entities::Feedback,
        requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
    },
};
use tracing::info;

impl MemoryState {
    fn live_feedback_mut(&mut self, id: i64) -> Result<&mut Feedback> {
        self.feedbacks
            .get_mut(&id)
            .filter(|f| !f.deleted)
            .ok_or_else(|| EvalSystemError::not_found(format!("Feedback {id} not found")))
    }

    fn create_feedback(&mut self, user_id: i64, req: CreateFeedbackRequest) -> Result<Feedback> {
        if !self.teachers.contains_key(&req.teacher_id) {
            return Err(EvalSystemError::not_found(format!(
                "Teacher {} not found",
                req.teacher_id
            )));
        }
        if !self.courses.contains_key(&req.course_id) {
            return Err(EvalSystemError::not_found(format!(
                "Course {} not found",
                req.course_id
            )));
        }
        if self.feedbacks.values().any(|f| {
            !f.deleted
                && f.user_id == user_id
                && f.teacher_id == req.teacher_id
                && f.course_id == req.course_id
        }) {
            return Err(EvalSystemError::conflict(format!(
                "User {user_id} already has feedback for teacher {} in course {}",
                req.teacher_id, req.course_id
            )));
        }

        let id = next_id(&mut self.seq.feedbacks);
        let now = now();
        let feedback = Feedback {
            id,
            user_id,
            teacher_id: req.teacher_id,
            course_id: req.course_id,
            rating: req.rating,
            positive_aspects: req.positive_aspects,
            negative_aspects: req.negative_aspects,
            additional_comments: req.additional_comments,
            deleted: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.feedbacks.insert(id, feedback.clone());
        self.apply_rating(
            feedback.teacher_id,
            RatingChange::Insert {
                value: feedback.rating,
            },
        )?;
        Ok(feedback)
    }

    fn update_feedback(&mut self, id: i64, update: UpdateFeedbackRequest) -> Result<Feedback> {
        let feedback = self.live_feedback_mut(id)?;
        let old_rating = feedback.rating;

        if let Some(rating) = update.rating {
            feedback.rating = rating;
        }
        if let Some(text) = update.positive_aspects {
            feedback.positive_aspects = Some(text);
        }
        if let Some(text) = update.negative_aspects {
            feedback.negative_aspects = Some(text);
        }
        if let Some(text) = update.additional_comments {
            feedback.additional_comments = Some(text);
        }
        feedback.updated_at = now();
        let updated = feedback.clone();

        if updated.rating != old_rating {
            self.apply_rating(
                updated.teacher_id,
                RatingChange::Update {
                    old: old_rating,
                    new: updated.rating,
                },
            )?;
        }
        Ok(updated)
    }

    fn delete_feedback(&mut self, id: i64) -> Result<Feedback> {
        let feedback = self.live_feedback_mut(id)?;
        let now = now();
        feedback.deleted = true;
        feedback.deleted_at = Some(now);
        feedback.updated_at = now;
        let deleted = feedback.clone();

        self.apply_rating(
            deleted.teacher_id,
            RatingChange::Delete {
                value: deleted.rating,
            },
        )?;
        Ok(deleted)
    }

    fn matching_feedbacks(&self, query: &FeedbackListQuery) -> Vec<Feedback> {
        let mut feedbacks: Vec<Feedback> = self
            .feedbacks
            .values()
            .filter(|f| !f.deleted)
            .filter(|f| query.user_id.is_none_or(|u| f.user_id == u))
            .filter(|f| query.teacher_id.is_none_or(|t| f.teacher_id == t))
            .filter(|f| query.course_id.is_none_or(|c| f.course_id == c))
            .cloned()
            .collect();
        feedbacks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        feedbacks
    }
}

impl MemoryStorage {
    pub async fn create_feedback_impl(
        &self,
        user_id: i64,
        req: CreateFeedbackRequest,
    ) -> Result<Feedback> {
        req.validate()?;
        let feedback = self
            .transact(|state| state.create_feedback(user_id, req))
            .await?;
        info!(
            "反馈 {} 已创建 (teacher = {}, rating = {})",
            feedback.id, feedback.teacher_id, feedback.rating
        );
        Ok(feedback)
    }

    pub async fn get_feedback_impl(&self, id: i64) -> Result<Option<Feedback>> {
        Ok(self
            .read(|state| state.feedbacks.get(&id).filter(|f| !f.deleted).cloned())
            .await)
    }

    pub async fn update_feedback_impl(
        &self,
        id: i64,
        update: UpdateFeedbackRequest,
    ) -> Result<Feedback> {
        update.validate()?;
        let feedback = self
            .transact(|state| state.update_feedback(id, update))
            .await?;
        info!("反馈 {} 已更新", feedback.id);
        Ok(feedback)
    }

    pub async fn delete_feedback_impl(&self, id: i64) -> Result<Feedback> {
        let feedback = self.transact(|state| state.delete_feedback(id)).await?;
        info!("反馈 {} 已删除 (teacher = {})", feedback.id, feedback.teacher_id);
        Ok(feedback)
    }

    pub async fn list_feedbacks_impl(&self, query: FeedbackListQuery) -> Result<Page<Feedback>> {
        let feedbacks = self.read(|state| state.matching_feedbacks(&query)).await;
        paginate_after(feedbacks, &query.pagination, |f| f.id.to_string())
    }
}
