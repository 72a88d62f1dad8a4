//! 反馈存储操作
//!
//! 反馈的每次写入与对应教师评分的推进在同一事务内完成。

use super::catalog::{apply_rating_in, lock_teacher};
use super::{SeaOrmStorage, now_ts};
use crate::consistency::rating::RatingChange;
use crate::entity::courses::Entity as Courses;
use crate::entity::feedbacks::{ActiveModel, Column, Entity as Feedbacks, Model};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, PageSize},
    feedbacks::{
        entities::Feedback,
        requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::info;

/// 加行锁读取未删除的反馈
async fn lock_feedback<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Model> {
    Feedbacks::find_by_id(id)
        .filter(Column::Deleted.eq(false))
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询反馈失败: {e}")))?
        .ok_or_else(|| EvalSystemError::not_found(format!("Feedback {id} not found")))
}

async fn create_feedback_in(
    txn: &DatabaseTransaction,
    user_id: i64,
    req: CreateFeedbackRequest,
) -> Result<Feedback> {
    let teacher = lock_teacher(txn, req.teacher_id).await?;
    if Courses::find_by_id(req.course_id)
        .one(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?
        .is_none()
    {
        return Err(EvalSystemError::not_found(format!(
            "Course {} not found",
            req.course_id
        )));
    }

    let existing = Feedbacks::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TeacherId.eq(req.teacher_id))
        .filter(Column::CourseId.eq(req.course_id))
        .filter(Column::Deleted.eq(false))
        .count(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询反馈失败: {e}")))?;
    if existing > 0 {
        return Err(EvalSystemError::conflict(format!(
            "User {user_id} already has feedback for teacher {} in course {}",
            req.teacher_id, req.course_id
        )));
    }

    let now = now_ts();
    let inserted = ActiveModel {
        user_id: Set(user_id),
        teacher_id: Set(req.teacher_id),
        course_id: Set(req.course_id),
        rating: Set(req.rating),
        positive_aspects: Set(req.positive_aspects),
        negative_aspects: Set(req.negative_aspects),
        additional_comments: Set(req.additional_comments),
        deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| EvalSystemError::database_operation(format!("创建反馈失败: {e}")))?;

    apply_rating_in(txn, &teacher, RatingChange::Insert { value: req.rating }).await?;

    Ok(inserted.into_feedback())
}

async fn update_feedback_in(
    txn: &DatabaseTransaction,
    id: i64,
    update: UpdateFeedbackRequest,
) -> Result<Feedback> {
    let existing = lock_feedback(txn, id).await?;
    let old_rating = existing.rating;
    let teacher_id = existing.teacher_id;

    let mut model: ActiveModel = existing.into();
    if let Some(rating) = update.rating {
        model.rating = Set(rating);
    }
    if let Some(text) = update.positive_aspects {
        model.positive_aspects = Set(Some(text));
    }
    if let Some(text) = update.negative_aspects {
        model.negative_aspects = Set(Some(text));
    }
    if let Some(text) = update.additional_comments {
        model.additional_comments = Set(Some(text));
    }
    model.updated_at = Set(now_ts());

    let updated = model
        .update(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("更新反馈失败: {e}")))?;

    if let Some(new_rating) = update.rating {
        if new_rating != old_rating {
            let teacher = lock_teacher(txn, teacher_id).await?;
            apply_rating_in(
                txn,
                &teacher,
                RatingChange::Update {
                    old: old_rating,
                    new: new_rating,
                },
            )
            .await?;
        }
    }

    Ok(updated.into_feedback())
}

async fn delete_feedback_in(txn: &DatabaseTransaction, id: i64) -> Result<Feedback> {
    let existing = lock_feedback(txn, id).await?;
    let teacher = lock_teacher(txn, existing.teacher_id).await?;
    let rating = existing.rating;

    let now = now_ts();
    let mut model: ActiveModel = existing.into();
    model.deleted = Set(true);
    model.deleted_at = Set(Some(now));
    model.updated_at = Set(now);

    let deleted = model
        .update(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("删除反馈失败: {e}")))?;

    apply_rating_in(txn, &teacher, RatingChange::Delete { value: rating }).await?;

    Ok(deleted.into_feedback())
}

impl SeaOrmStorage {
    /// 创建反馈并计入教师评分
    pub async fn create_feedback_impl(
        &self,
        user_id: i64,
        req: CreateFeedbackRequest,
    ) -> Result<Feedback> {
        req.validate()?;
        let txn = self.begin().await?;
        let result = create_feedback_in(&txn, user_id, req).await;
        let feedback = Self::finish(txn, result).await?;

        info!(
            "反馈 {} 已创建 (teacher = {}, rating = {})",
            feedback.id, feedback.teacher_id, feedback.rating
        );
        Ok(feedback)
    }

    /// 通过 ID 获取未删除的反馈
    pub async fn get_feedback_impl(&self, id: i64) -> Result<Option<Feedback>> {
        let result = Feedbacks::find_by_id(id)
            .filter(Column::Deleted.eq(false))
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询反馈失败: {e}")))?;

        Ok(result.map(|m| m.into_feedback()))
    }

    /// 更新反馈，评分变化同步到教师聚合
    pub async fn update_feedback_impl(
        &self,
        id: i64,
        update: UpdateFeedbackRequest,
    ) -> Result<Feedback> {
        update.validate()?;
        let txn = self.begin().await?;
        let result = update_feedback_in(&txn, id, update).await;
        let feedback = Self::finish(txn, result).await?;

        info!("反馈 {} 已更新", feedback.id);
        Ok(feedback)
    }

    /// 软删除反馈并从教师评分中移除
    pub async fn delete_feedback_impl(&self, id: i64) -> Result<Feedback> {
        let txn = self.begin().await?;
        let result = delete_feedback_in(&txn, id).await;
        let feedback = Self::finish(txn, result).await?;

        info!("反馈 {} 已删除 (teacher = {})", feedback.id, feedback.teacher_id);
        Ok(feedback)
    }

    /// 列出反馈（创建时间倒序，游标为上一页最后一条反馈的 ID）
    pub async fn list_feedbacks_impl(&self, query: FeedbackListQuery) -> Result<Page<Feedback>> {
        let size = query.pagination.size()?;

        let mut select = Feedbacks::find().filter(Column::Deleted.eq(false));
        if let Some(user_id) = query.user_id {
            select = select.filter(Column::UserId.eq(user_id));
        }
        if let Some(teacher_id) = query.teacher_id {
            select = select.filter(Column::TeacherId.eq(teacher_id));
        }
        if let Some(course_id) = query.course_id {
            select = select.filter(Column::CourseId.eq(course_id));
        }

        if let (PageSize::Limited(_), Some(cursor)) = (size, query.pagination.cursor.as_deref()) {
            let anchor = match cursor.parse::<i64>() {
                Ok(id) => Feedbacks::find_by_id(id)
                    .filter(Column::Deleted.eq(false))
                    .one(&self.db)
                    .await
                    .map_err(|e| {
                        EvalSystemError::database_operation(format!("查询游标反馈失败: {e}"))
                    })?,
                Err(_) => None,
            };
            // 游标对应的反馈不存在时从头开始
            if let Some(anchor) = anchor {
                select = select.filter(
                    Condition::any()
                        .add(Column::CreatedAt.lt(anchor.created_at))
                        .add(
                            Condition::all()
                                .add(Column::CreatedAt.eq(anchor.created_at))
                                .add(Column::Id.lt(anchor.id)),
                        ),
                );
            }
        }

        let rows = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .limit(query.pagination.fetch_limit()?)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询反馈列表失败: {e}")))?;

        let feedbacks = rows.into_iter().map(|m| m.into_feedback()).collect();
        Ok(Page::from_cursor_rows(feedbacks, size, |f: &Feedback| {
            f.id.to_string()
        }))
    }
}
