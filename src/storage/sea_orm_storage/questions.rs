//! 问题存储操作
//!
//! 每次写入后在同一事务内重排全部启用问题，只写回名次变化的行。

use super::{SeaOrmStorage, now_ts};
use crate::consistency::ordering::{RankedQuestion, resequence};
use crate::entity::answers::{Column as AnswerColumn, Entity as Answers};
use crate::entity::questions::{ActiveModel, Column, Entity as Questions, Model};
use crate::errors::{EvalSystemError, Result};
use crate::models::questions::{
    entities::{Question, QuestionRemoval},
    requests::{CreateQuestionRequest, UpdateQuestionRequest, check_question_fields},
};
use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{debug, info};

/// 在事务内重排启用问题
///
/// `priority` 是本次刚变更的问题，与其他问题 order 相同时排在前面。
async fn resequence_active<C: ConnectionTrait>(conn: &C, priority: Option<i64>) -> Result<()> {
    let active = Questions::find()
        .filter(Column::Active.eq(true))
        .lock_exclusive()
        .all(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询启用问题失败: {e}")))?;

    let ranked: Vec<RankedQuestion> = active.iter().map(Model::ranked).collect();
    let changes = resequence(&ranked, priority);
    debug!(
        "重排 {} 个启用问题，需要写回 {} 行",
        ranked.len(),
        changes.len()
    );

    for change in changes {
        let model = ActiveModel {
            id: Set(change.id),
            question_order: Set(Some(change.order)),
            ..Default::default()
        };
        model
            .update(conn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("更新问题顺序失败: {e}")))?;
    }

    Ok(())
}

async fn find_question<C: ConnectionTrait>(conn: &C, id: i64) -> Result<Model> {
    Questions::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询问题失败: {e}")))?
        .ok_or_else(|| EvalSystemError::not_found(format!("Question {id} not found")))
}

async fn create_question_in(
    txn: &DatabaseTransaction,
    req: CreateQuestionRequest,
) -> Result<Question> {
    let hint = if req.active { req.order } else { None };
    check_question_fields(req.question_type, req.is_score, hint)?;

    let now = now_ts();
    let model = ActiveModel {
        question: Set(req.question),
        question_type: Set(req.question_type.to_string()),
        active: Set(req.active),
        question_order: Set(hint),
        is_score: Set(req.is_score),
        required: Set(req.required),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = model
        .insert(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("创建问题失败: {e}")))?;

    if inserted.active {
        resequence_active(txn, Some(inserted.id)).await?;
    }

    Ok(find_question(txn, inserted.id).await?.into_question())
}

async fn update_question_in(
    txn: &DatabaseTransaction,
    id: i64,
    update: UpdateQuestionRequest,
) -> Result<Question> {
    let existing = find_question(txn, id).await?;
    let current = existing.clone().into_question();

    let question_type = update.question_type.unwrap_or(current.question_type);
    let is_score = update.is_score.unwrap_or(current.is_score);
    let active = update.active.unwrap_or(current.active);
    let hint = if active { update.order } else { None };
    check_question_fields(question_type, is_score, hint)?;

    // 停用清空 order；重新启用且没有位置提示时排到末尾
    let order = match (active, hint) {
        (false, _) => None,
        (true, Some(hint)) => Some(hint),
        (true, None) if current.active => current.order,
        (true, None) => None,
    };

    let mut model: ActiveModel = existing.into();
    if let Some(text) = update.question {
        model.question = Set(text);
    }
    if let Some(required) = update.required {
        model.required = Set(required);
    }
    model.question_type = Set(question_type.to_string());
    model.is_score = Set(is_score);
    model.active = Set(active);
    model.question_order = Set(order);
    model.updated_at = Set(now_ts());

    model
        .update(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("更新问题失败: {e}")))?;

    resequence_active(txn, Some(id)).await?;

    Ok(find_question(txn, id).await?.into_question())
}

async fn remove_question_in(txn: &DatabaseTransaction, id: i64) -> Result<QuestionRemoval> {
    let existing = find_question(txn, id).await?;

    let answered = Answers::find()
        .filter(AnswerColumn::QuestionId.eq(id))
        .count(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("统计回答失败: {e}")))?;

    let removal = if answered > 0 {
        let mut model: ActiveModel = existing.into();
        model.active = Set(false);
        model.question_order = Set(None);
        model.updated_at = Set(now_ts());
        model
            .update(txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("停用问题失败: {e}")))?;
        QuestionRemoval { deleted: false }
    } else {
        Questions::delete_by_id(id)
            .exec(txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("删除问题失败: {e}")))?;
        QuestionRemoval { deleted: true }
    };

    resequence_active(txn, None).await?;
    Ok(removal)
}

impl SeaOrmStorage {
    /// 列出问题
    pub async fn list_questions_impl(&self, active_only: bool) -> Result<Vec<Question>> {
        let mut select = Questions::find();
        if active_only {
            select = select.filter(Column::Active.eq(true));
        }

        let result = select
            .order_by_desc(Column::Active)
            .order_by_with_nulls(Column::QuestionOrder, Order::Asc, NullOrdering::Last)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询问题列表失败: {e}")))?;

        Ok(result.into_iter().map(|m| m.into_question()).collect())
    }

    /// 通过 ID 获取问题
    pub async fn get_question_impl(&self, id: i64) -> Result<Option<Question>> {
        let result = Questions::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询问题失败: {e}")))?;

        Ok(result.map(|m| m.into_question()))
    }

    /// 创建问题
    pub async fn create_question_impl(&self, req: CreateQuestionRequest) -> Result<Question> {
        let txn = self.begin().await?;
        let result = create_question_in(&txn, req).await;
        let question = Self::finish(txn, result).await?;

        info!("问题 {} 已创建 (active = {})", question.id, question.active);
        Ok(question)
    }

    /// 更新问题
    pub async fn update_question_impl(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Question> {
        let txn = self.begin().await?;
        let result = update_question_in(&txn, id, update).await;
        let question = Self::finish(txn, result).await?;

        info!(
            "问题 {} 已更新 (active = {}, order = {:?})",
            question.id, question.active, question.order
        );
        Ok(question)
    }

    /// 删除问题：已有回答的问题只停用
    pub async fn remove_question_impl(&self, id: i64) -> Result<QuestionRemoval> {
        let txn = self.begin().await?;
        let result = remove_question_in(&txn, id).await;
        let removal = Self::finish(txn, result).await?;

        info!("问题 {} 已移除 (deleted = {})", id, removal.deleted);
        Ok(removal)
    }
}
