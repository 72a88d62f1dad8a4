//! 问题文档操作

use std::cmp::Ordering;

use super::{MemoryState, MemoryStorage, next_id, now};
use crate::consistency::ordering::{RankedQuestion, resequence};
use crate::errors::{EvalSystemError, Result};
use crate::models::questions::{
    entities::{Question, QuestionRemoval},
    requests::{CreateQuestionRequest, UpdateQuestionRequest, check_question_fields},
};
use tracing::{debug, info};

/// 启用的在前，然后按 order 升序（None 最后），最后按 id
fn listing_order(a: &Question, b: &Question) -> Ordering {
    let by_order = match (a.order, b.order) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    b.active
        .cmp(&a.active)
        .then(by_order)
        .then_with(|| a.id.cmp(&b.id))
}

impl MemoryState {
    fn question_mut(&mut self, id: i64) -> Result<&mut Question> {
        self.questions
            .get_mut(&id)
            .ok_or_else(|| EvalSystemError::not_found(format!("Question {id} not found")))
    }

    fn resequence_active(&mut self, priority: Option<i64>) {
        let ranked: Vec<RankedQuestion> = self
            .questions
            .values()
            .filter(|q| q.active)
            .map(|q| RankedQuestion {
                id: q.id,
                order: q.order,
            })
            .collect();
        let changes = resequence(&ranked, priority);
        debug!(
            "重排 {} 个启用问题，需要写回 {} 条",
            ranked.len(),
            changes.len()
        );

        for change in changes {
            if let Some(q) = self.questions.get_mut(&change.id) {
                q.order = Some(change.order);
            }
        }
    }

    pub(super) fn active_questions(&self) -> Vec<Question> {
        self.questions
            .values()
            .filter(|q| q.active)
            .cloned()
            .collect()
    }

    fn create_question(&mut self, req: CreateQuestionRequest) -> Result<Question> {
        let hint = if req.active { req.order } else { None };
        check_question_fields(req.question_type, req.is_score, hint)?;

        let id = next_id(&mut self.seq.questions);
        let now = now();
        self.questions.insert(
            id,
            Question {
                id,
                question: req.question,
                question_type: req.question_type,
                active: req.active,
                order: hint,
                is_score: req.is_score,
                required: req.required,
                created_at: now,
                updated_at: now,
            },
        );

        if req.active {
            self.resequence_active(Some(id));
        }
        Ok(self.question_mut(id)?.clone())
    }

    fn update_question(&mut self, id: i64, update: UpdateQuestionRequest) -> Result<Question> {
        let question = self.question_mut(id)?;

        let question_type = update.question_type.unwrap_or(question.question_type);
        let is_score = update.is_score.unwrap_or(question.is_score);
        let active = update.active.unwrap_or(question.active);
        let hint = if active { update.order } else { None };
        check_question_fields(question_type, is_score, hint)?;

        // 停用清空 order；重新启用且没有位置提示时排到末尾
        let order = match (active, hint) {
            (false, _) => None,
            (true, Some(hint)) => Some(hint),
            (true, None) if question.active => question.order,
            (true, None) => None,
        };

        if let Some(text) = update.question {
            question.question = text;
        }
        if let Some(required) = update.required {
            question.required = required;
        }
        question.question_type = question_type;
        question.is_score = is_score;
        question.active = active;
        question.order = order;
        question.updated_at = now();

        self.resequence_active(Some(id));
        Ok(self.question_mut(id)?.clone())
    }

    fn remove_question(&mut self, id: i64) -> Result<QuestionRemoval> {
        self.question_mut(id)?;

        let answered = self.answers.values().any(|a| a.question_id == id);
        let removal = if answered {
            let question = self.question_mut(id)?;
            question.active = false;
            question.order = None;
            question.updated_at = now();
            QuestionRemoval { deleted: false }
        } else {
            self.questions.remove(&id);
            QuestionRemoval { deleted: true }
        };

        self.resequence_active(None);
        Ok(removal)
    }
}

impl MemoryStorage {
    pub async fn list_questions_impl(&self, active_only: bool) -> Result<Vec<Question>> {
        Ok(self
            .read(|state| {
                let mut questions: Vec<Question> = state
                    .questions
                    .values()
                    .filter(|q| !active_only || q.active)
                    .cloned()
                    .collect();
                questions.sort_by(listing_order);
                questions
            })
            .await)
    }

    pub async fn get_question_impl(&self, id: i64) -> Result<Option<Question>> {
        Ok(self.read(|state| state.questions.get(&id).cloned()).await)
    }

    pub async fn create_question_impl(&self, req: CreateQuestionRequest) -> Result<Question> {
        let question = self.transact(|state| state.create_question(req)).await?;
        info!("问题 {} 已创建 (active = {})", question.id, question.active);
        Ok(question)
    }

    pub async fn update_question_impl(
        &self,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Question> {
        let question = self
            .transact(|state| state.update_question(id, update))
            .await?;
        info!(
            "问题 {} 已更新 (active = {}, order = {:?})",
            question.id, question.active, question.order
        );
        Ok(question)
    }

    pub async fn remove_question_impl(&self, id: i64) -> Result<QuestionRemoval> {
        let removal = self.transact(|state| state.remove_question(id)).await?;
        info!("问题 {} 已移除 (deleted = {})", id, removal.deleted);
        Ok(removal)
    }
}
