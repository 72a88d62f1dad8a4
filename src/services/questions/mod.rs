use std::sync::Arc;

use tracing::info;

use crate::errors::{EvalSystemError, Result};
use crate::models::questions::{
    entities::{PublicQuestion, Question, QuestionRemoval},
    requests::{CreateQuestionRequest, UpdateQuestionRequest},
};
use crate::models::users::entities::Identity;
use crate::storage::Storage;

pub struct QuestionService {
    storage: Arc<dyn Storage>,
}

impl QuestionService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // 公开表单：启用的问题，按 order 排序
    pub async fn list_active(&self) -> Result<Vec<PublicQuestion>> {
        let questions = self.storage.list_questions(true).await?;
        Ok(questions.iter().filter_map(Question::to_public).collect())
    }

    // 管理员查看全部问题
    pub async fn list_all(&self, identity: &Identity) -> Result<Vec<Question>> {
        identity.require_admin("list all questions")?;
        self.storage.list_questions(false).await
    }

    pub async fn create(&self, identity: &Identity, req: CreateQuestionRequest) -> Result<Question> {
        identity.require_admin("create questions")?;
        check_question_text(Some(&req.question))?;

        let question = self.storage.create_question(req).await?;
        info!(
            "Question {} created by {} (active: {}, order: {:?})",
            question.id, identity.user_id, question.active, question.order
        );
        Ok(question)
    }

    pub async fn update(
        &self,
        identity: &Identity,
        id: i64,
        update: UpdateQuestionRequest,
    ) -> Result<Question> {
        identity.require_admin("update questions")?;
        check_question_text(update.question.as_deref())?;

        let question = self.storage.update_question(id, update).await?;
        info!(
            "Question {} updated by {} (active: {}, order: {:?})",
            question.id, identity.user_id, question.active, question.order
        );
        Ok(question)
    }

    // 已有回答的问题只会被停用
    pub async fn remove(&self, identity: &Identity, id: i64) -> Result<QuestionRemoval> {
        identity.require_admin("delete questions")?;

        let removal = self.storage.remove_question(id).await?;
        if removal.deleted {
            info!("Question {} deleted by {}", id, identity.user_id);
        } else {
            info!(
                "Question {} has answers, deactivated instead of deleted by {}",
                id, identity.user_id
            );
        }
        Ok(removal)
    }
}

fn check_question_text(text: Option<&str>) -> Result<()> {
    match text {
        Some(text) if text.trim().is_empty() => Err(EvalSystemError::validation(
            "Question text must not be empty",
        )),
        _ => Ok(()),
    }
}
