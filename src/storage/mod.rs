//! 存储端口
//!
//! 核心层只依赖 [`Storage`] trait。两个适配器：
//! - `sea_orm_storage`：关系型数据库（SQLite / PostgreSQL / MySQL），显式事务 + 行锁 + CAS；
//! - `memory_storage`：进程内文档存储，单个异步互斥锁串行化写入，事务为复制-修改-替换。
//!
//! 每个写操作在适配器内部是一个完整的事务：要么全部提交，要么全部回滚。

use std::sync::Arc;

use crate::config::DatabaseConfig;
use crate::consistency::rating::{RatingAggregate, RatingChange};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, PageRequest},
    evaluations::{
        entities::Evaluation,
        requests::{ClassTarget, EvaluationListQuery, EvaluationSubmission, ReviewEvaluationRequest},
        responses::{EvaluationDetails, EvaluationListResponse},
    },
    feedbacks::{
        entities::Feedback,
        requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
    },
    questions::{
        entities::{Question, QuestionRemoval},
        requests::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    teachers::{
        entities::{Class, Course, Teacher},
        requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
    },
};

pub mod memory_storage;
pub mod register;
pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 问题管理方法（写操作会在同一事务内重排启用问题）
    // 列出问题：启用的按 order 排序；全部问题时启用的在前
    async fn list_questions(&self, active_only: bool) -> Result<Vec<Question>>;
    // 通过ID获取问题
    async fn get_question(&self, id: i64) -> Result<Option<Question>>;
    // 创建问题
    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question>;
    // 更新问题（启用/停用/调整位置）
    async fn update_question(&self, id: i64, update: UpdateQuestionRequest) -> Result<Question>;
    // 删除问题：已有回答时只停用
    async fn remove_question(&self, id: i64) -> Result<QuestionRemoval>;

    /// 教师、课程与开课
    async fn create_teacher(&self, req: CreateTeacherRequest) -> Result<Teacher>;
    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course>;
    async fn create_class(&self, req: CreateClassRequest) -> Result<Class>;
    async fn get_teacher(&self, id: i64) -> Result<Option<Teacher>>;
    // 解析开课引用，教师+课程取最近学期
    async fn resolve_class(&self, target: &ClassTarget) -> Result<Class>;
    // 按姓名列出教师（文档游标分页）
    async fn list_teachers(&self, page: PageRequest) -> Result<Page<Teacher>>;
    // 原子地推进一位教师的评分聚合
    async fn apply_rating_change(
        &self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate>;

    /// 评价管理方法
    // 校验并写入一条评价及其全部回答
    async fn create_evaluation(
        &self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation>;
    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>>;
    async fn get_evaluation_details(&self, id: i64) -> Result<Option<EvaluationDetails>>;
    // 审核：状态流转与回答修订在同一事务内
    async fn review_evaluation(
        &self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation>;
    // 偏移分页列出评价，附带筛选范围内的平均分
    async fn list_evaluations(&self, query: EvaluationListQuery)
    -> Result<EvaluationListResponse>;

    /// 反馈管理方法（每次写入同时推进教师评分）
    async fn create_feedback(&self, user_id: i64, req: CreateFeedbackRequest) -> Result<Feedback>;
    // 只返回未删除的反馈
    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>>;
    async fn update_feedback(&self, id: i64, update: UpdateFeedbackRequest) -> Result<Feedback>;
    // 软删除
    async fn delete_feedback(&self, id: i64) -> Result<Feedback>;
    // 按创建时间倒序列出（文档游标分页）
    async fn list_feedbacks(&self, query: FeedbackListQuery) -> Result<Page<Feedback>>;
}

/// 从数据库 URL 推断存储后端名称
pub fn backend_for_url(url: &str) -> &'static str {
    if url.starts_with(memory_storage::URL_SCHEME) {
        memory_storage::PLUGIN_NAME
    } else {
        sea_orm_storage::PLUGIN_NAME
    }
}

/// 按配置构造存储实例
pub async fn create_storage(config: &DatabaseConfig) -> Result<Arc<dyn Storage>> {
    let backend = backend_for_url(&config.url);
    let constructor = register::get_storage_plugin(backend).ok_or_else(|| {
        EvalSystemError::storage_plugin_not_found(format!(
            "No storage plugin registered for backend '{backend}'"
        ))
    })?;
    constructor(config.clone()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_selection() {
        assert_eq!(backend_for_url("memory://"), "memory");
        assert_eq!(backend_for_url("memory://tests"), "memory");
        assert_eq!(backend_for_url("sqlite::memory:"), "sea_orm");
        assert_eq!(backend_for_url("evalsystem.db"), "sea_orm");
        assert_eq!(backend_for_url("postgres://localhost/eval"), "sea_orm");
    }
}
