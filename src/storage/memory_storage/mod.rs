//! 进程内文档存储实现
//!
//! 所有集合放在一个 [`MemoryState`] 里，由一把异步互斥锁保护。
//! 写操作在状态的副本上执行，成功后整体替换；任何错误都会丢弃副本，
//! 等价于事务回滚。时间戳截断到秒，与关系型存储保持相同的排序结果。

mod catalog;
mod evaluations;
mod feedbacks;
mod questions;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::errors::Result;
use crate::models::{
    evaluations::entities::{Answer, Evaluation},
    feedbacks::entities::Feedback,
    questions::entities::Question,
    teachers::entities::{Class, Course, Teacher},
};

pub const PLUGIN_NAME: &str = "memory";
pub const URL_SCHEME: &str = "memory://";

/// 各集合的自增 ID
#[derive(Debug, Clone, Default)]
struct Sequences {
    teachers: i64,
    courses: i64,
    classes: i64,
    questions: i64,
    evaluations: i64,
    answers: i64,
    feedbacks: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// 当前时间（截断到秒）
fn now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    seq: Sequences,
    teachers: BTreeMap<i64, Teacher>,
    courses: BTreeMap<i64, Course>,
    classes: BTreeMap<i64, Class>,
    questions: BTreeMap<i64, Question>,
    evaluations: BTreeMap<i64, Evaluation>,
    answers: BTreeMap<i64, Answer>,
    feedbacks: BTreeMap<i64, Feedback>,
}

/// 进程内文档存储
#[derive(Default)]
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在状态副本上执行写操作，成功后替换
    async fn transact<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&mut MemoryState) -> Result<T>,
    {
        let mut guard = self.state.lock().await;
        let mut draft = guard.clone();
        let value = op(&mut draft)?;
        *guard = draft;
        Ok(value)
    }

    async fn read<T, F>(&self, op: F) -> T
    where
        F: FnOnce(&MemoryState) -> T,
    {
        let guard = self.state.lock().await;
        op(&guard)
    }
}

// Storage trait 实现
use crate::consistency::rating::{RatingAggregate, RatingChange};
use crate::models::{
    common::{Page, PageRequest},
    evaluations::{
        requests::{ClassTarget, EvaluationListQuery, EvaluationSubmission, ReviewEvaluationRequest},
        responses::{EvaluationDetails, EvaluationListResponse},
    },
    feedbacks::requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
    questions::{
        entities::QuestionRemoval,
        requests::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    teachers::requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for MemoryStorage {
    // 问题模块
    async fn list_questions(&self, active_only: bool) -> Result<Vec<Question>> {
        self.list_questions_impl(active_only).await
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        self.get_question_impl(id).await
    }

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question> {
        self.create_question_impl(req).await
    }

    async fn update_question(&self, id: i64, update: UpdateQuestionRequest) -> Result<Question> {
        self.update_question_impl(id, update).await
    }

    async fn remove_question(&self, id: i64) -> Result<QuestionRemoval> {
        self.remove_question_impl(id).await
    }

    // 教师与课程模块
    async fn create_teacher(&self, req: CreateTeacherRequest) -> Result<Teacher> {
        self.create_teacher_impl(req).await
    }

    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course> {
        self.create_course_impl(req).await
    }

    async fn create_class(&self, req: CreateClassRequest) -> Result<Class> {
        self.create_class_impl(req).await
    }

    async fn get_teacher(&self, id: i64) -> Result<Option<Teacher>> {
        self.get_teacher_impl(id).await
    }

    async fn resolve_class(&self, target: &ClassTarget) -> Result<Class> {
        self.resolve_class_impl(target).await
    }

    async fn list_teachers(&self, page: PageRequest) -> Result<Page<Teacher>> {
        self.list_teachers_impl(page).await
    }

    async fn apply_rating_change(
        &self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate> {
        self.apply_rating_change_impl(teacher_id, change).await
    }

    // 评价模块
    async fn create_evaluation(
        &self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation> {
        self.create_evaluation_impl(user_id, submission).await
    }

    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>> {
        self.get_evaluation_impl(id).await
    }

    async fn get_evaluation_details(&self, id: i64) -> Result<Option<EvaluationDetails>> {
        self.get_evaluation_details_impl(id).await
    }

    async fn review_evaluation(
        &self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        self.review_evaluation_impl(id, reviewer_id, review).await
    }

    async fn list_evaluations(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        self.list_evaluations_impl(query).await
    }

    // 反馈模块
    async fn create_feedback(&self, user_id: i64, req: CreateFeedbackRequest) -> Result<Feedback> {
        self.create_feedback_impl(user_id, req).await
    }

    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>> {
        self.get_feedback_impl(id).await
    }

    async fn update_feedback(&self, id: i64, update: UpdateFeedbackRequest) -> Result<Feedback> {
        self.update_feedback_impl(id, update).await
    }

    async fn delete_feedback(&self, id: i64) -> Result<Feedback> {
        self.delete_feedback_impl(id).await
    }

    async fn list_feedbacks(&self, query: FeedbackListQuery) -> Result<Page<Feedback>> {
        self.list_feedbacks_impl(query).await
    }
}
