use serde::Deserialize;

use super::entities::EvaluationStatus;
use crate::models::common::PageRequest;

/// 评价指向的开课
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClassTarget {
    /// 已解析的开课 ID
    Class { class_id: i64 },
    /// 教师 + 课程，解析为该组合最近学期的开课
    Pairing { teacher_id: i64, course_id: i64 },
}

// 单个问题的原始回答
#[derive(Debug, Clone, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub answer: String,
}

// 一条评价提交
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationSubmission {
    pub target: ClassTarget,
    pub answers: Vec<SubmittedAnswer>,
}

// 批量提交评价请求
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitEvaluationsRequest {
    pub evaluations: Vec<EvaluationSubmission>,
}

// 管理员修订回答
//
// `edited_answer = None` 表示撤销修订。
#[derive(Debug, Clone, Deserialize)]
pub struct AnswerEdit {
    pub question_id: i64,
    pub edited_answer: Option<String>,
}

// 管理员审核请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewEvaluationRequest {
    pub status: Option<EvaluationStatus>,
    #[serde(default)]
    pub answers: Vec<AnswerEdit>,
}

// 评价列表查询参数（用于存储层）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationListQuery {
    #[serde(flatten)]
    pub pagination: PageRequest,
    pub teacher_id: Option<i64>,
    pub course_id: Option<i64>,
    pub status: Option<EvaluationStatus>,
    pub semester: Option<String>,
}
