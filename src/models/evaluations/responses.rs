use serde::Serialize;

use super::entities::{Answer, EvaluationStatus};
use crate::models::common::Page;
use crate::models::questions::entities::QuestionType;

/// 批量提交中成功写入的评价
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedEvaluation {
    pub index: usize,
    pub evaluation_id: i64,
    pub score: Option<f64>,
}

/// 批量提交中失败的评价（已整体回滚）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSubmission {
    pub index: usize,
    pub code: &'static str,
    pub message: String,
}

/// 批量提交结果：每条提交独立成功或失败
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub created: Vec<CreatedEvaluation>,
    pub failed: Vec<FailedSubmission>,
}

impl SubmissionReport {
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failed.iter().map(|f| f.index).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// 评价列表项（带教师与课程信息）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationSummary {
    pub evaluation_id: i64,
    pub class_id: i64,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub course_id: i64,
    pub course_name: String,
    pub course_code: String,
    pub semester: String,
    pub status: EvaluationStatus,
    pub score: Option<f64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 评价列表响应，附带筛选范围内所有已打分评价的平均分
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationListResponse {
    #[serde(flatten)]
    pub page: Page<EvaluationSummary>,
    pub overall_score: Option<f64>,
}

/// 回答详情（管理员视角，原始回答与修订并存）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub question: String,
    pub order: i32,
    pub answer: String,
    pub edited_answer: Option<String>,
    pub edited_by: Option<i64>,
}

impl AnswerDetail {
    pub fn from_answer(answer: Answer, question_type: QuestionType, question: String) -> Self {
        Self {
            question_id: answer.question_id,
            question_type,
            question,
            order: answer.order,
            answer: answer.answer,
            edited_answer: answer.edited_answer,
            edited_by: answer.edited_by,
        }
    }
}

/// 评价详情（管理员视角）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationDetails {
    #[serde(flatten)]
    pub summary: EvaluationSummary,
    pub user_id: i64,
    pub approved_by: Option<i64>,
    pub answers: Vec<AnswerDetail>,
}

/// 公开回答：只给出生效的回答
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicAnswerDetail {
    pub question_id: i64,
    pub question_type: QuestionType,
    pub question: String,
    pub answer: String,
}

/// 评价详情（公开视角，仅已通过的评价）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicEvaluationDetails {
    #[serde(flatten)]
    pub summary: EvaluationSummary,
    pub answers: Vec<PublicAnswerDetail>,
}

impl From<EvaluationDetails> for PublicEvaluationDetails {
    fn from(details: EvaluationDetails) -> Self {
        Self {
            summary: details.summary,
            answers: details
                .answers
                .into_iter()
                .map(|a| PublicAnswerDetail {
                    question_id: a.question_id,
                    question_type: a.question_type,
                    question: a.question,
                    answer: a.edited_answer.unwrap_or(a.answer),
                })
                .collect(),
        }
    }
}
