use serde::Deserialize;

use super::entities::QuestionType;
use crate::errors::{EvalSystemError, Result};

// 创建问题请求
//
// `order` 是期望位置提示，仅对启用的问题生效；缺省时排在末尾。
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub question: String,
    pub question_type: QuestionType,
    pub active: bool,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub is_score: bool,
    #[serde(default)]
    pub required: bool,
}

// 更新问题请求（字段缺省表示保持不变）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuestionRequest {
    pub question: Option<String>,
    pub question_type: Option<QuestionType>,
    pub active: Option<bool>,
    pub order: Option<i32>,
    pub is_score: Option<bool>,
    pub required: Option<bool>,
}

/// 问题写入前的字段规则，存储层在事务内对合并后的结果调用
pub fn check_question_fields(
    question_type: QuestionType,
    is_score: bool,
    order_hint: Option<i32>,
) -> Result<()> {
    if is_score && question_type != QuestionType::Numeric {
        return Err(EvalSystemError::validation(
            "Score questions (is_score) must be of type 'numeric'",
        ));
    }
    if let Some(order) = order_hint {
        if order < 1 {
            return Err(EvalSystemError::validation(format!(
                "Question order must be a positive integer, got {order}"
            )));
        }
    }
    Ok(())
}
