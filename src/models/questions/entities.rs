use serde::{Deserialize, Serialize};

// 问题类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Numeric, // 数值题
    Text,    // 文本题
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuestionType::Numeric => write!(f, "numeric"),
            QuestionType::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "numeric" => Ok(QuestionType::Numeric),
            "text" => Ok(QuestionType::Text),
            _ => Err(format!("Invalid question type: {s}")),
        }
    }
}

// 问题实体
//
// 启用的问题 order 恰好构成 1..=N；停用的问题 order 一定为 None。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub question_type: QuestionType,
    pub active: bool,
    pub order: Option<i32>,
    pub is_score: bool,
    pub required: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 公开表单中展示的问题
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_type: QuestionType,
    pub question: String,
    pub required: bool,
    pub order: i32,
}

impl Question {
    pub fn to_public(&self) -> Option<PublicQuestion> {
        if !self.active {
            return None;
        }
        Some(PublicQuestion {
            id: self.id,
            question_type: self.question_type,
            question: self.question.clone(),
            required: self.required,
            order: self.order?,
        })
    }
}

/// 删除问题的结果：`deleted = false` 表示问题已有回答，只做了停用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionRemoval {
    pub deleted: bool,
}
