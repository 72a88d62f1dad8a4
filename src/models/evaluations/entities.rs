use serde::{Deserialize, Serialize};

use crate::errors::{EvalSystemError, Result};

// 评价状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Pending,  // 待审核
    Approved, // 已通过
    Rejected, // 已驳回
}

impl EvaluationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, EvaluationStatus::Pending)
    }

    /// 审核状态流转：只允许 pending → approved / rejected
    pub fn transition_to(self, target: EvaluationStatus) -> Result<EvaluationStatus> {
        if target == EvaluationStatus::Pending {
            return Err(EvalSystemError::validation(
                "An evaluation cannot be moved back to pending",
            ));
        }
        if self.is_terminal() {
            return Err(EvalSystemError::conflict(format!(
                "Evaluation is already {self} and cannot become {target}"
            )));
        }
        Ok(target)
    }
}

impl std::fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "pending"),
            EvaluationStatus::Approved => write!(f, "approved"),
            EvaluationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for EvaluationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EvaluationStatus::Pending),
            "approved" => Ok(EvaluationStatus::Approved),
            "rejected" => Ok(EvaluationStatus::Rejected),
            _ => Err(format!("Invalid evaluation status: {s}")),
        }
    }
}

// 评价实体
//
// `approved_by` 当且仅当 status = approved 时有值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub id: i64,
    pub user_id: i64,
    pub class_id: i64,
    pub score: Option<f64>,
    pub status: EvaluationStatus,
    pub approved_by: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 回答实体
//
// `answer` 是原始回答，永不改写；管理员修订写入 `edited_answer` / `edited_by`，二者同时有值或同时为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub evaluation_id: i64,
    pub question_id: i64,
    pub order: i32,
    pub answer: String,
    pub edited_answer: Option<String>,
    pub edited_by: Option<i64>,
}

impl Answer {
    /// 读取方优先使用修订后的回答
    pub fn effective_answer(&self) -> &str {
        self.edited_answer.as_deref().unwrap_or(&self.answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_transitions() {
        use EvaluationStatus::*;
        assert_eq!(Pending.transition_to(Approved).unwrap(), Approved);
        assert_eq!(Pending.transition_to(Rejected).unwrap(), Rejected);

        let err = Approved.transition_to(Rejected).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Conflict);
        let err = Rejected.transition_to(Approved).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Conflict);

        let err = Pending.transition_to(Pending).unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::Validation);
    }

    #[test]
    fn test_effective_answer_prefers_edit() {
        let mut answer = Answer {
            id: 1,
            evaluation_id: 1,
            question_id: 1,
            order: 1,
            answer: "original".into(),
            edited_answer: None,
            edited_by: None,
        };
        assert_eq!(answer.effective_answer(), "original");
        answer.edited_answer = Some("fixed".into());
        answer.edited_by = Some(9);
        assert_eq!(answer.effective_answer(), "fixed");
        assert_eq!(answer.answer, "original");
    }
}
