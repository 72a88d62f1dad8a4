//! 评价提交的回答校验与得分
//!
//! 在写入任何行之前，对照当前启用的问题集合检查一条提交，
//! 并算出每条回答要落库的 order 以及评价得分。

use std::collections::{HashMap, HashSet};

use crate::errors::{EvalSystemError, Result};
use crate::models::evaluations::requests::SubmittedAnswer;
use crate::models::questions::entities::Question;

/// 校验通过、待写入的回答
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedAnswer {
    pub question_id: i64,
    pub order: i32,
    pub answer: String,
}

/// 校验通过的提交
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSubmission {
    pub answers: Vec<PreparedAnswer>,
    /// 计分题的平均分；没有计分题回答时为 None
    pub score: Option<f64>,
}

/// 对照启用问题校验回答并计算得分
///
/// `questions` 可以包含停用的问题，它们会被当作不可回答。
pub fn prepare_submission(
    questions: &[Question],
    answers: &[SubmittedAnswer],
) -> Result<PreparedSubmission> {
    let active: HashMap<i64, &Question> = questions
        .iter()
        .filter(|q| q.active)
        .map(|q| (q.id, q))
        .collect();

    let mut seen = HashSet::new();
    let mut prepared = Vec::with_capacity(answers.len());
    let mut scores = Vec::new();

    for ans in answers {
        if !seen.insert(ans.question_id) {
            return Err(EvalSystemError::validation(format!(
                "Question {} is answered more than once",
                ans.question_id
            )));
        }

        let (question, order) = match active.get(&ans.question_id) {
            Some(q) => match q.order {
                Some(order) => (*q, order),
                None => {
                    return Err(EvalSystemError::validation(format!(
                        "Question {} is not active",
                        ans.question_id
                    )));
                }
            },
            None => {
                return Err(EvalSystemError::validation(format!(
                    "Question {} does not exist or is not active",
                    ans.question_id
                )));
            }
        };

        if question.is_score {
            scores.push(parse_score(question.id, &ans.answer)?);
        }

        prepared.push(PreparedAnswer {
            question_id: question.id,
            order,
            answer: ans.answer.clone(),
        });
    }

    let mut missing: Vec<i64> = active
        .values()
        .filter(|q| q.required && !seen.contains(&q.id))
        .map(|q| q.id)
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        return Err(EvalSystemError::validation(format!(
            "Required questions are not answered: {missing:?}"
        )));
    }

    Ok(PreparedSubmission {
        answers: prepared,
        score: mean(&scores),
    })
}

fn parse_score(question_id: i64, raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(EvalSystemError::validation(format!(
            "Invalid score for question {question_id}: '{raw}'"
        ))),
    }
}

/// 算术平均，空集合为 None
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::models::questions::entities::QuestionType;

    fn question(id: i64, order: Option<i32>, is_score: bool, required: bool) -> Question {
        Question {
            id,
            question: format!("Q{id}"),
            question_type: if is_score {
                QuestionType::Numeric
            } else {
                QuestionType::Text
            },
            active: order.is_some(),
            order,
            is_score,
            required,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    fn answer(question_id: i64, text: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            answer: text.to_string(),
        }
    }

    fn form() -> Vec<Question> {
        vec![
            question(1, Some(1), true, true),
            question(2, Some(2), true, false),
            question(3, Some(3), false, false),
            question(4, None, true, false),
        ]
    }

    #[test]
    fn test_score_is_mean_of_score_answers() {
        let prepared = prepare_submission(
            &form(),
            &[answer(1, "4"), answer(2, " 5 "), answer(3, "great")],
        )
        .unwrap();
        assert_eq!(prepared.score, Some(4.5));
        assert_eq!(
            prepared.answers.iter().map(|a| a.order).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        // 原始回答不做裁剪
        assert_eq!(prepared.answers[1].answer, " 5 ");
    }

    #[test]
    fn test_no_score_answers_gives_null_score() {
        let questions = vec![question(3, Some(1), false, false)];
        let prepared = prepare_submission(&questions, &[answer(3, "ok")]).unwrap();
        assert_eq!(prepared.score, None);
    }

    #[test]
    fn test_rejects_inactive_unknown_and_duplicate() {
        let err = prepare_submission(&form(), &[answer(1, "3"), answer(4, "3")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = prepare_submission(&form(), &[answer(1, "3"), answer(99, "3")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = prepare_submission(&form(), &[answer(1, "3"), answer(1, "4")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_rejects_non_numeric_score() {
        for bad in ["abc", "", "NaN", "inf"] {
            let err = prepare_submission(&form(), &[answer(1, bad)]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "input {bad:?}");
        }
    }

    #[test]
    fn test_required_question_must_be_answered() {
        let err = prepare_submission(&form(), &[answer(2, "3")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("[1]"));
    }
}
