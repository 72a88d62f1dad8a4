use serde::Deserialize;

use crate::errors::{EvalSystemError, Result};
use crate::models::common::PageRequest;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

// 创建反馈请求
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedbackRequest {
    pub teacher_id: i64,
    pub course_id: i64,
    pub rating: f64,
    #[serde(default)]
    pub positive_aspects: Option<String>,
    #[serde(default)]
    pub negative_aspects: Option<String>,
    #[serde(default)]
    pub additional_comments: Option<String>,
}

// 更新反馈请求（字段缺省表示保持不变）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateFeedbackRequest {
    pub rating: Option<f64>,
    pub positive_aspects: Option<String>,
    pub negative_aspects: Option<String>,
    pub additional_comments: Option<String>,
}

// 反馈列表查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackListQuery {
    #[serde(flatten)]
    pub pagination: PageRequest,
    pub teacher_id: Option<i64>,
    pub course_id: Option<i64>,
    #[serde(skip)]
    pub user_id: Option<i64>,
}

/// 评分必须是 1 到 5 之间的有限数
pub fn check_rating(rating: f64) -> Result<()> {
    if !rating.is_finite() || !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(EvalSystemError::validation(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(())
}

impl CreateFeedbackRequest {
    pub fn validate(&self) -> Result<()> {
        check_rating(self.rating)
    }
}

impl UpdateFeedbackRequest {
    pub fn validate(&self) -> Result<()> {
        match self.rating {
            Some(rating) => check_rating(rating),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        assert!(check_rating(1.0).is_ok());
        assert!(check_rating(4.5).is_ok());
        assert!(check_rating(0.5).is_err());
        assert!(check_rating(5.5).is_err());
        assert!(check_rating(f64::NAN).is_err());
        assert!(check_rating(f64::INFINITY).is_err());
    }

    #[test]
    fn test_update_without_rating_is_valid() {
        assert!(UpdateFeedbackRequest::default().validate().is_ok());
    }
}
