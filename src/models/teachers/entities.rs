use serde::{Deserialize, Serialize};

use crate::consistency::rating::RatingAggregate;

// 教师（评分聚合行）
//
// `rating_count == 0` 时 `rating` 固定为 0.0，没有意义。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: i64,
    pub name: String,
    pub rating: f64,
    pub rating_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Teacher {
    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate::new(self.rating, self.rating_count)
    }
}

// 课程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub code: String,
}

// 开课：教师 + 课程 + 学期，评价挂在开课上
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub teacher_id: i64,
    pub course_id: i64,
    pub semester: String,
}
