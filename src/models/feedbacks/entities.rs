use serde::{Deserialize, Serialize};

// 反馈实体
//
// 软删除的反馈不参与评分聚合，也不参与重复提交检查。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: i64,
    pub user_id: i64,
    pub teacher_id: i64,
    pub course_id: i64,
    pub rating: f64,
    pub positive_aspects: Option<String>,
    pub negative_aspects: Option<String>,
    pub additional_comments: Option<String>,
    pub deleted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}
