//! 反馈实体（软删除）

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "feedbacks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub teacher_id: i64,
    pub course_id: i64,
    pub rating: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub positive_aspects: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub negative_aspects: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_comments: Option<String>,
    pub deleted: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::teachers::Entity",
        from = "Column::TeacherId",
        to = "super::teachers::Column::Id"
    )]
    Teacher,
}

impl Related<super::teachers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_feedback(self) -> crate::models::feedbacks::entities::Feedback {
        use crate::models::feedbacks::entities::Feedback;
        use chrono::{DateTime, Utc};

        Feedback {
            id: self.id,
            user_id: self.user_id,
            teacher_id: self.teacher_id,
            course_id: self.course_id,
            rating: self.rating,
            positive_aspects: self.positive_aspects,
            negative_aspects: self.negative_aspects,
            additional_comments: self.additional_comments,
            deleted: self.deleted,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
            deleted_at: self
                .deleted_at
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
        }
    }
}
