//! 问题实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "questions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "Text")]
    pub question: String,
    pub question_type: String,
    pub active: bool,
    pub question_order: Option<i32>,
    pub is_score: bool,
    pub required: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::answers::Entity")]
    Answers,
}

impl Related<super::answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Answers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// 从数据库模型转换为业务模型
impl Model {
    pub fn into_question(self) -> crate::models::questions::entities::Question {
        use crate::models::questions::entities::{Question, QuestionType};
        use chrono::{DateTime, Utc};

        Question {
            id: self.id,
            question: self.question,
            question_type: self.question_type.parse().unwrap_or(QuestionType::Text),
            active: self.active,
            order: self.question_order,
            is_score: self.is_score,
            required: self.required,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }

    pub fn ranked(&self) -> crate::consistency::ordering::RankedQuestion {
        crate::consistency::ordering::RankedQuestion {
            id: self.id,
            order: self.question_order,
        }
    }
}
