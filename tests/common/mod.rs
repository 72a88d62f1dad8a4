#![allow(dead_code)]

use std::sync::Arc;

use rust_evalsystem::config::DatabaseConfig;
use rust_evalsystem::models::evaluations::requests::{
    ClassTarget, EvaluationSubmission, SubmittedAnswer,
};
use rust_evalsystem::models::questions::{
    entities::{Question, QuestionType},
    requests::CreateQuestionRequest,
};
use rust_evalsystem::models::teachers::{
    entities::{Class, Course, Teacher},
    requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
};
use rust_evalsystem::storage::Storage;
use rust_evalsystem::storage::memory_storage::MemoryStorage;
use rust_evalsystem::storage::sea_orm_storage::SeaOrmStorage;

/// 两个存储适配器各一份全新实例
pub async fn adapters() -> Vec<(&'static str, Arc<dyn Storage>)> {
    let sea_orm = SeaOrmStorage::connect(&DatabaseConfig::with_url("sqlite::memory:"))
        .await
        .expect("in-memory sqlite should connect and migrate");
    vec![
        ("memory", Arc::new(MemoryStorage::new()) as Arc<dyn Storage>),
        ("sea_orm", Arc::new(sea_orm) as Arc<dyn Storage>),
    ]
}

pub struct Catalog {
    pub teacher: Teacher,
    pub course: Course,
    pub class: Class,
}

pub async fn seed_catalog(storage: &Arc<dyn Storage>, name: &str, code: &str) -> Catalog {
    let teacher = storage
        .create_teacher(CreateTeacherRequest { name: name.into() })
        .await
        .unwrap();
    let course = storage
        .create_course(CreateCourseRequest {
            name: format!("Course {code}"),
            code: code.into(),
        })
        .await
        .unwrap();
    let class = storage
        .create_class(CreateClassRequest {
            teacher_id: teacher.id,
            course_id: course.id,
            semester: "2025-1".into(),
        })
        .await
        .unwrap();
    Catalog {
        teacher,
        course,
        class,
    }
}

pub async fn text_question(storage: &Arc<dyn Storage>, text: &str, required: bool) -> Question {
    storage
        .create_question(CreateQuestionRequest {
            question: text.into(),
            question_type: QuestionType::Text,
            active: true,
            order: None,
            is_score: false,
            required,
        })
        .await
        .unwrap()
}

pub async fn score_question(storage: &Arc<dyn Storage>, text: &str, required: bool) -> Question {
    storage
        .create_question(CreateQuestionRequest {
            question: text.into(),
            question_type: QuestionType::Numeric,
            active: true,
            order: None,
            is_score: true,
            required,
        })
        .await
        .unwrap()
}

pub fn submission(class_id: i64, answers: &[(i64, &str)]) -> EvaluationSubmission {
    EvaluationSubmission {
        target: ClassTarget::Class { class_id },
        answers: answers
            .iter()
            .map(|(question_id, answer)| SubmittedAnswer {
                question_id: *question_id,
                answer: answer.to_string(),
            })
            .collect(),
    }
}

/// 启用问题按列出顺序的 (id, order)
pub async fn active_orders(storage: &Arc<dyn Storage>) -> Vec<(i64, i32)> {
    storage
        .list_questions(true)
        .await
        .unwrap()
        .into_iter()
        .map(|q| (q.id, q.order.expect("active question must carry an order")))
        .collect()
}
