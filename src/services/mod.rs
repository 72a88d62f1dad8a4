//! 业务服务层
//!
//! 服务只依赖 [`Storage`](crate::storage::Storage) 端口与调用方 [`Identity`](crate::models::users::entities::Identity)，
//! 负责权限校验、请求级校验和日志；一致性规则在存储层的事务内执行。

pub mod evaluations;
pub mod feedbacks;
pub mod questions;
pub mod teachers;

pub use evaluations::EvaluationService;
pub use feedbacks::FeedbackService;
pub use questions::QuestionService;
pub use teachers::TeacherService;
