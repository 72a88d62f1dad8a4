//! HTTP 路由层
//!
//! 处理程序只负责提取参数与身份、调用服务，再把结果包装成 [`ApiResponse`](crate::models::ApiResponse)。

/// 从请求扩展中取出调用方身份，失败时直接返回 401
macro_rules! require_identity {
    ($req:expr) => {
        match $crate::middlewares::RequireJWT::extract_identity(&$req) {
            Ok(identity) => identity,
            Err(e) => return Ok($crate::utils::response::error_response(&e)),
        }
    };
}

pub mod evaluations;
pub mod feedbacks;
pub mod questions;
pub mod teachers;

pub use evaluations::configure_evaluation_routes;
pub use feedbacks::configure_feedback_routes;
pub use questions::configure_question_routes;
pub use teachers::configure_teacher_routes;
