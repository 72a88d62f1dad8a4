use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result as ActixResult};
use serde::Serialize;
use tracing::error;

use crate::errors::{ErrorKind, EvalSystemError, Result};
use crate::models::ApiResponse;

/// 核心层错误对应的 HTTP 状态码
pub fn status_for(err: &EvalSystemError) -> StatusCode {
    match err.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Forbidden if matches!(err, EvalSystemError::Authentication(_)) => {
            StatusCode::UNAUTHORIZED
        }
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn error_response(err: &EvalSystemError) -> HttpResponse {
    let status = status_for(err);
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Request failed: {}", err);
    }
    HttpResponse::build(status).json(ApiResponse::from_error(err))
}

/// 把服务层结果包装成统一响应
pub fn respond<T: Serialize>(
    result: Result<T>,
    status: StatusCode,
    message: &str,
) -> ActixResult<HttpResponse> {
    Ok(match result {
        Ok(data) => HttpResponse::build(status).json(ApiResponse::success(data, message)),
        Err(e) => error_response(&e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&EvalSystemError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&EvalSystemError::conflict("x")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&EvalSystemError::authorization("x")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_for(&EvalSystemError::authentication("x")),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_for(&EvalSystemError::database_operation("x")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
