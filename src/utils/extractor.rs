//! 路径参数提取器：校验 ID 为正整数，失败时返回统一的 400 响应

use actix_web::error::InternalError;
use actix_web::{HttpRequest, HttpResponse};

use crate::models::{ApiResponse, ErrorCode};

pub(crate) fn parse_positive_id(req: &HttpRequest, param: &str) -> Result<i64, actix_web::Error> {
    let raw = req.match_info().get(param).unwrap_or_default();
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => {
            let message = format!("Invalid path parameter '{param}': '{raw}'");
            let response = HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
            Err(InternalError::from_response(message, response).into())
        }
    }
}

macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = futures_util::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _payload: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                futures_util::future::ready(parse_positive_id(req, $param).map($name))
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    #[test]
    fn test_positive_id_is_accepted() {
        let req = TestRequest::default().param("id", "42").to_http_request();
        assert_eq!(parse_positive_id(&req, "id").unwrap(), 42);
    }

    #[test]
    fn test_invalid_ids_are_rejected() {
        for raw in ["0", "-3", "abc"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            let err = parse_positive_id(&req, "id").unwrap_err();
            assert_eq!(
                err.as_response_error().status_code(),
                StatusCode::BAD_REQUEST
            );
        }
    }
}
