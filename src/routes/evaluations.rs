use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::evaluations::requests::{
    EvaluationListQuery, ReviewEvaluationRequest, SubmitEvaluationsRequest,
};
use crate::services::EvaluationService;
use crate::storage::Storage;
use crate::utils::{SafeIDI64, respond};

// HTTP处理程序
pub async fn submit_evaluations(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    submission: web::Json<SubmitEvaluationsRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = EvaluationService::new(storage.get_ref().clone());
    let result = service.submit(&identity, submission.into_inner()).await;

    // 部分失败时返回 207，由调用方按 index 对照
    let status = match &result {
        Ok(report) if report.created.is_empty() => StatusCode::UNPROCESSABLE_ENTITY,
        Ok(report) if !report.is_complete() => StatusCode::MULTI_STATUS,
        _ => StatusCode::CREATED,
    };
    respond(result, status, "Evaluations processed")
}

pub async fn list_public_answers(
    storage: web::Data<Arc<dyn Storage>>,
    query: web::Query<EvaluationListQuery>,
) -> ActixResult<HttpResponse> {
    let service = EvaluationService::new(storage.get_ref().clone());
    respond(
        service.list_public(query.into_inner()).await,
        StatusCode::OK,
        "Evaluations retrieved successfully",
    )
}

pub async fn get_public_answer(
    storage: web::Data<Arc<dyn Storage>>,
    evaluation_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let service = EvaluationService::new(storage.get_ref().clone());
    respond(
        service.public_details(evaluation_id.0).await,
        StatusCode::OK,
        "Evaluation retrieved successfully",
    )
}

pub async fn list_admin_answers(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    query: web::Query<EvaluationListQuery>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = EvaluationService::new(storage.get_ref().clone());
    respond(
        service.list_admin(&identity, query.into_inner()).await,
        StatusCode::OK,
        "Evaluations retrieved successfully",
    )
}

pub async fn get_admin_answer(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    evaluation_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = EvaluationService::new(storage.get_ref().clone());
    respond(
        service.admin_details(&identity, evaluation_id.0).await,
        StatusCode::OK,
        "Evaluation retrieved successfully",
    )
}

pub async fn review_answer(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    evaluation_id: SafeIDI64,
    review: web::Json<ReviewEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = EvaluationService::new(storage.get_ref().clone());
    respond(
        service
            .review(&identity, evaluation_id.0, review.into_inner())
            .await,
        StatusCode::OK,
        "Evaluation reviewed successfully",
    )
}

// 配置路由
pub fn configure_evaluation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/evaluations")
            .route(web::post().to(submit_evaluations).wrap(middlewares::RequireJWT)),
    );

    // 公开结果：只含已通过的评价
    cfg.service(
        web::scope("/api/answers")
            .service(web::resource("").route(web::get().to(list_public_answers)))
            .service(web::resource("/{id}").route(web::get().to(get_public_answer))),
    );

    cfg.service(
        web::scope("/api/admin/answers")
            .wrap(middlewares::RequireJWT)
            .service(web::resource("").route(web::get().to(list_admin_answers)))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_admin_answer))
                    .route(web::put().to(review_answer)),
            ),
    );
}
