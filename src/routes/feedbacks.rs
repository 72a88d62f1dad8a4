use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::feedbacks::requests::{
    CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest,
};
use crate::services::FeedbackService;
use crate::storage::Storage;
use crate::utils::{SafeIDI64, respond};

// HTTP处理程序
pub async fn list_feedbacks(
    storage: web::Data<Arc<dyn Storage>>,
    query: web::Query<FeedbackListQuery>,
) -> ActixResult<HttpResponse> {
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service.list(query.into_inner()).await,
        StatusCode::OK,
        "Feedbacks retrieved successfully",
    )
}

pub async fn list_my_feedbacks(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    query: web::Query<FeedbackListQuery>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service.list_mine(&identity, query.into_inner()).await,
        StatusCode::OK,
        "Feedbacks retrieved successfully",
    )
}

pub async fn create_feedback(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    feedback_data: web::Json<CreateFeedbackRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service.create(&identity, feedback_data.into_inner()).await,
        StatusCode::CREATED,
        "Feedback created successfully",
    )
}

pub async fn get_feedback(
    storage: web::Data<Arc<dyn Storage>>,
    feedback_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service.get(feedback_id.0).await,
        StatusCode::OK,
        "Feedback retrieved successfully",
    )
}

pub async fn update_feedback(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    feedback_id: SafeIDI64,
    update_data: web::Json<UpdateFeedbackRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service
            .update(&identity, feedback_id.0, update_data.into_inner())
            .await,
        StatusCode::OK,
        "Feedback updated successfully",
    )
}

pub async fn delete_feedback(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    feedback_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = FeedbackService::new(storage.get_ref().clone());
    respond(
        service.delete(&identity, feedback_id.0).await,
        StatusCode::OK,
        "Feedback deleted successfully",
    )
}

// 配置路由
pub fn configure_feedback_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/feedbacks")
            .service(
                web::resource("")
                    .route(web::get().to(list_feedbacks))
                    .route(web::post().to(create_feedback).wrap(middlewares::RequireJWT)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_feedback))
                    .route(web::put().to(update_feedback).wrap(middlewares::RequireJWT))
                    .route(web::delete().to(delete_feedback).wrap(middlewares::RequireJWT)),
            ),
    );

    cfg.service(
        web::resource("/api/users/me/feedbacks")
            .wrap(middlewares::RequireJWT)
            .route(web::get().to(list_my_feedbacks)),
    );
}
