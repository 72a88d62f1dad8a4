use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::questions::requests::{CreateQuestionRequest, UpdateQuestionRequest};
use crate::services::QuestionService;
use crate::storage::Storage;
use crate::utils::{SafeIDI64, respond};

// HTTP处理程序
pub async fn list_active_questions(
    storage: web::Data<Arc<dyn Storage>>,
) -> ActixResult<HttpResponse> {
    let service = QuestionService::new(storage.get_ref().clone());
    respond(
        service.list_active().await,
        StatusCode::OK,
        "Questions retrieved successfully",
    )
}

pub async fn list_all_questions(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = QuestionService::new(storage.get_ref().clone());
    respond(
        service.list_all(&identity).await,
        StatusCode::OK,
        "Questions retrieved successfully",
    )
}

pub async fn create_question(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    question_data: web::Json<CreateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = QuestionService::new(storage.get_ref().clone());
    respond(
        service.create(&identity, question_data.into_inner()).await,
        StatusCode::CREATED,
        "Question created successfully",
    )
}

pub async fn update_question(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    question_id: SafeIDI64,
    update_data: web::Json<UpdateQuestionRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = QuestionService::new(storage.get_ref().clone());
    respond(
        service
            .update(&identity, question_id.0, update_data.into_inner())
            .await,
        StatusCode::OK,
        "Question updated successfully",
    )
}

pub async fn delete_question(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    question_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = QuestionService::new(storage.get_ref().clone());
    respond(
        service.remove(&identity, question_id.0).await,
        StatusCode::OK,
        "Question removed successfully",
    )
}

// 配置路由
pub fn configure_question_routes(cfg: &mut web::ServiceConfig) {
    // 公开表单
    cfg.service(web::resource("/api/questions").route(web::get().to(list_active_questions)));

    cfg.service(
        web::scope("/api/admin/questions")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("")
                    .route(web::get().to(list_all_questions))
                    .route(web::post().to(create_question)),
            )
            .service(
                web::resource("/{id}")
                    .route(web::put().to(update_question))
                    .route(web::delete().to(delete_question)),
            ),
    );
}
