use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use crate::middlewares;
use crate::models::common::PageRequest;
use crate::models::teachers::requests::{
    CreateClassRequest, CreateCourseRequest, CreateTeacherRequest,
};
use crate::services::TeacherService;
use crate::storage::Storage;
use crate::utils::{SafeIDI64, respond};

// HTTP处理程序
pub async fn list_teachers(
    storage: web::Data<Arc<dyn Storage>>,
    query: web::Query<PageRequest>,
) -> ActixResult<HttpResponse> {
    let service = TeacherService::new(storage.get_ref().clone());
    respond(
        service.list(query.into_inner()).await,
        StatusCode::OK,
        "Teachers retrieved successfully",
    )
}

pub async fn get_teacher(
    storage: web::Data<Arc<dyn Storage>>,
    teacher_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    let service = TeacherService::new(storage.get_ref().clone());
    respond(
        service.get(teacher_id.0).await,
        StatusCode::OK,
        "Teacher retrieved successfully",
    )
}

pub async fn create_teacher(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    teacher_data: web::Json<CreateTeacherRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = TeacherService::new(storage.get_ref().clone());
    respond(
        service
            .create_teacher(&identity, teacher_data.into_inner())
            .await,
        StatusCode::CREATED,
        "Teacher created successfully",
    )
}

pub async fn create_course(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    course_data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = TeacherService::new(storage.get_ref().clone());
    respond(
        service.create_course(&identity, course_data.into_inner()).await,
        StatusCode::CREATED,
        "Course created successfully",
    )
}

pub async fn create_class(
    req: HttpRequest,
    storage: web::Data<Arc<dyn Storage>>,
    class_data: web::Json<CreateClassRequest>,
) -> ActixResult<HttpResponse> {
    let identity = require_identity!(req);
    let service = TeacherService::new(storage.get_ref().clone());
    respond(
        service.create_class(&identity, class_data.into_inner()).await,
        StatusCode::CREATED,
        "Class created successfully",
    )
}

// 配置路由
pub fn configure_teacher_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/teachers")
            .service(web::resource("").route(web::get().to(list_teachers)))
            .service(web::resource("/{id}").route(web::get().to(get_teacher))),
    );

    // 目录维护（仅管理员）
    cfg.service(
        web::resource("/api/admin/teachers")
            .wrap(middlewares::RequireJWT)
            .route(web::post().to(create_teacher)),
    );
    cfg.service(
        web::resource("/api/admin/courses")
            .wrap(middlewares::RequireJWT)
            .route(web::post().to(create_course)),
    );
    cfg.service(
        web::resource("/api/admin/classes")
            .wrap(middlewares::RequireJWT)
            .route(web::post().to(create_class)),
    );
}
