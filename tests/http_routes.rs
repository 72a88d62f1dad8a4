use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use rust_evalsystem::config::JwtConfig;
use rust_evalsystem::models::users::entities::Identity;
use rust_evalsystem::routes;
use rust_evalsystem::storage::Storage;
use rust_evalsystem::storage::memory_storage::MemoryStorage;
use rust_evalsystem::utils::jwt::JwtUtils;
use rust_evalsystem::utils::{json_error_handler, query_error_handler};

const SECRET: &str = "http-test-secret";

fn bearer(identity: Identity) -> (String, String) {
    let token = JwtUtils::generate_token(identity, SECRET, chrono::Duration::minutes(5)).unwrap();
    ("Authorization".into(), format!("Bearer {token}"))
}

macro_rules! app {
    () => {{
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        test::init_service(
            App::new()
                .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                .app_data(web::Data::new(storage))
                .app_data(web::Data::new(JwtConfig {
                    secret: SECRET.into(),
                    access_token_expiry: 15,
                }))
                .configure(routes::configure_question_routes)
                .configure(routes::configure_evaluation_routes)
                .configure(routes::configure_feedback_routes)
                .configure(routes::configure_teacher_routes),
        )
        .await
    }};
}

#[actix_web::test]
async fn test_question_admin_requires_token_and_role() {
    let app = app!();
    let body = json!({
        "question": "How clear were the lectures?",
        "question_type": "numeric",
        "active": true,
        "is_score": true,
        "required": true
    });

    let req = test::TestRequest::post()
        .uri("/api/admin/questions")
        .set_json(&body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/api/admin/questions")
        .insert_header(bearer(Identity::user(1)))
        .set_json(&body)
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );

    let req = test::TestRequest::post()
        .uri("/api/admin/questions")
        .insert_header(bearer(Identity::admin(9)))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/api/questions").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["code"], 0);
    assert_eq!(listed["data"][0]["order"], 1);
    assert_eq!(listed["data"][0]["required"], true);
}

#[actix_web::test]
async fn test_errors_map_to_status_codes() {
    let app = app!();

    let req = test::TestRequest::get().uri("/api/answers/42").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/api/answers/abc").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/teachers?page_size=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/feedbacks")
        .insert_header(bearer(Identity::user(1)))
        .set_payload("{not json")
        .insert_header(("Content-Type", "application/json"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_submission_round_trip_over_http() {
    let app = app!();
    let admin = bearer(Identity::admin(9));

    let req = test::TestRequest::post()
        .uri("/api/admin/teachers")
        .insert_header(admin.clone())
        .set_json(json!({ "name": "Ada" }))
        .to_request();
    let teacher: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/courses")
        .insert_header(admin.clone())
        .set_json(json!({ "name": "Compilers", "code": "CS401" }))
        .to_request();
    let course: Value = test::call_and_read_body_json(&app, req).await;
    let req = test::TestRequest::post()
        .uri("/api/admin/classes")
        .insert_header(admin.clone())
        .set_json(json!({
            "teacher_id": teacher["data"]["id"],
            "course_id": course["data"]["id"],
            "semester": "2025-1"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/admin/questions")
        .insert_header(admin.clone())
        .set_json(json!({
            "question": "Rate the course",
            "question_type": "numeric",
            "active": true,
            "is_score": true,
            "required": true
        }))
        .to_request();
    let question: Value = test::call_and_read_body_json(&app, req).await;

    let payload = json!({
        "evaluations": [
            {
                "target": {
                    "teacher_id": teacher["data"]["id"],
                    "course_id": course["data"]["id"]
                },
                "answers": [{ "question_id": question["data"]["id"], "answer": "4" }]
            },
            {
                "target": { "class_id": 777 },
                "answers": [{ "question_id": question["data"]["id"], "answer": "5" }]
            }
        ]
    });
    let req = test::TestRequest::post()
        .uri("/api/evaluations")
        .insert_header(bearer(Identity::user(3)))
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::MULTI_STATUS);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["data"]["created"][0]["score"], 4.0);
    assert_eq!(report["data"]["failed"][0]["index"], 1);
    assert_eq!(report["data"]["failed"][0]["code"], "E002");
}
