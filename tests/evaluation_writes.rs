mod common;

use common::{adapters, score_question, seed_catalog, submission, text_question};
use rust_evalsystem::errors::ErrorKind;
use rust_evalsystem::models::common::PageRequest;
use rust_evalsystem::models::evaluations::{
    entities::EvaluationStatus,
    requests::{
        AnswerEdit, ClassTarget, EvaluationListQuery, EvaluationSubmission,
        ReviewEvaluationRequest, SubmitEvaluationsRequest, SubmittedAnswer,
    },
};
use rust_evalsystem::models::questions::requests::UpdateQuestionRequest;
use rust_evalsystem::models::teachers::requests::CreateClassRequest;
use rust_evalsystem::models::users::entities::Identity;
use rust_evalsystem::services::EvaluationService;

fn all_evaluations() -> EvaluationListQuery {
    EvaluationListQuery {
        pagination: PageRequest::first(-1),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_score_is_mean_of_score_answers() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let s1 = score_question(&storage, "Teaching", true).await;
        let s2 = score_question(&storage, "Materials", false).await;
        let text = text_question(&storage, "Comments", true).await;

        let evaluation = storage
            .create_evaluation(
                1,
                submission(
                    catalog.class.id,
                    &[(s1.id, "4"), (s2.id, " 5 "), (text.id, "good")],
                ),
            )
            .await
            .unwrap();
        assert_eq!(evaluation.score, Some(4.5), "{name}");
        assert_eq!(evaluation.status, EvaluationStatus::Pending, "{name}");
        assert_eq!(evaluation.approved_by, None, "{name}");

        // 答案按问题当时的 order 落库
        let details = storage
            .get_evaluation_details(evaluation.id)
            .await
            .unwrap()
            .unwrap();
        let orders: Vec<(i64, i32)> = details
            .answers
            .iter()
            .map(|a| (a.question_id, a.order))
            .collect();
        assert_eq!(orders, vec![(s1.id, 1), (s2.id, 2), (text.id, 3)], "{name}");
        assert_eq!(details.summary.teacher_name, "Ada", "{name}");
        assert_eq!(details.summary.course_code, "CS101", "{name}");
    }
}

#[tokio::test]
async fn test_score_is_null_without_score_answers() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let _optional_score = score_question(&storage, "Teaching", false).await;
        let text = text_question(&storage, "Comments", true).await;

        let evaluation = storage
            .create_evaluation(1, submission(catalog.class.id, &[(text.id, "ok")]))
            .await
            .unwrap();
        assert_eq!(evaluation.score, None, "{name}");
    }
}

#[tokio::test]
async fn test_rejected_submissions_write_nothing() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let score = score_question(&storage, "Teaching", true).await;
        let text = text_question(&storage, "Comments", true).await;
        let retired = text_question(&storage, "Old", false).await;
        storage
            .update_question(
                retired.id,
                UpdateQuestionRequest {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let rejected = [
            // 缺少必答题
            submission(catalog.class.id, &[(score.id, "4")]),
            // 分数无法解析
            submission(catalog.class.id, &[(score.id, "four"), (text.id, "x")]),
            // 分数不是有限数
            submission(catalog.class.id, &[(score.id, "NaN"), (text.id, "x")]),
            // 同一问题回答两次
            submission(
                catalog.class.id,
                &[(score.id, "4"), (score.id, "5"), (text.id, "x")],
            ),
            // 停用的问题
            submission(
                catalog.class.id,
                &[(score.id, "4"), (text.id, "x"), (retired.id, "y")],
            ),
        ];
        for (idx, attempt) in rejected.into_iter().enumerate() {
            let err = storage.create_evaluation(1, attempt).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "{name} #{idx}");
        }

        let err = storage
            .create_evaluation(1, submission(9_999, &[(score.id, "4"), (text.id, "x")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{name}");

        let listed = storage.list_evaluations(all_evaluations()).await.unwrap();
        assert!(listed.page.items.is_empty(), "{name}");
        assert_eq!(listed.overall_score, None, "{name}");

        // 之后的合法提交不受影响
        let ok = storage
            .create_evaluation(1, submission(catalog.class.id, &[(score.id, "3"), (text.id, "x")]))
            .await
            .unwrap();
        assert_eq!(ok.score, Some(3.0), "{name}");
    }
}

#[tokio::test]
async fn test_duplicate_evaluation_conflicts() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let text = text_question(&storage, "Comments", true).await;

        storage
            .create_evaluation(1, submission(catalog.class.id, &[(text.id, "first")]))
            .await
            .unwrap();
        let err = storage
            .create_evaluation(1, submission(catalog.class.id, &[(text.id, "again")]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict, "{name}");

        // 其他用户不受影响
        storage
            .create_evaluation(2, submission(catalog.class.id, &[(text.id, "mine")]))
            .await
            .unwrap();
        let listed = storage.list_evaluations(all_evaluations()).await.unwrap();
        assert_eq!(listed.page.items.len(), 2, "{name}");
    }
}

#[tokio::test]
async fn test_pairing_resolves_latest_semester() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let newer = storage
            .create_class(CreateClassRequest {
                teacher_id: catalog.teacher.id,
                course_id: catalog.course.id,
                semester: "2025-2".into(),
            })
            .await
            .unwrap();
        let text = text_question(&storage, "Comments", true).await;

        let evaluation = storage
            .create_evaluation(
                1,
                EvaluationSubmission {
                    target: ClassTarget::Pairing {
                        teacher_id: catalog.teacher.id,
                        course_id: catalog.course.id,
                    },
                    answers: vec![SubmittedAnswer {
                        question_id: text.id,
                        answer: "ok".into(),
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(evaluation.class_id, newer.id, "{name}");

        let err = storage
            .create_class(CreateClassRequest {
                teacher_id: catalog.teacher.id,
                course_id: catalog.course.id,
                semester: "2025-2".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict, "{name}");
    }
}

#[tokio::test]
async fn test_batch_submission_reports_each_item() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let score = score_question(&storage, "Teaching", true).await;
        let service = EvaluationService::new(storage.clone());
        let student = Identity::user(5);

        let report = service
            .submit(
                &student,
                SubmitEvaluationsRequest {
                    evaluations: vec![
                        submission(catalog.class.id, &[(score.id, "5")]),
                        submission(catalog.class.id, &[(score.id, "bad")]),
                        submission(catalog.class.id, &[(score.id, "4")]),
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(report.created.len(), 1, "{name}");
        assert_eq!(report.created[0].index, 0, "{name}");
        assert_eq!(report.created[0].score, Some(5.0), "{name}");
        assert_eq!(report.failed_indices(), vec![1, 2], "{name}");
        assert_eq!(report.failed[0].code, "E001", "{name}");
        assert_eq!(report.failed[1].code, "E003", "{name}");

        let err = service
            .submit(&student, SubmitEvaluationsRequest { evaluations: vec![] })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
    }
}

#[tokio::test]
async fn test_review_transitions_and_answer_edits() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let text = text_question(&storage, "Comments", true).await;
        let service = EvaluationService::new(storage.clone());
        let admin = Identity::admin(100);

        let evaluation = storage
            .create_evaluation(1, submission(catalog.class.id, &[(text.id, "rude words")]))
            .await
            .unwrap();

        // 未通过的评价不公开
        let err = service.public_details(evaluation.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{name}");

        // 只有管理员能审核，且审核不能为空
        let err = service
            .review(
                &Identity::user(1),
                evaluation.id,
                ReviewEvaluationRequest {
                    status: Some(EvaluationStatus::Approved),
                    answers: vec![],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden, "{name}");
        let err = service
            .review(&admin, evaluation.id, ReviewEvaluationRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");

        let reviewed = service
            .review(
                &admin,
                evaluation.id,
                ReviewEvaluationRequest {
                    status: Some(EvaluationStatus::Approved),
                    answers: vec![AnswerEdit {
                        question_id: text.id,
                        edited_answer: Some("polite words".into()),
                    }],
                },
            )
            .await
            .unwrap();
        assert_eq!(reviewed.status, EvaluationStatus::Approved, "{name}");
        assert_eq!(reviewed.approved_by, Some(admin.user_id), "{name}");

        // 管理员视角保留原始回答
        let details = service.admin_details(&admin, evaluation.id).await.unwrap();
        assert_eq!(details.answers[0].answer, "rude words", "{name}");
        assert_eq!(
            details.answers[0].edited_answer.as_deref(),
            Some("polite words"),
            "{name}"
        );
        assert_eq!(details.answers[0].edited_by, Some(admin.user_id), "{name}");

        // 公开视角只看到修订后的回答
        let public = service.public_details(evaluation.id).await.unwrap();
        assert_eq!(public.answers[0].answer, "polite words", "{name}");

        // 终态不能再流转
        let err = service
            .review(
                &admin,
                evaluation.id,
                ReviewEvaluationRequest {
                    status: Some(EvaluationStatus::Rejected),
                    answers: vec![],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict, "{name}");

        // 修订不存在的回答
        let err = service
            .review(
                &admin,
                evaluation.id,
                ReviewEvaluationRequest {
                    status: None,
                    answers: vec![AnswerEdit {
                        question_id: 9_999,
                        edited_answer: Some("x".into()),
                    }],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{name}");
    }
}
