mod common;

use common::{adapters, seed_catalog, submission, text_question};
use rust_evalsystem::errors::ErrorKind;
use rust_evalsystem::models::common::PageRequest;
use rust_evalsystem::models::evaluations::{
    entities::EvaluationStatus,
    requests::{EvaluationListQuery, ReviewEvaluationRequest},
};
use rust_evalsystem::models::feedbacks::requests::{CreateFeedbackRequest, FeedbackListQuery};
use rust_evalsystem::models::teachers::requests::CreateTeacherRequest;
use rust_evalsystem::models::users::entities::Identity;
use rust_evalsystem::services::EvaluationService;

#[tokio::test]
async fn test_teacher_pages_follow_name_order() {
    for (name, storage) in adapters().await {
        for teacher in ["Eve", "Bob", "Dan", "Ann", "Cat"] {
            storage
                .create_teacher(CreateTeacherRequest {
                    name: teacher.into(),
                })
                .await
                .unwrap();
        }

        let mut names = Vec::new();
        let mut request = PageRequest::first(2);
        let mut pages = 0;
        loop {
            let page = storage.list_teachers(request.clone()).await.unwrap();
            pages += 1;
            assert!(page.items.len() <= 2, "{name}");
            names.extend(page.items.iter().map(|t| t.name.clone()));
            match page.next_cursor {
                Some(cursor) => {
                    assert!(page.has_next, "{name}");
                    request = PageRequest::after(cursor, 2);
                }
                None => {
                    assert!(!page.has_next, "{name}");
                    break;
                }
            }
        }
        assert_eq!(pages, 3, "{name}");
        assert_eq!(names, vec!["Ann", "Bob", "Cat", "Dan", "Eve"], "{name}");

        // 页大小为负数时返回全部
        let all = storage.list_teachers(PageRequest::first(-1)).await.unwrap();
        assert_eq!(all.items.len(), 5, "{name}");
        assert!(!all.has_next, "{name}");
        assert_eq!(all.next_cursor, None, "{name}");

        // 恰好整页时不会多出空页
        let exact = storage.list_teachers(PageRequest::first(5)).await.unwrap();
        assert_eq!(exact.items.len(), 5, "{name}");
        assert!(!exact.has_next, "{name}");

        let err = storage
            .list_teachers(PageRequest::first(0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
    }
}

#[tokio::test]
async fn test_feedback_pages_newest_first() {
    for (name, storage) in adapters().await {
        let c = seed_catalog(&storage, "Ada", "CS101").await;
        let mut ids = Vec::new();
        for user_id in 1..=5 {
            let feedback = storage
                .create_feedback(
                    user_id,
                    CreateFeedbackRequest {
                        teacher_id: c.teacher.id,
                        course_id: c.course.id,
                        rating: 4.0,
                        positive_aspects: None,
                        negative_aspects: None,
                        additional_comments: None,
                    },
                )
                .await
                .unwrap();
            ids.push(feedback.id);
        }
        storage.delete_feedback(ids[2]).await.unwrap();

        let mut seen = Vec::new();
        let mut query = FeedbackListQuery {
            pagination: PageRequest::first(2),
            teacher_id: Some(c.teacher.id),
            ..Default::default()
        };
        loop {
            let page = storage.list_feedbacks(query.clone()).await.unwrap();
            seen.extend(page.items.iter().map(|f| f.id));
            match page.next_cursor {
                Some(cursor) => query.pagination = PageRequest::after(cursor, 2),
                None => break,
            }
        }
        // 软删除的反馈不出现
        assert_eq!(seen, vec![ids[4], ids[3], ids[1], ids[0]], "{name}");

        let other = storage
            .list_feedbacks(FeedbackListQuery {
                pagination: PageRequest::first(-1),
                teacher_id: Some(9_999),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(other.items.is_empty(), "{name}");
    }
}

#[tokio::test]
async fn test_evaluation_offset_pages_and_overall_score() {
    for (name, storage) in adapters().await {
        let c = seed_catalog(&storage, "Ada", "CS101").await;
        let score = common::score_question(&storage, "Teaching", false).await;
        let text = text_question(&storage, "Comments", false).await;
        let service = EvaluationService::new(storage.clone());
        let admin = Identity::admin(100);

        let answers: [&[(i64, &str)]; 4] = [
            &[(score.id, "2")],
            &[(score.id, "4")],
            &[(text.id, "no score")],
            &[(score.id, "5")],
        ];
        let mut ids = Vec::new();
        for (idx, answers) in answers.into_iter().enumerate() {
            let evaluation = storage
                .create_evaluation(idx as i64 + 1, submission(c.class.id, answers))
                .await
                .unwrap();
            ids.push(evaluation.id);
        }
        // 前三条通过，最后一条仍待审核
        for id in &ids[..3] {
            service
                .review(
                    &admin,
                    *id,
                    ReviewEvaluationRequest {
                        status: Some(EvaluationStatus::Approved),
                        answers: vec![],
                    },
                )
                .await
                .unwrap();
        }

        let first = service
            .list_public(EvaluationListQuery {
                pagination: PageRequest::first(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let first_ids: Vec<i64> = first.page.items.iter().map(|e| e.evaluation_id).collect();
        assert_eq!(first_ids, vec![ids[2], ids[1]], "{name}");
        assert!(first.page.has_next, "{name}");
        assert_eq!(first.page.next_cursor.as_deref(), Some("2"), "{name}");
        assert_eq!(first.overall_score, Some(3.0), "{name}");

        let second = service
            .list_public(EvaluationListQuery {
                pagination: PageRequest::after("2", 2),
                ..Default::default()
            })
            .await
            .unwrap();
        let second_ids: Vec<i64> = second.page.items.iter().map(|e| e.evaluation_id).collect();
        assert_eq!(second_ids, vec![ids[0]], "{name}");
        assert!(!second.page.has_next, "{name}");

        // 管理员视角包含待审核的评价
        let all = service
            .list_admin(
                &admin,
                EvaluationListQuery {
                    pagination: PageRequest::first(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(all.page.items.len(), 4, "{name}");
        assert!(!all.page.has_next, "{name}");
        assert_eq!(all.page.items[0].evaluation_id, ids[3], "{name}");
        assert_eq!(all.overall_score, Some(11.0 / 3.0), "{name}");

        let pending = service
            .list_admin(
                &admin,
                EvaluationListQuery {
                    pagination: PageRequest::first(-1),
                    status: Some(EvaluationStatus::Pending),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(pending.page.items.len(), 1, "{name}");
        assert_eq!(pending.overall_score, Some(5.0), "{name}");

        let err = service
            .list_admin(&Identity::user(1), EvaluationListQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden, "{name}");

        let err = service
            .list_public(EvaluationListQuery {
                pagination: PageRequest::after("zero", 2),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");

        let err = service
            .list_public(EvaluationListQuery {
                pagination: PageRequest::after(u64::MAX.to_string(), 10),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
    }
}
