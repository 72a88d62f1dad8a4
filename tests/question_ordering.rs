mod common;

use common::{active_orders, adapters, seed_catalog, submission, text_question};
use rust_evalsystem::consistency::ordering::is_dense;
use rust_evalsystem::errors::ErrorKind;
use rust_evalsystem::models::questions::{
    entities::QuestionType,
    requests::{CreateQuestionRequest, UpdateQuestionRequest},
};

#[tokio::test]
async fn test_orders_stay_dense_through_admin_changes() {
    for (name, storage) in adapters().await {
        let q1 = text_question(&storage, "Clarity", false).await;
        let q2 = text_question(&storage, "Pace", false).await;
        assert_eq!(q1.order, Some(1), "{name}");
        assert_eq!(q2.order, Some(2), "{name}");

        // 插到第一位，其余顺延
        let q3 = storage
            .create_question(CreateQuestionRequest {
                question: "Overall".into(),
                question_type: QuestionType::Text,
                active: true,
                order: Some(1),
                is_score: false,
                required: false,
            })
            .await
            .unwrap();
        assert_eq!(
            active_orders(&storage).await,
            vec![(q3.id, 1), (q1.id, 2), (q2.id, 3)],
            "{name}"
        );

        // 停用后 order 清空，剩余问题补齐空位
        let q1 = storage
            .update_question(
                q1.id,
                UpdateQuestionRequest {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(q1.order, None, "{name}");
        assert_eq!(
            active_orders(&storage).await,
            vec![(q3.id, 1), (q2.id, 2)],
            "{name}"
        );

        // 重新启用且没有位置提示时排到末尾
        storage
            .update_question(
                q1.id,
                UpdateQuestionRequest {
                    active: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            active_orders(&storage).await,
            vec![(q3.id, 1), (q2.id, 2), (q1.id, 3)],
            "{name}"
        );

        // 调整位置：与已有问题同位时，刚调整的排前面
        storage
            .update_question(
                q1.id,
                UpdateQuestionRequest {
                    order: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(
            active_orders(&storage).await,
            vec![(q3.id, 1), (q1.id, 2), (q2.id, 3)],
            "{name}"
        );

        // 超出范围的位置落到末尾
        storage
            .update_question(
                q3.id,
                UpdateQuestionRequest {
                    order: Some(99),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let orders = active_orders(&storage).await;
        assert_eq!(orders, vec![(q1.id, 1), (q2.id, 2), (q3.id, 3)], "{name}");
        assert!(is_dense(orders.iter().map(|(_, o)| Some(*o))), "{name}");
    }
}

#[tokio::test]
async fn test_inactive_questions_never_carry_an_order() {
    for (name, storage) in adapters().await {
        let hidden = storage
            .create_question(CreateQuestionRequest {
                question: "Draft".into(),
                question_type: QuestionType::Text,
                active: false,
                order: Some(1),
                is_score: false,
                required: false,
            })
            .await
            .unwrap();
        assert_eq!(hidden.order, None, "{name}");

        let visible = text_question(&storage, "Live", false).await;
        assert_eq!(visible.order, Some(1), "{name}");

        // 全部问题：启用的在前
        let all = storage.list_questions(false).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|q| q.id).collect();
        assert_eq!(ids, vec![visible.id, hidden.id], "{name}");
    }
}

#[tokio::test]
async fn test_invalid_question_changes_are_rejected() {
    for (name, storage) in adapters().await {
        let err = storage
            .create_question(CreateQuestionRequest {
                question: "Score me".into(),
                question_type: QuestionType::Text,
                active: true,
                order: None,
                is_score: true,
                required: false,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{name}");
        assert!(storage.list_questions(false).await.unwrap().is_empty(), "{name}");

        let err = storage
            .update_question(42, UpdateQuestionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{name}");
    }
}

#[tokio::test]
async fn test_answered_questions_are_deactivated_instead_of_deleted() {
    for (name, storage) in adapters().await {
        let catalog = seed_catalog(&storage, "Ada", "CS101").await;
        let answered = text_question(&storage, "Comments", false).await;
        let unanswered = text_question(&storage, "Extra", false).await;
        let last = text_question(&storage, "Last", false).await;

        storage
            .create_evaluation(7, submission(catalog.class.id, &[(answered.id, "fine")]))
            .await
            .unwrap();

        let removal = storage.remove_question(answered.id).await.unwrap();
        assert!(!removal.deleted, "{name}");
        let kept = storage.get_question(answered.id).await.unwrap().unwrap();
        assert!(!kept.active, "{name}");
        assert_eq!(kept.order, None, "{name}");

        let removal = storage.remove_question(unanswered.id).await.unwrap();
        assert!(removal.deleted, "{name}");
        assert!(storage.get_question(unanswered.id).await.unwrap().is_none(), "{name}");

        assert_eq!(active_orders(&storage).await, vec![(last.id, 1)], "{name}");
    }
}
