//! 评价存储操作
//!
//! 一条评价及其全部回答在同一事务内写入；校验失败时整体回滚，不留下任何行。

use std::collections::HashMap;

use super::catalog::resolve_class_in;
use super::{SeaOrmStorage, now_ts};
use crate::consistency::scoring::{mean, prepare_submission};
use crate::entity::answers::{
    ActiveModel as AnswerActiveModel, Column as AnswerColumn, Entity as Answers,
};
use crate::entity::classes::{Column as ClassColumn, Entity as Classes, Model as ClassModel};
use crate::entity::courses::{Column as CourseColumn, Entity as Courses, Model as CourseModel};
use crate::entity::evaluations::{
    ActiveModel as EvaluationActiveModel, Column as EvaluationColumn, Entity as Evaluations,
    Model as EvaluationModel,
};
use crate::entity::questions::{
    Column as QuestionColumn, Entity as Questions, Model as QuestionModel,
};
use crate::entity::teachers::{Column as TeacherColumn, Entity as Teachers, Model as TeacherModel};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, PageSize},
    evaluations::{
        entities::{Evaluation, EvaluationStatus},
        requests::{EvaluationListQuery, EvaluationSubmission, ReviewEvaluationRequest},
        responses::{AnswerDetail, EvaluationDetails, EvaluationListResponse, EvaluationSummary},
    },
    questions::entities::QuestionType,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use tracing::{info, warn};

fn summarize(
    evaluation: &EvaluationModel,
    class: &ClassModel,
    teacher: &TeacherModel,
    course: &CourseModel,
) -> EvaluationSummary {
    let status = evaluation
        .status
        .parse()
        .unwrap_or(EvaluationStatus::Pending);
    EvaluationSummary {
        evaluation_id: evaluation.id,
        class_id: class.id,
        teacher_id: teacher.id,
        teacher_name: teacher.name.clone(),
        course_id: course.id,
        course_name: course.name.clone(),
        course_code: course.code.clone(),
        semester: class.semester.clone(),
        status,
        score: evaluation.score,
        created_at: chrono::DateTime::<chrono::Utc>::from_timestamp(evaluation.created_at, 0)
            .unwrap_or_default(),
    }
}

async fn create_evaluation_in(
    txn: &DatabaseTransaction,
    user_id: i64,
    submission: EvaluationSubmission,
) -> Result<Evaluation> {
    let class = resolve_class_in(txn, &submission.target).await?;

    let questions: Vec<_> = Questions::find()
        .filter(QuestionColumn::Active.eq(true))
        .all(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询启用问题失败: {e}")))?
        .into_iter()
        .map(|m| m.into_question())
        .collect();
    let prepared = prepare_submission(&questions, &submission.answers)?;

    let existing = Evaluations::find()
        .filter(EvaluationColumn::UserId.eq(user_id))
        .filter(EvaluationColumn::ClassId.eq(class.id))
        .count(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询评价失败: {e}")))?;
    if existing > 0 {
        return Err(EvalSystemError::conflict(format!(
            "User {user_id} has already evaluated class {}",
            class.id
        )));
    }

    let now = now_ts();
    let evaluation = EvaluationActiveModel {
        user_id: Set(user_id),
        class_id: Set(class.id),
        score: Set(prepared.score),
        status: Set(EvaluationStatus::Pending.to_string()),
        approved_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|e| EvalSystemError::database_operation(format!("创建评价失败: {e}")))?;

    for answer in prepared.answers {
        AnswerActiveModel {
            evaluation_id: Set(evaluation.id),
            question_id: Set(answer.question_id),
            question_order: Set(answer.order),
            answer: Set(answer.answer),
            edited_answer: Set(None),
            edited_by: Set(None),
            ..Default::default()
        }
        .insert(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("写入回答失败: {e}")))?;
    }

    Ok(evaluation.into_evaluation())
}

async fn review_evaluation_in(
    txn: &DatabaseTransaction,
    id: i64,
    reviewer_id: i64,
    review: ReviewEvaluationRequest,
) -> Result<Evaluation> {
    let existing = Evaluations::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询评价失败: {e}")))?
        .ok_or_else(|| EvalSystemError::not_found(format!("Evaluation {id} not found")))?;

    let mut model: EvaluationActiveModel = existing.clone().into();
    if let Some(target) = review.status {
        let current = existing.into_evaluation().status;
        let next = current.transition_to(target)?;
        model.status = Set(next.to_string());
        model.approved_by = Set((next == EvaluationStatus::Approved).then_some(reviewer_id));
    }
    model.updated_at = Set(now_ts());

    let updated = model
        .update(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("更新评价失败: {e}")))?;

    for edit in review.answers {
        let edited_by = edit.edited_answer.as_ref().map(|_| reviewer_id);
        let result = Answers::update_many()
            .set(AnswerActiveModel {
                edited_answer: Set(edit.edited_answer),
                edited_by: Set(edited_by),
                ..Default::default()
            })
            .filter(AnswerColumn::EvaluationId.eq(id))
            .filter(AnswerColumn::QuestionId.eq(edit.question_id))
            .exec(txn)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("修订回答失败: {e}")))?;

        if result.rows_affected == 0 {
            return Err(EvalSystemError::not_found(format!(
                "Evaluation {id} has no answer for question {}",
                edit.question_id
            )));
        }
    }

    Ok(updated.into_evaluation())
}

impl SeaOrmStorage {
    /// 校验并写入一条评价
    pub async fn create_evaluation_impl(
        &self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation> {
        let txn = self.begin().await?;
        let result = create_evaluation_in(&txn, user_id, submission).await;
        let evaluation = Self::finish(txn, result)
            .await
            .inspect_err(|e| warn!("用户 {} 的评价提交被拒绝: {}", user_id, e))?;

        info!(
            "评价 {} 已创建 (user = {}, class = {}, score = {:?})",
            evaluation.id, evaluation.user_id, evaluation.class_id, evaluation.score
        );
        Ok(evaluation)
    }

    /// 通过 ID 获取评价
    pub async fn get_evaluation_impl(&self, id: i64) -> Result<Option<Evaluation>> {
        let result = Evaluations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评价失败: {e}")))?;

        Ok(result.map(|m| m.into_evaluation()))
    }

    /// 获取评价详情（回答按 `(order, question_id)` 排序）
    pub async fn get_evaluation_details_impl(&self, id: i64) -> Result<Option<EvaluationDetails>> {
        let Some(evaluation) = Evaluations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评价失败: {e}")))?
        else {
            return Ok(None);
        };

        let class = Classes::find_by_id(evaluation.class_id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询开课失败: {e}")))?
            .ok_or_else(|| {
                EvalSystemError::database_operation(format!(
                    "Evaluation {id} references a missing class"
                ))
            })?;
        let (teachers, courses) = self.load_catalog(std::slice::from_ref(&class)).await?;
        let (teacher, course) = match (
            teachers.get(&class.teacher_id),
            courses.get(&class.course_id),
        ) {
            (Some(t), Some(c)) => (t, c),
            _ => {
                return Err(EvalSystemError::database_operation(format!(
                    "Class {} references a missing teacher or course",
                    class.id
                )));
            }
        };
        let summary = summarize(&evaluation, &class, teacher, course);

        let answers = Answers::find()
            .filter(AnswerColumn::EvaluationId.eq(id))
            .order_by_asc(AnswerColumn::QuestionOrder)
            .order_by_asc(AnswerColumn::QuestionId)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询回答失败: {e}")))?;

        let question_ids: Vec<i64> = answers.iter().map(|a| a.question_id).collect();
        let questions: HashMap<i64, QuestionModel> = Questions::find()
            .filter(QuestionColumn::Id.is_in(question_ids))
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询问题失败: {e}")))?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

        let answers = answers
            .into_iter()
            .map(|a| {
                let (question_type, text) = match questions.get(&a.question_id) {
                    Some(q) => (
                        q.question_type.parse().unwrap_or(QuestionType::Text),
                        q.question.clone(),
                    ),
                    None => (QuestionType::Text, String::new()),
                };
                AnswerDetail::from_answer(a.into_answer(), question_type, text)
            })
            .collect();

        Ok(Some(EvaluationDetails {
            summary,
            user_id: evaluation.user_id,
            approved_by: evaluation.approved_by,
            answers,
        }))
    }

    /// 审核评价
    pub async fn review_evaluation_impl(
        &self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        let edits = review.answers.len();
        let txn = self.begin().await?;
        let result = review_evaluation_in(&txn, id, reviewer_id, review).await;
        let evaluation = Self::finish(txn, result).await?;

        info!(
            "评价 {} 已由 {} 审核: status = {}, 修订回答 {} 条",
            id, reviewer_id, evaluation.status, edits
        );
        Ok(evaluation)
    }

    /// 偏移分页列出评价（最新的在前）
    pub async fn list_evaluations_impl(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        let size = query.pagination.size()?;
        let page = query.pagination.page_number()?;
        // 不分页时不能生成没有 LIMIT 的 OFFSET
        let offset = match size {
            PageSize::All => None,
            PageSize::Limited(_) => Some(query.pagination.offset()?),
        };

        let Some(select) = self.filtered_evaluations(&query).await? else {
            return Ok(EvaluationListResponse {
                page: Page::from_offset_rows(Vec::new(), size, page),
                overall_score: None,
            });
        };

        let scores: Vec<Option<f64>> = select
            .clone()
            .select_only()
            .column(EvaluationColumn::Score)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("统计评价得分失败: {e}")))?;
        let scores: Vec<f64> = scores.into_iter().flatten().collect();

        let rows = select
            .order_by_desc(EvaluationColumn::CreatedAt)
            .order_by_desc(EvaluationColumn::Id)
            .offset(offset)
            .limit(query.pagination.fetch_limit()?)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询评价列表失败: {e}")))?;

        let class_ids: Vec<i64> = rows.iter().map(|e| e.class_id).collect();
        let classes: HashMap<i64, ClassModel> = Classes::find()
            .filter(ClassColumn::Id.is_in(class_ids))
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询开课失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let class_list: Vec<ClassModel> = classes.values().cloned().collect();
        let (teachers, courses) = self.load_catalog(&class_list).await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for evaluation in &rows {
            let summary = classes.get(&evaluation.class_id).and_then(|class| {
                let teacher = teachers.get(&class.teacher_id)?;
                let course = courses.get(&class.course_id)?;
                Some(summarize(evaluation, class, teacher, course))
            });
            match summary {
                Some(summary) => summaries.push(summary),
                None => {
                    return Err(EvalSystemError::database_operation(format!(
                        "Evaluation {} references missing catalog rows",
                        evaluation.id
                    )));
                }
            }
        }

        Ok(EvaluationListResponse {
            page: Page::from_offset_rows(summaries, size, page),
            overall_score: mean(&scores),
        })
    }

    /// 按筛选条件构造评价查询；开课筛选没有命中任何开课时返回 None
    async fn filtered_evaluations(
        &self,
        query: &EvaluationListQuery,
    ) -> Result<Option<Select<Evaluations>>> {
        let mut select = Evaluations::find();

        if query.teacher_id.is_some() || query.course_id.is_some() || query.semester.is_some() {
            let mut classes = Classes::find();
            if let Some(teacher_id) = query.teacher_id {
                classes = classes.filter(ClassColumn::TeacherId.eq(teacher_id));
            }
            if let Some(course_id) = query.course_id {
                classes = classes.filter(ClassColumn::CourseId.eq(course_id));
            }
            if let Some(ref semester) = query.semester {
                classes = classes.filter(ClassColumn::Semester.eq(semester.as_str()));
            }
            let class_ids: Vec<i64> = classes
                .select_only()
                .column(ClassColumn::Id)
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| EvalSystemError::database_operation(format!("查询开课失败: {e}")))?;
            if class_ids.is_empty() {
                return Ok(None);
            }
            select = select.filter(EvaluationColumn::ClassId.is_in(class_ids));
        }

        if let Some(status) = query.status {
            select = select.filter(EvaluationColumn::Status.eq(status.to_string()));
        }

        Ok(Some(select))
    }

    /// 批量读取开课对应的教师与课程
    async fn load_catalog(
        &self,
        classes: &[ClassModel],
    ) -> Result<(HashMap<i64, TeacherModel>, HashMap<i64, CourseModel>)> {
        let teacher_ids: Vec<i64> = classes.iter().map(|c| c.teacher_id).collect();
        let course_ids: Vec<i64> = classes.iter().map(|c| c.course_id).collect();

        let teachers = Teachers::find()
            .filter(TeacherColumn::Id.is_in(teacher_ids))
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let courses = Courses::find()
            .filter(CourseColumn::Id.is_in(course_ids))
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        Ok((teachers, courses))
    }
}
