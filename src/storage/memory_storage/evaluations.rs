//! 评价文档操作

use super::{MemoryState, MemoryStorage, next_id, now};
use crate::consistency::scoring::{mean, prepare_submission};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::paginate_offset,
    evaluations::{
        entities::{Answer, Evaluation, EvaluationStatus},
        requests::{EvaluationListQuery, EvaluationSubmission, ReviewEvaluationRequest},
        responses::{AnswerDetail, EvaluationDetails, EvaluationListResponse, EvaluationSummary},
    },
    questions::entities::QuestionType,
};
use tracing::{info, warn};

impl MemoryState {
    fn summarize(&self, evaluation: &Evaluation) -> Result<EvaluationSummary> {
        let missing = || {
            EvalSystemError::database_operation(format!(
                "Evaluation {} references missing catalog documents",
                evaluation.id
            ))
        };
        let class = self.classes.get(&evaluation.class_id).ok_or_else(missing)?;
        let teacher = self.teachers.get(&class.teacher_id).ok_or_else(missing)?;
        let course = self.courses.get(&class.course_id).ok_or_else(missing)?;

        Ok(EvaluationSummary {
            evaluation_id: evaluation.id,
            class_id: class.id,
            teacher_id: teacher.id,
            teacher_name: teacher.name.clone(),
            course_id: course.id,
            course_name: course.name.clone(),
            course_code: course.code.clone(),
            semester: class.semester.clone(),
            status: evaluation.status,
            score: evaluation.score,
            created_at: evaluation.created_at,
        })
    }

    fn create_evaluation(
        &mut self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation> {
        let class = self.resolve_class(&submission.target)?;
        let prepared = prepare_submission(&self.active_questions(), &submission.answers)?;

        if self
            .evaluations
            .values()
            .any(|e| e.user_id == user_id && e.class_id == class.id)
        {
            return Err(EvalSystemError::conflict(format!(
                "User {user_id} has already evaluated class {}",
                class.id
            )));
        }

        let id = next_id(&mut self.seq.evaluations);
        let now = now();
        let evaluation = Evaluation {
            id,
            user_id,
            class_id: class.id,
            score: prepared.score,
            status: EvaluationStatus::Pending,
            approved_by: None,
            created_at: now,
            updated_at: now,
        };
        self.evaluations.insert(id, evaluation.clone());

        for answer in prepared.answers {
            let answer_id = next_id(&mut self.seq.answers);
            self.answers.insert(
                answer_id,
                Answer {
                    id: answer_id,
                    evaluation_id: id,
                    question_id: answer.question_id,
                    order: answer.order,
                    answer: answer.answer,
                    edited_answer: None,
                    edited_by: None,
                },
            );
        }

        Ok(evaluation)
    }

    fn evaluation_details(&self, id: i64) -> Result<Option<EvaluationDetails>> {
        let Some(evaluation) = self.evaluations.get(&id) else {
            return Ok(None);
        };
        let summary = self.summarize(evaluation)?;

        let mut answers: Vec<&Answer> = self
            .answers
            .values()
            .filter(|a| a.evaluation_id == id)
            .collect();
        answers.sort_by_key(|a| (a.order, a.question_id));

        let answers = answers
            .into_iter()
            .map(|a| {
                let (question_type, text) = match self.questions.get(&a.question_id) {
                    Some(q) => (q.question_type, q.question.clone()),
                    None => (QuestionType::Text, String::new()),
                };
                AnswerDetail::from_answer(a.clone(), question_type, text)
            })
            .collect();

        Ok(Some(EvaluationDetails {
            summary,
            user_id: evaluation.user_id,
            approved_by: evaluation.approved_by,
            answers,
        }))
    }

    fn review_evaluation(
        &mut self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        let evaluation = self
            .evaluations
            .get_mut(&id)
            .ok_or_else(|| EvalSystemError::not_found(format!("Evaluation {id} not found")))?;

        if let Some(target) = review.status {
            let next = evaluation.status.transition_to(target)?;
            evaluation.status = next;
            evaluation.approved_by = (next == EvaluationStatus::Approved).then_some(reviewer_id);
        }
        evaluation.updated_at = now();
        let updated = evaluation.clone();

        for edit in review.answers {
            let answer = self
                .answers
                .values_mut()
                .find(|a| a.evaluation_id == id && a.question_id == edit.question_id)
                .ok_or_else(|| {
                    EvalSystemError::not_found(format!(
                        "Evaluation {id} has no answer for question {}",
                        edit.question_id
                    ))
                })?;
            answer.edited_by = edit.edited_answer.as_ref().map(|_| reviewer_id);
            answer.edited_answer = edit.edited_answer;
        }

        Ok(updated)
    }

    fn list_evaluations(&self, query: &EvaluationListQuery) -> Result<EvaluationListResponse> {
        let mut matching: Vec<&Evaluation> = self
            .evaluations
            .values()
            .filter(|e| query.status.is_none_or(|s| e.status == s))
            .filter(|e| match self.classes.get(&e.class_id) {
                Some(class) => {
                    query.teacher_id.is_none_or(|t| class.teacher_id == t)
                        && query.course_id.is_none_or(|c| class.course_id == c)
                        && query
                            .semester
                            .as_ref()
                            .is_none_or(|s| &class.semester == s)
                }
                None => false,
            })
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let scores: Vec<f64> = matching.iter().filter_map(|e| e.score).collect();
        let summaries = matching
            .into_iter()
            .map(|e| self.summarize(e))
            .collect::<Result<Vec<_>>>()?;

        Ok(EvaluationListResponse {
            page: paginate_offset(summaries, &query.pagination)?,
            overall_score: mean(&scores),
        })
    }
}

impl MemoryStorage {
    pub async fn create_evaluation_impl(
        &self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation> {
        let evaluation = self
            .transact(|state| state.create_evaluation(user_id, submission))
            .await
            .inspect_err(|e| warn!("用户 {} 的评价提交被拒绝: {}", user_id, e))?;

        info!(
            "评价 {} 已创建 (user = {}, class = {}, score = {:?})",
            evaluation.id, evaluation.user_id, evaluation.class_id, evaluation.score
        );
        Ok(evaluation)
    }

    pub async fn get_evaluation_impl(&self, id: i64) -> Result<Option<Evaluation>> {
        Ok(self.read(|state| state.evaluations.get(&id).cloned()).await)
    }

    pub async fn get_evaluation_details_impl(&self, id: i64) -> Result<Option<EvaluationDetails>> {
        self.read(|state| state.evaluation_details(id)).await
    }

    pub async fn review_evaluation_impl(
        &self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        let edits = review.answers.len();
        let evaluation = self
            .transact(|state| state.review_evaluation(id, reviewer_id, review))
            .await?;

        info!(
            "评价 {} 已由 {} 审核: status = {}, 修订回答 {} 条",
            id, reviewer_id, evaluation.status, edits
        );
        Ok(evaluation)
    }

    pub async fn list_evaluations_impl(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        self.read(|state| state.list_evaluations(&query)).await
    }
}
