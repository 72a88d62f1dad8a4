//! 教师、课程、开课文档操作，以及评分聚合

use super::{MemoryState, MemoryStorage, next_id, now};
use crate::consistency::rating::{RatingAggregate, RatingChange};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, PageRequest, paginate_after},
    evaluations::requests::ClassTarget,
    teachers::{
        entities::{Class, Course, Teacher},
        requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
    },
};
use tracing::info;

impl MemoryState {
    pub(super) fn resolve_class(&self, target: &ClassTarget) -> Result<Class> {
        match target {
            ClassTarget::Class { class_id } => self
                .classes
                .get(class_id)
                .cloned()
                .ok_or_else(|| EvalSystemError::not_found(format!("Class {class_id} not found"))),
            ClassTarget::Pairing {
                teacher_id,
                course_id,
            } => self
                .classes
                .values()
                .filter(|c| c.teacher_id == *teacher_id && c.course_id == *course_id)
                .max_by(|a, b| a.semester.cmp(&b.semester))
                .cloned()
                .ok_or_else(|| {
                    EvalSystemError::not_found(format!(
                        "Teacher {teacher_id} does not teach course {course_id}"
                    ))
                }),
        }
    }

    /// 推进评分聚合；互斥锁保证读写之间没有其他写入
    pub(super) fn apply_rating(
        &mut self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate> {
        let teacher = self
            .teachers
            .get_mut(&teacher_id)
            .ok_or_else(|| EvalSystemError::not_found(format!("Teacher {teacher_id} not found")))?;
        let next = teacher.aggregate().apply(change)?;
        teacher.rating = next.rating;
        teacher.rating_count = next.count;
        Ok(next)
    }

    fn create_teacher(&mut self, req: CreateTeacherRequest) -> Teacher {
        let id = next_id(&mut self.seq.teachers);
        let teacher = Teacher {
            id,
            name: req.name,
            rating: 0.0,
            rating_count: 0,
            created_at: now(),
        };
        self.teachers.insert(id, teacher.clone());
        teacher
    }

    fn create_course(&mut self, req: CreateCourseRequest) -> Result<Course> {
        if self.courses.values().any(|c| c.code == req.code) {
            return Err(EvalSystemError::conflict(format!(
                "Course code '{}' already exists",
                req.code
            )));
        }
        let id = next_id(&mut self.seq.courses);
        let course = Course {
            id,
            name: req.name,
            code: req.code,
        };
        self.courses.insert(id, course.clone());
        Ok(course)
    }

    fn create_class(&mut self, req: CreateClassRequest) -> Result<Class> {
        req.check_semester()?;
        if !self.teachers.contains_key(&req.teacher_id) {
            return Err(EvalSystemError::not_found(format!(
                "Teacher {} not found",
                req.teacher_id
            )));
        }
        if !self.courses.contains_key(&req.course_id) {
            return Err(EvalSystemError::not_found(format!(
                "Course {} not found",
                req.course_id
            )));
        }
        if self.classes.values().any(|c| {
            c.teacher_id == req.teacher_id
                && c.course_id == req.course_id
                && c.semester == req.semester
        }) {
            return Err(EvalSystemError::conflict(format!(
                "Teacher {} already teaches course {} in {}",
                req.teacher_id, req.course_id, req.semester
            )));
        }

        let id = next_id(&mut self.seq.classes);
        let class = Class {
            id,
            teacher_id: req.teacher_id,
            course_id: req.course_id,
            semester: req.semester,
        };
        self.classes.insert(id, class.clone());
        Ok(class)
    }
}

impl MemoryStorage {
    pub async fn create_teacher_impl(&self, req: CreateTeacherRequest) -> Result<Teacher> {
        self.transact(|state| Ok(state.create_teacher(req))).await
    }

    pub async fn create_course_impl(&self, req: CreateCourseRequest) -> Result<Course> {
        self.transact(|state| state.create_course(req)).await
    }

    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        self.transact(|state| state.create_class(req)).await
    }

    pub async fn get_teacher_impl(&self, id: i64) -> Result<Option<Teacher>> {
        Ok(self.read(|state| state.teachers.get(&id).cloned()).await)
    }

    pub async fn resolve_class_impl(&self, target: &ClassTarget) -> Result<Class> {
        self.read(|state| state.resolve_class(target)).await
    }

    /// 按姓名列出教师
    pub async fn list_teachers_impl(&self, page: PageRequest) -> Result<Page<Teacher>> {
        let mut teachers: Vec<Teacher> = self
            .read(|state| state.teachers.values().cloned().collect())
            .await;
        teachers.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        paginate_after(teachers, &page, |t| t.id.to_string())
    }

    pub async fn apply_rating_change_impl(
        &self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate> {
        let next = self
            .transact(|state| state.apply_rating(teacher_id, change))
            .await?;
        info!(
            "教师 {} 评分已更新: rating = {:.4}, count = {}",
            teacher_id, next.rating, next.count
        );
        Ok(next)
    }
}
