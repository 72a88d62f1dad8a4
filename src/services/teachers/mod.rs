use std::sync::Arc;

use tracing::info;

use crate::errors::{EvalSystemError, Result};
use crate::models::common::{Page, PageRequest};
use crate::models::teachers::{
    entities::{Class, Course, Teacher},
    requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
};
use crate::models::users::entities::Identity;
use crate::storage::Storage;

pub struct TeacherService {
    storage: Arc<dyn Storage>,
}

impl TeacherService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // 按姓名列出教师及其评分
    pub async fn list(&self, page: PageRequest) -> Result<Page<Teacher>> {
        self.storage.list_teachers(page).await
    }

    pub async fn get(&self, id: i64) -> Result<Teacher> {
        self.storage
            .get_teacher(id)
            .await?
            .ok_or_else(|| EvalSystemError::not_found(format!("Teacher {id} not found")))
    }

    pub async fn create_teacher(
        &self,
        identity: &Identity,
        req: CreateTeacherRequest,
    ) -> Result<Teacher> {
        identity.require_admin("create teachers")?;
        check_not_blank("Teacher name", &req.name)?;

        let teacher = self.storage.create_teacher(req).await?;
        info!("Teacher {} created by {}", teacher.id, identity.user_id);
        Ok(teacher)
    }

    pub async fn create_course(
        &self,
        identity: &Identity,
        req: CreateCourseRequest,
    ) -> Result<Course> {
        identity.require_admin("create courses")?;
        check_not_blank("Course name", &req.name)?;
        check_not_blank("Course code", &req.code)?;

        let course = self.storage.create_course(req).await?;
        info!(
            "Course {} ({}) created by {}",
            course.id, course.code, identity.user_id
        );
        Ok(course)
    }

    pub async fn create_class(&self, identity: &Identity, req: CreateClassRequest) -> Result<Class> {
        identity.require_admin("create classes")?;

        let class = self.storage.create_class(req).await?;
        info!(
            "Class {} (teacher {}, course {}, {}) created by {}",
            class.id, class.teacher_id, class.course_id, class.semester, identity.user_id
        );
        Ok(class)
    }
}

fn check_not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EvalSystemError::validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}
