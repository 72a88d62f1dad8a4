//! 教师、课程、开课存储操作，以及评分聚合的原子更新

use super::{SeaOrmStorage, now_ts};
use crate::consistency::rating::{RatingAggregate, RatingChange};
use crate::entity::classes::{
    ActiveModel as ClassActiveModel, Column as ClassColumn, Entity as Classes,
};
use crate::entity::courses::{
    ActiveModel as CourseActiveModel, Column as CourseColumn, Entity as Courses,
};
use crate::entity::teachers::{
    ActiveModel as TeacherActiveModel, Column as TeacherColumn, Entity as Teachers,
    Model as TeacherModel,
};
use crate::errors::{EvalSystemError, Result};
use crate::models::{
    common::{Page, PageRequest, PageSize},
    evaluations::requests::ClassTarget,
    teachers::{
        entities::{Class, Course, Teacher},
        requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
    },
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::{info, warn};

/// 在事务内解析开课引用
pub(super) async fn resolve_class_in<C: ConnectionTrait>(
    conn: &C,
    target: &ClassTarget,
) -> Result<Class> {
    let found = match target {
        ClassTarget::Class { class_id } => Classes::find_by_id(*class_id).one(conn).await,
        ClassTarget::Pairing {
            teacher_id,
            course_id,
        } => {
            Classes::find()
                .filter(ClassColumn::TeacherId.eq(*teacher_id))
                .filter(ClassColumn::CourseId.eq(*course_id))
                .order_by_desc(ClassColumn::Semester)
                .one(conn)
                .await
        }
    }
    .map_err(|e| EvalSystemError::database_operation(format!("查询开课失败: {e}")))?;

    found.map(|m| m.into_class()).ok_or_else(|| match target {
        ClassTarget::Class { class_id } => {
            EvalSystemError::not_found(format!("Class {class_id} not found"))
        }
        ClassTarget::Pairing {
            teacher_id,
            course_id,
        } => EvalSystemError::not_found(format!(
            "Teacher {teacher_id} does not teach course {course_id}"
        )),
    })
}

/// 加行锁读取教师
pub(super) async fn lock_teacher<C: ConnectionTrait>(conn: &C, id: i64) -> Result<TeacherModel> {
    Teachers::find_by_id(id)
        .lock_exclusive()
        .one(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?
        .ok_or_else(|| EvalSystemError::not_found(format!("Teacher {id} not found")))
}

/// 条件更新评分聚合
///
/// 写回时以读到的 `(rating, rating_count)` 为条件，条件不成立说明有并发写入，返回冲突。
pub(super) async fn apply_rating_in<C: ConnectionTrait>(
    conn: &C,
    teacher: &TeacherModel,
    change: RatingChange,
) -> Result<RatingAggregate> {
    let current = RatingAggregate::new(teacher.rating, teacher.rating_count);
    let next = current.apply(change)?;

    let result = Teachers::update_many()
        .set(TeacherActiveModel {
            rating: Set(next.rating),
            rating_count: Set(next.count),
            ..Default::default()
        })
        .filter(TeacherColumn::Id.eq(teacher.id))
        .filter(TeacherColumn::Rating.eq(current.rating))
        .filter(TeacherColumn::RatingCount.eq(current.count))
        .exec(conn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("更新教师评分失败: {e}")))?;

    if result.rows_affected == 0 {
        warn!("教师 {} 的评分在读取后被并发修改", teacher.id);
        return Err(EvalSystemError::concurrent_modification(format!(
            "Rating of teacher {} was modified concurrently",
            teacher.id
        )));
    }

    Ok(next)
}

async fn create_course_in(txn: &DatabaseTransaction, req: CreateCourseRequest) -> Result<Course> {
    let taken = Courses::find()
        .filter(CourseColumn::Code.eq(req.code.as_str()))
        .count(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?;
    if taken > 0 {
        return Err(EvalSystemError::conflict(format!(
            "Course code '{}' already exists",
            req.code
        )));
    }

    let model = CourseActiveModel {
        name: Set(req.name),
        code: Set(req.code),
        ..Default::default()
    };
    let inserted = model
        .insert(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("创建课程失败: {e}")))?;
    Ok(inserted.into_course())
}

async fn create_class_in(txn: &DatabaseTransaction, req: CreateClassRequest) -> Result<Class> {
    req.check_semester()?;

    if Teachers::find_by_id(req.teacher_id)
        .one(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?
        .is_none()
    {
        return Err(EvalSystemError::not_found(format!(
            "Teacher {} not found",
            req.teacher_id
        )));
    }
    if Courses::find_by_id(req.course_id)
        .one(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询课程失败: {e}")))?
        .is_none()
    {
        return Err(EvalSystemError::not_found(format!(
            "Course {} not found",
            req.course_id
        )));
    }

    let duplicate = Classes::find()
        .filter(ClassColumn::TeacherId.eq(req.teacher_id))
        .filter(ClassColumn::CourseId.eq(req.course_id))
        .filter(ClassColumn::Semester.eq(req.semester.as_str()))
        .count(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("查询开课失败: {e}")))?;
    if duplicate > 0 {
        return Err(EvalSystemError::conflict(format!(
            "Teacher {} already teaches course {} in {}",
            req.teacher_id, req.course_id, req.semester
        )));
    }

    let model = ClassActiveModel {
        teacher_id: Set(req.teacher_id),
        course_id: Set(req.course_id),
        semester: Set(req.semester),
        created_at: Set(now_ts()),
        ..Default::default()
    };
    let inserted = model
        .insert(txn)
        .await
        .map_err(|e| EvalSystemError::database_operation(format!("创建开课失败: {e}")))?;
    Ok(inserted.into_class())
}

async fn apply_rating_change_in(
    txn: &DatabaseTransaction,
    teacher_id: i64,
    change: RatingChange,
) -> Result<RatingAggregate> {
    let teacher = lock_teacher(txn, teacher_id).await?;
    apply_rating_in(txn, &teacher, change).await
}

impl SeaOrmStorage {
    /// 创建教师，评分聚合从空开始
    pub async fn create_teacher_impl(&self, req: CreateTeacherRequest) -> Result<Teacher> {
        let model = TeacherActiveModel {
            name: Set(req.name),
            rating: Set(0.0),
            rating_count: Set(0),
            created_at: Set(now_ts()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("创建教师失败: {e}")))?;

        Ok(result.into_teacher())
    }

    /// 创建课程（课程代码唯一）
    pub async fn create_course_impl(&self, req: CreateCourseRequest) -> Result<Course> {
        let txn = self.begin().await?;
        let result = create_course_in(&txn, req).await;
        Self::finish(txn, result).await
    }

    /// 创建开课
    pub async fn create_class_impl(&self, req: CreateClassRequest) -> Result<Class> {
        let txn = self.begin().await?;
        let result = create_class_in(&txn, req).await;
        Self::finish(txn, result).await
    }

    /// 通过 ID 获取教师
    pub async fn get_teacher_impl(&self, id: i64) -> Result<Option<Teacher>> {
        let result = Teachers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师失败: {e}")))?;

        Ok(result.map(|m| m.into_teacher()))
    }

    /// 解析开课引用
    pub async fn resolve_class_impl(&self, target: &ClassTarget) -> Result<Class> {
        resolve_class_in(&self.db, target).await
    }

    /// 按姓名列出教师（文档游标：游标为上一页最后一位教师的 ID）
    pub async fn list_teachers_impl(&self, page: PageRequest) -> Result<Page<Teacher>> {
        let size = page.size()?;
        let mut select = Teachers::find();

        if let (PageSize::Limited(_), Some(cursor)) = (size, page.cursor.as_deref()) {
            let anchor = match cursor.parse::<i64>() {
                Ok(id) => Teachers::find_by_id(id).one(&self.db).await.map_err(|e| {
                    EvalSystemError::database_operation(format!("查询游标教师失败: {e}"))
                })?,
                Err(_) => None,
            };
            // 游标对应的教师不存在时从头开始
            if let Some(anchor) = anchor {
                select = select.filter(
                    Condition::any()
                        .add(TeacherColumn::Name.gt(anchor.name.as_str()))
                        .add(
                            Condition::all()
                                .add(TeacherColumn::Name.eq(anchor.name.as_str()))
                                .add(TeacherColumn::Id.gt(anchor.id)),
                        ),
                );
            }
        }

        let rows = select
            .order_by_asc(TeacherColumn::Name)
            .order_by_asc(TeacherColumn::Id)
            .limit(page.fetch_limit()?)
            .all(&self.db)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("查询教师列表失败: {e}")))?;

        let teachers = rows.into_iter().map(|m| m.into_teacher()).collect();
        Ok(Page::from_cursor_rows(teachers, size, |t: &Teacher| {
            t.id.to_string()
        }))
    }

    /// 原子地推进评分聚合
    pub async fn apply_rating_change_impl(
        &self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate> {
        let txn = self.begin().await?;
        let result = apply_rating_change_in(&txn, teacher_id, change).await;
        let next = Self::finish(txn, result).await?;

        info!(
            "教师 {} 评分已更新: rating = {:.4}, count = {}",
            teacher_id, next.rating, next.count
        );
        Ok(next)
    }
}
