//! SeaORM 存储实现
//!
//! 统一的关系型存储层，支持 SQLite、PostgreSQL 和 MySQL。
//! 所有多行写入都在显式事务内完成：`begin` → 读取（加行锁）→ 计算 → 写回 → `commit`，
//! 任一步失败都会先回滚再把错误交给调用方。
//!
//! 写操作经 [`SeaOrmStorage::write`] 执行：SQLite 只允许一个写事务，进程内的写入
//! 先排队再开启事务；评分条件更新失败或数据库忙时整体重试，次数有限。

mod catalog;
mod evaluations;
mod feedbacks;
mod questions;

use crate::config::DatabaseConfig;
use crate::errors::{EvalSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub const PLUGIN_NAME: &str = "sea_orm";

/// 写事务最多执行的次数
const WRITE_ATTEMPTS: u32 = 5;
/// 重试前的基础等待时间，按次数翻倍
const RETRY_BACKOFF: Duration = Duration::from_millis(20);

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
    // 仅 SQLite：串行化进程内的写事务
    write_gate: Option<Arc<Mutex<()>>>,
}

impl SeaOrmStorage {
    /// 按数据库配置连接并运行迁移
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(&config.url)?;

        // 根据数据库类型选择连接方式
        let is_sqlite = db_url.starts_with("sqlite:");
        let db = if is_sqlite {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self {
            db,
            write_gate: is_sqlite.then(|| Arc::new(Mutex::new(()))),
        })
    }

    /// SQLite 专用连接（文件库使用 WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");

        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| EvalSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            opt = opt
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal)
                .pragma("cache_size", "-64000")
                .pragma("temp_store", "memory")
                .pragma("wal_autocheckpoint", "1000");
        }

        // 内存库只存在于单个连接上，连接不能被回收
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.pool_size)
                .min_connections(1)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool_options
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(config.timeout))
            .connect_with(opt)
            .await
            .map_err(|e| EvalSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| EvalSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(EvalSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite:, postgres://, mysql://, memory://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 执行一次写操作
    ///
    /// `attempt` 每次调用都必须开启并结束自己的事务；只有并发冲突和数据库忙会触发重试。
    pub(crate) async fn write<T, F, Fut>(&self, op: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let _gate = match &self.write_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        let mut tries = 1;
        loop {
            match attempt().await {
                Err(err) if tries < WRITE_ATTEMPTS && is_transient(&err) => {
                    warn!("{op} 第 {tries} 次执行遇到并发写入，稍后重试: {err}");
                    tokio::time::sleep(RETRY_BACKOFF * 2u32.pow(tries - 1)).await;
                    tries += 1;
                }
                result => return result,
            }
        }
    }

    /// 开启事务
    pub(crate) async fn begin(&self) -> Result<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| EvalSystemError::database_operation(format!("开启事务失败: {e}")))
    }

    /// 根据事务内操作的结果提交或回滚
    pub(crate) async fn finish<T>(txn: DatabaseTransaction, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                txn.commit().await.map_err(|e| {
                    EvalSystemError::database_operation(format!("提交事务失败: {e}"))
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback().await {
                    warn!("回滚事务失败: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

/// 可以重新执行整个事务的错误
fn is_transient(err: &EvalSystemError) -> bool {
    match err {
        EvalSystemError::ConcurrentModification(_) => true,
        EvalSystemError::DatabaseOperation(msg) => {
            msg.contains("database is locked") || msg.contains("SQLITE_BUSY")
        }
        _ => false,
    }
}

/// 当前时间（秒级时间戳）
pub(crate) fn now_ts() -> i64 {
    chrono::Utc::now().timestamp()
}

// Storage trait 实现
use crate::consistency::rating::{RatingAggregate, RatingChange};
use crate::models::{
    common::{Page, PageRequest},
    evaluations::{
        entities::Evaluation,
        requests::{ClassTarget, EvaluationListQuery, EvaluationSubmission, ReviewEvaluationRequest},
        responses::{EvaluationDetails, EvaluationListResponse},
    },
    feedbacks::{
        entities::Feedback,
        requests::{CreateFeedbackRequest, FeedbackListQuery, UpdateFeedbackRequest},
    },
    questions::{
        entities::{Question, QuestionRemoval},
        requests::{CreateQuestionRequest, UpdateQuestionRequest},
    },
    teachers::{
        entities::{Class, Course, Teacher},
        requests::{CreateClassRequest, CreateCourseRequest, CreateTeacherRequest},
    },
};
use crate::storage::Storage;
use async_trait::async_trait;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 问题模块
    async fn list_questions(&self, active_only: bool) -> Result<Vec<Question>> {
        self.list_questions_impl(active_only).await
    }

    async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        self.get_question_impl(id).await
    }

    async fn create_question(&self, req: CreateQuestionRequest) -> Result<Question> {
        self.write("create_question", || self.create_question_impl(req.clone()))
            .await
    }

    async fn update_question(&self, id: i64, update: UpdateQuestionRequest) -> Result<Question> {
        self.write("update_question", || {
            self.update_question_impl(id, update.clone())
        })
        .await
    }

    async fn remove_question(&self, id: i64) -> Result<QuestionRemoval> {
        self.write("remove_question", || self.remove_question_impl(id))
            .await
    }

    // 教师与课程模块
    async fn create_teacher(&self, req: CreateTeacherRequest) -> Result<Teacher> {
        self.write("create_teacher", || self.create_teacher_impl(req.clone()))
            .await
    }

    async fn create_course(&self, req: CreateCourseRequest) -> Result<Course> {
        self.write("create_course", || self.create_course_impl(req.clone()))
            .await
    }

    async fn create_class(&self, req: CreateClassRequest) -> Result<Class> {
        self.write("create_class", || self.create_class_impl(req.clone()))
            .await
    }

    async fn get_teacher(&self, id: i64) -> Result<Option<Teacher>> {
        self.get_teacher_impl(id).await
    }

    async fn resolve_class(&self, target: &ClassTarget) -> Result<Class> {
        self.resolve_class_impl(target).await
    }

    async fn list_teachers(&self, page: PageRequest) -> Result<Page<Teacher>> {
        self.list_teachers_impl(page).await
    }

    async fn apply_rating_change(
        &self,
        teacher_id: i64,
        change: RatingChange,
    ) -> Result<RatingAggregate> {
        self.write("apply_rating_change", || {
            self.apply_rating_change_impl(teacher_id, change)
        })
        .await
    }

    // 评价模块
    async fn create_evaluation(
        &self,
        user_id: i64,
        submission: EvaluationSubmission,
    ) -> Result<Evaluation> {
        self.write("create_evaluation", || {
            self.create_evaluation_impl(user_id, submission.clone())
        })
        .await
    }

    async fn get_evaluation(&self, id: i64) -> Result<Option<Evaluation>> {
        self.get_evaluation_impl(id).await
    }

    async fn get_evaluation_details(&self, id: i64) -> Result<Option<EvaluationDetails>> {
        self.get_evaluation_details_impl(id).await
    }

    async fn review_evaluation(
        &self,
        id: i64,
        reviewer_id: i64,
        review: ReviewEvaluationRequest,
    ) -> Result<Evaluation> {
        self.write("review_evaluation", || {
            self.review_evaluation_impl(id, reviewer_id, review.clone())
        })
        .await
    }

    async fn list_evaluations(
        &self,
        query: EvaluationListQuery,
    ) -> Result<EvaluationListResponse> {
        self.list_evaluations_impl(query).await
    }

    // 反馈模块
    async fn create_feedback(&self, user_id: i64, req: CreateFeedbackRequest) -> Result<Feedback> {
        self.write("create_feedback", || {
            self.create_feedback_impl(user_id, req.clone())
        })
        .await
    }

    async fn get_feedback(&self, id: i64) -> Result<Option<Feedback>> {
        self.get_feedback_impl(id).await
    }

    async fn update_feedback(&self, id: i64, update: UpdateFeedbackRequest) -> Result<Feedback> {
        self.write("update_feedback", || {
            self.update_feedback_impl(id, update.clone())
        })
        .await
    }

    async fn delete_feedback(&self, id: i64) -> Result<Feedback> {
        self.write("delete_feedback", || self.delete_feedback_impl(id))
            .await
    }

    async fn list_feedbacks(&self, query: FeedbackListQuery) -> Result<Page<Feedback>> {
        self.list_feedbacks_impl(query).await
    }
}
