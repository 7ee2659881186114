//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod areas;
mod books;
mod courses;
mod details;
mod media;
mod roster;

use crate::config::{AppConfig, DatabaseConfig};
use crate::errors::{CourseDeskError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

/// 数据库错误附加上下文，唯一约束冲突保持为 Conflict
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(DbErr) -> CourseDeskError {
    move |err| match CourseDeskError::from(err) {
        CourseDeskError::DatabaseOperation(msg) => {
            CourseDeskError::database_operation(format!("{context}: {msg}"))
        }
        other => other,
    }
}

impl SeaOrmStorage {
    /// 使用全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(&config.database.url, &config.database).await
    }

    /// 连接数据库并执行迁移
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Migrator::up(&db, None)
            .await
            .map_err(|e| CourseDeskError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化，内存库除外）
    async fn connect_sqlite(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let in_memory = url.contains(":memory:");
        let mut opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| CourseDeskError::database_config(format!("SQLite URL 解析失败: {e}")))?
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

        // 内存库只存在于单个连接中，连接不能被回收
        let mut pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { config.pool_size })
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.timeout));
        pool = if in_memory {
            pool.idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            pool.test_before_acquire(true)
                .idle_timeout(Duration::from_secs(300))
        };

        let pool = pool
            .connect_with(opt)
            .await
            .map_err(|e| CourseDeskError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &DatabaseConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.timeout))
            .acquire_timeout(Duration::from_secs(config.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| CourseDeskError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(CourseDeskError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 测试用内存数据库（已执行迁移）
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            pool_size: 1,
            timeout: 5,
        };
        Self::connect(&config.url, &config)
            .await
            .expect("in-memory sqlite should open")
    }
}

// Storage trait 实现
use crate::models::{
    areas::{entities::Area, requests::CreateAreaRequest},
    books::{
        entities::Book,
        requests::{CreateBookRequest, UpdateBookRequest},
    },
    courses::{
        entities::{Course, CourseDetail, CourseSummary},
        requests::{DetailPatch, NewCourse, NewDetail, StudentInput},
    },
    media::entities::{MediaItem, NewMedia},
};
use crate::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
impl Storage for SeaOrmStorage {
    // 教材模块
    async fn create_book(&self, book: CreateBookRequest) -> Result<Book> {
        self.create_book_impl(book).await
    }

    async fn get_book_by_id(&self, id: &str) -> Result<Option<Book>> {
        self.get_book_by_id_impl(id).await
    }

    async fn list_books(&self) -> Result<Vec<Book>> {
        self.list_books_impl().await
    }

    async fn update_book(&self, id: &str, update: UpdateBookRequest) -> Result<Option<Book>> {
        self.update_book_impl(id, update).await
    }

    // 校区模块
    async fn create_area(&self, area: CreateAreaRequest) -> Result<Area> {
        self.create_area_impl(area).await
    }

    async fn list_areas(&self) -> Result<Vec<Area>> {
        self.list_areas_impl().await
    }

    async fn resolve_room_ids(&self, names: &[String]) -> Result<HashMap<String, String>> {
        self.resolve_room_ids_impl(names).await
    }

    // 课程模块
    async fn next_course_code(&self, prefix: &str) -> Result<String> {
        self.next_course_code_impl(prefix).await
    }

    async fn create_course(&self, course: NewCourse) -> Result<Course> {
        self.create_course_impl(course).await
    }

    async fn get_course(&self, key: &str) -> Result<Option<Course>> {
        self.get_course_impl(key).await
    }

    async fn find_course_id(&self, key: &str) -> Result<Option<String>> {
        self.find_course_id_impl(key).await
    }

    async fn list_course_summaries(&self) -> Result<Vec<CourseSummary>> {
        self.list_course_summaries_impl().await
    }

    // 课时模块
    async fn append_detail(
        &self,
        course_id: &str,
        detail: NewDetail,
        students: &[String],
    ) -> Result<CourseDetail> {
        self.append_detail_impl(course_id, detail, students).await
    }

    async fn get_detail(&self, course_id: &str, detail_id: &str) -> Result<Option<CourseDetail>> {
        self.get_detail_impl(Some(course_id), detail_id).await
    }

    async fn get_detail_by_id(&self, detail_id: &str) -> Result<Option<CourseDetail>> {
        self.get_detail_impl(None, detail_id).await
    }

    async fn set_detail_type(
        &self,
        course_id: &str,
        detail_id: &str,
        detail_type: &str,
        note: &str,
    ) -> Result<Option<CourseDetail>> {
        self.set_detail_type_impl(course_id, detail_id, detail_type, note)
            .await
    }

    async fn update_detail(
        &self,
        course_id: &str,
        detail_id: &str,
        patch: DetailPatch,
    ) -> Result<Option<CourseDetail>> {
        self.update_detail_impl(course_id, detail_id, patch).await
    }

    // 名单模块
    async fn lesson_students(&self, course_id: &str, detail_id: &str) -> Result<Vec<String>> {
        self.lesson_students_impl(course_id, detail_id).await
    }

    async fn link_students(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize> {
        self.link_students_impl(course_id, detail_id, student_ids)
            .await
    }

    async fn unlink_students(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize> {
        self.unlink_students_impl(course_id, detail_id, student_ids)
            .await
    }

    async fn attach_students(&self, course_id: &str, students: Vec<StudentInput>) -> Result<usize> {
        self.attach_students_impl(course_id, students).await
    }

    async fn detach_student(&self, course_id: &str, student_id: &str) -> Result<bool> {
        self.detach_student_impl(course_id, student_id).await
    }

    // 媒体模块
    async fn add_media(&self, detail_id: &str, media: NewMedia) -> Result<MediaItem> {
        self.add_media_impl(detail_id, media).await
    }

    async fn list_media(&self, detail_id: &str) -> Result<Vec<MediaItem>> {
        self.list_media_impl(detail_id).await
    }

    async fn get_media(&self, id: &str) -> Result<Option<MediaItem>> {
        self.get_media_impl(id).await
    }

    async fn replace_media(&self, old_id: &str, media: NewMedia) -> Result<Option<MediaItem>> {
        self.replace_media_impl(old_id, media).await
    }

    async fn delete_media(&self, id: &str) -> Result<bool> {
        self.delete_media_impl(id).await
    }
}
