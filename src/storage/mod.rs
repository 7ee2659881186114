use std::collections::HashMap;
use std::sync::Arc;

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

use crate::errors::Result;

pub mod sea_orm_storage;

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 教材
    // 创建教材及其主题；编号重复返回 Conflict
    async fn create_book(&self, book: CreateBookRequest) -> Result<Book>;
    async fn get_book_by_id(&self, id: &str) -> Result<Option<Book>>;
    async fn list_books(&self) -> Result<Vec<Book>>;
    async fn update_book(&self, id: &str, update: UpdateBookRequest) -> Result<Option<Book>>;

    /// 校区与教室
    async fn create_area(&self, area: CreateAreaRequest) -> Result<Area>;
    async fn list_areas(&self) -> Result<Vec<Area>>;
    // 按名称批量查找教室，返回 名称 -> ID
    async fn resolve_room_ids(&self, names: &[String]) -> Result<HashMap<String, String>>;

    /// 课程
    // 为 `{yy}{code}` 前缀分配下一个编号
    async fn next_course_code(&self, prefix: &str) -> Result<String>;
    async fn create_course(&self, course: NewCourse) -> Result<Course>;
    // 按内部 ID 或对外编号查询完整课程
    async fn get_course(&self, key: &str) -> Result<Option<Course>>;
    async fn find_course_id(&self, key: &str) -> Result<Option<String>>;
    async fn list_course_summaries(&self) -> Result<Vec<CourseSummary>>;

    /// 课时
    // 追加课时，并为名单中出现在 students 里的学生添加上课记录
    async fn append_detail(
        &self,
        course_id: &str,
        detail: NewDetail,
        students: &[String],
    ) -> Result<CourseDetail>;
    async fn get_detail(&self, course_id: &str, detail_id: &str) -> Result<Option<CourseDetail>>;
    async fn get_detail_by_id(&self, detail_id: &str) -> Result<Option<CourseDetail>>;
    // 只修改类型与备注
    async fn set_detail_type(
        &self,
        course_id: &str,
        detail_id: &str,
        detail_type: &str,
        note: &str,
    ) -> Result<Option<CourseDetail>>;
    async fn update_detail(
        &self,
        course_id: &str,
        detail_id: &str,
        patch: DetailPatch,
    ) -> Result<Option<CourseDetail>>;

    /// 名单与上课记录
    // 上课记录包含该课时的学生
    async fn lesson_students(&self, course_id: &str, detail_id: &str) -> Result<Vec<String>>;
    async fn link_students(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize>;
    async fn unlink_students(
        &self,
        course_id: &str,
        detail_id: &str,
        student_ids: &[String],
    ) -> Result<usize>;
    async fn attach_students(&self, course_id: &str, students: Vec<StudentInput>) -> Result<usize>;
    async fn detach_student(&self, course_id: &str, student_id: &str) -> Result<bool>;

    /// 课时媒体
    async fn add_media(&self, detail_id: &str, media: NewMedia) -> Result<MediaItem>;
    async fn list_media(&self, detail_id: &str) -> Result<Vec<MediaItem>>;
    async fn get_media(&self, id: &str) -> Result<Option<MediaItem>>;
    // 用新文件替换旧记录，保留所属课时
    async fn replace_media(&self, old_id: &str, media: NewMedia) -> Result<Option<MediaItem>>;
    async fn delete_media(&self, id: &str) -> Result<bool>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
