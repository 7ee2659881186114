//! SeaORM 实体定义
//!
//! 这些实体用于数据库操作，与 models 模块中的业务实体分离。
//! Storage 层使用这些实体进行 CRUD 操作，然后转换为 models 中的业务实体。

pub mod prelude;

pub mod areas;
pub mod book_topics;
pub mod books;
pub mod course_details;
pub mod course_sequences;
pub mod course_students;
pub mod courses;
pub mod detail_media;
pub mod rooms;
pub mod student_lessons;
