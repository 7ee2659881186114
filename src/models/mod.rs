pub mod areas;
pub mod auth;
pub mod books;
pub mod common;
pub mod courses;
pub mod media;
pub mod system;

pub use common::{ApiResponse, PaginationInfo};

/// 程序启动时间，用于健康检查计算运行时长
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// 业务错误码，随 `ApiResponse.code` 返回给前端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,
    InvalidObjectId = 1006,

    // 教材
    BookAlreadyExists = 2001,
    BookNotFound = 2002,
    BookCreationFailed = 2003,
    BookUpdateFailed = 2004,

    // 课程与课时
    CourseNotFound = 3001,
    CourseCreationFailed = 3002,
    CourseDetailNotFound = 3003,
    CourseDetailInvalid = 3004,
    CourseDetailUpdateFailed = 3005,
    RoomNotFound = 3006,
    AreaAlreadyExists = 3007,

    // 文件与媒体
    FileUploadFailed = 4000,
    FileTypeNotAllowed = 4001,
    FileSizeExceeded = 4002,
    FileNotFound = 4003,
    MediaNotFound = 4004,
    BatchNotFound = 4005,
}
