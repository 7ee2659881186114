pub mod areas;
pub mod books;
pub mod courses;
pub mod media;
pub mod reload;
pub mod system;

pub use areas::AreaService;
pub use books::BookService;
pub use courses::CourseService;
pub use media::MediaService;
pub use system::SystemService;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;
use tracing::error;

use crate::cache::ObjectCache;
use crate::drive::DriveStorage;
use crate::errors::CourseDeskError;
use crate::image_script::ImageScript;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::multipart::MultipartError;

/// 业务步骤的结果，错误分支直接是要返回给客户端的响应
pub(crate) type StepResult<T> = Result<T, HttpResponse>;

/// 从 app data 中取出注入的共享对象
pub(crate) fn app_data<T: ?Sized + 'static>(request: &HttpRequest) -> ActixResult<Arc<T>> {
    request
        .app_data::<web::Data<Arc<T>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError(format!(
                "{} not found in app data",
                std::any::type_name::<T>()
            ))
        })
}

pub(crate) fn storage_of(request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
    app_data::<dyn Storage>(request)
}

pub(crate) fn cache_of(request: &HttpRequest) -> ActixResult<Arc<dyn ObjectCache>> {
    app_data::<dyn ObjectCache>(request)
}

pub(crate) fn drive_of(request: &HttpRequest) -> ActixResult<Arc<dyn DriveStorage>> {
    app_data::<dyn DriveStorage>(request)
}

pub(crate) fn script_of(request: &HttpRequest) -> ActixResult<Arc<dyn ImageScript>> {
    app_data::<dyn ImageScript>(request)
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub(crate) fn not_found(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(code, message))
}

/// 记录错误并返回 500
pub(crate) fn internal_error(
    code: ErrorCode,
    message: &str,
    err: &CourseDeskError,
) -> HttpResponse {
    error!("{}: {}", message, err);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(code, message))
}

/// 表单读取失败时的响应
pub(crate) fn multipart_rejected(err: MultipartError) -> HttpResponse {
    match err {
        MultipartError::TooLarge(_) => bad_request(ErrorCode::FileSizeExceeded, err.to_string()),
        MultipartError::TooManyFiles(_) | MultipartError::Malformed(_) => {
            bad_request(ErrorCode::BadRequest, err.to_string())
        }
    }
}

/// 把业务步骤的结果收敛为 handler 的返回值
pub(crate) fn respond(result: StepResult<HttpResponse>) -> ActixResult<HttpResponse> {
    Ok(result.unwrap_or_else(|resp| resp))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use crate::cache::ObjectCache;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::models::courses::requests::{NewCourse, NewDetail};
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    pub async fn storage() -> Arc<dyn Storage> {
        Arc::new(SeaOrmStorage::in_memory().await)
    }

    pub fn cache() -> Arc<dyn ObjectCache> {
        Arc::new(MokaCacheWrapper::with_settings(100, 60))
    }

    pub fn object_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// 带若干普通课时的课程
    pub fn course_with_details(code: &str, count: usize) -> NewCourse {
        NewCourse {
            code: code.to_string(),
            book_id: None,
            area_id: None,
            teacher_hr: None,
            course_type: "AI Robotic".to_string(),
            status: false,
            details: (0..count)
                .map(|_| NewDetail {
                    topic_id: object_id(),
                    day: chrono::Utc::now(),
                    room_id: None,
                    time: "09:00".to_string(),
                    teacher_id: None,
                    teaching_as: None,
                    image: "folder-1".to_string(),
                    detail_type: None,
                    note: String::new(),
                })
                .collect(),
        }
    }
}
