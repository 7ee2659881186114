use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::MediaService;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{internal_error, not_found};

pub async fn list_media(
    service: &MediaService,
    request: &HttpRequest,
    course_key: String,
    detail_id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let course_id = match storage.find_course_id(&course_key).await {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(not_found(ErrorCode::CourseNotFound, "Course not found")),
        Err(e) => {
            return Ok(internal_error(ErrorCode::InternalServerError, "Failed to load course", &e));
        }
    };

    match storage.get_detail(&course_id, detail_id.trim()).await {
        Ok(Some(detail)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail.media,
            "Media retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::CourseDetailNotFound, "Lesson not found")),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to list media",
            &e,
        )),
    }
}
