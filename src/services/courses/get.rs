use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::CourseService;
use crate::cache::{CacheResult, ObjectCache, keys};
use crate::errors::Result;
use crate::models::common::pagination::PaginationQuery;
use crate::models::courses::entities::{Course, CourseSummary};
use crate::models::courses::responses::CourseListResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{cache_of, internal_error, not_found};
use crate::storage::Storage;
use crate::utils::validate::{is_valid_object_id, normalize_code};

pub async fn list_courses(
    service: &CourseService,
    request: &HttpRequest,
    query: PaginationQuery,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;

    match cached_summaries(storage.as_ref(), cache.as_ref()).await {
        Ok(all) => {
            let (items, pagination) = query.paginate(&all);
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                CourseListResponse { items, pagination },
                "Courses retrieved successfully",
            )))
        }
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to list courses",
            &e,
        )),
    }
}

pub async fn get_course(
    service: &CourseService,
    request: &HttpRequest,
    key: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;

    match cached_course(storage.as_ref(), cache.as_ref(), key.trim()).await {
        Ok(Some(course)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            course,
            "Course retrieved successfully",
        ))),
        Ok(None) => Ok(not_found(ErrorCode::CourseNotFound, "Course not found")),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to get course",
            &e,
        )),
    }
}

async fn cached_summaries(
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
) -> Result<Vec<CourseSummary>> {
    if let CacheResult::Found(all) = cache.get::<Vec<CourseSummary>>(keys::COURSES_ALL).await {
        return Ok(all);
    }
    let all = storage.list_course_summaries().await?;
    cache.insert(keys::COURSES_ALL, &all, 0).await;
    Ok(all)
}

/// 以请求中的键缓存，reload 时按内部 ID 与编号两种键失效
pub(crate) async fn cached_course(
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
    key: &str,
) -> Result<Option<Course>> {
    let key = if is_valid_object_id(key) {
        key.trim().to_string()
    } else {
        normalize_code(key)
    };
    let cache_key = keys::course(&key);
    if let CacheResult::Found(course) = cache.get::<Course>(&cache_key).await {
        return Ok(Some(course));
    }
    let course = storage.get_course(&key).await?;
    if let Some(course) = &course {
        cache.insert(&cache_key, course, 0).await;
    }
    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reload::reload_course;
    use crate::services::test_support::{self, course_with_details};

    #[tokio::test]
    async fn test_cached_course_refreshes_after_reload() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();

        let first = cached_course(storage.as_ref(), cache.as_ref(), "25robot001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.version, 1);

        storage
            .set_detail_type(&course.id, &course.details[0].id, "Báo nghỉ", "")
            .await
            .unwrap();
        let stale = cached_course(storage.as_ref(), cache.as_ref(), "25ROBOT001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stale.version, 1);

        reload_course(cache.as_ref(), &course.id, &course.code).await;
        let fresh = cached_course(storage.as_ref(), cache.as_ref(), "25ROBOT001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fresh.version, 2);
    }
}
