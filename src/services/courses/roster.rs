use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CourseService;
use crate::cache::ObjectCache;
use crate::models::courses::entities::Course;
use crate::models::courses::requests::{AttachStudentsRequest, StudentInput};
use crate::models::courses::responses::RosterChangeResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_course;
use crate::services::{StepResult, bad_request, cache_of, internal_error, not_found, respond};
use crate::storage::Storage;

pub async fn attach_students(
    service: &CourseService,
    request: &HttpRequest,
    course_key: String,
    body: AttachStudentsRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;
    respond(attach(&course_key, body, storage.as_ref(), cache.as_ref()).await)
}

pub async fn detach_student(
    service: &CourseService,
    request: &HttpRequest,
    course_key: String,
    student_id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;
    respond(detach(&course_key, &student_id, storage.as_ref(), cache.as_ref()).await)
}

async fn load_course(storage: &dyn Storage, key: &str) -> StepResult<Course> {
    match storage.get_course(key).await {
        Ok(Some(course)) => Ok(course),
        Ok(None) => Err(not_found(ErrorCode::CourseNotFound, "Course not found")),
        Err(e) => Err(internal_error(
            ErrorCode::InternalServerError,
            "Failed to load course",
            &e,
        )),
    }
}

pub(crate) async fn attach(
    course_key: &str,
    body: AttachStudentsRequest,
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let students: Vec<StudentInput> = body
        .students
        .into_iter()
        .map(|s| StudentInput {
            id: s.id.trim().to_string(),
            name: s.name.map(|n| n.trim().to_string()),
        })
        .filter(|s| !s.id.is_empty())
        .collect();
    if students.is_empty() {
        return Err(bad_request(ErrorCode::BadRequest, "No students provided"));
    }

    let course = load_course(storage, course_key).await?;
    let added = storage
        .attach_students(&course.id, students)
        .await
        .map_err(|e| {
            internal_error(ErrorCode::InternalServerError, "Failed to attach students", &e)
        })?;

    if added > 0 {
        reload_course(cache, &course.id, &course.code).await;
    }
    info!("Attached {} students to course {}", added, course.code);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        RosterChangeResponse { added, removed: 0 },
        "Students attached successfully",
    )))
}

pub(crate) async fn detach(
    course_key: &str,
    student_id: &str,
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let course = load_course(storage, course_key).await?;
    let removed = storage
        .detach_student(&course.id, student_id.trim())
        .await
        .map_err(|e| {
            internal_error(ErrorCode::InternalServerError, "Failed to detach student", &e)
        })?;
    if !removed {
        return Err(not_found(ErrorCode::NotFound, "Student is not in this course"));
    }

    reload_course(cache, &course.id, &course.code).await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        RosterChangeResponse { added: 0, removed: 1 },
        "Student removed from course",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{self, course_with_details};
    use actix_web::http::StatusCode;

    fn body(ids: &[&str]) -> AttachStudentsRequest {
        AttachStudentsRequest {
            students: ids
                .iter()
                .map(|id| StudentInput {
                    id: id.to_string(),
                    name: Some(format!("Student {id}")),
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_attach_then_detach() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();

        attach("25ROBOT001", body(&["s1", " s2 ", ""]), storage.as_ref(), cache.as_ref())
            .await
            .unwrap();
        let loaded = storage.get_course(&course.id).await.unwrap().unwrap();
        assert_eq!(loaded.students.len(), 2);
        assert!(loaded.students.iter().all(|s| s.learn.is_empty()));

        let resp = detach(&course.id, "s1", storage.as_ref(), cache.as_ref())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let missing = detach(&course.id, "s1", storage.as_ref(), cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_attach_requires_students_and_course() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();

        let empty = attach("25X001", body(&[]), storage.as_ref(), cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let missing = attach("25X001", body(&["s1"]), storage.as_ref(), cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
