use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;
use tracing::{info, warn};

use super::CourseService;
use crate::cache::ObjectCache;
use crate::image_script::{ImageScript, generate_or_empty};
use crate::models::courses::requests::{
    CreateCourseRequest, DEFAULT_COURSE_TYPE, NewCourse, NewDetail,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_course;
use crate::services::{
    StepResult, bad_request, cache_of, internal_error, not_found, respond, script_of,
};
use crate::storage::Storage;
use crate::utils::validate::{is_valid_object_id, normalize_code, parse_day, validate_code};

// 编号冲突时重新分配的次数
const CREATE_ATTEMPTS: usize = 3;

pub async fn create_course(
    service: &CourseService,
    request: &HttpRequest,
    body: CreateCourseRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let script = script_of(request)?;
    let cache = cache_of(request)?;
    let year = chrono::Local::now().format("%y").to_string();

    respond(create(body, &year, storage.as_ref(), script.as_ref(), cache.as_ref()).await)
}

/// 按名称解析教室，任一名称不存在即返回 404
pub(crate) async fn resolve_rooms(
    storage: &dyn Storage,
    names: &[String],
) -> StepResult<HashMap<String, String>> {
    let resolved = storage.resolve_room_ids(names).await.map_err(|e| {
        internal_error(ErrorCode::InternalServerError, "Failed to look up rooms", &e)
    })?;
    if let Some(missing) = names.iter().find(|n| !resolved.contains_key(n.trim())) {
        return Err(not_found(
            ErrorCode::RoomNotFound,
            format!("Room '{}' does not exist", missing.trim()),
        ));
    }
    Ok(resolved)
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// 只保留格式正确的引用 ID
fn valid_id(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|id| is_valid_object_id(id))
        .map(str::to_string)
}

pub(crate) async fn create(
    body: CreateCourseRequest,
    year: &str,
    storage: &dyn Storage,
    script: &dyn ImageScript,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let (Some(code), Some(book), Some(area), Some(teacher_hr), Some(sessions)) = (
        non_empty(body.code.as_ref()),
        non_empty(body.book.as_ref()),
        non_empty(body.area.as_ref()),
        non_empty(body.teacher_hr.as_ref()),
        body.detail.as_ref(),
    ) else {
        return Err(bad_request(ErrorCode::BadRequest, "Missing course information"));
    };

    let code = normalize_code(code);
    if let Err(msg) = validate_code(&code) {
        return Err(bad_request(ErrorCode::BadRequest, msg));
    }

    let mut days = Vec::with_capacity(sessions.len());
    for (i, session) in sessions.iter().enumerate() {
        let topic_ok = session.topic.as_deref().is_some_and(is_valid_object_id);
        let day = session.day.as_deref().and_then(parse_day);
        match (topic_ok, day) {
            (true, Some(day)) => days.push(day),
            _ => {
                return Err(bad_request(
                    ErrorCode::CourseDetailInvalid,
                    format!("Session {}: missing Topic or Day, or invalid ID", i + 1),
                ));
            }
        }
    }

    let mut room_names: Vec<String> = sessions
        .iter()
        .filter_map(|s| s.room_name())
        .map(str::to_string)
        .collect();
    room_names.sort();
    room_names.dedup();
    let rooms = resolve_rooms(storage, &room_names).await?;

    // 教材以编号为主键，只有已存在的教材才会被引用
    let book_id = match storage.get_book_by_id(&normalize_code(book)).await {
        Ok(found) => found.map(|b| b.id),
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                "Failed to look up book",
                &e,
            ));
        }
    };

    let day_labels: Vec<String> = sessions
        .iter()
        .map(|s| s.day.clone().unwrap_or_default())
        .collect();
    let prefix = format!("{year}{code}");

    for _ in 0..CREATE_ATTEMPTS {
        let course_code = storage.next_course_code(&prefix).await.map_err(|e| {
            internal_error(ErrorCode::CourseCreationFailed, "Failed to allocate course code", &e)
        })?;
        let images = generate_or_empty(script, &course_code, &day_labels).await;

        let details = sessions
            .iter()
            .zip(&days)
            .enumerate()
            .map(|(i, (session, day))| NewDetail {
                topic_id: session.topic.as_deref().unwrap_or_default().trim().to_string(),
                day: *day,
                room_id: session.room_name().and_then(|n| rooms.get(n).cloned()),
                time: session.time.clone().unwrap_or_default(),
                teacher_id: valid_id(session.teacher.as_deref()),
                teaching_as: valid_id(session.teaching_as.as_deref()),
                image: images.get(i).cloned().unwrap_or_default(),
                detail_type: None,
                note: String::new(),
            })
            .collect();

        let new_course = NewCourse {
            code: course_code.clone(),
            book_id: book_id.clone(),
            area_id: valid_id(Some(area)),
            teacher_hr: valid_id(Some(teacher_hr)),
            course_type: non_empty(body.course_type.as_ref())
                .unwrap_or(DEFAULT_COURSE_TYPE)
                .to_string(),
            status: body.status.unwrap_or(false),
            details,
        };

        match storage.create_course(new_course).await {
            Ok(course) => {
                reload_course(cache, &course.id, &course.code).await;
                info!("Course {} created with {} sessions", course.code, course.details.len());
                let message = format!("Course {} created successfully", course.code);
                return Ok(HttpResponse::Created().json(ApiResponse::success(course, message)));
            }
            Err(e) if e.is_conflict() => {
                warn!("Course code {} already taken, allocating another", course_code);
            }
            Err(e) => {
                return Err(internal_error(
                    ErrorCode::CourseCreationFailed,
                    "Failed to create course",
                    &e,
                ));
            }
        }
    }

    Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
        ErrorCode::CourseCreationFailed,
        "Could not allocate a unique course code",
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_script::fake::FakeScript;
    use crate::models::areas::requests::CreateAreaRequest;
    use crate::models::courses::requests::CreateDetailInput;
    use crate::services::test_support::{self, course_with_details, object_id};
    use actix_web::http::StatusCode;

    fn session(room: Option<&str>, day: &str) -> CreateDetailInput {
        CreateDetailInput {
            topic: Some(object_id()),
            day: Some(day.to_string()),
            room: room.map(str::to_string),
            time: Some("09:00".into()),
            teacher: Some("not-an-id".into()),
            teaching_as: Some(object_id()),
        }
    }

    fn body(code: &str, sessions: Vec<CreateDetailInput>) -> CreateCourseRequest {
        CreateCourseRequest {
            code: Some(code.to_string()),
            book: Some("robot".into()),
            area: Some(object_id()),
            teacher_hr: Some("hr-1".into()),
            status: None,
            course_type: None,
            detail: Some(sessions),
        }
    }

    async fn seeded_storage() -> std::sync::Arc<dyn Storage> {
        let storage = test_support::storage().await;
        storage
            .create_area(CreateAreaRequest {
                name: "Cau Giay".into(),
                rooms: vec!["P101".into()],
            })
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_create_assigns_next_sequence_and_images() {
        let storage = seeded_storage().await;
        storage
            .create_course(course_with_details("25ROBOT004", 0))
            .await
            .unwrap();
        let script = FakeScript::default();
        let cache = test_support::cache();

        let resp = create(
            body(" robot ", vec![session(Some("P101"), "2025-03-02"), session(None, "09/03/2025")]),
            "25",
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let course = storage.get_course("25ROBOT005").await.unwrap().unwrap();
        assert_eq!(course.version, 1);
        assert_eq!(course.course_type, DEFAULT_COURSE_TYPE);
        assert!(!course.status);
        assert!(course.book_id.is_none());
        assert!(course.area_id.is_some());
        assert!(course.teacher_hr.is_none());
        assert!(course.details[0].room_id.is_some());
        assert!(course.details[1].room_id.is_none());
        assert!(course.details[0].teacher_id.is_none());
        assert!(course.details[0].teaching_as.is_some());
        assert_eq!(course.details[0].image, "img-1");
        assert_eq!(course.details[1].image, "img-2");

        let calls = script.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "25ROBOT005");
        assert_eq!(calls[0].1, "02/03/2025|09/03/2025");
    }

    #[tokio::test]
    async fn test_unknown_room_is_not_found() {
        let storage = seeded_storage().await;
        let cache = test_support::cache();

        let resp = create(
            body("robot", vec![session(Some("P999"), "2025-03-02")]),
            "25",
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(storage.list_course_summaries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_session_is_rejected() {
        let storage = seeded_storage().await;
        let cache = test_support::cache();
        let bad = session(None, "someday");

        let resp = create(
            body("robot", vec![session(None, "2025-03-02"), bad]),
            "25",
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_script_failure_leaves_images_empty() {
        let storage = seeded_storage().await;
        let cache = test_support::cache();

        create(
            body("scratch", vec![session(None, "2025-03-02")]),
            "25",
            storage.as_ref(),
            &FakeScript::failing(),
            cache.as_ref(),
        )
        .await
        .unwrap();

        let course = storage.get_course("25SCRATCH001").await.unwrap().unwrap();
        assert_eq!(course.details[0].image, "");
    }
}
