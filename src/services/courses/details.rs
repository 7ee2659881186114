//! 课时变更：补课、请假与普通修改共用一个入口

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashSet;
use tracing::info;

use super::CourseService;
use super::create::resolve_rooms;
use crate::cache::ObjectCache;
use crate::image_script::{ImageScript, generate_or_empty};
use crate::models::courses::entities::{Course, DetailType};
use crate::models::courses::requests::{
    DetailEdit, DetailMutation, DetailMutationRequest, DetailPatch, MakeupLesson, NewDetail,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_course;
use crate::services::{
    StepResult, bad_request, cache_of, internal_error, not_found, respond, script_of,
};
use crate::storage::Storage;

pub async fn mutate_detail(
    service: &CourseService,
    request: &HttpRequest,
    body: DetailMutationRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let script = script_of(request)?;
    let cache = cache_of(request)?;

    respond(apply(body, storage.as_ref(), script.as_ref(), cache.as_ref()).await)
}

/// 名单差异：返回 (需要移除, 需要新增)，保持输入顺序
pub fn diff_roster(current: &[String], target: &[String]) -> (Vec<String>, Vec<String>) {
    let current_set: HashSet<&String> = current.iter().collect();
    let target_set: HashSet<&String> = target.iter().collect();

    let mut seen = HashSet::new();
    let remove = current
        .iter()
        .filter(|id| !target_set.contains(id) && seen.insert(*id))
        .cloned()
        .collect();
    let mut seen = HashSet::new();
    let add = target
        .iter()
        .filter(|id| !current_set.contains(id) && seen.insert(*id))
        .cloned()
        .collect();
    (remove, add)
}

fn storage_failure(err: &crate::errors::CourseDeskError) -> HttpResponse {
    internal_error(ErrorCode::CourseDetailUpdateFailed, "Failed to update lesson", err)
}

fn detail_missing() -> HttpResponse {
    not_found(ErrorCode::CourseDetailNotFound, "Course or lesson not found")
}

pub(crate) async fn apply(
    body: DetailMutationRequest,
    storage: &dyn Storage,
    script: &dyn ImageScript,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let command = body
        .into_command()
        .map_err(|msg| bad_request(ErrorCode::CourseDetailInvalid, msg))?;

    let course = match storage.get_course(&command.course_id).await {
        Ok(Some(course)) => course,
        Ok(None) => return Err(not_found(ErrorCode::CourseNotFound, "Course not found")),
        Err(e) => return Err(storage_failure(&e)),
    };

    let message = match command.mutation {
        DetailMutation::Makeup(lesson) => {
            add_makeup(&course, lesson, storage, script).await?;
            "Makeup lesson added successfully"
        }
        DetailMutation::Absence { detail_id, note } => {
            match storage
                .set_detail_type(&course.id, &detail_id, DetailType::ABSENCE, &note)
                .await
            {
                Ok(Some(_)) => {}
                Ok(None) => return Err(detail_missing()),
                Err(e) => return Err(storage_failure(&e)),
            }
            "Lesson marked as absent"
        }
        DetailMutation::Edit { detail_id, edit } => {
            edit_detail(&course, &detail_id, edit, storage).await?;
            "Lesson updated successfully"
        }
    };

    reload_course(cache, &course.id, &course.code).await;
    info!("Course {}: {}", course.code, message);

    match storage.get_course(&course.id).await {
        Ok(Some(updated)) => Ok(HttpResponse::Ok().json(ApiResponse::success(updated, message))),
        Ok(None) => Err(not_found(ErrorCode::CourseNotFound, "Course not found")),
        Err(e) => Err(storage_failure(&e)),
    }
}

async fn add_makeup(
    course: &Course,
    lesson: MakeupLesson,
    storage: &dyn Storage,
    script: &dyn ImageScript,
) -> StepResult<()> {
    let room_name = lesson.room_name.trim().to_string();
    let rooms = resolve_rooms(storage, std::slice::from_ref(&room_name)).await?;

    let image = generate_or_empty(script, &course.code, std::slice::from_ref(&lesson.day_label))
        .await
        .join("|");

    let detail = NewDetail {
        topic_id: lesson.topic_id,
        day: lesson.day,
        room_id: rooms.get(&room_name).cloned(),
        time: lesson.time,
        teacher_id: Some(lesson.teacher_id),
        teaching_as: lesson.teaching_as,
        image,
        detail_type: Some(DetailType::MAKEUP.to_string()),
        note: lesson.note,
    };

    storage
        .append_detail(&course.id, detail, &lesson.students)
        .await
        .map(|_| ())
        .map_err(|e| storage_failure(&e))
}

async fn edit_detail(
    course: &Course,
    detail_id: &str,
    edit: DetailEdit,
    storage: &dyn Storage,
) -> StepResult<()> {
    match storage.get_detail(&course.id, detail_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return Err(detail_missing()),
        Err(e) => return Err(storage_failure(&e)),
    }

    // Room 为 null 或缺失时不修改
    let room_id = match edit.room {
        Some(Some(name)) => {
            let name = name.trim().to_string();
            let rooms = resolve_rooms(storage, std::slice::from_ref(&name)).await?;
            rooms.get(&name).cloned()
        }
        _ => None,
    };

    let patch = DetailPatch {
        room_id,
        teacher_id: edit
            .teacher
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        teaching_as: edit
            .teaching_as
            .map(|value| value.map(|id| id.trim().to_string())),
    };
    if !patch.is_empty() {
        match storage.update_detail(&course.id, detail_id, patch).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(detail_missing()),
            Err(e) => return Err(storage_failure(&e)),
        }
    }

    if let Some(target) = edit.students {
        let current = storage
            .lesson_students(&course.id, detail_id)
            .await
            .map_err(|e| storage_failure(&e))?;
        let (remove, add) = diff_roster(&current, &target);
        storage
            .unlink_students(&course.id, detail_id, &remove)
            .await
            .map_err(|e| storage_failure(&e))?;
        storage
            .link_students(&course.id, detail_id, &add)
            .await
            .map_err(|e| storage_failure(&e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_script::fake::FakeScript;
    use crate::models::areas::requests::CreateAreaRequest;
    use crate::models::courses::requests::StudentInput;
    use crate::services::test_support::{self, course_with_details, object_id};
    use actix_web::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn request(value: serde_json::Value) -> DetailMutationRequest {
        serde_json::from_value(value).unwrap()
    }

    async fn setup() -> (Arc<dyn Storage>, Course) {
        let storage = test_support::storage().await;
        storage
            .create_area(CreateAreaRequest {
                name: "Cau Giay".into(),
                rooms: vec!["P101".into(), "P102".into()],
            })
            .await
            .unwrap();
        let course = storage
            .create_course(course_with_details("25ROBOT001", 2))
            .await
            .unwrap();
        let students = ["A", "B", "C"]
            .iter()
            .map(|id| StudentInput {
                id: id.to_string(),
                name: None,
            })
            .collect();
        storage.attach_students(&course.id, students).await.unwrap();
        (storage, course)
    }

    #[test]
    fn test_roster_diff() {
        let (remove, add) = diff_roster(&ids(&["A", "B"]), &ids(&["B", "C", "C"]));
        assert_eq!(remove, ids(&["A"]));
        assert_eq!(add, ids(&["C"]));

        let (remove, add) = diff_roster(&ids(&["A"]), &ids(&["A"]));
        assert!(remove.is_empty() && add.is_empty());
    }

    #[tokio::test]
    async fn test_edit_students_pulls_and_pushes_links() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();
        let lesson = course.details[0].id.clone();
        storage
            .link_students(&course.id, &lesson, &ids(&["A", "B"]))
            .await
            .unwrap();

        let resp = apply(
            request(json!({
                "courseId": course.code,
                "detailId": lesson,
                "data": { "Students": ["B", "C"] }
            })),
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(
            storage.lesson_students(&course.id, &lesson).await.unwrap(),
            ids(&["B", "C"])
        );
    }

    #[tokio::test]
    async fn test_edit_without_room_keeps_room() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();
        let lesson = course.details[0].id.clone();
        let script = FakeScript::default();

        apply(
            request(json!({
                "courseId": course.id,
                "detailId": lesson,
                "data": { "Room": "P101" }
            })),
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        let room = storage
            .get_detail(&course.id, &lesson)
            .await
            .unwrap()
            .unwrap()
            .room_id;
        assert!(room.is_some());

        let teacher = object_id();
        apply(
            request(json!({
                "courseId": course.id,
                "detailId": lesson,
                "data": { "Teacher": teacher, "TeachingAs": null }
            })),
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        let detail = storage.get_detail(&course.id, &lesson).await.unwrap().unwrap();
        assert_eq!(detail.room_id, room);
        assert_eq!(detail.teacher_id, Some(teacher));
        assert!(detail.teaching_as.is_none());
    }

    #[tokio::test]
    async fn test_edit_with_null_room_keeps_room() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();
        let lesson = course.details[1].id.clone();
        let script = FakeScript::default();

        apply(
            request(json!({
                "courseId": course.id,
                "detailId": lesson,
                "data": { "Room": "P102" }
            })),
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        let before = storage.get_detail(&course.id, &lesson).await.unwrap().unwrap();
        assert!(before.room_id.is_some());

        let teacher = object_id();
        let resp = apply(
            request(json!({
                "courseId": course.id,
                "detailId": lesson,
                "data": { "Room": null, "Teacher": teacher }
            })),
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let after = storage.get_detail(&course.id, &lesson).await.unwrap().unwrap();
        assert_eq!(after.room_id, before.room_id);
        assert_eq!(after.teacher_id, Some(teacher));
    }

    #[tokio::test]
    async fn test_edit_unknown_room_is_not_found() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();

        let resp = apply(
            request(json!({
                "courseId": course.id,
                "detailId": course.details[1].id,
                "data": { "Room": "P999" }
            })),
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_makeup_appends_lesson_for_roster_students() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();
        let script = FakeScript::default();

        let resp = apply(
            request(json!({
                "courseId": course.id,
                "type": "Học bù",
                "student": ["A", "Z"],
                "data": {
                    "Day": "2025-04-01",
                    "Topic": object_id(),
                    "Room": "P102",
                    "Time": "18:00",
                    "Teacher": object_id(),
                    "Note": "bù buổi 2"
                }
            })),
            storage.as_ref(),
            &script,
            cache.as_ref(),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let updated = storage.get_course(&course.id).await.unwrap().unwrap();
        let makeup = updated.details.last().unwrap();
        assert_eq!(updated.details.len(), 3);
        assert_eq!(makeup.detail_type.as_deref(), Some(DetailType::MAKEUP));
        assert_eq!(makeup.image, "img-1");
        assert_eq!(makeup.note, "bù buổi 2");
        assert_eq!(
            storage.lesson_students(&course.id, &makeup.id).await.unwrap(),
            ids(&["A"])
        );
        assert_eq!(script.calls.lock().unwrap()[0].1, "01/04/2025");
    }

    #[tokio::test]
    async fn test_makeup_with_unknown_room_adds_nothing() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();

        let resp = apply(
            request(json!({
                "courseId": course.id,
                "type": "Học bù",
                "data": {
                    "Day": "2025-04-01",
                    "Topic": object_id(),
                    "Room": "Hall",
                    "Time": "18:00",
                    "Teacher": object_id()
                }
            })),
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let unchanged = storage.get_course(&course.id).await.unwrap().unwrap();
        assert_eq!(unchanged.details.len(), 2);
    }

    #[tokio::test]
    async fn test_absence_changes_only_type_and_note() {
        let (storage, course) = setup().await;
        let cache = test_support::cache();
        let before = course.details[1].clone();

        apply(
            request(json!({
                "courseId": course.id,
                "detailId": before.id,
                "type": "Báo nghỉ",
                "data": { "Note": "Teacher sick", "Time": "23:00" }
            })),
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap();

        let after = storage.get_detail(&course.id, &before.id).await.unwrap().unwrap();
        assert_eq!(after.detail_type.as_deref(), Some(DetailType::ABSENCE));
        assert_eq!(after.note, "Teacher sick");
        assert_eq!(after.time, before.time);
        assert_eq!(after.room_id, before.room_id);
        assert_eq!(after.topic_id, before.topic_id);
    }

    #[tokio::test]
    async fn test_missing_course_is_not_found() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();

        let resp = apply(
            request(json!({
                "courseId": object_id(),
                "detailId": object_id(),
                "type": "Báo nghỉ",
                "data": {}
            })),
            storage.as_ref(),
            &FakeScript::default(),
            cache.as_ref(),
        )
        .await
        .unwrap_err();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
