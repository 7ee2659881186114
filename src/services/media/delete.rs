use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::{MediaService, reload_lesson_course};
use crate::cache::ObjectCache;
use crate::drive::DriveStorage;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    StepResult, bad_request, cache_of, drive_of, internal_error, not_found, respond,
};
use crate::storage::Storage;

pub async fn delete_media(
    service: &MediaService,
    request: &HttpRequest,
    id: String,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let drive = drive_of(request)?;
    let cache = cache_of(request)?;
    respond(delete(id.trim(), storage.as_ref(), drive.as_ref(), cache.as_ref()).await)
}

/// Drive 上已不存在的文件视为删除成功
pub(crate) async fn delete(
    id: &str,
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    if id.is_empty() {
        return Err(bad_request(ErrorCode::BadRequest, "Missing media id"));
    }
    let item = match storage.get_media(id).await {
        Ok(Some(item)) => item,
        Ok(None) => return Err(not_found(ErrorCode::MediaNotFound, "Media not found")),
        Err(e) => {
            return Err(internal_error(ErrorCode::InternalServerError, "Failed to load media", &e));
        }
    };

    match drive.delete(id).await {
        Ok(true) => {}
        Ok(false) => warn!("Drive file {} was already gone", id),
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                "Failed to delete file from Drive",
                &e,
            ));
        }
    }

    if let Err(e) = storage.delete_media(id).await {
        return Err(internal_error(
            ErrorCode::InternalServerError,
            "Failed to delete media record",
            &e,
        ));
    }

    if let Ok(Some(detail)) = storage.get_detail_by_id(&item.detail_id).await {
        reload_lesson_course(storage, cache, &detail.course_id).await;
    }
    info!("Deleted media {}", id);
    Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Media deleted successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::fake::FakeDrive;
    use crate::models::media::entities::{MediaType, NewMedia};
    use crate::services::test_support::{self, course_with_details};
    use actix_web::http::StatusCode;

    async fn storage_with_file() -> std::sync::Arc<dyn Storage> {
        let storage = test_support::storage().await;
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();
        storage
            .add_media(
                &course.details[0].id,
                NewMedia {
                    id: "file-1".into(),
                    media_type: MediaType::Video,
                    file_name: "clip.mp4".into(),
                },
            )
            .await
            .unwrap();
        storage
    }

    #[tokio::test]
    async fn test_delete_removes_file_and_record() {
        let storage = storage_with_file().await;
        let cache = test_support::cache();
        let drive = FakeDrive::default();

        let resp = delete("file-1", storage.as_ref(), &drive, cache.as_ref()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(drive.deleted_ids(), vec!["file-1"]);
        assert!(storage.get_media("file-1").await.unwrap().is_none());

        let again = delete("file-1", storage.as_ref(), &drive, cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(again.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_file_already_gone_from_drive_still_removes_record() {
        let storage = storage_with_file().await;
        let cache = test_support::cache();
        let drive = FakeDrive::with_missing(&["file-1"]);

        let resp = delete("file-1", storage.as_ref(), &drive, cache.as_ref()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(drive.deleted_ids().is_empty());
        assert!(storage.get_media("file-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_drive_error_keeps_record() {
        let storage = storage_with_file().await;
        let cache = test_support::cache();
        let drive = FakeDrive::failing_deletes(&["file-1"]);

        let resp = delete("file-1", storage.as_ref(), &drive, cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(storage.get_media("file-1").await.unwrap().is_some());
    }
}
