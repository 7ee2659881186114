use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{MediaService, accepted_kind, reload_lesson_course};
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::drive::{DriveStorage, DriveUpload, cleanup_files};
use crate::models::media::entities::NewMedia;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    StepResult, bad_request, cache_of, drive_of, internal_error, multipart_rejected, not_found,
    respond,
};
use crate::storage::Storage;
use crate::utils::multipart::{MultipartForm, read_multipart};

pub async fn replace_media(
    service: &MediaService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let form = match read_multipart(payload, config.upload.max_size).await {
        Ok(form) => form,
        Err(e) => return Ok(multipart_rejected(e)),
    };

    let storage = service.get_storage(request)?;
    let drive = drive_of(request)?;
    let cache = cache_of(request)?;

    respond(
        replace(
            &form,
            &config.upload.allowed_mime_prefixes,
            storage.as_ref(),
            drive.as_ref(),
            cache.as_ref(),
        )
        .await,
    )
}

/// 上传新文件、更新记录，再删除旧文件；类型必须与原文件一致
pub(crate) async fn replace(
    form: &MultipartForm,
    allowed: &[String],
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let (Some(old_id), Some(file)) = (form.text("id"), form.file("newImage")) else {
        return Err(bad_request(ErrorCode::BadRequest, "id and newImage are required"));
    };

    let existing = match storage.get_media(old_id).await {
        Ok(Some(item)) => item,
        Ok(None) => return Err(not_found(ErrorCode::MediaNotFound, "Media not found")),
        Err(e) => {
            return Err(internal_error(ErrorCode::InternalServerError, "Failed to load media", &e));
        }
    };
    match accepted_kind(&file.mime(), allowed) {
        Some(kind) if kind == existing.media_type => {}
        _ => {
            return Err(bad_request(
                ErrorCode::FileTypeNotAllowed,
                format!("The new file must be a {}", existing.media_type),
            ));
        }
    }

    let detail = match storage.get_detail_by_id(&existing.detail_id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => return Err(not_found(ErrorCode::CourseDetailNotFound, "Lesson not found")),
        Err(e) => {
            return Err(internal_error(ErrorCode::InternalServerError, "Failed to load lesson", &e));
        }
    };
    let folder_id = form
        .text("folderId")
        .map(str::to_string)
        .unwrap_or_else(|| detail.image.trim().to_string());
    if folder_id.is_empty() {
        return Err(bad_request(ErrorCode::BadRequest, "Lesson has no media folder"));
    }

    let upload = DriveUpload::from(file);
    let file_name = upload.name.clone();
    let new_id = drive
        .upload(upload, &folder_id)
        .await
        .map_err(|e| internal_error(ErrorCode::FileUploadFailed, "Failed to upload new file", &e))?;

    let replacement = NewMedia {
        id: new_id.clone(),
        media_type: existing.media_type,
        file_name,
    };
    let item = match storage.replace_media(&existing.id, replacement).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            cleanup_files(drive, std::slice::from_ref(&new_id)).await;
            return Err(not_found(ErrorCode::MediaNotFound, "Media not found"));
        }
        Err(e) => {
            cleanup_files(drive, std::slice::from_ref(&new_id)).await;
            return Err(internal_error(
                ErrorCode::FileUploadFailed,
                "Failed to update media record",
                &e,
            ));
        }
    };

    // 记录切换后再删旧文件，旧文件已不存在也继续
    cleanup_files(drive, std::slice::from_ref(&existing.id)).await;

    reload_lesson_course(storage, cache, &detail.course_id).await;
    info!("Replaced media {} with {}", existing.id, item.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(item, "Media replaced successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::fake::FakeDrive;
    use crate::models::media::entities::MediaType;
    use crate::services::media::upload::tests::{allowed, media_form};
    use crate::services::test_support::{self, course_with_details};
    use actix_web::http::StatusCode;

    async fn seeded() -> (std::sync::Arc<dyn Storage>, String) {
        let storage = test_support::storage().await;
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();
        let detail_id = course.details[0].id.clone();
        storage
            .add_media(
                &detail_id,
                NewMedia {
                    id: "old-file".into(),
                    media_type: MediaType::Image,
                    file_name: "old.png".into(),
                },
            )
            .await
            .unwrap();
        (storage, detail_id)
    }

    #[tokio::test]
    async fn test_replace_uploads_new_and_deletes_old() {
        let (storage, detail_id) = seeded().await;
        let cache = test_support::cache();
        let drive = FakeDrive::default();

        let form = media_form(&[("id", "old-file")], Some(("newImage", "new.jpg", "image/jpeg")));
        let resp = replace(&form, &allowed(), storage.as_ref(), &drive, cache.as_ref())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        assert_eq!(drive.deleted_ids(), vec!["old-file"]);
        let media = storage.list_media(&detail_id).await.unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].id, "drive-1");
        assert_eq!(media[0].file_name, "new.jpg");
    }

    #[tokio::test]
    async fn test_replace_requires_same_kind() {
        let (storage, _) = seeded().await;
        let cache = test_support::cache();
        let drive = FakeDrive::default();

        let form = media_form(&[("id", "old-file")], Some(("newImage", "clip.mp4", "video/mp4")));
        let resp = replace(&form, &allowed(), storage.as_ref(), &drive, cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(drive.uploaded_ids().is_empty());
        assert!(storage.get_media("old-file").await.unwrap().is_some());
    }
}
