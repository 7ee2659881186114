use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{MediaService, accepted_kind, reload_lesson_course, store_media};
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::drive::{DriveStorage, DriveUpload};
use crate::models::media::entities::MediaType;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    StepResult, bad_request, cache_of, drive_of, internal_error, multipart_rejected, not_found,
    respond,
};
use crate::storage::Storage;
use crate::utils::multipart::{MultipartForm, read_multipart};
use crate::utils::validate::is_valid_object_id;

pub async fn upload_media(
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
        upload(
            &form,
            &config.upload.allowed_mime_prefixes,
            storage.as_ref(),
            drive.as_ref(),
            cache.as_ref(),
        )
        .await,
    )
}

pub(crate) async fn upload(
    form: &MultipartForm,
    allowed: &[String],
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    let Some(detail_id) = form.text("detailId").filter(|id| is_valid_object_id(id)) else {
        return Err(bad_request(ErrorCode::BadRequest, "Missing or invalid detailId"));
    };
    let Some(file) = form.file("images") else {
        return Err(bad_request(ErrorCode::FileNotFound, "No file found in upload payload"));
    };

    let Some(kind) = accepted_kind(&file.mime(), allowed) else {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only images and videos are supported",
        ));
    };
    // fileType 只作为客户端声明，与实际内容不符时拒绝
    if let Some(declared) = form.text("fileType").and_then(|t| t.parse::<MediaType>().ok())
        && declared != kind
    {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            format!("fileType '{declared}' does not match the uploaded file"),
        ));
    }

    let detail = match storage.get_detail_by_id(detail_id).await {
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

    let item = store_media(storage, drive, &detail.id, &folder_id, DriveUpload::from(file), kind)
        .await
        .map_err(|e| internal_error(ErrorCode::FileUploadFailed, "Failed to upload file", &e))?;

    reload_lesson_course(storage, cache, &detail.course_id).await;
    info!("Uploaded {} {} to lesson {}", kind, item.id, detail.id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        vec![item.id],
        "File uploaded successfully",
    )))
}
