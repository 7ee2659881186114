use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::BookService;
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::drive::{DriveStorage, DriveUpload, cleanup_files};
use crate::models::books::requests::{CreateBookRequest, parse_price, parse_topics};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_books;
use crate::services::{
    StepResult, bad_request, cache_of, drive_of, internal_error, multipart_rejected, respond,
};
use crate::storage::Storage;
use crate::utils::multipart::{MultipartForm, read_multipart};
use crate::utils::validate::{normalize_code, validate_code};

pub async fn create_book(
    service: &BookService,
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
        create_from_form(
            &form,
            storage.as_ref(),
            drive.as_ref(),
            cache.as_ref(),
            &config.drive.book_folder_id,
        )
        .await,
    )
}

/// 校验表单、上传图片并保存；保存失败时删除已上传的图片
pub(crate) async fn create_from_form(
    form: &MultipartForm,
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    cache: &dyn ObjectCache,
    folder_id: &str,
) -> StepResult<HttpResponse> {
    let (Some(id), Some(name), Some(book_type), Some(price), Some(cover)) = (
        form.text("ID"),
        form.text("Name"),
        form.text("Type"),
        form.text("Price"),
        form.file("Image"),
    ) else {
        return Err(bad_request(
            ErrorCode::BadRequest,
            "ID, Name, Type, Price and Image are required",
        ));
    };

    let id = normalize_code(id);
    if let Err(msg) = validate_code(&id) {
        return Err(bad_request(ErrorCode::BadRequest, msg));
    }
    let topics = parse_topics(form.text("Topics"))
        .map_err(|e| bad_request(ErrorCode::BadRequest, format!("Invalid Topics: {e}")))?;

    match storage.get_book_by_id(&id).await {
        Ok(Some(_)) => {
            return Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
                ErrorCode::BookAlreadyExists,
                format!("ID '{id}' already exists"),
            )));
        }
        Ok(None) => {}
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                "Failed to check book id",
                &e,
            ));
        }
    }

    let cover_id = drive
        .upload(DriveUpload::from(cover), folder_id)
        .await
        .map_err(|e| {
            internal_error(ErrorCode::FileUploadFailed, "Failed to upload cover image", &e)
        })?;

    // 徽章上传失败不影响创建
    let badge_id = match form.file("Badge") {
        Some(badge) => match drive.upload(DriveUpload::from(badge), folder_id).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Badge upload failed for book {}: {}", id, e);
                None
            }
        },
        None => None,
    };

    let request = CreateBookRequest {
        id: id.clone(),
        name: name.to_string(),
        book_type: book_type.to_string(),
        price: parse_price(Some(price)),
        describe: form.text("Describe").map(str::to_string),
        image: Some(cover_id.clone()),
        badge: badge_id.clone(),
        topics,
    };

    match storage.create_book(request).await {
        Ok(book) => {
            reload_books(cache, None).await;
            info!("Book {} created", book.id);
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(book, "Book created successfully")))
        }
        Err(e) => {
            let uploaded: Vec<String> = std::iter::once(cover_id).chain(badge_id).collect();
            cleanup_files(drive, &uploaded).await;
            if e.is_conflict() {
                Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
                    ErrorCode::BookAlreadyExists,
                    format!("ID '{id}' already exists"),
                )))
            } else {
                Err(internal_error(ErrorCode::BookCreationFailed, "Failed to create book", &e))
            }
        }
    }
}
