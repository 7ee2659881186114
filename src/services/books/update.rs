use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::BookService;
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::drive::{DriveStorage, DriveUpload, cleanup_files};
use crate::models::books::requests::{UpdateBookRequest, parse_price};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_books;
use crate::services::{
    StepResult, bad_request, cache_of, drive_of, internal_error, multipart_rejected, not_found,
    respond,
};
use crate::storage::Storage;
use crate::utils::multipart::{MultipartForm, read_multipart};
use crate::utils::validate::normalize_code;

pub async fn update_book(
    service: &BookService,
    request: &HttpRequest,
    book_id: String,
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
        update_from_form(
            &book_id,
            &form,
            storage.as_ref(),
            drive.as_ref(),
            cache.as_ref(),
            &config.drive.book_folder_id,
        )
        .await,
    )
}

pub(crate) async fn update_from_form(
    book_id: &str,
    form: &MultipartForm,
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    cache: &dyn ObjectCache,
    folder_id: &str,
) -> StepResult<HttpResponse> {
    let book_id = normalize_code(book_id);
    let Some(name) = form.text("Name").filter(|_| !book_id.is_empty()) else {
        return Err(bad_request(ErrorCode::BadRequest, "ID and Name are required"));
    };

    let existing = match storage.get_book_by_id(&book_id).await {
        Ok(Some(book)) => book,
        Ok(None) => return Err(not_found(ErrorCode::BookNotFound, "Book not found")),
        Err(e) => {
            return Err(internal_error(
                ErrorCode::InternalServerError,
                "Failed to load book",
                &e,
            ));
        }
    };

    let new_cover = match form.file("Image") {
        Some(file) => Some(drive.upload(DriveUpload::from(file), folder_id).await.map_err(|e| {
            internal_error(ErrorCode::FileUploadFailed, "Failed to upload new cover image", &e)
        })?),
        None => None,
    };
    let new_badge = match form.file("Badge") {
        Some(file) => match drive.upload(DriveUpload::from(file), folder_id).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Badge upload failed for book {}: {}", book_id, e);
                None
            }
        },
        None => None,
    };
    let uploaded: Vec<String> = new_cover.iter().chain(new_badge.iter()).cloned().collect();

    let update = UpdateBookRequest {
        name: name.to_string(),
        price: parse_price(form.text("Price")),
        describe: form.text("Describe").map(str::to_string),
        image: new_cover.clone(),
        badge: new_badge.clone(),
    };

    let book = match storage.update_book(&book_id, update).await {
        Ok(Some(book)) => book,
        Ok(None) => {
            cleanup_files(drive, &uploaded).await;
            return Err(not_found(ErrorCode::BookNotFound, "Book not found"));
        }
        Err(e) => {
            cleanup_files(drive, &uploaded).await;
            return Err(internal_error(ErrorCode::BookUpdateFailed, "Failed to update book", &e));
        }
    };

    // 保存成功后再删除被替换的旧图片
    let mut replaced = Vec::new();
    if new_cover.is_some()
        && let Some(old) = existing.image
    {
        replaced.push(old);
    }
    if new_badge.is_some()
        && let Some(old) = existing.badge
    {
        replaced.push(old);
    }
    cleanup_files(drive, &replaced).await;

    reload_books(cache, Some(&book_id)).await;
    info!("Book {} updated", book_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(book, "Book updated successfully")))
}
