pub mod batch;
pub mod delete;
pub mod list;
pub mod replace;
pub mod upload;

pub use batch::BatchRegistry;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::warn;

use crate::cache::ObjectCache;
use crate::drive::{DriveStorage, DriveUpload, cleanup_files};
use crate::errors::Result;
use crate::models::media::entities::{MediaItem, MediaType, NewMedia};
use crate::services::reload::reload_course;
use crate::storage::Storage;

pub struct MediaService {
    storage: Option<Arc<dyn Storage>>,
}

impl MediaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_of(request),
        }
    }

    // 课时图库
    pub async fn list_media(
        &self,
        request: &HttpRequest,
        course_key: String,
        detail_id: String,
    ) -> ActixResult<HttpResponse> {
        list::list_media(self, request, course_key, detail_id).await
    }

    // 上传单个文件到课时文件夹
    pub async fn upload_media(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        upload::upload_media(self, request, payload).await
    }

    pub async fn replace_media(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        replace::replace_media(self, request, payload).await
    }

    pub async fn delete_media(
        &self,
        request: &HttpRequest,
        id: String,
    ) -> ActixResult<HttpResponse> {
        delete::delete_media(self, request, id).await
    }

    // 批量上传：创建任务、查询进度、取消
    pub async fn start_batch(
        &self,
        request: &HttpRequest,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        batch::start_batch(self, request, payload).await
    }

    pub async fn batch_progress(
        &self,
        request: &HttpRequest,
        job_id: String,
    ) -> ActixResult<HttpResponse> {
        batch::batch_progress(request, job_id).await
    }

    pub async fn cancel_batch(
        &self,
        request: &HttpRequest,
        job_id: String,
    ) -> ActixResult<HttpResponse> {
        batch::cancel_batch(request, job_id).await
    }
}

/// 按配置的 MIME 前缀判断是否接受，并给出媒体类型
pub fn accepted_kind(mime: &str, allowed_prefixes: &[String]) -> Option<MediaType> {
    let mime = mime.trim().to_ascii_lowercase();
    if !allowed_prefixes
        .iter()
        .any(|prefix| mime.starts_with(&prefix.to_ascii_lowercase()))
    {
        return None;
    }
    MediaType::from_mime(&mime)
}

/// 上传到 Drive 并写入记录；写入失败时删除刚上传的文件
pub(crate) async fn store_media(
    storage: &dyn Storage,
    drive: &dyn DriveStorage,
    detail_id: &str,
    folder_id: &str,
    file: DriveUpload,
    kind: MediaType,
) -> Result<MediaItem> {
    let file_name = file.name.clone();
    let file_id = drive.upload(file, folder_id).await?;
    let record = NewMedia {
        id: file_id.clone(),
        media_type: kind,
        file_name,
    };
    match storage.add_media(detail_id, record).await {
        Ok(item) => Ok(item),
        Err(e) => {
            cleanup_files(drive, std::slice::from_ref(&file_id)).await;
            Err(e)
        }
    }
}

/// 课时所属课程的缓存失效
pub(crate) async fn reload_lesson_course(
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
    course_id: &str,
) {
    match storage.get_course(course_id).await {
        Ok(Some(course)) => reload_course(cache, &course.id, &course.code).await,
        Ok(None) => {}
        Err(e) => warn!("Failed to reload course {}: {}", course_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes() -> Vec<String> {
        vec!["image/".to_string(), "video/".to_string()]
    }

    #[test]
    fn test_accepted_kind_follows_prefixes() {
        assert_eq!(accepted_kind("image/jpeg", &prefixes()), Some(MediaType::Image));
        assert_eq!(accepted_kind("Video/MP4", &prefixes()), Some(MediaType::Video));
        assert_eq!(accepted_kind("application/pdf", &prefixes()), None);
        assert_eq!(accepted_kind("video/mp4", &["image/".to_string()]), None);
    }
}
