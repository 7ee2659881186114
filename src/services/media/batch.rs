//! 批量上传任务
//!
//! 任务在后台顺序上传，进度保存在内存注册表中。取消只设置标记，
//! 当前文件传完后才生效。

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{MediaService, accepted_kind, reload_lesson_course, store_media};
use crate::cache::ObjectCache;
use crate::config::AppConfig;
use crate::drive::{DriveStorage, DriveUpload};
use crate::models::media::entities::MediaType;
use crate::models::media::responses::{BatchCreatedResponse, BatchProgress};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{
    StepResult, app_data, bad_request, cache_of, drive_of, internal_error, multipart_rejected,
    not_found,
};
use crate::storage::Storage;
use crate::utils::multipart::{MultipartForm, read_multipart_limited};
use crate::utils::validate::is_valid_object_id;

const CANCELLED_MESSAGE: &str = "Upload cancelled by user";

pub struct BatchJob {
    progress: Mutex<BatchProgress>,
    cancel_requested: AtomicBool,
    finished_at: Mutex<Option<DateTime<Utc>>>,
}

impl BatchJob {
    fn new(progress: BatchProgress) -> Self {
        Self {
            progress: Mutex::new(progress),
            cancel_requested: AtomicBool::new(false),
            finished_at: Mutex::new(None),
        }
    }

    pub async fn snapshot(&self) -> BatchProgress {
        self.progress.lock().await.clone()
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::SeqCst)
    }

    async fn finish(&self) {
        self.progress.lock().await.finished = true;
        *self.finished_at.lock().await = Some(Utc::now());
    }
}

/// 进程内的批量任务表
pub struct BatchRegistry {
    jobs: DashMap<String, Arc<BatchJob>>,
    retention: chrono::Duration,
}

impl BatchRegistry {
    pub fn new(retention_secs: i64) -> Self {
        Self {
            jobs: DashMap::new(),
            retention: chrono::Duration::seconds(retention_secs.max(0)),
        }
    }

    pub fn register(
        &self,
        detail_id: &str,
        total: usize,
        rejected: Vec<String>,
    ) -> (String, Arc<BatchJob>) {
        let job_id = uuid::Uuid::new_v4().to_string();
        let job = Arc::new(BatchJob::new(BatchProgress {
            job_id: job_id.clone(),
            detail_id: detail_id.to_string(),
            total,
            rejected,
            ..Default::default()
        }));
        self.jobs.insert(job_id.clone(), job.clone());
        (job_id, job)
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<BatchJob>> {
        self.jobs.get(job_id).map(|entry| entry.value().clone())
    }

    /// 清理超过保留时间的已结束任务
    pub async fn prune(&self) {
        let cutoff = Utc::now() - self.retention;
        let jobs: Vec<(String, Arc<BatchJob>)> = self
            .jobs
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for (job_id, job) in jobs {
            if let Some(finished_at) = *job.finished_at.lock().await
                && finished_at <= cutoff
            {
                self.jobs.remove(&job_id);
                debug!("Pruned batch job {}", job_id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// 后台任务所需的协作对象
pub(crate) struct BatchContext {
    pub storage: Arc<dyn Storage>,
    pub drive: Arc<dyn DriveStorage>,
    pub cache: Arc<dyn ObjectCache>,
    pub detail_id: String,
    pub course_id: String,
    pub folder_id: String,
}

/// 校验通过、等待上传的批次
pub(crate) struct PreparedBatch {
    pub detail_id: String,
    pub course_id: String,
    pub folder_id: String,
    pub files: Vec<(DriveUpload, MediaType)>,
    pub rejected: Vec<String>,
}

pub async fn start_batch(
    service: &MediaService,
    request: &HttpRequest,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let form = match read_multipart_limited(
        payload,
        config.upload.max_size,
        config.upload.max_batch_files,
    )
    .await
    {
        Ok(form) => form,
        Err(e) => return Ok(multipart_rejected(e)),
    };

    let registry = app_data::<BatchRegistry>(request)?;
    let storage = service.get_storage(request)?;
    let drive = drive_of(request)?;
    let cache = cache_of(request)?;

    let prepared = match prepare(
        &form,
        &config.upload.allowed_mime_prefixes,
        config.upload.max_batch_files,
        storage.as_ref(),
    )
    .await
    {
        Ok(prepared) => prepared,
        Err(resp) => return Ok(resp),
    };

    registry.prune().await;
    let total = prepared.files.len();
    let rejected = prepared.rejected.clone();
    let (job_id, job) = registry.register(&prepared.detail_id, total, prepared.rejected);
    let context = BatchContext {
        storage,
        drive,
        cache,
        detail_id: prepared.detail_id,
        course_id: prepared.course_id,
        folder_id: prepared.folder_id,
    };
    actix_web::rt::spawn(run_batch(job, prepared.files, context));

    info!("Started batch job {} with {} files", job_id, total);
    Ok(HttpResponse::Accepted().json(ApiResponse::success(
        BatchCreatedResponse {
            job_id,
            total,
            rejected,
        },
        "Batch upload started",
    )))
}

pub async fn batch_progress(request: &HttpRequest, job_id: String) -> ActixResult<HttpResponse> {
    let registry = app_data::<BatchRegistry>(request)?;
    match registry.get(&job_id) {
        Some(job) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            job.snapshot().await,
            "Batch progress retrieved successfully",
        ))),
        None => Ok(not_found(ErrorCode::BatchNotFound, "Batch job not found")),
    }
}

pub async fn cancel_batch(request: &HttpRequest, job_id: String) -> ActixResult<HttpResponse> {
    let registry = app_data::<BatchRegistry>(request)?;
    let Some(job) = registry.get(&job_id) else {
        return Ok(not_found(ErrorCode::BatchNotFound, "Batch job not found"));
    };
    job.request_cancel();
    info!("Cancellation requested for batch job {}", job_id);
    Ok(HttpResponse::Ok().json(ApiResponse::success(
        job.snapshot().await,
        "Cancellation requested",
    )))
}

/// 校验表单并拆分出可上传与被拒绝的文件
pub(crate) async fn prepare(
    form: &MultipartForm,
    allowed: &[String],
    max_files: usize,
    storage: &dyn Storage,
) -> StepResult<PreparedBatch> {
    let Some(detail_id) = form.text("detailId").filter(|id| is_valid_object_id(id)) else {
        return Err(bad_request(ErrorCode::BadRequest, "Missing or invalid detailId"));
    };

    let uploads: Vec<_> = form.files_named("images").filter(|f| !f.is_empty()).collect();
    if uploads.is_empty() {
        return Err(bad_request(ErrorCode::FileNotFound, "No file found in upload payload"));
    }
    if uploads.len() > max_files {
        return Err(bad_request(
            ErrorCode::BadRequest,
            format!("At most {max_files} files can be uploaded at once"),
        ));
    }

    let mut files = Vec::with_capacity(uploads.len());
    let mut rejected = Vec::new();
    for file in uploads {
        match accepted_kind(&file.mime(), allowed) {
            Some(kind) => files.push((DriveUpload::from(file), kind)),
            None => rejected.push(file.file_name.clone()),
        }
    }
    if files.is_empty() {
        return Err(bad_request(
            ErrorCode::FileTypeNotAllowed,
            "Only images and videos are supported",
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

    Ok(PreparedBatch {
        detail_id: detail.id,
        course_id: detail.course_id,
        folder_id,
        files,
        rejected,
    })
}

/// 顺序上传，每个文件开始前检查取消标记
pub(crate) async fn run_batch(
    job: Arc<BatchJob>,
    files: Vec<(DriveUpload, MediaType)>,
    context: BatchContext,
) {
    let total = files.len();
    for (index, (file, kind)) in files.into_iter().enumerate() {
        if job.is_cancel_requested() {
            let mut progress = job.progress.lock().await;
            progress.cancelled = true;
            progress.last_error = CANCELLED_MESSAGE.to_string();
            break;
        }

        let name = file.name.clone();
        job.progress.lock().await.current_file = format!("({}/{}) {}", index + 1, total, name);

        let result = store_media(
            context.storage.as_ref(),
            context.drive.as_ref(),
            &context.detail_id,
            &context.folder_id,
            file,
            kind,
        )
        .await;

        let mut progress = job.progress.lock().await;
        match result {
            Ok(item) => {
                progress.success += 1;
                progress.uploaded_ids.push(item.id);
            }
            Err(e) => {
                warn!("Batch upload of {} failed: {}", name, e);
                progress.failed += 1;
                progress.last_error = format!("File \"{name}\": {e}");
            }
        }
    }

    job.finish().await;
    let progress = job.snapshot().await;
    if progress.success > 0 {
        reload_lesson_course(context.storage.as_ref(), context.cache.as_ref(), &context.course_id)
            .await;
    }
    info!(
        "Batch job {} finished: {} succeeded, {} failed, cancelled: {}",
        progress.job_id, progress.success, progress.failed, progress.cancelled
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::fake::FakeDrive;
    use crate::services::media::upload::tests::{allowed, media_form};
    use crate::services::test_support::{self, course_with_details};
    use crate::utils::multipart::UploadedFile;
    use actix_web::http::StatusCode;
    use actix_web::web::Bytes;

    fn upload(name: &str, mime: &str) -> (DriveUpload, MediaType) {
        let kind = MediaType::from_mime(mime).unwrap();
        (
            DriveUpload {
                name: name.to_string(),
                mime: mime.to_string(),
                bytes: Bytes::from_static(b"media-bytes"),
            },
            kind,
        )
    }

    async fn context(drive: Arc<FakeDrive>) -> (BatchContext, Arc<dyn Storage>) {
        let storage = test_support::storage().await;
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();
        let context = BatchContext {
            storage: storage.clone(),
            drive,
            cache: test_support::cache(),
            detail_id: course.details[0].id.clone(),
            course_id: course.id.clone(),
            folder_id: "folder-1".to_string(),
        };
        (context, storage)
    }

    #[tokio::test]
    async fn test_batch_continues_after_failed_file() {
        let drive = Arc::new(FakeDrive::failing_on("broken"));
        let (context, storage) = context(drive.clone()).await;
        let detail_id = context.detail_id.clone();
        let registry = BatchRegistry::new(3600);
        let (_, job) = registry.register(&detail_id, 3, Vec::new());

        let files = vec![
            upload("a.png", "image/png"),
            upload("broken.png", "image/png"),
            upload("c.mp4", "video/mp4"),
        ];
        run_batch(job.clone(), files, context).await;

        let progress = job.snapshot().await;
        assert!(progress.finished);
        assert!(!progress.cancelled);
        assert_eq!(progress.success, 2);
        assert_eq!(progress.failed, 1);
        assert_eq!(progress.current_file, "(3/3) c.mp4");
        assert!(progress.last_error.starts_with("File \"broken.png\""));
        assert_eq!(progress.uploaded_ids, vec!["drive-1", "drive-2"]);
        assert_eq!(progress.percentage(), 100.0);
        assert_eq!(storage.list_media(&detail_id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_stops_before_next_file() {
        let drive = Arc::new(FakeDrive::default());
        let (context, _) = context(drive.clone()).await;
        let registry = BatchRegistry::new(3600);
        let (job_id, job) = registry.register(&context.detail_id, 2, Vec::new());

        registry.get(&job_id).unwrap().request_cancel();
        run_batch(
            job.clone(),
            vec![upload("a.png", "image/png"), upload("b.png", "image/png")],
            context,
        )
        .await;

        let progress = job.snapshot().await;
        assert!(progress.cancelled);
        assert!(progress.finished);
        assert_eq!(progress.success, 0);
        assert_eq!(progress.last_error, CANCELLED_MESSAGE);
        assert!(drive.uploaded_ids().is_empty());
    }

    #[tokio::test]
    async fn test_prune_drops_only_finished_jobs() {
        let registry = BatchRegistry::new(0);
        let (finished_id, finished) = registry.register("detail", 0, Vec::new());
        let (running_id, _) = registry.register("detail", 1, Vec::new());
        finished.finish().await;

        registry.prune().await;

        assert!(registry.get(&finished_id).is_none());
        assert!(registry.get(&running_id).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_prepare_reports_rejected_files() {
        let storage = test_support::storage().await;
        let course = storage
            .create_course(course_with_details("25ROBOT001", 1))
            .await
            .unwrap();
        let detail_id = course.details[0].id.clone();

        let mut form = media_form(
            &[("detailId", detail_id.as_str())],
            Some(("images", "a.png", "image/png")),
        );
        form.files.push(UploadedFile {
            field: "images".into(),
            file_name: "notes.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: Bytes::from_static(b"%PDF-1.7"),
        });

        let prepared = prepare(&form, &allowed(), 10, storage.as_ref()).await.unwrap();
        assert_eq!(prepared.files.len(), 1);
        assert_eq!(prepared.rejected, vec!["notes.pdf"]);
        assert_eq!(prepared.folder_id, "folder-1");
        assert_eq!(prepared.course_id, course.id);

        let resp = prepare(&form, &allowed(), 1, storage.as_ref())
            .await
            .err()
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
