//! Google Drive 文件存储
//!
//! 业务层只依赖 [`DriveStorage`]，启动时注入具体实现。

pub mod google;

use actix_web::web::Bytes;
use async_trait::async_trait;
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::errors::Result;

pub use google::GoogleDrive;

/// 待上传的文件
#[derive(Debug, Clone)]
pub struct DriveUpload {
    // 原始文件名，实际存储名由 drive_file_name 生成
    pub name: String,
    pub mime: String,
    pub bytes: Bytes,
}

impl From<&crate::utils::multipart::UploadedFile> for DriveUpload {
    fn from(file: &crate::utils::multipart::UploadedFile) -> Self {
        Self {
            name: file.file_name.clone(),
            mime: file.mime(),
            bytes: file.bytes.clone(),
        }
    }
}

#[async_trait]
pub trait DriveStorage: Send + Sync {
    /// 上传到指定文件夹，返回 Drive 文件 ID
    async fn upload(&self, file: DriveUpload, folder_id: &str) -> Result<String>;

    /// 删除文件；文件不存在时返回 Ok(false)
    async fn delete(&self, file_id: &str) -> Result<bool>;
}

/// Drive 上的存储名：`avt-{毫秒时间戳}-{原始文件名}`
pub fn drive_file_name(original: &str) -> String {
    format!("avt-{}-{}", chrono::Utc::now().timestamp_millis(), original)
}

/// 并行删除一组文件，失败只记录日志
pub async fn cleanup_files(drive: &dyn DriveStorage, file_ids: &[String]) {
    if file_ids.is_empty() {
        return;
    }
    let results = join_all(file_ids.iter().map(|id| drive.delete(id))).await;
    for (id, result) in file_ids.iter().zip(results) {
        match result {
            Ok(true) => debug!("Cleaned up Drive file {}", id),
            Ok(false) => debug!("Drive file {} was already gone", id),
            Err(e) => warn!("Failed to clean up Drive file {}: {}", id, e),
        }
    }
}
