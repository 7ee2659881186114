use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 批量上传进度
//
// 上传按顺序逐个进行，取消只在两个文件之间生效
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "media.ts")]
pub struct BatchProgress {
    pub job_id: String,
    pub detail_id: String,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    // 形如 "(2/5) photo.jpg"
    pub current_file: String,
    pub last_error: String,
    // 因类型不受支持而被丢弃的文件名
    pub rejected: Vec<String>,
    pub uploaded_ids: Vec<String>,
    pub cancelled: bool,
    pub finished: bool,
}

impl BatchProgress {
    /// 已处理（成功+失败）占比，0-100
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.success + self.failed) as f64 / self.total as f64 * 100.0
    }
}

// 批量上传任务创建响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "media.ts")]
pub struct BatchCreatedResponse {
    pub job_id: String,
    pub total: usize,
    pub rejected: Vec<String>,
}
