use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 媒体类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "media.ts")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub const IMAGE: &'static str = "image";
    pub const VIDEO: &'static str = "video";

    /// 根据 MIME 判断媒体类型，非图片/视频返回 None
    pub fn from_mime(mime: &str) -> Option<Self> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// 灯箱预览地址：图片走 lh3 缩略图，视频走 Drive 预览页
    pub fn preview_url(&self, file_id: &str) -> String {
        match self {
            Self::Image => format!("https://lh3.googleusercontent.com/d/{file_id}=w800"),
            Self::Video => format!("https://drive.google.com/file/d/{file_id}/preview"),
        }
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Image => write!(f, "{}", MediaType::IMAGE),
            MediaType::Video => write!(f, "{}", MediaType::VIDEO),
        }
    }
}

impl std::str::FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            _ => Err(format!("Invalid media type: {s}")),
        }
    }
}

// 课时媒体（图库中的一项）
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "media.ts")]
pub struct MediaItem {
    // Drive 文件 ID
    pub id: String,
    pub detail_id: String,
    pub media_type: MediaType,
    pub file_name: String,
    pub preview_url: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// 新媒体记录（存储层输入）
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub id: String,
    pub media_type: MediaType,
    pub file_name: String,
}
