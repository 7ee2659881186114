use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::media::entities::MediaItem;

/// 课时类型取值
pub struct DetailType;

impl DetailType {
    // 补课
    pub const MAKEUP: &'static str = "Học bù";
    // 请假/停课
    pub const ABSENCE: &'static str = "Báo nghỉ";
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct Course {
    // 内部 ID
    pub id: String,
    // 对外编号，如 25ROBOT003
    pub code: String,
    pub book_id: Option<String>,
    pub area_id: Option<String>,
    pub teacher_hr: Option<String>,
    pub course_type: String,
    pub status: bool,
    pub version: i32,
    pub details: Vec<CourseDetail>,
    pub students: Vec<CourseStudent>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

// 课时
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseDetail {
    pub id: String,
    pub course_id: String,
    pub position: i32,
    pub topic_id: String,
    pub day: chrono::DateTime<chrono::Utc>,
    pub room_id: Option<String>,
    pub time: String,
    pub teacher_id: Option<String>,
    pub teaching_as: Option<String>,
    // 图片脚本生成的文件夹 ID 或地址
    pub image: String,
    // 常规课时为 None
    pub detail_type: Option<String>,
    pub note: String,
    pub media: Vec<MediaItem>,
}

// 课程名单中的学生
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseStudent {
    pub student_id: String,
    pub name: Option<String>,
    // 已关联的课时 ID
    pub learn: Vec<String>,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

// 课程列表项
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseSummary {
    pub id: String,
    pub code: String,
    pub book_id: Option<String>,
    pub area_id: Option<String>,
    pub course_type: String,
    pub status: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            code: course.code.clone(),
            book_id: course.book_id.clone(),
            area_id: course.area_id.clone(),
            course_type: course.course_type.clone(),
            status: course.status,
            created_at: course.created_at,
        }
    }
}
