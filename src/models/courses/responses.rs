use serde::Serialize;
use ts_rs::TS;

use super::entities::CourseSummary;
use crate::models::PaginationInfo;

// 课程列表响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CourseListResponse {
    pub items: Vec<CourseSummary>,
    pub pagination: PaginationInfo,
}

// 名单变更结果
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct RosterChangeResponse {
    pub added: usize,
    pub removed: usize,
}
