use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::models::common::serde_ext::double_option;
use crate::utils::validate::{is_valid_object_id, parse_day};

use super::entities::DetailType;

pub const DEFAULT_COURSE_TYPE: &str = "AI Robotic";

// 补课时 data 中必须出现的字段
const MAKEUP_REQUIRED: [&str; 5] = ["Day", "Topic", "Room", "Time", "Teacher"];

// 创建课程请求
//
// 字段沿用前端既有的命名（code / Book / Area / TeacherHR / Detail）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CreateCourseRequest {
    pub code: Option<String>,
    #[serde(rename = "Book")]
    pub book: Option<String>,
    #[serde(rename = "Area")]
    pub area: Option<String>,
    #[serde(rename = "TeacherHR")]
    pub teacher_hr: Option<String>,
    #[serde(rename = "Status")]
    pub status: Option<bool>,
    #[serde(rename = "Type")]
    pub course_type: Option<String>,
    #[serde(rename = "Detail")]
    pub detail: Option<Vec<CreateDetailInput>>,
}

// 创建课程时的单个课时
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct CreateDetailInput {
    #[serde(rename = "Topic")]
    pub topic: Option<String>,
    #[serde(rename = "Day")]
    pub day: Option<String>,
    #[serde(rename = "Room")]
    pub room: Option<String>,
    #[serde(rename = "Time")]
    pub time: Option<String>,
    #[serde(rename = "Teacher")]
    pub teacher: Option<String>,
    #[serde(rename = "TeachingAs")]
    pub teaching_as: Option<String>,
}

impl CreateDetailInput {
    /// 非空的教室名称
    pub fn room_name(&self) -> Option<&str> {
        self.room.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

// 新课程（存储层输入）
#[derive(Debug, Clone)]
pub struct NewCourse {
    pub code: String,
    pub book_id: Option<String>,
    pub area_id: Option<String>,
    pub teacher_hr: Option<String>,
    pub course_type: String,
    pub status: bool,
    pub details: Vec<NewDetail>,
}

// 新课时（存储层输入）
#[derive(Debug, Clone)]
pub struct NewDetail {
    pub topic_id: String,
    pub day: DateTime<Utc>,
    pub room_id: Option<String>,
    pub time: String,
    pub teacher_id: Option<String>,
    pub teaching_as: Option<String>,
    pub image: String,
    pub detail_type: Option<String>,
    pub note: String,
}

// 课时字段更新（存储层输入），None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct DetailPatch {
    pub room_id: Option<String>,
    pub teacher_id: Option<String>,
    pub teaching_as: Option<Option<String>>,
}

impl DetailPatch {
    pub fn is_empty(&self) -> bool {
        self.room_id.is_none() && self.teacher_id.is_none() && self.teaching_as.is_none()
    }
}

// 课时变更请求（补课 / 请假 / 普通修改共用一个入口）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct DetailMutationRequest {
    #[serde(rename = "courseId")]
    pub course_id: Option<String>,
    #[serde(rename = "detailId")]
    pub detail_id: Option<String>,
    #[ts(type = "Record<string, unknown> | null")]
    pub data: Option<Value>,
    #[serde(default)]
    pub student: Vec<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// 校验通过的课时变更
#[derive(Debug, Clone)]
pub struct DetailCommand {
    pub course_id: String,
    pub mutation: DetailMutation,
}

/// 按 `type` 区分的课时变更
#[derive(Debug, Clone)]
pub enum DetailMutation {
    /// 补课：追加一个新课时
    Makeup(MakeupLesson),
    /// 请假：只修改类型与备注
    Absence { detail_id: String, note: String },
    /// 普通修改：教室/教师/助教/学生名单
    Edit { detail_id: String, edit: DetailEdit },
}

#[derive(Debug, Clone)]
pub struct MakeupLesson {
    pub day: DateTime<Utc>,
    // 请求中的原始日期，用于调用图片脚本
    pub day_label: String,
    pub topic_id: String,
    pub room_name: String,
    pub time: String,
    pub teacher_id: String,
    pub teaching_as: Option<String>,
    pub note: String,
    pub students: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailEdit {
    // 出现该键即必须能解析出教室
    #[serde(rename = "Room", default, deserialize_with = "double_option")]
    pub room: Option<Option<String>>,
    #[serde(rename = "Teacher", default)]
    pub teacher: Option<String>,
    // 缺失：不修改；null：清空
    #[serde(rename = "TeachingAs", default, deserialize_with = "double_option")]
    pub teaching_as: Option<Option<String>>,
    #[serde(rename = "Students", default)]
    pub students: Option<Vec<String>>,
}

impl DetailMutationRequest {
    /// 校验并转换为具体的变更类型，错误信息直接返回给客户端（400）
    pub fn into_command(self) -> Result<DetailCommand, String> {
        let course_id = self
            .course_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let data = match (course_id.as_ref(), self.data) {
            (Some(_), Some(Value::Object(map))) => map,
            _ => return Err("Missing courseId or data".to_string()),
        };
        let course_id = course_id.unwrap_or_default();

        let mutation = match self.kind.as_deref() {
            Some(DetailType::MAKEUP) => {
                DetailMutation::Makeup(parse_makeup(&data, self.student)?)
            }
            Some(DetailType::ABSENCE) => {
                let detail_id = valid_detail_id(self.detail_id, "absence report")?;
                DetailMutation::Absence {
                    detail_id,
                    note: string_field(&data, "Note").unwrap_or_default(),
                }
            }
            _ => {
                let detail_id = valid_detail_id(self.detail_id, "update")?;
                let edit: DetailEdit = serde_json::from_value(Value::Object(data))
                    .map_err(|e| format!("Invalid lesson data: {e}"))?;
                validate_edit(&edit)?;
                DetailMutation::Edit { detail_id, edit }
            }
        };

        Ok(DetailCommand {
            course_id,
            mutation,
        })
    }
}

fn valid_detail_id(detail_id: Option<String>, action: &str) -> Result<String, String> {
    match detail_id {
        Some(id) if is_valid_object_id(&id) => Ok(id.trim().to_string()),
        _ => Err(format!("Missing or invalid detailId for {action}")),
    }
}

/// 读取字符串字段；数字等标量转为字符串，null 视为缺失
fn string_field(data: &Map<String, Value>, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn parse_makeup(data: &Map<String, Value>, students: Vec<String>) -> Result<MakeupLesson, String> {
    let missing: Vec<&str> = MAKEUP_REQUIRED
        .iter()
        .copied()
        .filter(|key| !data.contains_key(*key))
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Missing fields when creating a lesson: {}",
            missing.join(", ")
        ));
    }

    let topic_id = string_field(data, "Topic").unwrap_or_default();
    if !is_valid_object_id(&topic_id) {
        return Err("Invalid Topic ID".to_string());
    }
    let teacher_id = string_field(data, "Teacher").unwrap_or_default();
    if !is_valid_object_id(&teacher_id) {
        return Err("Invalid Teacher ID".to_string());
    }
    let teaching_as = string_field(data, "TeachingAs").filter(|s| !s.is_empty());
    if let Some(ref id) = teaching_as
        && !is_valid_object_id(id)
    {
        return Err("Invalid TeachingAs ID".to_string());
    }

    let day_label = string_field(data, "Day").unwrap_or_default();
    let day = parse_day(&day_label).ok_or_else(|| "Invalid Day format".to_string())?;

    Ok(MakeupLesson {
        day,
        day_label,
        topic_id: topic_id.trim().to_string(),
        room_name: string_field(data, "Room").unwrap_or_default(),
        time: string_field(data, "Time").unwrap_or_default(),
        teacher_id: teacher_id.trim().to_string(),
        teaching_as,
        note: string_field(data, "Note").unwrap_or_default(),
        students,
    })
}

fn validate_edit(edit: &DetailEdit) -> Result<(), String> {
    if let Some(teacher) = edit.teacher.as_deref().filter(|t| !t.is_empty())
        && !is_valid_object_id(teacher)
    {
        return Err("Invalid Teacher ID".to_string());
    }
    if let Some(Some(teaching_as)) = &edit.teaching_as
        && !is_valid_object_id(teaching_as)
    {
        return Err("Invalid TeachingAs ID".to_string());
    }
    Ok(())
}

// 学生加入课程名单
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct AttachStudentsRequest {
    pub students: Vec<StudentInput>,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "course.ts")]
pub struct StudentInput {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
}
