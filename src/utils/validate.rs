use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9_-]+$").expect("Invalid code regex"));

static ISO_DATETIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T").expect("Invalid datetime regex"));

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("Invalid date regex"));

/// 校验引用 ID 格式（本服务生成的 ID 均为 UUID）
pub fn is_valid_object_id(id: &str) -> bool {
    uuid::Uuid::parse_str(id.trim()).is_ok()
}

/// 规范化编号：去除首尾空白并转为大写
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// 校验规范化后的编号，只允许大写字母、数字、下划线和连字符
pub fn validate_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() || code.len() > 32 {
        return Err("Code length must be between 1 and 32 characters");
    }
    if !CODE_RE.is_match(code) {
        return Err("Code must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

/// 解析课时日期
///
/// 支持 RFC 3339、`YYYY-MM-DD` 与 `DD/MM/YYYY`
pub fn parse_day(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()?;
    Utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

/// 将日期转换为图片脚本使用的 `DD/MM/YYYY`，无法识别的格式原样返回
pub fn format_day(raw: &str) -> String {
    let raw = raw.trim();
    if ISO_DATETIME_RE.is_match(raw) {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return dt.with_timezone(&Utc).format("%d/%m/%Y").to_string();
        }
    }
    if ISO_DATE_RE.is_match(raw) {
        let parts: Vec<&str> = raw.split('-').collect();
        return format!("{}/{}/{}", parts[2], parts[1], parts[0]);
    }
    raw.to_string()
}
