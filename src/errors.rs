//! 统一错误处理模块
//!
//! 使用宏生成错误类型，每个变体带错误代码与类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 生成 enum、code()/error_type()/message() 以及 snake_case 构造函数
macro_rules! define_coursedesk_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum CourseDeskError {
            $($variant(String),)*
        }

        impl CourseDeskError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(CourseDeskError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(CourseDeskError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(CourseDeskError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl CourseDeskError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        CourseDeskError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_coursedesk_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Conflict("E006", "Unique Constraint Conflict"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DriveOperation("E010", "Drive Operation Error"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    ImageScript("E014", "Image Script Error"),
    Http("E015", "Upstream HTTP Error"),
}

impl CourseDeskError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CourseDeskError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CourseDeskError::NotFound(_))
    }
}

impl fmt::Display for CourseDeskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CourseDeskError {}

// 唯一约束冲突单独映射为 Conflict，便于上层返回 409
impl From<sea_orm::DbErr> for CourseDeskError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(msg)) => CourseDeskError::Conflict(msg),
            _ => CourseDeskError::DatabaseOperation(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CourseDeskError {
    fn from(err: std::io::Error) -> Self {
        CourseDeskError::DriveOperation(err.to_string())
    }
}

impl From<serde_json::Error> for CourseDeskError {
    fn from(err: serde_json::Error) -> Self {
        CourseDeskError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for CourseDeskError {
    fn from(err: chrono::ParseError) -> Self {
        CourseDeskError::DateParse(err.to_string())
    }
}

impl From<reqwest::Error> for CourseDeskError {
    fn from(err: reqwest::Error) -> Self {
        CourseDeskError::Http(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for CourseDeskError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        CourseDeskError::Authentication(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CourseDeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(CourseDeskError::cache_connection("test").code(), "E001");
        assert_eq!(CourseDeskError::conflict("test").code(), "E006");
        assert_eq!(CourseDeskError::validation("test").code(), "E007");
        assert_eq!(CourseDeskError::drive_operation("test").code(), "E010");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            CourseDeskError::image_script("test").error_type(),
            "Image Script Error"
        );
        assert_eq!(
            CourseDeskError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_format_simple() {
        let err = CourseDeskError::not_found("Book ABC");
        assert_eq!(err.format_simple(), "Resource Not Found: Book ABC");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_plain_db_error_is_operation_error() {
        let err: CourseDeskError = sea_orm::DbErr::Custom("boom".into()).into();
        assert_eq!(err.code(), "E005");
        assert!(err.message().contains("boom"));
    }
}
