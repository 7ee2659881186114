use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 用户角色，一个用户可同时持有多个角色
#[derive(Debug, Clone, Serialize, PartialEq, Eq, TS)]
#[ts(export, export_to = "auth.ts")]
pub enum UserRole {
    Admin,    // 管理员
    Academic, // 教务
    Teacher,  // 教师
    Student,  // 学生
}

impl UserRole {
    pub const ADMIN: &'static str = "Admin";
    pub const ACADEMIC: &'static str = "Academic";
    pub const TEACHER: &'static str = "Teacher";
    pub const STUDENT: &'static str = "Student";

    /// 可以修改教材、课程、校区的角色
    pub fn academic_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Academic]
    }
    /// 可以管理课时媒体的角色
    pub fn media_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Academic, &Self::Teacher]
    }
    pub fn all_roles() -> &'static [&'static UserRole] {
        &[&Self::Admin, &Self::Academic, &Self::Teacher, &Self::Student]
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "{}", UserRole::ADMIN),
            UserRole::Academic => write!(f, "{}", UserRole::ACADEMIC),
            UserRole::Teacher => write!(f, "{}", UserRole::TEACHER),
            UserRole::Student => write!(f, "{}", UserRole::STUDENT),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "academic" => Ok(UserRole::Academic),
            "teacher" => Ok(UserRole::Teacher),
            "student" => Ok(UserRole::Student),
            _ => Err(format!(
                "Invalid user role: '{s}'. Supported roles: Admin, Academic, Teacher, Student"
            )),
        }
    }
}

/// 通过认证的调用者，由 RequireJWT 中间件写入请求扩展
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "auth.ts")]
pub struct AuthUser {
    pub id: String,
    pub name: String,
    pub roles: Vec<UserRole>,
}

impl AuthUser {
    pub fn has_role(&self, role: &UserRole) -> bool {
        self.roles.contains(role)
    }

    pub fn has_any_role(&self, roles: &[&UserRole]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}
