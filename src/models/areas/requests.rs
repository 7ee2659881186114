use serde::Deserialize;
use ts_rs::TS;

// 创建校区请求
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "area.ts")]
pub struct CreateAreaRequest {
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<String>,
}
