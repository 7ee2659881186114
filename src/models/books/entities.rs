use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "book.ts")]
pub struct Book {
    // 教材编号（大写）
    pub id: String,
    pub name: String,
    pub book_type: String,
    pub price: f64,
    pub describe: Option<String>,
    // 封面 Drive 文件 ID
    pub image: Option<String>,
    // 徽章 Drive 文件 ID
    pub badge: Option<String>,
    pub topics: Vec<Topic>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "book.ts")]
pub struct Topic {
    pub id: String,
    pub name: String,
    pub position: i32,
}
