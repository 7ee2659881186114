use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "area.ts")]
pub struct Area {
    pub id: String,
    pub name: String,
    pub rooms: Vec<Room>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "area.ts")]
pub struct Room {
    pub id: String,
    pub name: String,
}
