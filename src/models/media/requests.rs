use serde::Deserialize;
use ts_rs::TS;

// 删除媒体：DELETE /media?id=
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "media.ts")]
pub struct MediaIdQuery {
    pub id: String,
}
