//! 课时媒体实体，主键即 Drive 文件 ID

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "detail_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub detail_id: String,
    pub media_type: String,
    pub file_name: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course_details::Entity",
        from = "Column::DetailId",
        to = "super::course_details::Column::Id",
        on_delete = "Cascade"
    )]
    Detail,
}

impl Related<super::course_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Detail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_media_item(self) -> crate::models::media::entities::MediaItem {
        use crate::models::media::entities::{MediaItem, MediaType};
        use chrono::{DateTime, Utc};

        let media_type = self.media_type.parse().unwrap_or(MediaType::Image);
        MediaItem {
            preview_url: media_type.preview_url(&self.id),
            id: self.id,
            detail_id: self.detail_id,
            media_type,
            file_name: self.file_name,
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
