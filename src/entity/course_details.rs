//! 课时实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "course_details")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub course_id: String,
    pub position: i32,
    pub topic_id: String,
    pub day: i64,
    pub room_id: Option<String>,
    pub time: String,
    pub teacher_id: Option<String>,
    pub teaching_as: Option<String>,
    pub image: String,
    pub detail_type: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub note: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseId",
        to = "super::courses::Column::Id",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(has_many = "super::detail_media::Entity")]
    Media,
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::detail_media::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Media.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_detail(
        self,
        media: Vec<super::detail_media::Model>,
    ) -> crate::models::courses::entities::CourseDetail {
        use crate::models::courses::entities::CourseDetail;
        use chrono::{DateTime, Utc};

        CourseDetail {
            id: self.id,
            course_id: self.course_id,
            position: self.position,
            topic_id: self.topic_id,
            day: DateTime::<Utc>::from_timestamp(self.day, 0).unwrap_or_default(),
            room_id: self.room_id,
            time: self.time,
            teacher_id: self.teacher_id,
            teaching_as: self.teaching_as,
            image: self.image,
            detail_type: self.detail_type,
            note: self.note,
            media: media.into_iter().map(|m| m.into_media_item()).collect(),
        }
    }
}
