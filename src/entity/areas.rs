//! 校区实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "areas")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rooms::Entity")]
    Rooms,
}

impl Related<super::rooms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rooms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_area(
        self,
        rooms: Vec<super::rooms::Model>,
    ) -> crate::models::areas::entities::Area {
        use crate::models::areas::entities::{Area, Room};
        use chrono::{DateTime, Utc};

        Area {
            id: self.id,
            name: self.name,
            rooms: rooms
                .into_iter()
                .map(|r| Room {
                    id: r.id,
                    name: r.name,
                })
                .collect(),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
        }
    }
}
