//! 教材实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub book_type: String,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    #[sea_orm(column_type = "Text", nullable)]
    pub describe: Option<String>,
    pub image: Option<String>,
    pub badge: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::book_topics::Entity")]
    Topics,
}

impl Related<super::book_topics::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Topics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 组装业务模型，topics 需按 position 排好序
    pub fn into_book(
        self,
        topics: Vec<super::book_topics::Model>,
    ) -> crate::models::books::entities::Book {
        use crate::models::books::entities::Book;
        use chrono::{DateTime, Utc};

        Book {
            id: self.id,
            name: self.name,
            book_type: self.book_type,
            price: self.price,
            describe: self.describe,
            image: self.image,
            badge: self.badge,
            topics: topics.into_iter().map(|t| t.into_topic()).collect(),
            created_at: DateTime::<Utc>::from_timestamp(self.created_at, 0).unwrap_or_default(),
            updated_at: DateTime::<Utc>::from_timestamp(self.updated_at, 0).unwrap_or_default(),
        }
    }
}
