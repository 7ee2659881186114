//! 教材存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::book_topics::{self, Entity as BookTopics};
use crate::entity::books::{ActiveModel, Column, Entity as Books};
use crate::errors::{CourseDeskError, Result};
use crate::models::books::{
    entities::Book,
    requests::{CreateBookRequest, UpdateBookRequest},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use std::collections::HashMap;

impl SeaOrmStorage {
    /// 创建教材（含主题），同一事务内完成
    pub async fn create_book_impl(&self, req: CreateBookRequest) -> Result<Book> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let model = ActiveModel {
            id: Set(req.id.clone()),
            name: Set(req.name),
            book_type: Set(req.book_type),
            price: Set(req.price),
            describe: Set(req.describe),
            image: Set(req.image),
            badge: Set(req.badge),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let book = model.insert(&txn).await.map_err(db_error("创建教材失败"))?;

        let topics: Vec<book_topics::ActiveModel> = req
            .topics
            .into_iter()
            .enumerate()
            .map(|(i, name)| book_topics::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                book_id: Set(book.id.clone()),
                name: Set(name),
                position: Set(i as i32),
            })
            .collect();
        if !topics.is_empty() {
            BookTopics::insert_many(topics)
                .exec(&txn)
                .await
                .map_err(db_error("创建教材主题失败"))?;
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;

        self.get_book_by_id_impl(&req.id)
            .await?
            .ok_or_else(|| CourseDeskError::not_found(format!("Book {}", req.id)))
    }

    pub async fn get_book_by_id_impl(&self, id: &str) -> Result<Option<Book>> {
        let Some(book) = Books::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("查询教材失败"))?
        else {
            return Ok(None);
        };

        let topics = load_topics(&self.db, &[book.id.clone()]).await?;
        let own = topics.get(&book.id).cloned().unwrap_or_default();
        Ok(Some(book.into_book(own)))
    }

    pub async fn list_books_impl(&self) -> Result<Vec<Book>> {
        let books = Books::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_error("查询教材列表失败"))?;

        let ids: Vec<String> = books.iter().map(|b| b.id.clone()).collect();
        let mut topics = load_topics(&self.db, &ids).await?;

        Ok(books
            .into_iter()
            .map(|b| {
                let own = topics.remove(&b.id).unwrap_or_default();
                b.into_book(own)
            })
            .collect())
    }

    /// 更新教材，image / badge 为 None 时保留原值
    pub async fn update_book_impl(
        &self,
        id: &str,
        update: UpdateBookRequest,
    ) -> Result<Option<Book>> {
        let Some(existing) = Books::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("查询教材失败"))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        model.name = Set(update.name);
        model.price = Set(update.price);
        model.describe = Set(update.describe);
        if let Some(image) = update.image {
            model.image = Set(Some(image));
        }
        if let Some(badge) = update.badge {
            model.badge = Set(Some(badge));
        }
        model.updated_at = Set(chrono::Utc::now().timestamp());
        model.update(&self.db).await.map_err(db_error("更新教材失败"))?;

        self.get_book_by_id_impl(id).await
    }
}

/// 按教材批量加载主题，已按 position 排序
async fn load_topics<C: ConnectionTrait>(
    db: &C,
    book_ids: &[String],
) -> Result<HashMap<String, Vec<book_topics::Model>>> {
    if book_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = BookTopics::find()
        .filter(book_topics::Column::BookId.is_in(book_ids.iter().cloned()))
        .order_by_asc(book_topics::Column::Position)
        .all(db)
        .await
        .map_err(db_error("查询教材主题失败"))?;

    let mut grouped: HashMap<String, Vec<book_topics::Model>> = HashMap::new();
    for row in rows {
        grouped.entry(row.book_id.clone()).or_default().push(row);
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: &str, topics: &[&str]) -> CreateBookRequest {
        CreateBookRequest {
            id: id.to_string(),
            name: "Robotics Basics".to_string(),
            book_type: "Robotics".to_string(),
            price: 120000.0,
            describe: None,
            image: Some("img-1".to_string()),
            badge: None,
            topics: topics.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_book_keeps_topic_order() {
        let storage = SeaOrmStorage::in_memory().await;
        let book = storage
            .create_book_impl(request("ROBOT", &["Gears", "Motors", "Sensors"]))
            .await
            .unwrap();
        let names: Vec<_> = book.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Gears", "Motors", "Sensors"]);
        assert_eq!(book.image.as_deref(), Some("img-1"));
    }

    #[tokio::test]
    async fn test_duplicate_book_id_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await;
        storage.create_book_impl(request("ROBOT", &[])).await.unwrap();
        let err = storage
            .create_book_impl(request("ROBOT", &["x"]))
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "unexpected error: {err}");
        assert_eq!(storage.list_books_impl().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_images_when_not_supplied() {
        let storage = SeaOrmStorage::in_memory().await;
        storage.create_book_impl(request("ROBOT", &[])).await.unwrap();

        let updated = storage
            .update_book_impl(
                "ROBOT",
                UpdateBookRequest {
                    name: "Robotics II".to_string(),
                    price: 0.0,
                    describe: Some("new".to_string()),
                    image: None,
                    badge: Some("badge-1".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Robotics II");
        assert_eq!(updated.image.as_deref(), Some("img-1"));
        assert_eq!(updated.badge.as_deref(), Some("badge-1"));

        let missing = storage
            .update_book_impl(
                "NOPE",
                UpdateBookRequest {
                    name: "x".into(),
                    price: 0.0,
                    describe: None,
                    image: None,
                    badge: None,
                },
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
