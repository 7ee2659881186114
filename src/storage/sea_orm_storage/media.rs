//! 课时媒体存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::detail_media::{ActiveModel, Column, Entity as DetailMedia, Model};
use crate::errors::Result;
use crate::models::media::entities::{MediaItem, NewMedia};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

fn new_media_model(detail_id: &str, media: NewMedia) -> ActiveModel {
    ActiveModel {
        id: Set(media.id),
        detail_id: Set(detail_id.to_string()),
        media_type: Set(media.media_type.to_string()),
        file_name: Set(media.file_name),
        created_at: Set(chrono::Utc::now().timestamp()),
    }
}

impl SeaOrmStorage {
    pub async fn add_media_impl(&self, detail_id: &str, media: NewMedia) -> Result<MediaItem> {
        let model = new_media_model(detail_id, media)
            .insert(&self.db)
            .await
            .map_err(db_error("保存媒体记录失败"))?;
        Ok(model.into_media_item())
    }

    pub async fn list_media_impl(&self, detail_id: &str) -> Result<Vec<MediaItem>> {
        let rows = DetailMedia::find()
            .filter(Column::DetailId.eq(detail_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::FileName)
            .all(&self.db)
            .await
            .map_err(db_error("查询媒体列表失败"))?;
        Ok(rows.into_iter().map(Model::into_media_item).collect())
    }

    pub async fn get_media_impl(&self, id: &str) -> Result<Option<MediaItem>> {
        let row = DetailMedia::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_error("查询媒体失败"))?;
        Ok(row.map(Model::into_media_item))
    }

    /// 新记录沿用旧记录的课时
    pub async fn replace_media_impl(
        &self,
        old_id: &str,
        media: NewMedia,
    ) -> Result<Option<MediaItem>> {
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let Some(old) = DetailMedia::find_by_id(old_id.to_string())
            .one(&txn)
            .await
            .map_err(db_error("查询媒体失败"))?
        else {
            return Ok(None);
        };

        DetailMedia::delete_by_id(old.id.clone())
            .exec(&txn)
            .await
            .map_err(db_error("删除旧媒体记录失败"))?;
        let model = new_media_model(&old.detail_id, media)
            .insert(&txn)
            .await
            .map_err(db_error("保存媒体记录失败"))?;

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(Some(model.into_media_item()))
    }

    pub async fn delete_media_impl(&self, id: &str) -> Result<bool> {
        let result = DetailMedia::delete_by_id(id.to_string())
            .exec(&self.db)
            .await
            .map_err(db_error("删除媒体记录失败"))?;
        Ok(result.rows_affected > 0)
    }

    /// 按课时分组加载媒体
    pub(super) async fn media_by_detail(
        &self,
        detail_ids: &[String],
    ) -> Result<HashMap<String, Vec<Model>>> {
        if detail_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = DetailMedia::find()
            .filter(Column::DetailId.is_in(detail_ids.iter().cloned()))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::FileName)
            .all(&self.db)
            .await
            .map_err(db_error("查询媒体列表失败"))?;

        let mut grouped: HashMap<String, Vec<Model>> = HashMap::new();
        for row in rows {
            grouped.entry(row.detail_id.clone()).or_default().push(row);
        }
        Ok(grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media::entities::MediaType;
    use crate::storage::sea_orm_storage::courses::tests::new_course;

    fn media(id: &str, kind: MediaType) -> NewMedia {
        NewMedia {
            id: id.to_string(),
            media_type: kind,
            file_name: format!("{id}.bin"),
        }
    }

    #[tokio::test]
    async fn test_replace_keeps_detail() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        let detail_id = course.details[0].id.clone();

        storage
            .add_media_impl(&detail_id, media("drive-1", MediaType::Image))
            .await
            .unwrap();
        let replaced = storage
            .replace_media_impl("drive-1", media("drive-2", MediaType::Image))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(replaced.detail_id, detail_id);
        assert!(storage.get_media_impl("drive-1").await.unwrap().is_none());
        let listed = storage.list_media_impl(&detail_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "drive-2");
        assert!(
            storage
                .replace_media_impl("missing", media("drive-3", MediaType::Video))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_delete_reports_missing_rows() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 1))
            .await
            .unwrap();
        storage
            .add_media_impl(&course.details[0].id, media("drive-9", MediaType::Video))
            .await
            .unwrap();

        assert!(storage.delete_media_impl("drive-9").await.unwrap());
        assert!(!storage.delete_media_impl("drive-9").await.unwrap());
    }

    #[tokio::test]
    async fn test_course_loads_media_per_detail() {
        let storage = SeaOrmStorage::in_memory().await;
        let course = storage
            .create_course_impl(new_course("25ROBOT001", 2))
            .await
            .unwrap();
        storage
            .add_media_impl(&course.details[1].id, media("drive-5", MediaType::Video))
            .await
            .unwrap();

        let loaded = storage.get_course_impl(&course.id).await.unwrap().unwrap();
        assert!(loaded.details[0].media.is_empty());
        assert_eq!(loaded.details[1].media[0].media_type, MediaType::Video);
        assert_eq!(
            loaded.details[1].media[0].preview_url,
            "https://drive.google.com/file/d/drive-5/preview"
        );
    }
}
