//! 校区与教室存储操作

use super::{SeaOrmStorage, db_error};
use crate::entity::areas::{ActiveModel, Column, Entity as Areas};
use crate::entity::rooms::{self, Entity as Rooms};
use crate::errors::Result;
use crate::models::areas::{entities::Area, requests::CreateAreaRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

impl SeaOrmStorage {
    pub async fn create_area_impl(&self, req: CreateAreaRequest) -> Result<Area> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await.map_err(db_error("开启事务失败"))?;

        let area = ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(req.name.trim().to_string()),
            created_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(db_error("创建校区失败"))?;

        let mut created_rooms = Vec::with_capacity(req.rooms.len());
        for name in req.rooms.iter().map(|r| r.trim()).filter(|r| !r.is_empty()) {
            let room = rooms::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                area_id: Set(area.id.clone()),
                name: Set(name.to_string()),
            }
            .insert(&txn)
            .await
            .map_err(db_error("创建教室失败"))?;
            created_rooms.push(room);
        }

        txn.commit().await.map_err(db_error("提交事务失败"))?;
        Ok(area.into_area(created_rooms))
    }

    pub async fn list_areas_impl(&self) -> Result<Vec<Area>> {
        let areas = Areas::find()
            .order_by_asc(Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error("查询校区失败"))?;
        let all_rooms = Rooms::find()
            .order_by_asc(rooms::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_error("查询教室失败"))?;

        let mut by_area: HashMap<String, Vec<rooms::Model>> = HashMap::new();
        for room in all_rooms {
            by_area.entry(room.area_id.clone()).or_default().push(room);
        }

        Ok(areas
            .into_iter()
            .map(|a| {
                let own = by_area.remove(&a.id).unwrap_or_default();
                a.into_area(own)
            })
            .collect())
    }

    /// 一次查询解析所有教室名称，未找到的名称不会出现在结果中
    pub async fn resolve_room_ids_impl(&self, names: &[String]) -> Result<HashMap<String, String>> {
        let wanted: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if wanted.is_empty() {
            return Ok(HashMap::new());
        }

        let found = Rooms::find()
            .filter(rooms::Column::Name.is_in(wanted))
            .all(&self.db)
            .await
            .map_err(db_error("查询教室失败"))?;

        Ok(found.into_iter().map(|r| (r.name, r.id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rooms_resolve_by_trimmed_name() {
        let storage = SeaOrmStorage::in_memory().await;
        let area = storage
            .create_area_impl(CreateAreaRequest {
                name: "Cau Giay".into(),
                rooms: vec!["P101".into(), " P102 ".into(), "".into()],
            })
            .await
            .unwrap();
        assert_eq!(area.rooms.len(), 2);

        let resolved = storage
            .resolve_room_ids_impl(&[" P102".into(), "P999".into()])
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
        let p102 = area.rooms.iter().find(|r| r.name == "P102").unwrap();
        assert_eq!(resolved.get("P102"), Some(&p102.id));
    }

    #[tokio::test]
    async fn test_duplicate_area_name_is_conflict() {
        let storage = SeaOrmStorage::in_memory().await;
        let req = CreateAreaRequest {
            name: "Dong Da".into(),
            rooms: vec![],
        };
        storage.create_area_impl(req.clone()).await.unwrap();
        assert!(storage.create_area_impl(req).await.unwrap_err().is_conflict());
        assert_eq!(storage.list_areas_impl().await.unwrap().len(), 1);
    }
}
