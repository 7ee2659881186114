pub mod create;
pub mod list;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::areas::requests::CreateAreaRequest;
use crate::storage::Storage;

pub struct AreaService {
    storage: Option<Arc<dyn Storage>>,
}

impl AreaService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        match &self.storage {
            Some(storage) => Ok(storage.clone()),
            None => super::storage_of(request),
        }
    }

    pub async fn list_areas(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_areas(self, request).await
    }

    // 创建校区及其教室
    pub async fn create_area(
        &self,
        request: &HttpRequest,
        area: CreateAreaRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_area(self, request, area).await
    }
}
