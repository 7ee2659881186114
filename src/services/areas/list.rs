use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AreaService;
use crate::cache::{CacheResult, ObjectCache, keys};
use crate::errors::Result;
use crate::models::areas::entities::Area;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{cache_of, internal_error};
use crate::storage::Storage;

pub async fn list_areas(service: &AreaService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;

    match cached_areas(storage.as_ref(), cache.as_ref()).await {
        Ok(areas) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            areas,
            "Areas retrieved successfully",
        ))),
        Err(e) => Ok(internal_error(
            ErrorCode::InternalServerError,
            "Failed to list areas",
            &e,
        )),
    }
}

async fn cached_areas(storage: &dyn Storage, cache: &dyn ObjectCache) -> Result<Vec<Area>> {
    if let CacheResult::Found(areas) = cache.get::<Vec<Area>>(keys::AREAS_ALL).await {
        return Ok(areas);
    }
    let areas = storage.list_areas().await?;
    cache.insert(keys::AREAS_ALL, &areas, 0).await;
    Ok(areas)
}
