use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::AreaService;
use crate::cache::ObjectCache;
use crate::models::areas::requests::CreateAreaRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::reload::reload_areas;
use crate::services::{StepResult, bad_request, cache_of, internal_error, respond};
use crate::storage::Storage;

pub async fn create_area(
    service: &AreaService,
    request: &HttpRequest,
    area: CreateAreaRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let cache = cache_of(request)?;
    respond(create(area, storage.as_ref(), cache.as_ref()).await)
}

pub(crate) async fn create(
    mut area: CreateAreaRequest,
    storage: &dyn Storage,
    cache: &dyn ObjectCache,
) -> StepResult<HttpResponse> {
    area.name = area.name.trim().to_string();
    if area.name.is_empty() {
        return Err(bad_request(ErrorCode::BadRequest, "Area name is required"));
    }

    match storage.create_area(area).await {
        Ok(area) => {
            reload_areas(cache).await;
            info!("Area {} created with {} rooms", area.name, area.rooms.len());
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(area, "Area created successfully")))
        }
        Err(e) if e.is_conflict() => Err(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::AreaAlreadyExists,
            "Area or room name already exists",
        ))),
        Err(e) => Err(internal_error(
            ErrorCode::InternalServerError,
            "Failed to create area",
            &e,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support;
    use actix_web::http::StatusCode;

    fn request(name: &str) -> CreateAreaRequest {
        CreateAreaRequest {
            name: name.to_string(),
            rooms: vec!["R1".into(), "R2".into()],
        }
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();
        let resp = create(request("  "), storage.as_ref(), cache.as_ref()).await.unwrap_err();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_duplicate_area_conflicts() {
        let storage = test_support::storage().await;
        let cache = test_support::cache();
        let ok = create(request("Cau Giay"), storage.as_ref(), cache.as_ref()).await.unwrap();
        assert_eq!(ok.status(), StatusCode::CREATED);

        let dup = create(request("Cau Giay"), storage.as_ref(), cache.as_ref())
            .await
            .unwrap_err();
        assert_eq!(dup.status(), StatusCode::CONFLICT);
    }
}
