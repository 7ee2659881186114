use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::areas::requests::CreateAreaRequest;
use crate::models::auth::entities::UserRole;
use crate::services::AreaService;

static AREA_SERVICE: Lazy<AreaService> = Lazy::new(AreaService::new_lazy);

pub async fn list_areas(req: HttpRequest) -> ActixResult<HttpResponse> {
    AREA_SERVICE.list_areas(&req).await
}

pub async fn create_area(
    req: HttpRequest,
    area: web::Json<CreateAreaRequest>,
) -> ActixResult<HttpResponse> {
    AREA_SERVICE.create_area(&req, area.into_inner()).await
}

// 配置路由
pub fn configure_area_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/areas")
            .wrap(middlewares::RequireJWT::new())
            .service(
                web::resource("")
                    .route(
                        web::get()
                            .to(list_areas)
                            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                    )
                    .route(
                        web::post()
                            .to(create_area)
                            .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                    ),
            ),
    );
}
