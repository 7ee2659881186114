use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::UserRole;
use crate::models::media::requests::MediaIdQuery;
use crate::services::MediaService;

// 懒加载的全局 MediaService 实例
static MEDIA_SERVICE: Lazy<MediaService> = Lazy::new(MediaService::new_lazy);

pub async fn upload_media(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.upload_media(&req, payload).await
}

pub async fn replace_media(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.replace_media(&req, payload).await
}

pub async fn delete_media(
    req: HttpRequest,
    query: web::Query<MediaIdQuery>,
) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.delete_media(&req, query.into_inner().id).await
}

pub async fn start_batch(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.start_batch(&req, payload).await
}

pub async fn batch_progress(
    req: HttpRequest,
    job_id: web::Path<String>,
) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.batch_progress(&req, job_id.into_inner()).await
}

pub async fn cancel_batch(
    req: HttpRequest,
    job_id: web::Path<String>,
) -> ActixResult<HttpResponse> {
    MEDIA_SERVICE.cancel_batch(&req, job_id.into_inner()).await
}

// 配置路由
pub fn configure_media_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/media")
            .wrap(middlewares::RequireRole::new_any(UserRole::media_roles()))
            .wrap(middlewares::RequireJWT::new())
            .service(
                web::resource("")
                    .route(web::post().to(upload_media))
                    .route(web::put().to(replace_media))
                    .route(web::delete().to(delete_media)),
            )
            .route("/batches", web::post().to(start_batch))
            .service(
                web::resource("/batches/{job_id}")
                    .route(web::get().to(batch_progress))
                    .route(web::delete().to(cancel_batch)),
            ),
    );
}
