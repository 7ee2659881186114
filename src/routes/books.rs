use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::UserRole;
use crate::services::BookService;

// 懒加载的全局 BookService 实例
static BOOK_SERVICE: Lazy<BookService> = Lazy::new(BookService::new_lazy);

// HTTP处理程序
pub async fn list_books(req: HttpRequest) -> ActixResult<HttpResponse> {
    BOOK_SERVICE.list_books(&req).await
}

pub async fn create_book(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    BOOK_SERVICE.create_book(&req, payload).await
}

pub async fn get_book(req: HttpRequest, book_id: web::Path<String>) -> ActixResult<HttpResponse> {
    BOOK_SERVICE.get_book(&req, book_id.into_inner()).await
}

pub async fn update_book(
    req: HttpRequest,
    book_id: web::Path<String>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    BOOK_SERVICE
        .update_book(&req, book_id.into_inner(), payload)
        .await
}

// 配置路由
pub fn configure_book_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/books")
            .wrap(middlewares::RequireJWT::new())
            .service(
                web::resource("")
                    .route(
                        web::get()
                            .to(list_books)
                            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                    )
                    .route(
                        web::post()
                            .to(create_book)
                            .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                    ),
            )
            .service(
                web::resource("/{book_id}")
                    .route(
                        web::get()
                            .to(get_book)
                            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                    )
                    .route(
                        web::put()
                            .to(update_book)
                            .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                    ),
            ),
    );
}
