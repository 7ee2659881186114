use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::UserRole;
use crate::models::common::PaginationQuery;
use crate::models::courses::requests::{
    AttachStudentsRequest, CreateCourseRequest, DetailMutationRequest,
};
use crate::services::{CourseService, MediaService};

// 懒加载的全局 CourseService 实例
static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);
static MEDIA_SERVICE: Lazy<MediaService> = Lazy::new(MediaService::new_lazy);

// HTTP处理程序
pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<PaginationQuery>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    body: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(&req, body.into_inner()).await
}

pub async fn get_course(req: HttpRequest, key: web::Path<String>) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, key.into_inner()).await
}

pub async fn mutate_detail(
    req: HttpRequest,
    body: web::Json<DetailMutationRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.mutate_detail(&req, body.into_inner()).await
}

pub async fn attach_students(
    req: HttpRequest,
    key: web::Path<String>,
    body: web::Json<AttachStudentsRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .attach_students(&req, key.into_inner(), body.into_inner())
        .await
}

pub async fn detach_student(
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (course_key, student_id) = path.into_inner();
    COURSE_SERVICE
        .detach_student(&req, course_key, student_id)
        .await
}

pub async fn list_detail_media(
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (course_key, detail_id) = path.into_inner();
    MEDIA_SERVICE.list_media(&req, course_key, detail_id).await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT::new())
            .service(
                web::resource("")
                    .route(
                        web::get()
                            .to(list_courses)
                            .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                    )
                    .route(
                        web::post()
                            .to(create_course)
                            .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                    ),
            )
            // 需放在 /{course_id} 之前
            .service(
                web::resource("/details").route(
                    web::post()
                        .to(mutate_detail)
                        .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                ),
            )
            .service(
                web::resource("/{course_id}").route(
                    web::get()
                        .to(get_course)
                        .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                ),
            )
            .service(
                web::resource("/{course_id}/students").route(
                    web::post()
                        .to(attach_students)
                        .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                ),
            )
            .service(
                web::resource("/{course_id}/students/{student_id}").route(
                    web::delete()
                        .to(detach_student)
                        .wrap(middlewares::RequireRole::new_any(UserRole::academic_roles())),
                ),
            )
            .service(
                web::resource("/{course_id}/details/{detail_id}/media").route(
                    web::get()
                        .to(list_detail_media)
                        .wrap(middlewares::RequireRole::new_any(UserRole::all_roles())),
                ),
            ),
    );
}
