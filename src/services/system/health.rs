use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use chrono::{DateTime, Utc};

use super::SystemService;
use crate::config::AppConfig;
use crate::models::system::responses::HealthResponse;
use crate::models::{ApiResponse, AppStartTime};

pub async fn health(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let started_at = request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| start.start_datetime)
        .ok_or_else(|| {
            actix_web::error::ErrorInternalServerError("AppStartTime not found in app data")
        })?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        build_health(service.get_config(), started_at, Utc::now()),
        "Service is healthy",
    )))
}

fn build_health(
    config: &AppConfig,
    started_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> HealthResponse {
    HealthResponse {
        status: "ok".to_string(),
        system_name: config.app.system_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: config.app.environment.clone(),
        started_at,
        uptime_seconds: now.signed_duration_since(started_at).num_seconds().max(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_web::test]
    async fn test_health_reports_uptime() {
        let start = AppStartTime {
            start_datetime: Utc::now() - chrono::Duration::seconds(90),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(start))
                .route(
                    "/health",
                    web::get().to(|req: HttpRequest| async move {
                        SystemService::new_lazy().health(&req).await
                    }),
                ),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], "ok");
        assert!(body["data"]["uptime_seconds"].as_i64().unwrap() >= 90);
    }
}
