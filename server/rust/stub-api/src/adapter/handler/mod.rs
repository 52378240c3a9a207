pub mod api_handler;
pub mod health;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use k1s0_exception_handler::{
    exception_middleware, maintenance_middleware, ExceptionHandler, ExceptionKindRegistry,
    MaintenanceSwitch,
};

pub const MAINTENANCE_ADMIN_PATH: &str = "/admin/maintenance";

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ExceptionKindRegistry>,
    pub exception_handler: ExceptionHandler,
    pub maintenance: MaintenanceSwitch,
}

/// REST ルーターを構築する。
///
/// 例外ミドルウェアを最外層に置き、メンテナンスミドルウェアが返す通知も処理させる。
pub fn router(state: AppState) -> Router {
    let maintenance = state.maintenance.clone();
    let exception_handler = state.exception_handler.clone();

    Router::new()
        .route("/healthz", get(health::healthz))
        .route(
            MAINTENANCE_ADMIN_PATH,
            get(api_handler::maintenance_status).post(api_handler::set_maintenance),
        )
        .route("/api/v1/ping", get(api_handler::ping))
        .route("/api/v1/quota", post(api_handler::consume_quota))
        .route("/api/v1/crash", get(api_handler::crash))
        .route("/crash", get(api_handler::crash))
        .with_state(state)
        .layer(middleware::from_fn_with_state(
            maintenance,
            maintenance_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            exception_handler,
            exception_middleware,
        ))
}
