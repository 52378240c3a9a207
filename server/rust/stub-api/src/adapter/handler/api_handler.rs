use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use k1s0_exception_handler::Fault;

use super::AppState;

pub const QUOTA_EXCEEDED: &str = "QuotaExceeded";

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: String,
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
    })
}

/// 設定で宣言された QuotaExceeded 種別の例外を返す。
///
/// 種別の生成に失敗した場合は構成エラーとしてログに残し、空の 500 を返す。
pub async fn consume_quota(State(state): State<AppState>) -> Response {
    match state
        .registry
        .instantiate(QUOTA_EXCEEDED, "daily request quota exceeded")
    {
        Ok(fault) => fault.into_response(),
        Err(err) => {
            tracing::error!(error = %err, "exception kind misconfigured");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// 想定外の障害を発生させる。
pub async fn crash() -> Result<Json<PingResponse>, Fault> {
    let err = std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "upstream connection reset",
    );
    Err(Fault::Unknown(
        anyhow::Error::new(err).context("failed to load orders"),
    ))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub enabled: bool,
}

pub async fn maintenance_status(State(state): State<AppState>) -> Json<MaintenanceStatus> {
    Json(MaintenanceStatus {
        enabled: state.maintenance.is_enabled(),
    })
}

pub async fn set_maintenance(
    State(state): State<AppState>,
    Json(req): Json<MaintenanceStatus>,
) -> Json<MaintenanceStatus> {
    if req.enabled {
        state.maintenance.enable();
    } else {
        state.maintenance.disable();
    }
    tracing::info!(enabled = req.enabled, "maintenance mode updated");
    Json(MaintenanceStatus {
        enabled: state.maintenance.is_enabled(),
    })
}
