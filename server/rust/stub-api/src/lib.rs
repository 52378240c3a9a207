pub mod adapter;
pub mod infrastructure;

use std::sync::Arc;

use k1s0_exception_handler::{ExceptionHandler, MaintenanceSwitch, ResponseResolver};

use adapter::handler::api_handler::QUOTA_EXCEEDED;
use adapter::handler::{AppState, MAINTENANCE_ADMIN_PATH};
use infrastructure::config::Config;

/// 設定からレジストリ・例外ハンドラー・メンテナンススイッチを組み立てる。
///
/// 役割のバインド先、またはハンドラーが使う種別が解決できない場合はここで失敗する。
pub fn build_state(cfg: &Config) -> anyhow::Result<AppState> {
    let registry = Arc::new(cfg.handler.build_registry()?);
    if !registry.contains(QUOTA_EXCEEDED) {
        anyhow::bail!("exception kind '{QUOTA_EXCEEDED}' must be declared in errors");
    }
    let resolver =
        ResponseResolver::new(registry.clone()).with_api_prefix(cfg.handler.api.prefix.clone());
    let exception_handler = ExceptionHandler::new(resolver, cfg.handler.posture());

    let mut maintenance = MaintenanceSwitch::new()
        .with_except("/healthz")
        .with_except(MAINTENANCE_ADMIN_PATH);
    if let Some(ref path) = cfg.maintenance.flag_path {
        maintenance = maintenance.with_flag_path(path);
    }
    if let Some(secs) = cfg.maintenance.retry_after {
        maintenance = maintenance.with_retry_after(secs);
    }

    Ok(AppState {
        registry,
        exception_handler,
        maintenance,
    })
}
