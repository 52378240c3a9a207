//! Maintenance mode switch and the middleware that raises the maintenance signal.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::fault::{Fault, MaintenanceSignal};

/// MaintenanceSwitch はメンテナンスモードの状態。
///
/// 手動トグルとフラグファイルの存在のどちらかが有効ならメンテナンス中とみなす。
#[derive(Debug, Clone, Default)]
pub struct MaintenanceSwitch {
    enabled: Arc<AtomicBool>,
    flag_path: Option<PathBuf>,
    retry_after: Option<u64>,
    except: Vec<String>,
}

impl MaintenanceSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_flag_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.flag_path = Some(path.into());
        self
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after = Some(secs);
        self
    }

    /// メンテナンス中でも通過させるパス（前方一致）。
    pub fn with_except(mut self, path: impl Into<String>) -> Self {
        self.except.push(path.into());
        self
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
            || self.flag_path.as_ref().is_some_and(|p| p.exists())
    }

    fn is_excepted(&self, path: &str) -> bool {
        self.except.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn signal(&self) -> MaintenanceSignal {
        MaintenanceSignal {
            retry_after: self.retry_after,
        }
    }
}

/// メンテナンス中はハンドラーを実行せずメンテナンス通知を返すミドルウェア。
pub async fn maintenance_middleware(
    State(switch): State<MaintenanceSwitch>,
    request: Request,
    next: Next,
) -> Response {
    if switch.is_enabled() && !switch.is_excepted(request.uri().path()) {
        tracing::debug!(path = %request.uri().path(), "request rejected by maintenance mode");
        return Fault::Maintenance(switch.signal()).into_response();
    }
    next.run(request).await
}
