//! Runtime faults surfaced while handling a request.
//!
//! A [`Fault`] is one of three things: a domain fault that knows how to render
//! itself as a structured body, the host framework's maintenance signal, or an
//! unknown error the application never anticipated.

use std::fmt;

use http::StatusCode;

use crate::context::RequestContext;
use crate::response::{codes, ErrorCode, ErrorDetail, ErrorResponse};

/// Built-in kind name for the maintenance role.
pub const MAINTAIN_MODE: &str = "MaintainMode";
/// Built-in kind name for the server-internal-error role.
pub const SERVER_INTERNAL_ERROR: &str = "ServerInternalError";

/// DomainFault は自身の構造化レスポンスを生成できる例外の契約。
pub trait DomainFault: fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// Registry に登録された種別名。
    fn kind(&self) -> &str;

    fn message(&self) -> &str;

    /// レスポンスボディを生成する。パイプラインはこの結果をそのまま返す。
    fn to_response(&self, ctx: &RequestContext) -> ErrorResponse;
}

/// MaintenanceSignal はホストフレームワークのメンテナンスモード通知。
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("service is in maintenance mode")]
pub struct MaintenanceSignal {
    /// `Retry-After` として返す秒数。
    pub retry_after: Option<u64>,
}

/// Fault is the error value handed to the exception pipeline.
#[derive(Debug)]
pub enum Fault {
    Domain(Box<dyn DomainFault>),
    Maintenance(MaintenanceSignal),
    Unknown(anyhow::Error),
}

impl Fault {
    pub fn domain(fault: impl DomainFault) -> Self {
        Self::Domain(Box::new(fault))
    }

    pub fn unknown(err: impl Into<anyhow::Error>) -> Self {
        Self::Unknown(err.into())
    }

    pub fn is_domain(&self) -> bool {
        matches!(self, Self::Domain(_))
    }

    pub fn is_maintenance(&self) -> bool {
        matches!(self, Self::Maintenance(_))
    }

    pub fn message(&self) -> String {
        match self {
            Self::Domain(f) => f.message().to_string(),
            Self::Maintenance(m) => m.to_string(),
            Self::Unknown(e) => e.to_string(),
        }
    }

    /// 種別名。未知の例外は `"unknown"` を返す。
    pub fn kind(&self) -> &str {
        match self {
            Self::Domain(f) => f.kind(),
            Self::Maintenance(_) => "maintenance",
            Self::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(d) => write!(f, "{d}"),
            Self::Maintenance(m) => write!(f, "{m}"),
            Self::Unknown(e) => write!(f, "{e}"),
        }
    }
}

impl From<MaintenanceSignal> for Fault {
    fn from(signal: MaintenanceSignal) -> Self {
        Self::Maintenance(signal)
    }
}

impl From<ApiFault> for Fault {
    fn from(fault: ApiFault) -> Self {
        Self::domain(fault)
    }
}

/// ApiFault は宣言されたエラー定義から生成される共通のドメイン例外。
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ApiFault {
    pub kind: String,
    pub code: ErrorCode,
    pub status: StatusCode,
    pub message: String,
    pub details: Vec<ErrorDetail>,
}

impl ApiFault {
    pub fn new(
        kind: impl Into<String>,
        code: impl Into<ErrorCode>,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            code: code.into(),
            status,
            message: message.into(),
            details: vec![],
        }
    }

    /// メンテナンス中を表す組み込み例外。
    pub fn maintain_mode(message: impl Into<String>) -> Self {
        Self::new(
            MAINTAIN_MODE,
            codes::maintain_mode(),
            StatusCode::SERVICE_UNAVAILABLE,
            message,
        )
    }

    /// 内部エラーを表す組み込み例外。
    pub fn server_internal_error(message: impl Into<String>) -> Self {
        Self::new(
            SERVER_INTERNAL_ERROR,
            codes::internal_error(),
            StatusCode::INTERNAL_SERVER_ERROR,
            message,
        )
    }

    pub fn with_details(mut self, details: Vec<ErrorDetail>) -> Self {
        self.details = details;
        self
    }
}

impl DomainFault for ApiFault {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn to_response(&self, ctx: &RequestContext) -> ErrorResponse {
        ErrorResponse::with_details(
            self.code.clone(),
            self.status,
            self.message.clone(),
            ctx.request_id(),
            self.details.clone(),
        )
    }
}
