//! API スコープのリクエストに返す構造化エラーボディ。
//!
//! コードは `SYS_{SERVICE}_{ERROR}` 形式で命名する（例: `SYS_API_MAINTAIN_MODE`）。

use std::fmt;

use http::StatusCode;
use serde::{Serialize, Serializer};

/// ErrorCode は機械判読用のエラー識別子。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorCode(String);

impl ErrorCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// `SYS_{SERVICE}_INTERNAL_ERROR` を生成する。
    pub fn internal(service: &str) -> Self {
        Self(format!("SYS_{}_INTERNAL_ERROR", service.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl From<&str> for ErrorCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// ErrorDetail はフィールド単位の補足情報。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    pub field: String,
    pub reason: String,
    pub message: String,
}

impl ErrorDetail {
    pub fn new(
        field: impl Into<String>,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
            message: message.into(),
        }
    }
}

/// ErrorBody は `error` キー配下のペイロード。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    /// HTTP ステータスコードによる分類。
    pub status: u16,
    pub message: String,
    pub request_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ErrorDetail>,
}

/// ErrorResponse は `{ "error": { ... } }` 形式のレスポンス全体。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

impl ErrorResponse {
    pub fn new(
        code: impl Into<ErrorCode>,
        status: StatusCode,
        message: impl Into<String>,
        request_id: impl Into<String>,
    ) -> Self {
        Self::with_details(code, status, message, request_id, vec![])
    }

    pub fn with_details(
        code: impl Into<ErrorCode>,
        status: StatusCode,
        message: impl Into<String>,
        request_id: impl Into<String>,
        details: Vec<ErrorDetail>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                status: status.as_u16(),
                message: message.into(),
                request_id: request_id.into(),
                details,
            },
        }
    }

    /// 分類を HTTP ステータスとして返す。範囲外の値は 500 とする。
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status(), axum::Json(self)).into_response()
    }
}

/// API 共通のエラーコード。
pub mod codes {
    use super::ErrorCode;

    pub fn maintain_mode() -> ErrorCode {
        ErrorCode::new("SYS_API_MAINTAIN_MODE")
    }

    pub fn internal_error() -> ErrorCode {
        ErrorCode::internal("API")
    }
}
