//! 例外処理パイプラインの構成エラー。

use thiserror::Error;

/// HandlerError は例外処理パイプラインの構成エラー。
///
/// いずれも設定不備を表し、汎用例外に変換せずに呼び出し元へ伝播させる。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error("unresolvable exception kind '{kind}': {reason}")]
    UnresolvableKind { kind: String, reason: String },
    #[error("exception kind already registered: {0}")]
    DuplicateKind(String),
}

impl HandlerError {
    pub(crate) fn not_registered(kind: &str) -> Self {
        Self::UnresolvableKind {
            kind: kind.to_string(),
            reason: "kind is not registered".to_string(),
        }
    }

    pub(crate) fn not_domain(kind: &str) -> Self {
        Self::UnresolvableKind {
            kind: kind.to_string(),
            reason: "kind does not construct a domain fault".to_string(),
        }
    }
}
