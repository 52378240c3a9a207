//! Host-side default presentation for faults the pipeline hands back.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::context::{Posture, RequestContext};
use crate::fault::Fault;

/// DefaultRenderer はパイプラインが委譲した例外を表示するホスト側の既定処理。
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait DefaultRenderer: Send + Sync {
    fn render(&self, ctx: &RequestContext, posture: Posture, fault: Fault) -> Response;
}

/// PlainTextRenderer はステータスコードとテキストだけを返す既定レンダラー。
///
/// デバッグ姿勢では未知の例外のエラーチェーンを本文に含める。
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

impl DefaultRenderer for PlainTextRenderer {
    fn render(&self, ctx: &RequestContext, posture: Posture, fault: Fault) -> Response {
        match fault {
            Fault::Maintenance(signal) => {
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable".to_string(),
                )
                    .into_response();
                if let Some(secs) = signal.retry_after {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from(secs));
                }
                response
            }
            Fault::Domain(domain) => {
                let status = domain.to_response(ctx).status();
                (status, domain.message().to_string()).into_response()
            }
            Fault::Unknown(err) => {
                let body = if posture.debug {
                    format!("{err:?}")
                } else {
                    "Internal Server Error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
