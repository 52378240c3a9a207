//! Response resolver.
//!
//! Decides, for one (request, fault) pair, whether the host's default renderer
//! should present the fault or whether it is shaped into a JSON error body.
//! Evaluation runs at most two passes: the primary pass, then a single pass
//! over the substituted server-internal-error fault when disclosure is allowed.

use std::sync::Arc;

use crate::context::{Posture, RequestContext};
use crate::error::HandlerError;
use crate::fault::Fault;
use crate::registry::{ExceptionKindRegistry, ExceptionRole};
use crate::response::ErrorResponse;

pub const DEFAULT_API_PREFIX: &str = "/api";
pub const MAINTENANCE_MESSAGE: &str = "Maintaining";
pub const SERVER_INTERNAL_ERROR_MESSAGE: &str = "Something went wrong.";

/// Outcome はパイプラインの最終判断。
#[derive(Debug)]
pub enum Outcome {
    /// ホストのデフォルトレンダラーに例外を返す。
    Delegate(Fault),
    JsonBody(ErrorResponse),
}

impl Outcome {
    pub fn is_delegate(&self) -> bool {
        matches!(self, Self::Delegate(_))
    }

    pub fn json_body(&self) -> Option<&ErrorResponse> {
        match self {
            Self::JsonBody(body) => Some(body),
            Self::Delegate(_) => None,
        }
    }
}

/// 1 パス分の評価結果。
enum Pass {
    Rendered(ErrorResponse),
    Undisclosed(Fault),
}

/// ResponseResolver は API リクエストの例外をレスポンスに変換する。
#[derive(Debug, Clone)]
pub struct ResponseResolver {
    registry: Arc<ExceptionKindRegistry>,
    api_prefix: String,
}

impl ResponseResolver {
    pub fn new(registry: Arc<ExceptionKindRegistry>) -> Self {
        Self {
            registry,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
        }
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    pub fn registry(&self) -> &ExceptionKindRegistry {
        &self.registry
    }

    /// 例外を評価して Outcome を返す。
    ///
    /// 失敗するのは置換先の種別を解決できない場合のみで、そのエラーはそのまま返す。
    pub fn render(
        &self,
        ctx: &RequestContext,
        posture: Posture,
        fault: Fault,
    ) -> Result<Outcome, HandlerError> {
        if !ctx.is_api_scope(&self.api_prefix) {
            return Ok(Outcome::Delegate(fault));
        }

        let fault = match self.evaluate(ctx, fault)? {
            Pass::Rendered(body) => return Ok(Outcome::JsonBody(body)),
            Pass::Undisclosed(fault) => fault,
        };

        if !posture.discloses(ctx) {
            return Ok(Outcome::Delegate(fault));
        }

        let substitute =
            self.substitute(ExceptionRole::ServerInternalError, SERVER_INTERNAL_ERROR_MESSAGE)?;
        match self.evaluate(ctx, substitute)? {
            Pass::Rendered(body) => Ok(Outcome::JsonBody(body)),
            // instantiate はドメイン例外しか返さないため到達しない
            Pass::Undisclosed(fault) => Err(HandlerError::UnresolvableKind {
                kind: fault.kind().to_string(),
                reason: "substituted fault did not render".to_string(),
            }),
        }
    }

    /// メンテナンス通知の置換とドメイン例外のレンダリングを行う。
    fn evaluate(&self, ctx: &RequestContext, fault: Fault) -> Result<Pass, HandlerError> {
        let fault = match fault {
            Fault::Maintenance(_) => {
                self.substitute(ExceptionRole::Maintenance, MAINTENANCE_MESSAGE)?
            }
            other => other,
        };

        match fault {
            Fault::Domain(domain) => Ok(Pass::Rendered(domain.to_response(ctx))),
            other => Ok(Pass::Undisclosed(other)),
        }
    }

    fn substitute(&self, role: ExceptionRole, message: &str) -> Result<Fault, HandlerError> {
        let kind = self.registry.resolve_role(role);
        self.registry.instantiate(kind, message)
    }
}
