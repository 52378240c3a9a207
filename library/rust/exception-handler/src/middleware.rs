//! axum integration.
//!
//! Handlers return `Result<_, Fault>`. The fault is parked in the response
//! extensions by its `IntoResponse` impl and picked up again by
//! [`exception_middleware`], which has the request context needed to decide
//! between the JSON body and the host's default presentation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::{header, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::context::{parse_flag, Posture, RequestContext};
use crate::error::HandlerError;
use crate::fault::Fault;
use crate::renderer::{DefaultRenderer, PlainTextRenderer};
use crate::report::Reporter;
use crate::resolver::{Outcome, ResponseResolver};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const TEST_MODE_PARAM: &str = "__test_mode";
pub const TEST_MODE_HEADER: &str = "x-test-mode";

/// レスポンス拡張に格納された未処理の例外。
#[derive(Clone)]
struct FaultSlot(Arc<Mutex<Option<Fault>>>);

impl FaultSlot {
    fn take(&self) -> Option<Fault> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(FaultSlot(Arc::new(Mutex::new(Some(self)))));
        response
    }
}

/// ExceptionHandler は報告・解決・既定レンダリングをまとめたミドルウェア状態。
#[derive(Clone)]
pub struct ExceptionHandler {
    resolver: Arc<ResponseResolver>,
    posture: Posture,
    reporter: Reporter,
    renderer: Arc<dyn DefaultRenderer>,
}

impl ExceptionHandler {
    pub fn new(resolver: ResponseResolver, posture: Posture) -> Self {
        Self {
            resolver: Arc::new(resolver),
            posture,
            reporter: Reporter::new(),
            renderer: Arc::new(PlainTextRenderer),
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn DefaultRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_reporter(mut self, reporter: Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn posture(&self) -> Posture {
        self.posture
    }

    /// 例外を報告し、パイプラインの判断に従ってレスポンスを生成する。
    pub fn handle(&self, ctx: &RequestContext, fault: Fault) -> Result<Response, HandlerError> {
        self.reporter.report(ctx, &fault);
        match self.resolver.render(ctx, self.posture, fault)? {
            Outcome::JsonBody(body) => Ok(body.into_response()),
            Outcome::Delegate(fault) => Ok(self.renderer.render(ctx, self.posture, fault)),
        }
    }
}

/// 本文から `__test_mode` を読み取るリクエストの Content-Length 上限。
pub const MAX_INSPECTED_BODY: usize = 64 * 1024;

/// リクエストから RequestContext を組み立てる。
///
/// テストモードは `__test_mode` クエリまたは `x-test-mode` ヘッダーで指定する。
/// 本文の値も考慮する場合は [`read_context`] を使う。
pub fn request_context(request: &Request) -> RequestContext {
    context_with(request, query_flag(request.uri()))
}

/// 本文（フォームまたは JSON）も含めて RequestContext を組み立てる。
///
/// 本文に `__test_mode` があればクエリより優先する。Content-Length が
/// [`MAX_INSPECTED_BODY`] 以下のリクエストだけを読み取り、本文は復元して返す。
pub async fn read_context(request: Request) -> Result<(RequestContext, Request), Response> {
    let Some(format) = inspectable_body(&request) else {
        return Ok((request_context(&request), request));
    };

    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INSPECTED_BODY).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, path = %parts.uri.path(), "failed to read request body");
            return Err(StatusCode::BAD_REQUEST.into_response());
        }
    };
    let request = Request::from_parts(parts, Body::from(bytes.clone()));

    let flag = body_flag(format, &bytes).or_else(|| query_flag(request.uri()));
    Ok((context_with(&request, flag), request))
}

fn context_with(request: &Request, input_flag: Option<bool>) -> RequestContext {
    let header_flag = request
        .headers()
        .get(TEST_MODE_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(parse_flag);
    let test_mode = input_flag.unwrap_or(false) || header_flag;

    let ctx = RequestContext::new(request.uri().path()).with_test_mode(test_mode);
    match request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        Some(id) => ctx.with_request_id(id),
        None => ctx,
    }
}

fn query_flag(uri: &Uri) -> Option<bool> {
    Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(params)| params.get(TEST_MODE_PARAM).map(|v| parse_flag(v)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyFormat {
    Form,
    Json,
}

fn inspectable_body(request: &Request) -> Option<BodyFormat> {
    let headers = request.headers();
    let length = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok())?;
    if length == 0 || length > MAX_INSPECTED_BODY {
        return None;
    }

    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if mime == "application/x-www-form-urlencoded" {
        Some(BodyFormat::Form)
    } else if mime == "application/json" || mime.ends_with("+json") {
        Some(BodyFormat::Json)
    } else {
        None
    }
}

fn body_flag(format: BodyFormat, bytes: &[u8]) -> Option<bool> {
    match format {
        BodyFormat::Form => url::form_urlencoded::parse(bytes)
            .find(|(key, _)| key == TEST_MODE_PARAM)
            .map(|(_, value)| parse_flag(&value)),
        BodyFormat::Json => serde_json::from_slice::<serde_json::Value>(bytes)
            .ok()?
            .get(TEST_MODE_PARAM)
            .map(json_flag),
    }
}

/// JSON 値の真偽判定。`null`、`false`、`0`、空文字列、`"0"`、空配列は偽。
fn json_flag(value: &serde_json::Value) -> bool {
    use serde_json::Value;

    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => parse_flag(s),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// ハンドラーが返した例外をパイプラインで処理するミドルウェア。
pub async fn exception_middleware(
    State(handler): State<ExceptionHandler>,
    request: Request,
    next: Next,
) -> Response {
    let (ctx, request) = match read_context(request).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };
    let mut response = next.run(request).await;

    let Some(fault) = response
        .extensions_mut()
        .remove::<FaultSlot>()
        .and_then(|slot| slot.take())
    else {
        return response;
    };

    match handler.handle(&ctx, fault) {
        Ok(response) => response,
        Err(err) => {
            // レジストリ構築時に検証済みのため通常は到達しない
            tracing::error!(
                error = %err,
                path = %ctx.path(),
                request_id = %ctx.request_id(),
                "exception handler misconfigured"
            );
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
