//! 例外処理に渡すリクエスト情報とデバッグ姿勢。

/// RequestContext は例外処理に必要なリクエスト情報の読み取り専用ビュー。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    path: String,
    test_mode: bool,
    request_id: String,
}

impl RequestContext {
    /// パスからコンテキストを生成する。リクエスト ID は UUID v4 で採番する。
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            test_mode: false,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_test_mode(mut self, test_mode: bool) -> Self {
        self.test_mode = test_mode;
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// 呼び出し側が詳細エラーを明示的に要求しているか。
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// パスが API プレフィックス配下かどうかを判定する。
    ///
    /// 判定は文字列の前方一致で行う（`/api` は `/api/v1` と `/apidocs` の両方に一致する）。
    pub fn is_api_scope(&self, prefix: &str) -> bool {
        self.path.starts_with(prefix)
    }
}

/// Posture はプロセス全体のデバッグ姿勢。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Posture {
    pub debug: bool,
}

impl Posture {
    pub fn debug() -> Self {
        Self { debug: true }
    }

    pub fn production() -> Self {
        Self { debug: false }
    }

    /// 未知の例外を JSON として開示してよいかを返す。
    pub fn discloses(self, ctx: &RequestContext) -> bool {
        self.debug || ctx.test_mode()
    }
}

/// `__test_mode` 入力値の真偽判定。
///
/// 空文字列と `"0"` だけが偽で、それ以外の値（`"false"` や `"no"` を含む）は真。
pub fn parse_flag(value: &str) -> bool {
    !matches!(value, "" | "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_scope_prefix_match() {
        assert!(RequestContext::new("/api/v1/orders").is_api_scope("/api"));
        assert!(RequestContext::new("/api").is_api_scope("/api"));
        assert!(!RequestContext::new("/web/api").is_api_scope("/api"));
        assert!(!RequestContext::new("/").is_api_scope("/api"));
    }

    #[test]
    fn test_request_id_generated_and_overridable() {
        let ctx = RequestContext::new("/api");
        assert!(!ctx.request_id().is_empty());
        let ctx = ctx.with_request_id("req-42");
        assert_eq!(ctx.request_id(), "req-42");
    }

    #[test]
    fn test_posture_discloses() {
        let plain = RequestContext::new("/api");
        let forced = RequestContext::new("/api").with_test_mode(true);
        assert!(!Posture::production().discloses(&plain));
        assert!(Posture::production().discloses(&forced));
        assert!(Posture::debug().discloses(&plain));
    }

    #[test]
    fn test_parse_flag() {
        for v in ["1", "2", "true", "abc", "false", "no", " 0"] {
            assert!(parse_flag(v), "{v} should be true");
        }
        for v in ["", "0"] {
            assert!(!parse_flag(v), "{v} should be false");
        }
    }
}
