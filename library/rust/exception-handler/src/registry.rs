//! Exception kind registry.
//!
//! Maps the two abstract error roles onto concrete, constructible domain-fault
//! kinds. Bindings are checked when the registry is built so that a role can
//! never point at something that does not render as a domain fault.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use http::StatusCode;

use crate::error::HandlerError;
use crate::fault::{ApiFault, Fault, MAINTAIN_MODE, SERVER_INTERNAL_ERROR};
use crate::response::ErrorCode;

/// メッセージから例外を生成するファクトリ。
pub type KindFactory = Arc<dyn Fn(String) -> Fault + Send + Sync>;

/// ExceptionRole は設定で差し替え可能な例外の役割。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExceptionRole {
    Maintenance,
    ServerInternalError,
}

impl ExceptionRole {
    pub const ALL: [ExceptionRole; 2] = [Self::Maintenance, Self::ServerInternalError];

    /// `exceptions.*` 配下の設定キー。
    pub fn config_key(self) -> &'static str {
        match self {
            Self::Maintenance => "maintain-mode",
            Self::ServerInternalError => "server-internal-error",
        }
    }

    /// 設定が無い場合に使用する組み込み種別。
    pub fn default_kind(self) -> &'static str {
        match self {
            Self::Maintenance => MAINTAIN_MODE,
            Self::ServerInternalError => SERVER_INTERNAL_ERROR,
        }
    }
}

impl fmt::Display for ExceptionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// ExceptionKindRegistry は役割から例外種別を解決し、生成する。
///
/// 構築後は不変で、`Arc` 越しに複数リクエストから同時に参照できる。
pub struct ExceptionKindRegistry {
    factories: HashMap<String, KindFactory>,
    bindings: HashMap<ExceptionRole, String>,
}

impl ExceptionKindRegistry {
    pub fn builder() -> ExceptionKindRegistryBuilder {
        ExceptionKindRegistryBuilder::new()
    }

    /// 組み込み種別のみを持ち、バインディングの無いレジストリ。
    pub fn with_defaults() -> Self {
        Self {
            factories: builtin_factories(),
            bindings: HashMap::new(),
        }
    }

    /// 役割に設定された種別を返す。未設定なら `default_kind` を返す。
    pub fn resolve<'a>(&'a self, role: ExceptionRole, default_kind: &'a str) -> &'a str {
        self.bindings
            .get(&role)
            .map_or(default_kind, String::as_str)
    }

    /// 役割の組み込みデフォルトを用いて解決する。
    pub fn resolve_role(&self, role: ExceptionRole) -> &str {
        self.resolve(role, role.default_kind())
    }

    /// 種別名からドメイン例外を生成する。
    ///
    /// 未登録の種別、またはドメイン例外を生成しない種別は `UnresolvableKind` を返す。
    pub fn instantiate(&self, kind: &str, message: impl Into<String>) -> Result<Fault, HandlerError> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| HandlerError::not_registered(kind))?;
        let fault = factory(message.into());
        if fault.is_domain() {
            Ok(fault)
        } else {
            Err(HandlerError::not_domain(kind))
        }
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// 登録済みの種別名をソートして返す。
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ExceptionKindRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for ExceptionKindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings: BTreeMap<_, _> = self.bindings.iter().collect();
        f.debug_struct("ExceptionKindRegistry")
            .field("kinds", &self.kinds())
            .field("bindings", &bindings)
            .finish()
    }
}

/// ExceptionKindRegistryBuilder は種別の登録と役割のバインドを行う。
///
/// 検証は `build` でまとめて行う。
pub struct ExceptionKindRegistryBuilder {
    factories: HashMap<String, KindFactory>,
    bindings: HashMap<ExceptionRole, String>,
    duplicates: Vec<String>,
}

impl ExceptionKindRegistryBuilder {
    pub fn new() -> Self {
        Self {
            factories: builtin_factories(),
            bindings: HashMap::new(),
            duplicates: vec![],
        }
    }

    /// 任意のファクトリを種別として登録する。
    pub fn register<F>(mut self, kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(String) -> Fault + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            self.duplicates.push(kind);
        } else {
            self.factories.insert(kind, Arc::new(factory));
        }
        self
    }

    /// 宣言されたエラー定義を `ApiFault` の種別として登録する。
    pub fn register_api_fault(
        self,
        kind: impl Into<String>,
        code: impl Into<ErrorCode>,
        status: StatusCode,
    ) -> Self {
        let kind = kind.into();
        let code = code.into();
        let name = kind.clone();
        self.register(kind, move |message| {
            ApiFault::new(name.clone(), code.clone(), status, message).into()
        })
    }

    pub fn bind(mut self, role: ExceptionRole, kind: impl Into<String>) -> Self {
        self.bindings.insert(role, kind.into());
        self
    }

    /// バインド先がドメイン例外を生成できることを確認してレジストリを構築する。
    pub fn build(self) -> Result<ExceptionKindRegistry, HandlerError> {
        if let Some(kind) = self.duplicates.into_iter().next() {
            return Err(HandlerError::DuplicateKind(kind));
        }

        let mut roles: Vec<_> = self.bindings.iter().collect();
        roles.sort_by_key(|(role, _)| **role);
        for (role, kind) in roles {
            let factory = self
                .factories
                .get(kind)
                .ok_or_else(|| HandlerError::not_registered(kind))?;
            if !factory(String::new()).is_domain() {
                return Err(HandlerError::not_domain(kind));
            }
            tracing::debug!(role = %role, kind = %kind, "exception role bound");
        }

        Ok(ExceptionKindRegistry {
            factories: self.factories,
            bindings: self.bindings,
        })
    }
}

impl Default for ExceptionKindRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_factories() -> HashMap<String, KindFactory> {
    let mut factories: HashMap<String, KindFactory> = HashMap::new();
    factories.insert(
        MAINTAIN_MODE.to_string(),
        Arc::new(|message: String| -> Fault { ApiFault::maintain_mode(message).into() }),
    );
    factories.insert(
        SERVER_INTERNAL_ERROR.to_string(),
        Arc::new(|message: String| -> Fault {
            ApiFault::server_internal_error(message).into()
        }),
    );
    factories
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_falls_back_to_default() {
        let registry = ExceptionKindRegistry::with_defaults();
        assert_eq!(
            registry.resolve(ExceptionRole::Maintenance, MAINTAIN_MODE),
            MAINTAIN_MODE
        );
        assert_eq!(
            registry.resolve_role(ExceptionRole::ServerInternalError),
            SERVER_INTERNAL_ERROR
        );
    }

    #[test]
    fn test_resolve_uses_binding() {
        let registry = ExceptionKindRegistry::builder()
            .register_api_fault("Closed", "SYS_API_CLOSED", StatusCode::SERVICE_UNAVAILABLE)
            .bind(ExceptionRole::Maintenance, "Closed")
            .build()
            .unwrap();
        assert_eq!(registry.resolve_role(ExceptionRole::Maintenance), "Closed");
        assert_eq!(
            registry.resolve_role(ExceptionRole::ServerInternalError),
            SERVER_INTERNAL_ERROR
        );
    }

    #[test]
    fn test_instantiate_builtin() {
        let registry = ExceptionKindRegistry::with_defaults();
        let fault = registry.instantiate(MAINTAIN_MODE, "Maintaining").unwrap();
        assert!(fault.is_domain());
        assert_eq!(fault.kind(), MAINTAIN_MODE);
        assert_eq!(fault.message(), "Maintaining");
    }

    #[test]
    fn test_instantiate_unregistered_kind() {
        let registry = ExceptionKindRegistry::with_defaults();
        let err = registry.instantiate("NoSuchKind", "x").unwrap_err();
        assert!(matches!(err, HandlerError::UnresolvableKind { ref kind, .. } if kind == "NoSuchKind"));
    }

    #[test]
    fn test_instantiate_non_domain_kind() {
        let registry = ExceptionKindRegistry::builder()
            .register("Plain", |message| Fault::unknown(anyhow::anyhow!(message)))
            .build()
            .unwrap();
        let err = registry.instantiate("Plain", "x").unwrap_err();
        assert_eq!(err, HandlerError::not_domain("Plain"));
    }

    #[test]
    fn test_build_rejects_unregistered_binding() {
        let err = ExceptionKindRegistry::builder()
            .bind(ExceptionRole::ServerInternalError, "Missing")
            .build()
            .unwrap_err();
        assert_eq!(err, HandlerError::not_registered("Missing"));
    }

    #[test]
    fn test_build_rejects_non_domain_binding() {
        let err = ExceptionKindRegistry::builder()
            .register("Plain", |message| Fault::unknown(anyhow::anyhow!(message)))
            .bind(ExceptionRole::ServerInternalError, "Plain")
            .build()
            .unwrap_err();
        assert!(matches!(err, HandlerError::UnresolvableKind { .. }));
    }

    #[test]
    fn test_build_rejects_duplicate_kind() {
        let err = ExceptionKindRegistry::builder()
            .register_api_fault(MAINTAIN_MODE, "SYS_X", StatusCode::BAD_REQUEST)
            .build()
            .unwrap_err();
        assert_eq!(err, HandlerError::DuplicateKind(MAINTAIN_MODE.to_string()));
    }

    #[test]
    fn test_kinds_sorted() {
        let registry = ExceptionKindRegistry::builder()
            .register_api_fault("Alpha", "SYS_API_ALPHA", StatusCode::BAD_REQUEST)
            .build()
            .unwrap();
        assert_eq!(
            registry.kinds(),
            vec!["Alpha", MAINTAIN_MODE, SERVER_INTERNAL_ERROR]
        );
        assert!(registry.contains("Alpha"));
    }

    #[test]
    fn test_role_config_keys() {
        assert_eq!(ExceptionRole::Maintenance.config_key(), "maintain-mode");
        assert_eq!(
            ExceptionRole::ServerInternalError.to_string(),
            "server-internal-error"
        );
    }
}
