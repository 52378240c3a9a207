//! 例外ハンドラーの YAML 設定。
//!
//! ベースファイルに環境別ファイルを再帰的にマージしてから読み込む。

use std::sync::Arc;

use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::context::Posture;
use crate::error::HandlerError;
use crate::registry::{ExceptionKindRegistry, ExceptionRole};
use crate::resolver::{ResponseResolver, DEFAULT_API_PREFIX};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("exception registry error: {0}")]
    Registry(#[from] HandlerError),
}

/// HandlerConfig は例外ハンドラーの設定。
#[derive(Debug, Clone, Deserialize)]
pub struct HandlerConfig {
    pub app: AppConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub exceptions: ExceptionsConfig,
    /// アプリケーション固有のエラー定義。
    #[serde(default)]
    pub errors: Vec<ErrorDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub debug: bool,
}

fn default_environment() -> String {
    "dev".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

fn default_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// ExceptionsConfig は役割ごとの例外種別の上書き。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExceptionsConfig {
    #[serde(rename = "maintain-mode", default)]
    pub maintain_mode: Option<String>,
    #[serde(rename = "server-internal-error", default)]
    pub server_internal_error: Option<String>,
}

impl ExceptionsConfig {
    pub fn binding(&self, role: ExceptionRole) -> Option<&str> {
        match role {
            ExceptionRole::Maintenance => self.maintain_mode.as_deref(),
            ExceptionRole::ServerInternalError => self.server_internal_error.as_deref(),
        }
    }
}

/// ErrorDefinition は `{ name, code, status }` 形式のエラー定義。
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDefinition {
    pub name: String,
    pub code: String,
    #[serde(default = "default_status")]
    pub status: u16,
}

fn default_status() -> u16 {
    400
}

impl HandlerConfig {
    pub fn posture(&self) -> Posture {
        Posture {
            debug: self.app.debug,
        }
    }

    /// エラー定義を登録し、役割のバインドを検証してレジストリを構築する。
    pub fn build_registry(&self) -> Result<ExceptionKindRegistry, ConfigError> {
        let mut builder = ExceptionKindRegistry::builder();
        for def in &self.errors {
            let status = StatusCode::from_u16(def.status).map_err(|_| {
                ConfigError::Validation(format!(
                    "errors.{}.status is not a valid HTTP status: {}",
                    def.name, def.status
                ))
            })?;
            builder = builder.register_api_fault(def.name.clone(), def.code.clone(), status);
        }
        for role in ExceptionRole::ALL {
            if let Some(kind) = self.exceptions.binding(role) {
                builder = builder.bind(role, kind);
            }
        }
        Ok(builder.build()?)
    }

    pub fn build_resolver(&self) -> Result<ResponseResolver, ConfigError> {
        let registry = self.build_registry()?;
        Ok(ResponseResolver::new(Arc::new(registry)).with_api_prefix(self.api.prefix.clone()))
    }
}

/// YAML を読み込み設定を返す。env_path があればマージする。
pub fn load<T: DeserializeOwned>(base_path: &str, env_path: Option<&str>) -> Result<T, ConfigError> {
    let base = std::fs::read_to_string(base_path)?;
    let mut value: serde_yaml::Value = serde_yaml::from_str(&base)?;

    if let Some(env) = env_path {
        let env_data = std::fs::read_to_string(env)?;
        let overlay: serde_yaml::Value = serde_yaml::from_str(&env_data)?;
        merge_yaml(&mut value, &overlay);
    }

    Ok(serde_yaml::from_value(value)?)
}

/// base YAML Value に overlay YAML Value を再帰的にマージする。
pub fn merge_yaml(base: &mut serde_yaml::Value, overlay: &serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base_map), serde_yaml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if let Some(base_value) = base_map.get_mut(key) {
                    merge_yaml(base_value, value);
                } else {
                    base_map.insert(key.clone(), value.clone());
                }
            }
        }
        (base, overlay) => {
            *base = overlay.clone();
        }
    }
}

/// 設定値のバリデーション。
pub fn validate(config: &HandlerConfig) -> Result<(), ConfigError> {
    if config.app.name.is_empty() {
        return Err(ConfigError::Validation("app.name is required".into()));
    }
    if !config.api.prefix.starts_with('/') {
        return Err(ConfigError::Validation(
            "api.prefix must start with '/'".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for def in &config.errors {
        if def.name.is_empty() {
            return Err(ConfigError::Validation("errors[].name is required".into()));
        }
        if def.code.is_empty() {
            return Err(ConfigError::Validation(format!(
                "errors.{}.code is required",
                def.name
            )));
        }
        if !(100..=599).contains(&def.status) {
            return Err(ConfigError::Validation(format!(
                "errors.{}.status must be between 100 and 599",
                def.name
            )));
        }
        if !seen.insert(def.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "errors.{} is defined more than once",
                def.name
            )));
        }
    }
    Ok(())
}
