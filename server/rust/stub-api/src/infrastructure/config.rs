use serde::Deserialize;

use k1s0_exception_handler::config::{self as handler_config, HandlerConfig};

/// Config はアプリケーション全体の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// app / api / exceptions / errors セクション。
    #[serde(flatten)]
    pub handler: HandlerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// YAML を読み込み、環境別ファイルがあればマージしてから検証する。
    pub fn load(path: &str, env_path: Option<&str>) -> anyhow::Result<Self> {
        let cfg: Config = handler_config::load(path, env_path)?;
        handler_config::validate(&cfg.handler)?;
        Ok(cfg)
    }
}

/// ServerConfig はサーバー設定。
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// MaintenanceConfig はメンテナンスモードの設定。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaintenanceConfig {
    /// このファイルが存在する間はメンテナンス中とみなす。
    #[serde(default)]
    pub flag_path: Option<String>,
    #[serde(default)]
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
