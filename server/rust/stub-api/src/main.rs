use std::net::SocketAddr;

use tracing::info;

use k1s0_stub_api_server::adapter::handler;
use k1s0_stub_api_server::build_state;
use k1s0_stub_api_server::infrastructure::config::Config;
use k1s0_stub_api_server::infrastructure::logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let env_config_path = std::env::var("CONFIG_ENV_PATH").ok();
    let cfg = Config::load(&config_path, env_config_path.as_deref())?;

    // Logger
    logger::init_logger(&cfg.observability.log);

    info!(
        app_name = %cfg.handler.app.name,
        environment = %cfg.handler.app.environment,
        debug = cfg.handler.app.debug,
        api_prefix = %cfg.handler.api.prefix,
        "starting stub-api server"
    );

    let state = build_state(&cfg)?;
    info!(kinds = ?state.registry.kinds(), "exception kinds registered");

    let app = handler::router(state);

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("REST server starting on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
