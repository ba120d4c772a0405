use school_gateway::modules;
use school_gateway::proxy;

#[tokio::main]
async fn main() -> Result<(), String> {
    modules::logger::init_logger();

    let config = match modules::config::load_app_config() {
        Ok(cfg) => cfg,
        Err(err) => {
            tracing::warn!("failed to load gateway config: {}. using defaults", err);
            let mut cfg = school_gateway::AppConfig::default();
            modules::config::apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
            cfg
        }
    };

    let bind_address = match std::env::var("GATEWAY_BIND") {
        Ok(addr) if !addr.trim().is_empty() => addr,
        _ => config.proxy.get_bind_address().to_string(),
    };
    let port = config.proxy.port;

    let state = proxy::AppState::new(config)
        .map_err(|e| format!("failed to build upstream client: {}", e))?;

    let (server, handle) = proxy::AxumServer::start(bind_address.clone(), port, state)
        .await
        .map_err(|e| format!("failed to start gateway: {}", e))?;

    tracing::info!("school-gateway listening on http://{}:{}", bind_address, port);

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("failed to listen for shutdown signal: {}", e))?;

    tracing::info!("shutdown requested, stopping server...");
    server.stop();
    let _ = handle.await;

    Ok(())
}
