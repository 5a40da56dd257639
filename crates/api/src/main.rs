use std::sync::Arc;

use anyhow::Context;

use sensorcast_infra::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    sensorcast_observability::init_with(config.log_format);

    tracing::info!(
        model = %config.model_path.display(),
        seq_len = config.horizon.seq_len(),
        pred_len = config.horizon.pred_len(),
        model_cache = config.model_cache,
        "starting sensorcast api"
    );

    let services = sensorcast_api::app::build_services(&config).await?;
    let app = sensorcast_api::app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
