use anyhow::Context;
use stegocrypt::config::Config;
use stegocrypt::server;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(
        bind = %config.bind,
        max_upload_bytes = config.max_upload_bytes,
        "stegocrypt starting"
    );

    axum::serve(listener, server::router(&config)).await?;

    Ok(())
}
