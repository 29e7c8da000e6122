use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xoxo::{AppState, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xoxo=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let app = xoxo::app(AppState::new(&config));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("could not bind {}", config.addr))?;
    info!(addr = %config.addr, chat_cooldown = ?config.chat_cooldown, "xoxo listening");

    axum::serve(listener, app).await?;
    Ok(())
}
