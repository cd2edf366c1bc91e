use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use clipper::api;
use clipper::app::AppState;
use clipper::config::Config;

#[derive(Parser)]
#[command(author, version, about = "Naver news and cafe collection backend")]
struct Cli {
    /// Address to bind the HTTP server to.
    #[arg(long)]
    bind: Option<String>,

    /// Directory holding keywords.json and settings.json.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clipper=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    let addr: SocketAddr = config
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind))?;

    let state = Arc::new(AppState::new(config));
    let router = api::build_router(state);

    info!(%addr, version = env!("CARGO_PKG_VERSION"), "clipper listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    let server = axum::serve(listener, router).with_graceful_shutdown(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("ctrl-c received; shutting down");
    });
    if let Err(err) = server.await {
        error!(error = %err, "server error");
    }

    Ok(())
}
