mod config;
mod error;
#[cfg(test)]
mod fixtures;
mod pipeline;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::{Context, Result};
use clap::Parser;
use repo_tree_github::{ArchiveClient, ArchiveClientConfig};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ConfigOverrides, load_config};
use crate::pipeline::TreePipeline;

#[derive(Parser)]
#[command(name = "repo-tree-server")]
#[command(about = "Serve the directory tree of public GitHub repositories as JSON")]
struct Cli {
    /// Config file (defaults to ~/.config/repo-tree/server.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to bind
    #[arg(long)]
    host: Option<String>,
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,
    /// Directory with the front-end's static files
    #[arg(long)]
    static_dir: Option<PathBuf>,
    /// Parent directory for per-request scratch space
    #[arg(long)]
    scratch_dir: Option<PathBuf>,
    /// Upper bound on a single /tree request, in seconds
    #[arg(long)]
    request_timeout_secs: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            static_dir: self.static_dir.clone(),
            scratch_dir: self.scratch_dir.clone(),
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref());
    config.apply(cli.overrides());

    let client = ArchiveClient::new(ArchiveClientConfig {
        user_agent: config.user_agent.clone(),
        connect_timeout: config.connect_timeout(),
    })
    .context("failed to build archive client")?;
    let pipeline = web::Data::new(TreePipeline::new(Arc::new(client), &config));

    let bind_addr = config.bind_addr();
    info!(
        addr = %bind_addr,
        static_dir = %config.static_dir.display(),
        scratch_root = %config.scratch_root().display(),
        "server running at http://{bind_addr}"
    );

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(pipeline.clone())
            .configure(routes::register)
            .configure(|cfg| routes::register_static(cfg, &static_dir))
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {bind_addr}"))?
    .run()
    .await
    .context("server error")?;

    info!("server stopped");
    Ok(())
}
