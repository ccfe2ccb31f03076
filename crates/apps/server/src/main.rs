use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod routes;

use routes::{router, AppState};

#[derive(Parser, Debug)]
#[command(author, version, about = "Serves hourly globe imagery over HTTP")]
struct Args {
    /// Listen address
    #[arg(long, env = "IMAGERY_ADDR", default_value = "127.0.0.1:9100")]
    addr: SocketAddr,

    /// Directory holding one sub-directory per dataset
    #[arg(long, env = "IMAGERY_ROOT", default_value = "public")]
    root: PathBuf,

    /// Dataset mapping `name=sub-directory` (repeatable)
    #[arg(
        long = "dataset",
        value_parser = parse_dataset,
        default_values = [
            "total_column_water=tcw_rgb_instant_clim_anom",
            "moisture_transport=tcw_rgb_instant_clim_anom",
        ]
    )]
    datasets: Vec<(String, PathBuf)>,
}

fn parse_dataset(value: &str) -> Result<(String, PathBuf), String> {
    let (name, dir) = value
        .split_once('=')
        .ok_or_else(|| format!("expected name=directory, got {value:?}"))?;
    if name.is_empty() || name.contains('/') {
        return Err(format!("invalid dataset name {name:?}"));
    }
    Ok((name.to_string(), PathBuf::from(dir)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let datasets = args
        .datasets
        .into_iter()
        .map(|(name, dir)| (name, args.root.join(dir)));
    let state = AppState::new(datasets);

    for (name, catalog) in state.datasets() {
        if !tokio::fs::try_exists(catalog.root()).await.unwrap_or(false) {
            warn!("dataset {name}: {:?} does not exist yet", catalog.root());
        }
    }

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;
    info!("imagery server listening on http://{}", args.addr);
    axum::serve(listener, router(state))
        .await
        .context("server terminated")?;
    Ok(())
}
