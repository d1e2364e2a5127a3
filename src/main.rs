use std::path::PathBuf;

use clap::Parser;
use log::info;

use elastic_indexer::{
    config::{load_templates, Config},
    factory,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Indexes observer blocks into an Elasticsearch cluster")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory holding per-index template JSON files
    #[arg(long)]
    templates_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let templates = load_templates(cli.templates_dir.as_deref());

    let (ws_client, indexer) = factory::create_ws_indexer(&config, templates).await?;

    tokio::select! {
        _ = ws_client.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received, draining the dispatcher");
        }
    }

    indexer.close().await?;
    Ok(())
}
