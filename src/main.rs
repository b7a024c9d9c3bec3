//! Command line entry point: builds the screen from the configuration
//! and writes it to a PNG, or serves it over HTTP in dev mode.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use dayboard::{render, screen, Config, Result};

#[derive(Parser)]
#[command(name = "dayboard")]
#[command(about = "Renders a family dashboard screen to a PNG", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, default_value_os_t = Config::default_path())]
    config: PathBuf,

    /// Serve the screen over HTTP instead of writing an image.
    #[arg(long)]
    dev: bool,

    /// Address the dev server listens on.
    #[arg(long, default_value = "localhost:9999")]
    addr: String,

    /// Use fake data instead of the real data sources.
    #[arg(long)]
    fake: bool,

    /// Path of the PNG to write.
    #[arg(long, default_value = "screen.png")]
    img: PathBuf,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config)?;

    if args.dev {
        return render::dev_server(&args.addr, config, args.fake).await;
    }

    let (header, cards) = screen::build_cards(&config, args.fake)?;
    let (data, error) = screen::assemble(header, cards).await;
    if let Some(error) = error {
        tracing::warn!("failed to load some cards: {error}");
    }

    let png = render::screenshot(&data).await?;
    std::fs::write(&args.img, png)?;

    Ok(())
}
