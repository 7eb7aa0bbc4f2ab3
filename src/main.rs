use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mapforge::{
    codec,
    config::{self, ServeConfig, ServeOverrides},
    generate::{self, GeneratorConfig},
    session::Session,
    web::{self, ServerConfig},
};

#[derive(Debug, Parser)]
#[command(name = "mapforge")]
#[command(author, version, about = "Grid map editor with a building placement optimiser")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the editor web app
    Serve {
        /// Listen address
        #[arg(long)]
        host: Option<String>,

        /// Listen port (0 picks a free one)
        #[arg(long)]
        port: Option<u16>,

        /// Base URL of an external optimisation service
        /// (defaults to the bundled one on this server)
        #[arg(long)]
        optimiser_url: Option<String>,

        /// Starting grid rows
        #[arg(long)]
        rows: Option<u32>,

        /// Starting grid cols
        #[arg(long)]
        cols: Option<u32>,

        /// Map file to preload into the session
        #[arg(long)]
        map: Option<PathBuf>,

        /// YAML config file; flags win over file values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a seeded starter map and exit
    Generate {
        /// Grid rows
        #[arg(long, default_value_t = 12)]
        rows: u32,

        /// Grid cols
        #[arg(long, default_value_t = 12)]
        cols: u32,

        /// Random seed; the same seed always yields the same map
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Number of cities to place
        #[arg(long, default_value_t = 3)]
        cities: u32,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Serve {
            host,
            port,
            optimiser_url,
            rows,
            cols,
            map,
            config,
        } => {
            let flags = ServeOverrides {
                host,
                port,
                optimiser_url,
                rows,
                cols,
                map,
            };
            serve(flags, config).await
        }
        Command::Generate {
            rows,
            cols,
            seed,
            cities,
            out,
        } => run_generate(rows, cols, seed, cities, out),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(flags: ServeOverrides, config_path: Option<PathBuf>) -> Result<()> {
    let file = config_path.map(config::load_file).transpose()?;
    let resolved = ServeConfig::resolve(flags, file)?;

    let mut session = Session::new(resolved.rows, resolved.cols);
    if let Some(path) = &resolved.map {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read map file {}", path.display()))?;
        session
            .load(&text)
            .with_context(|| format!("failed to load map file {}", path.display()))?;
        tracing::info!(map = %path.display(), "preloaded map");
    }

    web::run(ServerConfig {
        host: resolved.host,
        port: resolved.port,
        optimiser_url: resolved.optimiser_url,
        session,
    })
    .await
}

fn run_generate(rows: u32, cols: u32, seed: u64, cities: u32, out: Option<PathBuf>) -> Result<()> {
    if rows == 0 || cols == 0 {
        bail!("rows and cols must be positive");
    }
    let grid = generate::generate(&GeneratorConfig {
        rows,
        cols,
        seed,
        cities,
        ..Default::default()
    });
    let text = codec::serialize(&grid);
    match out {
        Some(path) => {
            fs::write(&path, &text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!(
                "Wrote {}x{} map with {} cities to {}",
                rows,
                cols,
                grid.cities().len(),
                path.display()
            );
        }
        None => println!("{text}"),
    }
    Ok(())
}
