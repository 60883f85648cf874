//! `inkdraft`: render a JSON scene to SVG, PNG, or a data URI.
//!
//! ```text
//! inkdraft scene.json                  # SVG on stdout
//! inkdraft scene.json -o out.png       # rasterize
//! inkdraft scene.json --data-uri utf8  # data URI on stdout
//! ```
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`).

mod scene;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use inkdraft_raster::Rasterize;
use scene::Scene;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "inkdraft", version, about, long_about = None)]
struct Cli {
    /// Scene description (JSON)
    scene: PathBuf,

    /// Output file. A `.png` extension rasterizes; anything else is SVG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print a data URI to stdout
    #[arg(long, value_enum)]
    data_uri: Option<UriKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum UriKind {
    Base64,
    Utf8,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(&cli, &mut stdout.lock())
}

fn run(cli: &Cli, out: &mut impl Write) -> Result<()> {
    let text = std::fs::read_to_string(&cli.scene)
        .with_context(|| format!("failed to read {}", cli.scene.display()))?;
    let scene: Scene = serde_json::from_str(&text)
        .with_context(|| format!("invalid scene {}", cli.scene.display()))?;
    let canvas = scene.build()?;

    if let Some(path) = &cli.output {
        if is_png(path) {
            canvas.save_png(path)?;
        } else {
            canvas.save_svg(path)?;
        }
    }

    match (cli.data_uri, &cli.output) {
        (Some(UriKind::Base64), _) => writeln!(out, "{}", canvas.as_data_uri())?,
        (Some(UriKind::Utf8), _) => writeln!(out, "{}", canvas.as_utf8_data_uri("\""))?,
        (None, None) => writeln!(out, "{}", canvas.as_svg())?,
        (None, Some(_)) => {}
    }
    Ok(())
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
}
