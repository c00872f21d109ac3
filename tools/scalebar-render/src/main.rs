//! Command-line front end for mapscale.
//!
//! Usage:
//!   scalebar-render scale <map.json>
//!   scalebar-render render <map.json> -o <scalebar.bmp|scalebar.svg> [--format <name>]
//!   scalebar-render embed <map.json> -o <map.bmp> [--postlabelcache]
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mapscale::{
    draw_scalebar, embed_scalebar, Canvas, MapConfig, MapContext, ScalebarStatus, UNDEFINED,
};

#[derive(Parser)]
#[command(
    name = "scalebar-render",
    version,
    about = "Compute map scales and render scalebars from a JSON map configuration"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cellsize and scale denominator of a map
    Scale {
        /// Map configuration (JSON)
        config: PathBuf,
    },

    /// Write a standalone scalebar image
    Render {
        /// Map configuration (JSON)
        config: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Output format name; defaults to the output file extension
        #[arg(long)]
        format: Option<String>,
    },

    /// Render a blank map with the scalebar embedded
    Embed {
        /// Map configuration (JSON)
        config: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Draw the scalebar immediately instead of through the label cache
        #[arg(long)]
        postlabelcache: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scale { config } => cmd_scale(&config),
        Commands::Render {
            config,
            output,
            format,
        } => cmd_render(&config, &output, format.as_deref()),
        Commands::Embed {
            config,
            output,
            postlabelcache,
        } => cmd_embed(&config, &output, postlabelcache),
    }
}

fn load_map(path: &Path) -> Result<MapContext> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config: MapConfig =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    MapContext::from_config(config).with_context(|| format!("loading map {}", path.display()))
}

fn write_image(image: &dyn Canvas, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    image
        .encode(&mut out)
        .with_context(|| format!("writing {}", path.display()))?;
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "image written");
    Ok(())
}

fn cmd_scale(config: &Path) -> Result<()> {
    let mut map = load_map(config)?;
    let scale = map.compute_scale().context("computing scale")?;
    println!("cellsize: {}", map.cellsize);
    if scale == UNDEFINED {
        println!("scale: undefined");
    } else {
        println!("scale: 1:{:.0}", scale);
    }
    Ok(())
}

fn cmd_render(config: &Path, output: &Path, format: Option<&str>) -> Result<()> {
    let mut map = load_map(config)?;
    let format = format.or_else(|| output.extension().and_then(|e| e.to_str()));
    if let Some(name) = format {
        map.select_output_format(name)
            .with_context(|| format!("selecting output format '{}'", name))?;
    }
    let image = draw_scalebar(&mut map).context("drawing scalebar")?;
    write_image(image.as_ref(), output)
}

fn cmd_embed(config: &Path, output: &Path, postlabelcache: bool) -> Result<()> {
    let mut map = load_map(config)?;
    map.scalebar.status = ScalebarStatus::Embed;
    map.scalebar.postlabelcache |= postlabelcache;

    let mut image = map.create_map_image().context("creating map image")?;
    embed_scalebar(&mut map, image.as_mut()).context("embedding scalebar")?;
    let placed = map
        .label_cache
        .render(image.as_mut(), &map.symbolset)
        .context("placing labels")?;
    info!(placed, "label cache flushed");
    write_image(image.as_ref(), output)
}
