use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Terrain viewsheds from SRTM tiles
#[derive(Parser)]
#[command(name = "fogview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing .hgt / .hgt.zip files
    #[arg(short, long, env = "FOGVIEW_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display information about an SRTM tile
    Info {
        /// Path to .hgt file, or tile name (e.g., N35E138)
        tile: String,
    },

    /// List available SRTM tiles
    List {
        /// Only tiles overlapping "min_lat,min_lon,max_lat,max_lon"
        #[arg(long, allow_hyphen_values = true)]
        bbox: Option<String>,
    },

    /// Compute the viewshed of a single observer
    Viewshed {
        /// Path to .hgt file, or tile name (e.g., N35E138)
        tile: String,

        /// Observer column
        #[arg(long, requires = "y", conflicts_with_all = ["lat", "lon"])]
        x: Option<usize>,

        /// Observer row (0 = north edge)
        #[arg(long, requires = "x")]
        y: Option<usize>,

        /// Observer latitude in decimal degrees
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Observer longitude in decimal degrees
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Eye height above the terrain, in meters
        #[arg(long, default_value = "30")]
        height: f64,

        /// Half-width of the query window, in cells
        #[arg(short, long, default_value = "200")]
        radius: usize,

        /// Spread the window over all cores
        #[arg(short, long)]
        parallel: bool,

        /// Output result as JSON
        #[arg(short, long, conflicts_with = "geojson")]
        json: bool,

        /// Output result as a GeoJSON FeatureCollection
        #[arg(short, long)]
        geojson: bool,
    },

    /// Compute viewsheds for every observer listed in a CSV file
    Batch {
        /// Path to .hgt file, or tile name (e.g., N35E138)
        tile: String,

        /// CSV with columns name,x,y,height,radius
        input: PathBuf,

        /// Output file (defaults to <input>_viewshed.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Spread each window over all cores
        #[arg(short, long)]
        parallel: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Info { tile } => commands::info::run(cli.data_dir, &tile),
        Commands::List { bbox } => commands::list::run(cli.data_dir, bbox.as_deref()),
        Commands::Viewshed {
            tile,
            x,
            y,
            lat,
            lon,
            height,
            radius,
            parallel,
            json,
            geojson,
        } => {
            let position = match (x, y, lat, lon) {
                (Some(x), Some(y), _, _) => commands::viewshed::Position::Cell { x, y },
                (_, _, Some(lat), Some(lon)) => commands::viewshed::Position::Geo { lat, lon },
                _ => anyhow::bail!("Specify the observer with --x/--y or --lat/--lon"),
            };
            let format = if json {
                commands::viewshed::Format::Json
            } else if geojson {
                commands::viewshed::Format::GeoJson
            } else {
                commands::viewshed::Format::Text
            };
            commands::viewshed::run(
                cli.data_dir,
                &tile,
                position,
                height,
                radius,
                parallel,
                format,
            )
        }
        Commands::Batch {
            tile,
            input,
            output,
            parallel,
        } => commands::batch::run(cli.data_dir, &tile, input, output, parallel),
    }
}
