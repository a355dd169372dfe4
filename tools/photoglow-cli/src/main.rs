//! PhotoGlow CLI: filter a photo, cut out its background, and turn it into
//! a short music clip.
//!
//! Usage:
//!   photoglow tracks [--search Q] [--category C]   Browse the music library
//!   photoglow preview <IMAGE>                      Render the edited still
//!   photoglow remove-bg <IMAGE>                    Cut out the subject
//!   photoglow export <IMAGE> --track ID            Create a Status_<millis>.mp4
//!   photoglow check                                Check external tools
//!   photoglow config                               Show or create the config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use photoglow_common::config::AppConfig;

mod commands;

use commands::EditArgs;

#[derive(Parser)]
#[command(
    name = "photoglow",
    about = "Photo filters, background removal, and music status videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List library tracks, optionally filtered
    Tracks {
        /// Case-insensitive text matched against title and artist
        #[arg(short, long, default_value = "")]
        search: String,

        /// all | trending | bhojpuri | bollywood | lo-fi
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Render the filtered image to a PNG
    Preview {
        /// Input JPEG or PNG
        image: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Remove the background and save the cutout as PNG
    RemoveBg {
        /// Input JPEG or PNG
        image: PathBuf,

        /// Output PNG path
        #[arg(short, long, default_value = "cutout.png")]
        output: PathBuf,
    },

    /// Export a looping video of the edited image over a library track
    Export {
        /// Input JPEG or PNG
        image: PathBuf,

        /// Track id (see `photoglow tracks`)
        #[arg(short, long)]
        track: u32,

        /// Directory for the exported video (defaults to the configured one)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seconds to wait for the video engine before giving up
        #[arg(long, default_value = "10")]
        engine_timeout: u64,

        #[command(flatten)]
        edit: EditArgs,
    },

    /// Check that ffmpeg and the removal tool are usable
    Check,

    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if it does not exist
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(photoglow_common::config::config_file_path);
    let mut config = AppConfig::load_from(&config_path);
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    photoglow_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Tracks {
            search,
            category,
            json,
        } => commands::tracks::run(&search, &category, json),
        Commands::Preview {
            image,
            output,
            edit,
        } => commands::preview::run(config, image, output, edit).await,
        Commands::RemoveBg { image, output } => {
            commands::remove_bg::run(config, image, output).await
        }
        Commands::Export {
            image,
            track,
            output_dir,
            engine_timeout,
            edit,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            commands::export::run(config, image, track, engine_timeout, edit).await
        }
        Commands::Check => commands::check::run(&config),
        Commands::Config { init } => commands::config::run(&config, &config_path, init),
    }
}
