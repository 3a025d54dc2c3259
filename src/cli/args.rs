//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Storefront image pipeline: lazy loading, WebP detection and upload
/// compression
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path, searched upward from the current directory
    #[arg(short = 'C', long, global = true, default_value = "vitrine.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Show debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Downscale and re-encode an image as JPEG before upload
    #[command(visible_alias = "c")]
    Compress {
        /// Image to compress
        #[arg(value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Output path (default: `<stem>.min.jpg` next to the input)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Maximum output width in pixels
        #[arg(long)]
        max_width: Option<u32>,

        /// Maximum output height in pixels
        #[arg(long)]
        max_height: Option<u32>,

        /// JPEG quality factor in (0, 1]
        #[arg(long)]
        quality: Option<f32>,
    },

    /// Prepare an HTML page: WebP marker, preloads, comparison widget and,
    /// with --eager, all deferred media loaded
    #[command(visible_alias = "l")]
    Lazy {
        /// HTML page to process
        #[arg(value_hint = clap::ValueHint::FilePath)]
        html: PathBuf,

        /// Output path (default: stdout)
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,

        /// Load every deferred element now, as without intersection observation
        #[arg(long)]
        eager: bool,

        /// Mark the root with this machine's WebP support (`webp`/`no-webp`)
        #[arg(long)]
        webp_marker: bool,
    },

    /// Report whether WebP images can be decoded
    Probe,

    /// Manage the product comparison list
    Compare {
        #[command(subcommand)]
        action: CompareAction,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CompareAction {
    /// Add a product id
    Add { id: String },
    /// Remove a product id
    Remove { id: String },
    /// Remove every product
    Clear,
    /// Print the current list
    List,
}
