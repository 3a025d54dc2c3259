//! Vitrine - image handling for a storefront: lazy loading, WebP detection,
//! upload compression and the product comparison list.

#![allow(dead_code)]

mod cli;
mod config;
mod dom;
mod image;
mod logger;
mod store;
mod storefront;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::VitrineConfig;
use storefront::Capabilities;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = VitrineConfig::load(&cli)?;

    match &cli.command {
        Commands::Compress { input, output, .. } => {
            cli::compress::compress_file(input, output.as_deref(), &config).map(|_| ())
        }
        Commands::Lazy {
            html,
            output,
            eager,
            webp_marker,
        } => {
            let capabilities = Capabilities {
                intersection_observer: !eager,
                webp_probe: *webp_marker,
            };
            cli::lazy::run(html, output.as_deref(), capabilities, &config)
        }
        Commands::Probe => cli::probe::run(),
        Commands::Compare { action } => cli::compare::run(action, &config).map(|_| ()),
    }
}
