//! Sprock - an asset pipeline server.
//!
//! Serves web assets with content-addressed URLs and `//= require`
//! dependency concatenation, or precompiles them into a deployable tree.

#![allow(dead_code)]

mod asset;
mod cli;
mod compile;
mod config;
mod digest;
mod error;
mod http;
mod logger;
mod manifest;
mod pipeline;
mod server;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Serve {
            opts,
            interface,
            port,
            precompiled,
        } => {
            logger::set_verbose(opts.verbose);
            cli::serve::run(opts, *interface, *port, *precompiled)
        }
        Commands::Compile { opts, dest } => {
            logger::set_verbose(opts.verbose);
            cli::compile::run(opts, dest)
        }
    }
}
