//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::config::Config;

/// Sprock asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve assets over HTTP, building them on demand
    #[command(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        opts: ServerArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long, default_value = "127.0.0.1")]
        interface: IpAddr,

        /// Port number to listen on
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Serve a precompiled tree from its manifest instead of building
        #[arg(long)]
        precompiled: bool,
    },

    /// Compile all assets into a deployable directory
    #[command(visible_alias = "c")]
    Compile {
        #[command(flatten)]
        opts: ServerArgs,

        /// Destination directory for compiled output
        #[arg(value_hint = clap::ValueHint::DirPath)]
        dest: PathBuf,
    },
}

/// Shared server configuration arguments
#[derive(clap::Args, Debug, Clone)]
pub struct ServerArgs {
    /// Source directory to serve assets from
    #[arg(short, long, default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub root: PathBuf,

    /// Scratch directory for compiled intermediates (default: ROOT/tmp)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub temp_dir: Option<PathBuf>,

    /// Cache-busting salt mixed into every asset digest
    #[arg(long, default_value = "")]
    pub asset_version: String,

    /// Run registered compressors (minifiers) after the processor chain
    #[arg(short, long)]
    pub compressed: bool,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long)]
    pub verbose: bool,
}

impl ServerArgs {
    pub fn to_config(&self) -> Config {
        let mut config = Config::new(&self.root)
            .with_version(&self.asset_version)
            .with_compressed(self.compressed);
        if let Some(temp_dir) = &self.temp_dir {
            config = config.with_temp_dir(temp_dir);
        }
        config
    }
}
