//! Command-line interface.

mod args;
pub mod compile;
pub mod serve;

pub use args::{Cli, Commands, ServerArgs};
