//! `sprock compile` — precompile the asset tree for deployment.

use std::path::Path;

use anyhow::Result;

use crate::pipeline::Pipeline;
use crate::server::FileServer;

use super::ServerArgs;

pub fn run(opts: &ServerArgs, dest: &Path) -> Result<()> {
    let server = FileServer::new(opts.to_config(), Pipeline::standard());
    server.compile(dest)
}
