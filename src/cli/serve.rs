//! `sprock serve` — on-demand or manifest-backed asset serving.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{Result, anyhow};

use crate::http;
use crate::log;
use crate::pipeline::Pipeline;
use crate::server::{AssetServer, CompiledServer, FileServer};

use super::ServerArgs;

pub fn run(opts: &ServerArgs, interface: IpAddr, port: u16, precompiled: bool) -> Result<()> {
    let config = opts.to_config();
    let store: Arc<dyn AssetServer> = if precompiled {
        Arc::new(CompiledServer::load(&config.root)?)
    } else {
        Arc::new(FileServer::new(config, Pipeline::standard()))
    };

    let addr = SocketAddr::new(interface, port);
    let server =
        tiny_http::Server::http(addr).map_err(|e| anyhow!("failed to bind {addr}: {e}"))?;
    log!("serve"; "http://{addr}");

    http::serve(store, server);
    Ok(())
}
