use anyhow::{Context, Result};
use log::info;

use crate::routers::make_routes;
use crate::services::TransferService;
use crate::utils::config::Config;

/// Serves the speed-test routes until Ctrl-C.
pub async fn start_http_server(config: &Config, service: TransferService) -> Result<()> {
    service
        .prepare()
        .await
        .with_context(|| format!("create scratch dir {}", service.scratch_dir().display()))?;

    let routes = make_routes(service);
    let (addr, server) = warp::serve(routes)
        .try_bind_with_graceful_shutdown(config.bind_addr, async {
            tokio::signal::ctrl_c().await.ok();
        })
        .with_context(|| format!("bind {}", config.bind_addr))?;
    info!("HTTP server listening on {}", addr);
    server.await;
    info!("HTTP server stopped");
    Ok(())
}
