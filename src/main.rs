use anyhow::Result;
use tracing::info;

use img_compress::config::ServiceConfig;
use img_compress::server::handler::ImageServer;
use img_compress::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let server = ImageServer::start(ServiceConfig::default()).await?;
    info!(
        "listening on {}, open {} to compress images",
        server.addr(),
        server.url_for("/")
    );

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    server.shutdown().await;
    Ok(())
}
