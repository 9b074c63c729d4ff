use codebreaker::{CodebreakerError, CodebreakerServer, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), CodebreakerError> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(&config.log_level);

    let server = CodebreakerServer::builder().config(&config).build().await?;
    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening for players"),
        Err(e) => tracing::warn!(error = %e, "could not read local address"),
    }
    server.run().await
}

/// `RUST_LOG` wins over `CODEBREAKER_LOG`.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
