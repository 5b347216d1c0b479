use fulfillment_server::{Config, Server, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present, then logging
    dotenv::dotenv().ok();
    init_logger();

    tracing::info!("Fulfillment server starting...");

    let config = Config::from_env();
    let server = Server::new(config)?;
    server.run().await
}
