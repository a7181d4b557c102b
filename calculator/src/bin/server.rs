use calculator::{config::ServerConfig, server::CalculatorService};
use clap::Parser;
use tonic::transport::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    calculator::trace_init();

    let config = ServerConfig::parse();
    let service = CalculatorService::new(config.prime_pacer())
        .with_capacity(config.channel_capacity)
        .into_server();

    tracing::info!(message = "Starting server.", addr = %config.addr);

    Server::builder()
        .trace_fn(|request| tracing::info_span!("calculator_server", path = %request.uri().path()))
        .add_service(service)
        .serve_with_shutdown(config.addr, shutdown())
        .await?;

    Ok(())
}

async fn shutdown() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down.");
}
