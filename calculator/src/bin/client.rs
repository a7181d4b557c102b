use calculator::{client::Caller, config::ClientConfig};
use clap::Parser;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    calculator::trace_init();

    let config = ClientConfig::parse();
    info!(endpoint = %config.endpoint, "Beginning sending requests");
    let mut caller = Caller::connect(config.endpoint.clone(), config.send_pacer()).await?;

    // A failed call is reported and the remaining calls still run.
    info!("Starting a unary call");
    match caller.sum(config.num1, config.num2).await {
        Ok(sum) => info!(sum, "Sum"),
        Err(err) => warn!(error = %err, "Sum failed"),
    }

    info!("Starting a server-streaming call");
    match caller
        .prime_number(config.limit, |prime| info!(prime, "PrimeNumber"))
        .await
    {
        Ok(primes) => info!(count = primes.len(), "PrimeNumber complete"),
        Err(err) => warn!(error = %err, "PrimeNumber failed"),
    }

    info!("Starting a client-streaming call");
    match caller.compute_average(config.average.clone()).await {
        Ok(average) => info!(average, "ComputeAverage"),
        Err(err) => warn!(error = %err, "ComputeAverage failed"),
    }

    info!("Starting a bidirectional-streaming call");
    match caller.find_max_number(config.max.clone()).await {
        Ok(maxima) => info!(?maxima, "FindMaxNumber complete"),
        Err(err) => warn!(error = %err, "FindMaxNumber failed"),
    }

    info!("All calls completed");
    Ok(())
}
