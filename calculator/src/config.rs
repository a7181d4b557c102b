//! Command-line and environment configuration for the two binaries.

use crate::pacing::Interval;
use clap::Parser;
use std::net::SocketAddr;

/// Where the server listens unless told otherwise.
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";

/// Where the client dials unless told otherwise.
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Parser)]
#[command(name = "calculator-server", about = "Serves the calculator gRPC service")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "CALCULATOR_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: SocketAddr,

    /// Delay before each PrimeNumber response, in milliseconds.
    #[arg(long, env = "CALCULATOR_PRIME_INTERVAL_MS", default_value_t = 1000)]
    pub prime_interval_ms: u64,

    /// Messages buffered per direction of a streaming call.
    #[arg(long, env = "CALCULATOR_CHANNEL_CAPACITY", default_value_t = crate::server::DEFAULT_CAPACITY)]
    pub channel_capacity: usize,
}

impl ServerConfig {
    pub fn prime_pacer(&self) -> Interval {
        Interval::from_millis(self.prime_interval_ms)
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "calculator-client", about = "Calls each calculator operation once")]
pub struct ClientConfig {
    /// Server to connect to.
    #[arg(long, env = "CALCULATOR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Delay after each streamed request, in milliseconds.
    #[arg(long, env = "CALCULATOR_SEND_INTERVAL_MS", default_value_t = 1000)]
    pub send_interval_ms: u64,

    /// First operand of Sum.
    #[arg(long, allow_negative_numbers = true, default_value_t = 5.5)]
    pub num1: f64,

    /// Second operand of Sum.
    #[arg(long, allow_negative_numbers = true, default_value_t = 7.4)]
    pub num2: f64,

    /// Upper bound for PrimeNumber.
    #[arg(long, allow_negative_numbers = true, default_value_t = 15)]
    pub limit: i64,

    /// Comma-separated values for ComputeAverage.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [10, 16, 20, 14]
    )]
    pub average: Vec<i64>,

    /// Comma-separated values for FindMaxNumber.
    #[arg(
        long,
        value_delimiter = ',',
        allow_hyphen_values = true,
        default_values_t = [1, 3, 5, 4, 8]
    )]
    pub max: Vec<i64>,
}

impl ClientConfig {
    pub fn send_pacer(&self) -> Interval {
        Interval::from_millis(self.send_interval_ms)
    }
}
