//! A calculator service that exercises the four gRPC interaction shapes:
//!
//! - `Sum`: one request, one response.
//! - `PrimeNumber`: one request, a paced stream of responses.
//! - `ComputeAverage`: a stream of requests, one response.
//! - `FindMaxNumber`: interleaved request and response streams.
//!
//! Handlers in [`handler`] work on the per-call [`channel`] abstraction and
//! know nothing about the transport. [`server`] binds them to tonic and
//! [`client`] drives them from the initiating side.

pub mod bridge;
pub mod channel;
pub mod client;
pub mod config;
mod error;
pub mod handler;
pub mod pacing;
pub mod pb;
pub mod server;

pub use error::{Error, Result};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn trace_init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let sub = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(sub);
}
