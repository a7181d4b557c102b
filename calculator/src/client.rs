//! Initiator side of the four calculator calls.
//!
//! [`drive_duplex`] is the bidirectional driver: it runs a send path and a
//! drain path as two tasks on the same call, joins both, and tears the other
//! down as soon as one fails. It only needs the two channel ends, so it runs
//! the same against the tonic binding in [`Caller`] and against an in-process
//! [`duplex`](crate::channel::duplex).

use crate::{
    bridge,
    channel::{self, Direction, Lifecycle, Receiver, Sender},
    pacing::{Interval, Pacer},
    pb::{
        calculator_client::CalculatorClient, AverageRequest, MaxRequest, PrimeRequest,
        SumRequest,
    },
    server::DEFAULT_CAPACITY,
    Error, Result,
};
use std::fmt;
use tokio::task::JoinSet;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, info};

/// Sends `requests` in order, pacing after each one, then half-closes.
pub async fn send_all<T, P>(pacer: &P, requests: Vec<T>, tx: &mut Sender<T>) -> Result<()>
where
    P: Pacer,
    T: fmt::Debug,
{
    for request in requests {
        debug!(?request, "sending");
        tx.send(request).await?;
        pacer.pace().await;
    }
    tx.close();
    Ok(())
}

/// Collects every response until end-of-input.
pub async fn drain<T: fmt::Debug>(rx: &mut Receiver<T>) -> Result<Vec<T>> {
    let mut responses = Vec::new();
    while let Some(response) = rx.recv().await? {
        info!(?response, "received");
        responses.push(response);
    }
    Ok(responses)
}

enum Path<T> {
    Sent,
    Drained(Vec<T>),
}

/// Drives both directions of a bidirectional call concurrently.
///
/// Returns once the requests have all been sent and half-closed *and* the
/// responses have been drained to end-of-input. If either path fails, the
/// other is aborted and awaited before the error is returned.
pub async fn drive_duplex<Req, Resp, P>(
    requests: Vec<Req>,
    pacer: P,
    mut tx: Sender<Req>,
    mut rx: Receiver<Resp>,
) -> Result<Vec<Resp>>
where
    Req: fmt::Debug + Send + 'static,
    Resp: fmt::Debug + Send + 'static,
    P: Pacer + 'static,
{
    let mut paths: JoinSet<Result<Path<Resp>>> = JoinSet::new();
    paths.spawn(async move {
        send_all(&pacer, requests, &mut tx).await?;
        Ok(Path::Sent)
    });
    paths.spawn(async move { drain(&mut rx).await.map(Path::Drained) });

    let mut responses = None;
    let mut failure = None;
    while let Some(joined) = paths.join_next().await {
        match joined {
            Ok(Ok(Path::Sent)) => {}
            Ok(Ok(Path::Drained(drained))) => responses = Some(drained),
            // The call errored underneath the send path; the drain path is
            // about to report the cause.
            Ok(Err(Error::ChannelClosed)) if failure.is_none() => {
                failure = Some(Error::ChannelClosed);
            }
            Ok(Err(err)) => {
                failure = Some(err);
                break;
            }
            Err(err) => {
                failure = Some(Error::TransportFailure(format!("call path failed: {err}")));
                break;
            }
        }
    }

    if let Some(err) = failure {
        paths.shutdown().await;
        return Err(err);
    }

    // Both paths completed without error, so the drain path has reported.
    Ok(responses.unwrap_or_default())
}

/// A connected calculator client.
#[derive(Debug, Clone)]
pub struct Caller<P = Interval> {
    client: CalculatorClient<Channel>,
    pacer: P,
    capacity: usize,
}

impl<P> Caller<P>
where
    P: Pacer + Clone + 'static,
{
    /// Connects to `endpoint`. `pacer` spaces out the requests of the
    /// streaming calls.
    pub async fn connect<E>(
        endpoint: E,
        pacer: P,
    ) -> std::result::Result<Self, tonic::transport::Error>
    where
        E: TryInto<Endpoint>,
        E::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let client = CalculatorClient::connect(endpoint).await?;
        Ok(Caller::new(client, pacer))
    }

    pub fn new(client: CalculatorClient<Channel>, pacer: P) -> Self {
        Caller {
            client,
            pacer,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub async fn sum(&mut self, num1: f64, num2: f64) -> Result<f64> {
        let response = self.client.sum(SumRequest { num1, num2 }).await?;
        Ok(response.into_inner().sum)
    }

    /// Streams the primes up to `limit`, handing each to `on_prime` as it
    /// arrives.
    pub async fn prime_number(
        &mut self,
        limit: i64,
        mut on_prime: impl FnMut(i64),
    ) -> Result<Vec<i64>> {
        let mut stream = self
            .client
            .prime_number(PrimeRequest { limit })
            .await?
            .into_inner();

        let mut primes = Vec::new();
        while let Some(response) = stream.message().await? {
            on_prime(response.prime);
            primes.push(response.prime);
        }
        Ok(primes)
    }

    /// Sends `values` one by one, half-closes, and waits for the single
    /// average.
    pub async fn compute_average(&mut self, values: Vec<i64>) -> Result<i64> {
        let lifecycle = Lifecycle::open();
        let (mut tx, rx) = channel::pipe(&lifecycle, Direction::Input, self.capacity);
        let requests = values
            .into_iter()
            .map(|value| AverageRequest { value })
            .collect();

        let mut client = self.client.clone();
        let call = client.compute_average(bridge::requests(rx));
        tokio::pin!(call);

        let response = tokio::select! {
            response = &mut call => response,
            sent = send_all(&self.pacer, requests, &mut tx) => match sent {
                Ok(()) => call.await,
                // The server has dropped the request stream; its verdict
                // explains why.
                Err(Error::Cancelled) => call.await,
                // Dropping the call resets it, so the server never sees the
                // partial input as complete.
                Err(err) => return Err(err),
            },
        };

        let response = response?;
        lifecycle.half_close(Direction::Output);
        Ok(response.into_inner().average)
    }

    /// Streams `values` while concurrently collecting every new maximum the
    /// server reports.
    pub async fn find_max_number(&mut self, values: Vec<i64>) -> Result<Vec<i64>> {
        let lifecycle = Lifecycle::open();
        let (tx, rx) = channel::pipe(&lifecycle, Direction::Input, self.capacity);

        let mut client = self.client.clone();
        let responses = bridge::inbound_call(&lifecycle, self.capacity, async move {
            client.find_max_number(bridge::requests(rx)).await
        });

        let requests = values.into_iter().map(|value| MaxRequest { value }).collect();
        let maxima = drive_duplex(requests, self.pacer.clone(), tx, responses).await?;
        Ok(maxima.into_iter().map(|response| response.max).collect())
    }
}
