//! Glue between tonic's streaming bodies and per-call [`channel`]s.
//!
//! Every pump spawned here watches its reader and exits as soon as the reader
//! is dropped, so no background work outlives the call it serves.

use crate::{
    channel::{self, Direction, Lifecycle, Receiver, Sender},
    Error,
};
use std::{
    future::Future,
    pin::Pin,
    task::{ready, Context, Poll},
};
use tokio_stream::{Stream, StreamExt};
use tonic::{Response, Status, Streaming};
use tracing::{debug, Instrument};

/// Response stream type handed back to tonic.
pub type BoxStream<T> = Pin<Box<dyn Stream<Item = Result<T, Status>> + Send + 'static>>;

/// Turns an incoming request stream into the input direction of a call.
pub fn inbound<T>(lifecycle: &Lifecycle, stream: Streaming<T>, capacity: usize) -> Receiver<T>
where
    T: Send + 'static,
{
    let (tx, rx) = channel::pipe(lifecycle, Direction::Input, capacity);
    tokio::spawn(pump(stream, tx).in_current_span());
    rx
}

/// Starts a streaming-response `call` and turns its responses into the output
/// direction of a call.
///
/// The call itself runs on the pump, so the caller can keep feeding the
/// request stream while the response headers are still in flight.
pub fn inbound_call<T, F>(lifecycle: &Lifecycle, capacity: usize, call: F) -> Receiver<T>
where
    T: Send + 'static,
    F: Future<Output = Result<Response<Streaming<T>>, Status>> + Send + 'static,
{
    let (mut tx, rx) = channel::pipe(lifecycle, Direction::Output, capacity);
    let task = async move {
        let response = tokio::select! {
            _ = tx.closed() => return,
            response = call => response,
        };

        match response {
            Ok(response) => pump(response.into_inner(), tx).await,
            Err(status) => tx.abort(status.into()).await,
        }
    };
    tokio::spawn(task.in_current_span());
    rx
}

/// Exposes the output direction of a call as a tonic response stream.
pub fn outbound<T>(rx: Receiver<T>) -> BoxStream<T>
where
    T: Send + 'static,
{
    Box::pin(rx.map(|item| item.map_err(Status::from)))
}

/// Exposes the input direction of a call as a tonic request stream.
///
/// The stream ends only at end-of-input. After an error it stays pending, so
/// the peer never mistakes a failed input for a complete one; the call is
/// torn down by whoever drops it.
pub fn requests<T>(rx: Receiver<T>) -> Requests<T> {
    Requests { rx, failed: false }
}

/// Request stream returned by [`requests`].
#[derive(Debug)]
pub struct Requests<T> {
    rx: Receiver<T>,
    failed: bool,
}

impl<T> Stream for Requests<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.failed {
            return Poll::Pending;
        }

        match ready!(this.rx.poll_recv(cx)) {
            Ok(message) => Poll::Ready(message),
            Err(err) => {
                debug!(error = %err, "request stream failed, withholding end-of-stream");
                this.failed = true;
                Poll::Pending
            }
        }
    }
}

async fn pump<T>(mut stream: Streaming<T>, mut tx: Sender<T>) {
    loop {
        let next = tokio::select! {
            _ = tx.closed() => return,
            next = stream.message() => next,
        };

        match next {
            Ok(Some(message)) => {
                if tx.send(message).await.is_err() {
                    return;
                }
            }
            Ok(None) => {
                tx.close();
                return;
            }
            Err(status) => {
                debug!(code = ?status.code(), message = status.message(), "stream failed");
                tx.abort(Error::from(status)).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn requests_end_at_end_of_input() {
        let (mut tx, rx) = channel::pipe(&Lifecycle::open(), Direction::Input, 4);
        tx.send(1).await.unwrap();
        tx.send(2).await.unwrap();
        tx.close();

        let sent: Vec<u32> = requests(rx).collect().await;
        assert_eq!(sent, [1, 2]);
    }

    #[tokio::test]
    async fn failed_requests_never_end() {
        let (mut tx, rx) = channel::pipe(&Lifecycle::open(), Direction::Input, 4);
        tx.send(10).await.unwrap();
        // Gone without a half-close.
        drop(tx);

        let mut stream = requests(rx);
        assert_eq!(stream.next().await, Some(10));
        assert!(timeout(Duration::from_millis(50), stream.next())
            .await
            .is_err());
        assert!(timeout(Duration::from_millis(50), stream.next())
            .await
            .is_err());
    }
}
