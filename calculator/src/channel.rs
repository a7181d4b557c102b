//! Ordered, full-duplex conduit carrying the messages of a single call.
//!
//! A call is made of two independent directions. [`Direction::Input`] carries
//! messages from the initiator to the responder, [`Direction::Output`] carries
//! them back. Each direction is a bounded, ordered [`pipe`] with a [`Sender`]
//! and a [`Receiver`]; both directions of one call share a [`Lifecycle`] that
//! tracks where the call is in its life:
//!
//! ```text
//! Idle -> Open -> Active -> HalfClosed(dir) -> Closed
//!   \_______\________\__________\____________> Errored
//! ```
//!
//! Sends wait while the pipe is full, which is the only flow control a
//! handler ever sees.

use crate::{Error, Result};
use std::{
    fmt,
    future::poll_fn,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::sync::{mpsc, watch};
use tokio_stream::Stream;
use tracing::trace;

/// One direction of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Initiator to responder.
    Input,
    /// Responder to initiator.
    Output,
}

/// Where a call is in its life. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    #[default]
    Idle,
    Open,
    Active,
    HalfClosed(Direction),
    Closed,
    Errored,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Closed | State::Errored)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flags {
    state: State,
    input_closed: bool,
    output_closed: bool,
}

impl Flags {
    fn is_closed(&self, direction: Direction) -> bool {
        match direction {
            Direction::Input => self.input_closed,
            Direction::Output => self.output_closed,
        }
    }
}

/// Shared lifecycle of one call.
///
/// Cloning is cheap; every clone observes the same call.
#[derive(Clone)]
pub struct Lifecycle {
    flags: Arc<watch::Sender<Flags>>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        let (flags, _) = watch::channel(Flags::default());
        Lifecycle {
            flags: Arc::new(flags),
        }
    }
}

impl Lifecycle {
    /// A lifecycle for a call the initiator has just established.
    pub fn open() -> Self {
        let lifecycle = Lifecycle::default();
        lifecycle.establish();
        lifecycle
    }

    pub fn state(&self) -> State {
        self.flags.borrow().state
    }

    /// Returns `true` once `direction` has been half-closed.
    pub fn is_closed(&self, direction: Direction) -> bool {
        self.flags.borrow().is_closed(direction)
    }

    /// Waits until the call reaches `Closed` or `Errored` and returns which.
    pub async fn terminated(&self) -> State {
        let mut rx = self.flags.subscribe();
        loop {
            let state = rx.borrow_and_update().state;
            if state.is_terminal() || rx.changed().await.is_err() {
                return state;
            }
        }
    }

    /// `Idle -> Open`.
    pub fn establish(&self) {
        self.transition(|flags| {
            if flags.state == State::Idle {
                flags.state = State::Open;
            }
        });
    }

    /// `Open -> Active`, on the first message in either direction.
    pub(crate) fn activate(&self) {
        self.transition(|flags| {
            if flags.state == State::Open {
                flags.state = State::Active;
            }
        });
    }

    /// Records that no more messages will flow in `direction`.
    pub fn half_close(&self, direction: Direction) {
        self.transition(|flags| {
            match direction {
                Direction::Input => flags.input_closed = true,
                Direction::Output => flags.output_closed = true,
            }

            if flags.state.is_terminal() {
                return;
            }

            flags.state = if flags.input_closed && flags.output_closed {
                State::Closed
            } else {
                State::HalfClosed(direction)
            };
        });
    }

    /// Moves any non-terminal call to `Errored`.
    pub fn fail(&self) {
        self.transition(|flags| {
            if !flags.state.is_terminal() {
                flags.state = State::Errored;
            }
        });
    }

    fn transition(&self, f: impl FnOnce(&mut Flags)) {
        self.flags.send_if_modified(|flags| {
            let from = flags.state;
            f(flags);
            if from != flags.state {
                trace!(?from, to = ?flags.state, "call state changed");
                true
            } else {
                false
            }
        });
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lifecycle").field(&self.state()).finish()
    }
}

/// Creates one direction of a call with room for `capacity` in-flight messages.
///
/// An idle `lifecycle` is established first; a pipe only exists inside a call.
pub fn pipe<T>(
    lifecycle: &Lifecycle,
    direction: Direction,
    capacity: usize,
) -> (Sender<T>, Receiver<T>) {
    lifecycle.establish();
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let sender = Sender {
        tx: Some(tx),
        direction,
        lifecycle: lifecycle.clone(),
    };
    let receiver = Receiver {
        rx,
        direction,
        lifecycle: lifecycle.clone(),
        finished: None,
    };
    (sender, receiver)
}

/// The initiating end of a [`duplex`] call.
#[derive(Debug)]
pub struct Initiator<Req, Resp> {
    pub requests: Sender<Req>,
    pub responses: Receiver<Resp>,
}

/// The responding end of a [`duplex`] call.
#[derive(Debug)]
pub struct Responder<Req, Resp> {
    pub requests: Receiver<Req>,
    pub responses: Sender<Resp>,
}

/// Opens an in-process call with both directions sharing one lifecycle.
pub fn duplex<Req, Resp>(capacity: usize) -> (Initiator<Req, Resp>, Responder<Req, Resp>) {
    let lifecycle = Lifecycle::open();
    let (req_tx, req_rx) = pipe(&lifecycle, Direction::Input, capacity);
    let (resp_tx, resp_rx) = pipe(&lifecycle, Direction::Output, capacity);

    let initiator = Initiator {
        requests: req_tx,
        responses: resp_rx,
    };
    let responder = Responder {
        requests: req_rx,
        responses: resp_tx,
    };
    (initiator, responder)
}

/// Writing half of one direction.
pub struct Sender<T> {
    tx: Option<mpsc::Sender<Result<T>>>,
    direction: Direction,
    lifecycle: Lifecycle,
}

impl<T> Sender<T> {
    /// Sends one message, waiting for room in the pipe.
    ///
    /// Fails with [`Error::ChannelClosed`] once this direction has been closed
    /// or the call has errored, and with [`Error::Cancelled`] when the reading
    /// side has gone away.
    pub async fn send(&mut self, message: T) -> Result<()> {
        let sent = match &self.tx {
            Some(tx) if tx.is_closed() => Err(()),
            Some(tx) if self.lifecycle.state() != State::Errored => {
                self.lifecycle.activate();
                tx.send(Ok(message)).await.map_err(drop)
            }
            _ => return Err(Error::ChannelClosed),
        };

        if sent.is_err() {
            self.tx = None;
            self.lifecycle.fail();
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Half-closes this direction. The reader sees end-of-input once it has
    /// drained every message sent before.
    pub fn close(&mut self) {
        if let Some(tx) = self.tx.take() {
            // Record the half-close before the reader can observe the drop.
            self.lifecycle.half_close(self.direction);
            drop(tx);
        }
    }

    /// Ends this direction with `err`, which the reader receives after any
    /// messages already in flight. The call moves to `Errored`.
    pub async fn abort(&mut self, err: Error) {
        if let Some(tx) = self.tx.take() {
            // The reader may already be gone, in which case there is nobody
            // left to tell.
            let _ = tx.send(Err(err)).await;
        }
        self.lifecycle.fail();
    }

    /// Completes once the reading side has gone away, or immediately if this
    /// sender is no longer open.
    pub async fn closed(&self) {
        if let Some(tx) = &self.tx {
            tx.closed().await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, mpsc::Sender::is_closed)
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}

impl<T> fmt::Debug for Sender<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sender")
            .field("direction", &self.direction)
            .field("open", &self.tx.is_some())
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Finish {
    End,
    Failed,
}

/// Reading half of one direction.
///
/// Also a [`Stream`] of `Result<T>` that ends at end-of-input or right after
/// yielding an error.
pub struct Receiver<T> {
    rx: mpsc::Receiver<Result<T>>,
    direction: Direction,
    lifecycle: Lifecycle,
    finished: Option<Finish>,
}

impl<T> Unpin for Receiver<T> {}

impl<T> Receiver<T> {
    /// Receives the next message.
    ///
    /// Returns `Ok(None)` at end-of-input, and keeps returning it on every
    /// later call. A sender that disappears without closing is reported as
    /// [`Error::TransportFailure`]. Reading again after an error fails with
    /// [`Error::ChannelClosed`].
    pub async fn recv(&mut self) -> Result<Option<T>> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Result<Option<T>>> {
        match self.finished {
            Some(Finish::End) => return Poll::Ready(Ok(None)),
            Some(Finish::Failed) => return Poll::Ready(Err(Error::ChannelClosed)),
            None => {}
        }

        let item = match self.rx.poll_recv(cx) {
            Poll::Ready(item) => item,
            Poll::Pending => return Poll::Pending,
        };

        Poll::Ready(match item {
            Some(Ok(message)) => {
                self.lifecycle.activate();
                Ok(Some(message))
            }
            Some(Err(err)) => {
                self.finish(Finish::Failed);
                Err(err)
            }
            None if self.lifecycle.is_closed(self.direction) => {
                self.finish(Finish::End);
                Ok(None)
            }
            None => {
                self.finish(Finish::Failed);
                Err(Error::TransportFailure(
                    "peer dropped the call without closing it".into(),
                ))
            }
        })
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    fn finish(&mut self, finish: Finish) {
        self.finished = Some(finish);
        if finish == Finish::Failed {
            self.lifecycle.fail();
        }
    }
}

impl<T> Stream for Receiver<T> {
    type Item = Result<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished.is_some() {
            return Poll::Ready(None);
        }
        this.poll_recv(cx).map(Result::transpose)
    }
}

impl<T> Drop for Receiver<T> {
    fn drop(&mut self) {
        // Walking away from a direction that has not finished cancels the call.
        if self.finished.is_none() {
            // Close first so a concurrent send sees a cancelled call rather
            // than an errored one.
            self.rx.close();
            self.lifecycle.fail();
        }
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("direction", &self.direction)
            .field("finished", &self.finished)
            .field("lifecycle", &self.lifecycle)
            .finish()
    }
}
