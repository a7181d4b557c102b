//! The tonic binding of the calculator handlers.
//!
//! Every invocation gets its own [`Lifecycle`] and channel ends; a failure is
//! returned to that call's initiator as a [`Status`] and never reaches the
//! rest of the server.

use crate::{
    bridge::{self, BoxStream},
    channel::{self, Direction, Lifecycle, Sender},
    handler,
    pacing::{Interval, Pacer},
    pb::{
        calculator_server::{Calculator, CalculatorServer},
        AverageRequest, AverageResponse, MaxRequest, MaxResponse, PrimeRequest, PrimeResponse,
        SumRequest, SumResponse,
    },
    Error,
};
use std::sync::Arc;
use tonic::{Request, Response, Status, Streaming};
use tracing::{debug, info, warn, Instrument};

/// Messages buffered per direction of a streaming call.
pub const DEFAULT_CAPACITY: usize = 32;

/// Serves the four calculator operations.
#[derive(Debug)]
pub struct CalculatorService<P = Interval> {
    pacer: Arc<P>,
    capacity: usize,
}

impl<P: Pacer + 'static> CalculatorService<P> {
    /// `pacer` spaces out the responses of `PrimeNumber`.
    pub fn new(pacer: P) -> Self {
        CalculatorService {
            pacer: Arc::new(pacer),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn into_server(self) -> CalculatorServer<Self> {
        CalculatorServer::new(self)
    }
}

/// Ends a streaming call. Cancellation by the initiator is expected and only
/// logged; anything else is forwarded to the initiator as the call's status.
async fn finish<T>(result: crate::Result<()>, out: &mut Sender<T>) {
    match result {
        Ok(()) => {}
        Err(Error::Cancelled) => debug!("call cancelled by client"),
        Err(err) => {
            warn!(error = %err, "call failed");
            out.abort(err).await;
        }
    }
}

#[tonic::async_trait]
impl<P: Pacer + 'static> Calculator for CalculatorService<P> {
    async fn sum(&self, request: Request<SumRequest>) -> Result<Response<SumResponse>, Status> {
        let request = request.into_inner();
        info!(num1 = request.num1, num2 = request.num2, "Sum invoked");

        Ok(Response::new(handler::sum(request)))
    }

    type PrimeNumberStream = BoxStream<PrimeResponse>;

    async fn prime_number(
        &self,
        request: Request<PrimeRequest>,
    ) -> Result<Response<Self::PrimeNumberStream>, Status> {
        let request = request.into_inner();
        info!(limit = request.limit, "PrimeNumber invoked");

        let lifecycle = Lifecycle::open();
        // The single request has already been read.
        lifecycle.half_close(Direction::Input);
        let (mut tx, rx) = channel::pipe(&lifecycle, Direction::Output, self.capacity);

        let pacer = Arc::clone(&self.pacer);
        let task = async move {
            let result = handler::prime_number(request, &*pacer, &mut tx).await;
            finish(result, &mut tx).await;
        };
        tokio::spawn(task.in_current_span());

        Ok(Response::new(bridge::outbound(rx)))
    }

    async fn compute_average(
        &self,
        request: Request<Streaming<AverageRequest>>,
    ) -> Result<Response<AverageResponse>, Status> {
        info!("ComputeAverage invoked");

        let lifecycle = Lifecycle::open();
        let mut input = bridge::inbound(&lifecycle, request.into_inner(), self.capacity);

        match handler::compute_average(&mut input).await {
            Ok(response) => {
                lifecycle.half_close(Direction::Output);
                Ok(Response::new(response))
            }
            Err(err) => {
                warn!(error = %err, "ComputeAverage failed");
                lifecycle.fail();
                Err(err.into())
            }
        }
    }

    type FindMaxNumberStream = BoxStream<MaxResponse>;

    async fn find_max_number(
        &self,
        request: Request<Streaming<MaxRequest>>,
    ) -> Result<Response<Self::FindMaxNumberStream>, Status> {
        info!("FindMaxNumber invoked");

        let lifecycle = Lifecycle::open();
        let mut input = bridge::inbound(&lifecycle, request.into_inner(), self.capacity);
        let (mut tx, rx) = channel::pipe(&lifecycle, Direction::Output, self.capacity);

        let task = async move {
            let result = handler::find_max_number(&mut input, &mut tx).await;
            finish(result, &mut tx).await;
        };
        tokio::spawn(task.in_current_span());

        Ok(Response::new(bridge::outbound(rx)))
    }
}
