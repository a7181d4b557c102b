use calculator::{
    bridge,
    channel::{self, Direction, Lifecycle},
    client::Caller,
    pacing::{Immediate, Interval, Pacer},
    pb::{calculator_client::CalculatorClient, AverageRequest, PrimeRequest},
    server::CalculatorService,
    Error,
};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle, time::timeout};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{transport::Server, Code};

struct Running {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Running {
    fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        self.handle.await.unwrap();
    }
}

/// Counts every pace before waiting out the interval.
#[derive(Debug, Clone)]
struct Counting {
    paces: Arc<AtomicUsize>,
    interval: Interval,
}

impl Counting {
    fn paces(&self) -> usize {
        self.paces.load(Ordering::SeqCst)
    }
}

impl Pacer for Counting {
    async fn pace(&self) {
        self.paces.fetch_add(1, Ordering::SeqCst);
        self.interval.pace().await;
    }
}

async fn start<P: Pacer + 'static>(prime_pacer: P) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (shutdown, rx) = oneshot::channel::<()>();

    let service = CalculatorService::new(prime_pacer).into_server();
    let handle = tokio::spawn(async move {
        Server::builder()
            .add_service(service)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                drop(rx.await)
            })
            .await
            .unwrap();
    });

    Running {
        addr,
        shutdown,
        handle,
    }
}

async fn caller(server: &Running) -> Caller<Immediate> {
    Caller::connect(server.endpoint(), Immediate).await.unwrap()
}

#[tokio::test]
async fn sum() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = caller(&server).await;

    assert_eq!(caller.sum(5.5, 7.4).await, Ok(5.5 + 7.4));
    assert_eq!(caller.sum(-2.5, 0.25).await, Ok(-2.25));

    let first = caller.sum(0.1, 0.2).await;
    let second = caller.sum(0.1, 0.2).await;
    assert_eq!(first, second);

    server.stop().await;
}

#[tokio::test]
async fn prime_number() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = caller(&server).await;

    let mut seen = Vec::new();
    let primes = caller
        .prime_number(15, |prime| seen.push(prime))
        .await
        .unwrap();
    assert_eq!(primes, [2, 3, 5, 7, 11, 13]);
    assert_eq!(seen, primes);

    for limit in [0, 1] {
        assert_eq!(caller.prime_number(limit, |_| {}).await, Ok(vec![]));
    }

    server.stop().await;
}

#[tokio::test]
async fn compute_average() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = caller(&server).await;

    assert_eq!(caller.compute_average(vec![10, 16, 20, 14]).await, Ok(15));
    assert_eq!(caller.compute_average(vec![-1, -2]).await, Ok(-2));

    server.stop().await;
}

#[tokio::test]
async fn empty_average_fails_only_that_call() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = caller(&server).await;

    assert_eq!(
        caller.compute_average(vec![]).await,
        Err(Error::EmptyInputSequence)
    );

    // The server keeps serving.
    assert_eq!(caller.compute_average(vec![3]).await, Ok(3));
    assert_eq!(caller.sum(1.0, 2.0).await, Ok(3.0));

    server.stop().await;
}

#[tokio::test]
async fn empty_average_is_invalid_argument_on_the_wire() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut client = CalculatorClient::connect(server.endpoint()).await.unwrap();

    let status = client
        .compute_average(tokio_stream::empty::<AverageRequest>())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);

    server.stop().await;
}

#[tokio::test]
async fn failed_input_is_never_averaged() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut client = CalculatorClient::connect(server.endpoint()).await.unwrap();

    let (mut tx, rx) = channel::pipe(&Lifecycle::open(), Direction::Input, 4);
    tx.send(AverageRequest { value: 10 }).await.unwrap();
    // Gone without a half-close.
    drop(tx);

    let call = client.compute_average(bridge::requests(rx));
    if let Ok(result) = timeout(Duration::from_millis(200), call).await {
        assert!(result.is_err(), "failed input was averaged: {result:?}");
    }

    // The abandoned call may still be open on the server, so the server is
    // left to shut down with the runtime.
    drop(server);
}

#[tokio::test]
async fn find_max_number() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = caller(&server).await;

    assert_eq!(
        caller.find_max_number(vec![1, 3, 5, 4, 8]).await,
        Ok(vec![1, 3, 5, 8])
    );
    assert_eq!(caller.find_max_number(vec![1]).await, Ok(vec![1]));
    assert_eq!(caller.find_max_number(vec![5, 5, 5]).await, Ok(vec![5]));
    assert_eq!(caller.find_max_number(vec![]).await, Ok(vec![]));

    server.stop().await;
}

#[tokio::test]
async fn find_max_number_interleaves_with_paced_requests() {
    let server = start(Interval(Duration::ZERO)).await;
    let mut caller = Caller::connect(server.endpoint(), Interval::from_millis(10))
        .await
        .unwrap();

    let values: Vec<i64> = (0..20).map(|i| if i % 3 == 0 { i } else { -i }).collect();
    let maxima = caller.find_max_number(values).await.unwrap();
    assert_eq!(maxima, [0, 3, 6, 9, 12, 15, 18]);

    server.stop().await;
}

#[tokio::test]
async fn abandoning_a_prime_stream_stops_the_producer() {
    let pacer = Counting {
        paces: Arc::default(),
        interval: Interval::from_millis(20),
    };
    let server = start(pacer.clone()).await;
    let mut client = CalculatorClient::connect(server.endpoint()).await.unwrap();

    let mut stream = client
        .prime_number(PrimeRequest { limit: i64::MAX })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(stream.message().await.unwrap().map(|r| r.prime), Some(2));
    assert_eq!(stream.message().await.unwrap().map(|r| r.prime), Some(3));
    drop(stream);

    // Give the server time to notice, then check that pacing has stopped.
    tokio::time::sleep(Duration::from_millis(200)).await;
    let stopped_at = pacer.paces();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(pacer.paces(), stopped_at);

    let mut caller = caller(&server).await;
    assert_eq!(caller.sum(2.0, 2.0).await, Ok(4.0));
    assert_eq!(caller.prime_number(7, |_| {}).await, Ok(vec![2, 3, 5, 7]));

    server.stop().await;
}
