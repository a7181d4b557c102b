//! Injectable pacing for producers whose rate is deliberately bounded.

use std::{future::Future, time::Duration};

/// Suspends a producer between two emissions.
///
/// Producers race [`Pacer::pace`] against cancellation of the call, so an
/// implementation may block for as long as it likes.
pub trait Pacer: Send + Sync {
    fn pace(&self) -> impl Future<Output = ()> + Send;
}

/// Waits a fixed wall-clock interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval(pub Duration);

impl Interval {
    pub fn from_millis(millis: u64) -> Self {
        Interval(Duration::from_millis(millis))
    }
}

impl Pacer for Interval {
    fn pace(&self) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(self.0)
    }
}

/// Never waits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

impl Pacer for Immediate {
    async fn pace(&self) {}
}

impl<P: Pacer> Pacer for &P {
    fn pace(&self) -> impl Future<Output = ()> + Send {
        (**self).pace()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interval_sleeps_for_its_duration() {
        let start = tokio::time::Instant::now();
        Interval::from_millis(1000).pace().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
