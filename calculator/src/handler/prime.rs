use crate::{
    channel::Sender,
    pacing::Pacer,
    pb::{PrimeRequest, PrimeResponse},
    Error, Result,
};
use tracing::debug;

/// `n` is prime when it is greater than one and nothing in
/// `2..=floor(sqrt(n))` divides it.
pub fn is_prime(n: i64) -> bool {
    if n <= 1 {
        return false;
    }

    let mut i = 2;
    // `i <= n / i` is `i * i <= n` without the overflow.
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 1;
    }
    true
}

/// Streams every prime in `[0, limit]` in ascending order, pacing each
/// emission with `pacer`, then half-closes `out`.
///
/// A limit below two yields nothing. When the reader goes away, either while
/// the producer is pacing or while it is sending, production stops and the
/// call ends without error.
pub async fn prime_number<P: Pacer>(
    request: PrimeRequest,
    pacer: &P,
    out: &mut Sender<PrimeResponse>,
) -> Result<()> {
    let mut emitted = 0usize;

    for prime in (2..=request.limit).filter(|n| is_prime(*n)) {
        tokio::select! {
            biased;

            _ = out.closed() => {
                debug!(emitted, "prime stream cancelled while pacing");
                return Ok(());
            }
            _ = pacer.pace() => {}
        }

        match out.send(PrimeResponse { prime }).await {
            Ok(()) => emitted += 1,
            Err(Error::Cancelled) => {
                debug!(emitted, "prime stream cancelled while sending");
                return Ok(());
            }
            Err(err) => return Err(err),
        }
    }

    debug!(emitted, limit = request.limit, "prime stream complete");
    out.close();
    Ok(())
}
