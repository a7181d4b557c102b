use crate::{
    channel::Receiver,
    pb::{AverageRequest, AverageResponse},
    Error, Result,
};
use tracing::debug;

#[derive(Debug, Default)]
struct Mean {
    sum: i128,
    count: u64,
}

impl Mean {
    fn push(&mut self, value: i64) {
        self.sum += i128::from(value);
        self.count += 1;
    }

    /// Floor of the mean, or `None` when nothing was pushed.
    fn floor(&self) -> Option<i64> {
        if self.count == 0 {
            return None;
        }
        // The mean lies between the smallest and largest value pushed, so it
        // always fits back into an i64.
        Some(self.sum.div_euclid(i128::from(self.count)) as i64)
    }
}

/// Reads values until end-of-input and returns the floor of their mean.
///
/// Nothing is computed before the input side closes. Zero values is an
/// [`Error::EmptyInputSequence`]; a failed read aborts the call with that
/// error and no partial result.
pub async fn compute_average(input: &mut Receiver<AverageRequest>) -> Result<AverageResponse> {
    let mut mean = Mean::default();

    while let Some(AverageRequest { value }) = input.recv().await? {
        mean.push(value);
    }

    debug!(count = mean.count, "average input complete");
    let average = mean.floor().ok_or(Error::EmptyInputSequence)?;
    Ok(AverageResponse { average })
}
