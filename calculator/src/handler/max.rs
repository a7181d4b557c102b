use crate::{
    channel::{Receiver, Sender},
    pb::{MaxRequest, MaxResponse},
    Result,
};
use tracing::trace;

/// Emits one response for every value that beats the running maximum.
///
/// The running maximum starts at `i64::MIN`, so the first value is emitted
/// unless it is `i64::MIN` itself. Output is half-closed once the input
/// reaches end-of-input and nothing is sent after that.
pub async fn find_max_number(
    input: &mut Receiver<MaxRequest>,
    out: &mut Sender<MaxResponse>,
) -> Result<()> {
    let mut max = i64::MIN;

    while let Some(MaxRequest { value }) = input.recv().await? {
        if value > max {
            max = value;
            trace!(max, "new maximum");
            out.send(MaxResponse { max }).await?;
        }
    }

    out.close();
    Ok(())
}
