//! Per-call handlers, one per interaction shape.
//!
//! Handlers only see the [`channel`](crate::channel) ends of their own call.
//! Any accumulator they keep lives on their stack for the duration of the
//! call and is never shared.

mod average;
mod max;
mod prime;
mod sum;

pub use average::compute_average;
pub use max::find_max_number;
pub use prime::{is_prime, prime_number};
pub use sum::sum;
