//! Call-scoped error conditions.

use thiserror::Error;
use tonic::{Code, Status};

/// Why a single call did not complete normally.
///
/// None of these are fatal to the hosting process; each one ends only the call
/// that produced it. End-of-input is not an error and never shows up here, it
/// is reported as `Ok(None)` by [`Receiver::recv`](crate::channel::Receiver::recv).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A read or write failed below the protocol layer.
    #[error("transport failure: {0}")]
    TransportFailure(String),
    /// A send or receive was attempted on a direction that is already closed.
    #[error("channel closed")]
    ChannelClosed,
    /// A client-streaming call reached end-of-input without a single value.
    #[error("no values were sent before the input was closed")]
    EmptyInputSequence,
    /// The peer went away or abandoned the call.
    #[error("call cancelled by peer")]
    Cancelled,
}

/// Result type alias for call operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        let code = match err {
            Error::TransportFailure(_) => Code::Unavailable,
            Error::ChannelClosed => Code::FailedPrecondition,
            Error::EmptyInputSequence => Code::InvalidArgument,
            Error::Cancelled => Code::Cancelled,
        };
        Status::new(code, err.to_string())
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        match status.code() {
            Code::InvalidArgument => Error::EmptyInputSequence,
            Code::FailedPrecondition => Error::ChannelClosed,
            Code::Cancelled => Error::Cancelled,
            code => Error::TransportFailure(format!("{:?}: {}", code, status.message())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_survive_a_status_round_trip() {
        for err in [
            Error::ChannelClosed,
            Error::EmptyInputSequence,
            Error::Cancelled,
        ] {
            assert_eq!(Error::from(Status::from(err.clone())), err);
        }
    }

    #[test]
    fn unknown_status_is_a_transport_failure() {
        let err = Error::from(Status::internal("h2 protocol error"));
        assert_eq!(
            err,
            Error::TransportFailure("Internal: h2 protocol error".into())
        );

        let status = Status::from(Error::TransportFailure("reset".into()));
        assert_eq!(status.code(), Code::Unavailable);
    }
}
