//! Error types for the ring exchange.

use thiserror::Error;

use crate::topology::Rank;

pub type RingResult<T> = Result<T, RingError>;

/// Every variant is group-fatal: whichever participant sees it, the run
/// ends with a non-zero status for all of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    /// The launcher started a different number of participants than required.
    #[error("must run with exactly {required} processes (got {actual})")]
    WrongGroupSize { required: usize, actual: usize },

    /// The number of values on the command line does not match the group.
    #[error("expected {required} numbers, got {actual}")]
    WrongArgumentCount { required: usize, actual: usize },

    /// A link to `peer` was closed because that participant released its context.
    #[error("process {rank}: link to process {peer} closed")]
    Transport { rank: Rank, peer: Rank },

    /// The execution unit for `rank` unwound before reporting.
    #[error("process {rank} panicked")]
    Panicked { rank: Rank },
}

impl RingError {
    /// Precondition failures are the ones participant 0 reports on stdout.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::WrongGroupSize { .. } | Self::WrongArgumentCount { .. }
        )
    }
}
