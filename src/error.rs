//! Error types returned by the generator's public surface.

use thiserror::Error;

/// Errors raised by [`crate::Generator`]'s public operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RngError {
    /// `random_words` was called while the readiness oracle reports
    /// [`crate::readiness::Readiness::NOT_READY`](crate::readiness::Readiness).
    /// Retry after adding more entropy, or register a `seeded` listener.
    #[error("generator is not ready: insufficient accounted entropy")]
    NotReady,

    /// A collector adapter was given a payload it cannot translate into a
    /// valid [`crate::entropy::EntropyInput`] (e.g. non-UTF-8 persisted
    /// state). The typed entropy boundary makes this unrepresentable inside
    /// `add_entropy` itself; it can only occur at the adapter layer.
    #[error("entropy submission payload could not be decoded")]
    InvalidInput,

    /// A paranoia index fell outside `[0, 10]`.
    #[error("paranoia level {0} is out of range [0, 10]")]
    ParanoiaOutOfRange(u8),
}
