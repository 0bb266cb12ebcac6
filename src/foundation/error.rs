/// Crate-wide result alias.
pub type GifloomResult<T> = Result<T, GifloomError>;

/// Every failure the core reports to its caller.
///
/// The core never panics on malformed input; each public operation returns one of these
/// variants instead. `NotFound` and `IndexOutOfRange` are the id-flavoured and index-flavoured
/// halves of the same "no such thing" kind, see [`GifloomError::is_not_found`].
#[derive(thiserror::Error, Debug)]
pub enum GifloomError {
    /// A material id or other named entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An index (frame, layer, selection entry) is outside the current bounds.
    #[error("index out of range: {index} (len {len})")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The length it was validated against.
        len: usize,
    },

    /// Rejected argument: non-positive duration, degenerate grid, bad palette size, ...
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A template needs more materials than were supplied for binding.
    #[error("insufficient materials: template needs {required}, got {available}")]
    InsufficientMaterials {
        /// Slots the template requires.
        required: usize,
        /// Materials available for binding.
        available: usize,
    },

    /// Export was requested for a sequence without frames.
    #[error("sequence is empty")]
    EmptySequence,

    /// A frame or layer references a material that has been removed.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// A cancellation token was triggered between frames.
    #[error("operation cancelled")]
    Cancelled,

    /// Input bytes could not be decoded as an image.
    #[error("decode error: {0}")]
    Decode(String),

    /// GIF/PNG encoding failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// Template (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// IO and other context-carrying failures.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GifloomError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn dangling(msg: impl Into<String>) -> Self {
        Self::DanglingReference(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }

    /// `true` for both `NotFound` and `IndexOutOfRange`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::IndexOutOfRange { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
