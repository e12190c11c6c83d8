//! Error types for the crate.
//!
//! A single [`Error`] enum covers the arithmetic layer (point validation,
//! decompression), the threshold scheme (share indices, reconstruction), the
//! discrete-log solvers, and the table pipeline. Variants carry enough
//! context to diagnose a failure without a debugger; they are implemented
//! with `thiserror` so they are easy to convert and display in higher-level
//! code.

use thiserror::Error;

/// Errors returned by the encryption, sharing and table APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// A value presented as a curve point fails the curve equation.
    #[error("point is not on the curve")]
    InvalidPoint,
    /// During decompression, the abscissa has no corresponding ordinate.
    #[error("no square root: x is not the abscissa of a curve point")]
    NoSquareRoot,
    /// A compressed point had the wrong length.
    #[error("malformed point encoding: expected {expected} bytes, got {actual}")]
    MalformedEncoding { expected: usize, actual: usize },
    /// A custodian share index outside {1, 2, 3} was requested.
    #[error("bad share index {0}: custodian indices are 1, 2 and 3")]
    BadShareIndex(u8),
    /// Reconstruction was attempted with too few distinct contributions.
    #[error("insufficient shares: required {required}, provided {provided}")]
    InsufficientShares { required: usize, provided: usize },
    /// The kangaroo or BSGS solver exceeded its budget without a collision.
    #[error("discrete-log search exhausted after a budget of {budget}")]
    DlSearchExhausted { budget: u64 },
    /// A point-mode plaintext does not fit the column's declared byte width.
    #[error("plaintext {value} does not fit in {width} bytes")]
    PlaintextRange { value: u128, width: u32 },
    /// A pass-through cell's runtime type contradicts its declared column type.
    #[error("type mismatch in column {column}: expected {expected}, got {actual}")]
    TypeMismatch {
        column: String,
        expected: &'static str,
        actual: &'static str,
    },
    /// A request referenced a cell, column or key the caller does not hold.
    #[error("malformed input: {0}")]
    MalformedInput(String),
    /// Invalid solver or pipeline configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A database or storage operation failed.
    #[error("storage error: {0}")]
    Storage(String),
    /// Key material could not be serialized or deserialized.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    /// An underlying I/O operation failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
