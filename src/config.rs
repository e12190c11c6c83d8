//! Configuration types for the encryption pipeline and the solvers.
//!
//! This module provides the small serde-friendly types that parameterise a
//! table encryption run: the curve selection, the per-column encryption
//! mode, the discrete-log solver settings and the pipeline options.
//!
//! # Example
//!
//! ```rust
//! use colcrypt::config::{ColumnMode, EncryptOptions, SolverConfig};
//!
//! let options = EncryptOptions::default();
//! assert!(!options.drop_existing);
//!
//! // Column commands come over the wire as bytes.
//! assert_eq!(ColumnMode::from_command(2), ColumnMode::Point);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// Supported elliptic curves.
///
/// The wire format (29-byte compressed points, 28-byte scalars) is fixed by
/// the curve, so the identifier travels with every public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum CurveId {
    /// NIST P-224 (secp224r1), a 224-bit short-Weierstrass prime curve.
    NistP224,
}

/// Per-column encryption mode.
///
/// The wire encoding is one byte per source column: `0` pass-through,
/// `1` hash mode, `2` point mode. Unknown command bytes fall back to hash
/// mode, the conservative choice.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ColumnMode {
    /// The value is re-emitted in the clear, re-serialized by type.
    Passthrough,
    /// ElGamal with a SHA-512 XOR keystream; opaque but any length.
    Hash,
    /// ElGamal with the plaintext embedded as a curve point; additively
    /// homomorphic, recoverable only for small integers.
    Point,
}

impl ColumnMode {
    /// Decodes a command byte.
    pub fn from_command(byte: u8) -> Self {
        match byte {
            0 => ColumnMode::Passthrough,
            2 => ColumnMode::Point,
            _ => ColumnMode::Hash,
        }
    }

    /// The wire byte for this mode.
    pub fn command(&self) -> u8 {
        match self {
            ColumnMode::Passthrough => 0,
            ColumnMode::Hash => 1,
            ColumnMode::Point => 2,
        }
    }

    /// Whether cells of this column are encrypted.
    pub fn is_encrypted(&self) -> bool {
        !matches!(self, ColumnMode::Passthrough)
    }
}

/// Which discrete-log algorithm recovers point-mode plaintexts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SolverKind {
    /// Parallel Pollard lambda. No precomputation, O(√range) expected time.
    Kangaroo,
    /// Parallel baby-step giant-step. O(√range) time and memory; the table
    /// is only feasible for small byte widths.
    Bsgs,
}

/// Discrete-log solver settings.
///
/// `max_episodes` bounds the number of restart episodes each wild kangaroo
/// attempts before reporting exhaustion; without it an unsolvable input
/// would search forever.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Which algorithm to run.
    pub kind: SolverKind,
    /// Number of parallel workers (tame/wild kangaroos, or giant-step lanes).
    pub workers: usize,
    /// Per-worker episode budget for the kangaroo solver.
    pub max_episodes: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            kind: SolverKind::Kangaroo,
            workers: 4,
            max_episodes: 1024,
        }
    }
}

impl SolverConfig {
    /// Validates the solver settings.
    pub fn validate(&self) -> Result<(), Error> {
        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "solver requires at least one worker".into(),
            ));
        }
        if self.max_episodes == 0 {
            return Err(Error::InvalidConfig(
                "episode budget must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Options for a table encryption run.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct EncryptOptions {
    /// Drop a pre-existing destination table before creating it. Off by
    /// default: dropping other people's tables is destructive, so it has to
    /// be asked for.
    pub drop_existing: bool,
    /// Capacity of the bounded channels between pipeline stages. The
    /// pipeline holds at most `capacity` cells per column in flight, keeping
    /// memory O(columns) regardless of table size.
    pub channel_capacity: usize,
    /// Solver used when decrypting point-mode cells.
    pub solver: SolverConfig,
}

impl Default for EncryptOptions {
    fn default() -> Self {
        Self {
            drop_existing: false,
            channel_capacity: 2,
            solver: SolverConfig::default(),
        }
    }
}

impl EncryptOptions {
    /// Validates the pipeline options.
    pub fn validate(&self) -> Result<(), Error> {
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel capacity must be greater than 0".into(),
            ));
        }
        self.solver.validate()
    }
}
