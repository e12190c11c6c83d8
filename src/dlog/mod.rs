//! Discrete-logarithm recovery for point-mode plaintexts.
//!
//! Point-mode decryption ends with a point `Q = m·G` and the promise that
//! `m` is a small integer, at most `B` bytes wide for the column's declared
//! width. Two solvers recover it, both parallel, both O(√range):
//!
//! - **[`kangaroo`]**: Pollard's lambda method. No precomputation; the right
//!   choice for one-off cells and the wider 8-byte range.
//! - **[`bsgs`]**: baby-step giant-step with a reusable precomputed table;
//!   pays `2^(4B)` entries of memory once, then answers queries fast. Only
//!   feasible for small widths.
//!
//! # Worker lifecycle
//!
//! A solver worker is `RUNNING` until it either hits a collision
//! ([`SolverOutcome::Found`]) or burns its budget
//! ([`SolverOutcome::Exhausted`]). The orchestrator takes the first `Found`,
//! cancels the remaining workers through a shared [`CancellationToken`], and
//! maps all-`Exhausted` onto [`Error::DlSearchExhausted`](crate::errors::Error::DlSearchExhausted).
//! Cancellation is cooperative: workers observe the token between
//! iterations.

pub mod bsgs;
pub mod kangaroo;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

pub use bsgs::BsgsTable;
pub use kangaroo::solve as kangaroo_solve;

use crate::errors::Error;

/// Terminal state of a single solver worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverOutcome {
    /// A collision produced the scalar.
    Found(u128),
    /// The worker's budget ran out without a collision.
    Exhausted,
}

/// Cooperative cancellation flag shared between solver workers.
///
/// The winning worker sets it; the others check it between iterations and
/// stop within one loop pass.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of every worker sharing this token.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Validates a solver byte width: 1..=8.
pub(crate) fn validate_byte_width(byte_width: u32) -> Result<(), Error> {
    if !(1..=8).contains(&byte_width) {
        return Err(Error::InvalidConfig(format!(
            "byte width {byte_width} is outside 1..=8"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_clear_and_latches() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn byte_width_bounds() {
        assert!(validate_byte_width(0).is_err());
        assert!(validate_byte_width(1).is_ok());
        assert!(validate_byte_width(8).is_ok());
        assert!(validate_byte_width(9).is_err());
    }
}
