//! Parallel baby-step giant-step solver.
//!
//! With `M = 2^(4·B)`, any `m ∈ [0, M²)` decomposes as `m = i·M + j` with
//! `i, j ∈ [0, M)`. The baby-step table maps `compress(j·G) → j` for every
//! `j`; the search then walks `Q − i·M·G` for increasing `i` until the
//! result appears in the table.
//!
//! The table costs `M` entries of memory: around 2²⁰ for `B = 5`, which is
//! fine, and 2³² for `B = 8`, which is not; BSGS is for small widths, the
//! kangaroo covers the rest. Building it is the expensive part, so
//! [`BsgsTable`] is a value: build once, solve many cells of the same
//! column.
//!
//! `W` workers stride `i` by `W`, each maintaining its running point by one
//! subtraction per step. The first hit cancels the rest through the shared
//! token.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, instrument};

use crate::{
    arith::{
        codec::{self, CompressedPoint},
        curve::{CurveContext, CurvePoint},
    },
    config::SolverConfig,
    dlog::{validate_byte_width, CancellationToken},
    errors::Error,
};

/// Precomputed baby-step table for a fixed byte width.
pub struct BsgsTable {
    byte_width: u32,
    m: u64,
    baby_steps: HashMap<CompressedPoint, u64>,
}

impl BsgsTable {
    /// Builds the table of `2^(4·B)` baby steps.
    #[instrument(skip(ctx))]
    pub fn generate(ctx: &CurveContext, byte_width: u32) -> Result<Self, Error> {
        validate_byte_width(byte_width)?;
        let m: u64 = 1u64 << (4 * byte_width);

        let mut baby_steps = HashMap::with_capacity(m as usize);
        let g = ctx.generator();
        let mut point = ctx.identity();
        for j in 0..m {
            baby_steps.insert(codec::compress(&point), j);
            point = point.add(&g);
        }
        debug!(entries = m, "baby-step table ready");

        Ok(Self {
            byte_width,
            m,
            baby_steps,
        })
    }

    /// The byte width this table serves.
    pub fn byte_width(&self) -> u32 {
        self.byte_width
    }

    /// Recovers `m ∈ [0, M²)` with `Q = m·G`.
    #[instrument(skip_all, fields(byte_width = self.byte_width, workers = config.workers))]
    pub fn solve(
        &self,
        ctx: &CurveContext,
        target: &CurvePoint,
        config: &SolverConfig,
    ) -> Result<u128, Error> {
        config.validate()?;
        let workers = config.workers as u64;
        let giant = ctx.scalar_base_mul(&ctx.scalar_from_u128(u128::from(self.m)));
        let stride = giant.mul_scalar(&ctx.scalar_from_u128(u128::from(workers)));
        let token = CancellationToken::new();

        let found = (0..workers.min(self.m)).into_par_iter().find_map_any(|k| {
            let mut position =
                target.sub(&giant.mul_scalar(&ctx.scalar_from_u128(u128::from(k))));
            let mut i = k;
            while i < self.m {
                if token.is_cancelled() {
                    return None;
                }
                if let Some(j) = self.baby_steps.get(&codec::compress(&position)) {
                    let candidate = u128::from(i) * u128::from(self.m) + u128::from(*j);
                    // A table hit can alias (the identity encoding, or a
                    // candidate congruent mod N); confirm against the target.
                    if ctx.scalar_base_mul(&ctx.scalar_from_u128(candidate)) == *target {
                        token.cancel();
                        return Some(candidate);
                    }
                }
                position = position.sub(&stride);
                i += workers;
            }
            None
        });

        found.ok_or(Error::DlSearchExhausted { budget: self.m })
    }
}

/// Builds a table and solves a single instance with it.
///
/// For repeated queries of the same width, build the table once with
/// [`BsgsTable::generate`] instead.
pub fn solve(
    ctx: &CurveContext,
    target: &CurvePoint,
    byte_width: u32,
    config: &SolverConfig,
) -> Result<u128, Error> {
    BsgsTable::generate(ctx, byte_width)?.solve(ctx, target, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;

    #[test]
    fn recovers_values_across_the_range() {
        let ctx = CurveContext::new();
        let config = SolverConfig::default();
        // Width 2: a 256-entry table covering m < 2^16.
        let table = BsgsTable::generate(&ctx, 2).unwrap();
        // Table reuse across queries: j-only, i-only, and mixed values.
        for m in [0u128, 3, 255, 256, 40_000, 65_535] {
            let target = ctx.scalar_base_mul(&ctx.scalar_from_u128(m));
            assert_eq!(table.solve(&ctx, &target, &config).unwrap(), m, "m = {m}");
        }
    }

    #[test]
    fn unreachable_target_exhausts() {
        let ctx = CurveContext::new();
        let config = SolverConfig::default();
        let table = BsgsTable::generate(&ctx, 1).unwrap();
        // 2^16 is outside the 8-bit range the width-1 table covers.
        let target = ctx.scalar_base_mul(&ctx.scalar_from_u128(1 << 16));
        assert!(matches!(
            table.solve(&ctx, &target, &config),
            Err(Error::DlSearchExhausted { .. })
        ));
    }

    #[test]
    fn single_worker_still_covers_the_space() {
        let ctx = CurveContext::new();
        let config = SolverConfig {
            workers: 1,
            ..SolverConfig::default()
        };
        let table = BsgsTable::generate(&ctx, 1).unwrap();
        let target = ctx.scalar_base_mul(&ctx.scalar_from_u128(177));
        assert_eq!(table.solve(&ctx, &target, &config).unwrap(), 177);
    }

    // Scenario value from the wire-compatibility suite: m = 1099511327776,
    // B = 5 (a 2^20-entry table). Run with `cargo test --release -- --ignored`.
    #[test]
    #[ignore = "2^20-entry table, slow in debug builds"]
    fn recovers_the_five_byte_scenario_value() {
        let ctx = CurveContext::new();
        let config = SolverConfig::default();
        let m = 1_099_511_327_776u128;
        let target = ctx.scalar_base_mul(&ctx.scalar_from_u128(m));
        assert_eq!(solve(&ctx, &target, 5, &config).unwrap(), m);
    }
}
