//! Lagrange reconstruction of the decryption mask.
//!
//! Custodian `k` contributes the point `K_k = (r·s_k)·G`, where `s_k` is its
//! prime-field share of the column secret `x` (a degree-1 polynomial
//! `f(i) = x + a·i mod N` evaluated at `i = k`). Interpolating at zero in
//! the exponent with the pair weights
//!
//! | indices | λ_a       | λ_b        |
//! |---------|-----------|------------|
//! | {1, 2}  | 2         | −1         |
//! | {2, 3}  | 3         | −2         |
//! | {1, 3}  | 3·2⁻¹     | −2⁻¹       |
//!
//! (all mod `N`) yields `λ_a·K_a + λ_b·K_b = (r·x)·G`, the mask both
//! encryption modes hide behind. The weights are computed from the general
//! formula `λ_a = i_b / (i_b − i_a)` rather than a lookup table, so any pair
//! of distinct indices in {1, 2, 3} works.

use crate::{
    arith::curve::{CurvePoint, Scalar},
    errors::Error,
};

/// Lagrange-at-zero weights for a pair of distinct custodian indices.
pub(crate) fn pair_weights(a: u8, b: u8) -> Result<(Scalar, Scalar), Error> {
    for index in [a, b] {
        if !(1..=3).contains(&index) {
            return Err(Error::BadShareIndex(index));
        }
    }
    if a == b {
        return Err(Error::InsufficientShares {
            required: 2,
            provided: 1,
        });
    }
    let ia = Scalar::from(u64::from(a));
    let ib = Scalar::from(u64::from(b));
    let weight_a = ib * invert(ib - ia)?;
    let weight_b = ia * invert(ia - ib)?;
    Ok((weight_a, weight_b))
}

fn invert(s: Scalar) -> Result<Scalar, Error> {
    Option::<Scalar>::from(s.invert())
        .ok_or_else(|| Error::InvalidConfig("share index difference is not invertible".into()))
}

/// Reconstructs the decryption mask from custodian contributions.
///
/// The first two contributions with distinct indices are interpolated; extra
/// contributions are ignored. Fails with [`Error::InsufficientShares`] when
/// fewer than two distinct indices are present and
/// [`Error::BadShareIndex`] on an index outside {1, 2, 3}.
pub fn reconstruct_mask(contributions: &[(u8, CurvePoint)]) -> Result<CurvePoint, Error> {
    let Some((index_a, point_a)) = contributions.first().copied() else {
        return Err(Error::InsufficientShares {
            required: 2,
            provided: 0,
        });
    };
    let Some((index_b, point_b)) = contributions
        .iter()
        .copied()
        .find(|(index, _)| *index != index_a)
    else {
        return Err(Error::InsufficientShares {
            required: 2,
            provided: 1,
        });
    };

    let (weight_a, weight_b) = pair_weights(index_a, index_b)?;
    Ok(point_a
        .mul_scalar(&weight_a)
        .add(&point_b.mul_scalar(&weight_b)))
}
