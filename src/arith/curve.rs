//! Curve context and point operations over NIST P-224.
//!
//! The curve is the short-Weierstrass prime curve `y² = x³ − 3x + b (mod p)`
//! of prime order `N` with base point `G`. [`CurvePoint`] wraps the
//! projective representation from the `p224` crate; points built by group
//! operations are valid by construction, and points decoded from bytes are
//! validated against the curve equation before they enter the arithmetic.
//!
//! # Example
//!
//! ```rust
//! use colcrypt::arith::CurveContext;
//! use rand::rngs::OsRng;
//!
//! let ctx = CurveContext::new();
//! let x = ctx.sample_scalar(&mut OsRng);
//! let y = ctx.scalar_base_mul(&x);
//! assert_eq!(y, ctx.generator().mul_scalar(&x));
//! ```

use elliptic_curve::{group::Group, ops::Reduce, sec1::ToEncodedPoint, Field, PrimeField};
use p224::{FieldBytes, ProjectivePoint};
use rand_core::{CryptoRng, RngCore};

/// The big-integer type `Scalar` reduces against, mirroring `p224`'s own
/// pointer-width-gated choice (`U224` on 32-bit targets, `U256` on 64-bit).
#[cfg(target_pointer_width = "32")]
type ReduceUint = elliptic_curve::bigint::U224;
#[cfg(target_pointer_width = "64")]
type ReduceUint = elliptic_curve::bigint::U256;

use crate::config::CurveId;

/// Scalar of the P-224 group, an integer mod the curve order `N`.
pub type Scalar = p224::Scalar;

/// Width of a field element (and of a scalar) in bytes.
pub const FIELD_BYTES: usize = 28;

/// Width of a compressed point: one parity byte plus the abscissa.
pub const COMPRESSED_LEN: usize = 1 + FIELD_BYTES;

/// `(p − 1) / 2` in big-endian form, the threshold between "low" and "high"
/// ordinates used by the compressed encoding.
pub(crate) const HALF_P: [u8; FIELD_BYTES] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// A point on the curve, or the point at infinity.
#[derive(Clone, Copy, Debug)]
pub struct CurvePoint(ProjectivePoint);

impl PartialEq for CurvePoint {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for CurvePoint {}

impl CurvePoint {
    /// Returns the point at infinity.
    pub fn identity() -> Self {
        Self(ProjectivePoint::identity())
    }

    /// Returns the base point `G`.
    pub fn generator() -> Self {
        Self(ProjectivePoint::generator())
    }

    pub(crate) fn from_projective(point: ProjectivePoint) -> Self {
        Self(point)
    }

    /// Whether this is the point at infinity.
    pub fn is_identity(&self) -> bool {
        bool::from(self.0.is_identity())
    }

    /// Point addition.
    pub fn add(&self, other: &Self) -> Self {
        Self(self.0 + other.0)
    }

    /// Point subtraction.
    pub fn sub(&self, other: &Self) -> Self {
        Self(self.0 - other.0)
    }

    /// Point doubling.
    pub fn double(&self) -> Self {
        Self(self.0.double())
    }

    /// The additive inverse.
    pub fn negate(&self) -> Self {
        Self(-self.0)
    }

    /// Scalar multiplication: `scalar · self`.
    pub fn mul_scalar(&self, scalar: &Scalar) -> Self {
        Self(self.0 * *scalar)
    }

    /// Affine coordinates as fixed-width big-endian bytes, or `None` for the
    /// point at infinity.
    pub fn coordinates(&self) -> Option<([u8; FIELD_BYTES], [u8; FIELD_BYTES])> {
        let encoded = self.0.to_affine().to_encoded_point(false);
        match (encoded.x(), encoded.y()) {
            (Some(x), Some(y)) => {
                let mut xb = [0u8; FIELD_BYTES];
                let mut yb = [0u8; FIELD_BYTES];
                xb.copy_from_slice(x);
                yb.copy_from_slice(y);
                Some((xb, yb))
            }
            _ => None,
        }
    }

    /// The abscissa as big-endian bytes; the point at infinity reads as zero,
    /// matching its all-zero compressed encoding.
    pub(crate) fn x_bytes(&self) -> [u8; FIELD_BYTES] {
        self.coordinates().map(|(x, _)| x).unwrap_or([0u8; FIELD_BYTES])
    }
}

/// Handle to the curve constants and scalar sampling.
///
/// Every API that needs the base point, the order, or the codec constants
/// takes a `&CurveContext` rather than reaching for globals, so a future
/// second curve only has to widen [`CurveId`].
#[derive(Clone, Copy, Debug)]
pub struct CurveContext {
    curve: CurveId,
}

impl Default for CurveContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveContext {
    /// Creates a context for NIST P-224.
    pub fn new() -> Self {
        Self {
            curve: CurveId::NistP224,
        }
    }

    /// The curve this context operates on.
    pub fn curve(&self) -> CurveId {
        self.curve
    }

    /// The base point `G`.
    pub fn generator(&self) -> CurvePoint {
        CurvePoint::generator()
    }

    /// The point at infinity.
    pub fn identity(&self) -> CurvePoint {
        CurvePoint::identity()
    }

    /// `k · G`.
    pub fn scalar_base_mul(&self, k: &Scalar) -> CurvePoint {
        CurvePoint(ProjectivePoint::generator() * *k)
    }

    /// Draws an ephemeral scalar uniformly from `[0, N)`.
    ///
    /// A draw of zero is replaced by 2: a zero ephemeral would make `rG` the
    /// identity and the mask trivial. The substitution is a protocol-level
    /// fixture kept for wire compatibility; it skews the distribution by a
    /// negligible 2⁻²²⁴ and rejection sampling would be the cleaner choice.
    pub fn sample_scalar<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Scalar {
        let r = Scalar::random(&mut *rng);
        if bool::from(r.is_zero()) {
            return Scalar::from(2u64);
        }
        r
    }

    /// Draws a secret key scalar uniformly from `[1, N)` by rejection.
    pub fn sample_key_scalar<R: RngCore + CryptoRng + ?Sized>(&self, rng: &mut R) -> Scalar {
        loop {
            let x = Scalar::random(&mut *rng);
            if !bool::from(x.is_zero()) {
                return x;
            }
        }
    }

    /// Builds a scalar from a small unsigned integer.
    pub fn scalar_from_u128(&self, value: u128) -> Scalar {
        let shift = Scalar::from(u64::MAX) + Scalar::from(1u64);
        Scalar::from((value >> 64) as u64) * shift + Scalar::from(value as u64)
    }

    /// Builds a scalar from a signed coefficient.
    pub fn scalar_from_i64(&self, value: i64) -> Scalar {
        let magnitude = Scalar::from(value.unsigned_abs());
        if value < 0 {
            -magnitude
        } else {
            magnitude
        }
    }

    /// Interprets big-endian bytes as a non-negative integer mod `N`.
    pub fn scalar_from_be_bytes(&self, bytes: &[u8; FIELD_BYTES]) -> Scalar {
        <Scalar as Reduce<ReduceUint>>::reduce_bytes(&FieldBytes::from(*bytes))
    }

    /// The canonical big-endian encoding of a scalar.
    pub fn scalar_to_be_bytes(&self, scalar: &Scalar) -> [u8; FIELD_BYTES] {
        scalar.to_repr().into()
    }
}
