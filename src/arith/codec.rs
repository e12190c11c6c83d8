//! Compressed point encoding.
//!
//! A point `P = (x, y)` is serialized in 29 bytes as `[f(y) ‖ x]` where `x`
//! is big-endian, left-zero-padded to 28 bytes, and `f(y)` is `1` if
//! `y ≥ (p − 1)/2` and `0` otherwise. For a given abscissa the two candidate
//! ordinates are `y` and `p − y`, so the single parity byte pins the point
//! down. Decompression recovers `y` as a square root of `x³ − 3x + b` and
//! flips it to the side the parity byte names.
//!
//! The point at infinity encodes as 29 zero bytes and decodes back to
//! itself; no finite point claims that encoding because the decoder only
//! consults the curve equation for non-zero input.

use elliptic_curve::sec1::FromEncodedPoint;
use p224::{AffinePoint, EncodedPoint, ProjectivePoint};

use crate::{
    arith::curve::{CurvePoint, COMPRESSED_LEN, HALF_P},
    errors::Error,
};

/// The 29-byte wire form of a curve point.
pub type CompressedPoint = [u8; COMPRESSED_LEN];

/// Serializes a point into its 29-byte compressed form.
pub fn compress(point: &CurvePoint) -> CompressedPoint {
    let mut out = [0u8; COMPRESSED_LEN];
    let Some((x, y)) = point.coordinates() else {
        return out;
    };
    out[0] = u8::from(y >= HALF_P);
    out[1..].copy_from_slice(&x);
    out
}

/// Parses a 29-byte compressed point.
///
/// Only the low bit of the leading byte is consulted for the parity flag.
/// Fails with [`Error::NoSquareRoot`] if the abscissa is not on the curve
/// and [`Error::MalformedEncoding`] on a wrong-length input.
pub fn decompress(bytes: &[u8]) -> Result<CurvePoint, Error> {
    if bytes.len() != COMPRESSED_LEN {
        return Err(Error::MalformedEncoding {
            expected: COMPRESSED_LEN,
            actual: bytes.len(),
        });
    }
    let high = bytes[0] & 1 == 1;
    let x = &bytes[1..];
    if !high && x.iter().all(|b| *b == 0) {
        return Ok(CurvePoint::identity());
    }

    // Decode the low-ordinate candidate through the SEC1 path, which
    // computes the modular square root and checks the curve equation.
    let mut sec1 = [0u8; COMPRESSED_LEN];
    sec1[0] = 0x02;
    sec1[1..].copy_from_slice(x);
    let encoded = EncodedPoint::from_bytes(sec1).map_err(|_| Error::InvalidPoint)?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or(Error::NoSquareRoot)?;
    let point = CurvePoint::from_projective(ProjectivePoint::from(affine));

    let (_, y) = point.coordinates().ok_or(Error::InvalidPoint)?;
    if (y >= HALF_P) == high {
        Ok(point)
    } else {
        Ok(point.negate())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::arith::curve::CurveContext;

    #[test]
    fn round_trip_random_points() {
        let ctx = CurveContext::new();
        for _ in 0..32 {
            let k = ctx.sample_scalar(&mut OsRng);
            let point = ctx.scalar_base_mul(&k);
            let compressed = compress(&point);
            let recovered = decompress(&compressed).unwrap();
            assert_eq!(recovered, point);
            assert_eq!(recovered.coordinates(), point.coordinates());
        }
    }

    #[test]
    fn parity_distinguishes_negation() {
        let ctx = CurveContext::new();
        let point = ctx.generator().double();
        let negated = point.negate();
        let a = compress(&point);
        let b = compress(&negated);
        assert_eq!(a[1..], b[1..]);
        assert_ne!(a[0], b[0]);
        assert_eq!(decompress(&b).unwrap(), negated);
    }

    #[test]
    fn high_bits_of_parity_byte_ignored() {
        let ctx = CurveContext::new();
        let point = ctx.generator();
        let mut compressed = compress(&point);
        compressed[0] |= 0xfe;
        // Low bit unchanged, so the point must decode identically.
        let flag = compressed[0] & 1;
        compressed[0] = 0x80 | flag;
        assert_eq!(decompress(&compressed).unwrap(), point);
    }

    #[test]
    fn identity_round_trips_as_zeros() {
        let compressed = compress(&CurvePoint::identity());
        assert_eq!(compressed, [0u8; COMPRESSED_LEN]);
        assert!(decompress(&compressed).unwrap().is_identity());
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(matches!(
            decompress(&[0u8; COMPRESSED_LEN - 1]),
            Err(Error::MalformedEncoding { expected: 29, actual: 28 })
        ));
    }

    #[test]
    fn off_curve_abscissa_rejected() {
        // Walk a few abscissas; roughly half have no square root, so some
        // value in a short range must fail.
        let mut failures = 0;
        for x in 1u8..=16 {
            let mut candidate = [0u8; COMPRESSED_LEN];
            candidate[COMPRESSED_LEN - 1] = x;
            if matches!(decompress(&candidate), Err(Error::NoSquareRoot)) {
                failures += 1;
            }
        }
        assert!(failures > 0);
    }
}
