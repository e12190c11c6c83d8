//! Byte-parallel 2-of-3 Shamir secret sharing over GF(256).
//!
//! Each byte of the secret is shared independently: a degree-1 polynomial
//! `f(i) = secret_byte ⊕ c·i` with a uniform random coefficient `c`, shared
//! at the evaluation points 1, 2 and 3. Any two shares recover the byte by
//! Lagrange interpolation at zero; a single share is uniformly random and
//! reveals nothing.
//!
//! This layer recovers the secret *bytes* exactly. The custodians'
//! prime-field shares (see [`crate::scheme::keys`]) are a separate layer:
//! they are what gets exponentiated during threshold decryption, since
//! GF(256)-linear shares cannot be recombined through curve operations.

use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{arith::gf256, errors::Error};

/// Number of shares issued per secret.
pub const SHARE_COUNT: usize = 3;

/// Number of shares needed to recover a secret.
pub const THRESHOLD: usize = 2;

/// One custodian's byte-level share of an `N`-byte secret.
///
/// Zeroized on drop; a leaked pair of shares is the secret.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ByteShare<const N: usize> {
    /// Evaluation point, 1..=3.
    pub index: u8,
    /// Per-byte polynomial evaluations.
    pub bytes: [u8; N],
}

/// Splits a secret into three shares, any two of which recover it.
pub fn split<R: RngCore + CryptoRng + ?Sized, const N: usize>(
    rng: &mut R,
    secret: &[u8; N],
) -> [ByteShare<N>; SHARE_COUNT] {
    let mut shares = [1u8, 2, 3].map(|index| ByteShare {
        index,
        bytes: [0u8; N],
    });
    let mut coefficients = [0u8; N];
    rng.fill_bytes(&mut coefficients);
    for (k, coefficient) in coefficients.iter().enumerate() {
        for share in shares.iter_mut() {
            share.bytes[k] = gf256::add(secret[k], gf256::mul(*coefficient, share.index));
        }
    }
    coefficients.zeroize();
    shares
}

/// Recovers the secret from any two distinct shares.
pub fn combine<const N: usize>(a: &ByteShare<N>, b: &ByteShare<N>) -> Result<[u8; N], Error> {
    for share in [a, b] {
        if !(1..=SHARE_COUNT as u8).contains(&share.index) {
            return Err(Error::BadShareIndex(share.index));
        }
    }
    if a.index == b.index {
        return Err(Error::InsufficientShares {
            required: THRESHOLD,
            provided: 1,
        });
    }

    // Lagrange weights at zero: subtraction is addition in GF(2^8).
    let denominator_inv = gf256::inv(gf256::add(a.index, b.index));
    let weight_a = gf256::mul(b.index, denominator_inv);
    let weight_b = gf256::mul(a.index, denominator_inv);

    let mut secret = [0u8; N];
    for k in 0..N {
        secret[k] = gf256::add(
            gf256::mul(a.bytes[k], weight_a),
            gf256::mul(b.bytes[k], weight_b),
        );
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rand_core::RngCore;

    use super::*;

    #[test]
    fn every_pair_recovers_the_secret() {
        let mut secret = [0u8; 28];
        OsRng.fill_bytes(&mut secret);
        let shares = split(&mut OsRng, &secret);
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            assert_eq!(combine(&shares[i], &shares[j]).unwrap(), secret);
            assert_eq!(combine(&shares[j], &shares[i]).unwrap(), secret);
        }
    }

    #[test]
    fn duplicate_share_rejected() {
        let shares = split(&mut OsRng, &[7u8; 16]);
        assert!(matches!(
            combine(&shares[0], &shares[0]),
            Err(Error::InsufficientShares { required: 2, provided: 1 })
        ));
    }

    #[test]
    fn out_of_range_index_rejected() {
        let shares = split(&mut OsRng, &[1u8; 4]);
        let mut bad = shares[0].clone();
        bad.index = 4;
        assert!(matches!(
            combine(&bad, &shares[1]),
            Err(Error::BadShareIndex(4))
        ));
    }

    #[test]
    fn tampered_share_breaks_recovery() {
        let secret = [0xab; 28];
        let shares = split(&mut OsRng, &secret);
        let mut bad = shares[1].clone();
        bad.bytes[0] ^= 0xff;
        assert_ne!(combine(&shares[0], &bad).unwrap(), secret);
    }
}
