//! SHA-512 XOR keystream for hash-mode payloads.
//!
//! Hash mode obscures a plaintext by XORing it against a keystream derived
//! from the shared-secret point `s = rY = xC`. The keystream is
//! `SHA-512(s.x ‖ s.y)` with both coordinates zero-padded to the 28-byte
//! field width, cycled every 64 bytes:
//!
//! ```text
//! d[k] = m[k] ⊕ h[k mod 64]
//! ```
//!
//! Applying the same operation twice restores the plaintext, so a single
//! routine serves both directions. Plaintexts longer than 64 bytes reuse
//! keystream bytes; that is the wire format's trade-off, not an option.

use sha2::{Digest, Sha512};

use crate::arith::curve::{CurvePoint, FIELD_BYTES};

/// Bytes of keystream produced by one digest.
pub const KEYSTREAM_LEN: usize = 64;

/// The hash-mode payload cipher.
///
/// Stateless; the entire key is the mask point.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sha512XorCipher;

impl Sha512XorCipher {
    /// Derives the 64-byte keystream from a mask point.
    ///
    /// Coordinates are fixed-width, so masks whose coordinates carry leading
    /// zeros cannot alias a differently-sized encoding.
    pub fn keystream(mask: &CurvePoint) -> [u8; KEYSTREAM_LEN] {
        let (x, y) = mask
            .coordinates()
            .unwrap_or(([0u8; FIELD_BYTES], [0u8; FIELD_BYTES]));
        let mut hasher = Sha512::new();
        hasher.update(x);
        hasher.update(y);
        hasher.finalize().into()
    }

    /// XORs `data` against the keystream; encrypts and decrypts alike.
    pub fn apply(mask: &CurvePoint, data: &[u8]) -> Vec<u8> {
        let keystream = Self::keystream(mask);
        data.iter()
            .enumerate()
            .map(|(k, byte)| byte ^ keystream[k % KEYSTREAM_LEN])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::arith::curve::CurveContext;

    fn random_mask() -> CurvePoint {
        let ctx = CurveContext::new();
        ctx.scalar_base_mul(&ctx.sample_scalar(&mut OsRng))
    }

    #[test]
    fn apply_is_an_involution() {
        let mask = random_mask();
        let message = b"the rain in spain stays mainly in the plain";
        let ciphertext = Sha512XorCipher::apply(&mask, message);
        assert_ne!(&ciphertext[..], &message[..]);
        assert_eq!(Sha512XorCipher::apply(&mask, &ciphertext), message);
    }

    #[test]
    fn keystream_cycles_every_64_bytes() {
        let mask = random_mask();
        let zeros = vec![0u8; 160];
        let stream = Sha512XorCipher::apply(&mask, &zeros);
        assert_eq!(stream[..64], stream[64..128]);
        assert_eq!(stream[..32], stream[128..160]);
    }

    #[test]
    fn distinct_masks_give_distinct_keystreams() {
        let a = Sha512XorCipher::keystream(&random_mask());
        let b = Sha512XorCipher::keystream(&random_mask());
        assert_ne!(a, b);
    }
}
