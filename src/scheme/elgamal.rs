//! The two ElGamal encryption modes.
//!
//! Both modes share the frame: an ephemeral `r` gives `C = rG`, and the
//! shared-secret point `s = rY` masks the plaintext. They differ in how:
//!
//! - **Hash mode** XORs the plaintext with a SHA-512 keystream over `s`.
//!   Any byte string encrypts; nothing can be computed on the result.
//! - **Point mode** embeds the plaintext integer as `D = mG + s`. Sums of
//!   ciphertext points decrypt to sums of plaintexts, at the price that `m`
//!   must stay small enough for a discrete-log search to recover.
//!
//! Decryption needs the mask `s = xC`, obtained either directly from the
//! full private key or by Lagrange-combining two custodian contributions
//! ([`crate::scheme::mask::reconstruct_mask`]).

use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

use crate::{
    arith::{
        codec::{self, CompressedPoint},
        curve::{CurveContext, CurvePoint, Scalar},
    },
    config::{SolverConfig, SolverKind},
    dlog,
    errors::Error,
    scheme::keys::{ColumnPublicKey, PrivateKeyBundle},
    sym_enc::Sha512XorCipher,
};

/// Hash-mode ciphertext: `(C = rG, d = m ⊕ keystream(rY))`.
#[derive(Clone, Debug)]
pub struct HashCiphertext {
    pub c: CurvePoint,
    pub data: Vec<u8>,
}

/// Point-mode ciphertext: `(C = rG, D = mG + rY)` with `D` compressed.
#[derive(Clone, Copy, Debug)]
pub struct PointCiphertext {
    pub c: CurvePoint,
    pub data: CompressedPoint,
}

impl ColumnPublicKey {
    /// Hash-mode encryption with a fresh ephemeral scalar.
    pub fn encrypt_hash<R: RngCore + CryptoRng + ?Sized>(
        &self,
        ctx: &CurveContext,
        rng: &mut R,
        message: &[u8],
    ) -> HashCiphertext {
        let r = ctx.sample_scalar(rng);
        self.encrypt_hash_with_scalar(ctx, &r, message)
    }

    /// Hash-mode encryption with a caller-supplied ephemeral scalar (the
    /// table pipeline shares one `r` across all encrypted columns of a row).
    pub fn encrypt_hash_with_scalar(
        &self,
        ctx: &CurveContext,
        r: &Scalar,
        message: &[u8],
    ) -> HashCiphertext {
        let shared = self.point.mul_scalar(r);
        HashCiphertext {
            c: ctx.scalar_base_mul(r),
            data: Sha512XorCipher::apply(&shared, message),
        }
    }

    /// Point-mode encryption with a fresh ephemeral scalar.
    ///
    /// `m` must fit the declared byte width, otherwise no solver will ever
    /// recover the cell; out-of-range values are rejected here rather than
    /// discovered at decryption time.
    pub fn encrypt_point<R: RngCore + CryptoRng + ?Sized>(
        &self,
        ctx: &CurveContext,
        rng: &mut R,
        m: u128,
        byte_width: u32,
    ) -> Result<PointCiphertext, Error> {
        let r = ctx.sample_scalar(rng);
        self.encrypt_point_with_scalar(ctx, &r, m, byte_width)
    }

    /// Point-mode encryption with a caller-supplied ephemeral scalar.
    pub fn encrypt_point_with_scalar(
        &self,
        ctx: &CurveContext,
        r: &Scalar,
        m: u128,
        byte_width: u32,
    ) -> Result<PointCiphertext, Error> {
        if byte_width < 16 && m >> (8 * byte_width) != 0 {
            return Err(Error::PlaintextRange {
                value: m,
                width: byte_width,
            });
        }
        let shared = self.point.mul_scalar(r);
        let d = ctx.scalar_base_mul(&ctx.scalar_from_u128(m)).add(&shared);
        Ok(PointCiphertext {
            c: ctx.scalar_base_mul(r),
            data: codec::compress(&d),
        })
    }
}

impl PrivateKeyBundle {
    /// Hash-mode decryption with the full private key.
    pub fn decrypt_hash(&self, ct: &HashCiphertext) -> Vec<u8> {
        decrypt_hash_with_mask(&ct.data, &ct.c.mul_scalar(self.secret()))
    }

    /// Point-mode decryption with the full private key.
    pub fn decrypt_point(
        &self,
        ctx: &CurveContext,
        ct: &PointCiphertext,
        byte_width: u32,
        solver: &SolverConfig,
    ) -> Result<u128, Error> {
        decrypt_point_with_mask(
            ctx,
            &ct.data,
            &ct.c.mul_scalar(self.secret()),
            byte_width,
            solver,
        )
    }
}

/// Inverts hash mode given the mask `s = rY`.
pub fn decrypt_hash_with_mask(data: &[u8], mask: &CurvePoint) -> Vec<u8> {
    Sha512XorCipher::apply(mask, data)
}

/// Inverts point mode given the mask: peels `s` off `D` and recovers the
/// embedded integer by DL search over the declared byte width.
#[instrument(skip_all, fields(byte_width))]
pub fn decrypt_point_with_mask(
    ctx: &CurveContext,
    data: &CompressedPoint,
    mask: &CurvePoint,
    byte_width: u32,
    solver: &SolverConfig,
) -> Result<u128, Error> {
    let d = codec::decompress(data)?;
    let q = d.sub(mask);
    match solver.kind {
        SolverKind::Kangaroo => dlog::kangaroo::solve(ctx, &q, byte_width, solver),
        SolverKind::Bsgs => dlog::bsgs::solve(ctx, &q, byte_width, solver),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;
    use rand_core::RngCore;

    use super::*;
    use crate::{
        config::{SolverConfig, SolverKind},
        scheme::{keys::set_keys, mask::reconstruct_mask},
    };

    fn solver() -> SolverConfig {
        SolverConfig {
            max_episodes: 4096,
            ..SolverConfig::default()
        }
    }

    #[test]
    fn hash_round_trip_hello() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);
        let ct = public.encrypt_hash(&ctx, &mut OsRng, b"hello");
        assert_eq!(bundle.decrypt_hash(&ct), b"hello");
    }

    #[test]
    fn hash_round_trip_512_bytes() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);
        let mut message = vec![0u8; 512];
        OsRng.fill_bytes(&mut message);
        let ct = public.encrypt_hash(&ctx, &mut OsRng, &message);
        assert_ne!(ct.data, message);
        assert_eq!(bundle.decrypt_hash(&ct), message);
    }

    #[test]
    fn hash_decryption_with_reconstructed_mask() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);
        let r = ctx.sample_scalar(&mut OsRng);
        let ct = public.encrypt_hash_with_scalar(&ctx, &r, b"custodian path");

        // Custodians 2 and 3 contribute (r·s_k)·G for this cell.
        let contributions: Vec<(u8, CurvePoint)> = [2u8, 3]
            .into_iter()
            .map(|k| {
                let share = bundle.scalar_share(k).unwrap();
                (k, ctx.scalar_base_mul(&(r * share)))
            })
            .collect();
        let mask = reconstruct_mask(&contributions).unwrap();
        assert_eq!(decrypt_hash_with_mask(&ct.data, &mask), b"custodian path");
    }

    #[test]
    fn point_round_trip_kangaroo() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);
        let ct = public.encrypt_point(&ctx, &mut OsRng, 201, 1).unwrap();
        assert_eq!(bundle.decrypt_point(&ctx, &ct, 1, &solver()).unwrap(), 201);
    }

    #[test]
    fn point_round_trip_bsgs() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);
        let config = SolverConfig {
            kind: SolverKind::Bsgs,
            ..solver()
        };
        let ct = public.encrypt_point(&ctx, &mut OsRng, 50_000, 2).unwrap();
        assert_eq!(
            bundle.decrypt_point(&ctx, &ct, 2, &config).unwrap(),
            50_000
        );
    }

    #[test]
    fn point_encryption_enforces_the_range() {
        let ctx = CurveContext::new();
        let (public, _, _) = set_keys(&ctx, &mut OsRng);
        assert!(matches!(
            public.encrypt_point(&ctx, &mut OsRng, 300, 1),
            Err(Error::PlaintextRange { value: 300, width: 1 })
        ));
    }

    #[test]
    fn ciphertexts_of_equal_messages_differ() {
        let ctx = CurveContext::new();
        let (public, _, _) = set_keys(&ctx, &mut OsRng);
        let a = public.encrypt_hash(&ctx, &mut OsRng, b"same");
        let b = public.encrypt_hash(&ctx, &mut OsRng, b"same");
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn point_mode_is_additively_homomorphic() {
        let ctx = CurveContext::new();
        let (public, bundle, _) = set_keys(&ctx, &mut OsRng);

        // Two cells of the same column with their own row scalars.
        let r1 = ctx.sample_scalar(&mut OsRng);
        let r2 = ctx.sample_scalar(&mut OsRng);
        let ct1 = public.encrypt_point_with_scalar(&ctx, &r1, 21, 1).unwrap();
        let ct2 = public.encrypt_point_with_scalar(&ctx, &r2, 50, 1).unwrap();

        // 3·D1 + 2·D2 should decrypt to 3·21 + 2·50 = 163.
        let three = ctx.scalar_from_i64(3);
        let two = ctx.scalar_from_i64(2);
        let d_sum = codec::decompress(&ct1.data)
            .unwrap()
            .mul_scalar(&three)
            .add(&codec::decompress(&ct2.data).unwrap().mul_scalar(&two));

        // The matching key sum: custodians apply the same coefficients to
        // their per-cell scalars, here collapsed to the full secret.
        let key_sum = ct1
            .c
            .mul_scalar(bundle.secret())
            .mul_scalar(&three)
            .add(&ct2.c.mul_scalar(bundle.secret()).mul_scalar(&two));

        let q = d_sum.sub(&key_sum);
        let recovered = dlog::kangaroo::solve(&ctx, &q, 1, &solver()).unwrap();
        assert_eq!(recovered, 163);
    }
}
