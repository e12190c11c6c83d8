//! # colcrypt: threshold ElGamal encryption for tabular data
//!
//! colcrypt encrypts the cells of a structured table under per-column
//! ElGamal keys on NIST P-224, splits the decryption capability 2-of-3
//! across custodians, and keeps a chosen set of columns additively
//! homomorphic so that linear combinations of cells can be decrypted
//! without ever decrypting the cells themselves.
//!
//! ## Overview
//!
//! Each encrypted column gets an independent key pair `(x, Y = xG)`; each
//! row gets one ephemeral scalar `r`, shared across the row's encrypted
//! columns. A cell is encrypted in one of two modes:
//!
//! - **Hash mode**: the plaintext bytes are XORed with a SHA-512 keystream
//!   over the shared-secret point `rY`. Opaque, any length.
//! - **Point mode**: the plaintext integer `m` is embedded as
//!   `D = mG + rY`. Sums of `D` points decrypt to sums of plaintexts; `m`
//!   is recovered from the decrypted point by a discrete-log search, so it
//!   must stay small (the per-column byte width bounds it).
//!
//! Decryption never uses `x` directly: custodians holding Shamir shares of
//! `x` each contribute `(r·s_k)·G`, and any two contributions
//! Lagrange-combine to the mask `r·x·G`.
//!
//! ## Architecture
//!
//! - **[`arith`]**: P-224 wrappers ([`CurveContext`], [`CurvePoint`]), the
//!   29-byte point codec, and GF(256) Shamir sharing of secret bytes.
//! - **[`scheme`]**: key generation, the two encryption modes, custodian
//!   share sets, and mask reconstruction.
//! - **[`dlog`]**: the parallel Pollard kangaroo and baby-step giant-step
//!   solvers that map decrypted points back to integers.
//! - **[`table`]**: the bounded-channel pipeline that encrypts a table
//!   column-by-column through the [`table::source::TableSource`] /
//!   [`table::source::TableSink`] seam, and per-cell decryption.
//! - **[`config`]**, **[`errors`]**, **[`persist`]**: options, the error
//!   enum, and JSON persistence of key material.
//!
//! ## Quick example
//!
//! ```rust
//! use colcrypt::{CurveContext, scheme};
//! use rand::rngs::OsRng;
//!
//! let ctx = CurveContext::new();
//!
//! // A column key pair with its custodian shares.
//! let (public, bundle, _verifiers) = scheme::set_keys(&ctx, &mut OsRng);
//!
//! // Hash-mode round trip with the full key.
//! let ciphertext = public.encrypt_hash(&ctx, &mut OsRng, b"hello");
//! assert_eq!(bundle.decrypt_hash(&ciphertext), b"hello");
//!
//! // The same mask, reconstructed from two custodian contributions.
//! let r = ctx.sample_scalar(&mut OsRng);
//! let ct = public.encrypt_hash_with_scalar(&ctx, &r, b"hello");
//! let contribution = |k: u8| {
//!     let share = bundle.scalar_share(k).unwrap();
//!     (k, ctx.scalar_base_mul(&(r * share)))
//! };
//! let mask = scheme::reconstruct_mask(&[contribution(1), contribution(3)]).unwrap();
//! assert_eq!(scheme::decrypt_hash_with_mask(&ct.data, &mask), b"hello");
//! ```
//!
//! ## Security considerations
//!
//! - The scheme is malleable by construction (point mode is *meant* to be
//!   added to); there is no CCA protection and no proof of correct
//!   decryption. A custodian that deviates from the protocol can make
//!   decryption fail or lie in its contribution undetected.
//! - Hash mode reuses its 64-byte keystream for longer plaintexts.
//! - Point-mode plaintexts are bounded by the column byte width at
//!   encryption time; anything wider would be permanently unrecoverable.
//! - The issuer should destroy the full [`scheme::TableKeys`] after
//!   extracting the three custodian share sets.

pub mod arith;
pub mod config;
pub mod dlog;
pub mod errors;
pub mod persist;
pub mod scheme;
pub mod sym_enc;
pub mod table;

pub use arith::{
    compress, decompress, CompressedPoint, CurveContext, CurvePoint, Scalar, COMPRESSED_LEN,
    FIELD_BYTES,
};
pub use config::{ColumnMode, CurveId, EncryptOptions, SolverConfig, SolverKind};
pub use errors::Error;
pub use scheme::{
    create_key_pair, reconstruct_mask, set_keys, CellCoord, ColumnPublicKey, CustodianShareSet,
    HashCiphertext, PointCiphertext, PrivateKeyBundle, TableKeys,
};
pub use table::{
    decrypt_cell, encrypt_database, encrypt_table, ColumnType, ColumnValue, MemoryTable,
    PrimaryKey, TableInfo,
};
