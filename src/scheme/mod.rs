//! The threshold ElGamal scheme.
//!
//! One key pair per encrypted column, one ephemeral scalar per row, and the
//! decryption capability split 2-of-3 across custodians:
//!
//! 1. **Key generation** ([`set_keys`]): a master pair `(x, Y = xG)`, three
//!    custodian shares of `x`, and three public verifier points.
//! 2. **Encryption** ([`keys::ColumnPublicKey`]): hash mode XOR-masks the
//!    plaintext with a SHA-512 keystream over `rY`; point mode embeds it as
//!    `mG + rY`, preserving additive homomorphism.
//! 3. **Partial decryption** ([`keys::CustodianShareSet`]): each custodian
//!    contributes `(r·s_k)·G` for a cell, or the matching linear
//!    combination for a homomorphic sum.
//! 4. **Reconstruction** ([`mask::reconstruct_mask`]): any two contributions
//!    Lagrange-combine to the mask `r·x·G`, which inverts either mode.

pub mod elgamal;
pub mod keys;
pub mod mask;

pub use elgamal::{
    decrypt_hash_with_mask, decrypt_point_with_mask, HashCiphertext, PointCiphertext,
};
pub use keys::{
    create_key_pair, set_keys, CellCoord, ColumnPublicKey, CustodianShareSet, PrivateKeyBundle,
    TableKeys,
};
pub use mask::reconstruct_mask;
