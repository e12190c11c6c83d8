//! Arithmetic layer: curve operations, point codec, and secret sharing.
//!
//! This module wraps the NIST P-224 implementation from the RustCrypto
//! `p224` crate behind a small local vocabulary and adds the two encodings
//! the rest of the crate builds on:
//!
//! - **[`curve`]**: [`CurveContext`] and [`CurvePoint`]: scalar sampling,
//!   base multiplication, and fixed-width coordinate access. All curve
//!   constants are reached through the context value; there is no
//!   process-wide mutable state.
//! - **[`codec`]**: the 29-byte compressed point form `[parity ‖ x]` and its
//!   inverse, which recovers the ordinate from the curve equation.
//! - **[`shamir`]**: byte-parallel 2-of-3 Shamir sharing over GF(256), used
//!   to split the 28-byte secret scalar between custodians.

pub mod codec;
pub mod curve;
mod gf256;
pub mod shamir;

pub use codec::{compress, decompress, CompressedPoint};
pub use curve::{CurveContext, CurvePoint, Scalar, COMPRESSED_LEN, FIELD_BYTES};
pub use shamir::ByteShare;
