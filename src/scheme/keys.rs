//! Key material: column key pairs, custodian shares, and table key bundles.
//!
//! Every encrypted column gets an independent key pair `(x, Y = xG)`. The
//! secret is split two ways when the pair is created:
//!
//! - **byte shares**: GF(256) 2-of-3 Shamir over the 28-byte big-endian
//!   form of `x`, for byte-exact cold recovery of the secret itself;
//! - **scalar shares**: a degree-1 sharing `s_i = x + a·i mod N`, which is
//!   what custodians exponentiate when they contribute decryption points.
//!
//! The issuer holds the full [`TableKeys`] only long enough to call
//! [`TableKeys::extract_share`] three times; after that each custodian owns
//! one [`CustodianShareSet`] and the full bundle should be destroyed.

use std::collections::HashMap;

use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

use crate::{
    arith::{
        curve::{CurveContext, CurvePoint, Scalar, FIELD_BYTES},
        shamir::{self, ByteShare},
    },
    config::CurveId,
    errors::Error,
    table::{PrimaryKey, TableInfo},
};

/// Public key for one encrypted column.
#[derive(Clone, Copy, Debug)]
pub struct ColumnPublicKey {
    /// Curve the key lives on; fixes the wire widths.
    pub curve: CurveId,
    /// `Y = xG`.
    pub point: CurvePoint,
}

/// The full private key for one column: the secret scalar and both share
/// layers.
///
/// Byte shares zeroize themselves on drop. The bundle never leaves the
/// issuer; custodians only ever see one scalar share each.
pub struct PrivateKeyBundle {
    x: Scalar,
    byte_shares: [ByteShare<FIELD_BYTES>; 3],
    scalar_shares: [Scalar; 3],
}

impl PrivateKeyBundle {
    pub(crate) fn from_parts(
        x: Scalar,
        byte_shares: [ByteShare<FIELD_BYTES>; 3],
        scalar_shares: [Scalar; 3],
    ) -> Self {
        Self {
            x,
            byte_shares,
            scalar_shares,
        }
    }

    /// The column secret `x`.
    pub(crate) fn secret(&self) -> &Scalar {
        &self.x
    }

    /// The custodian's byte-level share, index ∈ {1, 2, 3}.
    pub fn byte_share(&self, index: u8) -> Result<&ByteShare<FIELD_BYTES>, Error> {
        self.byte_shares
            .get(share_slot(index)?)
            .ok_or(Error::BadShareIndex(index))
    }

    /// The custodian's prime-field share, index ∈ {1, 2, 3}.
    pub fn scalar_share(&self, index: u8) -> Result<Scalar, Error> {
        Ok(self.scalar_shares[share_slot(index)?])
    }

    pub(crate) fn scalar_shares(&self) -> &[Scalar; 3] {
        &self.scalar_shares
    }

    pub(crate) fn byte_shares(&self) -> &[ByteShare<FIELD_BYTES>; 3] {
        &self.byte_shares
    }

    /// Recovers the secret bytes from any two byte shares and checks them
    /// against the curve: the recombined scalar must reproduce `x`.
    pub fn recover_secret_bytes(
        &self,
        ctx: &CurveContext,
        a: u8,
        b: u8,
    ) -> Result<[u8; FIELD_BYTES], Error> {
        let bytes = shamir::combine(self.byte_share(a)?, self.byte_share(b)?)?;
        if ctx.scalar_from_be_bytes(&bytes) != self.x {
            return Err(Error::MalformedInput(
                "recombined byte shares do not reproduce the secret".into(),
            ));
        }
        Ok(bytes)
    }
}

fn share_slot(index: u8) -> Result<usize, Error> {
    if (1..=3).contains(&index) {
        Ok(usize::from(index) - 1)
    } else {
        Err(Error::BadShareIndex(index))
    }
}

/// Generates a key pair: `x` uniform in `[1, N)`, `Y = xG`.
pub fn create_key_pair<R: RngCore + CryptoRng + ?Sized>(
    ctx: &CurveContext,
    rng: &mut R,
) -> (Scalar, CurvePoint) {
    let x = ctx.sample_key_scalar(rng);
    (x, ctx.scalar_base_mul(&x))
}

/// Generates a key pair, splits the secret both ways, and publishes the
/// verifier points `S_i = s_i·G` over the scalar shares.
#[instrument(skip_all)]
pub fn set_keys<R: RngCore + CryptoRng + ?Sized>(
    ctx: &CurveContext,
    rng: &mut R,
) -> (ColumnPublicKey, PrivateKeyBundle, [CurvePoint; 3]) {
    let (x, y) = create_key_pair(ctx, rng);
    let byte_shares = shamir::split(rng, &ctx.scalar_to_be_bytes(&x));

    // Degree-1 sharing over the scalar field; the coefficient draw reuses
    // the ephemeral sampler, so it is never zero.
    let a = ctx.sample_scalar(rng);
    let scalar_shares =
        core::array::from_fn(|slot| x + a * Scalar::from(slot as u64 + 1));
    let verifiers = scalar_shares.map(|share| ctx.scalar_base_mul(&share));

    (
        ColumnPublicKey {
            curve: ctx.curve(),
            point: y,
        },
        PrivateKeyBundle::from_parts(x, byte_shares, scalar_shares),
        verifiers,
    )
}

/// Coordinates of one cell: primary-key value and column name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellCoord {
    pub primary_key: PrimaryKey,
    pub column: String,
}

/// Everything the issuer holds after encrypting a table: the snapshot, the
/// per-row scalars, and the per-column key material.
pub struct TableKeys {
    /// Snapshot of the encrypted table.
    pub info: TableInfo,
    /// Per-row ephemeral scalars, keyed by primary key; shared across all
    /// encrypted columns of a row.
    pub row_scalars: HashMap<PrimaryKey, Scalar>,
    /// Private bundles of the encrypted columns.
    pub columns: HashMap<String, PrivateKeyBundle>,
    /// Public keys of the encrypted columns.
    pub publics: HashMap<String, ColumnPublicKey>,
}

impl TableKeys {
    /// Extracts the key material for one custodian.
    ///
    /// The custodian receives a copy of the row-scalar map and, for every
    /// encrypted column, its prime-field share of the column secret.
    #[instrument(skip(self), fields(table = %self.info.name))]
    pub fn extract_share(&self, index: u8) -> Result<CustodianShareSet, Error> {
        share_slot(index)?;
        let partial_keys = self
            .columns
            .iter()
            .map(|(name, bundle)| Ok((name.clone(), bundle.scalar_share(index)?)))
            .collect::<Result<HashMap<_, _>, Error>>()?;
        Ok(CustodianShareSet {
            custodian: index,
            info: self.info.clone(),
            row_scalars: self.row_scalars.clone(),
            partial_keys,
        })
    }
}

/// One custodian's key material for a table.
pub struct CustodianShareSet {
    /// Shamir index of this custodian, 1..=3.
    pub custodian: u8,
    /// Snapshot of the encrypted table.
    pub info: TableInfo,
    /// Copy of the per-row scalar map.
    pub row_scalars: HashMap<PrimaryKey, Scalar>,
    /// Per-column scalar shares `s_{j,k}`.
    pub partial_keys: HashMap<String, Scalar>,
}

impl CustodianShareSet {
    fn row_scalar(&self, primary_key: &PrimaryKey) -> Result<Scalar, Error> {
        self.row_scalars
            .get(primary_key)
            .copied()
            .ok_or_else(|| Error::MalformedInput(format!("no row scalar for key {primary_key}")))
    }

    fn partial_key(&self, column: &str) -> Result<Scalar, Error> {
        self.partial_keys
            .get(column)
            .copied()
            .ok_or_else(|| Error::MalformedInput(format!("no partial key for column {column}")))
    }

    /// Key contribution for a single cell: `(r_i · s_{j,k}) · G`.
    pub fn cell_contribution(
        &self,
        ctx: &CurveContext,
        cell: &CellCoord,
    ) -> Result<CurvePoint, Error> {
        let r = self.row_scalar(&cell.primary_key)?;
        let share = self.partial_key(&cell.column)?;
        Ok(ctx.scalar_base_mul(&(r * share)))
    }

    /// Key contribution for a linear combination of cells in one column:
    /// `(Σ aᵢ · rᵢ · s_{j,k}) · G`.
    pub fn sum_contribution(
        &self,
        ctx: &CurveContext,
        column: &str,
        coefficients: &HashMap<PrimaryKey, i64>,
    ) -> Result<CurvePoint, Error> {
        let share = self.partial_key(column)?;
        let mut sum = Scalar::from(0u64);
        for (primary_key, coefficient) in coefficients {
            let r = self.row_scalar(primary_key)?;
            sum += r * share * ctx.scalar_from_i64(*coefficient);
        }
        Ok(ctx.scalar_base_mul(&sum))
    }
}
