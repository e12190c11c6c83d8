//! Per-cell decryption from custodian contributions.
//!
//! The destination table stores only the ciphertext payload of a cell: the
//! XOR-masked bytes in hash mode, the compressed `D` point in point mode.
//! The ephemeral `C = rG` is never materialised: custodians hold the row
//! scalars themselves and contribute `(r·s_k)·G` directly. Any two
//! contributions reconstruct the mask, which inverts either mode.

use tracing::instrument;

use crate::{
    arith::{
        codec,
        curve::{CurveContext, CurvePoint},
    },
    config::{ColumnMode, SolverConfig, SolverKind},
    dlog,
    errors::Error,
    scheme::mask::reconstruct_mask,
    sym_enc::Sha512XorCipher,
    table::{value::ColumnValue, TableInfo},
};

/// Decrypts one cell payload, deriving the DL search width from the column
/// type (4 bytes for the 32-bit types, 8 otherwise).
pub fn decrypt_cell(
    ctx: &CurveContext,
    info: &TableInfo,
    column: &str,
    payload: &[u8],
    contributions: &[(u8, CurvePoint)],
    solver: &SolverConfig,
) -> Result<ColumnValue, Error> {
    let (_, spec) = info
        .column(column)
        .ok_or_else(|| Error::MalformedInput(format!("unknown column {column}")))?;
    decrypt_cell_with_width(
        ctx,
        info,
        column,
        payload,
        contributions,
        spec.ty.dl_byte_width(),
        solver,
    )
}

/// Decrypts one cell payload with an explicit DL search width.
///
/// Useful when the caller knows the plaintexts are narrower than the
/// column's nominal width and wants the correspondingly cheaper search.
#[instrument(skip_all, fields(column, byte_width))]
pub fn decrypt_cell_with_width(
    ctx: &CurveContext,
    info: &TableInfo,
    column: &str,
    payload: &[u8],
    contributions: &[(u8, CurvePoint)],
    byte_width: u32,
    solver: &SolverConfig,
) -> Result<ColumnValue, Error> {
    let (_, spec) = info
        .column(column)
        .ok_or_else(|| Error::MalformedInput(format!("unknown column {column}")))?;
    let mask = reconstruct_mask(contributions)?;
    match spec.mode {
        ColumnMode::Passthrough => Err(Error::InvalidConfig(format!(
            "column {column} is not encrypted"
        ))),
        ColumnMode::Hash => {
            let bytes = Sha512XorCipher::apply(&mask, payload);
            ColumnValue::from_bytes(&spec.ty, &bytes)
        }
        ColumnMode::Point => {
            let d = codec::decompress(payload)?;
            let q = d.sub(&mask);
            let m = match solver.kind {
                SolverKind::Kangaroo => dlog::kangaroo::solve(ctx, &q, byte_width, solver)?,
                SolverKind::Bsgs => dlog::bsgs::solve(ctx, &q, byte_width, solver)?,
            };
            ColumnValue::from_point_scalar(&spec.ty, m)
        }
    }
}

/// Sums point-mode cell payloads with signed coefficients:
/// `Σ aᵢ · Dᵢ`.
pub fn combine_point_cells(
    ctx: &CurveContext,
    cells: &[(&[u8], i64)],
) -> Result<CurvePoint, Error> {
    let mut sum = ctx.identity();
    for (payload, coefficient) in cells {
        let d = codec::decompress(payload)?;
        sum = sum.add(&d.mul_scalar(&ctx.scalar_from_i64(*coefficient)));
    }
    Ok(sum)
}

/// Decrypts a homomorphic sum: given `Σ aᵢ·Dᵢ` and the custodians' matching
/// sum contributions, recovers `Σ aᵢ·mᵢ`.
///
/// The caller declares the byte width the summed plaintext fits in; sums
/// and partial sums must stay inside that range (and non-negative) for the
/// search to terminate.
#[instrument(skip_all, fields(byte_width))]
pub fn decrypt_point_sum(
    ctx: &CurveContext,
    summed_cells: &CurvePoint,
    contributions: &[(u8, CurvePoint)],
    byte_width: u32,
    solver: &SolverConfig,
) -> Result<u128, Error> {
    let mask = reconstruct_mask(contributions)?;
    let q = summed_cells.sub(&mask);
    match solver.kind {
        SolverKind::Kangaroo => dlog::kangaroo::solve(ctx, &q, byte_width, solver),
        SolverKind::Bsgs => dlog::bsgs::solve(ctx, &q, byte_width, solver),
    }
}
