use std::collections::HashMap;

use rand::{rngs::StdRng, SeedableRng};
use tracing::info;
use tracing_subscriber::fmt;

use colcrypt::{
    table::{
        decrypt::{combine_point_cells, decrypt_cell_with_width, decrypt_point_sum},
        source::ColumnDesc,
    },
    CellCoord, ColumnType, ColumnValue, CurveContext, EncryptOptions, MemoryTable, PrimaryKey,
    SolverConfig,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .with_ansi(false)
        .init();

    let ctx = CurveContext::new();
    let mut rng = StdRng::seed_from_u64(42);

    // A small staff table: id in the clear, name hash-encrypted, salary
    // point-encrypted so sums stay computable.
    let mut store = MemoryTable::new();
    store.insert_source_table(
        "staff",
        vec![
            ColumnDesc {
                name: "id".into(),
                ty: ColumnType::Int32,
            },
            ColumnDesc {
                name: "name".into(),
                ty: ColumnType::Text,
            },
            ColumnDesc {
                name: "salary".into(),
                ty: ColumnType::Int64,
            },
        ],
        vec![
            vec![
                ColumnValue::Int32(1),
                ColumnValue::Text("ada".into()),
                ColumnValue::Int64(120),
            ],
            vec![
                ColumnValue::Int32(2),
                ColumnValue::Text("grace".into()),
                ColumnValue::Int64(95),
            ],
        ],
    )?;

    let source = store.clone();
    let keys = colcrypt::encrypt_table(
        &ctx,
        &source,
        &mut store,
        "staff",
        &[0, 1, 2],
        &mut rng,
        &EncryptOptions::default(),
    )?;
    info!(rows = keys.info.rows, "table encrypted");

    // The issuer hands one share set to each custodian and destroys the
    // full bundle; here two custodians answer for a cell.
    let custodian_1 = keys.extract_share(1)?;
    let custodian_2 = keys.extract_share(2)?;

    let cell = CellCoord {
        primary_key: PrimaryKey::Int(2),
        column: "name".into(),
    };
    let contributions = vec![
        (1, custodian_1.cell_contribution(&ctx, &cell)?),
        (2, custodian_2.cell_contribution(&ctx, &cell)?),
    ];

    let written = store
        .written("staff_encrypted")
        .expect("destination table exists");
    let name_payload = strip_bytea(&written.rows[1][1]);
    let solver = SolverConfig {
        max_episodes: 4096,
        ..SolverConfig::default()
    };
    let name = decrypt_cell_with_width(
        &ctx,
        &keys.info,
        "name",
        &name_payload,
        &contributions,
        8,
        &solver,
    )?;
    info!(?name, "hash-mode cell decrypted");

    // Homomorphic payroll: 1·120 + 1·95, decrypted without touching either
    // salary individually.
    let coefficients = HashMap::from([(PrimaryKey::Int(1), 1i64), (PrimaryKey::Int(2), 1i64)]);
    let salary_1 = strip_bytea(&written.rows[0][2]);
    let salary_2 = strip_bytea(&written.rows[1][2]);
    let summed = combine_point_cells(&ctx, &[(&salary_1, 1), (&salary_2, 1)])?;
    let sum_contributions = vec![
        (
            1,
            custodian_1.sum_contribution(&ctx, "salary", &coefficients)?,
        ),
        (
            2,
            custodian_2.sum_contribution(&ctx, "salary", &coefficients)?,
        ),
    ];
    let total = decrypt_point_sum(&ctx, &summed, &sum_contributions, 1, &solver)?;
    info!(total, "homomorphic salary sum decrypted");
    assert_eq!(total, 215);

    Ok(())
}

/// Pulls the raw bytes back out of a `decode('<hex>', 'hex')` fragment.
fn strip_bytea(fragment: &str) -> Vec<u8> {
    let hex = fragment
        .strip_prefix("decode('")
        .and_then(|s| s.strip_suffix("', 'hex')"))
        .expect("bytea literal");
    hex::decode(hex).expect("valid hex")
}
