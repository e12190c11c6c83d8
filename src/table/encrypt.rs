//! The table encryption pipeline.
//!
//! One worker thread per column, fed by bounded channels, drained by a
//! single row-insertion worker:
//!
//! ```text
//! dispatcher ──cells──▶ column worker 0 ──fragments──▶
//! (row-major)──cells──▶ column worker 1 ──fragments──▶ row inserter ──▶ sink
//!            ──cells──▶ column worker 2 ──fragments──▶
//! ```
//!
//! Channels hold at most [`EncryptOptions::channel_capacity`] cells, so the
//! pipeline's memory is O(columns) however large the table is, and the
//! scalar multiplications overlap the source/sink I/O. Within a column,
//! values flow in row order; the inserter takes one fragment from every
//! column before emitting a row, so the destination preserves the source's
//! row order exactly.
//!
//! Every encrypted column of a row reuses the same per-row ephemeral
//! scalar. That is what lets a custodian answer for any cell out of a
//! single `primary key → r` map instead of one map per column.

use std::{
    collections::HashMap,
    sync::mpsc::{sync_channel, Receiver, SyncSender},
    thread,
};

use rand_core::{CryptoRng, RngCore};
use tracing::instrument;

use crate::{
    arith::{
        codec,
        curve::{CurveContext, CurvePoint, Scalar},
    },
    config::{ColumnMode, EncryptOptions},
    errors::Error,
    scheme::keys::{set_keys, TableKeys},
    sym_enc::Sha512XorCipher,
    table::{
        sql,
        source::{TableSink, TableSource},
        value::{ColumnValue, PrimaryKey},
        ColumnSpec, TableInfo,
    },
};

/// Encrypts one table into `<table>_encrypted` and returns the issued keys.
///
/// `commands` is one byte per source column (`0` pass-through, `1` hash,
/// `2` point); a wrong-length vector falls back to the default of
/// [`TableInfo::snapshot`]. The destination is created up front; a
/// pre-existing table of that name is only dropped when
/// [`EncryptOptions::drop_existing`] says so.
#[instrument(skip(ctx, source, sink, commands, rng, options), fields(table))]
pub fn encrypt_table<S, K, R>(
    ctx: &CurveContext,
    source: &S,
    sink: &mut K,
    table: &str,
    commands: &[u8],
    rng: &mut R,
    options: &EncryptOptions,
) -> Result<TableKeys, Error>
where
    S: TableSource + ?Sized,
    K: TableSink + Send,
    R: RngCore + CryptoRng + ?Sized,
{
    options.validate()?;
    let info = TableInfo::snapshot(source, table, commands)?;

    let destination = info.encrypted_name();
    if options.drop_existing {
        sink.drop_table(&destination)?;
    }
    sink.create_table(&destination, &sql::schema_string(&info))?;

    // Per-row ephemeral scalars, drawn in source order and keyed by the
    // primary-key value.
    let mut r_by_row = Vec::with_capacity(info.rows as usize);
    let mut row_scalars = HashMap::with_capacity(info.rows as usize);
    {
        let mut primary = source.select_column(table, &info.primary_column().name)?;
        for _ in 0..info.rows {
            let value = primary.next().ok_or_else(short_cursor)??;
            let key = PrimaryKey::try_from(&value)?;
            let r = ctx.sample_scalar(rng);
            if row_scalars.insert(key.clone(), r).is_some() {
                return Err(Error::MalformedInput(format!(
                    "duplicate primary key {key}"
                )));
            }
            r_by_row.push(r);
        }
    }

    // One key pair per encrypted column.
    let mut columns = HashMap::new();
    let mut publics = HashMap::new();
    for column in &info.columns {
        if column.mode.is_encrypted() {
            let (public, bundle, _verifiers) = set_keys(ctx, rng);
            publics.insert(column.name.clone(), public);
            columns.insert(column.name.clone(), bundle);
        }
    }

    // Source cursors, one per column, all opened before the workers start.
    let mut cursors = Vec::with_capacity(info.columns.len());
    for column in &info.columns {
        cursors.push(source.select_column(table, &column.name)?);
    }

    let rows = info.rows;
    let n_columns = info.columns.len();
    let capacity = options.channel_capacity;
    let mut errors: Vec<Error> = Vec::new();

    thread::scope(|scope| {
        let mut cell_senders: Vec<SyncSender<ColumnValue>> = Vec::with_capacity(n_columns);
        let mut fragment_receivers: Vec<Receiver<String>> = Vec::with_capacity(n_columns);
        let mut workers = Vec::with_capacity(n_columns);

        for column in &info.columns {
            let (cell_tx, cell_rx) = sync_channel::<ColumnValue>(capacity);
            let (fragment_tx, fragment_rx) = sync_channel::<String>(capacity);
            cell_senders.push(cell_tx);
            fragment_receivers.push(fragment_rx);

            let spec = column.clone();
            let public = publics.get(&column.name).map(|p| p.point);
            let scalars = r_by_row.as_slice();
            workers.push(
                scope.spawn(move || column_worker(ctx, spec, rows, cell_rx, fragment_tx, public, scalars)),
            );
        }

        let sink_ref = &mut *sink;
        let destination_name = destination.clone();
        let inserter = scope.spawn(move || -> Result<(), Error> {
            for _ in 0..rows {
                let mut fragments = Vec::with_capacity(n_columns);
                for receiver in &fragment_receivers {
                    fragments.push(
                        receiver
                            .recv()
                            .map_err(|_| channel_closed("column worker"))?,
                    );
                }
                sink_ref.insert_row(&destination_name, &fragments)?;
            }
            Ok(())
        });

        // Dispatcher: read every column's next value, row by row.
        let dispatch_result = (|| -> Result<(), Error> {
            for _ in 0..rows {
                for (cursor, sender) in cursors.iter_mut().zip(&cell_senders) {
                    let value = cursor.next().ok_or_else(short_cursor)??;
                    sender
                        .send(value)
                        .map_err(|_| channel_closed("encryption worker"))?;
                }
            }
            Ok(())
        })();
        drop(cell_senders);

        for worker in workers {
            match worker.join() {
                Ok(Ok(())) => {}
                Ok(Err(error)) => errors.push(error),
                Err(_) => errors.push(Error::Storage("encryption worker panicked".into())),
            }
        }
        match inserter.join() {
            Ok(Ok(())) => {}
            Ok(Err(error)) => errors.push(error),
            Err(_) => errors.push(Error::Storage("row inserter panicked".into())),
        }
        if let Err(error) = dispatch_result {
            errors.push(error);
        }
    });

    if let Some(error) = pick_root_cause(errors) {
        return Err(error);
    }

    Ok(TableKeys {
        info,
        row_scalars,
        columns,
        publics,
    })
}

/// Encrypts several tables of a database, with per-table command vectors.
///
/// Tables missing from `commands` get the default vector (primary key in
/// the clear, everything else hash-encrypted).
pub fn encrypt_database<S, K, R>(
    ctx: &CurveContext,
    source: &S,
    sink: &mut K,
    tables: &[&str],
    commands: &HashMap<String, Vec<u8>>,
    rng: &mut R,
    options: &EncryptOptions,
) -> Result<HashMap<String, TableKeys>, Error>
where
    S: TableSource + ?Sized,
    K: TableSink + Send,
    R: RngCore + CryptoRng + ?Sized,
{
    let mut keys = HashMap::with_capacity(tables.len());
    for table in tables {
        let command = commands.get(*table).map(Vec::as_slice).unwrap_or(&[]);
        keys.insert(
            table.to_string(),
            encrypt_table(ctx, source, sink, table, command, rng, options)?,
        );
    }
    Ok(keys)
}

fn column_worker(
    ctx: &CurveContext,
    spec: ColumnSpec,
    rows: u64,
    cells: Receiver<ColumnValue>,
    fragments: SyncSender<String>,
    public: Option<CurvePoint>,
    row_scalars: &[Scalar],
) -> Result<(), Error> {
    match spec.mode {
        ColumnMode::Passthrough => {
            for _ in 0..rows {
                let value = cells.recv().map_err(|_| channel_closed("dispatcher"))?;
                if !value.matches(&spec.ty) {
                    return Err(Error::TypeMismatch {
                        column: spec.name.clone(),
                        expected: spec.ty.name(),
                        actual: value.type_name(),
                    });
                }
                fragments
                    .send(sql::literal(&value))
                    .map_err(|_| channel_closed("row inserter"))?;
            }
        }
        ColumnMode::Hash => {
            let y = required_key(&spec, public)?;
            for row in 0..rows as usize {
                // The mask depends only on the row scalar; computing it
                // before the cell arrives overlaps the multiplication with
                // the dispatcher's reads.
                let shared = y.mul_scalar(&row_scalars[row]);
                let value = cells.recv().map_err(|_| channel_closed("dispatcher"))?;
                let data = Sha512XorCipher::apply(&shared, &value.to_bytes());
                fragments
                    .send(sql::bytea_literal(&data))
                    .map_err(|_| channel_closed("row inserter"))?;
            }
        }
        ColumnMode::Point => {
            let y = required_key(&spec, public)?;
            let width = spec.ty.dl_byte_width();
            for row in 0..rows as usize {
                let shared = y.mul_scalar(&row_scalars[row]);
                let value = cells.recv().map_err(|_| channel_closed("dispatcher"))?;
                let m = value.to_point_scalar(width)?;
                let d = ctx.scalar_base_mul(&ctx.scalar_from_u128(m)).add(&shared);
                fragments
                    .send(sql::bytea_literal(&codec::compress(&d)))
                    .map_err(|_| channel_closed("row inserter"))?;
            }
        }
    }
    Ok(())
}

fn required_key(spec: &ColumnSpec, public: Option<CurvePoint>) -> Result<CurvePoint, Error> {
    public.ok_or_else(|| {
        Error::InvalidConfig(format!("no key pair for encrypted column {}", spec.name))
    })
}

fn short_cursor() -> Error {
    Error::Storage("source cursor ended before the snapshotted row count".into())
}

const CHANNEL_CLOSED: &str = "pipeline stage stopped: ";

fn channel_closed(stage: &str) -> Error {
    Error::Storage(format!("{CHANNEL_CLOSED}{stage}"))
}

/// A failing stage tears the channels down, so its neighbours all report
/// closed channels; surface the stage that actually failed.
fn pick_root_cause(mut errors: Vec<Error>) -> Option<Error> {
    if errors.is_empty() {
        return None;
    }
    let root = errors
        .iter()
        .position(|error| !matches!(error, Error::Storage(s) if s.starts_with(CHANNEL_CLOSED)))
        .unwrap_or(0);
    Some(errors.swap_remove(root))
}

#[cfg(test)]
mod tests {
    use rand::rngs::OsRng;

    use super::*;
    use crate::table::{
        source::{ColumnDesc, MemoryTable},
        value::ColumnType,
    };

    fn staff_store() -> MemoryTable {
        let mut store = MemoryTable::new();
        store
            .insert_source_table(
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
                    ColumnDesc {
                        name: "active".into(),
                        ty: ColumnType::Bool,
                    },
                ],
                vec![
                    vec![
                        ColumnValue::Int32(1),
                        ColumnValue::Text("ada".into()),
                        ColumnValue::Int64(100),
                        ColumnValue::Bool(true),
                    ],
                    vec![
                        ColumnValue::Int32(2),
                        ColumnValue::Text("grace".into()),
                        ColumnValue::Int64(250),
                        ColumnValue::Bool(false),
                    ],
                    vec![
                        ColumnValue::Int32(3),
                        ColumnValue::Text("edsger".into()),
                        ColumnValue::Int64(75),
                        ColumnValue::Bool(true),
                    ],
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn pipeline_preserves_order_and_passthrough_values() {
        let ctx = CurveContext::new();
        let mut store = staff_store();
        let source = store.clone();
        let keys = encrypt_table(
            &ctx,
            &source,
            &mut store,
            "staff",
            &[0, 1, 2, 0],
            &mut OsRng,
            &EncryptOptions::default(),
        )
        .unwrap();

        let written = store.written("staff_encrypted").unwrap();
        assert_eq!(
            written.schema,
            "id INTEGER, name BYTEA DEFAULT NULL, salary BYTEA DEFAULT NULL, active BOOLEAN"
        );
        assert_eq!(written.rows.len(), 3);
        // Pass-through columns survive byte-for-byte, in source row order.
        let ids: Vec<&str> = written.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        let actives: Vec<&str> = written.rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(actives, vec!["TRUE", "FALSE", "TRUE"]);
        // Encrypted cells are hex blobs, one per row.
        assert!(written.rows.iter().all(|r| r[1].starts_with("decode('")));

        assert_eq!(keys.row_scalars.len(), 3);
        assert_eq!(keys.columns.len(), 2);
        assert!(keys.columns.contains_key("name"));
        assert!(keys.columns.contains_key("salary"));
    }

    #[test]
    fn existing_destination_is_an_error_without_the_toggle() {
        let ctx = CurveContext::new();
        let mut store = staff_store();
        let source = store.clone();
        store.create_table("staff_encrypted", "leftover TEXT").unwrap();

        let result = encrypt_table(
            &ctx,
            &source,
            &mut store,
            "staff",
            &[],
            &mut OsRng,
            &EncryptOptions::default(),
        );
        assert!(matches!(result, Err(Error::Storage(_))));

        // With the destructive toggle the stale table is replaced.
        let options = EncryptOptions {
            drop_existing: true,
            ..EncryptOptions::default()
        };
        encrypt_table(&ctx, &source, &mut store, "staff", &[], &mut OsRng, &options).unwrap();
        assert_eq!(store.written("staff_encrypted").unwrap().rows.len(), 3);
    }

    /// A source whose schema claims `v` is an integer while its cursor
    /// yields text, so the mismatch reaches the pass-through worker.
    struct MisdeclaredSource(MemoryTable);

    impl TableSource for MisdeclaredSource {
        fn columns(&self, table: &str) -> Result<Vec<ColumnDesc>, Error> {
            let mut columns = self.0.columns(table)?;
            columns[1].ty = ColumnType::Int32;
            Ok(columns)
        }

        fn row_count(&self, table: &str) -> Result<u64, Error> {
            self.0.row_count(table)
        }

        fn select_column<'a>(
            &'a self,
            table: &str,
            column: &str,
        ) -> Result<Box<dyn Iterator<Item = Result<ColumnValue, Error>> + Send + 'a>, Error>
        {
            self.0.select_column(table, column)
        }
    }

    #[test]
    fn type_mismatch_stops_the_pipeline() {
        let ctx = CurveContext::new();
        let mut store = MemoryTable::new();
        store
            .insert_source_table(
                "odd",
                vec![
                    ColumnDesc {
                        name: "id".into(),
                        ty: ColumnType::Int32,
                    },
                    ColumnDesc {
                        name: "v".into(),
                        ty: ColumnType::Text,
                    },
                ],
                vec![vec![ColumnValue::Int32(1), ColumnValue::Text("x".into())]],
            )
            .unwrap();
        let source = MisdeclaredSource(store.clone());
        let result = encrypt_table(
            &ctx,
            &source,
            &mut store,
            "odd",
            &[0, 0],
            &mut OsRng,
            &EncryptOptions::default(),
        );
        assert!(matches!(
            result,
            Err(Error::TypeMismatch { expected: "int32", actual: "text", .. })
        ));
    }

    #[test]
    fn point_mode_rejects_text_columns() {
        let ctx = CurveContext::new();
        let mut store = MemoryTable::new();
        store
            .insert_source_table(
                "notes",
                vec![
                    ColumnDesc {
                        name: "id".into(),
                        ty: ColumnType::Int32,
                    },
                    ColumnDesc {
                        name: "body".into(),
                        ty: ColumnType::Text,
                    },
                ],
                vec![vec![ColumnValue::Int32(1), ColumnValue::Text("hi".into())]],
            )
            .unwrap();
        let source = store.clone();
        let result = encrypt_table(
            &ctx,
            &source,
            &mut store,
            "notes",
            &[0, 2],
            &mut OsRng,
            &EncryptOptions::default(),
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn duplicate_primary_keys_rejected() {
        let ctx = CurveContext::new();
        let mut store = MemoryTable::new();
        store
            .insert_source_table(
                "dupes",
                vec![ColumnDesc {
                    name: "id".into(),
                    ty: ColumnType::Int32,
                }],
                vec![vec![ColumnValue::Int32(7)], vec![ColumnValue::Int32(7)]],
            )
            .unwrap();
        let source = store.clone();
        let result = encrypt_table(
            &ctx,
            &source,
            &mut store,
            "dupes",
            &[],
            &mut OsRng,
            &EncryptOptions::default(),
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[test]
    fn encrypt_database_covers_every_table() {
        let ctx = CurveContext::new();
        let mut store = staff_store();
        store
            .insert_source_table(
                "rooms",
                vec![
                    ColumnDesc {
                        name: "id".into(),
                        ty: ColumnType::Int32,
                    },
                    ColumnDesc {
                        name: "label".into(),
                        ty: ColumnType::Text,
                    },
                ],
                vec![vec![ColumnValue::Int32(1), ColumnValue::Text("ops".into())]],
            )
            .unwrap();
        let source = store.clone();
        let commands = HashMap::from([("staff".to_string(), vec![0u8, 1, 2, 0])]);
        let keys = encrypt_database(
            &ctx,
            &source,
            &mut store,
            &["staff", "rooms"],
            &commands,
            &mut OsRng,
            &EncryptOptions::default(),
        )
        .unwrap();
        assert_eq!(keys.len(), 2);
        assert!(store.written("staff_encrypted").is_some());
        assert!(store.written("rooms_encrypted").is_some());
        // The rooms table used the default vector: id clear, label hashed.
        assert_eq!(keys["rooms"].columns.len(), 1);
    }
}
