//! Table layer: schema snapshotting and the encryption pipeline.
//!
//! This module connects the threshold scheme to tabular storage:
//!
//! - **[`value`]**: [`ColumnType`]/[`ColumnValue`]/[`PrimaryKey`], the
//!   tagged type system decided once at schema-read time.
//! - **[`source`]**: the [`TableSource`]/[`TableSink`] seam and the
//!   in-memory [`MemoryTable`].
//! - **[`sql`]**: literal and schema rendering for the destination table.
//! - **[`encrypt`]**: the bounded-channel pipeline producing
//!   `<table>_encrypted` plus the issued [`TableKeys`](crate::scheme::TableKeys).
//! - **[`decrypt`]**: per-cell decryption from custodian contributions.
//!
//! [`TableInfo`] is the immutable snapshot of a table taken when encryption
//! starts; every later stage reads it, none mutates it.

pub mod decrypt;
pub mod encrypt;
pub mod source;
pub mod sql;
pub mod value;

use serde::{Deserialize, Serialize};

use crate::{config::ColumnMode, errors::Error};
pub use crate::table::{
    decrypt::{combine_point_cells, decrypt_cell, decrypt_point_sum},
    encrypt::{encrypt_database, encrypt_table},
    source::{ColumnDesc, MemoryTable, TableSink, TableSource, WrittenTable},
    value::{ColumnType, ColumnValue, PrimaryKey},
};

/// Index of the primary-key column.
pub const PRIMARY_COLUMN: usize = 0;

/// One column of a snapshotted table: name, type tag, encryption mode.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub ty: ColumnType,
    pub mode: ColumnMode,
}

/// Immutable snapshot of a table taken at the start of encryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TableInfo {
    /// Source table name.
    pub name: String,
    /// Row count at snapshot time.
    pub rows: u64,
    /// Columns in declaration order; index [`PRIMARY_COLUMN`] is the
    /// primary key and is always pass-through.
    pub columns: Vec<ColumnSpec>,
}

impl TableInfo {
    /// Snapshots a source table and resolves the per-column command vector.
    ///
    /// A command vector whose length does not match the column count is
    /// replaced by the default: primary key in the clear, everything else
    /// hash-encrypted. Encrypting the primary key is rejected; custodians
    /// key their per-row scalars by it.
    pub fn snapshot<S: TableSource + ?Sized>(
        source: &S,
        table: &str,
        commands: &[u8],
    ) -> Result<Self, Error> {
        let columns = source.columns(table)?;
        if columns.is_empty() {
            return Err(Error::InvalidConfig(format!(
                "table {table} has no columns"
            )));
        }
        let rows = source.row_count(table)?;

        let modes: Vec<ColumnMode> = if commands.len() == columns.len() {
            commands.iter().map(|b| ColumnMode::from_command(*b)).collect()
        } else {
            (0..columns.len())
                .map(|j| {
                    if j == PRIMARY_COLUMN {
                        ColumnMode::Passthrough
                    } else {
                        ColumnMode::Hash
                    }
                })
                .collect()
        };
        if modes[PRIMARY_COLUMN] != ColumnMode::Passthrough {
            return Err(Error::InvalidConfig(
                "the primary-key column must stay in the clear".into(),
            ));
        }

        Ok(Self {
            name: table.to_string(),
            rows,
            columns: columns
                .into_iter()
                .zip(modes)
                .map(|(desc, mode)| ColumnSpec {
                    name: desc.name,
                    ty: desc.ty,
                    mode,
                })
                .collect(),
        })
    }

    /// Finds a column by name.
    pub fn column(&self, name: &str) -> Option<(usize, &ColumnSpec)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, c)| c.name == name)
    }

    /// The primary-key column.
    pub fn primary_column(&self) -> &ColumnSpec {
        &self.columns[PRIMARY_COLUMN]
    }

    /// Name of the destination table.
    pub fn encrypted_name(&self) -> String {
        format!("{}_encrypted", self.name)
    }
}
