//! The database seam: table read/write traits and an in-memory store.
//!
//! The pipeline talks to storage only through [`TableSource`] and
//! [`TableSink`]. A production deployment implements them over a real
//! database driver; [`MemoryTable`] implements both sides in memory and
//! backs the tests and the demo.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    table::value::{ColumnType, ColumnValue},
};

/// Name and type of one source column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnDesc {
    pub name: String,
    pub ty: ColumnType,
}

/// Read side of the seam.
pub trait TableSource {
    /// Names and types of a table's columns, in declaration order.
    fn columns(&self, table: &str) -> Result<Vec<ColumnDesc>, Error>;

    /// Number of rows in the table.
    fn row_count(&self, table: &str) -> Result<u64, Error>;

    /// Ordered cursor over one column's values.
    fn select_column<'a>(
        &'a self,
        table: &str,
        column: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<ColumnValue, Error>> + Send + 'a>, Error>;
}

/// Write side of the seam.
///
/// `values` arrive as rendered SQL literal fragments, one per destination
/// column, in column order. Implementations over a real database are free to
/// parameterise instead of interpolating.
pub trait TableSink {
    /// Creates a table from a rendered column list.
    fn create_table(&mut self, name: &str, schema: &str) -> Result<(), Error>;

    /// Drops a table; dropping an absent table is not an error.
    fn drop_table(&mut self, name: &str) -> Result<(), Error>;

    /// Appends one row of literal fragments.
    fn insert_row(&mut self, name: &str, values: &[String]) -> Result<(), Error>;
}

/// A table captured on the write side.
#[derive(Clone, Debug, Default)]
pub struct WrittenTable {
    /// The rendered column list the table was created with.
    pub schema: String,
    /// Inserted rows of literal fragments, in insertion order.
    pub rows: Vec<Vec<String>>,
}

/// In-memory implementation of both sides of the seam.
#[derive(Clone, Debug, Default)]
pub struct MemoryTable {
    sources: HashMap<String, (Vec<ColumnDesc>, Vec<Vec<ColumnValue>>)>,
    written: HashMap<String, WrittenTable>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source table. Every row must have one value per column,
    /// of the declared type.
    pub fn insert_source_table(
        &mut self,
        name: &str,
        columns: Vec<ColumnDesc>,
        rows: Vec<Vec<ColumnValue>>,
    ) -> Result<(), Error> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::Storage(format!(
                    "row {i} has {} values for {} columns",
                    row.len(),
                    columns.len()
                )));
            }
            for (value, column) in row.iter().zip(&columns) {
                if !value.matches(&column.ty) {
                    return Err(Error::TypeMismatch {
                        column: column.name.clone(),
                        expected: column.ty.name(),
                        actual: value.type_name(),
                    });
                }
            }
        }
        self.sources.insert(name.to_string(), (columns, rows));
        Ok(())
    }

    /// The captured write-side table, if one was created.
    pub fn written(&self, name: &str) -> Option<&WrittenTable> {
        self.written.get(name)
    }

    fn source(&self, table: &str) -> Result<&(Vec<ColumnDesc>, Vec<Vec<ColumnValue>>), Error> {
        self.sources
            .get(table)
            .ok_or_else(|| Error::Storage(format!("unknown table {table}")))
    }
}

impl TableSource for MemoryTable {
    fn columns(&self, table: &str) -> Result<Vec<ColumnDesc>, Error> {
        Ok(self.source(table)?.0.clone())
    }

    fn row_count(&self, table: &str) -> Result<u64, Error> {
        Ok(self.source(table)?.1.len() as u64)
    }

    fn select_column<'a>(
        &'a self,
        table: &str,
        column: &str,
    ) -> Result<Box<dyn Iterator<Item = Result<ColumnValue, Error>> + Send + 'a>, Error> {
        let (columns, rows) = self.source(table)?;
        let index = columns
            .iter()
            .position(|c| c.name == column)
            .ok_or_else(|| Error::Storage(format!("unknown column {column} in {table}")))?;
        let values: Vec<ColumnValue> = rows.iter().map(|row| row[index].clone()).collect();
        Ok(Box::new(values.into_iter().map(Ok)))
    }
}

impl TableSink for MemoryTable {
    fn create_table(&mut self, name: &str, schema: &str) -> Result<(), Error> {
        if self.written.contains_key(name) {
            return Err(Error::Storage(format!("table {name} already exists")));
        }
        self.written.insert(
            name.to_string(),
            WrittenTable {
                schema: schema.to_string(),
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    fn drop_table(&mut self, name: &str) -> Result<(), Error> {
        self.written.remove(name);
        Ok(())
    }

    fn insert_row(&mut self, name: &str, values: &[String]) -> Result<(), Error> {
        let table = self
            .written
            .get_mut(name)
            .ok_or_else(|| Error::Storage(format!("insert into missing table {name}")))?;
        table.rows.push(values.to_vec());
        Ok(())
    }
}
