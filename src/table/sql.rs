//! SQL literal and schema rendering (PostgreSQL dialect).
//!
//! Pass-through cells are re-emitted as literals of their natural type;
//! encrypted payloads become `decode('<hex>', 'hex')` byte-array literals.
//! Single quotes inside text are doubled. Implementations writing to a real
//! database should prefer parameterised statements; these renderings exist
//! for sinks that only accept statement fragments.

use crate::{
    config::ColumnMode,
    table::{value::ColumnValue, TableInfo},
};

/// Renders one pass-through value as a SQL literal.
pub fn literal(value: &ColumnValue) -> String {
    match value {
        ColumnValue::Int32(v) => v.to_string(),
        ColumnValue::Int64(v) => v.to_string(),
        ColumnValue::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        ColumnValue::F32(v) => v.to_string(),
        ColumnValue::F64(v) | ColumnValue::Numeric(v) => v.to_string(),
        ColumnValue::Text(s) | ColumnValue::Json(s) => quoted(s),
        ColumnValue::Bytes(b) => bytea_literal(b),
    }
}

/// Renders a byte string as a `decode` literal.
pub fn bytea_literal(bytes: &[u8]) -> String {
    format!("decode('{}', 'hex')", hex::encode(bytes))
}

fn quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Renders the destination column list: pass-through columns keep their
/// source type, encrypted columns become nullable byte arrays.
pub fn schema_string(info: &TableInfo) -> String {
    let mut out = String::new();
    for (j, column) in info.columns.iter().enumerate() {
        if j > 0 {
            out.push_str(", ");
        }
        out.push_str(&column.name);
        out.push(' ');
        if column.mode == ColumnMode::Passthrough {
            out.push_str(&column.ty.sql_name());
        } else {
            out.push_str("BYTEA DEFAULT NULL");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ColumnMode,
        table::{value::ColumnType, ColumnSpec, TableInfo},
    };

    #[test]
    fn literals_by_type() {
        assert_eq!(literal(&ColumnValue::Int64(-42)), "-42");
        assert_eq!(literal(&ColumnValue::Bool(true)), "TRUE");
        assert_eq!(literal(&ColumnValue::F64(2.5)), "2.5");
        assert_eq!(
            literal(&ColumnValue::Bytes(vec![0xde, 0xad])),
            "decode('dead', 'hex')"
        );
    }

    #[test]
    fn quotes_are_doubled() {
        assert_eq!(
            literal(&ColumnValue::Text("O'Brien".into())),
            "'O''Brien'"
        );
    }

    #[test]
    fn schema_keeps_clear_types_and_blobs_encrypted_ones() {
        let info = TableInfo {
            name: "people".into(),
            rows: 0,
            columns: vec![
                ColumnSpec {
                    name: "id".into(),
                    ty: ColumnType::Int32,
                    mode: ColumnMode::Passthrough,
                },
                ColumnSpec {
                    name: "name".into(),
                    ty: ColumnType::Text,
                    mode: ColumnMode::Hash,
                },
            ],
        };
        assert_eq!(
            schema_string(&info),
            "id INTEGER, name BYTEA DEFAULT NULL"
        );
    }
}
