//! SQL statement generation shared by the database table handles.
//!
//! Arrow columns are reduced to four SQL value kinds (integer, float,
//! boolean, text) and bound as typed parameters, so nulls keep the
//! column's type.

use arrow::array::{Array, ArrayRef, AsArray, RecordBatch};
use arrow::compute::kernels::cast::{cast, cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use sqlx::{Database, Encode, QueryBuilder, Type};

/// Bind parameters allowed in a single statement, kept below both the
/// Postgres (65535) and SQLite (32766) limits.
pub const MAX_BIND_PARAMS: usize = 32_000;

/// The SQL value kind an Arrow column is written as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlKind {
    Integer,
    Float,
    Boolean,
    Text,
}

impl SqlKind {
    pub fn from_arrow(data_type: &DataType) -> Self {
        match data_type {
            DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64 => SqlKind::Integer,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => SqlKind::Float,
            DataType::Boolean => SqlKind::Boolean,
            _ => SqlKind::Text,
        }
    }

    /// Column type used when creating a Postgres table.
    pub fn postgres_type(self) -> &'static str {
        match self {
            SqlKind::Integer => "BIGINT",
            SqlKind::Float => "DOUBLE PRECISION",
            SqlKind::Boolean => "BOOLEAN",
            SqlKind::Text => "TEXT",
        }
    }

    /// Column type used when creating a SQLite table.
    pub fn sqlite_type(self) -> &'static str {
        match self {
            SqlKind::Integer => "INTEGER",
            SqlKind::Float => "REAL",
            SqlKind::Boolean => "BOOLEAN",
            SqlKind::Text => "TEXT",
        }
    }
}

/// One bindable cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(Option<i64>),
    Float(Option<f64>),
    Bool(Option<bool>),
    Text(Option<String>),
}

/// Quote an identifier for Postgres and SQLite.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE IF NOT EXISTS` for the batch's columns.
pub fn create_table_sql(
    table: &str,
    batch: &RecordBatch,
    type_name: fn(SqlKind) -> &'static str,
) -> String {
    let columns: Vec<String> = batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| {
            format!(
                "{} {}",
                quote_ident(f.name()),
                type_name(SqlKind::from_arrow(f.data_type()))
            )
        })
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(table),
        columns.join(", ")
    )
}

/// Convert one Arrow column into bindable cells.
pub fn column_values(array: &ArrayRef) -> anyhow::Result<Vec<SqlValue>> {
    let values = match SqlKind::from_arrow(array.data_type()) {
        // UInt64 values above i64::MAX are an error, not a NULL.
        SqlKind::Integer => cast_with_options(
            array,
            &DataType::Int64,
            &CastOptions {
                safe: false,
                ..Default::default()
            },
        )?
            .as_primitive::<Int64Type>()
            .iter()
            .map(SqlValue::Int)
            .collect(),
        SqlKind::Float => cast(array, &DataType::Float64)?
            .as_primitive::<Float64Type>()
            .iter()
            .map(SqlValue::Float)
            .collect(),
        SqlKind::Boolean => array.as_boolean().iter().map(SqlValue::Bool).collect(),
        SqlKind::Text => cast(array, &DataType::Utf8)?
            .as_string::<i32>()
            .iter()
            .map(|v| SqlValue::Text(v.map(str::to_string)))
            .collect(),
    };
    Ok(values)
}

/// The batch as rows of bindable cells, in column order.
pub fn batch_rows(batch: &RecordBatch) -> anyhow::Result<Vec<Vec<SqlValue>>> {
    let columns = batch
        .columns()
        .iter()
        .map(column_values)
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut rows: Vec<Vec<SqlValue>> = (0..batch.num_rows())
        .map(|_| Vec::with_capacity(columns.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }
    Ok(rows)
}

/// Rows per INSERT statement for a batch of `columns` columns.
pub fn rows_per_statement(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Build a multi-row `INSERT INTO ... VALUES (...), ...` statement.
pub fn insert_builder<'args, DB>(
    table: &str,
    column_names: &[String],
    rows: Vec<Vec<SqlValue>>,
) -> QueryBuilder<'args, DB>
where
    DB: Database,
    <DB as Database>::Arguments<'args>: Default,
    Option<i64>: Encode<'args, DB> + Type<DB>,
    Option<f64>: Encode<'args, DB> + Type<DB>,
    Option<bool>: Encode<'args, DB> + Type<DB>,
    Option<String>: Encode<'args, DB> + Type<DB>,
{
    let columns: Vec<String> = column_names.iter().map(|c| quote_ident(c)).collect();
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) ",
        quote_ident(table),
        columns.join(", ")
    ));
    builder.push_values(rows, |mut tuple, row| {
        for value in row {
            match value {
                SqlValue::Int(v) => {
                    tuple.push_bind(v);
                }
                SqlValue::Float(v) => {
                    tuple.push_bind(v);
                }
                SqlValue::Bool(v) => {
                    tuple.push_bind(v);
                }
                SqlValue::Text(v) => {
                    tuple.push_bind(v);
                }
            }
        }
    });
    builder
}

/// Column names of a batch, in order.
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect()
}
