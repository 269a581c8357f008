//! Batch construction and column-union append.
//!
//! A batch is the `RecordBatch` built from one data-call: every value is
//! recycled to the common row count and the extra columns are broadcast
//! alongside. Appending a batch to an accumulated table unions the two
//! column sets, fills the side lacking a column with nulls, then
//! concatenates rows.

use std::sync::Arc;

use arrow::array::{new_null_array, Array, ArrayRef, RecordBatch, RecordBatchOptions, UInt32Array};
use arrow::compute::kernels::cast::{can_cast_types, cast_with_options, CastOptions};
use arrow::compute::{concat_batches, take};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use tracing::debug;

use crate::error::{Result, SinkError};
use crate::validate::{self, ExtraColumns};
use crate::value::Args;

/// Validate a data-call and build its batch.
pub fn build_batch(args: Args, extra: &ExtraColumns) -> Result<RecordBatch> {
    let (values, rows) = validate::batch_values(args, extra)?;

    let mut fields = Vec::with_capacity(values.len() + extra.len());
    let mut columns = Vec::with_capacity(values.len() + extra.len());
    for (name, value) in values {
        fields.push(Field::new(name, value.data_type().clone(), true));
        columns.push(recycle(&value, rows)?);
    }
    for (name, value) in extra.iter() {
        fields.push(Field::new(name, value.data_type().clone(), true));
        columns.push(recycle(value, rows)?);
    }

    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    let batch =
        RecordBatch::try_new_with_options(Arc::new(Schema::new(fields)), columns, &options)?;
    Ok(batch)
}

/// Repeat `value` cyclically until it holds `rows` elements.
///
/// Callers guarantee `rows` is a multiple of the value's length.
pub fn recycle(value: &ArrayRef, rows: usize) -> Result<ArrayRef> {
    if value.len() == rows {
        return Ok(Arc::clone(value));
    }
    let len = value.len();
    let indices = UInt32Array::from_iter_values((0..rows).map(|i| (i % len) as u32));
    Ok(take(value.as_ref(), &indices, None)?)
}

/// A table with no columns and no rows.
pub fn empty_table() -> RecordBatch {
    RecordBatch::new_empty(Arc::new(Schema::empty()))
}

/// Append `batch` below `acc` over the union of their columns.
///
/// Columns keep the accumulated order, followed by columns the batch
/// introduces in batch order. Rows lacking a column hold null for it.
pub fn append(acc: &RecordBatch, batch: &RecordBatch) -> Result<RecordBatch> {
    let acc_schema = acc.schema();
    let batch_schema = batch.schema();

    let mut fields: Vec<Field> = Vec::with_capacity(acc_schema.fields().len());
    for field in acc_schema.fields() {
        let data_type = match batch_schema.field_with_name(field.name()) {
            Ok(incoming) => unified_type(field.name(), field.data_type(), incoming.data_type())?,
            Err(_) => field.data_type().clone(),
        };
        fields.push(Field::new(field.name(), data_type, true));
    }
    for field in batch_schema.fields() {
        if acc_schema.field_with_name(field.name()).is_err() {
            fields.push(Field::new(field.name(), field.data_type().clone(), true));
        }
    }
    let schema: SchemaRef = Arc::new(Schema::new(fields));

    let top = conform(acc, &schema)?;
    let bottom = conform(batch, &schema)?;
    let combined = concat_batches(&schema, [&top, &bottom])?;

    debug!(
        "Appended batch of {} rows x {} columns ({} rows total)",
        batch.num_rows(),
        batch.num_columns(),
        combined.num_rows()
    );
    Ok(combined)
}

/// Project `batch` onto `schema`, filling missing columns with nulls and
/// casting present ones to the target type.
fn conform(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            None => Ok(new_null_array(field.data_type(), rows)),
            Some(column) if column.data_type() == field.data_type() => Ok(Arc::clone(column)),
            Some(column) => strict_cast(field.name(), column, field.data_type()),
        })
        .collect::<Result<Vec<_>>>()?;

    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(
        Arc::clone(schema),
        columns,
        &options,
    )?)
}

/// The type a column takes when both sides carry it.
///
/// An all-null side adopts the other side's type. Numeric and boolean
/// columns are promoted to a type that holds both sides, and both sides are
/// cast up to it. Any other pair keeps the accumulated type and the batch
/// must cast to it.
fn unified_type(column: &str, existing: &DataType, incoming: &DataType) -> Result<DataType> {
    match (existing, incoming) {
        (a, b) if a == b => Ok(a.clone()),
        (DataType::Null, other) => Ok(other.clone()),
        (existing, DataType::Null) => Ok(existing.clone()),
        (existing, incoming) => {
            if let Some(promoted) = promote_numeric(existing, incoming) {
                return Ok(promoted);
            }
            if can_cast_types(incoming, existing) {
                return Ok(existing.clone());
            }
            Err(SinkError::ColumnTypeConflict {
                column: column.to_string(),
                existing: existing.clone(),
                incoming: incoming.clone(),
            })
        }
    }
}

/// The narrowest type holding two differing numeric or boolean types, or
/// `None` if either side is neither.
///
/// Booleans give way to any number, floats win over integers, and integers
/// widen. Mixing `UInt64` with a signed type goes to `Float64`.
fn promote_numeric(a: &DataType, b: &DataType) -> Option<DataType> {
    let numeric = |t: &DataType| integer_width(t) > 0 || is_float(t) || *t == DataType::Boolean;
    if !numeric(a) || !numeric(b) {
        return None;
    }

    let promoted = match (a, b) {
        (DataType::Boolean, other) | (other, DataType::Boolean) => other.clone(),
        (a, b) if is_float(a) && is_float(b) => {
            if *a == DataType::Float64 || *b == DataType::Float64 {
                DataType::Float64
            } else {
                DataType::Float32
            }
        }
        (a, b) if is_float(a) || is_float(b) => DataType::Float64,
        (a, b) if is_signed(a) == is_signed(b) => {
            let width = integer_width(a).max(integer_width(b));
            if is_signed(a) {
                signed_of_width(width)
            } else {
                unsigned_of_width(width)
            }
        }
        (a, b) => {
            let (signed, unsigned) = if is_signed(a) { (a, b) } else { (b, a) };
            let (s, u) = (integer_width(signed), integer_width(unsigned));
            if s > u {
                signed.clone()
            } else if u < 8 {
                signed_of_width(u * 2)
            } else {
                DataType::Float64
            }
        }
    };
    Some(promoted)
}

fn is_float(t: &DataType) -> bool {
    matches!(t, DataType::Float16 | DataType::Float32 | DataType::Float64)
}

fn is_signed(t: &DataType) -> bool {
    matches!(
        t,
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
    )
}

/// Byte width of an integer type (0 for anything else).
fn integer_width(t: &DataType) -> usize {
    match t {
        DataType::Int8 | DataType::UInt8 => 1,
        DataType::Int16 | DataType::UInt16 => 2,
        DataType::Int32 | DataType::UInt32 => 4,
        DataType::Int64 | DataType::UInt64 => 8,
        _ => 0,
    }
}

fn signed_of_width(width: usize) -> DataType {
    match width {
        1 => DataType::Int8,
        2 => DataType::Int16,
        4 => DataType::Int32,
        _ => DataType::Int64,
    }
}

fn unsigned_of_width(width: usize) -> DataType {
    match width {
        1 => DataType::UInt8,
        2 => DataType::UInt16,
        4 => DataType::UInt32,
        _ => DataType::UInt64,
    }
}

fn strict_cast(column: &str, array: &ArrayRef, to: &DataType) -> Result<ArrayRef> {
    let options = CastOptions {
        safe: false,
        ..Default::default()
    };
    cast_with_options(array, to, &options).map_err(|_| SinkError::ColumnTypeConflict {
        column: column.to_string(),
        existing: to.clone(),
        incoming: array.data_type().clone(),
    })
}
