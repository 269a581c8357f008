//! End-to-end behaviour of sinks created through the factory.

use std::fs::{File, OpenOptions};
use std::io::Read;
use std::sync::Arc;

use arrow::array::{Array, AsArray, Int32Array, Int64Array};
use arrow::datatypes::Float64Type;
use arrow::datatypes::{DataType, Field, Schema};
use itersink_core::{args, create_sink, RecordBatch, SinkError, SinkOutput, Target};

fn table_ab() -> RecordBatch {
    RecordBatch::new_empty(Arc::new(Schema::new(vec![
        Field::new("a", DataType::Int64, true),
        Field::new("b", DataType::Int64, true),
    ])))
}

fn int64_column(table: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    table
        .column_by_name(name)
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .iter()
        .collect()
}

fn finish_table(output: SinkOutput) -> RecordBatch {
    output.into_table().expect("tabular sink returns a table")
}

#[test]
fn test_two_calls_into_table_with_columns_a_b() {
    let mut sink = create_sink(table_ab(), args![]).unwrap();
    sink.call(args![a = 1, b = 2]).unwrap();
    sink.call(args![a = 2, b = 1]).unwrap();

    let table = finish_table(sink.call(args![]).unwrap());
    assert_eq!(table.num_rows(), 2);
    assert_eq!(int64_column(&table, "a"), vec![Some(1), Some(2)]);
    assert_eq!(int64_column(&table, "b"), vec![Some(2), Some(1)]);
}

#[test]
fn test_extra_column_on_every_row() {
    let mut sink = create_sink(table_ab(), args![run = 1]).unwrap();
    for i in 1..=5 {
        sink.call(args![a = i, b = i + 1]).unwrap();
    }

    let table = finish_table(sink.call(args![]).unwrap());
    assert_eq!(table.num_rows(), 5);
    let run = table
        .column_by_name("run")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(run.null_count(), 0);
    assert!(run.values().iter().all(|v| *v == 1));
    assert_eq!(
        int64_column(&table, "b"),
        vec![Some(2), Some(3), Some(4), Some(5), Some(6)]
    );
}

#[test]
fn test_row_count_is_sum_of_recycled_batches() {
    let mut sink = create_sink(Target::Empty, args![]).unwrap();
    sink.call(args![a = vec![1, 2, 3]]).unwrap();
    sink.call(args![b = 1, c = vec![1, 2, 3, 4]]).unwrap();
    sink.call(args![a = 9, c = vec![5, 6]]).unwrap();

    let table = finish_table(sink.finish());
    assert_eq!(table.num_rows(), 3 + 4 + 2);

    let a = table.column_by_name("a").unwrap();
    let b = table.column_by_name("b").unwrap();
    let c = table.column_by_name("c").unwrap();
    // First batch had no b or c.
    assert!((0..3).all(|i| b.is_null(i) && c.is_null(i)));
    // Second batch had no a.
    assert!((3..7).all(|i| a.is_null(i) && !b.is_null(i)));
    // Third batch had no b.
    assert!((7..9).all(|i| b.is_null(i) && !a.is_null(i)));
}

#[test]
fn test_recycling_law() {
    let mut sink = create_sink(Target::Empty, args![]).unwrap();
    let table = finish_table(sink.call(args![x = 1, y = vec![1, 2, 3, 4, 5]]).unwrap());
    assert_eq!(table.num_rows(), 5);

    let err = sink.call(args![x = vec![1, 2], y = vec![1, 2, 3, 4, 5]]).unwrap_err();
    assert!(matches!(err, SinkError::IncompatibleLengths(_)));
    assert_eq!(finish_table(sink.finish()).num_rows(), 5);
}

#[test]
fn test_integer_then_fractional_value_keeps_both() {
    let mut sink = create_sink(Target::Empty, args![]).unwrap();
    sink.call(args![x = 1]).unwrap();
    sink.call(args![x = 1.5]).unwrap();

    let table = finish_table(sink.finish());
    let x: Vec<f64> = table
        .column_by_name("x")
        .unwrap()
        .as_primitive::<Float64Type>()
        .values()
        .to_vec();
    assert_eq!(x, vec![1.0, 1.5]);
}

#[test]
fn test_finish_is_idempotent() {
    let mut sink = create_sink(table_ab(), args![]).unwrap();
    sink.call(args![a = 1, b = 2]).unwrap();

    let first = finish_table(sink.call(args![]).unwrap());
    let second = finish_table(sink.call(args![]).unwrap());
    assert_eq!(first, second);
    assert_eq!(second.num_rows(), 1);
}

#[test]
fn test_deferred_sink_lifecycle() {
    let mut sink = create_sink(Target::Empty, args![]).unwrap();

    let empty = finish_table(sink.call(args![]).unwrap());
    assert_eq!(empty.num_rows(), 0);
    assert_eq!(empty.num_columns(), 0);

    sink.call(args![a = 1, b = 2]).unwrap();
    let table = finish_table(sink.call(args![]).unwrap());
    assert_eq!(table.num_rows(), 1);
    assert_eq!(table.num_columns(), 2);
    let b = table
        .column_by_name("b")
        .unwrap()
        .as_any()
        .downcast_ref::<Int32Array>()
        .unwrap();
    assert_eq!(b.value(0), 2);
}

#[test]
fn test_unnamed_argument_rejected_by_tabular_sink() {
    let mut sink = create_sink(table_ab(), args![]).unwrap();
    let err = sink.call(args![a = 1, 2]).unwrap_err();
    assert!(matches!(err, SinkError::UnnamedArgument { position: 1 }));
}

#[test]
fn test_stream_lines_on_fresh_buffer() {
    let mut out = Vec::new();
    {
        let mut sink = create_sink(Target::stream(&mut out), args![]).unwrap();
        sink.call(args![1, 2, 3]).unwrap();
        sink.call(args![4, 5]).unwrap();
    }
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    assert_eq!(lines, vec!["1 2 3 \n", "4 5 \n"]);
}

#[test]
fn test_stream_appends_to_caller_owned_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.txt");
    std::fs::write(&path, "header \n").unwrap();

    {
        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut sink = create_sink(Target::stream(file), args![]).unwrap();
        for step in 0..3 {
            sink.call(args![step = step, x = 0.5]).unwrap();
        }
    }

    let mut contents = String::new();
    File::open(&path)
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "header \n0 0.5 \n1 0.5 \n2 0.5 \n");
}
