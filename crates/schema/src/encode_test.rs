//! Tests for single-row encoding.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, Decimal128Array, StringArray, TimestampMicrosecondArray};
use arrow::ipc::reader::StreamReader;
use arrow::record_batch::RecordBatch;

use super::*;
use crate::field::{event_table_schema, FieldKind, SchemaField};
use crate::wire::resolve_schema;

fn decode(payload: &[u8]) -> RecordBatch {
    let mut reader = StreamReader::try_new(Cursor::new(payload), None).expect("valid ipc stream");
    reader.next().expect("one batch").expect("decodes")
}

fn event_schema() -> arrow::datatypes::SchemaRef {
    Arc::new(resolve_schema(&event_table_schema()).unwrap())
}

#[test]
fn test_encode_full_event_row() {
    let schema = event_schema();
    let cells = vec![
        CellValue::TimestampMicros(1_700_000_000_000_000),
        CellValue::Str("LLM_ERROR".into()),
        CellValue::Str("root_agent".into()),
        CellValue::Str("session-1".into()),
        CellValue::Str("inv-1".into()),
        CellValue::Str("user-1".into()),
        CellValue::Null,
        CellValue::Str("timeout".into()),
    ];

    let payload = encode_row(&schema, &cells).unwrap();
    let batch = decode(&payload);

    assert_eq!(batch.num_rows(), 1);
    assert_eq!(batch.num_columns(), 8);

    let timestamps = batch
        .column(0)
        .as_any()
        .downcast_ref::<TimestampMicrosecondArray>()
        .unwrap();
    assert_eq!(timestamps.value(0), 1_700_000_000_000_000);

    let event_type = batch
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(event_type.value(0), "LLM_ERROR");

    // content is null, error_message carries the failure
    assert!(batch.column(6).is_null(0));
    let error_message = batch
        .column(7)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(error_message.value(0), "timeout");
}

#[test]
fn test_encode_is_deterministic() {
    let schema = event_schema();
    let cells = vec![
        CellValue::TimestampMicros(42),
        CellValue::Str("SYSTEM".into()),
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
    ];

    let first = encode_row(&schema, &cells).unwrap();
    let second = encode_row(&schema, &cells).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_null_in_required_column_is_rejected() {
    let schema = event_schema();
    let cells = vec![
        CellValue::Null, // timestamp is required
        CellValue::Str("SYSTEM".into()),
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
    ];

    let err = encode_row(&schema, &cells).unwrap_err();
    assert!(matches!(err, EncodeError::NullInRequired(name) if name == "timestamp"));
}

#[test]
fn test_arity_mismatch_is_rejected() {
    let schema = event_schema();
    let err = encode_row(&schema, &[CellValue::Null]).unwrap_err();
    assert!(matches!(err, EncodeError::ArityMismatch { want: 8, got: 1 }));
}

#[test]
fn test_type_mismatch_is_rejected() {
    let schema = event_schema();
    let cells = vec![
        CellValue::Str("not a timestamp".into()),
        CellValue::Str("SYSTEM".into()),
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
        CellValue::Null,
    ];
    let err = encode_row(&schema, &cells).unwrap_err();
    assert!(matches!(err, EncodeError::TypeMismatch { .. }));
}

#[test]
fn test_numeric_round_trip_preserves_exact_value() {
    let fields = vec![SchemaField::new("amount", FieldKind::numeric(38, 9))];
    let schema = Arc::new(resolve_schema(&fields).unwrap());

    // 38-digit precision, scale 9: unscaled value is exact
    let unscaled: i128 = 12_345_678_901_234_567_890_123_456_789;
    let payload = encode_row(&schema, &[CellValue::Numeric(unscaled)]).unwrap();
    let batch = decode(&payload);

    let amounts = batch
        .column(0)
        .as_any()
        .downcast_ref::<Decimal128Array>()
        .unwrap();
    assert_eq!(amounts.precision(), 38);
    assert_eq!(amounts.scale(), 9);
    assert_eq!(amounts.value(0), unscaled);
}

#[test]
fn test_nested_column_is_unsupported() {
    let fields = vec![SchemaField::new(
        "usage",
        FieldKind::Struct(vec![SchemaField::new("total", FieldKind::Int64)]),
    )];
    let schema = Arc::new(resolve_schema(&fields).unwrap());

    let err = encode_row(&schema, &[CellValue::Null]).unwrap_err();
    assert!(matches!(err, EncodeError::Unsupported { .. }));
}
