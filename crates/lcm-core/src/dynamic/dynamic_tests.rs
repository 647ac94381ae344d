#![allow(non_snake_case)]

use super::*;
use crate::model::{Member, StructDef};

fn ty(name: &str) -> TypeName {
    TypeName::parse(name).unwrap()
}

fn schema() -> Schema {
    let reading = StructDef::new(
        ty("robot.reading_t"),
        vec![
            Member::new("count", ty("int32_t"), vec![]),
            Member::new("values", ty("double"), vec![Dimension::variable("count")]),
        ],
    );
    let point = StructDef::new(
        ty("geo.point_t"),
        vec![
            Member::new("x", ty("double"), vec![]),
            Member::new("y", ty("double"), vec![]),
        ],
    );
    let log = StructDef::new(
        ty("robot.log_t"),
        vec![
            Member::new("n", ty("int16_t"), vec![]),
            Member::new("ok", ty("boolean"), vec![]),
            Member::new(
                "triples",
                ty("int32_t"),
                vec![Dimension::variable("n"), Dimension::constant(3)],
            ),
            Member::new(
                "lines",
                ty("string"),
                vec![Dimension::constant(2), Dimension::variable("n")],
            ),
            Member::new("path", ty("geo.point_t"), vec![Dimension::variable("n")]),
        ],
    );
    Schema::new(vec![reading, point, log]).unwrap()
}

fn reading(count: i32, values: &[f64]) -> StructValue {
    StructValue::new().with("count", Value::Int32(count)).with(
        "values",
        Value::Array(values.iter().copied().map(Value::Double).collect()),
    )
}

fn point(x: f64, y: f64) -> Value {
    StructValue::new()
        .with("x", Value::Double(x))
        .with("y", Value::Double(y))
        .into()
}

fn strings(items: &[&str]) -> Value {
    Value::Array(items.iter().map(|s| Value::String(s.to_string())).collect())
}

fn log() -> StructValue {
    StructValue::new()
        .with("n", Value::Int16(2))
        .with("ok", Value::Bool(true))
        .with(
            "triples",
            Value::Array(vec![
                Value::Array(vec![Value::Int32(1), Value::Int32(2), Value::Int32(3)]),
                Value::Array(vec![Value::Int32(-4), Value::Int32(5), Value::Int32(6)]),
            ]),
        )
        .with(
            "lines",
            Value::Array(vec![strings(&["a", "longer line"]), strings(&["", "z"])]),
        )
        .with("path", Value::Array(vec![point(1.0, 2.0), point(3.5, -1.0)]))
}

fn encode(codec: &DynamicCodec<'_>, name: &str, value: &StructValue) -> Result<Vec<u8>, DynamicError> {
    let mut buffer = Vec::new();
    codec.encode(&ty(name), value, &mut buffer)?;
    Ok(buffer)
}

// Scenario tests

#[test]
fn DynamicCodec___reading___roundtrips() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let value = reading(3, &[1.0, 2.0, 3.0]);

    let bytes = encode(&codec, "robot.reading_t", &value).unwrap();
    let decoded = codec.decode(&ty("robot.reading_t"), &mut bytes.as_slice()).unwrap();

    assert_eq!(decoded, value);
    assert_eq!(bytes.len(), 4 + 3 * 8);
}

#[test]
fn DynamicCodec___reading_wire_bytes___are_big_endian() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();

    let bytes = encode(&codec, "robot.reading_t", &reading(1, &[1.0])).unwrap();

    assert_eq!(bytes, [0, 0, 0, 1, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
}

#[test]
fn DynamicCodec___declared_count_above_length___fails_to_encode() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();

    let result = encode(&codec, "robot.reading_t", &reading(5, &[1.0, 2.0, 3.0]));

    assert!(matches!(
        result,
        Err(DynamicError::Codec(CodecError::DeclaredCountExceedsLength {
            declared: 5,
            available: 3,
            ..
        }))
    ));
}

#[test]
fn DynamicCodec___declared_count_below_length___encodes_prefix() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let value = reading(2, &[1.0, 2.0, 3.0]);

    let bytes = encode(&codec, "robot.reading_t", &value).unwrap();
    let decoded = codec.decode(&ty("robot.reading_t"), &mut bytes.as_slice()).unwrap();

    assert_eq!(decoded, reading(2, &[1.0, 2.0]));
    assert_eq!(codec.size(&ty("robot.reading_t"), &value).unwrap(), bytes.len());
}

#[test]
fn DynamicCodec___nested_shapes___roundtrip_with_exact_size() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let value = log();

    let bytes = encode(&codec, "robot.log_t", &value).unwrap();
    let decoded = codec.decode(&ty("robot.log_t"), &mut bytes.as_slice()).unwrap();

    assert_eq!(decoded, value);
    assert_eq!(codec.size(&ty("robot.log_t"), &value).unwrap(), bytes.len());
}

#[test]
fn DynamicCodec___decode___keeps_wire_field_order() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let bytes = encode(&codec, "robot.log_t", &log()).unwrap();

    let decoded = codec.decode(&ty("robot.log_t"), &mut bytes.as_slice()).unwrap();

    let names: Vec<&str> = decoded.fields().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["n", "ok", "triples", "lines", "path"]);
}

// Error tests

#[test]
fn DynamicCodec___wrong_fixed_length___fails() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let mut value = log();
    value.set(
        "lines",
        Value::Array(vec![strings(&["a", "b"]), strings(&["c", "d"]), strings(&["e", "f"])]),
    );

    let result = encode(&codec, "robot.log_t", &value);

    assert!(matches!(
        result,
        Err(DynamicError::Codec(CodecError::ArrayLength { expected: 2, actual: 3 }))
    ));
}

#[test]
fn DynamicCodec___missing_field___fails() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let value = StructValue::new().with("count", Value::Int32(0));

    let result = encode(&codec, "robot.reading_t", &value);

    assert!(matches!(result, Err(DynamicError::MissingField { ref field, .. }) if field == "values"));
}

#[test]
fn DynamicCodec___wrong_leaf_type___fails() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let value = StructValue::new()
        .with("count", Value::Int32(1))
        .with("values", Value::Array(vec![Value::Float(1.0)]));

    let result = encode(&codec, "robot.reading_t", &value);

    assert!(matches!(result, Err(DynamicError::TypeMismatch { ref expected, .. }) if expected == "double"));
}

#[test]
fn DynamicCodec___truncated_input___fails_without_partial_value() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let bytes = encode(&codec, "robot.reading_t", &reading(3, &[1.0, 2.0, 3.0])).unwrap();

    let result = codec.decode(&ty("robot.reading_t"), &mut &bytes[..bytes.len() - 1]);

    assert!(matches!(result, Err(DynamicError::Codec(CodecError::Io(_)))));
}

#[test]
fn DynamicCodec___negative_count_on_wire___fails() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let bytes = (-1i32).to_be_bytes();

    let result = codec.decode(&ty("robot.reading_t"), &mut bytes.as_slice());

    assert!(matches!(
        result,
        Err(DynamicError::Codec(CodecError::InvalidCount { value: -1, .. }))
    ));
}

#[test]
fn DynamicCodec___unknown_struct___fails() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();

    let result = encode(&codec, "robot.unknown_t", &StructValue::new());

    assert!(matches!(result, Err(DynamicError::Model(ModelError::UnknownStruct(_)))));
}

// Envelope tests

#[test]
fn DynamicCodec___message___starts_with_fingerprint() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let name = ty("robot.reading_t");

    let bytes = codec.encode_message(&name, &reading(1, &[4.0])).unwrap();

    let fingerprint = codec.fingerprint(&name).unwrap();
    assert_eq!(bytes[..8], fingerprint.to_be_bytes());
    assert_eq!(codec.decode_message(&name, &bytes).unwrap(), reading(1, &[4.0]));
}

#[test]
fn DynamicCodec___message_for_other_type___is_rejected() {
    let schema = schema();
    let codec = DynamicCodec::new(&schema).unwrap();
    let bytes = codec
        .encode_message(&ty("robot.reading_t"), &reading(0, &[]))
        .unwrap();

    let result = codec.decode_message(&ty("geo.point_t"), &bytes);

    assert!(matches!(
        result,
        Err(DynamicError::Codec(CodecError::FingerprintMismatch { .. }))
    ));
}

// StructValue tests

/// node_t { int16_t n; node_t children[n]; }
fn tree_schema() -> Schema {
    Schema::new(vec![StructDef::new(
        ty("tree.node_t"),
        vec![
            Member::new("n", ty("int16_t"), vec![]),
            Member::new("children", ty("tree.node_t"), vec![Dimension::variable("n")]),
        ],
    )])
    .unwrap()
}

/// Body of a chain of `levels` nodes, each holding one child except the last
fn chain(levels: usize) -> Vec<u8> {
    let mut bytes = [0u8, 1].repeat(levels - 1);
    bytes.extend_from_slice(&[0, 0]);
    bytes
}

#[test]
fn DynamicCodec___nesting_at_limit___decodes() {
    let schema = tree_schema();
    let codec = DynamicCodec::new(&schema).unwrap().with_max_depth(8);

    let value = codec.decode(&ty("tree.node_t"), &mut chain(8).as_slice()).unwrap();

    assert_eq!(value.get("n"), Some(&Value::Int16(1)));
}

#[test]
fn DynamicCodec___nesting_beyond_limit___fails() {
    let schema = tree_schema();
    let codec = DynamicCodec::new(&schema).unwrap().with_max_depth(8);

    let result = codec.decode(&ty("tree.node_t"), &mut chain(9).as_slice());

    assert!(matches!(
        result,
        Err(DynamicError::NestingTooDeep { ref struct_name, limit: 8 }) if struct_name == "tree.node_t"
    ));
}

#[test]
fn DynamicCodec___deeply_nested_input___stops_at_default_limit() {
    let schema = tree_schema();
    let codec = DynamicCodec::new(&schema).unwrap();

    let result = codec.decode(&ty("tree.node_t"), &mut chain(100_000).as_slice());

    assert!(matches!(
        result,
        Err(DynamicError::NestingTooDeep { limit: MAX_DECODE_DEPTH, .. })
    ));
}

#[test]
fn StructValue___set_existing___replaces_in_place() {
    let mut value = StructValue::new()
        .with("a", Value::Int8(1))
        .with("b", Value::Int8(2));

    value.set("a", Value::Int8(9));

    assert_eq!(value.len(), 2);
    assert_eq!(value.get("a"), Some(&Value::Int8(9)));
    assert_eq!(value.fields().next().map(|(n, _)| n), Some("a"));
}

#[test]
fn Value___as_integer___only_for_integers() {
    assert_eq!(Value::UInt64(7).as_integer(), Some(7));
    assert_eq!(Value::Int8(-2).as_integer(), Some(-2));
    assert_eq!(Value::Double(1.0).as_integer(), None);
    assert_eq!(Value::Bool(true).as_integer(), None);
}
