#![allow(non_snake_case)]

use super::*;
use crate::codec::Marshal;

// check_count

#[test]
fn check_count___declared_below_length___returns_declared() {
    assert_eq!(check_count("values", 2i32, 5).unwrap(), 2);
}

#[test]
fn check_count___declared_equal_length___returns_declared() {
    assert_eq!(check_count("values", 3u8, 3).unwrap(), 3);
}

#[test]
fn check_count___declared_above_length___fails() {
    let result = check_count("values", 5i32, 3);

    assert!(matches!(
        result,
        Err(CodecError::DeclaredCountExceedsLength {
            ref field,
            declared: 5,
            available: 3,
        }) if field == "values"
    ));
}

#[test]
fn check_count___negative___is_invalid() {
    let result = check_count("values", -1i16, 3);

    assert!(matches!(
        result,
        Err(CodecError::InvalidCount { ref field, value: -1 }) if field == "values"
    ));
}

// declared_len

#[test]
fn declared_len___negative___is_zero() {
    assert_eq!(declared_len(-4i64), 0);
    assert_eq!(declared_len(4u64), 4);
}

// decode_fixed

#[test]
fn decode_fixed___reads_exactly_n_elements() {
    let data = [0u8, 1, 0, 2, 0, 3, 0, 4];
    let mut reader = data.as_slice();

    let items: [i16; 3] = decode_fixed(&mut reader, |r| i16::decode(r)).unwrap();

    assert_eq!(items, [1, 2, 3]);
    assert_eq!(reader, &[0, 4]);
}

#[test]
fn decode_fixed___short_input___fails() {
    let data = [0u8, 1, 0];

    let result: Result<[i16; 2], _> = decode_fixed(&mut data.as_slice(), |r| i16::decode(r));

    assert!(matches!(result, Err(CodecError::Io(_))));
}

#[test]
fn decode_fixed___nested___builds_array_of_arrays() {
    let data: Vec<u8> = (1..=4).collect();

    let items: [[u8; 2]; 2] =
        decode_fixed(&mut data.as_slice(), |r| decode_fixed(r, |r| u8::decode(r))).unwrap();

    assert_eq!(items, [[1, 2], [3, 4]]);
}

// decode_variable

#[test]
fn decode_variable___reads_declared_count() {
    let data = [9u8, 8, 7, 6];
    let mut reader = data.as_slice();

    let items = decode_variable("bytes", 3i32, &mut reader, |r| u8::decode(r)).unwrap();

    assert_eq!(items, vec![9, 8, 7]);
    assert_eq!(reader, &[6]);
}

#[test]
fn decode_variable___zero_count___reads_nothing() {
    let items = decode_variable("bytes", 0u32, &mut [1u8].as_slice(), |r| u8::decode(r)).unwrap();

    assert!(items.is_empty());
}

#[test]
fn decode_variable___negative_count___fails() {
    let result = decode_variable("bytes", -3i32, &mut [1u8].as_slice(), |r| u8::decode(r));

    assert!(matches!(result, Err(CodecError::InvalidCount { value: -3, .. })));
}

#[test]
fn decode_variable___count_larger_than_input___fails_with_eof() {
    let result = decode_variable("bytes", i32::MAX, &mut [1u8, 2].as_slice(), |r| u8::decode(r));

    assert!(matches!(result, Err(CodecError::Io(_))));
}
