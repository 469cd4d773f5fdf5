use pretty_assertions::assert_eq;
use worldedit_codec::{decode, encode, encode_vector3, FieldType, FieldValue};

// ── Fixed layouts ────────────────────────────────────────────────

#[test]
fn int32_is_four_bytes_little_endian() {
    assert_eq!(encode(&FieldValue::Int32(0x0102_0304)), "04030201");
}

#[test]
fn hash32_shares_int32_layout() {
    assert_eq!(
        encode(&FieldValue::Hash32(0xDEAD_BEEF)),
        encode(&FieldValue::Int32(0xDEAD_BEEF))
    );
}

#[test]
fn id64_is_eight_bytes_little_endian() {
    assert_eq!(encode(&FieldValue::Id64(200)), "C800000000000000");
    assert_eq!(decode(FieldType::Id64, "C800000000000000"), FieldValue::Id64(200));
}

#[test]
fn vector3_is_twelve_bytes() {
    let hex = encode(&FieldValue::Vector3([1.0, 2.0, 3.0]));
    assert_eq!(hex.len(), 24);
    assert_eq!(hex, "0000803F0000004000004040");
}

#[test]
fn vector3_padding_matches_explicit_zero() {
    assert_eq!(encode_vector3(&[1.0, 2.0]), encode_vector3(&[1.0, 2.0, 0.0]));
}

#[test]
fn vector3_truncates_extra_components() {
    assert_eq!(encode_vector3(&[1.0, 2.0, 3.0, 9.0]), encode_vector3(&[1.0, 2.0, 3.0]));
}

#[test]
fn output_is_uppercase() {
    let hex = encode(&FieldValue::String("zz".into()));
    assert_eq!(hex, hex.to_uppercase());
}

// ── Strings ──────────────────────────────────────────────────────

#[test]
fn string_decode_stops_at_terminator() {
    assert_eq!(
        decode(FieldType::String, "466F6F00"),
        FieldValue::String("Foo".into())
    );
}

#[test]
fn string_decode_without_terminator() {
    assert_eq!(
        decode(FieldType::String, "466F6F"),
        FieldValue::String("Foo".into())
    );
}

#[test]
fn string_utf8_survives() {
    let v = FieldValue::String("Zoë_Copy".into());
    assert_eq!(decode(FieldType::String, &encode(&v)), v);
}

// ── Lenient decoding ─────────────────────────────────────────────

#[test]
fn empty_text_yields_zero_for_every_type() {
    for ty in FieldType::PROBE_ORDER {
        assert_eq!(decode(ty, ""), ty.zero(), "type {ty}");
    }
}

#[test]
fn non_hex_yields_zero() {
    assert_eq!(decode(FieldType::Int32, "XYZW"), FieldValue::Int32(0));
    assert_eq!(decode(FieldType::Vector3, "not hex"), FieldValue::Vector3([0.0; 3]));
}

#[test]
fn odd_length_yields_zero() {
    assert_eq!(decode(FieldType::Int32, "0403020"), FieldValue::Int32(0));
}

#[test]
fn wrong_width_yields_zero() {
    assert_eq!(decode(FieldType::Id64, "04030201"), FieldValue::Id64(0));
    assert_eq!(decode(FieldType::Boolean, "0101"), FieldValue::Boolean(false));
}

#[test]
fn surrounding_whitespace_is_ignored() {
    assert_eq!(decode(FieldType::Boolean, "\n  01  \n"), FieldValue::Boolean(true));
}
