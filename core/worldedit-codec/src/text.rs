//! Readable attribute forms (`value-Vector3="1,2,3"`, `value-Boolean="True"`).

use tracing::warn;

use crate::field::{FieldType, FieldValue};

/// Shortest text that parses back to the same `f32`.
pub fn format_float(v: f32) -> String {
    format!("{v}")
}

/// Formats a value for its dialect-A attribute.
pub fn format_attribute(value: &FieldValue) -> String {
    match value {
        FieldValue::String(s) => s.trim_end_matches('\0').to_string(),
        FieldValue::Int32(v) | FieldValue::Hash32(v) => v.to_string(),
        FieldValue::Int64(v) | FieldValue::Id64(v) => v.to_string(),
        FieldValue::Float32(v) => format_float(*v),
        FieldValue::Vector3([x, y, z]) => {
            format!("{},{},{}", format_float(*x), format_float(*y), format_float(*z))
        }
        FieldValue::Boolean(true) => "True".to_string(),
        FieldValue::Boolean(false) => "False".to_string(),
    }
}

/// Parses attribute text (or dialect-B plain text) as the given type.
///
/// Lenient in the same way as [`crate::decode`]: unparseable numbers become
/// zero with a warning. Negative integers are reinterpreted as their
/// two's-complement unsigned form, which is how the binary mirror stores them.
pub fn parse_attribute(ty: FieldType, text: &str) -> FieldValue {
    let t = text.trim();
    match ty {
        FieldType::String => FieldValue::String(text.to_string()),
        FieldType::Int32 => FieldValue::Int32(parse_u32(ty, t)),
        FieldType::Hash32 => FieldValue::Hash32(parse_u32(ty, t)),
        FieldType::Int64 => FieldValue::Int64(parse_u64(ty, t)),
        FieldType::Id64 => FieldValue::Id64(parse_u64(ty, t)),
        FieldType::Float32 => FieldValue::Float32(parse_f32(ty, t)),
        FieldType::Vector3 => {
            let parts: Vec<f32> = if t.is_empty() {
                Vec::new()
            } else {
                t.split(',').map(|c| parse_f32(ty, c.trim())).collect()
            };
            if parts.len() != 3 {
                warn!(text = %t, components = parts.len(), "vector does not have 3 components");
            }
            FieldValue::vector(&parts)
        }
        FieldType::Boolean => FieldValue::Boolean(matches!(
            t.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes"
        )),
    }
}

fn parse_u32(ty: FieldType, t: &str) -> u32 {
    t.parse::<u32>()
        .or_else(|_| t.parse::<i32>().map(|v| v as u32))
        .unwrap_or_else(|_| {
            warn!(field_type = %ty, text = %t, "unparseable integer, using 0");
            0
        })
}

fn parse_u64(ty: FieldType, t: &str) -> u64 {
    t.parse::<u64>()
        .or_else(|_| t.parse::<i64>().map(|v| v as u64))
        .unwrap_or_else(|_| {
            warn!(field_type = %ty, text = %t, "unparseable integer, using 0");
            0
        })
}

fn parse_f32(ty: FieldType, t: &str) -> f32 {
    t.parse::<f32>().unwrap_or_else(|_| {
        warn!(field_type = %ty, text = %t, "unparseable float, using 0");
        0.0
    })
}
