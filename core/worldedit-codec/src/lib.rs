//! Field codec for world entity documents.
//!
//! Every typed field in a world document carries two representations: a
//! human-readable attribute (`value-Vector3="1,2,3"`) and a BinHex mirror in
//! the element text, which is the uppercase hex encoding of the field's
//! little-endian binary layout:
//!
//! | Type              | Layout                                   |
//! |-------------------|------------------------------------------|
//! | `String`          | UTF-8 bytes followed by one `0x00`       |
//! | `Int32`, `Hash32` | 4 bytes, little-endian unsigned          |
//! | `Int64`, `Id64`   | 8 bytes, little-endian unsigned          |
//! | `Float32`         | 4 bytes, little-endian IEEE-754          |
//! | `Vector3`         | three `Float32` values in x, y, z order  |
//! | `Boolean`         | 1 byte, `0x01` or `0x00`                 |
//!
//! Decoding is lenient: documents are edited by hand and by external
//! converters, so a malformed mirror decodes to the type's zero value and a
//! warning is logged instead of an error being returned.

mod binhex;
mod field;
mod text;

pub use binhex::{decode, encode, encode_vector3};
pub use field::{FieldType, FieldValue};
pub use text::{format_attribute, format_float, parse_attribute};
