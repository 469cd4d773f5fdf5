//! Dialect-aware field access.
//!
//! The same field appears in one of two shapes:
//!
//! ```xml
//! <!-- dialect A: typed attribute plus BinHex mirror -->
//! <field name="hidPos" value-Vector3="10,0,5">00002041000000000000A040</field>
//!
//! <!-- dialect B: plain text or x/y/z children, no mirror -->
//! <value name="hidPos"><x>10</x><y>0</y><z>5</z></value>
//! ```
//!
//! A field is located once per access with a fixed probe order (dialect A
//! direct child, dialect A descendant, dialect B direct child, dialect B
//! descendant) and is always read and written in the dialect it was found in.

use tracing::{debug, warn};
use worldedit_codec::{FieldType, FieldValue, decode, encode, format_attribute, parse_attribute};

use crate::xml::XmlElement;

/// Element tag of dialect-A fields.
pub const FIELD_TAG: &str = "field";
/// Element tag of dialect-B fields.
pub const VALUE_TAG: &str = "value";

/// Well-known field names.
pub mod keys {
    pub const ENTITY_ID: &str = "disEntityId";
    pub const NAME: &str = "hidName";
    pub const POSITION: &str = "hidPos";
    pub const POSITION_PRECISE: &str = "hidPos_precise";
    pub const LAYER_PATH_ID: &str = "PathId";
}

/// The two schema conventions for expressing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `<field name=".." value-T="..">HEX</field>`
    A,
    /// `<value name="..">text</value>` or `<value><x/><y/><z/></value>`
    B,
}

impl Dialect {
    pub fn tag(self) -> &'static str {
        match self {
            Dialect::A => FIELD_TAG,
            Dialect::B => VALUE_TAG,
        }
    }
}

/// Where a field lives inside an element, and in which dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldLocator {
    /// Dialect A element at the given path.
    AttributeMirrored(Vec<usize>),
    /// Dialect B element at the given path.
    ChildElement(Vec<usize>),
}

impl FieldLocator {
    pub fn dialect(&self) -> Dialect {
        match self {
            FieldLocator::AttributeMirrored(_) => Dialect::A,
            FieldLocator::ChildElement(_) => Dialect::B,
        }
    }

    pub fn path(&self) -> &[usize] {
        match self {
            FieldLocator::AttributeMirrored(p) | FieldLocator::ChildElement(p) => p,
        }
    }

    /// Locates `name` using the full probe order.
    pub fn locate(el: &XmlElement, name: &str) -> Option<Self> {
        Self::locate_in(el, name, Dialect::A).or_else(|| Self::locate_in(el, name, Dialect::B))
    }

    /// Locates `name` in one dialect only: direct child first, then any
    /// descendant.
    pub fn locate_in(el: &XmlElement, name: &str, dialect: Dialect) -> Option<Self> {
        let tag = dialect.tag();
        let is_field = |e: &XmlElement| e.tag == tag && e.attr("name") == Some(name);
        let path = el
            .child_index(is_field)
            .map(|i| vec![i])
            .or_else(|| el.descendant_path(is_field))?;
        Some(match dialect {
            Dialect::A => FieldLocator::AttributeMirrored(path),
            Dialect::B => FieldLocator::ChildElement(path),
        })
    }
}

/// Reads `name` as type `ty`. `None` if the field is absent.
pub fn read_typed(el: &XmlElement, name: &str, ty: FieldType) -> Option<FieldValue> {
    let loc = FieldLocator::locate(el, name)?;
    let field = el.at_path(loc.path())?;
    Some(read_located(field, loc.dialect(), ty))
}

/// Reads `name` as type `ty` in one dialect only.
pub fn read_typed_in(
    el: &XmlElement,
    name: &str,
    ty: FieldType,
    dialect: Dialect,
) -> Option<FieldValue> {
    let loc = FieldLocator::locate_in(el, name, dialect)?;
    let field = el.at_path(loc.path())?;
    Some(read_located(field, dialect, ty))
}

/// Reads `name` from a direct child in one dialect, ignoring nested
/// components.
pub fn read_direct(
    el: &XmlElement,
    name: &str,
    ty: FieldType,
    dialect: Dialect,
) -> Option<FieldValue> {
    let tag = dialect.tag();
    let field = el.find_child(|e| e.tag == tag && e.attr("name") == Some(name))?;
    Some(read_located(field, dialect, ty))
}

fn read_located(field: &XmlElement, dialect: Dialect, ty: FieldType) -> FieldValue {
    match dialect {
        Dialect::A => match field.attr(ty.attribute_name()) {
            Some(text) => parse_attribute(ty, text),
            None => decode(ty, &field.text()),
        },
        Dialect::B => match (ty, xyz_children(field)) {
            (FieldType::Vector3, Some([x, y, z])) => {
                let c = |e: &XmlElement| match parse_attribute(FieldType::Float32, &e.text()) {
                    FieldValue::Float32(v) => v,
                    _ => 0.0,
                };
                FieldValue::Vector3([c(x), c(y), c(z)])
            }
            _ => parse_attribute(ty, &field.text()),
        },
    }
}

/// Reads `name` without knowing its type.
///
/// Dialect A fields are typed by the first `value-*` attribute found in
/// [`FieldType::PROBE_ORDER`]; dialect B fields are vectors when they have
/// x/y/z children and strings otherwise.
pub fn read_field(el: &XmlElement, name: &str) -> Option<FieldValue> {
    let loc = FieldLocator::locate(el, name)?;
    let field = el.at_path(loc.path())?;
    let ty = match loc.dialect() {
        Dialect::A => FieldType::PROBE_ORDER
            .into_iter()
            .find(|ty| field.has_attr(ty.attribute_name()))?,
        Dialect::B if xyz_children(field).is_some() => FieldType::Vector3,
        Dialect::B => FieldType::String,
    };
    Some(read_located(field, loc.dialect(), ty))
}

/// Writes `value` into the existing representation of `name`.
///
/// Dialect A updates the typed attribute and the BinHex mirror together.
/// Dialect B updates x/y/z children for vectors that have them, otherwise
/// the plain text. Returns `false`, without creating anything, if the field
/// is absent.
pub fn write_field(el: &mut XmlElement, name: &str, value: &FieldValue) -> bool {
    let Some(loc) = FieldLocator::locate(el, name) else {
        debug!(field = %name, "field not present, nothing written");
        return false;
    };
    let dialect = loc.dialect();
    let Some(field) = el.at_path_mut(loc.path()) else {
        return false;
    };
    write_located(field, dialect, value);
    true
}

fn write_located(field: &mut XmlElement, dialect: Dialect, value: &FieldValue) {
    match dialect {
        Dialect::A => {
            field.set_attr(value.field_type().attribute_name(), format_attribute(value));
            field.set_text(encode(value));
        }
        Dialect::B => {
            if let FieldValue::Vector3(v) = value
                && xyz_children(field).is_some()
            {
                for (axis, c) in ["x", "y", "z"].into_iter().zip(v) {
                    if let Some(child) = field.elements_mut().find(|e| e.tag == axis) {
                        child.set_text(worldedit_codec::format_float(*c));
                    }
                }
                return;
            }
            field.set_text(format_attribute(value));
        }
    }
}

/// Reads a field as a string, as used for names and layer labels.
pub fn read_string(el: &XmlElement, name: &str) -> Option<String> {
    match read_typed(el, name, FieldType::String)? {
        FieldValue::String(s) => Some(s),
        other => {
            warn!(field = %name, value = ?other, "expected string field");
            None
        }
    }
}

fn xyz_children(field: &XmlElement) -> Option<[&XmlElement; 3]> {
    let axis = |name: &str| field.find_child(|e| e.tag == name);
    Some([axis("x")?, axis("y")?, axis("z")?])
}
