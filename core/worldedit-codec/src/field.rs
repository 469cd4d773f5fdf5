use std::fmt;

/// Declared type of a field, as named by its dialect-A value attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Int32,
    Hash32,
    Int64,
    Id64,
    Float32,
    Vector3,
    Boolean,
}

impl FieldType {
    /// Probe order used when a field's type is not known up front.
    pub const PROBE_ORDER: [FieldType; 8] = [
        FieldType::String,
        FieldType::Vector3,
        FieldType::Int32,
        FieldType::Id64,
        FieldType::Float32,
        FieldType::Hash32,
        FieldType::Boolean,
        FieldType::Int64,
    ];

    /// Name of the attribute holding the readable value, e.g. `value-Id64`.
    pub fn attribute_name(self) -> &'static str {
        match self {
            FieldType::String => "value-String",
            FieldType::Int32 => "value-Int32",
            FieldType::Hash32 => "value-Hash32",
            FieldType::Int64 => "value-Int64",
            FieldType::Id64 => "value-Id64",
            FieldType::Float32 => "value-Float32",
            FieldType::Vector3 => "value-Vector3",
            FieldType::Boolean => "value-Boolean",
        }
    }

    pub fn from_attribute(name: &str) -> Option<Self> {
        Self::PROBE_ORDER
            .into_iter()
            .find(|ty| ty.attribute_name() == name)
    }

    /// Size of the binary layout in bytes. `None` for variable-length strings.
    pub fn byte_len(self) -> Option<usize> {
        match self {
            FieldType::String => None,
            FieldType::Boolean => Some(1),
            FieldType::Int32 | FieldType::Hash32 | FieldType::Float32 => Some(4),
            FieldType::Int64 | FieldType::Id64 => Some(8),
            FieldType::Vector3 => Some(12),
        }
    }

    /// The value a malformed mirror of this type decodes to.
    pub fn zero(self) -> FieldValue {
        match self {
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Int32 => FieldValue::Int32(0),
            FieldType::Hash32 => FieldValue::Hash32(0),
            FieldType::Int64 => FieldValue::Int64(0),
            FieldType::Id64 => FieldValue::Id64(0),
            FieldType::Float32 => FieldValue::Float32(0.0),
            FieldType::Vector3 => FieldValue::Vector3([0.0; 3]),
            FieldType::Boolean => FieldValue::Boolean(false),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attribute_name().trim_start_matches("value-"))
    }
}

/// A semantic field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int32(u32),
    Hash32(u32),
    Int64(u64),
    Id64(u64),
    Float32(f32),
    Vector3([f32; 3]),
    Boolean(bool),
}

impl FieldValue {
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Int32(_) => FieldType::Int32,
            FieldValue::Hash32(_) => FieldType::Hash32,
            FieldValue::Int64(_) => FieldType::Int64,
            FieldValue::Id64(_) => FieldType::Id64,
            FieldValue::Float32(_) => FieldType::Float32,
            FieldValue::Vector3(_) => FieldType::Vector3,
            FieldValue::Boolean(_) => FieldType::Boolean,
        }
    }

    /// Builds a vector from any number of components, padding missing ones
    /// with `0.0` and dropping extras.
    pub fn vector(components: &[f32]) -> Self {
        let mut v = [0.0f32; 3];
        for (slot, c) in v.iter_mut().zip(components) {
            *slot = *c;
        }
        FieldValue::Vector3(v)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer payload of any integer-like variant.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::Int32(v) | FieldValue::Hash32(v) => Some(u64::from(*v)),
            FieldValue::Int64(v) | FieldValue::Id64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<[f32; 3]> {
        match self {
            FieldValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            FieldValue::Float32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}
