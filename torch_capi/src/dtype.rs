#[cfg(feature = "torch")]
use tch::Kind;

use crate::error::CapiError;

/// Element types that may cross the boundary. The discriminant is the wire
/// code handed to and returned from the C API.
#[repr(i8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Uint8 = 0,
    Int8 = 1,
    Int16 = 2,
    Int32 = 3,
    Int64 = 4,
    Float16 = 5,
    Float32 = 6,
    Float64 = 7,
    Complex32 = 8,
    Complex64 = 9,
    Complex128 = 10,
    Bool = 11,
}

// Codes 12..=15 (qint8, quint8, qint32, bfloat16) are reserved and stay out
// of this table.
const TYPE_TABLE: [ElementType; 12] = [
    ElementType::Uint8,
    ElementType::Int8,
    ElementType::Int16,
    ElementType::Int32,
    ElementType::Int64,
    ElementType::Float16,
    ElementType::Float32,
    ElementType::Float64,
    ElementType::Complex32,
    ElementType::Complex64,
    ElementType::Complex128,
    ElementType::Bool,
];

impl ElementType {
    pub fn all() -> &'static [ElementType] {
        &TYPE_TABLE
    }

    pub fn from_code(code: i32) -> Result<Self, CapiError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| TYPE_TABLE.get(idx))
            .copied()
            .ok_or(CapiError::UnknownTypeCode(code))
    }

    pub fn code(self) -> i8 {
        self as i8
    }

    pub fn name(self) -> &'static str {
        match self {
            ElementType::Uint8 => "uint8",
            ElementType::Int8 => "int8",
            ElementType::Int16 => "int16",
            ElementType::Int32 => "int32",
            ElementType::Int64 => "int64",
            ElementType::Float16 => "float16",
            ElementType::Float32 => "float32",
            ElementType::Float64 => "float64",
            ElementType::Complex32 => "complex32",
            ElementType::Complex64 => "complex64",
            ElementType::Complex128 => "complex128",
            ElementType::Bool => "bool",
        }
    }

    /// Size of one element in bytes.
    pub fn size_in_bytes(self) -> usize {
        match self {
            ElementType::Uint8 | ElementType::Int8 | ElementType::Bool => 1,
            ElementType::Int16 | ElementType::Float16 => 2,
            ElementType::Int32 | ElementType::Float32 | ElementType::Complex32 => 4,
            ElementType::Int64 | ElementType::Float64 | ElementType::Complex64 => 8,
            ElementType::Complex128 => 16,
        }
    }

    #[cfg(feature = "torch")]
    pub fn kind(self) -> Kind {
        match self {
            ElementType::Uint8 => Kind::Uint8,
            ElementType::Int8 => Kind::Int8,
            ElementType::Int16 => Kind::Int16,
            ElementType::Int32 => Kind::Int,
            ElementType::Int64 => Kind::Int64,
            ElementType::Float16 => Kind::Half,
            ElementType::Float32 => Kind::Float,
            ElementType::Float64 => Kind::Double,
            ElementType::Complex32 => Kind::ComplexHalf,
            ElementType::Complex64 => Kind::ComplexFloat,
            ElementType::Complex128 => Kind::ComplexDouble,
            ElementType::Bool => Kind::Bool,
        }
    }

    #[cfg(feature = "torch")]
    pub fn from_kind(kind: Kind) -> Result<Self, CapiError> {
        TYPE_TABLE
            .iter()
            .copied()
            .find(|ty| ty.kind() == kind)
            .ok_or_else(|| CapiError::UnregisteredKind(format!("{:?}", kind)))
    }
}

/// JSON listing of the table, `[{"code":0,"name":"uint8","size":1},...]`.
pub fn table_json() -> String {
    let entries: Vec<serde_json::Value> = TYPE_TABLE
        .iter()
        .map(|ty| {
            serde_json::json!({
                "code": ty.code(),
                "name": ty.name(),
                "size": ty.size_in_bytes(),
            })
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}
