//! Value types: scalars, vectors, pointers, arrays, structs, images.

/// Address space a pointer type resolves into.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum AddressSpace {
    Private,
    Local,
    Global,
    Constant,
    Generic,
}

/// A scalar base type: bit width plus integer/float kind and a signedness hint.
///
/// The signedness hint is informational only (it drives `sext`/`zext` selection in the
/// front-end and pretty-printing); two scalars with the same width and kind but different
/// signedness are still layout-compatible.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ScalarType {
    pub bit_width: u8,
    pub is_float: bool,
    pub is_signed: bool,
}

impl ScalarType {
    pub const fn int(bit_width: u8, is_signed: bool) -> ScalarType {
        ScalarType {
            bit_width,
            is_float: false,
            is_signed,
        }
    }

    pub const fn float(bit_width: u8) -> ScalarType {
        ScalarType {
            bit_width,
            is_float: true,
            is_signed: true,
        }
    }

    pub const BOOL: ScalarType = ScalarType::int(1, false);
    pub const I8: ScalarType = ScalarType::int(8, true);
    pub const U8: ScalarType = ScalarType::int(8, false);
    pub const I16: ScalarType = ScalarType::int(16, true);
    pub const U16: ScalarType = ScalarType::int(16, false);
    pub const I32: ScalarType = ScalarType::int(32, true);
    pub const U32: ScalarType = ScalarType::int(32, false);
    pub const I64: ScalarType = ScalarType::int(64, true);
    pub const U64: ScalarType = ScalarType::int(64, false);
    pub const F32: ScalarType = ScalarType::float(32);
    pub const F64: ScalarType = ScalarType::float(64);

    pub fn physical_bytes(&self) -> u32 {
        (u32::from(self.bit_width) + 7) / 8
    }
}

/// A value's type: scalar, vector-of-scalar, pointer, array, struct, or image.
///
/// Invariant: vector width must be a power of two and `<= 16` for any type that reaches
/// the backend; wider vectors are a front-end-only transient and must be split before
/// lowering runs.
#[derive(Clone, PartialEq, Debug)]
pub enum DataType {
    Scalar(ScalarType),
    Vector {
        element: ScalarType,
        width: u8,
    },
    Pointer {
        pointee: Box<DataType>,
        address_space: AddressSpace,
        alignment: u32,
    },
    Array {
        element: Box<DataType>,
        length: u32,
    },
    Struct {
        fields: Vec<DataType>,
        alignment: u32,
    },
    Image,
}

impl DataType {
    pub fn vector_width(&self) -> u8 {
        match self {
            DataType::Vector { width, .. } => *width,
            _ => 1,
        }
    }

    pub fn is_native_vector_width(&self) -> bool {
        let width = self.vector_width();
        width <= 16 && (width == 0 || width & (width - 1) == 0)
    }

    pub fn scalar_bit_width(&self) -> u8 {
        match self {
            DataType::Scalar(s) => s.bit_width,
            DataType::Vector { element, .. } => element.bit_width,
            DataType::Pointer { .. } => 32,
            _ => 32,
        }
    }

    pub fn element_scalar(&self) -> Option<ScalarType> {
        match self {
            DataType::Scalar(s) => Some(*s),
            DataType::Vector { element, .. } => Some(*element),
            _ => None,
        }
    }

    pub fn is_float(&self) -> bool {
        self.element_scalar().map(|s| s.is_float).unwrap_or(false)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, DataType::Pointer { .. })
    }

    /// Physical width in bytes when this type is materialized in memory.
    pub fn physical_width(&self) -> u32 {
        match self {
            DataType::Scalar(s) => s.physical_bytes(),
            DataType::Vector { element, width } => element.physical_bytes() * u32::from(*width),
            DataType::Pointer { .. } => 4,
            DataType::Array { element, length } => element.physical_width() * length,
            DataType::Struct { fields, alignment } => {
                let sum: u32 = fields.iter().map(|f| f.physical_width()).sum();
                align_up(sum, *alignment)
            }
            DataType::Image => 4,
        }
    }

    pub fn alignment(&self) -> u32 {
        match self {
            DataType::Pointer { alignment, .. } => *alignment,
            DataType::Struct { alignment, .. } => *alignment,
            other => other.physical_width().max(1),
        }
    }

    /// Offset in bytes of field `index` within a struct, or `None` for non-struct types.
    pub fn struct_field_offset(&self, index: usize) -> Option<u32> {
        match self {
            DataType::Struct { fields, .. } => {
                let mut offset = 0u32;
                for field in fields.iter().take(index) {
                    offset += field.physical_width();
                }
                Some(offset)
            }
            _ => None,
        }
    }

    pub fn pointer_to(pointee: DataType, address_space: AddressSpace, alignment: u32) -> DataType {
        DataType::Pointer {
            pointee: Box::new(pointee),
            address_space,
            alignment,
        }
    }

    pub fn vector_of(element: ScalarType, width: u8) -> DataType {
        if width <= 1 {
            DataType::Scalar(element)
        } else {
            DataType::Vector { element, width }
        }
    }
}

fn align_up(value: u32, alignment: u32) -> u32 {
    if alignment <= 1 {
        return value;
    }
    (value + alignment - 1) / alignment * alignment
}
