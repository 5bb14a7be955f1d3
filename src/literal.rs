//! Compile-time constants: [`Literal`] and the encodable [`SmallImmediate`] subset.

/// A tagged constant value, wide enough to hold any scalar the front-end can produce.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Literal {
    Int(i64),
    UInt(u64),
    Bool(bool),
    Real(f64),
}

impl Literal {
    pub fn as_i64(&self) -> i64 {
        match self {
            Literal::Int(v) => *v,
            Literal::UInt(v) => *v as i64,
            Literal::Bool(b) => *b as i64,
            Literal::Real(f) => *f as i64,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            Literal::Int(v) => *v as u64,
            Literal::UInt(v) => *v,
            Literal::Bool(b) => *b as u64,
            Literal::Real(f) => *f as u64,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Literal::Int(v) => *v as f64,
            Literal::UInt(v) => *v as f64,
            Literal::Bool(b) => (*b as i64) as f64,
            Literal::Real(f) => *f,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Literal::Int(v) => *v == 0,
            Literal::UInt(v) => *v == 0,
            Literal::Bool(b) => !*b,
            Literal::Real(f) => *f == 0.0,
        }
    }

    /// 32-bit truncation used by the binary immediate encoding.
    pub fn to_immediate(&self) -> u32 {
        match self {
            Literal::Int(v) => *v as u32,
            Literal::UInt(v) => *v as u32,
            Literal::Bool(b) => *b as u32,
            Literal::Real(f) => (*f as f32).to_bits(),
        }
    }

    pub fn is_power_of_two(&self) -> Option<u32> {
        let v = self.as_u64();
        if v != 0 && (v & (v - 1)) == 0 {
            Some(v.trailing_zeros())
        } else {
            None
        }
    }
}

/// A value that fits into the single small-immediate slot shared by both ALU operands of
/// one packed instruction.
///
/// Both operands of one instruction may reference a `SmallImmediate`, but only if they
/// encode to the exact same bit pattern - the hardware has one shared field, not one per
/// ALU. Callers are responsible for checking this before packing two small-immediate
/// operands into the same instruction (see `vc4c-asm`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SmallImmediate {
    /// Signed integer in `[-16, 15]`.
    Integer(i8),
    /// One of the handful of small floating point constants the hardware can materialize
    /// directly (stored as the raw encoding index 0..=15).
    SmallFloat(u8),
    /// Rotate the mul-ALU input by this many lanes, `1..=15`.
    RotationOffset(u8),
    /// Rotate by the amount held in accumulator r5 at runtime.
    RotationFromAccumulator,
}

impl SmallImmediate {
    pub fn from_signed(value: i32) -> Option<SmallImmediate> {
        if (-16..=15).contains(&value) {
            Some(SmallImmediate::Integer(value as i8))
        } else {
            None
        }
    }

    /// Encodes a compile-time rotation offset, normalizing "rotate down by k" to
    /// "rotate up by (16 - k) mod 16" and collapsing an offset of zero to `None`
    /// (the caller should emit a plain move instead).
    pub fn from_rotation(offset: u8, down: bool) -> Option<SmallImmediate> {
        let up_offset = if down { (16 - (offset % 16)) % 16 } else { offset % 16 };
        if up_offset == 0 {
            None
        } else {
            Some(SmallImmediate::RotationOffset(up_offset))
        }
    }

    /// 6-bit hardware encoding used in the packed instruction word's small-immediate field.
    pub fn encode(&self) -> u8 {
        match self {
            SmallImmediate::Integer(v) => (*v as u8) & 0x1F,
            SmallImmediate::SmallFloat(idx) => 0x20 | (idx & 0x0F),
            SmallImmediate::RotationOffset(k) => 0x30 | (k & 0x0F),
            SmallImmediate::RotationFromAccumulator => 0x30,
        }
    }
}
