//! Semantic types of kernel IR values.
//!
//! A [`Type`] is a (code, bit width, lane count) triple. Scalars have one
//! lane; vectors have more. Equality is structural, so two independently
//! built `int32x4` types compare equal and hash identically.

use std::fmt;

/// Element kind of a [`Type`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeCode {
    /// Two's complement signed integer.
    Int,
    /// Unsigned integer.
    UInt,
    /// IEEE floating point.
    Float,
    /// Boolean (one bit).
    Bool,
    /// Opaque pointer or aggregate handle. Device code cannot represent these.
    Handle,
}

impl TypeCode {
    /// Stable one-byte tag used in constant interning keys.
    #[inline]
    pub const fn tag(self) -> u8 {
        match self {
            TypeCode::Int => 0,
            TypeCode::UInt => 1,
            TypeCode::Float => 2,
            TypeCode::Bool => 3,
            TypeCode::Handle => 4,
        }
    }
}

/// A scalar or vector type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type {
    code: TypeCode,
    bits: u8,
    lanes: u16,
}

impl Type {
    /// Build a type from its parts.
    ///
    /// A lane count of 0 is representable so that malformed trees can be
    /// built and reported; such a type is neither scalar nor vector.
    #[inline]
    pub const fn new(code: TypeCode, bits: u8, lanes: u16) -> Self {
        Type { code, bits, lanes }
    }

    #[inline]
    pub const fn int(bits: u8) -> Self {
        Self::new(TypeCode::Int, bits, 1)
    }

    #[inline]
    pub const fn uint(bits: u8) -> Self {
        Self::new(TypeCode::UInt, bits, 1)
    }

    #[inline]
    pub const fn float(bits: u8) -> Self {
        Self::new(TypeCode::Float, bits, 1)
    }

    #[inline]
    pub const fn bool() -> Self {
        Self::new(TypeCode::Bool, 1, 1)
    }

    /// 64-bit opaque handle (strings, buffers).
    #[inline]
    pub const fn handle() -> Self {
        Self::new(TypeCode::Handle, 64, 1)
    }

    #[inline]
    pub const fn code(self) -> TypeCode {
        self.code
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.bits
    }

    #[inline]
    pub const fn lanes(self) -> u16 {
        self.lanes
    }

    /// Same element kind and width with a different lane count.
    #[inline]
    #[must_use]
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self::new(self.code, self.bits, lanes)
    }

    /// Same element kind and lane count with a different width.
    #[inline]
    #[must_use]
    pub const fn with_bits(self, bits: u8) -> Self {
        Self::new(self.code, bits, self.lanes)
    }

    /// The scalar type of one lane.
    #[inline]
    #[must_use]
    pub const fn element_of(self) -> Self {
        self.with_lanes(1)
    }

    /// Bytes occupied by one lane, rounded up (a bool takes one byte).
    #[inline]
    pub const fn lane_bytes(self) -> usize {
        (self.bits as usize).div_ceil(8)
    }

    /// Bytes occupied by all lanes.
    #[inline]
    pub const fn bytes(self) -> usize {
        self.lane_bytes() * self.lanes as usize
    }

    #[inline]
    pub const fn is_scalar(self) -> bool {
        self.lanes == 1
    }

    #[inline]
    pub const fn is_vector(self) -> bool {
        self.lanes > 1
    }

    #[inline]
    pub fn is_int(self) -> bool {
        self.code == TypeCode::Int
    }

    #[inline]
    pub fn is_uint(self) -> bool {
        self.code == TypeCode::UInt
    }

    #[inline]
    pub fn is_int_or_uint(self) -> bool {
        matches!(self.code, TypeCode::Int | TypeCode::UInt)
    }

    #[inline]
    pub fn is_float(self) -> bool {
        self.code == TypeCode::Float
    }

    #[inline]
    pub fn is_bool(self) -> bool {
        self.code == TypeCode::Bool
    }

    #[inline]
    pub fn is_handle(self) -> bool {
        self.code == TypeCode::Handle
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            TypeCode::Int => write!(f, "int{}", self.bits)?,
            TypeCode::UInt => write!(f, "uint{}", self.bits)?,
            TypeCode::Float => write!(f, "float{}", self.bits)?,
            TypeCode::Bool => f.write_str("bool")?,
            TypeCode::Handle => f.write_str("handle")?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}
