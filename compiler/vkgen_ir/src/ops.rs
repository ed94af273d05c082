//! Constructors and operator overloads for building IR trees.
//!
//! Arithmetic operators build [`Expr::Binary`] nodes; bitwise operators and
//! shifts build intrinsic calls, matching how the front end spells them.

use std::ops;

use crate::expr::{BinaryOp, Expr, ForKind, Stmt};
use crate::intrinsic::Intrinsic;
use crate::types::{Type, TypeCode};

/// Wrap `value` into the range of a `bits`-wide two's complement integer.
fn wrap_signed(value: i64, bits: u8) -> i64 {
    if bits >= 64 {
        return value;
    }
    let shift = 64 - u32::from(bits);
    (value << shift) >> shift
}

/// Truncate `value` to `bits` unsigned bits.
#[allow(clippy::cast_sign_loss, reason = "reinterpreting the two's complement bit pattern")]
fn wrap_unsigned(value: i64, bits: u8) -> u64 {
    let raw = value as u64;
    if bits >= 64 {
        raw
    } else {
        raw & ((1u64 << bits) - 1)
    }
}

/// A literal of type `ty` holding `value`. Vector types become a broadcast.
#[allow(clippy::cast_precision_loss, reason = "small rewrite constants are exact")]
pub fn make_const(ty: Type, value: i64) -> Expr {
    if ty.is_vector() {
        return Expr::Broadcast {
            value: Box::new(make_const(ty.element_of(), value)),
            lanes: ty.lanes(),
        };
    }
    match ty.code() {
        TypeCode::Int => Expr::IntImm {
            ty,
            value: wrap_signed(value, ty.bits()),
        },
        TypeCode::UInt | TypeCode::Handle => Expr::UIntImm {
            ty,
            value: wrap_unsigned(value, ty.bits()),
        },
        TypeCode::Bool => Expr::UIntImm {
            ty,
            value: u64::from(value != 0),
        },
        TypeCode::Float => Expr::FloatImm {
            ty,
            value: value as f64,
        },
    }
}

pub fn make_zero(ty: Type) -> Expr {
    make_const(ty, 0)
}

pub fn make_one(ty: Type) -> Expr {
    make_const(ty, 1)
}

/// True if `e` is a literal zero, or a broadcast of one.
pub fn is_zero(e: &Expr) -> bool {
    match e {
        Expr::IntImm { value, .. } => *value == 0,
        Expr::UIntImm { value, .. } => *value == 0,
        Expr::FloatImm { value, .. } => *value == 0.0,
        Expr::Broadcast { value, .. } => is_zero(value),
        _ => false,
    }
}

/// The value of an integer literal, if `e` is one that fits in `i64`.
pub fn as_const_int(e: &Expr) -> Option<i64> {
    match e {
        Expr::IntImm { value, .. } => Some(*value),
        Expr::UIntImm { value, .. } => i64::try_from(*value).ok(),
        _ => None,
    }
}

impl Expr {
    /// `int32` literal.
    pub fn int32(value: i32) -> Self {
        Expr::IntImm {
            ty: Type::int(32),
            value: i64::from(value),
        }
    }

    /// `uint32` literal.
    pub fn uint32(value: u32) -> Self {
        Expr::UIntImm {
            ty: Type::uint(32),
            value: u64::from(value),
        }
    }

    /// `float32` literal.
    pub fn float32(value: f32) -> Self {
        Expr::FloatImm {
            ty: Type::float(32),
            value: f64::from(value),
        }
    }

    pub fn bool_imm(value: bool) -> Self {
        Expr::UIntImm {
            ty: Type::bool(),
            value: u64::from(value),
        }
    }

    pub fn string(text: impl Into<String>) -> Self {
        Expr::StringImm(text.into())
    }

    pub fn var(ty: Type, name: impl Into<String>) -> Self {
        Expr::Variable {
            ty,
            name: name.into(),
        }
    }

    pub fn cast(ty: Type, value: Expr) -> Self {
        Expr::Cast {
            ty,
            value: Box::new(value),
        }
    }

    pub fn binary(op: BinaryOp, a: Expr, b: Expr) -> Self {
        Expr::Binary {
            op,
            a: Box::new(a),
            b: Box::new(b),
        }
    }

    pub fn select(condition: Expr, true_value: Expr, false_value: Expr) -> Self {
        Expr::Select {
            condition: Box::new(condition),
            true_value: Box::new(true_value),
            false_value: Box::new(false_value),
        }
    }

    pub fn ramp(base: Expr, stride: Expr, lanes: u16) -> Self {
        Expr::Ramp {
            base: Box::new(base),
            stride: Box::new(stride),
            lanes,
        }
    }

    pub fn broadcast(value: Expr, lanes: u16) -> Self {
        Expr::Broadcast {
            value: Box::new(value),
            lanes,
        }
    }

    pub fn let_in(name: impl Into<String>, value: Expr, body: Expr) -> Self {
        Expr::Let {
            name: name.into(),
            value: Box::new(value),
            body: Box::new(body),
        }
    }

    pub fn call(ty: Type, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            ty,
            name: name.into(),
            args,
        }
    }

    /// Call of a known intrinsic; the result type is `ty`.
    pub fn intrinsic(ty: Type, intrinsic: Intrinsic, args: Vec<Expr>) -> Self {
        Self::call(ty, intrinsic.name(), args)
    }

    pub fn shuffle(vectors: Vec<Expr>, indices: Vec<u32>) -> Self {
        Expr::Shuffle { vectors, indices }
    }

    #[must_use]
    pub fn min(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Min, self, other)
    }

    #[must_use]
    pub fn max(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Max, self, other)
    }

    #[must_use]
    pub fn cmp_eq(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Eq, self, other)
    }

    #[must_use]
    pub fn cmp_ne(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ne, self, other)
    }

    #[must_use]
    pub fn cmp_lt(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Lt, self, other)
    }

    #[must_use]
    pub fn cmp_le(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Le, self, other)
    }

    #[must_use]
    pub fn cmp_gt(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Gt, self, other)
    }

    #[must_use]
    pub fn cmp_ge(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Ge, self, other)
    }

    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        Self::binary(BinaryOp::And, self, other)
    }

    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        Self::binary(BinaryOp::Or, self, other)
    }

    /// Truncating division intrinsic.
    #[must_use]
    pub fn div_round_to_zero(self, other: Expr) -> Self {
        let ty = self.ty();
        Self::intrinsic(ty, Intrinsic::DivRoundToZero, vec![self, other])
    }

    /// Truncating remainder intrinsic.
    #[must_use]
    pub fn mod_round_to_zero(self, other: Expr) -> Self {
        let ty = self.ty();
        Self::intrinsic(ty, Intrinsic::ModRoundToZero, vec![self, other])
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                Expr::binary($op, self, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);
impl_binary_operator!(Rem, rem, BinaryOp::Mod);

macro_rules! impl_intrinsic_operator {
    ($trait:ident, $method:ident, $intrinsic:expr) => {
        impl ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                let ty = self.ty();
                Expr::intrinsic(ty, $intrinsic, vec![self, rhs])
            }
        }
    };
}

impl_intrinsic_operator!(BitAnd, bitand, Intrinsic::BitwiseAnd);
impl_intrinsic_operator!(BitOr, bitor, Intrinsic::BitwiseOr);
impl_intrinsic_operator!(BitXor, bitxor, Intrinsic::BitwiseXor);
impl_intrinsic_operator!(Shl, shl, Intrinsic::ShiftLeft);
impl_intrinsic_operator!(Shr, shr, Intrinsic::ShiftRight);

impl ops::Not for Expr {
    type Output = Expr;

    /// Logical not for booleans, bitwise not otherwise.
    fn not(self) -> Expr {
        let ty = self.ty();
        if ty.is_bool() {
            Expr::Not(Box::new(self))
        } else {
            Expr::intrinsic(ty, Intrinsic::BitwiseNot, vec![self])
        }
    }
}

impl Stmt {
    pub fn evaluate(value: Expr) -> Self {
        Stmt::Evaluate(value)
    }

    pub fn let_stmt(name: impl Into<String>, value: Expr, body: Stmt) -> Self {
        Stmt::LetStmt {
            name: name.into(),
            value,
            body: Box::new(body),
        }
    }

    /// Serial loop of `name` over `[min, min + extent)`.
    pub fn serial_for(name: impl Into<String>, min: Expr, extent: Expr, body: Stmt) -> Self {
        Stmt::For {
            name: name.into(),
            min,
            extent,
            kind: ForKind::Serial,
            body: Box::new(body),
        }
    }

    pub fn if_then_else(condition: Expr, then_case: Stmt, else_case: Option<Stmt>) -> Self {
        Stmt::IfThenElse {
            condition,
            then_case: Box::new(then_case),
            else_case: else_case.map(Box::new),
        }
    }
}
