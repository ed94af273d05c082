//! Operator lowering: casts, binary operators, logical not.
//!
//! Opcode selection is driven by the operand's [`OperandKind`]. Integer
//! division and modulo never reach a native divide: they go through the
//! euclidean rewrite in `vkgen_ir::division`. `min`/`max` are desugared to a
//! select over let-bound operands so each operand is evaluated once.

use vkgen_ir::{lower_euclidean_div, lower_euclidean_mod, BinaryOp, Expr, Type, TypeCode};

use crate::emitter::Emitter;
use crate::error::EmitError;
use crate::id::Id;
use crate::spirv::Op;

/// Operand category that selects between opcode variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OperandKind {
    Float,
    Signed,
    Unsigned,
    Bool,
}

impl OperandKind {
    pub(crate) fn of(ty: Type) -> Result<Self, EmitError> {
        match ty.code() {
            TypeCode::Float => Ok(Self::Float),
            TypeCode::Int => Ok(Self::Signed),
            TypeCode::UInt => Ok(Self::Unsigned),
            TypeCode::Bool => Ok(Self::Bool),
            TypeCode::Handle => Err(EmitError::UnsupportedType { ty }),
        }
    }

    fn is_integer(self) -> bool {
        matches!(self, Self::Signed | Self::Unsigned)
    }
}

/// Conversion opcode for `from -> to`; `None` for pairs involving bool.
fn cast_opcode(from: OperandKind, to: OperandKind) -> Option<Op> {
    use OperandKind::{Bool, Float, Signed, Unsigned};
    Some(match (from, to) {
        (Float, Float) => Op::FConvert,
        (Float, Unsigned) => Op::ConvertFToU,
        (Float, Signed) => Op::ConvertFToS,
        (Unsigned, Float) => Op::ConvertUToF,
        (Unsigned, Unsigned) => Op::UConvert,
        (Unsigned, Signed) => Op::SatConvertUToS,
        (Signed, Float) => Op::ConvertSToF,
        (Signed, Unsigned) => Op::SatConvertSToU,
        (Signed, Signed) => Op::SConvert,
        (Bool, _) | (_, Bool) => return None,
    })
}

/// Opcode of a non-desugared binary operator over operands of type `ty`.
fn binary_opcode(op: BinaryOp, ty: Type) -> Result<Op, EmitError> {
    use OperandKind::{Bool, Float, Signed, Unsigned};
    let kind = OperandKind::of(ty)?;
    let opcode = match (op, kind) {
        (BinaryOp::Add, Float) => Op::FAdd,
        (BinaryOp::Add, Signed | Unsigned) => Op::IAdd,
        (BinaryOp::Sub, Float) => Op::FSub,
        (BinaryOp::Sub, Signed | Unsigned) => Op::ISub,
        (BinaryOp::Mul, Float) => Op::FMul,
        (BinaryOp::Mul, Signed | Unsigned) => Op::IMul,
        (BinaryOp::Div, Float) => Op::FDiv,
        // Sign of the result follows the divisor.
        (BinaryOp::Mod, Float) => Op::FMod,

        (BinaryOp::Eq, Float) => Op::FOrdEqual,
        (BinaryOp::Eq, Bool) => Op::LogicalEqual,
        (BinaryOp::Eq, Signed | Unsigned) => Op::IEqual,
        (BinaryOp::Ne, Float) => Op::FOrdNotEqual,
        (BinaryOp::Ne, Bool) => Op::LogicalNotEqual,
        (BinaryOp::Ne, Signed | Unsigned) => Op::INotEqual,
        (BinaryOp::Lt, Float) => Op::FOrdLessThan,
        (BinaryOp::Lt, Signed) => Op::SLessThan,
        (BinaryOp::Lt, Unsigned) => Op::ULessThan,
        (BinaryOp::Le, Float) => Op::FOrdLessThanEqual,
        (BinaryOp::Le, Signed) => Op::SLessThanEqual,
        (BinaryOp::Le, Unsigned) => Op::ULessThanEqual,
        (BinaryOp::Gt, Float) => Op::FOrdGreaterThan,
        (BinaryOp::Gt, Signed) => Op::SGreaterThan,
        (BinaryOp::Gt, Unsigned) => Op::UGreaterThan,
        (BinaryOp::Ge, Float) => Op::FOrdGreaterThanEqual,
        (BinaryOp::Ge, Signed) => Op::SGreaterThanEqual,
        (BinaryOp::Ge, Unsigned) => Op::UGreaterThanEqual,

        (BinaryOp::And, Bool) => Op::LogicalAnd,
        (BinaryOp::Or, Bool) => Op::LogicalOr,

        _ => {
            return Err(EmitError::unsupported(format!(
                "`{}` on `{ty}`",
                op.symbol()
            )))
        }
    };
    Ok(opcode)
}

impl Emitter<'_> {
    pub(crate) fn lower_cast(&mut self, ty: Type, value: &Expr) -> Result<Id, EmitError> {
        let src = value.ty();
        if src == ty {
            return self.lower_expr(value);
        }
        if src.lanes() != ty.lanes() {
            return Err(EmitError::malformed(format!(
                "cast from `{src}` to `{ty}` changes the lane count"
            )));
        }
        let opcode = cast_opcode(OperandKind::of(src)?, OperandKind::of(ty)?).ok_or_else(|| {
            EmitError::unsupported(format!("cast from `{src}` to `{ty}`"))
        })?;
        let operand = self.lower_expr(value)?;
        self.emit_typed(opcode, ty, &[operand])
    }

    pub(crate) fn lower_binary(&mut self, op: BinaryOp, a: &Expr, b: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        if b.ty() != ty {
            return Err(EmitError::malformed(format!(
                "operands of `{}` have types `{ty}` and `{}`",
                op.symbol(),
                b.ty()
            )));
        }
        match op {
            BinaryOp::Min | BinaryOp::Max => self.lower_min_max(op, a, b),
            BinaryOp::Div | BinaryOp::Mod if OperandKind::of(ty)?.is_integer() => {
                let rewritten = if op == BinaryOp::Div {
                    lower_euclidean_div(a.clone(), b.clone(), &mut self.names)
                } else {
                    lower_euclidean_mod(a.clone(), b.clone(), &mut self.names)
                };
                self.lower_expr(&rewritten)
            }
            _ => {
                let opcode = binary_opcode(op, ty)?;
                let result_ty = if op.is_comparison() {
                    Type::bool().with_lanes(ty.lanes())
                } else {
                    ty
                };
                let lhs = self.lower_expr(a)?;
                let rhs = self.lower_expr(b)?;
                self.emit_typed(opcode, result_ty, &[lhs, rhs])
            }
        }
    }

    /// `let a$ = a in let b$ = b in select(a$ < b$, a$, b$)` (`>` for max).
    fn lower_min_max(&mut self, op: BinaryOp, a: &Expr, b: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        let a_name = self.names.fresh("a");
        let b_name = self.names.fresh("b");
        let a_var = Expr::var(ty, a_name.clone());
        let b_var = Expr::var(ty, b_name.clone());
        let condition = if op == BinaryOp::Min {
            a_var.clone().cmp_lt(b_var.clone())
        } else {
            a_var.clone().cmp_gt(b_var.clone())
        };
        let desugared = Expr::let_in(
            a_name,
            a.clone(),
            Expr::let_in(b_name, b.clone(), Expr::select(condition, a_var, b_var)),
        );
        self.lower_expr(&desugared)
    }

    pub(crate) fn lower_not(&mut self, a: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        if !ty.is_bool() {
            return Err(EmitError::malformed(format!("logical not of `{ty}`")));
        }
        let operand = self.lower_expr(a)?;
        self.emit_typed(Op::LogicalNot, ty, &[operand])
    }
}
