//! Intrinsic call lowering.
//!
//! Calls are resolved against the fixed [`Intrinsic`] table; any other name
//! is rejected rather than silently dropped.

use vkgen_ir::{make_const, Expr, Intrinsic, Type};

use crate::emitter::Emitter;
use crate::error::EmitError;
use crate::id::Id;
use crate::lower_operators::OperandKind;
use crate::spirv::Op;

fn arity_error(intrinsic: Intrinsic, args: &[Expr]) -> EmitError {
    EmitError::malformed(format!(
        "`{intrinsic}` takes {} arguments, got {}",
        intrinsic.arity(),
        args.len()
    ))
}

/// An integer literal, or a broadcast of one.
fn literal_int(e: &Expr) -> Option<i64> {
    match e {
        Expr::Broadcast { value, .. } => literal_int(value),
        _ => vkgen_ir::as_const_int(e),
    }
}

pub(crate) fn check_arity(intrinsic: Intrinsic, args: &[Expr]) -> Result<(), EmitError> {
    if args.len() == intrinsic.arity() {
        Ok(())
    } else {
        Err(arity_error(intrinsic, args))
    }
}

impl Emitter<'_> {
    pub(crate) fn lower_call(
        &mut self,
        expr: &Expr,
        ty: Type,
        name: &str,
        args: &[Expr],
    ) -> Result<Id, EmitError> {
        let intrinsic = Intrinsic::from_name(name)
            .ok_or_else(|| EmitError::unsupported(format!("call to `{name}`")))?;
        match (intrinsic, args) {
            (Intrinsic::BitwiseAnd | Intrinsic::BitwiseOr | Intrinsic::BitwiseXor, [a, b]) => {
                self.lower_bitwise(intrinsic, a, b)
            }
            (Intrinsic::BitwiseNot, [a]) => self.lower_bitwise_not(a),
            (Intrinsic::ShiftLeft | Intrinsic::ShiftRight, [a, b]) => {
                self.lower_shift(intrinsic, a, b)
            }
            (Intrinsic::Reinterpret, [a]) => self.lower_reinterpret(ty, a),
            (Intrinsic::GpuThreadBarrier, []) => Err(EmitError::malformed(
                "`gpu_thread_barrier` yields no value",
            )),
            (Intrinsic::IfThenElse, [condition, then_value, else_value]) => {
                self.lower_select(expr, condition, then_value, else_value)
            }
            (Intrinsic::DivRoundToZero | Intrinsic::ModRoundToZero, [a, b]) => {
                self.lower_truncating_division(intrinsic, a, b)
            }
            (Intrinsic::MulShiftRight, [a, b, q]) => self.lower_mul_shift_right(a, b, q),
            (Intrinsic::SortedAvg, [a, b]) => self.lower_sorted_avg(a, b),
            _ => Err(arity_error(intrinsic, args)),
        }
    }

    /// Lower two same-typed operands, returning their kind and ids.
    fn lower_operand_pair(
        &mut self,
        intrinsic: Intrinsic,
        a: &Expr,
        b: &Expr,
    ) -> Result<(Type, OperandKind, Id, Id), EmitError> {
        let ty = a.ty();
        if b.ty() != ty {
            return Err(EmitError::malformed(format!(
                "operands of `{intrinsic}` have types `{ty}` and `{}`",
                b.ty()
            )));
        }
        let kind = OperandKind::of(ty)?;
        let lhs = self.lower_expr(a)?;
        let rhs = self.lower_expr(b)?;
        Ok((ty, kind, lhs, rhs))
    }

    fn lower_bitwise(&mut self, intrinsic: Intrinsic, a: &Expr, b: &Expr) -> Result<Id, EmitError> {
        let (ty, kind, lhs, rhs) = self.lower_operand_pair(intrinsic, a, b)?;
        let op = match (intrinsic, kind) {
            (Intrinsic::BitwiseAnd, OperandKind::Bool) => Op::LogicalAnd,
            (Intrinsic::BitwiseOr, OperandKind::Bool) => Op::LogicalOr,
            (Intrinsic::BitwiseXor, OperandKind::Bool) => Op::LogicalNotEqual,
            (_, OperandKind::Float) => {
                return Err(EmitError::unsupported(format!("`{intrinsic}` on `{ty}`")))
            }
            (Intrinsic::BitwiseAnd, _) => Op::BitwiseAnd,
            (Intrinsic::BitwiseOr, _) => Op::BitwiseOr,
            _ => Op::BitwiseXor,
        };
        self.emit_typed(op, ty, &[lhs, rhs])
    }

    fn lower_bitwise_not(&mut self, a: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        let op = match OperandKind::of(ty)? {
            OperandKind::Bool => Op::LogicalNot,
            OperandKind::Signed | OperandKind::Unsigned => Op::Not,
            OperandKind::Float => {
                return Err(EmitError::unsupported(format!("`bitwise_not` on `{ty}`")))
            }
        };
        let operand = self.lower_expr(a)?;
        self.emit_typed(op, ty, &[operand])
    }

    /// Right shifts are arithmetic for signed operands, logical otherwise.
    fn lower_shift(&mut self, intrinsic: Intrinsic, a: &Expr, b: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        let op = match (intrinsic, OperandKind::of(ty)?) {
            (Intrinsic::ShiftLeft, OperandKind::Signed | OperandKind::Unsigned) => {
                Op::ShiftLeftLogical
            }
            (Intrinsic::ShiftRight, OperandKind::Signed) => Op::ShiftRightArithmetic,
            (Intrinsic::ShiftRight, OperandKind::Unsigned) => Op::ShiftRightLogical,
            _ => return Err(EmitError::unsupported(format!("`{intrinsic}` on `{ty}`"))),
        };
        if !b.ty().is_int_or_uint() || b.ty().lanes() != ty.lanes() {
            return Err(EmitError::malformed(format!(
                "shift amount of type `{}` for `{ty}`",
                b.ty()
            )));
        }
        let value = self.lower_expr(a)?;
        let amount = self.lower_expr(b)?;
        self.emit_typed(op, ty, &[value, amount])
    }

    /// Bit pattern reinterpretation between types of equal total width.
    fn lower_reinterpret(&mut self, ty: Type, a: &Expr) -> Result<Id, EmitError> {
        let src = a.ty();
        if src == ty {
            return self.lower_expr(a);
        }
        if src.is_bool() || ty.is_bool() {
            return Err(EmitError::unsupported(format!(
                "reinterpret from `{src}` to `{ty}`"
            )));
        }
        let src_bits = usize::from(src.bits()) * usize::from(src.lanes());
        let dst_bits = usize::from(ty.bits()) * usize::from(ty.lanes());
        if src_bits != dst_bits {
            return Err(EmitError::malformed(format!(
                "reinterpret from `{src}` to `{ty}` changes the bit width"
            )));
        }
        let operand = self.lower_expr(a)?;
        self.emit_typed(Op::Bitcast, ty, &[operand])
    }

    /// Native truncating division/remainder.
    fn lower_truncating_division(
        &mut self,
        intrinsic: Intrinsic,
        a: &Expr,
        b: &Expr,
    ) -> Result<Id, EmitError> {
        let ty = a.ty();
        let op = match (intrinsic, OperandKind::of(ty)?) {
            (Intrinsic::DivRoundToZero, OperandKind::Signed) => Op::SDiv,
            (Intrinsic::DivRoundToZero, OperandKind::Unsigned) => Op::UDiv,
            (Intrinsic::ModRoundToZero, OperandKind::Signed) => Op::SRem,
            (Intrinsic::ModRoundToZero, OperandKind::Unsigned) => Op::UMod,
            _ => return Err(EmitError::unsupported(format!("`{intrinsic}` on `{ty}`"))),
        };
        let (ty, _, lhs, rhs) = self.lower_operand_pair(intrinsic, a, b)?;
        self.emit_typed(op, ty, &[lhs, rhs])
    }

    /// `(a * b) >> q` computed on the double-width product.
    fn lower_mul_shift_right(&mut self, a: &Expr, b: &Expr, q: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        let signed = match OperandKind::of(ty)? {
            OperandKind::Signed => true,
            OperandKind::Unsigned => false,
            _ => return Err(EmitError::unsupported(format!("`mul_shift_right` on `{ty}`"))),
        };
        let q = literal_int(q).ok_or_else(|| {
            EmitError::malformed(format!("`mul_shift_right` shift `{q}` is not a literal"))
        })?;
        let n = i64::from(ty.bits());
        if !(0..2 * n).contains(&q) {
            return Err(EmitError::malformed(format!(
                "`mul_shift_right` shift {q} out of range for `{ty}`"
            )));
        }

        let (_, _, lhs, rhs) = self.lower_operand_pair(Intrinsic::MulShiftRight, a, b)?;
        let pair = self.module.map_type_to_pair(ty)?;
        let type_id = self.module.map_type(ty)?;
        let multiply = if signed { Op::SMulExtended } else { Op::UMulExtended };
        let product = self.emit_value(multiply, pair, &[lhs, rhs])?;
        let low = self.emit_value_raw(Op::CompositeExtract, type_id, &[product.raw(), 0])?;
        let high = self.emit_value_raw(Op::CompositeExtract, type_id, &[product.raw(), 1])?;

        if q == 0 {
            Ok(low)
        } else if q < n {
            let down = self.module.emit_int_constant(ty, q)?;
            let up = self.module.emit_int_constant(ty, n - q)?;
            let low = self.emit_value(Op::ShiftRightLogical, type_id, &[low, down])?;
            let high = self.emit_value(Op::ShiftLeftLogical, type_id, &[high, up])?;
            self.emit_value(Op::BitwiseOr, type_id, &[low, high])
        } else if q == n {
            Ok(high)
        } else {
            let amount = self.module.emit_int_constant(ty, q - n)?;
            let shift = if signed {
                Op::ShiftRightArithmetic
            } else {
                Op::ShiftRightLogical
            };
            self.emit_value(shift, type_id, &[high, amount])
        }
    }

    /// `let a$ = a in let b$ = b in a$ + (b$ - a$) / 2`, valid for `b >= a`.
    fn lower_sorted_avg(&mut self, a: &Expr, b: &Expr) -> Result<Id, EmitError> {
        let ty = a.ty();
        let a_name = self.names.fresh("a");
        let b_name = self.names.fresh("b");
        let a_var = Expr::var(ty, a_name.clone());
        let b_var = Expr::var(ty, b_name.clone());
        let two = make_const(ty, 2);
        // b - a is non-negative, so truncation already rounds down.
        let half = if ty.is_float() {
            (b_var - a_var.clone()) / two
        } else {
            (b_var - a_var.clone()).div_round_to_zero(two)
        };
        let desugared = Expr::let_in(a_name, a.clone(), Expr::let_in(b_name, b.clone(), a_var + half));
        self.lower_expr(&desugared)
    }
}
