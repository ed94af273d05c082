//! Control flow lowering: conditionals, lets and serial loops.
//!
//! All control flow is structured. A conditional branch is preceded by
//! `OpSelectionMerge` naming its merge block, and a loop header carries
//! `OpLoopMerge` naming both the merge block and the continue target.
//! Every label is a fresh id used only as a branch target.

use tracing::trace;
use vkgen_ir::{Expr, ForKind, Stmt, Type};

use crate::emitter::Emitter;
use crate::error::EmitError;
use crate::id::Id;
use crate::options::LoopBound;
use crate::spirv::{self, Op};

/// Labels of an if/then/else diamond.
struct Diamond {
    then_label: Id,
    else_label: Id,
    merge_label: Id,
}

impl Emitter<'_> {
    // -----------------------------------------------------------------------
    // Conditionals
    // -----------------------------------------------------------------------

    /// Lower a scalar boolean condition.
    fn lower_condition(&mut self, condition: &Expr) -> Result<Id, EmitError> {
        let ty = condition.ty();
        if !ty.is_bool() || ty.is_vector() {
            return Err(EmitError::malformed(format!(
                "branch condition of type `{ty}`"
            )));
        }
        self.lower_expr(condition)
    }

    /// Emit the selection header: merge declaration and conditional branch.
    fn open_diamond(&mut self, condition: Id) -> Result<Diamond, EmitError> {
        let diamond = Diamond {
            then_label: self.new_label(),
            else_label: self.new_label(),
            merge_label: self.new_label(),
        };
        trace!(
            then = %diamond.then_label,
            else_ = %diamond.else_label,
            merge = %diamond.merge_label,
            "selection labels"
        );
        self.emit(
            Op::SelectionMerge,
            &[diamond.merge_label.raw(), spirv::SELECTION_CONTROL_NONE],
        )?;
        self.emit(
            Op::BranchConditional,
            &[
                condition.raw(),
                diamond.then_label.raw(),
                diamond.else_label.raw(),
            ],
        )?;
        Ok(diamond)
    }

    /// `select(c, t, f)` and `if_then_else(c, t, f)`.
    ///
    /// Only the taken arm is evaluated. The phi names the block each arm
    /// ends in, which differs from the arm's label when the arm itself
    /// contains control flow. Vector forms are scalarized lane by lane.
    pub(crate) fn lower_select(
        &mut self,
        expr: &Expr,
        condition: &Expr,
        then_value: &Expr,
        else_value: &Expr,
    ) -> Result<Id, EmitError> {
        let ty = expr.ty();
        if then_value.ty() != else_value.ty() {
            return Err(EmitError::malformed(format!(
                "select arms have types `{}` and `{}`",
                then_value.ty(),
                else_value.ty()
            )));
        }
        let condition_ty = condition.ty();
        if condition_ty.is_vector() && condition_ty.lanes() != ty.lanes() {
            return Err(EmitError::malformed(format!(
                "select condition of type `{condition_ty}` over arms of type `{ty}`"
            )));
        }
        if ty.is_vector() {
            return self.scalarize(expr);
        }
        let type_id = self.module.map_type(ty)?;
        let cond = self.lower_condition(condition)?;
        let diamond = self.open_diamond(cond)?;

        self.emit_label(diamond.then_label)?;
        let then_id = self.lower_expr(then_value)?;
        let then_exit = self.current_block;
        self.emit_branch(diamond.merge_label)?;

        self.emit_label(diamond.else_label)?;
        let else_id = self.lower_expr(else_value)?;
        let else_exit = self.current_block;
        self.emit_branch(diamond.merge_label)?;

        self.emit_label(diamond.merge_label)?;
        self.emit_value(Op::Phi, type_id, &[then_id, then_exit, else_id, else_exit])
    }

    /// Statement form: no phi; a missing else arm is an empty block.
    pub(crate) fn lower_if_stmt(
        &mut self,
        condition: &Expr,
        then_case: &Stmt,
        else_case: Option<&Stmt>,
    ) -> Result<(), EmitError> {
        let cond = self.lower_condition(condition)?;
        let diamond = self.open_diamond(cond)?;

        self.emit_label(diamond.then_label)?;
        self.lower_stmt(then_case)?;
        self.emit_branch(diamond.merge_label)?;

        self.emit_label(diamond.else_label)?;
        if let Some(else_case) = else_case {
            self.lower_stmt(else_case)?;
        }
        self.emit_branch(diamond.merge_label)?;

        self.emit_label(diamond.merge_label)
    }

    // -----------------------------------------------------------------------
    // Let bindings
    // -----------------------------------------------------------------------

    /// `let name = value in body`: `value` is evaluated exactly once.
    pub(crate) fn lower_let(&mut self, name: &str, value: &Expr, body: &Expr) -> Result<Id, EmitError> {
        let value_id = self.lower_expr(value)?;
        self.with_binding(name, value_id, |this| this.lower_expr(body))
    }

    pub(crate) fn lower_let_stmt(
        &mut self,
        name: &str,
        value: &Expr,
        body: &Stmt,
    ) -> Result<(), EmitError> {
        let value_id = self.lower_expr(value)?;
        self.with_binding(name, value_id, |this| this.lower_stmt(body))
    }

    // -----------------------------------------------------------------------
    // Loops
    // -----------------------------------------------------------------------

    /// Serial counted loop over an `int32` induction variable.
    ///
    /// ```text
    ///        store var, min
    ///        br header
    /// header: loop_merge merge, continue
    ///        br top
    /// top:   cur = load var
    ///        br_cond (cur < bound), body, merge
    /// body:  …                  ; name bound to cur
    ///        br continue
    /// continue:
    ///        store var, cur + 1
    ///        br header
    /// merge:
    /// ```
    pub(crate) fn lower_for(
        &mut self,
        name: &str,
        min: &Expr,
        extent: &Expr,
        kind: ForKind,
        body: &Stmt,
    ) -> Result<(), EmitError> {
        if kind != ForKind::Serial {
            return Err(EmitError::unsupported(format!("`{}` loop", kind.name())));
        }
        let int32 = Type::int(32);
        if min.ty() != int32 || extent.ty() != int32 {
            return Err(EmitError::malformed(format!(
                "loop `{name}` bounds have types `{}` and `{}`, expected `int32`",
                min.ty(),
                extent.ty()
            )));
        }
        let int_id = self.module.map_type(int32)?;
        let bool_id = self.module.map_type(Type::bool())?;

        let min_id = self.lower_expr(min)?;
        let extent_id = self.lower_expr(extent)?;
        let bound = self.emit_value(Op::IAdd, int_id, &[min_id, extent_id])?;
        let var = self.declare_local(int32)?;
        self.emit(Op::Store, &[var.raw(), min_id.raw()])?;

        let header = self.new_label();
        let top = self.new_label();
        let body_label = self.new_label();
        let continue_label = self.new_label();
        let merge = self.new_label();
        trace!(
            loop_name = name,
            %header,
            %top,
            body = %body_label,
            continue_ = %continue_label,
            %merge,
            "loop labels"
        );

        self.emit_branch(header)?;
        self.emit_label(header)?;
        self.emit(
            Op::LoopMerge,
            &[merge.raw(), continue_label.raw(), spirv::LOOP_CONTROL_NONE],
        )?;
        self.emit_branch(top)?;

        self.emit_label(top)?;
        let current = self.emit_value(Op::Load, int_id, &[var])?;
        let compare = match self.options.loop_bound {
            LoopBound::Exclusive => Op::SLessThan,
            LoopBound::Inclusive => Op::SLessThanEqual,
        };
        let test = self.emit_value(compare, bool_id, &[current, bound])?;
        self.emit(
            Op::BranchConditional,
            &[test.raw(), body_label.raw(), merge.raw()],
        )?;

        self.emit_label(body_label)?;
        self.with_binding(name, current, |this| this.lower_stmt(body))?;
        self.emit_branch(continue_label)?;

        self.emit_label(continue_label)?;
        let one = self.module.emit_int_constant(int32, 1)?;
        let next = self.emit_value(Op::IAdd, int_id, &[current, one])?;
        self.emit(Op::Store, &[var.raw(), next.raw()])?;
        self.emit_branch(header)?;

        self.emit_label(merge)
    }
}
