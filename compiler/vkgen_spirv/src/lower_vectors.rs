//! Vector construction, shuffles and the scalarization fallback.

use smallvec::SmallVec;
use tracing::trace;
use vkgen_ir::{extract_lane, hoist_let, Expr};

use crate::emitter::Emitter;
use crate::error::EmitError;
use crate::id::Id;
use crate::lower_operators::OperandKind;
use crate::spirv::Op;

impl Emitter<'_> {
    /// `ramp(base, stride, lanes)`: each lane is the previous lane plus
    /// `stride`, built by repeated addition.
    pub(crate) fn lower_ramp(
        &mut self,
        expr: &Expr,
        base: &Expr,
        stride: &Expr,
        lanes: u16,
    ) -> Result<Id, EmitError> {
        if lanes == 0 {
            return Err(EmitError::malformed("ramp of zero lanes"));
        }
        if lanes == 1 {
            return self.lower_expr(base);
        }
        if base.ty().is_vector() || stride.ty().is_vector() {
            return self.scalarize(expr);
        }
        let element = base.ty();
        let add = match OperandKind::of(element)? {
            OperandKind::Float => Op::FAdd,
            OperandKind::Signed | OperandKind::Unsigned => Op::IAdd,
            OperandKind::Bool => {
                return Err(EmitError::malformed(format!("ramp over `{element}`")))
            }
        };
        let element_id = self.module.map_type(element)?;
        let base_id = self.lower_expr(base)?;
        let stride_id = self.lower_expr(stride)?;

        let mut lane_ids: SmallVec<[Id; 16]> = SmallVec::with_capacity(usize::from(lanes));
        lane_ids.push(base_id);
        let mut previous = base_id;
        for _ in 1..lanes {
            previous = self.emit_value(add, element_id, &[previous, stride_id])?;
            lane_ids.push(previous);
        }
        self.emit_typed(Op::CompositeConstruct, expr.ty(), &lane_ids)
    }

    /// `broadcast(value, lanes)`: one composite with `value` in every lane.
    pub(crate) fn lower_broadcast(
        &mut self,
        expr: &Expr,
        value: &Expr,
        lanes: u16,
    ) -> Result<Id, EmitError> {
        if lanes == 0 {
            return Err(EmitError::malformed("broadcast of zero lanes"));
        }
        if lanes == 1 {
            return self.lower_expr(value);
        }
        if value.ty().is_vector() {
            return self.scalarize(expr);
        }
        let value_id = self.lower_expr(value)?;
        let lane_ids: SmallVec<[Id; 16]> = SmallVec::from_elem(value_id, usize::from(lanes));
        self.emit_typed(Op::CompositeConstruct, expr.ty(), &lane_ids)
    }

    /// Shuffles of one or two vectors.
    pub(crate) fn lower_shuffle(
        &mut self,
        expr: &Expr,
        vectors: &[Expr],
        indices: &[u32],
    ) -> Result<Id, EmitError> {
        let (first, rest) = match vectors {
            [] => return Err(EmitError::malformed("shuffle of no vectors")),
            [first, rest @ ..] if rest.len() <= 1 => (first, rest),
            _ => {
                return Err(EmitError::unsupported(format!(
                    "shuffle of {} vectors",
                    vectors.len()
                )))
            }
        };
        let element = first.ty().element_of();
        if rest.iter().any(|v| v.ty().element_of() != element) {
            return Err(EmitError::malformed("shuffle inputs differ in element type"));
        }
        if indices.is_empty() {
            return Err(EmitError::malformed("shuffle with no indices"));
        }
        let total: u32 = vectors.iter().map(|v| u32::from(v.ty().lanes())).sum();
        if let Some(bad) = indices.iter().find(|&&i| i >= total) {
            return Err(EmitError::malformed(format!(
                "shuffle index {bad} out of range for {total} input lanes"
            )));
        }

        // A single index is an element extraction from whichever input
        // holds it.
        if let [index] = indices {
            let first_lanes = u32::from(first.ty().lanes());
            let (source, lane) = match rest {
                [second] if *index >= first_lanes => (second, index - first_lanes),
                _ => (first, *index),
            };
            let element_id = self.module.map_type(element)?;
            let vector = self.lower_expr(source)?;
            return self.emit_value_raw(Op::CompositeExtract, element_id, &[vector.raw(), lane]);
        }

        let result_id = self.module.map_type(expr.ty())?;
        let v0 = self.lower_expr(first)?;
        let v1 = match rest {
            [second] => self.lower_expr(second)?,
            _ => v0,
        };
        let mut operands: SmallVec<[u32; 18]> = SmallVec::with_capacity(indices.len() + 2);
        operands.push(v0.raw());
        operands.push(v1.raw());
        operands.extend_from_slice(indices);
        self.emit_value_raw(Op::VectorShuffle, result_id, &operands)
    }

    /// Evaluate `expr` one lane at a time, inserting each scalar into a
    /// vector that starts as the null value of the result type.
    ///
    /// Let bindings inside `expr` are lifted out first and their values
    /// lowered once, ahead of the lane loop.
    pub(crate) fn scalarize(&mut self, expr: &Expr) -> Result<Id, EmitError> {
        let ty = expr.ty();
        if !ty.is_vector() {
            return Err(EmitError::malformed(format!(
                "scalarizing {} of scalar type `{ty}`",
                expr.kind_name()
            )));
        }
        if let Some(hoisted) = hoist_let(expr, &mut self.names) {
            trace!(name = %hoisted.name, "hoisted let out of scalarized expression");
            let value = self.lower_expr(&hoisted.value)?;
            return self.with_binding(&hoisted.name, value, |this| this.scalarize(&hoisted.rest));
        }
        let vector_type = self.module.map_type(ty)?;
        let mut vector = self.module.null_constant(ty)?;
        for lane in 0..ty.lanes() {
            let scalar_expr = extract_lane(expr, lane);
            if scalar_expr.ty().is_vector() {
                return Err(EmitError::unsupported(format!(
                    "scalarizing {} of `{ty}`",
                    expr.kind_name()
                )));
            }
            let scalar = self.lower_expr(&scalar_expr)?;
            let index = self.module.emit_u32_constant(u32::from(lane))?;
            vector = self.emit_value(
                Op::VectorInsertDynamic,
                vector_type,
                &[vector, scalar, index],
            )?;
        }
        Ok(vector)
    }
}
