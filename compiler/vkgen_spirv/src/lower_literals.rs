//! Literal and name lowering.

use vkgen_ir::{Type, TypeCode};

use crate::emitter::Emitter;
use crate::encode::pack_string;
use crate::error::EmitError;
use crate::id::Id;
use crate::spirv::Op;

impl Emitter<'_> {
    pub(crate) fn lower_int_imm(&mut self, ty: Type, value: i64) -> Result<Id, EmitError> {
        if ty.is_bool() {
            return self.module.emit_bool_constant(value != 0);
        }
        self.module.emit_int_constant(ty, value)
    }

    /// Unsigned and boolean literals.
    #[allow(
        clippy::cast_possible_wrap,
        reason = "the bit pattern is what gets encoded"
    )]
    pub(crate) fn lower_uint_imm(&mut self, ty: Type, value: u64) -> Result<Id, EmitError> {
        match ty.code() {
            TypeCode::Bool => self.module.emit_bool_constant(value != 0),
            TypeCode::Float => Err(EmitError::malformed(format!(
                "unsigned literal of float type `{ty}`"
            ))),
            _ => self.module.emit_int_constant(ty, value as i64),
        }
    }

    pub(crate) fn lower_float_imm(&mut self, ty: Type, value: f64) -> Result<Id, EmitError> {
        self.module.emit_float_constant(ty, value)
    }

    /// `OpString`, written with the module-level definitions. Strings are
    /// never deduplicated.
    pub(crate) fn lower_string_imm(&mut self, text: &str) -> Result<Id, EmitError> {
        self.module.define(Op::String, &pack_string(text))
    }

    pub(crate) fn lower_variable(&mut self, name: &str) -> Result<Id, EmitError> {
        self.scope
            .lookup(name)
            .ok_or_else(|| EmitError::malformed(format!("unbound name `{name}`")))
    }
}
