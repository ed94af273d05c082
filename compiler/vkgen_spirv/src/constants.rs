//! Constant interning.
//!
//! A constant is keyed on its canonical type and its raw little-endian byte
//! image, so a given value of a given type is defined once per module no
//! matter how many times a kernel mentions it.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;
use vkgen_ir::{Type, TypeCode};

use crate::builder::ModuleBuilder;
use crate::encode::pack_bytes;
use crate::error::EmitError;
use crate::id::Id;
use crate::spirv::Op;
use crate::types::canonical;

/// Interning key: type tag, bit width, lane count, then the value bytes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ConstantKey {
    tag: u8,
    bits: u8,
    lanes: u16,
    bytes: SmallVec<[u8; 16]>,
}

impl ConstantKey {
    fn new(ty: Type, bytes: &[u8]) -> Self {
        let ty = canonical(ty);
        Self {
            tag: ty.code().tag(),
            bits: ty.bits(),
            lanes: ty.lanes(),
            bytes: SmallVec::from_slice(bytes),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConstantCache {
    values: FxHashMap<ConstantKey, Id>,
    nulls: FxHashMap<Type, Id>,
}

/// The low `len` bytes of a little-endian image.
fn truncate_le(bytes: [u8; 8], len: usize) -> SmallVec<[u8; 8]> {
    SmallVec::from_slice(&bytes[..len.min(8)])
}

impl ModuleBuilder {
    /// The id of the constant of type `ty` whose bit pattern is `bytes`
    /// (little-endian, `ty.bytes()` long). Vector constants are built from
    /// one scalar constant per lane.
    pub fn emit_constant(&mut self, ty: Type, bytes: &[u8]) -> Result<Id, EmitError> {
        let lane_bytes = ty.lane_bytes();
        if bytes.len() != lane_bytes * usize::from(ty.lanes()) {
            return Err(EmitError::malformed(format!(
                "constant of type `{ty}` given {} bytes",
                bytes.len()
            )));
        }
        let key = ConstantKey::new(ty, bytes);
        if let Some(&id) = self.constants.values.get(&key) {
            return Ok(id);
        }

        let type_id = self.map_type(ty)?;
        let id = if ty.is_vector() {
            let mut lanes: SmallVec<[u32; 16]> = SmallVec::new();
            for chunk in bytes.chunks(lane_bytes) {
                lanes.push(self.emit_constant(ty.element_of(), chunk)?.raw());
            }
            self.define_typed(Op::ConstantComposite, type_id, &lanes)?
        } else if ty.is_bool() {
            let op = if bytes.iter().any(|&b| b != 0) {
                Op::ConstantTrue
            } else {
                Op::ConstantFalse
            };
            self.define_typed(op, type_id, &[])?
        } else {
            self.define_typed(Op::Constant, type_id, &pack_bytes(bytes))?
        };
        trace!(%ty, %id, "interned constant");
        self.constants.values.insert(key, id);
        Ok(id)
    }

    /// Integer constant of scalar or vector type `ty`; every lane holds
    /// `value` truncated to the lane width.
    pub fn emit_int_constant(&mut self, ty: Type, value: i64) -> Result<Id, EmitError> {
        if ty.is_handle() {
            return Err(EmitError::UnsupportedType { ty });
        }
        if !ty.is_int_or_uint() {
            return Err(EmitError::malformed(format!(
                "integer constant of non-integer type `{ty}`"
            )));
        }
        let lane = truncate_le(value.to_le_bytes(), ty.lane_bytes());
        self.emit_splat(ty, &lane)
    }

    /// Float constant narrowed to the width of `ty`.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "narrowing the literal to its declared width is the intent"
    )]
    pub fn emit_float_constant(&mut self, ty: Type, value: f64) -> Result<Id, EmitError> {
        let lane: SmallVec<[u8; 8]> = match (ty.code(), ty.bits()) {
            (TypeCode::Float, 32) => SmallVec::from_slice(&(value as f32).to_le_bytes()),
            (TypeCode::Float, 64) => SmallVec::from_slice(&value.to_le_bytes()),
            (TypeCode::Float, _) => {
                return Err(EmitError::unsupported(format!("{}-bit float literal", ty.bits())))
            }
            _ => {
                return Err(EmitError::malformed(format!(
                    "float constant of non-float type `{ty}`"
                )))
            }
        };
        self.emit_splat(ty, &lane)
    }

    pub fn emit_bool_constant(&mut self, value: bool) -> Result<Id, EmitError> {
        self.emit_constant(Type::bool(), &[u8::from(value)])
    }

    /// `uint32` constant, used for lane indices.
    pub fn emit_u32_constant(&mut self, value: u32) -> Result<Id, EmitError> {
        self.emit_constant(Type::uint(32), &value.to_le_bytes())
    }

    /// The all-zero value of `ty`.
    pub fn null_constant(&mut self, ty: Type) -> Result<Id, EmitError> {
        let key = canonical(ty);
        if let Some(&id) = self.constants.nulls.get(&key) {
            return Ok(id);
        }
        let type_id = self.map_type(ty)?;
        let id = self.define_typed(Op::ConstantNull, type_id, &[])?;
        trace!(%ty, %id, "interned null constant");
        self.constants.nulls.insert(key, id);
        Ok(id)
    }

    /// Repeat one lane image over every lane of `ty`.
    fn emit_splat(&mut self, ty: Type, lane: &[u8]) -> Result<Id, EmitError> {
        let bytes: SmallVec<[u8; 16]> = lane
            .iter()
            .copied()
            .cycle()
            .take(lane.len() * usize::from(ty.lanes()))
            .collect();
        self.emit_constant(ty, &bytes)
    }
}
