//! Type interning.
//!
//! Every semantic type maps to exactly one type definition. Integer types
//! are always declared with signedness 0: the binary type of `intN` and
//! `uintN` is the same, and signedness is carried by opcode choice alone.
//! The cache key therefore collapses the sign, so both resolve to one id.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;
use vkgen_ir::{Type, TypeCode};

use crate::builder::ModuleBuilder;
use crate::error::EmitError;
use crate::id::Id;
use crate::spirv::{self, Op};

/// Interned type definitions.
#[derive(Debug, Default)]
pub struct TypeCache {
    base: FxHashMap<Type, Id>,
    pairs: FxHashMap<Type, Id>,
    local_pointers: FxHashMap<Type, Id>,
    functions: FxHashMap<(Id, SmallVec<[Id; 4]>), Id>,
    void: Option<Id>,
}

/// The cache key of `ty`: unsigned integers share the signed entry.
#[inline]
pub(crate) fn canonical(ty: Type) -> Type {
    if ty.is_uint() {
        Type::new(TypeCode::Int, ty.bits(), ty.lanes())
    } else {
        ty
    }
}

/// Reject types with no device representation.
fn check_representable(ty: Type) -> Result<(), EmitError> {
    let scalar_ok = match ty.code() {
        TypeCode::Int | TypeCode::UInt => matches!(ty.bits(), 8 | 16 | 32 | 64),
        TypeCode::Float => matches!(ty.bits(), 16 | 32 | 64),
        TypeCode::Bool => true,
        TypeCode::Handle => false,
    };
    let lanes_ok = matches!(ty.lanes(), 1 | 2 | 3 | 4 | 8 | 16);
    if scalar_ok && lanes_ok {
        Ok(())
    } else {
        Err(EmitError::UnsupportedType { ty })
    }
}

impl ModuleBuilder {
    /// The type id of `ty`, defining it on first use.
    pub fn map_type(&mut self, ty: Type) -> Result<Id, EmitError> {
        let key = canonical(ty);
        if let Some(&id) = self.types.base.get(&key) {
            return Ok(id);
        }
        check_representable(ty)?;

        let id = if ty.is_vector() {
            let element = self.map_type(ty.element_of())?;
            self.define(Op::TypeVector, &[element.raw(), u32::from(ty.lanes())])?
        } else {
            match ty.code() {
                TypeCode::Float => self.define(Op::TypeFloat, &[u32::from(ty.bits())])?,
                TypeCode::Bool => self.define(Op::TypeBool, &[])?,
                TypeCode::Int | TypeCode::UInt => {
                    self.define(Op::TypeInt, &[u32::from(ty.bits()), 0])?
                }
                TypeCode::Handle => return Err(EmitError::UnsupportedType { ty }),
            }
        };
        trace!(%ty, %id, "interned type");
        self.types.base.insert(key, id);
        Ok(id)
    }

    /// `struct { ty, ty }`, the result type of a widening multiply.
    pub fn map_type_to_pair(&mut self, ty: Type) -> Result<Id, EmitError> {
        let key = canonical(ty);
        if let Some(&id) = self.types.pairs.get(&key) {
            return Ok(id);
        }
        let base = self.map_type(ty)?;
        let id = self.define(Op::TypeStruct, &[base.raw(), base.raw()])?;
        trace!(%ty, %id, "interned pair type");
        self.types.pairs.insert(key, id);
        Ok(id)
    }

    /// Pointer to `ty` in function-local storage.
    pub fn map_pointer_type_local(&mut self, ty: Type) -> Result<Id, EmitError> {
        let key = canonical(ty);
        if let Some(&id) = self.types.local_pointers.get(&key) {
            return Ok(id);
        }
        let base = self.map_type(ty)?;
        let id = self.define(
            Op::TypePointer,
            &[spirv::STORAGE_CLASS_FUNCTION, base.raw()],
        )?;
        trace!(%ty, %id, "interned local pointer type");
        self.types.local_pointers.insert(key, id);
        Ok(id)
    }

    pub fn map_void(&mut self) -> Result<Id, EmitError> {
        if let Some(id) = self.types.void {
            return Ok(id);
        }
        let id = self.define(Op::TypeVoid, &[])?;
        self.types.void = Some(id);
        Ok(id)
    }

    /// Function type returning `ret` over `params`.
    pub fn map_function_type(&mut self, ret: Id, params: &[Id]) -> Result<Id, EmitError> {
        let key = (ret, SmallVec::from_slice(params));
        if let Some(&id) = self.types.functions.get(&key) {
            return Ok(id);
        }
        let mut operands: SmallVec<[u32; 8]> = SmallVec::with_capacity(params.len() + 1);
        operands.push(ret.raw());
        operands.extend(params.iter().map(|p| p.raw()));
        let id = self.define(Op::TypeFunction, &operands)?;
        trace!(%id, params = params.len(), "interned function type");
        self.types.functions.insert(key, id);
        Ok(id)
    }
}
