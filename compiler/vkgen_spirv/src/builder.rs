//! Module-wide emission state shared by every kernel of one compile.
//!
//! `ModuleBuilder` owns the id counter, the segmented buffer and the type
//! and constant interners. Interning methods live next to their caches in
//! `types.rs` and `constants.rs`.

use crate::constants::ConstantCache;
use crate::encode::{ModuleBuffer, Segment};
use crate::error::EmitError;
use crate::id::{Id, IdAllocator};
use crate::spirv::Op;
use crate::types::TypeCache;

#[derive(Debug)]
pub struct ModuleBuilder {
    pub(crate) ids: IdAllocator,
    pub(crate) buffer: ModuleBuffer,
    pub(crate) types: TypeCache,
    pub(crate) constants: ConstantCache,
}

impl ModuleBuilder {
    pub fn new(version_word: u32) -> Self {
        Self {
            ids: IdAllocator::new(),
            buffer: ModuleBuffer::new(version_word),
            types: TypeCache::default(),
            constants: ConstantCache::default(),
        }
    }

    #[inline]
    pub fn allocate_id(&mut self) -> Id {
        self.ids.allocate()
    }

    pub fn buffer(&self) -> &ModuleBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut ModuleBuffer {
        &mut self.buffer
    }

    /// Allocate a result id and write `op [id, operands…]` to the
    /// types/constants segment.
    pub(crate) fn define(&mut self, op: Op, operands: &[u32]) -> Result<Id, EmitError> {
        let id = self.ids.allocate();
        let mut words = crate::encode::Operands::new();
        words.push(id.raw());
        words.extend_from_slice(operands);
        self.buffer.emit(Segment::Types, op, &words)?;
        Ok(id)
    }

    /// Allocate a result id and write `op [type, id, operands…]` to the
    /// types/constants segment.
    pub(crate) fn define_typed(
        &mut self,
        op: Op,
        type_id: Id,
        operands: &[u32],
    ) -> Result<Id, EmitError> {
        let id = self.ids.allocate();
        let mut words = crate::encode::Operands::new();
        words.push(type_id.raw());
        words.push(id.raw());
        words.extend_from_slice(operands);
        self.buffer.emit(Segment::Types, op, &words)?;
        Ok(id)
    }

    /// Header bound: one past the highest id allocated so far.
    pub fn bound(&self) -> u32 {
        self.ids.bound()
    }

    /// The finished word stream.
    pub fn finish(&self) -> Vec<u32> {
        self.buffer.finish(self.ids.bound())
    }
}
