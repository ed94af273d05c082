//! Instruction encoding and the segmented module buffer.
//!
//! A module is assembled from four segments written independently and
//! concatenated at the end: the header, entry point declarations (filled in
//! by a downstream finalizer), type/constant definitions, and code. Type
//! and constant definitions may be interned at any point during code
//! emission, so keeping them in their own segment is what guarantees every
//! definition precedes its first use in the final stream.

use smallvec::SmallVec;

use crate::error::EmitError;
use crate::spirv::{self, Op};

/// Operand words of one instruction. Most instructions fit inline.
pub type Operands = SmallVec<[u32; 8]>;

/// Append `op` with `operands` to `out`.
///
/// The first word packs the word count (operands + 1) in the high half and
/// the opcode in the low half.
pub fn encode(out: &mut Vec<u32>, op: Op, operands: &[u32]) -> Result<(), EmitError> {
    let word_count = u16::try_from(operands.len() + 1).map_err(|_| {
        EmitError::malformed(format!(
            "{} with {} operands exceeds the instruction size limit",
            op.name(),
            operands.len()
        ))
    })?;
    out.reserve(operands.len() + 1);
    out.push((u32::from(word_count) << 16) | u32::from(op as u16));
    out.extend_from_slice(operands);
    Ok(())
}

/// Pack bytes four per word, little-endian, zero-padding the final word.
pub fn pack_bytes(bytes: &[u8]) -> Operands {
    bytes
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect()
}

/// Pack a NUL-terminated literal string.
pub fn pack_string(text: &str) -> Operands {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
    pack_bytes(&bytes)
}

/// Serialize words as little-endian bytes.
pub fn words_to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

/// Module-level segment an instruction is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment {
    EntryPoints,
    Types,
    Code,
}

/// The four segments of a module under construction.
#[derive(Debug)]
pub struct ModuleBuffer {
    header: [u32; spirv::HEADER_WORDS],
    entry_points: Vec<u32>,
    types: Vec<u32>,
    code: Vec<u32>,
}

impl ModuleBuffer {
    /// A buffer whose header carries `version_word` and a zero bound
    /// placeholder.
    pub fn new(version_word: u32) -> Self {
        Self {
            header: [
                spirv::MAGIC_NUMBER,
                version_word,
                spirv::SOURCE_LANGUAGE_UNKNOWN,
                0,
                0,
            ],
            entry_points: Vec::new(),
            types: Vec::new(),
            code: Vec::new(),
        }
    }

    /// Append one instruction to `segment`.
    pub fn emit(&mut self, segment: Segment, op: Op, operands: &[u32]) -> Result<(), EmitError> {
        encode(self.segment_mut(segment), op, operands)
    }

    /// Append pre-encoded words to `segment`.
    pub fn append(&mut self, segment: Segment, words: &[u32]) {
        self.segment_mut(segment).extend_from_slice(words);
    }

    pub fn segment(&self, segment: Segment) -> &[u32] {
        match segment {
            Segment::EntryPoints => &self.entry_points,
            Segment::Types => &self.types,
            Segment::Code => &self.code,
        }
    }

    pub fn segment_mut(&mut self, segment: Segment) -> &mut Vec<u32> {
        match segment {
            Segment::EntryPoints => &mut self.entry_points,
            Segment::Types => &mut self.types,
            Segment::Code => &mut self.code,
        }
    }

    /// Concatenate the segments with `bound` patched into the header.
    pub fn finish(&self, bound: u32) -> Vec<u32> {
        let mut words = Vec::with_capacity(
            spirv::HEADER_WORDS + self.entry_points.len() + self.types.len() + self.code.len(),
        );
        words.extend_from_slice(&self.header);
        words[spirv::BOUND_INDEX] = bound;
        words.extend_from_slice(&self.entry_points);
        words.extend_from_slice(&self.types);
        words.extend_from_slice(&self.code);
        words
    }
}
