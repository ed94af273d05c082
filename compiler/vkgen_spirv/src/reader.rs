//! Reading finished modules back: instruction decoding, structural
//! validation and a text listing for debugging.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::error::ValidationError;
use crate::spirv::{self, Op};

/// One decoded instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction<'a> {
    /// Word offset of the instruction within the stream it was read from.
    pub offset: usize,
    pub opcode: u16,
    /// `None` for opcodes outside the emitted subset.
    pub op: Option<Op>,
    pub operands: &'a [u32],
}

impl Instruction<'_> {
    /// The result id, for opcodes that define one.
    pub fn result_id(&self) -> Option<u32> {
        let index = self.op?.result_layout().result_index()?;
        self.operands.get(index).copied()
    }

    /// The result type id, for opcodes that carry one.
    pub fn result_type(&self) -> Option<u32> {
        match self.op?.result_layout() {
            spirv::ResultLayout::TypedId => self.operands.first().copied(),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.op.map_or("Op?", Op::name)
    }
}

/// Iterator over the instructions of a word stream.
///
/// Stops after the first malformed instruction.
pub struct Instructions<'a> {
    words: &'a [u32],
    offset: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    /// Instructions of a whole module, skipping its header.
    pub fn new(words: &'a [u32]) -> Self {
        Self {
            words,
            offset: spirv::HEADER_WORDS.min(words.len()),
            failed: false,
        }
    }

    /// Instructions of a headerless segment.
    pub fn segment(words: &'a [u32]) -> Self {
        Self {
            words,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ValidationError>;

    #[allow(clippy::cast_possible_truncation, reason = "opcode is masked to 16 bits")]
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.words.len() {
            return None;
        }
        let offset = self.offset;
        let first = self.words[offset];
        let count = (first >> 16) as usize;
        let opcode = (first & 0xFFFF) as u16;
        if count == 0 {
            self.failed = true;
            return Some(Err(ValidationError::ZeroWordCount { offset }));
        }
        if offset + count > self.words.len() {
            self.failed = true;
            return Some(Err(ValidationError::Overrun {
                offset,
                count,
                len: self.words.len(),
            }));
        }
        self.offset += count;
        Some(Ok(Instruction {
            offset,
            opcode,
            op: Op::from_u16(opcode),
            operands: &self.words[offset + 1..offset + count],
        }))
    }
}

/// Summary of a validated module.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleStats {
    pub instructions: usize,
    /// Highest result id defined; 0 for a module with no definitions.
    pub max_id: u32,
    pub bound: u32,
}

/// Check the header, instruction framing, single assignment and the id
/// bound of a finished module.
pub fn validate(words: &[u32]) -> Result<ModuleStats, ValidationError> {
    if words.len() < spirv::HEADER_WORDS {
        return Err(ValidationError::Truncated { words: words.len() });
    }
    if words[0] != spirv::MAGIC_NUMBER {
        return Err(ValidationError::BadMagic { found: words[0] });
    }
    let bound = words[spirv::BOUND_INDEX];

    let mut defined = FxHashSet::default();
    let mut instructions = 0;
    let mut max_id = 0;
    for inst in Instructions::new(words) {
        let inst = inst?;
        instructions += 1;
        let Some(op) = inst.op else { continue };
        if op.result_layout() == spirv::ResultLayout::None {
            continue;
        }
        let id = inst.result_id().ok_or(ValidationError::MissingResult {
            op: op.name(),
            offset: inst.offset,
        })?;
        if id == 0 {
            return Err(ValidationError::ReservedId {
                op: op.name(),
                offset: inst.offset,
            });
        }
        if !defined.insert(id) {
            return Err(ValidationError::DuplicateDefinition {
                id,
                offset: inst.offset,
            });
        }
        if id >= bound {
            return Err(ValidationError::IdOutOfBounds { id, bound });
        }
        max_id = max_id.max(id);
    }
    Ok(ModuleStats {
        instructions,
        max_id,
        bound,
    })
}

/// Render a module as text, one instruction per line.
///
/// ```text
/// ; version 1.0, bound 12
///    %1 = OpTypeInt 32 0
///    %3 = OpConstant %1 7
///         OpStore 9 3
/// ```
///
/// Operands other than the result type and id are printed as raw words.
pub fn disassemble(words: &[u32]) -> String {
    Listing(words).to_string()
}

struct Listing<'a>(&'a [u32]);

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = self.0;
        if words.len() >= spirv::HEADER_WORDS {
            let version = words[1];
            writeln!(
                f,
                "; version {}.{}, bound {}",
                (version >> 16) & 0xFF,
                (version >> 8) & 0xFF,
                words[spirv::BOUND_INDEX]
            )?;
        }
        for inst in Instructions::new(words) {
            let inst = match inst {
                Ok(inst) => inst,
                Err(err) => return writeln!(f, "; error: {err}"),
            };
            let mut operands = inst.operands.iter();
            match inst.op.map(Op::result_layout) {
                Some(spirv::ResultLayout::TypedId) => {
                    let ty = operands.next().copied().unwrap_or(0);
                    let id = operands.next().copied().unwrap_or(0);
                    write!(f, "{:>5} = {} %{ty}", format!("%{id}"), inst.name())?;
                }
                Some(spirv::ResultLayout::Id) => {
                    let id = operands.next().copied().unwrap_or(0);
                    write!(f, "{:>5} = {}", format!("%{id}"), inst.name())?;
                }
                Some(spirv::ResultLayout::None) => write!(f, "        {}", inst.name())?,
                None => write!(f, "        Op{}", inst.opcode)?,
            }
            for word in operands {
                write!(f, " {word}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Reassemble little-endian bytes into words; a trailing partial word is
/// dropped.
pub fn words_from_bytes(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}
