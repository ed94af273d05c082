//! Error types for device code emission and module validation.
//!
//! Emission errors fall into two classes. Internal/unsupported errors mean
//! the IR reached this backend in a shape it cannot lower; they indicate a
//! bug or missing feature upstream. User errors ([`UserError`]) are caused
//! by the kernel source itself and are reported to the kernel author.
//! Either way the compile is aborted and the emitter state discarded.

use thiserror::Error;
use vkgen_ir::Type;

/// Errors caused by the kernel program rather than the compiler.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UserError {
    /// Integer or float division/modulo whose divisor is a literal zero.
    #[error("division by zero in `{expr}`")]
    DivisionByZero { expr: String },
}

/// Fatal emission error.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EmitError {
    /// A type with no device representation (handles, unsupported widths).
    #[error("type `{ty}` has no device representation")]
    UnsupportedType { ty: Type },

    /// A node or intrinsic this backend does not lower.
    #[error("{construct} is not supported in device code")]
    UnsupportedConstruct { construct: String },

    /// A node upstream lowering should have removed before device codegen.
    #[error("{node} reached device codegen; it must be lowered before this stage")]
    UnresolvedNode { node: &'static str },

    /// Structurally invalid IR: unbound names, wrong arity, bad operand types.
    #[error("malformed IR: {0}")]
    MalformedIr(String),

    #[error(transparent)]
    User(#[from] UserError),
}

impl EmitError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        EmitError::UnsupportedConstruct {
            construct: construct.into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        EmitError::MalformedIr(message.into())
    }

    /// True when the error should be reported to the kernel author.
    pub fn is_user_error(&self) -> bool {
        matches!(self, EmitError::User(_))
    }
}

/// A structural defect found while reading back a finished module.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("module has {words} words, fewer than the header")]
    Truncated { words: usize },

    #[error("bad magic number {found:#010x}")]
    BadMagic { found: u32 },

    #[error("instruction at word {offset} has a zero word count")]
    ZeroWordCount { offset: usize },

    #[error("instruction at word {offset} needs {count} words but the module ends at {len}")]
    Overrun {
        offset: usize,
        count: usize,
        len: usize,
    },

    #[error("{op} at word {offset} is missing its result id")]
    MissingResult { op: &'static str, offset: usize },

    #[error("{op} at word {offset} defines the reserved id 0")]
    ReservedId { op: &'static str, offset: usize },

    #[error("id %{id} is defined twice (second definition at word {offset})")]
    DuplicateDefinition { id: u32, offset: usize },

    #[error("id %{id} is not below the header bound {bound}")]
    IdOutOfBounds { id: u32, bound: u32 },
}
