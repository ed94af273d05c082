//! Emission options.

use std::fmt;

use crate::spirv;

/// Environment variable that turns on disassembly dumps.
pub const DUMP_ENV_VAR: &str = "VKGEN_DUMP_SPIRV";

/// Comparison used by the loop test of a serial `for`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopBound {
    /// `i < min + extent`: the loop runs `extent` times.
    #[default]
    Exclusive,
    /// `i <= min + extent`: one extra iteration. Kept for kernels compiled
    /// against the earlier device backend.
    Inclusive,
}

impl fmt::Display for LoopBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exclusive => write!(f, "exclusive"),
            Self::Inclusive => write!(f, "inclusive"),
        }
    }
}

/// Configuration for one module compile.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// SPIR-V `(major, minor)` version written to the header.
    pub version: (u8, u8),
    /// Loop test comparison.
    pub loop_bound: LoopBound,
    /// Read the module back and check it in `compile_to_binary`.
    pub validate: bool,
    /// Print a disassembly of the finished module to stderr.
    pub dump: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            version: (1, 0),
            loop_bound: LoopBound::Exclusive,
            validate: true,
            dump: false,
        }
    }
}

impl EmitOptions {
    /// Defaults, with `dump` enabled when `VKGEN_DUMP_SPIRV` is non-empty.
    #[must_use]
    pub fn from_env() -> Self {
        let dump = std::env::var(DUMP_ENV_VAR).is_ok_and(|v| !v.is_empty());
        Self::default().with_dump(dump)
    }

    #[must_use]
    pub fn with_version(mut self, major: u8, minor: u8) -> Self {
        self.version = (major, minor);
        self
    }

    #[must_use]
    pub fn with_loop_bound(mut self, loop_bound: LoopBound) -> Self {
        self.loop_bound = loop_bound;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    #[must_use]
    pub fn with_dump(mut self, dump: bool) -> Self {
        self.dump = dump;
        self
    }

    /// The header version word.
    pub fn version_word(&self) -> u32 {
        spirv::version_word(self.version.0, self.version.1)
    }
}
