//! Kernel driver: one module compile, many kernels.
//!
//! `DeviceCodegen` writes the module header on construction, turns each
//! kernel body into a function with `add_kernel`, and serializes the module
//! with `compile_to_binary`. Capability, memory model and entry point
//! declarations belong to a downstream finalizer, which writes them through
//! [`DeviceCodegen::entry_points_mut`].

use std::fmt;

use smallvec::SmallVec;
use tracing::{debug, instrument};
use vkgen_ir::{Stmt, Type};

use crate::builder::ModuleBuilder;
use crate::emitter::Emitter;
use crate::encode::{encode, words_to_bytes, Segment};
use crate::error::{EmitError, ValidationError};
use crate::id::Id;
use crate::options::EmitOptions;
use crate::reader;
use crate::scope::Scope;
use crate::spirv::{self, Op};
use crate::zero_divisor;

/// How a kernel argument is passed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// Passed by value as a function parameter.
    Scalar,
    /// A device buffer; bound through the descriptor ABI, not a parameter.
    Buffer,
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Buffer => write!(f, "buffer"),
        }
    }
}

/// One argument of a kernel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceArgument {
    pub name: String,
    pub ty: Type,
    pub kind: ArgKind,
}

impl DeviceArgument {
    pub fn scalar(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ArgKind::Scalar,
        }
    }

    pub fn buffer(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            kind: ArgKind::Buffer,
        }
    }
}

/// Device code generator for one module.
///
/// Not reusable across modules: construct a fresh instance per compile.
/// A failed `add_kernel` leaves earlier kernels intact.
pub struct DeviceCodegen {
    options: EmitOptions,
    module: ModuleBuilder,
    current_kernel: Option<String>,
}

impl DeviceCodegen {
    pub fn new(options: EmitOptions) -> Self {
        let module = ModuleBuilder::new(options.version_word());
        Self {
            options,
            module,
            current_kernel: None,
        }
    }

    pub fn options(&self) -> &EmitOptions {
        &self.options
    }

    /// Name of the kernel most recently passed to [`add_kernel`](Self::add_kernel).
    pub fn current_kernel_name(&self) -> Option<&str> {
        self.current_kernel.as_deref()
    }

    /// Entry point segment, for the downstream finalizer.
    pub fn entry_points_mut(&mut self) -> &mut Vec<u32> {
        self.module.buffer_mut().segment_mut(Segment::EntryPoints)
    }

    /// Lower `body` into a function named `name` and return its id.
    ///
    /// Scalar arguments become function parameters bound by name; buffer
    /// arguments are left to the descriptor ABI. The code segment is only
    /// extended once the whole kernel has lowered successfully.
    #[instrument(level = "debug", skip_all, fields(kernel = name))]
    pub fn add_kernel(
        &mut self,
        body: &Stmt,
        name: &str,
        args: &[DeviceArgument],
    ) -> Result<Id, EmitError> {
        self.current_kernel = Some(name.to_owned());
        zero_divisor::check_kernel(body)?;

        let scalars: SmallVec<[&DeviceArgument; 8]> =
            args.iter().filter(|a| a.kind == ArgKind::Scalar).collect();
        let mut param_types: SmallVec<[Id; 8]> = SmallVec::with_capacity(scalars.len());
        for arg in &scalars {
            param_types.push(self.module.map_type(arg.ty)?);
        }
        let void = self.module.map_void()?;
        let function_type = self.module.map_function_type(void, &param_types)?;

        let mut words = Vec::new();
        let function = self.module.allocate_id();
        encode(
            &mut words,
            Op::Function,
            &[
                void.raw(),
                function.raw(),
                spirv::FUNCTION_CONTROL_NONE,
                function_type.raw(),
            ],
        )?;
        let mut scope = Scope::new();
        for (arg, &ty) in scalars.iter().zip(&param_types) {
            let param = self.module.allocate_id();
            encode(&mut words, Op::FunctionParameter, &[ty.raw(), param.raw()])?;
            scope.bind(arg.name.as_str(), param);
        }

        let entry = self.module.allocate_id();
        let mut emitter = Emitter::new(&mut self.module, &self.options, scope, entry);
        emitter.lower_stmt(body)?;
        let lowered = emitter.finish();

        encode(&mut words, Op::Label, &[entry.raw()])?;
        words.extend_from_slice(&lowered.variables);
        words.extend_from_slice(&lowered.code);
        encode(&mut words, Op::Return, &[])?;
        encode(&mut words, Op::FunctionEnd, &[])?;

        debug!(
            args = args.len(),
            params = scalars.len(),
            words = words.len(),
            "emitted kernel"
        );
        self.module.buffer_mut().append(Segment::Code, &words);
        Ok(function)
    }

    /// The finished module as 32-bit words, with the id bound patched in.
    pub fn compile_to_words(&self) -> Vec<u32> {
        self.module.finish()
    }

    /// The finished module as little-endian bytes.
    ///
    /// Validates the module when `validate` is set and prints a
    /// disassembly to stderr when `dump` is set.
    pub fn compile_to_binary(&self) -> Result<Vec<u8>, ValidationError> {
        let words = self.compile_to_words();
        if self.options.dump {
            eprintln!("{}", reader::disassemble(&words));
        }
        if self.options.validate {
            let stats = reader::validate(&words)?;
            debug!(
                instructions = stats.instructions,
                bound = stats.bound,
                "validated module"
            );
        }
        Ok(words_to_bytes(&words))
    }
}
