//! SPIR-V device code generation for vkgen kernels.
//!
//! Lowers a fully scheduled kernel body ([`vkgen_ir::Stmt`]) into a binary
//! SPIR-V module: a stream of 32-bit words made of a header, entry point
//! declarations, type/constant definitions and function code.
//!
//! # Architecture
//!
//! - [`DeviceCodegen`] drives a module compile: header, one function per
//!   kernel, final serialization and validation.
//! - [`Emitter`] lowers one kernel body by recursive descent over the IR,
//!   returning result [`Id`]s. Control flow is structured (selection and
//!   loop merges); vector constructs without a direct instruction fall back
//!   to lane-by-lane scalarization.
//! - [`ModuleBuilder`] owns module-wide state: the [`IdAllocator`], the
//!   segmented [`ModuleBuffer`], and the type and constant interners.
//! - [`reader`] decodes finished modules for validation and debugging.
//!
//! # Errors
//!
//! Every lowering returns `Result<_, EmitError>`. A kernel that fails to
//! lower adds no function code, though types and constants it interned
//! stay in the module. A literal zero divisor is caught before any
//! emission and reported as [`UserError`].
//!
//! # Debugging
//!
//! Set `RUST_LOG=vkgen_spirv=trace` (after calling [`init_tracing`]) to see
//! interning and label allocation, or `VKGEN_DUMP_SPIRV=1` with
//! [`EmitOptions::from_env`] to print each module's disassembly.

use std::sync::Once;

mod builder;
mod constants;
mod device;
mod emitter;
pub mod encode;
mod error;
mod id;
mod lower_control_flow;
mod lower_intrinsics;
mod lower_literals;
mod lower_operators;
mod lower_vectors;
mod options;
pub mod reader;
mod scope;
pub mod spirv;
mod types;
mod zero_divisor;

#[cfg(test)]
mod tests;

pub use builder::ModuleBuilder;
pub use device::{ArgKind, DeviceArgument, DeviceCodegen};
pub use emitter::{Emitter, FunctionBody};
pub use encode::{ModuleBuffer, Segment};
pub use error::{EmitError, UserError, ValidationError};
pub use id::{Id, IdAllocator};
pub use options::{EmitOptions, LoopBound, DUMP_ENV_VAR};
pub use reader::{disassemble, validate, Instruction, Instructions, ModuleStats};
pub use scope::Scope;
pub use spirv::Op;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset. Safe to call more than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
