//! Expression and statement emission for one kernel body.
//!
//! `Emitter` owns the per-kernel state (symbol table, current block, the
//! function's local variables and code) and dispatches each IR node to a
//! focused `lower_*` method implemented in separate files.
//!
//! # Architecture
//!
//! ```text
//! Emitter
//!   ├── lower_literals.rs     : IntImm, UIntImm, FloatImm, StringImm, Variable
//!   ├── lower_operators.rs    : Cast, Binary, Not, min/max, div/mod
//!   ├── lower_intrinsics.rs   : Call dispatch over the intrinsic table
//!   ├── lower_control_flow.rs : Select, Let, LetStmt, For, IfThenElse
//!   └── lower_vectors.rs      : Ramp, Broadcast, Shuffle, scalarization
//! ```
//!
//! Lowering is depth-first and post-order: operands are emitted before the
//! instruction consuming them, and every value-producing lowering returns
//! the result id of the instruction it emitted last.

use std::mem;

use tracing::trace;
use vkgen_ir::{Expr, Intrinsic, Stmt, Type, UniqueNames};

use crate::builder::ModuleBuilder;
use crate::encode::{encode, Operands};
use crate::error::EmitError;
use crate::id::Id;
use crate::lower_intrinsics::check_arity;
use crate::options::EmitOptions;
use crate::scope::Scope;
use crate::spirv::{self, Op};

/// Encoded instructions of one function body.
#[derive(Debug, Default)]
pub struct FunctionBody {
    /// `OpVariable` declarations, hoisted to the entry block.
    pub variables: Vec<u32>,
    /// Everything after the entry label.
    pub code: Vec<u32>,
}

/// Lowers one kernel body into a [`FunctionBody`].
pub struct Emitter<'a> {
    /// Module-wide ids, types and constants.
    pub(crate) module: &'a mut ModuleBuilder,
    pub(crate) options: &'a EmitOptions,
    /// Current lexical scope (owned; swapped via `mem::replace` for lets and loops).
    pub(crate) scope: Scope,
    /// Fresh names for rewrites that introduce lets.
    pub(crate) names: UniqueNames,
    /// Label of the block instructions are currently appended to.
    pub(crate) current_block: Id,
    body: FunctionBody,
}

impl<'a> Emitter<'a> {
    /// An emitter whose first block is `entry`. The caller emits the entry
    /// label itself, ahead of the hoisted variables.
    pub fn new(
        module: &'a mut ModuleBuilder,
        options: &'a EmitOptions,
        scope: Scope,
        entry: Id,
    ) -> Self {
        Self {
            module,
            options,
            scope,
            names: UniqueNames::new(),
            current_block: entry,
            body: FunctionBody::default(),
        }
    }

    /// Consume the emitter, yielding the encoded function body.
    pub fn finish(self) -> FunctionBody {
        self.body
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    /// Lower an expression, returning the id holding its value.
    pub fn lower_expr(&mut self, expr: &Expr) -> Result<Id, EmitError> {
        match expr {
            // --- Literals and names ---
            Expr::IntImm { ty, value } => self.lower_int_imm(*ty, *value),
            Expr::UIntImm { ty, value } => self.lower_uint_imm(*ty, *value),
            Expr::FloatImm { ty, value } => self.lower_float_imm(*ty, *value),
            Expr::StringImm(text) => self.lower_string_imm(text),
            Expr::Variable { name, .. } => self.lower_variable(name),

            // --- Operators ---
            Expr::Cast { ty, value } => self.lower_cast(*ty, value),
            Expr::Binary { op, a, b } => self.lower_binary(*op, a, b),
            Expr::Not(a) => self.lower_not(a),

            // --- Control flow ---
            Expr::Select {
                condition,
                true_value,
                false_value,
            } => self.lower_select(expr, condition, true_value, false_value),
            Expr::Let { name, value, body } => self.lower_let(name, value, body),

            // --- Calls ---
            Expr::Call { ty, name, args } => self.lower_call(expr, *ty, name, args),

            // --- Vectors ---
            Expr::Ramp {
                base,
                stride,
                lanes,
            } => self.lower_ramp(expr, base, stride, *lanes),
            Expr::Broadcast { value, lanes } => self.lower_broadcast(expr, value, *lanes),
            Expr::Shuffle { vectors, indices } => self.lower_shuffle(expr, vectors, indices),

            // --- Memory ---
            Expr::Load { name, .. } => {
                Err(EmitError::unsupported(format!("load from `{name}`")))
            }
        }
    }

    /// Lower a statement.
    pub fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), EmitError> {
        match stmt {
            Stmt::LetStmt { name, value, body } => self.lower_let_stmt(name, value, body),
            Stmt::For {
                name,
                min,
                extent,
                kind,
                body,
            } => self.lower_for(name, min, extent, *kind, body),
            Stmt::IfThenElse {
                condition,
                then_case,
                else_case,
            } => self.lower_if_stmt(condition, then_case, else_case.as_deref()),
            Stmt::Evaluate(value) => self.lower_evaluate(value),
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s)?;
                }
                Ok(())
            }
            Stmt::ProducerConsumer { body, .. } => self.lower_stmt(body),

            Stmt::Store { name, .. } => Err(EmitError::unsupported(format!("store to `{name}`"))),
            Stmt::Prefetch { .. } | Stmt::Fork { .. } | Stmt::Acquire { .. } => {
                Err(EmitError::unsupported(format!("`{}` statement", stmt.kind_name())))
            }
            Stmt::Provide { .. } | Stmt::Realize { .. } | Stmt::Allocate { .. } => {
                Err(EmitError::UnresolvedNode {
                    node: stmt.kind_name(),
                })
            }
        }
    }

    /// `Evaluate`: lower for effect and discard the value. A thread barrier
    /// is the one call that yields no value at all.
    fn lower_evaluate(&mut self, value: &Expr) -> Result<(), EmitError> {
        if let Expr::Call { name, args, .. } = value {
            if Intrinsic::from_name(name) == Some(Intrinsic::GpuThreadBarrier) {
                check_arity(Intrinsic::GpuThreadBarrier, args)?;
                trace!("thread barrier lowered to no-op");
                return Ok(());
            }
        }
        self.lower_expr(value).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Instruction helpers
    // -----------------------------------------------------------------------

    /// Append an instruction without a result to the current block.
    pub(crate) fn emit(&mut self, op: Op, operands: &[u32]) -> Result<(), EmitError> {
        encode(&mut self.body.code, op, operands)
    }

    /// Append `op [type, result, operands…]` and return the fresh result id.
    pub(crate) fn emit_value(
        &mut self,
        op: Op,
        type_id: Id,
        operands: &[Id],
    ) -> Result<Id, EmitError> {
        let words: Operands = operands.iter().map(|id| id.raw()).collect();
        self.emit_value_raw(op, type_id, &words)
    }

    /// [`emit_value`](Self::emit_value) for operand lists mixing ids and
    /// literal words.
    pub(crate) fn emit_value_raw(
        &mut self,
        op: Op,
        type_id: Id,
        operands: &[u32],
    ) -> Result<Id, EmitError> {
        let result = self.module.allocate_id();
        let mut words = Operands::with_capacity(operands.len() + 2);
        words.push(type_id.raw());
        words.push(result.raw());
        words.extend_from_slice(operands);
        encode(&mut self.body.code, op, &words)?;
        Ok(result)
    }

    /// Like [`emit_value`](Self::emit_value) with the result type given as
    /// a semantic type.
    pub(crate) fn emit_typed(&mut self, op: Op, ty: Type, operands: &[Id]) -> Result<Id, EmitError> {
        let type_id = self.module.map_type(ty)?;
        self.emit_value(op, type_id, operands)
    }

    /// Start the block labelled `label`.
    pub(crate) fn emit_label(&mut self, label: Id) -> Result<(), EmitError> {
        self.emit(Op::Label, &[label.raw()])?;
        self.current_block = label;
        Ok(())
    }

    pub(crate) fn emit_branch(&mut self, target: Id) -> Result<(), EmitError> {
        self.emit(Op::Branch, &[target.raw()])
    }

    /// A fresh id used only as a control-flow target.
    pub(crate) fn new_label(&mut self) -> Id {
        self.module.allocate_id()
    }

    /// Declare a function-local variable of type `ty` in the entry block.
    pub(crate) fn declare_local(&mut self, ty: Type) -> Result<Id, EmitError> {
        let pointer = self.module.map_pointer_type_local(ty)?;
        let var = self.module.allocate_id();
        encode(
            &mut self.body.variables,
            Op::Variable,
            &[pointer.raw(), var.raw(), spirv::STORAGE_CLASS_FUNCTION],
        )?;
        Ok(var)
    }

    /// Run `f` with `name` bound to `id`, restoring the enclosing scope on
    /// every exit path.
    pub(crate) fn with_binding<T>(
        &mut self,
        name: &str,
        id: Id,
        f: impl FnOnce(&mut Self) -> Result<T, EmitError>,
    ) -> Result<T, EmitError> {
        let mut child = self.scope.child();
        child.bind(name, id);
        let parent = mem::replace(&mut self.scope, child);
        let result = f(self);
        self.scope = parent;
        result
    }
}
