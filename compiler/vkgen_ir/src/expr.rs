//! Kernel IR node definitions.
//!
//! The IR is a closed tagged union: [`Expr`] for value-producing nodes and
//! [`Stmt`] for effects and control flow. Backends match on it exhaustively,
//! so adding a variant is a compile error at every dispatch site.
//!
//! Children are boxed; trees are built once by the front end and consumed
//! read-only by the backend (rewrites build fresh subtrees).

use crate::types::Type;

// ── Operators ───────────────────────────────────────────────────────

/// Binary operator of [`Expr::Binary`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Euclidean for integers, IEEE for floats.
    Div,
    /// Euclidean for integers, sign of the divisor for floats.
    Mod,
    Min,
    Max,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// Logical and of booleans.
    And,
    /// Logical or of booleans.
    Or,
}

impl BinaryOp {
    /// True for operators producing a boolean result.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    /// Source-level symbol, used by the printer.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Min => "min",
            BinaryOp::Max => "max",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// Iteration policy of a [`Stmt::For`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ForKind {
    Serial,
    Parallel,
    Vectorized,
    Unrolled,
    GpuBlock,
    GpuThread,
}

impl ForKind {
    pub fn name(self) -> &'static str {
        match self {
            ForKind::Serial => "serial",
            ForKind::Parallel => "parallel",
            ForKind::Vectorized => "vectorized",
            ForKind::Unrolled => "unrolled",
            ForKind::GpuBlock => "gpu_block",
            ForKind::GpuThread => "gpu_thread",
        }
    }
}

// ── Expressions ─────────────────────────────────────────────────────

/// A value-producing IR node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Signed integer literal; `value` is sign-extended to 64 bits.
    IntImm { ty: Type, value: i64 },
    /// Unsigned integer or boolean literal; `value` is zero-extended.
    UIntImm { ty: Type, value: u64 },
    /// Floating point literal, narrowed to `ty` at emission.
    FloatImm { ty: Type, value: f64 },
    /// Text literal.
    StringImm(String),
    /// Reference to a let-bound name, loop variable or kernel argument.
    Variable { ty: Type, name: String },
    Cast { ty: Type, value: Box<Expr> },
    Binary {
        op: BinaryOp,
        a: Box<Expr>,
        b: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    Select {
        condition: Box<Expr>,
        true_value: Box<Expr>,
        false_value: Box<Expr>,
    },
    /// `base, base + stride, base + 2*stride, …` over `lanes` lanes.
    Ramp {
        base: Box<Expr>,
        stride: Box<Expr>,
        lanes: u16,
    },
    /// `value` repeated over `lanes` lanes.
    Broadcast { value: Box<Expr>, lanes: u16 },
    Let {
        name: String,
        value: Box<Expr>,
        body: Box<Expr>,
    },
    /// Named intrinsic call; see [`crate::Intrinsic`].
    Call {
        ty: Type,
        name: String,
        args: Vec<Expr>,
    },
    /// Lane permutation over the concatenation of `vectors`.
    Shuffle {
        vectors: Vec<Expr>,
        indices: Vec<u32>,
    },
    /// Memory read from a named buffer.
    Load {
        ty: Type,
        name: String,
        index: Box<Expr>,
    },
}

impl Expr {
    /// The semantic type of this expression.
    pub fn ty(&self) -> Type {
        match self {
            Expr::IntImm { ty, .. }
            | Expr::UIntImm { ty, .. }
            | Expr::FloatImm { ty, .. }
            | Expr::Variable { ty, .. }
            | Expr::Cast { ty, .. }
            | Expr::Call { ty, .. }
            | Expr::Load { ty, .. } => *ty,
            Expr::StringImm(_) => Type::handle(),
            Expr::Binary { op, a, .. } => {
                let a_ty = a.ty();
                if op.is_comparison() {
                    Type::bool().with_lanes(a_ty.lanes())
                } else {
                    a_ty
                }
            }
            Expr::Not(a) => a.ty(),
            Expr::Select { true_value, .. } => true_value.ty(),
            Expr::Ramp { base, lanes, .. } => base.ty().with_lanes(*lanes),
            Expr::Broadcast { value, lanes } => value.ty().with_lanes(*lanes),
            Expr::Let { body, .. } => body.ty(),
            Expr::Shuffle { vectors, indices } => {
                let lanes = u16::try_from(indices.len()).unwrap_or(u16::MAX).max(1);
                vectors
                    .first()
                    .map_or_else(Type::handle, |v| v.ty().with_lanes(lanes))
            }
        }
    }

    /// Short node-kind label, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::IntImm { .. } => "IntImm",
            Expr::UIntImm { .. } => "UIntImm",
            Expr::FloatImm { .. } => "FloatImm",
            Expr::StringImm(_) => "StringImm",
            Expr::Variable { .. } => "Variable",
            Expr::Cast { .. } => "Cast",
            Expr::Binary { .. } => "Binary",
            Expr::Not(_) => "Not",
            Expr::Select { .. } => "Select",
            Expr::Ramp { .. } => "Ramp",
            Expr::Broadcast { .. } => "Broadcast",
            Expr::Let { .. } => "Let",
            Expr::Call { .. } => "Call",
            Expr::Shuffle { .. } => "Shuffle",
            Expr::Load { .. } => "Load",
        }
    }
}

// ── Statements ──────────────────────────────────────────────────────

/// An effect or control-flow IR node.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    LetStmt {
        name: String,
        value: Expr,
        body: Box<Stmt>,
    },
    /// Counted loop over `[min, min + extent)`.
    For {
        name: String,
        min: Expr,
        extent: Expr,
        kind: ForKind,
        body: Box<Stmt>,
    },
    IfThenElse {
        condition: Expr,
        then_case: Box<Stmt>,
        else_case: Option<Box<Stmt>>,
    },
    /// Evaluate an expression for its effects.
    Evaluate(Expr),
    /// Statements in order.
    Block(Vec<Stmt>),
    /// Annotation marking the production or consumption of a buffer.
    ProducerConsumer {
        name: String,
        is_producer: bool,
        body: Box<Stmt>,
    },
    Store {
        name: String,
        value: Expr,
        index: Expr,
    },
    /// Multi-dimensional staging write; removed by storage flattening.
    Provide {
        name: String,
        values: Vec<Expr>,
        args: Vec<Expr>,
    },
    /// Unresolved buffer realization; removed by storage flattening.
    Realize {
        name: String,
        ty: Type,
        body: Box<Stmt>,
    },
    /// Unresolved allocation; removed by memory staging.
    Allocate {
        name: String,
        ty: Type,
        extents: Vec<Expr>,
        body: Box<Stmt>,
    },
    Prefetch { name: String },
    Fork { first: Box<Stmt>, rest: Box<Stmt> },
    Acquire {
        semaphore: Expr,
        count: Expr,
        body: Box<Stmt>,
    },
}

impl Stmt {
    /// Short node-kind label, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Stmt::LetStmt { .. } => "LetStmt",
            Stmt::For { .. } => "For",
            Stmt::IfThenElse { .. } => "IfThenElse",
            Stmt::Evaluate(_) => "Evaluate",
            Stmt::Block(_) => "Block",
            Stmt::ProducerConsumer { .. } => "ProducerConsumer",
            Stmt::Store { .. } => "Store",
            Stmt::Provide { .. } => "Provide",
            Stmt::Realize { .. } => "Realize",
            Stmt::Allocate { .. } => "Allocate",
            Stmt::Prefetch { .. } => "Prefetch",
            Stmt::Fork { .. } => "Fork",
            Stmt::Acquire { .. } => "Acquire",
        }
    }
}
