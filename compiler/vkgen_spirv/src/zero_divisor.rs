//! Pre-pass rejecting division by a literal zero.
//!
//! Runs over a whole kernel before any of its instructions are emitted, so
//! a kernel with a literal zero divisor leaves the module untouched.

use vkgen_ir::{is_zero, BinaryOp, Expr, Intrinsic, Stmt};

use crate::error::UserError;

/// The first division or modulo in `body` whose divisor is a literal zero.
pub fn check_kernel(body: &Stmt) -> Result<(), UserError> {
    match find_in_stmt(body) {
        Some(expr) => Err(UserError::DivisionByZero {
            expr: expr.to_string(),
        }),
        None => Ok(()),
    }
}

fn divides_by_zero(expr: &Expr) -> bool {
    match expr {
        Expr::Binary {
            op: BinaryOp::Div | BinaryOp::Mod,
            b,
            ..
        } => is_zero(b),
        Expr::Call { name, args, .. } => {
            matches!(
                Intrinsic::from_name(name),
                Some(Intrinsic::DivRoundToZero | Intrinsic::ModRoundToZero)
            ) && args.get(1).is_some_and(is_zero)
        }
        _ => false,
    }
}

fn find_in_stmt(stmt: &Stmt) -> Option<&Expr> {
    match stmt {
        Stmt::LetStmt { value, body, .. } => find_in_expr(value).or_else(|| find_in_stmt(body)),
        Stmt::For {
            min, extent, body, ..
        } => find_in_expr(min)
            .or_else(|| find_in_expr(extent))
            .or_else(|| find_in_stmt(body)),
        Stmt::IfThenElse {
            condition,
            then_case,
            else_case,
        } => find_in_expr(condition)
            .or_else(|| find_in_stmt(then_case))
            .or_else(|| else_case.as_deref().and_then(find_in_stmt)),
        Stmt::Evaluate(value) => find_in_expr(value),
        Stmt::Block(stmts) => stmts.iter().find_map(find_in_stmt),
        Stmt::ProducerConsumer { body, .. } | Stmt::Realize { body, .. } => find_in_stmt(body),
        Stmt::Store { value, index, .. } => find_in_expr(value).or_else(|| find_in_expr(index)),
        Stmt::Provide { values, args, .. } => {
            values.iter().chain(args).find_map(find_in_expr)
        }
        Stmt::Allocate { extents, body, .. } => extents
            .iter()
            .find_map(find_in_expr)
            .or_else(|| find_in_stmt(body)),
        Stmt::Prefetch { .. } => None,
        Stmt::Fork { first, rest } => find_in_stmt(first).or_else(|| find_in_stmt(rest)),
        Stmt::Acquire {
            semaphore,
            count,
            body,
        } => find_in_expr(semaphore)
            .or_else(|| find_in_expr(count))
            .or_else(|| find_in_stmt(body)),
    }
}

/// Post-order, so the innermost offending expression is reported.
fn find_in_expr(expr: &Expr) -> Option<&Expr> {
    let inner = match expr {
        Expr::IntImm { .. }
        | Expr::UIntImm { .. }
        | Expr::FloatImm { .. }
        | Expr::StringImm(_)
        | Expr::Variable { .. } => None,
        Expr::Cast { value, .. } | Expr::Broadcast { value, .. } => find_in_expr(value),
        Expr::Not(a) => find_in_expr(a),
        Expr::Binary { a, b, .. } => find_in_expr(a).or_else(|| find_in_expr(b)),
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => find_in_expr(condition)
            .or_else(|| find_in_expr(true_value))
            .or_else(|| find_in_expr(false_value)),
        Expr::Ramp { base, stride, .. } => find_in_expr(base).or_else(|| find_in_expr(stride)),
        Expr::Let { value, body, .. } => find_in_expr(value).or_else(|| find_in_expr(body)),
        Expr::Call { args, .. } => args.iter().find_map(find_in_expr),
        Expr::Shuffle { vectors, .. } => vectors.iter().find_map(find_in_expr),
        Expr::Load { index, .. } => find_in_expr(index),
    };
    inner.or_else(|| divides_by_zero(expr).then_some(expr))
}
