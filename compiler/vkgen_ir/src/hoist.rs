//! Lifting let bindings out of an expression.
//!
//! Scalarization rebuilds an expression once per lane, so every let value
//! inside it would be evaluated once per lane. [`hoist_let`] pulls a single
//! binding out under a fresh name; a backend evaluates the value once,
//! binds the fresh name, and continues with the remaining expression.

use crate::expr::Expr;
use crate::names::UniqueNames;

/// A let binding lifted out of an expression.
#[derive(Clone, Debug, PartialEq)]
pub struct HoistedLet {
    /// Fresh name standing in for the original binding.
    pub name: String,
    pub value: Expr,
    /// The expression with the let replaced by its (renamed) body.
    pub rest: Expr,
}

/// Lift the first let in `e`, in pre-order, whose value mentions no name
/// bound by another let inside `e`.
///
/// Returns `None` when `e` contains no such let. Repeated application
/// lifts nested lets outermost first.
pub fn hoist_let(e: &Expr, names: &mut UniqueNames) -> Option<HoistedLet> {
    let mut bound = Vec::new();
    let target = find_hoistable(e, &mut bound)?;
    let Expr::Let { name, value, .. } = target else {
        return None;
    };
    let fresh = names.fresh(name);
    let rest = replace_let(e, target, &fresh);
    Some(HoistedLet {
        name: fresh,
        value: (**value).clone(),
        rest,
    })
}

fn find_hoistable<'e>(e: &'e Expr, bound: &mut Vec<&'e str>) -> Option<&'e Expr> {
    if let Expr::Let { name, value, body } = e {
        if !mentions_any(value, bound) {
            return Some(e);
        }
        if let Some(found) = find_hoistable(value, bound) {
            return Some(found);
        }
        bound.push(name.as_str());
        let found = find_hoistable(body, bound);
        bound.pop();
        return found;
    }
    children(e)
        .into_iter()
        .find_map(|child| find_hoistable(child, bound))
}

/// Conservative: shadowing inside `e` is ignored.
fn mentions_any(e: &Expr, names: &[&str]) -> bool {
    match e {
        Expr::Variable { name, .. } => names.contains(&name.as_str()),
        _ => children(e).into_iter().any(|child| mentions_any(child, names)),
    }
}

fn replace_let(e: &Expr, target: &Expr, fresh: &str) -> Expr {
    if std::ptr::eq(e, target) {
        if let Expr::Let { name, body, .. } = e {
            return rename(body, name, fresh);
        }
    }
    map_children(e, |child| replace_let(child, target, fresh))
}

/// Rename free occurrences of `old` in `e` to `new`.
fn rename(e: &Expr, old: &str, new: &str) -> Expr {
    match e {
        Expr::Variable { ty, name } if name == old => Expr::var(*ty, new),
        Expr::Let { name, value, body } if name == old => Expr::Let {
            name: name.clone(),
            value: Box::new(rename(value, old, new)),
            body: body.clone(),
        },
        _ => map_children(e, |child| rename(child, old, new)),
    }
}

fn children(e: &Expr) -> Vec<&Expr> {
    match e {
        Expr::IntImm { .. }
        | Expr::UIntImm { .. }
        | Expr::FloatImm { .. }
        | Expr::StringImm(_)
        | Expr::Variable { .. } => Vec::new(),
        Expr::Cast { value, .. } | Expr::Broadcast { value, .. } => vec![&**value],
        Expr::Not(a) => vec![&**a],
        Expr::Load { index, .. } => vec![&**index],
        Expr::Binary { a, b, .. } => vec![&**a, &**b],
        Expr::Ramp { base, stride, .. } => vec![&**base, &**stride],
        Expr::Let { value, body, .. } => vec![&**value, &**body],
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => vec![&**condition, &**true_value, &**false_value],
        Expr::Call { args, .. } => args.iter().collect(),
        Expr::Shuffle { vectors, .. } => vectors.iter().collect(),
    }
}

/// `e` with every direct child replaced by `f(child)`.
fn map_children(e: &Expr, mut f: impl FnMut(&Expr) -> Expr) -> Expr {
    match e {
        Expr::IntImm { .. }
        | Expr::UIntImm { .. }
        | Expr::FloatImm { .. }
        | Expr::StringImm(_)
        | Expr::Variable { .. } => e.clone(),
        Expr::Cast { ty, value } => Expr::Cast {
            ty: *ty,
            value: Box::new(f(value)),
        },
        Expr::Binary { op, a, b } => Expr::Binary {
            op: *op,
            a: Box::new(f(a)),
            b: Box::new(f(b)),
        },
        Expr::Not(a) => Expr::Not(Box::new(f(a))),
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => Expr::Select {
            condition: Box::new(f(condition)),
            true_value: Box::new(f(true_value)),
            false_value: Box::new(f(false_value)),
        },
        Expr::Ramp { base, stride, lanes } => Expr::Ramp {
            base: Box::new(f(base)),
            stride: Box::new(f(stride)),
            lanes: *lanes,
        },
        Expr::Broadcast { value, lanes } => Expr::Broadcast {
            value: Box::new(f(value)),
            lanes: *lanes,
        },
        Expr::Let { name, value, body } => Expr::Let {
            name: name.clone(),
            value: Box::new(f(value)),
            body: Box::new(f(body)),
        },
        Expr::Call { ty, name, args } => Expr::Call {
            ty: *ty,
            name: name.clone(),
            args: args.iter().map(&mut f).collect(),
        },
        Expr::Shuffle { vectors, indices } => Expr::Shuffle {
            vectors: vectors.iter().map(&mut f).collect(),
            indices: indices.clone(),
        },
        Expr::Load { ty, name, index } => Expr::Load {
            ty: *ty,
            name: name.clone(),
            index: Box::new(f(index)),
        },
    }
}
