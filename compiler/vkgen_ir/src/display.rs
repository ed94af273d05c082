//! Human-readable rendering of expressions, used in diagnostics.

use std::fmt;

use crate::expr::{BinaryOp, Expr};
use crate::types::TypeCode;

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntImm { ty, value } if ty.bits() == 32 => write!(f, "{value}"),
            Expr::IntImm { ty, value } => write!(f, "({ty}){value}"),
            Expr::UIntImm { ty, value } if ty.code() == TypeCode::Bool => {
                f.write_str(if *value == 0 { "false" } else { "true" })
            }
            Expr::UIntImm { ty, value } => write!(f, "({ty}){value}"),
            Expr::FloatImm { ty, value } if ty.bits() == 32 => write!(f, "{value}f"),
            Expr::FloatImm { ty, value } => write!(f, "({ty}){value}"),
            Expr::StringImm(text) => write!(f, "{text:?}"),
            Expr::Variable { name, .. } => f.write_str(name),
            Expr::Cast { ty, value } => write!(f, "{ty}({value})"),
            Expr::Binary { op, a, b } => match op {
                BinaryOp::Min | BinaryOp::Max => write!(f, "{}({a}, {b})", op.symbol()),
                _ => write!(f, "({a} {} {b})", op.symbol()),
            },
            Expr::Not(a) => write!(f, "!{a}"),
            Expr::Select {
                condition,
                true_value,
                false_value,
            } => write!(f, "select({condition}, {true_value}, {false_value})"),
            Expr::Ramp {
                base,
                stride,
                lanes,
            } => write!(f, "ramp({base}, {stride}, {lanes})"),
            Expr::Broadcast { value, lanes } => write!(f, "x{lanes}({value})"),
            Expr::Let { name, value, body } => write!(f, "(let {name} = {value} in {body})"),
            Expr::Call { name, args, .. } => {
                write!(f, "{name}(")?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Expr::Shuffle { vectors, indices } => {
                f.write_str("shuffle(")?;
                write_args(f, vectors)?;
                write!(f, "; {indices:?})")
            }
            Expr::Load { name, index, .. } => write!(f, "{name}[{index}]"),
        }
    }
}
