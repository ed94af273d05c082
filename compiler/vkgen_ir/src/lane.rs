//! Per-lane projection of vector expressions.
//!
//! [`extract_lane`] rewrites a vector expression into the scalar expression
//! computing one of its lanes. It distributes through the node kinds that
//! are lane-wise, including the body of a let; anything opaque (variables,
//! unrecognised shuffles) becomes a single-element shuffle of the whole
//! vector. A let keeps its whole value in every lane, so backends lift lets
//! out first with [`crate::hoist_let`].

use crate::expr::Expr;

/// Scalar expression for lane `lane` of `e`. Scalars are returned unchanged.
pub fn extract_lane(e: &Expr, lane: u16) -> Expr {
    if e.ty().is_scalar() {
        return e.clone();
    }
    match e {
        Expr::Broadcast { value, .. } => extract_lane(value, lane),
        Expr::Ramp { base, stride, .. } => {
            let scalar_stride = extract_lane(stride, lane);
            let mut acc = extract_lane(base, lane);
            for _ in 0..lane {
                acc = acc + scalar_stride.clone();
            }
            acc
        }
        Expr::Cast { ty, value } => Expr::cast(ty.element_of(), extract_lane(value, lane)),
        Expr::Binary { op, a, b } => {
            Expr::binary(*op, extract_lane(a, lane), extract_lane(b, lane))
        }
        Expr::Not(a) => Expr::Not(Box::new(extract_lane(a, lane))),
        Expr::Select {
            condition,
            true_value,
            false_value,
        } => Expr::select(
            extract_lane(condition, lane),
            extract_lane(true_value, lane),
            extract_lane(false_value, lane),
        ),
        Expr::Call { ty, name, args } => Expr::call(
            ty.element_of(),
            name.clone(),
            args.iter().map(|arg| extract_lane(arg, lane)).collect(),
        ),
        Expr::Let { name, value, body } => {
            Expr::let_in(name.clone(), (**value).clone(), extract_lane(body, lane))
        }
        Expr::Shuffle { vectors, indices } if !vectors.is_empty() && vectors.len() <= 2 => {
            let Some(&index) = indices.get(usize::from(lane)) else {
                return element(e, lane);
            };
            let mut index = index;
            for vector in vectors {
                let lanes = u32::from(vector.ty().lanes());
                if index < lanes {
                    // `index < lanes <= u16::MAX`
                    return extract_lane(vector, u16::try_from(index).unwrap_or(u16::MAX));
                }
                index -= lanes;
            }
            element(e, lane)
        }
        Expr::Load { ty, name, index } => Expr::Load {
            ty: ty.element_of(),
            name: name.clone(),
            index: Box::new(extract_lane(index, lane)),
        },
        Expr::IntImm { .. }
        | Expr::UIntImm { .. }
        | Expr::FloatImm { .. }
        | Expr::StringImm(_)
        | Expr::Variable { .. }
        | Expr::Shuffle { .. } => element(e, lane),
    }
}

/// `e[lane]` as a single-element shuffle.
fn element(e: &Expr, lane: u16) -> Expr {
    Expr::shuffle(vec![e.clone()], vec![u32::from(lane)])
}
