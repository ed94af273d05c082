//! Euclidean integer division and modulo in terms of truncating primitives.
//!
//! Integer `/` and `%` in the IR are Euclidean: `(a / b) * b + a % b == a`
//! with `0 <= a % b < |b|`. Division by zero yields zero and modulo by zero
//! yields `a`. Device instruction sets only provide truncating division, so
//! both are rewritten into `div_round_to_zero`/`mod_round_to_zero` plus
//! sign fix-ups.
//!
//! Operands and intermediate sign masks are bound to fresh lets so each
//! subexpression is evaluated exactly once.

use crate::expr::Expr;
use crate::names::UniqueNames;
use crate::ops::{make_const, make_one, make_zero};
use crate::types::Type;

/// Names bound around a rewritten division.
struct Operands {
    ty: Type,
    a_name: String,
    b_name: String,
}

impl Operands {
    fn new(ty: Type, names: &mut UniqueNames) -> Self {
        Operands {
            ty,
            a_name: names.fresh("a"),
            b_name: names.fresh("b"),
        }
    }

    fn a(&self) -> Expr {
        Expr::var(self.ty, self.a_name.clone())
    }

    fn b(&self) -> Expr {
        Expr::var(self.ty, self.b_name.clone())
    }

    /// `let a$ = a in let b$ = b in body`.
    fn bind(self, a: Expr, b: Expr, body: Expr) -> Expr {
        Expr::let_in(self.a_name, a, Expr::let_in(self.b_name, b, body))
    }
}

/// Sign masks shared by the signed rewrites.
struct SignMasks {
    a_neg: String,
    b_neg: String,
    b_zero: String,
}

impl SignMasks {
    fn new(names: &mut UniqueNames) -> Self {
        SignMasks {
            a_neg: names.fresh("a_neg"),
            b_neg: names.fresh("b_neg"),
            b_zero: names.fresh("b_zero"),
        }
    }

    /// Bind `a_neg = a >> (n-1)`, `b_neg = b >> (n-1)` and
    /// `b_zero = select(b == 0, -1, 0)` around `body`.
    fn bind(&self, ops: &Operands, body: Expr) -> Expr {
        let ty = ops.ty;
        let shift = make_const(ty, i64::from(ty.bits()) - 1);
        let b_zero = Expr::select(
            ops.b().cmp_eq(make_zero(ty)),
            make_const(ty, -1),
            make_zero(ty),
        );
        Expr::let_in(
            self.a_neg.clone(),
            ops.a() >> shift.clone(),
            Expr::let_in(
                self.b_neg.clone(),
                ops.b() >> shift,
                Expr::let_in(self.b_zero.clone(), b_zero, body),
            ),
        )
    }
}

/// Rewrite integer `a / b` using truncating division.
pub fn lower_euclidean_div(a: Expr, b: Expr, names: &mut UniqueNames) -> Expr {
    let ty = a.ty();
    let ops = Operands::new(ty, names);
    let body = if ty.is_uint() {
        let zero_name = names.fresh("b_is_zero");
        let b_is_zero = Expr::var(Type::bool().with_lanes(ty.lanes()), zero_name.clone());
        let safe_b = ops.b() | Expr::select(b_is_zero.clone(), make_one(ty), make_zero(ty));
        let q = ops.a().div_round_to_zero(safe_b);
        Expr::let_in(
            zero_name,
            ops.b().cmp_eq(make_zero(ty)),
            Expr::select(b_is_zero, make_zero(ty), q),
        )
    } else {
        let masks = SignMasks::new(names);
        let v = |name: &String| Expr::var(ty, name.clone());
        // If b is zero divide by one; if a is negative add one so the
        // truncation rounds the right way.
        let q = (ops.a() - v(&masks.a_neg)).div_round_to_zero(ops.b() - v(&masks.b_zero));
        // Negative a: subtract one for positive b, add one for negative b.
        let q = q + (v(&masks.a_neg) & (!v(&masks.b_neg) - v(&masks.b_neg)));
        let q = q & !v(&masks.b_zero);
        masks.bind(&ops, q)
    };
    ops.bind(a, b, body)
}

/// Rewrite integer `a % b` using truncating remainder.
pub fn lower_euclidean_mod(a: Expr, b: Expr, names: &mut UniqueNames) -> Expr {
    let ty = a.ty();
    let ops = Operands::new(ty, names);
    let body = if ty.is_uint() {
        let zero_name = names.fresh("b_is_zero");
        let b_is_zero = Expr::var(Type::bool().with_lanes(ty.lanes()), zero_name.clone());
        let safe_b = ops.b() | Expr::select(b_is_zero.clone(), make_one(ty), make_zero(ty));
        let r = ops.a().mod_round_to_zero(safe_b);
        Expr::let_in(
            zero_name,
            ops.b().cmp_eq(make_zero(ty)),
            Expr::select(b_is_zero, ops.a(), r),
        )
    } else {
        let masks = SignMasks::new(names);
        let v = |name: &String| Expr::var(ty, name.clone());
        let r = (ops.a() - v(&masks.a_neg)).mod_round_to_zero(ops.b() | v(&masks.b_zero));
        // Negative a: add b - 1 for positive b, -b - 1 for negative b.
        let r = r + (v(&masks.a_neg) & ((ops.b() ^ v(&masks.b_neg)) + !v(&masks.b_neg)));
        let r = Expr::select(v(&masks.b_zero).cmp_eq(make_zero(ty)), r, ops.a());
        masks.bind(&ops, r)
    };
    ops.bind(a, b, body)
}
