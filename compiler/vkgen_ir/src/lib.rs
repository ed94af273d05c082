//! Kernel IR for the vkgen device backend.
//!
//! This crate defines the expression/statement tree a data-parallel front
//! end hands to device code generation, after scheduling, storage
//! flattening and memory staging have run:
//!
//! - **Types** ([`Type`], [`TypeCode`]): scalar and vector semantic types.
//! - **Nodes** ([`Expr`], [`Stmt`]): a closed tagged union over node kinds.
//! - **Intrinsics** ([`Intrinsic`]): named calls with fixed lowering rules.
//! - **Rewrites**: [`extract_lane`] (per-lane projection of vector code) and
//!   [`lower_euclidean_div`]/[`lower_euclidean_mod`] (integer division in
//!   terms of truncating primitives), both used by backends as fallbacks.
//!   [`hoist_let`] lifts bindings out of an expression so scalarized code
//!   evaluates each let value once.
//!
//! # Crate Dependencies
//!
//! No backend dependency: the IR can be built, printed and rewritten
//! without any code generator present.

mod display;
pub mod division;
pub mod expr;
pub mod hoist;
pub mod intrinsic;
pub mod lane;
pub mod names;
pub mod ops;
pub mod types;

pub use division::{lower_euclidean_div, lower_euclidean_mod};
pub use expr::{BinaryOp, Expr, ForKind, Stmt};
pub use hoist::{hoist_let, HoistedLet};
pub use intrinsic::Intrinsic;
pub use lane::extract_lane;
pub use names::UniqueNames;
pub use ops::{as_const_int, is_zero, make_const, make_one, make_zero};
pub use types::{Type, TypeCode};
