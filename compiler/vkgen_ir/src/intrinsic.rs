//! Named intrinsics recognised in [`Expr::Call`](crate::Expr::Call).

use std::fmt;

/// Intrinsics with fixed lowering rules in device code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intrinsic {
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    ShiftLeft,
    /// Arithmetic for signed operands, logical for unsigned.
    ShiftRight,
    /// Bit pattern reinterpretation between same-width types.
    Reinterpret,
    GpuThreadBarrier,
    /// Lazily evaluated conditional value: `(cond, then, else)`.
    IfThenElse,
    /// Truncating division.
    DivRoundToZero,
    /// Truncating remainder.
    ModRoundToZero,
    /// `(a * b) >> q` computed at double width; `q` must be a literal.
    MulShiftRight,
    /// `a + (b - a) / 2` for `b >= a`, without widening.
    SortedAvg,
}

impl Intrinsic {
    const ALL: [Intrinsic; 13] = [
        Intrinsic::BitwiseAnd,
        Intrinsic::BitwiseOr,
        Intrinsic::BitwiseXor,
        Intrinsic::BitwiseNot,
        Intrinsic::ShiftLeft,
        Intrinsic::ShiftRight,
        Intrinsic::Reinterpret,
        Intrinsic::GpuThreadBarrier,
        Intrinsic::IfThenElse,
        Intrinsic::DivRoundToZero,
        Intrinsic::ModRoundToZero,
        Intrinsic::MulShiftRight,
        Intrinsic::SortedAvg,
    ];

    /// The call name used in the IR.
    pub fn name(self) -> &'static str {
        match self {
            Intrinsic::BitwiseAnd => "bitwise_and",
            Intrinsic::BitwiseOr => "bitwise_or",
            Intrinsic::BitwiseXor => "bitwise_xor",
            Intrinsic::BitwiseNot => "bitwise_not",
            Intrinsic::ShiftLeft => "shift_left",
            Intrinsic::ShiftRight => "shift_right",
            Intrinsic::Reinterpret => "reinterpret",
            Intrinsic::GpuThreadBarrier => "gpu_thread_barrier",
            Intrinsic::IfThenElse => "if_then_else",
            Intrinsic::DivRoundToZero => "div_round_to_zero",
            Intrinsic::ModRoundToZero => "mod_round_to_zero",
            Intrinsic::MulShiftRight => "mul_shift_right",
            Intrinsic::SortedAvg => "sorted_avg",
        }
    }

    /// Look up an intrinsic by call name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|i| i.name() == name)
    }

    /// Number of arguments the intrinsic takes.
    pub fn arity(self) -> usize {
        match self {
            Intrinsic::GpuThreadBarrier => 0,
            Intrinsic::BitwiseNot | Intrinsic::Reinterpret => 1,
            Intrinsic::BitwiseAnd
            | Intrinsic::BitwiseOr
            | Intrinsic::BitwiseXor
            | Intrinsic::ShiftLeft
            | Intrinsic::ShiftRight
            | Intrinsic::DivRoundToZero
            | Intrinsic::ModRoundToZero
            | Intrinsic::SortedAvg => 2,
            Intrinsic::IfThenElse | Intrinsic::MulShiftRight => 3,
        }
    }
}

impl fmt::Display for Intrinsic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for intrinsic in Intrinsic::ALL {
            assert_eq!(Intrinsic::from_name(intrinsic.name()), Some(intrinsic));
        }
    }

    #[test]
    fn unknown_name_is_none() {
        assert_eq!(Intrinsic::from_name("count_leading_zeros"), None);
    }
}
