//! SPIR-V binary format constants and the opcode subset this backend emits.
//!
//! Only the opcodes the emitter produces (plus the handful of module-level
//! declarations a downstream finalizer adds) are listed, so the reader can
//! decode every module this crate writes.

/// First word of every module.
pub const MAGIC_NUMBER: u32 = 0x0723_0203;

/// `SourceLanguageUnknown`.
pub const SOURCE_LANGUAGE_UNKNOWN: u32 = 0;

/// Words in the module header.
pub const HEADER_WORDS: usize = 5;

/// Header word holding the id bound.
pub const BOUND_INDEX: usize = 3;

/// `StorageClassFunction`.
pub const STORAGE_CLASS_FUNCTION: u32 = 7;

/// `LoopControlMaskNone`.
pub const LOOP_CONTROL_NONE: u32 = 0;

/// `SelectionControlMaskNone`.
pub const SELECTION_CONTROL_NONE: u32 = 0;

/// `FunctionControlMaskNone`.
pub const FUNCTION_CONTROL_NONE: u32 = 0;

/// Encoded version word for `major.minor`.
#[inline]
pub const fn version_word(major: u8, minor: u8) -> u32 {
    ((major as u32) << 16) | ((minor as u32) << 8)
}

/// Where an instruction's result id sits among its operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultLayout {
    /// No result id.
    None,
    /// Result id is the first operand (types, labels, strings).
    Id,
    /// Result type id, then result id.
    TypedId,
}

impl ResultLayout {
    /// Index of the result id within the operand words.
    #[inline]
    pub fn result_index(self) -> Option<usize> {
        match self {
            ResultLayout::None => None,
            ResultLayout::Id => Some(0),
            ResultLayout::TypedId => Some(1),
        }
    }
}

macro_rules! define_ops {
    ($($name:ident = $value:literal => $layout:ident,)*) => {
        /// Opcodes, with their SPIR-V numeric values.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Op {
            $($name = $value,)*
        }

        impl Op {
            /// Decode a raw opcode.
            pub fn from_u16(raw: u16) -> Option<Self> {
                match raw {
                    $($value => Some(Op::$name),)*
                    _ => None,
                }
            }

            /// Mnemonic, e.g. `OpIAdd`.
            pub fn name(self) -> &'static str {
                match self {
                    $(Op::$name => concat!("Op", stringify!($name)),)*
                }
            }

            /// Result id placement for this opcode.
            pub fn result_layout(self) -> ResultLayout {
                match self {
                    $(Op::$name => ResultLayout::$layout,)*
                }
            }
        }
    };
}

define_ops! {
    Name = 5 => None,
    String = 7 => Id,
    MemoryModel = 14 => None,
    EntryPoint = 15 => None,
    ExecutionMode = 16 => None,
    Capability = 17 => None,
    TypeVoid = 19 => Id,
    TypeBool = 20 => Id,
    TypeInt = 21 => Id,
    TypeFloat = 22 => Id,
    TypeVector = 23 => Id,
    TypeStruct = 30 => Id,
    TypePointer = 32 => Id,
    TypeFunction = 33 => Id,
    ConstantTrue = 41 => TypedId,
    ConstantFalse = 42 => TypedId,
    Constant = 43 => TypedId,
    ConstantComposite = 44 => TypedId,
    ConstantNull = 46 => TypedId,
    Function = 54 => TypedId,
    FunctionParameter = 55 => TypedId,
    FunctionEnd = 56 => None,
    Variable = 59 => TypedId,
    Load = 61 => TypedId,
    Store = 62 => None,
    VectorInsertDynamic = 78 => TypedId,
    VectorShuffle = 79 => TypedId,
    CompositeConstruct = 80 => TypedId,
    CompositeExtract = 81 => TypedId,
    ConvertFToU = 109 => TypedId,
    ConvertFToS = 110 => TypedId,
    ConvertSToF = 111 => TypedId,
    ConvertUToF = 112 => TypedId,
    UConvert = 113 => TypedId,
    SConvert = 114 => TypedId,
    FConvert = 115 => TypedId,
    SatConvertSToU = 118 => TypedId,
    SatConvertUToS = 119 => TypedId,
    Bitcast = 124 => TypedId,
    IAdd = 128 => TypedId,
    FAdd = 129 => TypedId,
    ISub = 130 => TypedId,
    FSub = 131 => TypedId,
    IMul = 132 => TypedId,
    FMul = 133 => TypedId,
    UDiv = 134 => TypedId,
    SDiv = 135 => TypedId,
    FDiv = 136 => TypedId,
    UMod = 137 => TypedId,
    SRem = 138 => TypedId,
    SMod = 139 => TypedId,
    FRem = 140 => TypedId,
    FMod = 141 => TypedId,
    UMulExtended = 151 => TypedId,
    SMulExtended = 152 => TypedId,
    LogicalEqual = 164 => TypedId,
    LogicalNotEqual = 165 => TypedId,
    LogicalOr = 166 => TypedId,
    LogicalAnd = 167 => TypedId,
    LogicalNot = 168 => TypedId,
    Select = 169 => TypedId,
    IEqual = 170 => TypedId,
    INotEqual = 171 => TypedId,
    UGreaterThan = 172 => TypedId,
    SGreaterThan = 173 => TypedId,
    UGreaterThanEqual = 174 => TypedId,
    SGreaterThanEqual = 175 => TypedId,
    ULessThan = 176 => TypedId,
    SLessThan = 177 => TypedId,
    ULessThanEqual = 178 => TypedId,
    SLessThanEqual = 179 => TypedId,
    FOrdEqual = 180 => TypedId,
    FOrdNotEqual = 182 => TypedId,
    FOrdLessThan = 184 => TypedId,
    FOrdGreaterThan = 186 => TypedId,
    FOrdLessThanEqual = 188 => TypedId,
    FOrdGreaterThanEqual = 190 => TypedId,
    ShiftRightLogical = 194 => TypedId,
    ShiftRightArithmetic = 195 => TypedId,
    ShiftLeftLogical = 196 => TypedId,
    BitwiseOr = 197 => TypedId,
    BitwiseXor = 198 => TypedId,
    BitwiseAnd = 199 => TypedId,
    Not = 200 => TypedId,
    Phi = 245 => TypedId,
    LoopMerge = 246 => None,
    SelectionMerge = 247 => None,
    Label = 248 => Id,
    Branch = 249 => None,
    BranchConditional = 250 => None,
    Return = 253 => None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_values_match_the_binary_format() {
        assert_eq!(Op::IAdd as u16, 128);
        assert_eq!(Op::Phi as u16, 245);
        assert_eq!(Op::SatConvertSToU as u16, 118);
        assert_eq!(Op::from_u16(248), Some(Op::Label));
        assert_eq!(Op::from_u16(3), None);
    }

    #[test]
    fn names_and_layouts() {
        assert_eq!(Op::VectorInsertDynamic.name(), "OpVectorInsertDynamic");
        assert_eq!(Op::TypeInt.result_layout().result_index(), Some(0));
        assert_eq!(Op::Load.result_layout().result_index(), Some(1));
        assert_eq!(Op::Store.result_layout().result_index(), None);
    }

    #[test]
    fn version_encoding() {
        assert_eq!(version_word(1, 0), 0x0001_0000);
        assert_eq!(version_word(1, 3), 0x0001_0300);
    }
}
