//! Test fixtures and a small interpreter for emitted modules.
//!
//! The interpreter executes the first function of a module over the
//! integer, boolean and integer-vector subset the emitter produces. It
//! records every value-producing instruction it executes and how often
//! each block is entered, which is enough to check loop trip counts,
//! single evaluation of operands and the results of rewritten arithmetic.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    reason = "test interpreter reinterprets raw words and can panic"
)]

use rustc_hash::FxHashMap;
use vkgen_ir::{Stmt, Type};

use crate::builder::ModuleBuilder;
use crate::emitter::{Emitter, FunctionBody};
use crate::error::EmitError;
use crate::options::EmitOptions;
use crate::reader::{Instruction, Instructions};
use crate::scope::Scope;
use crate::spirv::Op;
use crate::{DeviceArgument, DeviceCodegen};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Run `f` against a fresh emitter, returning its result together with the
/// module state and the emitted function body.
pub fn with_emitter<T>(
    scope: Scope,
    f: impl FnOnce(&mut Emitter<'_>) -> T,
) -> (T, ModuleBuilder, FunctionBody) {
    let options = EmitOptions::default();
    let mut module = ModuleBuilder::new(options.version_word());
    let entry = module.allocate_id();
    let mut emitter = Emitter::new(&mut module, &options, scope, entry);
    let out = f(&mut emitter);
    let body = emitter.finish();
    (out, module, body)
}

/// Compile a single kernel with scalar `int32` parameters named `params`.
pub fn compile_kernel(options: EmitOptions, body: &Stmt, params: &[&str]) -> Vec<u32> {
    compile_typed_kernel(options, body, &int32_params(params))
}

pub fn compile_typed_kernel(options: EmitOptions, body: &Stmt, args: &[DeviceArgument]) -> Vec<u32> {
    let mut codegen = DeviceCodegen::new(options);
    codegen.add_kernel(body, "kernel", args).unwrap();
    let words = codegen.compile_to_words();
    crate::reader::validate(&words).unwrap();
    words
}

pub fn try_compile(body: &Stmt, params: &[&str]) -> Result<Vec<u32>, EmitError> {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen.add_kernel(body, "kernel", &int32_params(params))?;
    Ok(codegen.compile_to_words())
}

pub fn int32_params(names: &[&str]) -> Vec<DeviceArgument> {
    names
        .iter()
        .map(|n| DeviceArgument::scalar(*n, Type::int(32)))
        .collect()
}

/// Decoded instructions of a headerless word slice.
pub fn decode(words: &[u32]) -> Vec<Instruction<'_>> {
    Instructions::segment(words).map(Result::unwrap).collect()
}

/// Opcodes of a headerless word slice, in order.
pub fn opcodes(words: &[u32]) -> Vec<Op> {
    decode(words).iter().map(|i| i.op.unwrap()).collect()
}

/// Decoded instructions of a whole module.
pub fn module_instructions(words: &[u32]) -> Vec<Instruction<'_>> {
    Instructions::new(words).map(Result::unwrap).collect()
}

// ---------------------------------------------------------------------------
// Interpreter
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug)]
struct TypeDesc {
    bits: u32,
    lanes: usize,
}

#[derive(Clone, Debug)]
struct Value {
    bits: u32,
    lanes: Vec<u64>,
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn signed(v: u64, bits: u32) -> i64 {
    let shift = 64 - bits;
    ((v << shift) as i64) >> shift
}

/// Result of running a kernel.
#[derive(Debug, Default)]
pub struct Execution {
    trace: Vec<(Op, Vec<u64>)>,
    visits: FxHashMap<u32, usize>,
}

impl Execution {
    /// Lane 0 of the last value computed.
    pub fn last_value(&self) -> u64 {
        self.trace.last().expect("no value computed").1[0]
    }

    /// All lanes of the last value computed.
    pub fn last_lanes(&self) -> Vec<u64> {
        self.trace.last().expect("no value computed").1.clone()
    }

    /// Lane 0 of every executed `op`, in execution order.
    pub fn results_of(&self, op: Op) -> Vec<u64> {
        self.trace
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, v)| v[0])
            .collect()
    }

    pub fn executed(&self, op: Op) -> usize {
        self.trace.iter().filter(|(o, _)| *o == op).count()
    }

    /// How many times the block labelled `label` was entered.
    pub fn visits(&self, label: u32) -> usize {
        self.visits.get(&label).copied().unwrap_or(0)
    }
}

/// Execute the first function of `words` with `args` bound to its
/// parameters in order.
pub fn run(words: &[u32], args: &[u64]) -> Execution {
    let insts = module_instructions(words);
    let mut types: FxHashMap<u32, TypeDesc> = FxHashMap::default();
    let mut values: FxHashMap<u32, Value> = FxHashMap::default();

    let mut function_start = None;
    for (i, inst) in insts.iter().enumerate() {
        let o = inst.operands;
        match inst.op {
            Some(Op::TypeInt | Op::TypeFloat) => {
                types.insert(o[0], TypeDesc { bits: o[1], lanes: 1 });
            }
            Some(Op::TypeBool) => {
                types.insert(o[0], TypeDesc { bits: 1, lanes: 1 });
            }
            Some(Op::TypeVector) => {
                let e = types[&o[1]];
                types.insert(o[0], TypeDesc { bits: e.bits, lanes: o[2] as usize });
            }
            Some(Op::TypeStruct) => {
                let e = types[&o[1]];
                types.insert(o[0], TypeDesc { bits: e.bits, lanes: e.lanes * 2 });
            }
            Some(Op::Constant) => {
                let t = types[&o[0]];
                let mut v = u64::from(o[2]);
                if let Some(&hi) = o.get(3) {
                    v |= u64::from(hi) << 32;
                }
                values.insert(o[1], Value { bits: t.bits, lanes: vec![v & mask(t.bits)] });
            }
            Some(op @ (Op::ConstantTrue | Op::ConstantFalse)) => {
                let v = u64::from(op == Op::ConstantTrue);
                values.insert(o[1], Value { bits: 1, lanes: vec![v] });
            }
            Some(Op::ConstantComposite) => {
                let t = types[&o[0]];
                let lanes = o[2..].iter().map(|id| values[id].lanes[0]).collect();
                values.insert(o[1], Value { bits: t.bits, lanes });
            }
            Some(Op::ConstantNull) => {
                let t = types[&o[0]];
                values.insert(o[1], Value { bits: t.bits, lanes: vec![0; t.lanes] });
            }
            Some(Op::Function) => {
                function_start = Some(i);
                break;
            }
            _ => {}
        }
    }

    let start = function_start.expect("module has no function");
    let mut labels = FxHashMap::default();
    let mut end = insts.len();
    for (i, inst) in insts.iter().enumerate().skip(start) {
        match inst.op {
            Some(Op::Label) => {
                labels.insert(inst.operands[0], i);
            }
            Some(Op::FunctionEnd) => {
                end = i;
                break;
            }
            _ => {}
        }
    }

    let mut exec = Execution::default();
    let mut memory: FxHashMap<u32, Value> = FxHashMap::default();
    let mut args = args.iter();
    let (mut prev, mut cur) = (0, 0);
    let mut pc = start + 1;
    let mut steps = 0usize;
    while pc < end {
        steps += 1;
        assert!(steps < 1_000_000, "kernel did not terminate");
        let inst = &insts[pc];
        let o = inst.operands;
        pc += 1;
        let op = inst
            .op
            .unwrap_or_else(|| panic!("unknown opcode {}", inst.opcode));
        match op {
            Op::FunctionParameter => {
                let t = types[&o[0]];
                let v = *args.next().expect("missing kernel argument");
                values.insert(o[1], Value { bits: t.bits, lanes: vec![v & mask(t.bits)] });
            }
            Op::Label => {
                prev = cur;
                cur = o[0];
                *exec.visits.entry(cur).or_default() += 1;
            }
            Op::Branch => pc = labels[&o[0]],
            Op::BranchConditional => {
                let taken = if values[&o[0]].lanes[0] != 0 { o[1] } else { o[2] };
                pc = labels[&taken];
            }
            Op::SelectionMerge | Op::LoopMerge => {}
            Op::Variable => {
                memory.insert(o[1], Value { bits: 32, lanes: vec![0] });
            }
            Op::Store => {
                let v = values[&o[1]].clone();
                memory.insert(o[0], v);
            }
            Op::Return => break,
            _ => {
                let result = eval(op, o, &types, &values, &memory, prev);
                exec.trace.push((op, result.lanes.clone()));
                values.insert(o[1], result);
            }
        }
    }
    exec
}

fn eval(
    op: Op,
    o: &[u32],
    types: &FxHashMap<u32, TypeDesc>,
    values: &FxHashMap<u32, Value>,
    memory: &FxHashMap<u32, Value>,
    prev: u32,
) -> Value {
    let t = types[&o[0]];
    let arg = |i: usize| &values[&o[i]];
    let lanes: Vec<u64> = match op {
        Op::Load => return memory[&o[2]].clone(),
        Op::Phi => {
            let incoming = o[2..]
                .chunks(2)
                .find(|pair| pair[1] == prev)
                .expect("phi has no entry for the predecessor");
            return values[&incoming[0]].clone();
        }
        Op::CompositeConstruct => o[2..].iter().flat_map(|id| values[id].lanes.clone()).collect(),
        Op::CompositeExtract => {
            let i = o[3] as usize;
            arg(2).lanes[i * t.lanes..(i + 1) * t.lanes].to_vec()
        }
        Op::VectorInsertDynamic => {
            let mut v = arg(2).lanes.clone();
            v[arg(4).lanes[0] as usize] = arg(3).lanes[0];
            v
        }
        Op::VectorShuffle => {
            let mut all = arg(2).lanes.clone();
            all.extend_from_slice(&arg(3).lanes);
            o[4..].iter().map(|&i| all[i as usize]).collect()
        }
        Op::SMulExtended | Op::UMulExtended => {
            let (a, b) = (arg(2), arg(3));
            let bits = a.bits;
            let products: Vec<u128> = a
                .lanes
                .iter()
                .zip(&b.lanes)
                .map(|(&x, &y)| {
                    if op == Op::SMulExtended {
                        (i128::from(signed(x, bits)) * i128::from(signed(y, bits))) as u128
                    } else {
                        u128::from(x) * u128::from(y)
                    }
                })
                .collect();
            let m = u128::from(mask(bits));
            let low = products.iter().map(|p| (p & m) as u64);
            let high = products.iter().map(|p| ((p >> bits) & m) as u64);
            low.chain(high).collect()
        }
        Op::SConvert => {
            let a = arg(2);
            a.lanes.iter().map(|&x| signed(x, a.bits) as u64).collect()
        }
        Op::UConvert | Op::Bitcast => arg(2).lanes.clone(),
        Op::Not | Op::LogicalNot => arg(2).lanes.iter().map(|&x| !x).collect(),
        _ => {
            let (a, b) = (arg(2), arg(3));
            a.lanes
                .iter()
                .zip(&b.lanes)
                .map(|(&x, &y)| binary(op, x, y, a.bits))
                .collect()
        }
    };
    let bits = t.bits;
    Value {
        bits,
        lanes: lanes.into_iter().map(|v| v & mask(bits)).collect(),
    }
}

fn binary(op: Op, a: u64, b: u64, bits: u32) -> u64 {
    let (sa, sb) = (signed(a, bits), signed(b, bits));
    match op {
        Op::IAdd => a.wrapping_add(b),
        Op::ISub => a.wrapping_sub(b),
        Op::IMul => a.wrapping_mul(b),
        Op::SDiv => sa.wrapping_div(sb) as u64,
        Op::UDiv => a / b,
        Op::SRem => sa.wrapping_rem(sb) as u64,
        Op::UMod => a % b,
        Op::BitwiseAnd | Op::LogicalAnd => a & b,
        Op::BitwiseOr | Op::LogicalOr => a | b,
        Op::BitwiseXor | Op::LogicalNotEqual => a ^ b,
        Op::ShiftLeftLogical => a.wrapping_shl(b as u32),
        Op::ShiftRightLogical => a.wrapping_shr(b as u32),
        Op::ShiftRightArithmetic => sa.wrapping_shr(b as u32) as u64,
        Op::IEqual | Op::LogicalEqual => u64::from(a == b),
        Op::INotEqual => u64::from(a != b),
        Op::SLessThan => u64::from(sa < sb),
        Op::SLessThanEqual => u64::from(sa <= sb),
        Op::SGreaterThan => u64::from(sa > sb),
        Op::SGreaterThanEqual => u64::from(sa >= sb),
        Op::ULessThan => u64::from(a < b),
        Op::ULessThanEqual => u64::from(a <= b),
        Op::UGreaterThan => u64::from(a > b),
        Op::UGreaterThanEqual => u64::from(a >= b),
        other => panic!("interpreter cannot execute {}", other.name()),
    }
}
