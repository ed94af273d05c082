#![allow(clippy::unwrap_used, reason = "tests can panic")]

use pretty_assertions::assert_eq;
use vkgen_ir::{Expr, Stmt, Type};

use super::helper::{int32_params, module_instructions};
use crate::spirv::{self, Op};
use crate::{validate, DeviceArgument, DeviceCodegen, EmitError, EmitOptions, UserError};

fn int(name: &str) -> Expr {
    Expr::var(Type::int(32), name)
}

fn count(words: &[u32], op: Op) -> usize {
    module_instructions(words)
        .iter()
        .filter(|i| i.op == Some(op))
        .count()
}

/// A kernel exercising loops, selects, lets and vectors.
fn busy_kernel() -> Stmt {
    let v = Expr::ramp(int("a"), Expr::int32(1), 4);
    Stmt::Block(vec![
        Stmt::serial_for(
            "i",
            Expr::int32(0),
            int("n"),
            Stmt::evaluate((int("i") + int("a")) / int("n")),
        ),
        Stmt::evaluate(Expr::select(
            v.clone().cmp_gt(Expr::broadcast(Expr::int32(3), 4)),
            v,
            Expr::broadcast(int("n"), 4),
        )),
        Stmt::if_then_else(
            int("a").cmp_eq(int("n")),
            Stmt::evaluate(int("a").max(int("n"))),
            None,
        ),
    ])
}

#[test]
fn header_layout() {
    let codegen = DeviceCodegen::new(EmitOptions::default().with_version(1, 3));
    let words = codegen.compile_to_words();
    assert_eq!(words, vec![spirv::MAGIC_NUMBER, 0x0001_0300, 0, 1, 0]);
}

#[test]
fn bound_is_one_past_the_highest_id() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen
        .add_kernel(&busy_kernel(), "busy", &int32_params(&["a", "n"]))
        .unwrap();
    let words = codegen.compile_to_words();
    let stats = validate(&words).unwrap();
    assert_eq!(stats.bound, stats.max_id + 1);
}

#[test]
fn types_and_constants_are_shared_across_kernels() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    let body = Stmt::evaluate(int("a") + Expr::int32(1));
    codegen.add_kernel(&body, "first", &int32_params(&["a"])).unwrap();
    codegen.add_kernel(&body, "second", &int32_params(&["a"])).unwrap();
    let words = codegen.compile_to_words();

    validate(&words).unwrap();
    assert_eq!(count(&words, Op::TypeInt), 1);
    assert_eq!(count(&words, Op::TypeVoid), 1);
    assert_eq!(count(&words, Op::TypeFunction), 1);
    assert_eq!(count(&words, Op::Constant), 1);
    assert_eq!(count(&words, Op::Function), 2);
}

#[test]
fn signed_and_unsigned_share_one_integer_type() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    let body = Stmt::Block(vec![
        Stmt::evaluate(int("a") + Expr::int32(7)),
        Stmt::evaluate(Expr::var(Type::uint(32), "b") + Expr::uint32(7)),
    ]);
    let args = [
        DeviceArgument::scalar("a", Type::int(32)),
        DeviceArgument::scalar("b", Type::uint(32)),
    ];
    codegen.add_kernel(&body, "mixed", &args).unwrap();
    let words = codegen.compile_to_words();

    let ints: Vec<_> = module_instructions(&words)
        .into_iter()
        .filter(|i| i.op == Some(Op::TypeInt))
        .collect();
    assert_eq!(ints.len(), 1);
    assert_eq!(&ints[0].operands[1..], &[32, 0]);
    assert_eq!(count(&words, Op::Constant), 1);
}

#[test]
fn definitions_precede_code() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen
        .add_kernel(&busy_kernel(), "busy", &int32_params(&["a", "n"]))
        .unwrap();
    let words = codegen.compile_to_words();
    let insts = module_instructions(&words);
    let function = insts.iter().position(|i| i.op == Some(Op::Function)).unwrap();
    for inst in &insts[function..] {
        let op = inst.op.unwrap();
        assert!(
            !matches!(
                op,
                Op::TypeInt
                    | Op::TypeBool
                    | Op::TypeVector
                    | Op::TypePointer
                    | Op::Constant
                    | Op::ConstantTrue
                    | Op::ConstantFalse
                    | Op::ConstantComposite
                    | Op::ConstantNull
            ),
            "{} after the first function",
            op.name()
        );
    }
}

#[test]
fn function_shape() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen
        .add_kernel(&busy_kernel(), "busy", &int32_params(&["a", "n"]))
        .unwrap();
    let words = codegen.compile_to_words();
    let ops: Vec<Op> = module_instructions(&words)
        .iter()
        .map(|i| i.op.unwrap())
        .skip_while(|&op| op != Op::Function)
        .collect();
    assert_eq!(
        &ops[..4],
        &[Op::Function, Op::FunctionParameter, Op::FunctionParameter, Op::Label]
    );
    assert_eq!(&ops[ops.len() - 2..], &[Op::Return, Op::FunctionEnd]);
}

#[test]
fn literal_zero_divisor_is_a_user_error_and_leaves_the_module_unchanged() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen
        .add_kernel(
            &Stmt::evaluate(int("a") + Expr::int32(1)),
            "ok",
            &int32_params(&["a"]),
        )
        .unwrap();
    let before = codegen.compile_to_words();

    let body = Stmt::evaluate((int("a") + Expr::int32(1)) / Expr::int32(0));
    let err = codegen
        .add_kernel(&body, "bad", &int32_params(&["a"]))
        .unwrap_err();
    assert!(err.is_user_error());
    assert_eq!(
        err,
        EmitError::User(UserError::DivisionByZero {
            expr: "((a + 1) / 0)".into()
        })
    );
    assert_eq!(codegen.compile_to_words(), before);
}

#[test]
fn binary_round_trips_through_the_reader() {
    let mut codegen = DeviceCodegen::new(EmitOptions::default());
    codegen
        .add_kernel(&busy_kernel(), "busy", &int32_params(&["a", "n"]))
        .unwrap();
    let bytes = codegen.compile_to_binary().unwrap();
    assert_eq!(&bytes[..4], &spirv::MAGIC_NUMBER.to_le_bytes());
    assert_eq!(
        crate::reader::words_from_bytes(&bytes),
        codegen.compile_to_words()
    );
}
