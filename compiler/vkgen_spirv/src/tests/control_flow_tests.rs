#![allow(
    clippy::unwrap_used,
    clippy::cast_sign_loss,
    reason = "tests can panic and pass raw bit patterns"
)]

use pretty_assertions::assert_eq;
use rustc_hash::{FxHashMap, FxHashSet};
use vkgen_ir::{Expr, ForKind, Intrinsic, Stmt, Type};

use super::helper::{compile_kernel, module_instructions, run, try_compile};
use crate::spirv::Op;
use crate::{EmitError, EmitOptions, LoopBound};

fn int(name: &str) -> Expr {
    Expr::var(Type::int(32), name)
}

fn word(v: i32) -> u64 {
    u64::from(v as u32)
}

/// Every phi must name only blocks that branch to the block holding it.
fn assert_phis_name_predecessors(words: &[u32]) {
    let mut successors: FxHashMap<u32, FxHashSet<u32>> = FxHashMap::default();
    let mut phis = Vec::new();
    let mut current = 0;
    for inst in module_instructions(words) {
        let o = inst.operands;
        match inst.op {
            Some(Op::Label) => current = o[0],
            Some(Op::Branch) => {
                successors.entry(current).or_default().insert(o[0]);
            }
            Some(Op::BranchConditional) => {
                let targets = successors.entry(current).or_default();
                targets.insert(o[1]);
                targets.insert(o[2]);
            }
            Some(Op::Phi) => {
                let incoming: Vec<u32> = o[2..].chunks(2).map(|pair| pair[1]).collect();
                phis.push((current, incoming));
            }
            _ => {}
        }
    }
    assert!(!phis.is_empty(), "no phi emitted");
    for (block, incoming) in phis {
        for label in incoming {
            assert!(
                successors.get(&label).is_some_and(|s| s.contains(&block)),
                "phi in %{block} names %{label}, which does not branch to it"
            );
        }
    }
}

// ── Loops ───────────────────────────────────────────────────────────

fn counting_loop(min: Expr, extent: Expr) -> Stmt {
    Stmt::serial_for("i", min, extent, Stmt::evaluate(int("i") * Expr::int32(7)))
}

#[test]
fn loop_runs_extent_times() {
    let body = counting_loop(Expr::int32(0), Expr::int32(3));
    let words = compile_kernel(EmitOptions::default(), &body, &[]);
    let exec = run(&words, &[]);
    assert_eq!(exec.results_of(Op::IMul), vec![0, 7, 14]);
}

#[test]
fn inclusive_bound_runs_one_extra_iteration() {
    let body = counting_loop(Expr::int32(0), Expr::int32(3));
    let options = EmitOptions::default().with_loop_bound(LoopBound::Inclusive);
    let words = compile_kernel(options, &body, &[]);
    let exec = run(&words, &[]);
    assert_eq!(exec.results_of(Op::IMul), vec![0, 7, 14, 21]);
}

#[test]
fn loop_bounds_from_parameters() {
    let body = counting_loop(int("lo"), int("n"));
    let words = compile_kernel(EmitOptions::default(), &body, &["lo", "n"]);
    assert_eq!(run(&words, &[word(5), word(2)]).results_of(Op::IMul), vec![35, 42]);
    assert_eq!(run(&words, &[word(5), word(0)]).executed(Op::IMul), 0);
    assert_eq!(run(&words, &[word(5), word(-3)]).executed(Op::IMul), 0);
}

#[test]
fn nested_loops_multiply_trip_counts() {
    let inner = Stmt::serial_for(
        "j",
        Expr::int32(0),
        Expr::int32(2),
        Stmt::evaluate(int("i") * int("j")),
    );
    let outer = Stmt::serial_for("i", Expr::int32(0), Expr::int32(3), inner);
    let words = compile_kernel(EmitOptions::default(), &outer, &[]);
    let exec = run(&words, &[]);
    assert_eq!(exec.results_of(Op::IMul), vec![0, 0, 0, 1, 0, 2]);
}

#[test]
fn loop_header_declares_merge_and_continue() {
    let body = counting_loop(Expr::int32(0), Expr::int32(3));
    let words = compile_kernel(EmitOptions::default(), &body, &[]);
    let insts = module_instructions(&words);
    let merge = insts.iter().find(|i| i.op == Some(Op::LoopMerge)).unwrap();
    let labels: Vec<u32> = insts
        .iter()
        .filter(|i| i.op == Some(Op::Label))
        .map(|i| i.operands[0])
        .collect();
    // Header, top, body, continue, merge follow the entry label in order.
    assert_eq!(labels.len(), 6);
    assert_eq!(merge.operands[0], labels[5]);
    assert_eq!(merge.operands[1], labels[4]);
    // The loop variable is declared before any code.
    let variable = insts.iter().position(|i| i.op == Some(Op::Variable)).unwrap();
    let entry = insts.iter().position(|i| i.op == Some(Op::Label)).unwrap();
    assert_eq!(variable, entry + 1);

    let exec = run(&words, &[]);
    assert_eq!(exec.visits(labels[1]), 4);
    assert_eq!(exec.visits(labels[3]), 3);
    assert_eq!(exec.visits(labels[5]), 1);
}

#[test]
fn loop_variable_is_scoped_to_the_body() {
    let body = Stmt::Block(vec![
        counting_loop(Expr::int32(0), Expr::int32(1)),
        Stmt::evaluate(int("i") + Expr::int32(1)),
    ]);
    let err = try_compile(&body, &[]).unwrap_err();
    assert_eq!(err, EmitError::MalformedIr("unbound name `i`".into()));
}

#[test]
fn parallel_loops_are_rejected() {
    let body = Stmt::For {
        name: "i".into(),
        min: Expr::int32(0),
        extent: Expr::int32(4),
        kind: ForKind::Parallel,
        body: Box::new(Stmt::evaluate(int("i"))),
    };
    let err = try_compile(&body, &[]).unwrap_err();
    assert!(matches!(err, EmitError::UnsupportedConstruct { .. }), "{err}");
}

#[test]
fn loop_bounds_must_be_int32() {
    let body = Stmt::serial_for(
        "i",
        Expr::uint32(0),
        Expr::uint32(3),
        Stmt::evaluate(Expr::int32(0)),
    );
    let err = try_compile(&body, &[]).unwrap_err();
    assert!(matches!(err, EmitError::MalformedIr(_)), "{err}");
}

// ── Conditionals ────────────────────────────────────────────────────

#[test]
fn if_statement_runs_one_arm() {
    let body = Stmt::if_then_else(
        int("a").cmp_lt(int("b")),
        Stmt::evaluate(int("a") * Expr::int32(2)),
        Some(Stmt::evaluate(int("b") * Expr::int32(3))),
    );
    let words = compile_kernel(EmitOptions::default(), &body, &["a", "b"]);
    assert_eq!(run(&words, &[word(1), word(5)]).results_of(Op::IMul), vec![2]);
    assert_eq!(run(&words, &[word(9), word(5)]).results_of(Op::IMul), vec![15]);
}

#[test]
fn if_without_else_still_reaches_the_merge() {
    let body = Stmt::Block(vec![
        Stmt::if_then_else(
            int("a").cmp_eq(Expr::int32(0)),
            Stmt::evaluate(int("a") * Expr::int32(2)),
            None,
        ),
        Stmt::evaluate(int("a") * Expr::int32(3)),
    ]);
    let words = compile_kernel(EmitOptions::default(), &body, &["a"]);
    assert_eq!(run(&words, &[word(4)]).results_of(Op::IMul), vec![12]);
    assert_eq!(run(&words, &[word(0)]).results_of(Op::IMul), vec![0, 0]);
}

#[test]
fn select_evaluates_only_the_taken_arm() {
    let value = Expr::intrinsic(
        Type::int(32),
        Intrinsic::IfThenElse,
        vec![
            int("a").cmp_gt(Expr::int32(0)),
            int("a") * Expr::int32(2),
            int("a") * Expr::int32(3),
        ],
    );
    let words = compile_kernel(EmitOptions::default(), &Stmt::evaluate(value), &["a"]);
    let exec = run(&words, &[word(4)]);
    assert_eq!(exec.results_of(Op::IMul), vec![8]);
    assert_eq!(exec.last_value(), 8);
    let exec = run(&words, &[word(-4)]);
    assert_eq!(exec.results_of(Op::IMul), vec![u64::from((-12i32) as u32)]);
}

#[test]
fn nested_select_phis_name_the_exit_blocks() {
    let inner = Expr::select(int("b").cmp_lt(Expr::int32(0)), Expr::int32(1), Expr::int32(2));
    let value = Expr::select(int("a").cmp_lt(Expr::int32(0)), inner, Expr::int32(3));
    let words = compile_kernel(EmitOptions::default(), &Stmt::evaluate(value), &["a", "b"]);
    assert_phis_name_predecessors(&words);

    let cases = [(-1, -1, 1), (-1, 1, 2), (1, -1, 3), (1, 1, 3)];
    for (a, b, expected) in cases {
        assert_eq!(run(&words, &[word(a), word(b)]).last_value(), expected, "a={a} b={b}");
    }
}

#[test]
fn select_in_a_loop_body() {
    let body = Stmt::serial_for(
        "i",
        Expr::int32(0),
        Expr::int32(4),
        Stmt::evaluate(
            Expr::select(
                int("i").cmp_lt(Expr::int32(2)),
                int("i"),
                Expr::int32(9),
            ) * Expr::int32(1),
        ),
    );
    let words = compile_kernel(EmitOptions::default(), &body, &[]);
    assert_phis_name_predecessors(&words);
    assert_eq!(run(&words, &[]).results_of(Op::IMul), vec![0, 1, 9, 9]);
}

#[test]
fn vector_conditions_are_rejected_for_branches() {
    let condition = Expr::broadcast(Expr::bool_imm(true), 4);
    let body = Stmt::if_then_else(condition, Stmt::evaluate(Expr::int32(0)), None);
    let err = try_compile(&body, &[]).unwrap_err();
    assert!(matches!(err, EmitError::MalformedIr(_)), "{err}");
}

#[test]
fn vector_condition_over_scalar_arms_is_malformed() {
    let condition = Expr::ramp(int("a"), Expr::int32(1), 4).cmp_lt(Expr::broadcast(int("b"), 4));
    let select = Expr::select(condition.clone(), int("a"), int("b"));
    let call = Expr::intrinsic(
        Type::int(32),
        Intrinsic::IfThenElse,
        vec![condition, int("a"), int("b")],
    );
    for value in [select, call] {
        let err = try_compile(&Stmt::evaluate(value), &["a", "b"]).unwrap_err();
        assert!(matches!(err, EmitError::MalformedIr(_)), "{err}");
    }
}

#[test]
fn select_condition_lanes_must_match_the_arms() {
    let condition = Expr::broadcast(Expr::bool_imm(true), 2);
    let value = Expr::select(
        condition,
        Expr::broadcast(int("a"), 4),
        Expr::broadcast(int("b"), 4),
    );
    let err = try_compile(&Stmt::evaluate(value), &["a", "b"]).unwrap_err();
    assert!(matches!(err, EmitError::MalformedIr(_)), "{err}");
}

// ── Lets ────────────────────────────────────────────────────────────

#[test]
fn inner_let_shadows_and_outer_binding_is_restored() {
    // let x = 10 in (let x = 20 in x) + x
    let value = Expr::let_in(
        "x",
        Expr::int32(10),
        Expr::let_in("x", Expr::int32(20), int("x")) + int("x"),
    );
    let words = compile_kernel(EmitOptions::default(), &Stmt::evaluate(value), &[]);
    let insts = module_instructions(&words);
    let constant = |v: u32| {
        insts
            .iter()
            .find(|i| i.op == Some(Op::Constant) && i.operands[2] == v)
            .unwrap()
            .operands[1]
    };
    let add = insts.iter().find(|i| i.op == Some(Op::IAdd)).unwrap();
    assert_eq!(&add.operands[2..], &[constant(20), constant(10)]);
    assert_eq!(run(&words, &[]).last_value(), 30);
}

#[test]
fn let_statement_binds_its_value_once() {
    let body = Stmt::let_stmt(
        "y",
        int("a") * Expr::int32(2),
        Stmt::Block(vec![
            Stmt::evaluate(int("y") + Expr::int32(1)),
            Stmt::evaluate(int("y") + Expr::int32(2)),
        ]),
    );
    let words = compile_kernel(EmitOptions::default(), &body, &["a"]);
    let exec = run(&words, &[word(5)]);
    assert_eq!(exec.executed(Op::IMul), 1);
    assert_eq!(exec.results_of(Op::IAdd), vec![11, 12]);
}

#[test]
fn let_statement_binding_ends_with_its_body() {
    let body = Stmt::Block(vec![
        Stmt::let_stmt("y", Expr::int32(1), Stmt::evaluate(int("y"))),
        Stmt::evaluate(int("y")),
    ]);
    let err = try_compile(&body, &[]).unwrap_err();
    assert_eq!(err, EmitError::MalformedIr("unbound name `y`".into()));
}

// ── Barriers ────────────────────────────────────────────────────────

#[test]
fn thread_barrier_statement_emits_nothing() {
    let barrier = Stmt::evaluate(Expr::intrinsic(
        Type::int(32),
        Intrinsic::GpuThreadBarrier,
        vec![],
    ));
    let with_barrier = compile_kernel(
        EmitOptions::default(),
        &Stmt::Block(vec![barrier, Stmt::evaluate(int("a") + Expr::int32(1))]),
        &["a"],
    );
    let without = compile_kernel(
        EmitOptions::default(),
        &Stmt::evaluate(int("a") + Expr::int32(1)),
        &["a"],
    );
    assert_eq!(with_barrier, without);
}

#[test]
fn thread_barrier_as_a_value_is_rejected() {
    let barrier = Expr::intrinsic(Type::int(32), Intrinsic::GpuThreadBarrier, vec![]);
    let err = try_compile(&Stmt::evaluate(barrier + Expr::int32(1)), &[]).unwrap_err();
    assert!(matches!(err, EmitError::MalformedIr(_)), "{err}");
}
