use super::*;
use crate::lexer;
use crate::parser;

fn emit_source(source: &str) -> TacProgram {
    let parsed = parser::parse(&lexer::lex(source));
    assert!(
        parsed.errors.is_empty(),
        "test sources must parse cleanly: {:?}",
        parsed.errors
    );
    emit(&parsed.program)
}

fn ops(instructions: &[TacInstruction]) -> Vec<TacOp> {
    instructions.iter().map(|i| i.op).collect()
}

fn find_op<'a>(instructions: &'a [TacInstruction], op: TacOp) -> &'a TacInstruction {
    instructions
        .iter()
        .find(|i| i.op == op)
        .unwrap_or_else(|| panic!("no {op:?} instruction emitted"))
}

fn labels(instructions: &[TacInstruction]) -> Vec<&str> {
    instructions
        .iter()
        .filter(|i| i.is_label())
        .map(|i| i.label.as_deref().unwrap())
        .collect()
}

#[test]
fn test_minimal_main_shape() {
    let tac = emit_source("int main() { return 0; }");
    assert!(tac.errors.is_empty());
    assert_eq!(
        ops(&tac.instructions),
        vec![
            TacOp::Label,
            TacOp::FunctionStart,
            TacOp::Return,
            TacOp::FunctionEnd,
        ]
    );
    assert_eq!(tac.instructions[0].label.as_deref(), Some("main"));
    assert_eq!(tac.instructions[1].arg1.as_deref(), Some("main"));
    assert_eq!(tac.instructions[2].arg1.as_deref(), Some("0"));
    assert_eq!(tac.instructions[3].arg1.as_deref(), Some("main"));
}

#[test]
fn test_binary_expression_uses_fresh_temp() {
    let tac = emit_source("int main() { int y = 2 + 3; return y; }");
    let add = find_op(&tac.instructions, TacOp::Add);
    assert_eq!(add.arg1.as_deref(), Some("2"));
    assert_eq!(add.arg2.as_deref(), Some("3"));
    assert_eq!(add.result.as_deref(), Some("t0"));
    // The temp is then stored into the declared variable.
    let assign = find_op(&tac.instructions, TacOp::Assign);
    assert_eq!(assign.arg1.as_deref(), Some("t0"));
    assert_eq!(assign.result.as_deref(), Some("y"));
    assert_eq!(tac.temp_count, 1);
}

#[test]
fn test_pre_increment_steps_in_place() {
    let tac = emit_source("int main() { int x = 1; ++x; return x; }");
    let step = find_op(&tac.instructions, TacOp::Add);
    assert_eq!(step.arg1.as_deref(), Some("x"));
    assert_eq!(step.arg2.as_deref(), Some("1"));
    assert_eq!(step.result.as_deref(), Some("x"));
}

#[test]
fn test_post_increment_saves_old_value() {
    let tac = emit_source("int main() { int x = 1; int y = x++; return y; }");
    let instructions = &tac.instructions;
    let save = instructions
        .iter()
        .position(|i| i.op == TacOp::Assign && i.arg1.as_deref() == Some("x"))
        .expect("old value must be saved to a temp");
    let step = instructions
        .iter()
        .position(|i| i.op == TacOp::Add && i.result.as_deref() == Some("x"))
        .expect("variable must be stepped");
    assert!(save < step, "save must happen before the step");
    let saved_temp = instructions[save].result.as_deref().unwrap();
    // `y` receives the saved temp, not the stepped variable.
    assert!(instructions
        .iter()
        .any(|i| i.op == TacOp::Assign
            && i.arg1.as_deref() == Some(saved_temp)
            && i.result.as_deref() == Some("y")));
}

#[test]
fn test_call_params_in_source_order() {
    let tac = emit_source(
        "int add(int a, int b) { return a + b; } int main() { return add(1, 2); }",
    );
    let params: Vec<&str> = tac
        .instructions
        .iter()
        .filter(|i| i.op == TacOp::Param)
        .map(|i| i.arg1.as_deref().unwrap())
        .collect();
    assert_eq!(params, vec!["1", "2"]);
    let call = find_op(&tac.instructions, TacOp::Call);
    assert_eq!(call.arg1.as_deref(), Some("add"));
    assert_eq!(call.arg2.as_deref(), Some("2"));
    assert!(call.result.is_some());
}

#[test]
fn test_if_else_label_discipline() {
    let tac = emit_source("int main() { if (1) return 1; else return 2; return 0; }");
    let if_false = find_op(&tac.instructions, TacOp::IfFalse);
    assert_eq!(if_false.result.as_deref(), Some("IF_ELSE0"));
    let goto = find_op(&tac.instructions, TacOp::Goto);
    assert_eq!(goto.result.as_deref(), Some("IF_END0"));
    assert!(labels(&tac.instructions).contains(&"IF_ELSE0"));
    assert!(labels(&tac.instructions).contains(&"IF_END0"));
}

#[test]
fn test_while_loop_shape() {
    let tac = emit_source("int main() { while (1) { break; } return 0; }");
    let all_labels = labels(&tac.instructions);
    assert!(all_labels.contains(&"WHILE_START0"));
    assert!(all_labels.contains(&"WHILE_END0"));
    let if_false = find_op(&tac.instructions, TacOp::IfFalse);
    assert_eq!(if_false.result.as_deref(), Some("WHILE_END0"));
    // `break` and the loop back-edge both show up as jumps.
    let gotos: Vec<&str> = tac
        .instructions
        .iter()
        .filter(|i| i.op == TacOp::Goto)
        .map(|i| i.result.as_deref().unwrap())
        .collect();
    assert!(gotos.contains(&"WHILE_END0"));
    assert!(gotos.contains(&"WHILE_START0"));
}

#[test]
fn test_for_loop_labels_and_backedge() {
    let tac = emit_source("int main() { for (int i = 0; i < 3; i = i + 1) { } return 0; }");
    let all_labels = labels(&tac.instructions);
    assert!(all_labels.contains(&"FOR_START0"));
    assert!(all_labels.contains(&"FOR_CONTINUE0"));
    assert!(all_labels.contains(&"FOR_END0"));
    let if_false = find_op(&tac.instructions, TacOp::IfFalse);
    assert_eq!(if_false.result.as_deref(), Some("FOR_END0"));

    // The back-edge jump comes after the continue label and the update.
    let continue_at = tac
        .instructions
        .iter()
        .position(|i| i.label.as_deref() == Some("FOR_CONTINUE0"))
        .unwrap();
    let backedge_at = tac
        .instructions
        .iter()
        .position(|i| i.op == TacOp::Goto && i.result.as_deref() == Some("FOR_START0"))
        .unwrap();
    assert!(continue_at < backedge_at);
}

#[test]
fn test_continue_targets_continue_label() {
    let tac = emit_source("int main() { for (;;) { continue; } return 0; }");
    assert!(tac
        .instructions
        .iter()
        .any(|i| i.op == TacOp::Goto && i.result.as_deref() == Some("FOR_CONTINUE0")));
}

#[test]
fn test_nested_loops_break_targets_innermost() {
    let source = "int main() { while (1) { for (;;) { break; } break; } return 0; }";
    let tac = emit_source(source);
    let gotos: Vec<&str> = tac
        .instructions
        .iter()
        .filter(|i| i.op == TacOp::Goto)
        .map(|i| i.result.as_deref().unwrap())
        .collect();
    // Inner break leaves the for loop, outer break leaves the while loop.
    assert!(gotos.contains(&"FOR_END1"));
    assert!(gotos.contains(&"WHILE_END0"));
}

#[test]
fn test_labels_are_unique() {
    let source = "int main() { if (1) {} if (2) {} while (3) {} for (;;) {} return 0; }";
    let tac = emit_source(source);
    let mut seen = std::collections::HashSet::new();
    for label in labels(&tac.instructions) {
        assert!(seen.insert(label), "label {label} emitted twice");
    }
}

#[test]
fn test_break_outside_loop_is_diagnosed() {
    let tac = emit_source("int main() { break; return 0; }");
    assert!(tac
        .errors
        .iter()
        .any(|e| e.kind == CodegenErrorKind::BreakOutsideLoop));
}

#[test]
fn test_string_literals_are_interned() {
    let tac = emit_source(r#"int main() { printf("a"); printf("b"); printf("a"); return 0; }"#);
    assert_eq!(
        tac.string_literals,
        vec![
            ("str0".to_owned(), "\"a\"".to_owned()),
            ("str1".to_owned(), "\"b\"".to_owned()),
        ]
    );
    // Params reference the generated labels.
    let params: Vec<&str> = tac
        .instructions
        .iter()
        .filter(|i| i.op == TacOp::Param)
        .map(|i| i.arg1.as_deref().unwrap())
        .collect();
    assert_eq!(params, vec!["str0", "str1", "str0"]);
}

#[test]
fn test_char_literal_lowers_to_code() {
    let tac = emit_source("int main() { return 'a'; }");
    let ret = find_op(&tac.instructions, TacOp::Return);
    assert_eq!(ret.arg1.as_deref(), Some("97"));
}

#[test]
fn test_include_and_global_declare() {
    let tac = emit_source("#include <stdio.h>\nint counter;\nint main() { return 0; }");
    assert_eq!(tac.included_headers, vec!["stdio.h"]);
    let include = find_op(&tac.instructions, TacOp::Include);
    assert_eq!(include.arg1.as_deref(), Some("stdio.h"));
    let declare = find_op(&tac.instructions, TacOp::Declare);
    assert_eq!(declare.arg1.as_deref(), Some("counter"));
}

#[test]
fn test_deterministic_emission() {
    let source = "int main() { int a = 1 + 2; while (a) { a = a - 1; } return a; }";
    let first = emit_source(source);
    let second = emit_source(source);
    assert_eq!(first.instructions, second.instructions);
}

mod optimizer {
    use super::*;

    fn optimize_source(source: &str) -> (TacProgram, Optimized) {
        let tac = emit_source(source);
        let optimized = optimize(&tac.instructions);
        (tac, optimized)
    }

    fn non_label_count(instructions: &[TacInstruction]) -> usize {
        instructions.iter().filter(|i| !i.is_label()).count()
    }

    #[test]
    fn test_constant_folding() {
        let (tac, optimized) = optimize_source("int main() { int y = 2 + 3; return y; }");
        assert!(optimized
            .instructions
            .iter()
            .all(|i| i.op != TacOp::Add));
        assert!(optimized
            .instructions
            .iter()
            .any(|i| i.op == TacOp::Assign
                && i.arg1.as_deref() == Some("5")
                && i.result.as_deref() == Some("y")));
        assert!(non_label_count(&optimized.instructions) < non_label_count(&tac.instructions));
    }

    #[test]
    fn test_add_zero_identity() {
        let (_, optimized) = optimize_source("int main() { int x = 7; int y = x + 0; return y; }");
        assert!(optimized.instructions.iter().all(|i| i.op != TacOp::Add));
    }

    #[test]
    fn test_multiply_by_zero() {
        let (_, optimized) = optimize_source("int main() { int x = 7; int y = x * 0; return y; }");
        assert!(optimized.instructions.iter().all(|i| i.op != TacOp::Mul));
        assert!(optimized
            .instructions
            .iter()
            .any(|i| i.op == TacOp::Assign
                && i.arg1.as_deref() == Some("0")
                && i.result.as_deref() == Some("y")));
    }

    #[test]
    fn test_dead_store_elimination() {
        let instructions = vec![
            TacInstruction::assign("1", "x"),
            TacInstruction::assign("2", "x"),
        ];
        let optimized = optimize(&instructions);
        let stores: Vec<_> = optimized
            .instructions
            .iter()
            .filter(|i| i.op == TacOp::Assign)
            .collect();
        assert_eq!(stores.len(), 1);
        assert_eq!(stores[0].arg1.as_deref(), Some("2"));
    }

    #[test]
    fn test_self_referencing_store_is_kept() {
        let instructions = vec![
            TacInstruction::assign("1", "x"),
            TacInstruction::assign("x", "x"),
        ];
        let optimized = optimize(&instructions);
        assert_eq!(optimized.instructions.len(), 2);
    }

    #[test]
    fn test_monotonic_and_idempotent() {
        let source = "int main() { int a = 2 + 3 * 4; int b = a + 0; return a * 1 + b; }";
        let tac = emit_source(source);
        let once = optimize(&tac.instructions);
        assert!(once.instructions.len() <= tac.instructions.len());
        let twice = optimize(&once.instructions);
        assert_eq!(once.instructions, twice.instructions);
        assert_eq!(twice.passes, 1);
    }

    #[test]
    fn test_pass_budget_is_bounded() {
        let source = "int main() { int a = 1 + 1 + 1 + 1 + 1 + 1 + 1 + 1; return a; }";
        let (_, optimized) = optimize_source(source);
        assert!(optimized.passes <= 5);
    }

    #[test]
    fn test_folding_applies_to_every_constant_pair() {
        let (_, optimized) = optimize_source("int main() { return (2 + 3) * (1 + 1); }");
        // Both additions fold; the product of temps is left alone.
        assert!(optimized.instructions.iter().all(|i| i.op != TacOp::Add));
        assert!(optimized
            .instructions
            .iter()
            .any(|i| i.op == TacOp::Assign && i.arg1.as_deref() == Some("5")));
        assert!(optimized
            .instructions
            .iter()
            .any(|i| i.op == TacOp::Mul));
    }
}
