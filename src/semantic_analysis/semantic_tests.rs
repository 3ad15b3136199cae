use super::*;
use crate::lexer;
use crate::parser;

fn analyze_source(source: &str) -> Analysis {
    let parsed = parser::parse(&lexer::lex(source));
    assert!(
        parsed.errors.is_empty(),
        "test sources must parse cleanly: {:?}",
        parsed.errors
    );
    analyze(&parsed.program, source)
}

fn codes(analysis: &Analysis) -> Vec<&'static str> {
    analysis.errors.iter().map(SemanticError::code).collect()
}

#[test]
fn test_minimal_main() {
    let analysis = analyze_source("int main() { return 0; }");
    assert!(analysis.errors.is_empty());
    let entries = analysis.symbols.display_entries();
    assert_eq!(entries.len(), 1);
    let main = entries.get("main").expect("main should be registered");
    assert!(main.is_function());
    assert_eq!(main.scope, GLOBAL_SCOPE);
}

#[test]
fn test_builtins_hidden_from_display() {
    let analysis = analyze_source("int main() { return 0; }");
    assert!(analysis.symbols.get(BUILTIN_SCOPE, "printf").is_some());
    assert!(!analysis.symbols.display_entries().contains_key("printf"));
}

#[test]
fn test_use_before_initialization() {
    let source = "int x; int main() { return x; }";
    let analysis = analyze_source(source);
    assert!(codes(&analysis).contains(&"used-before-initialization"));
    // `x` is read, so it must not also be reported unused.
    assert!(!codes(&analysis).contains(&"unused-variable"));
    let error = analysis
        .errors
        .iter()
        .find(|e| e.code() == "used-before-initialization")
        .unwrap();
    assert_eq!(error.message(), "Variable 'x' used before initialization");
    assert_eq!(error.severity(), Severity::Error);
}

#[test]
fn test_unused_variable_warning() {
    let analysis = analyze_source("int main() { int unused = 1; return 0; }");
    let warning = analysis
        .errors
        .iter()
        .find(|e| e.code() == "unused-variable")
        .expect("expected an unused-variable warning");
    assert_eq!(warning.message(), "Unused variable 'unused'");
    assert_eq!(warning.severity(), Severity::Warning);
    // Warnings alone leave the pipeline unblocked.
    assert!(analysis.is_clean());
}

#[test]
fn test_parameters_are_not_unused_or_uninitialized() {
    let analysis = analyze_source("int id(int value) { return value; } int main() { return id(3); }");
    assert!(analysis.errors.is_empty());
}

#[test]
fn test_undefined_function() {
    let analysis = analyze_source("int main() { foo(); return 0; }");
    let error = analysis
        .errors
        .iter()
        .find(|e| e.code() == "undefined-function")
        .expect("expected undefined-function error");
    assert_eq!(error.message(), "Call to undefined function 'foo'");
}

#[test]
fn test_arity_mismatch() {
    let source = "int add(int a, int b) { return a + b; } int main() { return add(1); }";
    let analysis = analyze_source(source);
    let error = analysis
        .errors
        .iter()
        .find(|e| e.code() == "argument-count")
        .expect("expected argument-count error");
    assert_eq!(
        error.message(),
        "Function 'add' called with 1 arguments, but expected 2"
    );
}

#[test]
fn test_variadic_builtin_accepts_any_arity() {
    let analysis =
        analyze_source("int main() { printf(\"%d %d\", 1, 2); return 0; }");
    assert!(analysis.errors.is_empty(), "{:?}", analysis.errors);
}

#[test]
fn test_redeclaration_in_same_scope() {
    let analysis = analyze_source("int main() { int a = 1; int a = 2; return a; }");
    assert!(codes(&analysis).contains(&"redeclaration"));
}

#[test]
fn test_shadowing_in_inner_scope_is_allowed() {
    let analysis =
        analyze_source("int main() { int a = 1; { int a = 2; return a; } }");
    assert!(!codes(&analysis).contains(&"redeclaration"));
}

#[test]
fn test_scope_isolation() {
    let source = "int main() { { int a = 1; } a = 2; return 0; }";
    let analysis = analyze_source(source);
    assert!(codes(&analysis).contains(&"undeclared-identifier"));
    // The inner symbol still exists in the table, under its block scope.
    assert!(analysis
        .symbols
        .display_entries()
        .keys()
        .any(|key| key.ends_with(".a")));
}

#[test]
fn test_block_scope_keys_are_deterministic() {
    let source = "int main() { { int a = 1; return a; } }";
    let first = analyze_source(source);
    let second = analyze_source(source);
    let first_keys: Vec<String> = first.symbols.display_entries().keys().cloned().collect();
    let second_keys: Vec<String> = second.symbols.display_entries().keys().cloned().collect();
    assert_eq!(first_keys, second_keys);
}

#[test]
fn test_assignment_marks_initialized() {
    let analysis = analyze_source("int main() { int a; a = 3; return a; }");
    assert!(!codes(&analysis).contains(&"used-before-initialization"));
}

#[test]
fn test_assignment_type_mismatch() {
    let analysis = analyze_source("int main() { char *p; p = 42; return 0; }");
    assert!(codes(&analysis).contains(&"assignment-type-mismatch"));
}

#[test]
fn test_numeric_widening_is_compatible() {
    let analysis = analyze_source("int main() { double d; d = 1; return 0; }");
    assert!(!codes(&analysis).contains(&"assignment-type-mismatch"));
}

#[test]
fn test_argument_type_mismatch() {
    let analysis = analyze_source("int main() { return strlen(5); }");
    let error = analysis
        .errors
        .iter()
        .find(|e| e.code() == "argument-type-mismatch")
        .expect("expected argument-type-mismatch");
    assert_eq!(error.severity(), Severity::Error);
}

#[test]
fn test_break_outside_loop() {
    let analysis = analyze_source("int main() { break; return 0; }");
    assert!(codes(&analysis).contains(&"break-outside-loop"));
}

#[test]
fn test_continue_inside_loop_is_fine() {
    let analysis =
        analyze_source("int main() { while (1) { continue; } return 0; }");
    assert!(!codes(&analysis).contains(&"continue-outside-loop"));
}

#[test]
fn test_missing_main() {
    let analysis = analyze_source("int helper() { return 1; }");
    assert!(codes(&analysis).contains(&"missing-main"));
}

#[test]
fn test_empty_program_has_no_missing_main() {
    let analysis = analyze_source("");
    assert!(analysis.errors.is_empty());
}

#[test]
fn test_macro_name_resolves() {
    let source = "#define LIMIT 10\nint main() { return LIMIT; }";
    let analysis = analyze_source(source);
    assert!(!codes(&analysis).contains(&"undeclared-identifier"));
    let limit = analysis
        .symbols
        .get(GLOBAL_SCOPE, "LIMIT")
        .expect("macro should be registered");
    assert_eq!(limit.kind, SymbolKind::Macro);
    assert_eq!(limit.value.as_deref(), Some("10"));
}

#[test]
fn test_include_registered_under_preprocessor_scope() {
    let source = "#include <stdio.h>\nint main() { return 0; }";
    let analysis = analyze_source(source);
    let header = analysis
        .symbols
        .get(PREPROCESSOR_SCOPE, "stdio.h")
        .expect("header should be registered");
    assert_eq!(header.kind, SymbolKind::Header);
    assert!(!analysis
        .symbols
        .display_entries()
        .contains_key("stdio.h"));
}

#[test]
fn test_error_lines() {
    let source = "int x;\nint main() {\n  return x;\n}\n";
    let analysis = analyze_source(source);
    let error = analysis
        .errors
        .iter()
        .find(|e| e.code() == "used-before-initialization")
        .unwrap();
    assert_eq!(error.line, 3);
}

#[test]
fn test_prototype_then_definition_is_not_redeclaration() {
    let source = "int f(int a);\nint f(int a) { return a; }\nint main() { return f(1); }";
    let analysis = analyze_source(source);
    assert!(!codes(&analysis).contains(&"redeclaration"));
}

#[test]
fn test_call_to_variable_is_not_a_function() {
    let analysis = analyze_source("int main() { int f = 1; return f(); }");
    assert!(codes(&analysis).contains(&"not-a-function"));
}
