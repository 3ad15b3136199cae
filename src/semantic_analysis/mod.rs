mod builtins;
mod ctype;
mod preprocessor;
mod semantic_error;
#[cfg(test)]
mod semantic_tests;
mod symbol_collection;
mod symbol_table;
mod typecheck;

use crate::ast::Program;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

pub use ctype::CType;
pub use semantic_error::{SemanticError, SemanticErrorKind, Severity};
pub use symbol_table::{
    Symbol, SymbolKind, SymbolTable, BUILTIN_SCOPE, GLOBAL_SCOPE, PREPROCESSOR_SCOPE,
};

/// Analyzer output: the symbol table plus all diagnostics, warnings included.
#[derive(Debug)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub errors: Vec<SemanticError>,
}

impl Analysis {
    /// True when nothing blocks the downstream stages (warnings do not).
    pub fn is_clean(&self) -> bool {
        self.errors
            .iter()
            .all(|e| e.severity() != Severity::Error)
    }
}

/// Maps byte offsets back to 1-based line numbers.
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    pub(crate) fn line_of(&self, offset: usize) -> u64 {
        self.starts.partition_point(|start| *start <= offset) as u64
    }
}

fn final_checks(
    program: &Program,
    symbols: &SymbolTable,
    reads: &HashSet<String>,
    errors: &mut Vec<SemanticError>,
) {
    let has_main = symbols
        .get(GLOBAL_SCOPE, "main")
        .filter(|s| s.is_function())
        .is_some();
    if !program.body.is_empty() && !has_main {
        errors.push(SemanticErrorKind::MissingMain.at(1));
    }

    let mut unused: Vec<&Symbol> = symbols
        .entries()
        .filter(|(key, symbol)| {
            symbol.kind == SymbolKind::Variable
                && !symbol.is_parameter
                && symbol.scope != BUILTIN_SCOPE
                && symbol.scope != PREPROCESSOR_SCOPE
                && !reads.contains(*key)
        })
        .map(|(_, symbol)| symbol)
        .collect();
    unused.sort_by_key(|s| (s.line, s.name.clone()));
    for symbol in unused {
        errors.push(SemanticErrorKind::UnusedVariable(symbol.name.clone()).at(symbol.line));
    }
}

fn run(program: &Program, source: &str) -> Analysis {
    let mut symbols = SymbolTable::new();
    let mut errors = Vec::new();
    let lines = LineIndex::new(source);

    builtins::seed(&mut symbols);
    preprocessor::scan(source, &mut symbols);

    let reads = symbol_collection::collect(program, &mut symbols, &mut errors, &lines);
    typecheck::check(program, &symbols, &mut errors, &lines);
    final_checks(program, &symbols, &reads, &mut errors);

    Analysis { symbols, errors }
}

/// Runs the full analysis over a parsed program and its source text.
///
/// The source is consulted twice: once by the preprocessor scan and once to
/// map node offsets back to line numbers. An unexpected internal fault is
/// converted into a single diagnostic with an empty table.
pub fn analyze(program: &Program, source: &str) -> Analysis {
    catch_unwind(AssertUnwindSafe(|| run(program, source))).unwrap_or_else(|panic| Analysis {
        symbols: SymbolTable::new(),
        errors: vec![SemanticError::internal(crate::panic_message(panic))],
    })
}
