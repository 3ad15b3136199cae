/*!
A pedagogical C analysis pipeline: four cooperating stages that take a
simplified C subset from source text all the way to illustrative x86-64
assembly, with every intermediate artifact available for inspection.

## Compilation stages

1. **Lexing** - [`lex`](lexer::lex) scans the source into a [`Token`](lexer::Token)
   sequence. It never fails: unrecognized or unterminated input becomes
   `Error` tokens and scanning continues.
2. **Parsing** - [`parse`](parser::parse) builds the [`Program`](ast::Program)
   tree by recursive descent with operator precedence. Syntax faults are
   collected as [`SyntaxError`](parser::SyntaxError)s while the parser keeps
   going, so one run surfaces as many diagnostics as the input contains.
3. **Analysis** - [`analyze`](semantic_analysis::analyze) seeds the builtin
   and preprocessor scopes, constructs the scoped
   [`SymbolTable`](semantic_analysis::SymbolTable), type-checks every
   expression and finishes with whole-program checks. Diagnostics carry a
   line, a code, a description and a severity; only `error` severity gates
   the stages after it.
4. **Code generation** - [`generate`](codegen::generate) lowers the tree to
   three-address code, runs a bounded peephole optimizer over it and emits
   AT&T-syntax assembly for both listings, plus statistics and an
   illustrative machine encoding.

Each stage is a pure function of its inputs and is usable on its own; the
matching cargo feature (`lexer`, `parser`, `semantic_analysis`, `tac`,
`codegen`) compiles just that stage and what it needs. All identifiers the
pipeline invents (temporaries, labels, block-scope tags) come from counters
that restart per invocation, so equal input always produces equal output.

The stages do no I/O; the `driver` binary is the file-reading,
artifact-printing wrapper around them.
*/

#![deny(unused_must_use)]
#![warn(clippy::pedantic)]
#![allow(clippy::wildcard_imports)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]

pub mod ast;
#[cfg(feature = "codegen")]
pub mod codegen;
#[cfg(feature = "emission")]
pub mod emission;
#[cfg(feature = "lexer")]
pub mod lexer;
#[cfg(feature = "parser")]
pub mod parser;
#[cfg(feature = "semantic_analysis")]
pub mod semantic_analysis;
#[cfg(feature = "tac")]
pub mod tac;

#[cfg(feature = "codegen")]
pub use codegen::generate;
#[cfg(feature = "lexer")]
pub use lexer::lex;
#[cfg(feature = "parser")]
pub use parser::parse;
#[cfg(feature = "semantic_analysis")]
pub use semantic_analysis::analyze;

/// Extracts a printable message from a caught panic payload. Used by the
/// per-stage catch-alls that turn an unexpected fault into one diagnostic.
#[allow(dead_code)]
pub(crate) fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        String::from("unexpected internal fault")
    }
}
