use super::symbol_table::{Symbol, SymbolTable};
use regex::Regex;
use std::sync::OnceLock;

fn include_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*#\s*include\s*[<"]([^>"]+)[>"]"#).expect("pattern is well formed")
    })
}

fn define_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*#\s*define\s+([A-Za-z_][A-Za-z0-9_]*)\s*(.*)$")
            .expect("pattern is well formed")
    })
}

/// Scans the raw source for `#include` and `#define` lines and enters the
/// matching symbols: headers under the preprocessor scope, macro names under
/// the global scope so uses of them resolve.
pub(super) fn scan(source: &str, table: &mut SymbolTable) {
    for (index, text) in source.lines().enumerate() {
        let line = index as u64 + 1;
        if let Some(captures) = include_pattern().captures(text) {
            table.insert(Symbol::header(&captures[1], line));
        } else if let Some(captures) = define_pattern().captures(text) {
            let value = captures[2].trim();
            let value = (!value.is_empty()).then(|| value.to_owned());
            table.insert(Symbol::macro_definition(&captures[1], value, line));
        }
    }
}
