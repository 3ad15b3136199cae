use super::ctype::CType;
use super::symbol_table::{Symbol, SymbolTable};

fn char_ptr() -> CType {
    CType::Pointer(Box::new(CType::Char))
}

fn void_ptr() -> CType {
    CType::Pointer(Box::new(CType::Void))
}

/// Seeds the builtin scope with the standard-library signatures the analyzer
/// knows about. Size parameters are modeled as plain `int`.
pub(super) fn seed(table: &mut SymbolTable) {
    let entries = [
        Symbol::builtin("printf", CType::Int, vec![char_ptr()], true),
        Symbol::builtin("scanf", CType::Int, vec![char_ptr()], true),
        Symbol::builtin("malloc", void_ptr(), vec![CType::Int], false),
        Symbol::builtin("free", CType::Void, vec![void_ptr()], false),
        Symbol::builtin("strcpy", char_ptr(), vec![char_ptr(), char_ptr()], false),
        Symbol::builtin("strlen", CType::Int, vec![char_ptr()], false),
        Symbol::builtin("puts", CType::Int, vec![char_ptr()], false),
        Symbol::builtin("putchar", CType::Int, vec![CType::Int], false),
        Symbol::builtin("getchar", CType::Int, vec![], false),
        Symbol::builtin("fopen", void_ptr(), vec![char_ptr(), char_ptr()], false),
        Symbol::builtin("fclose", CType::Int, vec![void_ptr()], false),
        Symbol::builtin("exit", CType::Void, vec![CType::Int], false),
        Symbol::builtin(
            "memcpy",
            void_ptr(),
            vec![void_ptr(), void_ptr(), CType::Int],
            false,
        ),
        Symbol::builtin(
            "memset",
            void_ptr(),
            vec![void_ptr(), CType::Int, CType::Int],
            false,
        ),
    ];
    for symbol in entries {
        table.insert(symbol);
    }
}
