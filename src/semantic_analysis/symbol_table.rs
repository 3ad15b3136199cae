use super::ctype::CType;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::mem;

pub const GLOBAL_SCOPE: &str = "global";
pub const BUILTIN_SCOPE: &str = "builtin";
pub const PREPROCESSOR_SCOPE: &str = "preprocessor";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum SymbolKind {
    Variable,
    Function,
    /// `#define` name.
    Macro,
    /// `#include` header.
    Header,
}

/// One resolved declaration: a name bound to its type and properties inside
/// a specific scope.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: CType,
    pub return_type: Option<CType>,
    pub scope: String,
    pub line: u64,
    pub initialized: bool,
    pub is_parameter: bool,
    pub is_array: bool,
    pub is_pointer: bool,
    pub params: Option<Vec<CType>>,
    pub is_var_args: bool,
    pub value: Option<String>,
}

impl Symbol {
    fn new(kind: SymbolKind, name: &str, ty: CType, scope: &str, line: u64) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            is_pointer: ty.is_pointer(),
            is_array: matches!(ty, CType::Array(_)),
            ty,
            return_type: None,
            scope: scope.to_owned(),
            line,
            initialized: false,
            is_parameter: false,
            params: None,
            is_var_args: false,
            value: None,
        }
    }

    pub fn variable(name: &str, ty: CType, scope: &str, line: u64, initialized: bool) -> Self {
        let mut symbol = Self::new(SymbolKind::Variable, name, ty, scope, line);
        symbol.initialized = initialized;
        symbol
    }

    pub fn parameter(name: &str, ty: CType, scope: &str, line: u64) -> Self {
        let mut symbol = Self::new(SymbolKind::Variable, name, ty, scope, line);
        symbol.is_parameter = true;
        symbol.initialized = true;
        symbol
    }

    pub fn function(
        name: &str,
        return_type: CType,
        params: Vec<CType>,
        scope: &str,
        line: u64,
    ) -> Self {
        let mut symbol = Self::new(SymbolKind::Function, name, return_type.clone(), scope, line);
        symbol.return_type = Some(return_type);
        symbol.params = Some(params);
        symbol.initialized = true;
        symbol
    }

    pub fn builtin(name: &str, return_type: CType, params: Vec<CType>, is_var_args: bool) -> Self {
        let mut symbol = Self::function(name, return_type, params, BUILTIN_SCOPE, 0);
        symbol.is_var_args = is_var_args;
        symbol
    }

    pub fn macro_definition(name: &str, value: Option<String>, line: u64) -> Self {
        let mut symbol = Self::new(SymbolKind::Macro, name, CType::Int, GLOBAL_SCOPE, line);
        symbol.initialized = true;
        symbol.value = value;
        symbol
    }

    pub fn header(name: &str, line: u64) -> Self {
        let mut symbol = Self::new(SymbolKind::Header, name, CType::Void, PREPROCESSOR_SCOPE, line);
        symbol.initialized = true;
        symbol
    }

    pub fn is_function(&self) -> bool {
        self.kind == SymbolKind::Function
    }

    /// What the symbol's "type" column reads as.
    pub fn type_label(&self) -> String {
        match self.kind {
            SymbolKind::Function => "function".to_owned(),
            SymbolKind::Macro => "macro".to_owned(),
            SymbolKind::Header => "header".to_owned(),
            SymbolKind::Variable => self.ty.to_string(),
        }
    }
}

/// Scope bookkeeping for a traversal: the current scope plus the stack of
/// enclosing ones. Synthetic block scopes are tagged from a counter local to
/// the analysis run, so repeated runs produce identical tables.
#[derive(Debug)]
pub(super) struct ScopeTracker {
    current: String,
    stack: Vec<String>,
    block_counter: u64,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self {
            current: GLOBAL_SCOPE.to_owned(),
            stack: Vec::new(),
            block_counter: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn push_named(&mut self, name: &str) {
        let previous = mem::replace(&mut self.current, name.to_owned());
        self.stack.push(previous);
    }

    pub fn push_block(&mut self) {
        let tag = format!("block{}", self.block_counter);
        self.block_counter += 1;
        self.push_named(&tag);
    }

    pub fn pop(&mut self) {
        if let Some(previous) = self.stack.pop() {
            self.current = previous;
        }
    }

    /// Resolution order: current scope, then enclosing scopes innermost
    /// first. The global scope sits at the bottom of the stack.
    pub fn chain(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.current.as_str()).chain(self.stack.iter().rev().map(String::as_str))
    }
}

/// All symbols of one analysis run, keyed by `"<scope>:<name>"`.
#[derive(Debug, Default)]
pub struct SymbolTable {
    inner: HashMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(scope: &str, name: &str) -> String {
        format!("{scope}:{name}")
    }

    pub fn insert(&mut self, symbol: Symbol) {
        let key = Self::key(&symbol.scope, &symbol.name);
        self.inner.insert(key, symbol);
    }

    pub fn contains(&self, scope: &str, name: &str) -> bool {
        self.inner.contains_key(&Self::key(scope, name))
    }

    pub fn get(&self, scope: &str, name: &str) -> Option<&Symbol> {
        self.inner.get(&Self::key(scope, name))
    }

    pub(super) fn get_by_key(&self, key: &str) -> Option<&Symbol> {
        self.inner.get(key)
    }

    pub(super) fn get_mut_by_key(&mut self, key: &str) -> Option<&mut Symbol> {
        self.inner.get_mut(key)
    }

    /// Walks the scope chain, then falls back to the builtin scope.
    /// The first match wins.
    pub(super) fn resolve_key(&self, name: &str, scopes: &ScopeTracker) -> Option<String> {
        for scope in scopes.chain() {
            let key = Self::key(scope, name);
            if self.inner.contains_key(&key) {
                return Some(key);
            }
        }
        let key = Self::key(BUILTIN_SCOPE, name);
        self.inner.contains_key(&key).then_some(key)
    }

    pub(super) fn resolve<'a>(&'a self, name: &str, scopes: &ScopeTracker) -> Option<&'a Symbol> {
        self.resolve_key(name, scopes)
            .and_then(|key| self.inner.get(&key))
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.inner.values()
    }

    pub(super) fn entries(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// User-facing view: builtin and preprocessor entries are hidden,
    /// globals are keyed by bare name and everything else by
    /// `<scope>.<name>`, in stable order.
    pub fn display_entries(&self) -> BTreeMap<String, &Symbol> {
        self.inner
            .values()
            .filter(|s| s.scope != BUILTIN_SCOPE && s.scope != PREPROCESSOR_SCOPE)
            .map(|s| {
                let key = if s.scope == GLOBAL_SCOPE {
                    s.name.clone()
                } else {
                    format!("{}.{}", s.scope, s.name)
                };
                (key, s)
            })
            .collect()
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, symbol) in self.display_entries() {
            write!(
                f,
                "{key}: {} (scope {}, line {})",
                symbol.type_label(),
                symbol.scope,
                symbol.line
            )?;
            if symbol.initialized {
                write!(f, " initialized")?;
            }
            if let Some(params) = &symbol.params {
                let rendered: Vec<String> = params.iter().map(ToString::to_string).collect();
                write!(f, " params({})", rendered.join(", "))?;
            }
            if let Some(value) = &symbol.value {
                write!(f, " = {value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
