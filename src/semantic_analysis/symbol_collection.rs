use super::ctype::CType;
use super::semantic_error::{SemanticError, SemanticErrorKind};
use super::symbol_table::{ScopeTracker, Symbol, SymbolKind, SymbolTable, GLOBAL_SCOPE};
use super::LineIndex;
use crate::ast::*;
use std::collections::HashSet;

/// Symbol-table construction pass.
///
/// Walks the tree tracking the scope chain, registers every declaration,
/// flags redeclarations, marks assignment targets initialized and records
/// which symbols are ever read. Returns the set of read symbol keys for the
/// final unused-variable sweep.
pub(super) fn collect(
    program: &Program,
    symbols: &mut SymbolTable,
    errors: &mut Vec<SemanticError>,
    lines: &LineIndex,
) -> HashSet<String> {
    let mut collector = Collector {
        symbols,
        errors,
        lines,
        scopes: ScopeTracker::new(),
        reads: HashSet::new(),
        loop_depth: 0,
    };
    for item in &program.body {
        collector.collect_toplevel(item);
    }
    collector.reads
}

struct Collector<'a> {
    symbols: &'a mut SymbolTable,
    errors: &'a mut Vec<SemanticError>,
    lines: &'a LineIndex,
    scopes: ScopeTracker,
    reads: HashSet<String>,
    loop_depth: u32,
}

impl Collector<'_> {
    fn line(&self, span: Span) -> u64 {
        self.lines.line_of(span.start)
    }

    fn error(&mut self, kind: SemanticErrorKind, span: Span) {
        let line = self.line(span);
        self.errors.push(kind.at(line));
    }

    fn collect_toplevel(&mut self, item: &TopLevel) {
        match item {
            TopLevel::Function(function) => self.collect_function(function),
            TopLevel::Variable(declaration) => self.collect_declaration(declaration),
            // Includes and defines were registered by the source scan;
            // typedefs introduce no storage.
            TopLevel::Include(_) | TopLevel::Directive(_) | TopLevel::Typedef(_) => {}
        }
    }

    fn collect_function(&mut self, function: &FunctionDeclaration) {
        let line = self.line(function.span);
        let return_type = CType::with_declarator(
            CType::from_specifiers(&function.return_type),
            function.pointer_return,
            false,
        );
        let param_types: Vec<CType> = function
            .params
            .iter()
            .map(|p| {
                CType::with_declarator(CType::from_specifiers(&p.param_type), p.pointer, p.array)
            })
            .collect();

        // A prototype followed by the definition is fine; a second
        // definition (or any other clash) is not. The body is still walked
        // so later diagnostics are not lost.
        let clashes = match self.symbols.get(GLOBAL_SCOPE, &function.id) {
            Some(prev) => !(prev.is_function() && !prev.initialized),
            None => false,
        };
        if clashes {
            self.error(
                SemanticErrorKind::Redeclaration(function.id.clone()),
                function.span,
            );
        }

        let mut symbol = Symbol::function(
            &function.id,
            return_type,
            param_types.clone(),
            GLOBAL_SCOPE,
            line,
        );
        // `initialized` doubles as "has a definition" for functions.
        symbol.initialized = function.body.is_some();
        self.symbols.insert(symbol);

        let Some(body) = &function.body else {
            return;
        };

        self.scopes.push_named(&function.id);
        for (param, ty) in function.params.iter().zip(param_types) {
            if self.symbols.contains(self.scopes.current(), &param.name) {
                self.error(SemanticErrorKind::Redeclaration(param.name.clone()), param.span);
                continue;
            }
            let line = self.line(param.span);
            self.symbols
                .insert(Symbol::parameter(&param.name, ty, self.scopes.current(), line));
        }
        // The function body shares the function's scope; only nested blocks
        // open fresh ones.
        for item in &body.body {
            self.collect_block_item(item);
        }
        self.scopes.pop();
    }

    fn collect_declaration(&mut self, declaration: &VariableDeclaration) {
        let base = CType::from_specifiers(&declaration.specifiers);
        for declarator in &declaration.declarators {
            let line = self.line(declarator.span);
            if self.symbols.contains(self.scopes.current(), &declarator.id) {
                self.error(
                    SemanticErrorKind::Redeclaration(declarator.id.clone()),
                    declarator.span,
                );
            } else {
                let ty =
                    CType::with_declarator(base.clone(), declarator.pointer, declarator.array);
                let mut symbol = Symbol::variable(
                    &declarator.id,
                    ty,
                    self.scopes.current(),
                    line,
                    declarator.init.is_some(),
                );
                if let Some(init) = &declarator.init {
                    if let ExpKind::Literal(literal) = &init.kind {
                        symbol.value = Some(literal.value.clone());
                    }
                }
                self.symbols.insert(symbol);
            }
            if let Some(init) = &declarator.init {
                self.walk_exp(init);
            }
        }
    }

    fn collect_block_item(&mut self, item: &BlockItem) {
        match item {
            BlockItem::S(statement) => self.collect_statement(statement),
            BlockItem::D(declaration) => self.collect_declaration(declaration),
        }
    }

    fn collect_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => {
                self.scopes.push_block();
                for item in &block.body {
                    self.collect_block_item(item);
                }
                self.scopes.pop();
            }
            Statement::If(if_st) => {
                self.scopes.push_block();
                self.walk_exp(&if_st.test);
                self.collect_statement(&if_st.consequent);
                if let Some(alternate) = &if_st.alternate {
                    self.collect_statement(alternate);
                }
                self.scopes.pop();
            }
            Statement::While(while_st) => {
                self.scopes.push_block();
                self.walk_exp(&while_st.test);
                self.loop_depth += 1;
                self.collect_statement(&while_st.body);
                self.loop_depth -= 1;
                self.scopes.pop();
            }
            Statement::For(for_st) => {
                self.scopes.push_block();
                match &for_st.init {
                    Some(ForInit::Declaration(declaration)) => {
                        self.collect_declaration(declaration);
                    }
                    Some(ForInit::Exp(exp)) => self.walk_exp(exp),
                    None => {}
                }
                if let Some(test) = &for_st.test {
                    self.walk_exp(test);
                }
                if let Some(update) = &for_st.update {
                    self.walk_exp(update);
                }
                self.loop_depth += 1;
                self.collect_statement(&for_st.body);
                self.loop_depth -= 1;
                self.scopes.pop();
            }
            Statement::Return(ret) => {
                if let Some(argument) = &ret.argument {
                    self.walk_exp(argument);
                }
            }
            Statement::Exp(exp) => self.walk_exp(exp),
            Statement::Break(span) => {
                if self.loop_depth == 0 {
                    self.error(SemanticErrorKind::BreakOutsideLoop, *span);
                }
            }
            Statement::Continue(span) => {
                if self.loop_depth == 0 {
                    self.error(SemanticErrorKind::ContinueOutsideLoop, *span);
                }
            }
            Statement::Null(_) => {}
        }
    }

    fn walk_exp(&mut self, exp: &Exp) {
        match &exp.kind {
            ExpKind::Identifier(name) => self.read_identifier(name, exp.span),
            ExpKind::Literal(_) => {}
            ExpKind::Binary(_, left, right) => {
                self.walk_exp(left);
                self.walk_exp(right);
            }
            ExpKind::Unary { op, exp: inner, .. } => {
                // ++/-- reads the old value and writes a new one.
                if op.is_incdec() {
                    if let ExpKind::Identifier(name) = &inner.kind {
                        self.read_identifier(name, inner.span);
                        self.mark_initialized(name);
                        return;
                    }
                }
                self.walk_exp(inner);
            }
            ExpKind::Assignment(left, right) => {
                self.walk_exp(right);
                if let ExpKind::Identifier(name) = &left.kind {
                    // Write-only target: marked initialized, not read.
                    match self.symbols.resolve_key(name, &self.scopes) {
                        Some(key) => {
                            if let Some(symbol) = self.symbols.get_mut_by_key(&key) {
                                symbol.initialized = true;
                            }
                        }
                        None => self.error(
                            SemanticErrorKind::UndeclaredIdentifier(name.clone()),
                            left.span,
                        ),
                    }
                } else {
                    self.walk_exp(left);
                }
            }
            ExpKind::Call { args, .. } => {
                // Callee resolution is the type checker's job.
                for arg in args {
                    self.walk_exp(arg);
                }
            }
        }
    }

    fn read_identifier(&mut self, name: &str, span: Span) {
        let Some(key) = self.symbols.resolve_key(name, &self.scopes) else {
            self.error(SemanticErrorKind::UndeclaredIdentifier(name.to_owned()), span);
            return;
        };
        self.reads.insert(key.clone());
        let Some(symbol) = self.symbols.get_by_key(&key) else {
            return;
        };
        if symbol.kind == SymbolKind::Variable && !symbol.initialized && !symbol.is_parameter {
            self.error(SemanticErrorKind::UsedBeforeInit(name.to_owned()), span);
        }
    }

    fn mark_initialized(&mut self, name: &str) {
        if let Some(key) = self.symbols.resolve_key(name, &self.scopes) {
            if let Some(symbol) = self.symbols.get_mut_by_key(&key) {
                symbol.initialized = true;
            }
        }
    }
}
