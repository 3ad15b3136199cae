use super::ctype::CType;
use super::semantic_error::{SemanticError, SemanticErrorKind};
use super::symbol_table::{ScopeTracker, SymbolKind, SymbolTable};
use super::LineIndex;
use crate::ast::*;

/// Type-checking pass: computes every expression's type bottom-up and
/// reports incompatible assignments, bad call arguments and arity, and calls
/// to unresolved names.
///
/// The traversal opens and closes scopes in exactly the same order as the
/// collection pass, so its fresh counter reproduces the same block tags.
pub(super) fn check(
    program: &Program,
    symbols: &SymbolTable,
    errors: &mut Vec<SemanticError>,
    lines: &LineIndex,
) {
    let mut checker = Checker {
        symbols,
        errors,
        lines,
        scopes: ScopeTracker::new(),
    };
    for item in &program.body {
        checker.check_toplevel(item);
    }
}

struct Checker<'a> {
    symbols: &'a SymbolTable,
    errors: &'a mut Vec<SemanticError>,
    lines: &'a LineIndex,
    scopes: ScopeTracker,
}

impl Checker<'_> {
    fn error(&mut self, kind: SemanticErrorKind, span: Span) {
        let line = self.lines.line_of(span.start);
        self.errors.push(kind.at(line));
    }

    fn check_toplevel(&mut self, item: &TopLevel) {
        match item {
            TopLevel::Function(function) => self.check_function(function),
            TopLevel::Variable(declaration) => self.check_declaration(declaration),
            TopLevel::Include(_) | TopLevel::Directive(_) | TopLevel::Typedef(_) => {}
        }
    }

    fn check_function(&mut self, function: &FunctionDeclaration) {
        let Some(body) = &function.body else {
            return;
        };
        self.scopes.push_named(&function.id);
        for item in &body.body {
            self.check_block_item(item);
        }
        self.scopes.pop();
    }

    fn check_declaration(&mut self, declaration: &VariableDeclaration) {
        let base = CType::from_specifiers(&declaration.specifiers);
        for declarator in &declaration.declarators {
            let Some(init) = &declarator.init else {
                continue;
            };
            let declared =
                CType::with_declarator(base.clone(), declarator.pointer, declarator.array);
            if let Some(source) = self.exp_type(init) {
                if !CType::compat(&declared, &source) {
                    self.error(
                        SemanticErrorKind::AssignmentTypeMismatch {
                            target: declared.to_string(),
                            source_ty: source.to_string(),
                        },
                        declarator.span,
                    );
                }
            }
        }
    }

    fn check_block_item(&mut self, item: &BlockItem) {
        match item {
            BlockItem::S(statement) => self.check_statement(statement),
            BlockItem::D(declaration) => self.check_declaration(declaration),
        }
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Block(block) => {
                self.scopes.push_block();
                for item in &block.body {
                    self.check_block_item(item);
                }
                self.scopes.pop();
            }
            Statement::If(if_st) => {
                self.scopes.push_block();
                self.exp_type(&if_st.test);
                self.check_statement(&if_st.consequent);
                if let Some(alternate) = &if_st.alternate {
                    self.check_statement(alternate);
                }
                self.scopes.pop();
            }
            Statement::While(while_st) => {
                self.scopes.push_block();
                self.exp_type(&while_st.test);
                self.check_statement(&while_st.body);
                self.scopes.pop();
            }
            Statement::For(for_st) => {
                self.scopes.push_block();
                match &for_st.init {
                    Some(ForInit::Declaration(declaration)) => self.check_declaration(declaration),
                    Some(ForInit::Exp(exp)) => {
                        self.exp_type(exp);
                    }
                    None => {}
                }
                if let Some(test) = &for_st.test {
                    self.exp_type(test);
                }
                if let Some(update) = &for_st.update {
                    self.exp_type(update);
                }
                self.check_statement(&for_st.body);
                self.scopes.pop();
            }
            Statement::Return(ret) => {
                if let Some(argument) = &ret.argument {
                    self.exp_type(argument);
                }
            }
            Statement::Exp(exp) => {
                self.exp_type(exp);
            }
            Statement::Break(_) | Statement::Continue(_) | Statement::Null(_) => {}
        }
    }

    /// Bottom-up expression typing. `None` means the type is unknown, which
    /// suppresses follow-on mismatch reports instead of cascading them.
    fn exp_type(&mut self, exp: &Exp) -> Option<CType> {
        match &exp.kind {
            ExpKind::Literal(literal) => Some(literal_type(literal)),
            ExpKind::Identifier(name) => {
                let symbol = self.symbols.resolve(name, &self.scopes)?;
                match symbol.kind {
                    SymbolKind::Variable => Some(symbol.ty.clone()),
                    SymbolKind::Macro => Some(CType::Int),
                    SymbolKind::Function | SymbolKind::Header => None,
                }
            }
            ExpKind::Binary(op, left, right) => {
                let left_type = self.exp_type(left);
                let right_type = self.exp_type(right);
                if op.is_comparison() || op.is_logical() {
                    return Some(CType::Int);
                }
                match (left_type, right_type) {
                    (Some(l), Some(r)) => Some(CType::promote(&l, &r)),
                    (Some(t), None) | (None, Some(t)) => Some(t),
                    (None, None) => None,
                }
            }
            ExpKind::Unary { op, exp: inner, .. } => {
                let inner_type = self.exp_type(inner);
                match op {
                    UnaryOp::AddressOf => inner_type.map(|t| CType::Pointer(Box::new(t))),
                    UnaryOp::Deref => inner_type.and_then(|t| t.deref()),
                    UnaryOp::Not => Some(CType::Int),
                    _ => inner_type,
                }
            }
            ExpKind::Assignment(left, right) => {
                let source = self.exp_type(right);
                let target = self.exp_type(left);
                if let (Some(target), Some(source)) = (&target, &source) {
                    if !CType::compat(target, source) {
                        self.error(
                            SemanticErrorKind::AssignmentTypeMismatch {
                                target: target.to_string(),
                                source_ty: source.to_string(),
                            },
                            exp.span,
                        );
                    }
                }
                target
            }
            ExpKind::Call { callee, args } => self.check_call(callee, args, exp.span),
        }
    }

    fn check_call(&mut self, callee: &str, args: &[Exp], span: Span) -> Option<CType> {
        let arg_types: Vec<Option<CType>> = args.iter().map(|arg| self.exp_type(arg)).collect();

        let Some(symbol) = self.symbols.resolve(callee, &self.scopes) else {
            self.error(SemanticErrorKind::UndefinedFunction(callee.to_owned()), span);
            return None;
        };
        if !symbol.is_function() {
            self.error(SemanticErrorKind::NotAFunction(callee.to_owned()), span);
            return None;
        }

        let return_type = symbol.return_type.clone();
        let params = symbol.params.clone().unwrap_or_default();
        if !symbol.is_var_args && args.len() != params.len() {
            self.error(
                SemanticErrorKind::ArgumentCount {
                    name: callee.to_owned(),
                    expected: params.len(),
                    got: args.len(),
                },
                span,
            );
            return return_type;
        }

        for (index, (param, arg_type)) in params.iter().zip(&arg_types).enumerate() {
            let Some(arg_type) = arg_type else { continue };
            if !CType::compat(param, arg_type) {
                let arg_span = args.get(index).map_or(span, |a| a.span);
                self.error(
                    SemanticErrorKind::ArgumentTypeMismatch {
                        name: callee.to_owned(),
                        index: index + 1,
                        expected: param.to_string(),
                        got: arg_type.to_string(),
                    },
                    arg_span,
                );
            }
        }
        return_type
    }
}

fn literal_type(literal: &Literal) -> CType {
    match literal.value_type {
        LiteralType::String => CType::Pointer(Box::new(CType::Char)),
        LiteralType::Char => CType::Int,
        LiteralType::Number => {
            if literal.value.contains('.') {
                CType::Float
            } else {
                CType::Int
            }
        }
    }
}
