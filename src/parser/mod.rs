mod cursor;
mod parse_error;

use crate::ast::*;
use crate::lexer::{Token, TokenKind};
use cursor::Cursor;
pub use parse_error::{Result, SyntaxError, SyntaxErrorKind};

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Parser output: the tree (possibly partial) plus every diagnostic collected
/// on the way. The parser never aborts; a malformed construct costs one
/// diagnostic and one token of progress.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<SyntaxError>,
}

fn get_prec(token: &Token) -> u64 {
    if token.kind != TokenKind::Operator {
        return 0;
    }
    match token.value.as_str() {
        "*" | "/" | "%" => 50,
        "+" | "-" => 45,
        "<" | "<=" | ">" | ">=" => 35,
        "==" | "!=" => 30,
        "&&" => 10,
        "||" => 5,
        "=" => 1,
        _ => 0,
    }
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
    let op = match token.value.as_str() {
        "||" => BinaryOp::LogicalOr,
        "&&" => BinaryOp::LogicalAnd,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::Ne,
        "<" => BinaryOp::Lt,
        ">" => BinaryOp::Gt,
        "<=" => BinaryOp::Le,
        ">=" => BinaryOp::Ge,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Mod,
        _ => return None,
    };
    Some(op)
}

fn unary_op(token: &Token) -> Option<UnaryOp> {
    let op = match token.value.as_str() {
        "!" => UnaryOp::Not,
        "-" => UnaryOp::Negate,
        "~" => UnaryOp::Complement,
        "++" => UnaryOp::Increment,
        "--" => UnaryOp::Decrement,
        "&" => UnaryOp::AddressOf,
        "*" => UnaryOp::Deref,
        _ => return None,
    };
    Some(op)
}

fn parse_arguments(cursor: &mut Cursor) -> Result<Vec<Exp>> {
    let mut args = Vec::new();
    if cursor.peek_is_punct(")") {
        return Ok(args);
    }
    loop {
        args.push(parse_exp(cursor, 0)?);
        if !cursor.bump_punct(",") {
            break;
        }
    }
    Ok(args)
}

fn parse_factor_identifier(cursor: &mut Cursor) -> Result<Exp> {
    let (name, span) = cursor.expect_identifier()?;
    if cursor.bump_punct("(") {
        let args = parse_arguments(cursor)?;
        cursor.expect_punct(")")?;
        let span = Span::new(span.start, cursor.prev_end());
        return Ok(Exp::call(name, args, span));
    }
    parse_maybe_postfix(cursor, Exp::identifier(name, span))
}

fn parse_maybe_postfix(cursor: &mut Cursor, inner: Exp) -> Result<Exp> {
    let Some(token) = cursor.peek().filter(|t| t.is_incdec()) else {
        return Ok(inner);
    };
    let op = if token.value == "++" {
        UnaryOp::Increment
    } else {
        UnaryOp::Decrement
    };
    cursor.bump();
    let span = Span::new(inner.span.start, cursor.prev_end());
    Ok(Exp::unary(op, inner, false, span))
}

fn parse_factor_subexp(cursor: &mut Cursor) -> Result<Exp> {
    cursor.expect_punct("(")?;
    let exp = parse_exp(cursor, 0)?;
    cursor.expect_punct(")")?;
    parse_maybe_postfix(cursor, exp)
}

fn parse_factor_unary(cursor: &mut Cursor) -> Result<Exp> {
    let token = cursor.next_or_error()?;
    let op = unary_op(token)
        .ok_or_else(|| cursor.error_here(SyntaxErrorKind::UnexpectedToken(token.value.clone())))?;
    let start = token.start;
    let inner = parse_factor(cursor)?;
    let span = Span::new(start, inner.span.end);
    Ok(Exp::unary(op, inner, true, span))
}

fn parse_factor(cursor: &mut Cursor) -> Result<Exp> {
    let token = cursor
        .peek()
        .ok_or_else(|| cursor.error_here(SyntaxErrorKind::UnexpectedEof))?;
    match token.kind {
        TokenKind::Number => {
            cursor.bump();
            Ok(Exp::literal(
                token.value.clone(),
                LiteralType::Number,
                token.span(),
            ))
        }
        TokenKind::String => {
            cursor.bump();
            Ok(Exp::literal(
                token.value.clone(),
                LiteralType::String,
                token.span(),
            ))
        }
        TokenKind::Char => {
            cursor.bump();
            Ok(Exp::literal(
                token.value.clone(),
                LiteralType::Char,
                token.span(),
            ))
        }
        TokenKind::Identifier => parse_factor_identifier(cursor),
        TokenKind::Punctuation if token.value == "(" => parse_factor_subexp(cursor),
        TokenKind::Operator if token.is_prefix_unary() => parse_factor_unary(cursor),
        TokenKind::Error => Err(cursor.error_here(SyntaxErrorKind::Unrecognized(
            token.value.clone(),
        ))),
        _ => Err(cursor.error_here(SyntaxErrorKind::ExpectedExpression(
            token.value.clone(),
        ))),
    }
}

/// Precedence-climbing expression parser. Binary operators are
/// left-associative; `=` is right-associative and binds loosest.
fn parse_exp(cursor: &mut Cursor, min_prec: u64) -> Result<Exp> {
    let mut left = parse_factor(cursor)?;

    while let Some(token) = cursor.peek() {
        let prec = get_prec(token);
        if prec == 0 || prec < min_prec {
            break;
        }
        left = if token.is_operator("=") {
            cursor.bump();
            let right = parse_exp(cursor, prec)?;
            Exp::assignment(left, right)
        } else {
            let op = binary_op(token)
                .ok_or_else(|| cursor.error_here(SyntaxErrorKind::UnexpectedToken(token.value.clone())))?;
            cursor.bump();
            let right = parse_exp(cursor, prec + 1)?;
            Exp::binary(op, left, right)
        };
    }

    Ok(left)
}

fn parse_declaration_specifiers(cursor: &mut Cursor) -> Result<DeclarationSpecifiers> {
    let start = cursor.start();
    let mut specifiers = Vec::new();

    while let Some(token) = cursor.peek() {
        if token.is_type() {
            specifiers.push(Specifier::Type(token.value.clone()));
            cursor.bump();
        } else if token.is_qualifier() {
            specifiers.push(Specifier::Qualifier(token.value.clone()));
            cursor.bump();
        } else if token.is_keyword("struct") || token.is_keyword("union") || token.is_keyword("enum")
        {
            let kind = match token.value.as_str() {
                "struct" => ComplexKind::Struct,
                "union" => ComplexKind::Union,
                _ => ComplexKind::Enum,
            };
            cursor.bump();
            let (tag, _) = cursor.expect_identifier()?;
            specifiers.push(Specifier::Complex { kind, tag });
        } else {
            break;
        }
    }

    if specifiers.is_empty() {
        return Err(cursor.expected("type specifier"));
    }
    Ok(DeclarationSpecifiers {
        specifiers,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_variable_declarator(cursor: &mut Cursor) -> Result<VariableDeclarator> {
    let start = cursor.start();
    let pointer = cursor.bump_operator("*");
    let (id, _) = cursor.expect_identifier()?;

    let mut array = false;
    if cursor.bump_punct("[") {
        array = true;
        // Size is optional and only a literal is allowed here.
        if cursor.peek().filter(|t| t.kind == TokenKind::Number).is_some() {
            cursor.bump();
        }
        cursor.expect_punct("]")?;
    }

    let init = if cursor.bump_operator("=") {
        Some(parse_exp(cursor, 0)?)
    } else {
        None
    };

    Ok(VariableDeclarator {
        id,
        pointer,
        array,
        init,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_variable_declaration(cursor: &mut Cursor) -> Result<VariableDeclaration> {
    let start = cursor.start();
    let specifiers = parse_declaration_specifiers(cursor)?;

    let mut declarators = vec![parse_variable_declarator(cursor)?];
    while cursor.bump_punct(",") {
        declarators.push(parse_variable_declarator(cursor)?);
    }
    cursor.expect_punct(";")?;

    Ok(VariableDeclaration {
        specifiers,
        declarators,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_params(cursor: &mut Cursor) -> Result<Vec<Parameter>> {
    let mut params = Vec::new();
    if cursor.peek_is_punct(")") {
        return Ok(params);
    }

    // A lone `void` means an empty parameter list.
    let savepoint = cursor.save();
    if cursor.peek().filter(|t| t.is_type() && t.value == "void").is_some() {
        cursor.bump();
        if cursor.peek_is_punct(")") {
            return Ok(params);
        }
        cursor.restore(savepoint);
    }

    loop {
        let start = cursor.start();
        let param_type = parse_declaration_specifiers(cursor)?;
        let pointer = cursor.bump_operator("*");
        let (name, _) = cursor.expect_identifier()?;
        let mut array = false;
        if cursor.bump_punct("[") {
            array = true;
            cursor.expect_punct("]")?;
        }
        params.push(Parameter {
            name,
            param_type,
            pointer,
            array,
            span: Span::new(start, cursor.prev_end()),
        });
        if !cursor.bump_punct(",") {
            break;
        }
    }
    Ok(params)
}

fn parse_block_item(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<BlockItem> {
    match cursor.peek() {
        Some(token) if token.is_specifier() => {
            parse_variable_declaration(cursor).map(BlockItem::D)
        }
        _ => parse_statement(cursor, errors).map(BlockItem::S),
    }
}

fn parse_block(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<Block> {
    let start = cursor.start();
    cursor.expect_punct("{")?;

    let mut body = BlockItems::new();
    loop {
        if cursor.bump_punct("}") {
            break;
        }
        if cursor.at_end() {
            errors.push(cursor.expected("'}'"));
            break;
        }
        match parse_block_item(cursor, errors) {
            Ok(item) => body.push(item),
            Err(err) => {
                errors.push(err);
                cursor.bump();
            }
        }
    }

    Ok(Block {
        body,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_if(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<Statement> {
    let start = cursor.start();
    cursor.bump();
    cursor.expect_punct("(")?;
    let test = parse_exp(cursor, 0)?;
    cursor.expect_punct(")")?;
    let consequent = parse_statement(cursor, errors).map(Box::new)?;
    let alternate = if cursor.peek().filter(|t| t.is_keyword("else")).is_some() {
        cursor.bump();
        Some(parse_statement(cursor, errors).map(Box::new)?)
    } else {
        None
    };

    Ok(Statement::If(If {
        test,
        consequent,
        alternate,
        span: Span::new(start, cursor.prev_end()),
    }))
}

fn parse_while(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<Statement> {
    let start = cursor.start();
    cursor.bump();
    cursor.expect_punct("(")?;
    let test = parse_exp(cursor, 0)?;
    cursor.expect_punct(")")?;
    let body = parse_statement(cursor, errors).map(Box::new)?;

    Ok(Statement::While(While {
        test,
        body,
        span: Span::new(start, cursor.prev_end()),
    }))
}

fn parse_for(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<Statement> {
    let start = cursor.start();
    cursor.bump();
    cursor.expect_punct("(")?;

    let init = if cursor.bump_punct(";") {
        None
    } else if cursor.peek().filter(|t| t.is_specifier()).is_some() {
        // `parse_variable_declaration` consumes the terminating `;`.
        Some(ForInit::Declaration(parse_variable_declaration(cursor)?))
    } else {
        let exp = parse_exp(cursor, 0)?;
        cursor.expect_punct(";")?;
        Some(ForInit::Exp(exp))
    };

    let test = if cursor.peek_is_punct(";") {
        None
    } else {
        Some(parse_exp(cursor, 0)?)
    };
    cursor.expect_punct(";")?;

    let update = if cursor.peek_is_punct(")") {
        None
    } else {
        Some(parse_exp(cursor, 0)?)
    };
    cursor.expect_punct(")")?;

    let body = parse_statement(cursor, errors).map(Box::new)?;

    Ok(Statement::For(For {
        init,
        test,
        update,
        body,
        span: Span::new(start, cursor.prev_end()),
    }))
}

fn parse_return(cursor: &mut Cursor) -> Result<Statement> {
    let start = cursor.start();
    cursor.bump();
    let argument = if cursor.peek_is_punct(";") {
        None
    } else {
        Some(parse_exp(cursor, 0)?)
    };
    cursor.expect_punct(";")?;

    Ok(Statement::Return(Return {
        argument,
        span: Span::new(start, cursor.prev_end()),
    }))
}

fn parse_jump(cursor: &mut Cursor, make: fn(Span) -> Statement) -> Result<Statement> {
    let start = cursor.start();
    cursor.bump();
    cursor.expect_punct(";")?;
    Ok(make(Span::new(start, cursor.prev_end())))
}

fn parse_statement_exp(cursor: &mut Cursor) -> Result<Statement> {
    let exp = parse_exp(cursor, 0)?;
    cursor.expect_punct(";")?;
    Ok(Statement::Exp(exp))
}

fn parse_statement(cursor: &mut Cursor, errors: &mut Vec<SyntaxError>) -> Result<Statement> {
    let token = cursor
        .peek()
        .ok_or_else(|| cursor.error_here(SyntaxErrorKind::UnexpectedEof))?;
    match token {
        t if t.is_punct("{") => parse_block(cursor, errors).map(Statement::Block),
        t if t.is_keyword("if") => parse_if(cursor, errors),
        t if t.is_keyword("while") => parse_while(cursor, errors),
        t if t.is_keyword("for") => parse_for(cursor, errors),
        t if t.is_keyword("return") => parse_return(cursor),
        t if t.is_keyword("break") => parse_jump(cursor, Statement::Break),
        t if t.is_keyword("continue") => parse_jump(cursor, Statement::Continue),
        t if t.is_punct(";") => {
            let span = t.span();
            cursor.bump();
            Ok(Statement::Null(span))
        }
        _ => parse_statement_exp(cursor),
    }
}

fn parse_function_declaration(
    cursor: &mut Cursor,
    errors: &mut Vec<SyntaxError>,
) -> Result<FunctionDeclaration> {
    let start = cursor.start();
    let return_type = parse_declaration_specifiers(cursor)?;
    let pointer_return = cursor.bump_operator("*");
    let (id, _) = cursor.expect_identifier()?;
    cursor.expect_punct("(")?;
    let params = parse_params(cursor)?;
    cursor.expect_punct(")")?;

    let body = if cursor.bump_punct(";") {
        None
    } else {
        Some(parse_block(cursor, errors)?)
    };

    Ok(FunctionDeclaration {
        id,
        return_type,
        pointer_return,
        params,
        body,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_typedef(cursor: &mut Cursor) -> Result<Typedef> {
    let start = cursor.start();
    cursor.bump();
    let specifiers = parse_declaration_specifiers(cursor)?;
    let (id, _) = cursor.expect_identifier()?;
    cursor.expect_punct(";")?;

    Ok(Typedef {
        specifiers,
        id,
        span: Span::new(start, cursor.prev_end()),
    })
}

fn parse_preprocessor_item(token: &Token) -> TopLevel {
    let text = token.value.trim();
    if let Some(rest) = text.strip_prefix("#include") {
        let rest = rest.trim();
        let header = rest
            .strip_prefix('<')
            .and_then(|r| r.strip_suffix('>'))
            .map(|h| (h, true))
            .or_else(|| {
                rest.strip_prefix('"')
                    .and_then(|r| r.strip_suffix('"'))
                    .map(|h| (h, false))
            });
        if let Some((header, system)) = header {
            return TopLevel::Include(Include {
                header: header.to_owned(),
                system,
                span: token.span(),
            });
        }
    }
    TopLevel::Directive(Directive {
        directive: text.to_owned(),
        span: token.span(),
    })
}

/// Peeks past the declaration head to decide between a function and a
/// variable: specifiers, optional `*`, identifier, then `(` means function.
/// The cursor is restored either way.
fn toplevel_is_function(cursor: &mut Cursor) -> bool {
    let savepoint = cursor.save();
    let head = parse_declaration_specifiers(cursor).and_then(|_| {
        cursor.bump_operator("*");
        cursor.expect_identifier()
    });
    let is_function = head.is_ok() && cursor.peek_is_punct("(");
    cursor.restore(savepoint);
    is_function
}

fn parse_program(tokens: &[Token]) -> (Program, Vec<SyntaxError>) {
    let mut cursor = Cursor::new(tokens);
    let mut body = Vec::new();
    let mut errors = Vec::new();
    let start = cursor.start();

    while let Some(token) = cursor.peek() {
        let item = match token.kind {
            TokenKind::Preprocessor => {
                let item = parse_preprocessor_item(token);
                cursor.bump();
                Ok(item)
            }
            TokenKind::Error => Err(cursor.error_here(SyntaxErrorKind::Unrecognized(
                token.value.clone(),
            ))),
            _ if token.is_keyword("typedef") => parse_typedef(&mut cursor).map(TopLevel::Typedef),
            _ if token.is_specifier() => {
                if toplevel_is_function(&mut cursor) {
                    parse_function_declaration(&mut cursor, &mut errors).map(TopLevel::Function)
                } else {
                    parse_variable_declaration(&mut cursor).map(TopLevel::Variable)
                }
            }
            _ => Err(cursor.error_here(SyntaxErrorKind::UnexpectedTopLevel(
                token.value.clone(),
            ))),
        };
        match item {
            Ok(item) => body.push(item),
            Err(err) => {
                errors.push(err);
                cursor.bump();
            }
        }
    }

    let span = Span::new(start, cursor.prev_end());
    (Program { body, span }, errors)
}

/// Parses a token stream into a [`Program`] plus syntax diagnostics.
///
/// Runs to completion on any input. An unexpected internal fault is reported
/// as a single diagnostic with an empty tree instead of unwinding.
pub fn parse(tokens: &[Token]) -> ParseResult {
    match catch_unwind(AssertUnwindSafe(|| parse_program(tokens))) {
        Ok((program, errors)) => ParseResult { program, errors },
        Err(panic) => ParseResult {
            program: Program::default(),
            errors: vec![
                SyntaxErrorKind::Internal(crate::panic_message(panic)).at(Span::default(), 1),
            ],
        },
    }
}
