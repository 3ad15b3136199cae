mod codegen_error;
mod optimize;
#[cfg(test)]
mod tac_tests;

use crate::ast::*;
pub use codegen_error::{CodegenError, CodegenErrorKind};
pub use optimize::{optimize, Optimized};

pub type TacListing = Vec<TacInstruction>;

/// Three-address operations. `Label` carries only a label; everything else
/// uses up to two source operands and one destination.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TacOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Not,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Addr,
    Deref,
    IfFalse,
    Goto,
    Label,
    Call,
    Param,
    Return,
    Declare,
    ParamDecl,
    FunctionStart,
    FunctionEnd,
    Include,
}

impl TacOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assign => "ASSIGN",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Mod => "MOD",
            Self::Neg => "NEG",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Gt => "GT",
            Self::Le => "LE",
            Self::Ge => "GE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Addr => "ADDR",
            Self::Deref => "DEREF",
            Self::IfFalse => "IF_FALSE",
            Self::Goto => "GOTO",
            Self::Label => "LABEL",
            Self::Call => "CALL",
            Self::Param => "PARAM",
            Self::Return => "RETURN",
            Self::Declare => "DECLARE",
            Self::ParamDecl => "PARAM_DECL",
            Self::FunctionStart => "FUNCTION_START",
            Self::FunctionEnd => "FUNCTION_END",
            Self::Include => "INCLUDE",
        }
    }
}

/// One TAC instruction. Instructions are append-only during emission;
/// optimization builds a fresh sequence.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TacInstruction {
    pub op: TacOp,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
    pub result: Option<String>,
    pub label: Option<String>,
    pub line_number: u64,
}

impl TacInstruction {
    fn new(op: TacOp) -> Self {
        Self {
            op,
            arg1: None,
            arg2: None,
            result: None,
            label: None,
            line_number: 0,
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        let mut instruction = Self::new(TacOp::Label);
        instruction.label = Some(name.into());
        instruction
    }

    pub fn assign(src: impl Into<String>, dst: impl Into<String>) -> Self {
        let mut instruction = Self::new(TacOp::Assign);
        instruction.arg1 = Some(src.into());
        instruction.result = Some(dst.into());
        instruction
    }

    pub fn unary(op: TacOp, src: impl Into<String>, dst: impl Into<String>) -> Self {
        let mut instruction = Self::new(op);
        instruction.arg1 = Some(src.into());
        instruction.result = Some(dst.into());
        instruction
    }

    pub fn binary(
        op: TacOp,
        arg1: impl Into<String>,
        arg2: impl Into<String>,
        dst: impl Into<String>,
    ) -> Self {
        let mut instruction = Self::new(op);
        instruction.arg1 = Some(arg1.into());
        instruction.arg2 = Some(arg2.into());
        instruction.result = Some(dst.into());
        instruction
    }

    pub fn goto(target: impl Into<String>) -> Self {
        let mut instruction = Self::new(TacOp::Goto);
        instruction.result = Some(target.into());
        instruction
    }

    pub fn if_false(condition: impl Into<String>, target: impl Into<String>) -> Self {
        let mut instruction = Self::new(TacOp::IfFalse);
        instruction.arg1 = Some(condition.into());
        instruction.result = Some(target.into());
        instruction
    }

    pub fn with_arg1(op: TacOp, arg1: impl Into<String>) -> Self {
        let mut instruction = Self::new(op);
        instruction.arg1 = Some(arg1.into());
        instruction
    }

    pub fn ret(value: Option<String>) -> Self {
        let mut instruction = Self::new(TacOp::Return);
        instruction.arg1 = value;
        instruction
    }

    pub fn call(name: impl Into<String>, argc: usize, dst: impl Into<String>) -> Self {
        let mut instruction = Self::new(TacOp::Call);
        instruction.arg1 = Some(name.into());
        instruction.arg2 = Some(argc.to_string());
        instruction.result = Some(dst.into());
        instruction
    }

    pub fn is_label(&self) -> bool {
        self.op == TacOp::Label
    }
}

/// Jump targets of the loop currently being lowered; `break` goes to
/// `end_label`, `continue` to `continue_label`.
#[derive(Debug, Clone)]
pub struct LoopFrame {
    pub start_label: String,
    pub continue_label: String,
    pub end_label: String,
}

/// Mutable state of one emission run. All counters start at zero, so the
/// same tree always lowers to the same listing.
struct GenContext {
    temp_counter: u64,
    label_counter: u64,
    string_literals: Vec<(String, String)>,
    string_counter: u64,
    loop_stack: Vec<LoopFrame>,
    included_headers: Vec<String>,
    errors: Vec<CodegenError>,
}

impl GenContext {
    fn new() -> Self {
        Self {
            temp_counter: 0,
            label_counter: 0,
            string_literals: Vec::new(),
            string_counter: 0,
            loop_stack: Vec::new(),
            included_headers: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn new_temp(&mut self) -> String {
        let id = self.temp_counter;
        self.temp_counter += 1;
        format!("t{id}")
    }

    fn next_label_id(&mut self) -> u64 {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    fn intern_string(&mut self, quoted: &str) -> String {
        if let Some((label, _)) = self
            .string_literals
            .iter()
            .find(|(_, value)| value == quoted)
        {
            return label.clone();
        }
        let label = format!("str{}", self.string_counter);
        self.string_counter += 1;
        self.string_literals.push((label.clone(), quoted.to_owned()));
        label
    }

    fn error(&mut self, kind: CodegenErrorKind, span: Span) {
        self.errors.push(kind.at(span));
    }
}

/// Everything one emission run produces besides the listing itself.
#[derive(Debug)]
pub struct TacProgram {
    pub instructions: TacListing,
    /// Generated label → literal (quotes included), in creation order.
    pub string_literals: Vec<(String, String)>,
    pub temp_count: u64,
    pub included_headers: Vec<String>,
    pub errors: Vec<CodegenError>,
}

/// Numbers non-label instructions sequentially from 1. Labels stay at 0;
/// their listing form has no number.
pub(crate) fn renumber(instructions: &mut TacListing) {
    let mut number = 0;
    for instruction in instructions {
        if !instruction.is_label() {
            number += 1;
            instruction.line_number = number;
        }
    }
}

/// Decodes a character literal lexeme (quotes included) to its code point.
fn char_literal_value(lexeme: &str) -> Option<u32> {
    let inner = lexeme.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    let value = if first == '\\' {
        match chars.next()? {
            'n' => '\n' as u32,
            't' => '\t' as u32,
            'r' => '\r' as u32,
            '0' => 0,
            other => other as u32,
        }
    } else {
        first as u32
    };
    chars.next().is_none().then_some(value)
}

fn emit_literal(literal: &Literal, ctx: &mut GenContext) -> String {
    match literal.value_type {
        LiteralType::Number => literal.value.clone(),
        LiteralType::String => ctx.intern_string(&literal.value),
        LiteralType::Char => char_literal_value(&literal.value)
            .map_or_else(|| literal.value.clone(), |v| v.to_string()),
    }
}

fn binary_tac_op(op: BinaryOp) -> TacOp {
    match op {
        BinaryOp::Add => TacOp::Add,
        BinaryOp::Sub => TacOp::Sub,
        BinaryOp::Mul => TacOp::Mul,
        BinaryOp::Div => TacOp::Div,
        BinaryOp::Mod => TacOp::Mod,
        BinaryOp::Eq => TacOp::Eq,
        BinaryOp::Ne => TacOp::Ne,
        BinaryOp::Lt => TacOp::Lt,
        BinaryOp::Gt => TacOp::Gt,
        BinaryOp::Le => TacOp::Le,
        BinaryOp::Ge => TacOp::Ge,
        BinaryOp::LogicalAnd => TacOp::And,
        BinaryOp::LogicalOr => TacOp::Or,
    }
}

fn emit_incdec(
    op: UnaryOp,
    inner: &Exp,
    prefix: bool,
    instructions: &mut TacListing,
    ctx: &mut GenContext,
) -> String {
    let step_op = if op == UnaryOp::Increment {
        TacOp::Add
    } else {
        TacOp::Sub
    };
    let ExpKind::Identifier(name) = &inner.kind else {
        ctx.error(
            CodegenErrorKind::UnsupportedOperator(op.as_str().to_owned()),
            inner.span,
        );
        return emit_exp(inner, instructions, ctx);
    };
    if prefix {
        instructions.push(TacInstruction::binary(step_op, name.clone(), "1", name.clone()));
        name.clone()
    } else {
        // The old value survives in a temp; the variable steps afterwards.
        let saved = ctx.new_temp();
        instructions.push(TacInstruction::assign(name.clone(), saved.clone()));
        instructions.push(TacInstruction::binary(step_op, name.clone(), "1", name.clone()));
        saved
    }
}

fn emit_unary(
    op: UnaryOp,
    inner: &Exp,
    instructions: &mut TacListing,
    ctx: &mut GenContext,
) -> String {
    let tac_op = match op {
        UnaryOp::Negate => TacOp::Neg,
        UnaryOp::Not | UnaryOp::Complement => TacOp::Not,
        UnaryOp::AddressOf => TacOp::Addr,
        UnaryOp::Deref => TacOp::Deref,
        UnaryOp::Increment | UnaryOp::Decrement => unreachable!("handled by emit_incdec"),
    };
    let src = emit_exp(inner, instructions, ctx);
    let dst = ctx.new_temp();
    instructions.push(TacInstruction::unary(tac_op, src, dst.clone()));
    dst
}

fn emit_exp(exp: &Exp, instructions: &mut TacListing, ctx: &mut GenContext) -> String {
    match &exp.kind {
        ExpKind::Literal(literal) => emit_literal(literal, ctx),
        ExpKind::Identifier(name) => name.clone(),
        ExpKind::Binary(op, left, right) => {
            let arg1 = emit_exp(left, instructions, ctx);
            let arg2 = emit_exp(right, instructions, ctx);
            let dst = ctx.new_temp();
            instructions.push(TacInstruction::binary(
                binary_tac_op(*op),
                arg1,
                arg2,
                dst.clone(),
            ));
            dst
        }
        ExpKind::Unary { op, exp: inner, prefix } => {
            if op.is_incdec() {
                emit_incdec(*op, inner, *prefix, instructions, ctx)
            } else {
                emit_unary(*op, inner, instructions, ctx)
            }
        }
        ExpKind::Assignment(left, right) => {
            let value = emit_exp(right, instructions, ctx);
            if let ExpKind::Identifier(name) = &left.kind {
                instructions.push(TacInstruction::assign(value, name.clone()));
                name.clone()
            } else {
                ctx.error(
                    CodegenErrorKind::UnsupportedOperator("=".to_owned()),
                    left.span,
                );
                value
            }
        }
        ExpKind::Call { callee, args } => {
            let operands: Vec<String> = args
                .iter()
                .map(|arg| emit_exp(arg, instructions, ctx))
                .collect();
            for operand in operands {
                instructions.push(TacInstruction::with_arg1(TacOp::Param, operand));
            }
            let dst = ctx.new_temp();
            instructions.push(TacInstruction::call(callee.clone(), args.len(), dst.clone()));
            dst
        }
    }
}

fn emit_declaration(
    declaration: &VariableDeclaration,
    instructions: &mut TacListing,
    ctx: &mut GenContext,
) {
    for declarator in &declaration.declarators {
        instructions.push(TacInstruction::with_arg1(
            TacOp::Declare,
            declarator.id.clone(),
        ));
        if let Some(init) = &declarator.init {
            let value = emit_exp(init, instructions, ctx);
            instructions.push(TacInstruction::assign(value, declarator.id.clone()));
        }
    }
}

fn emit_if(if_st: &If, instructions: &mut TacListing, ctx: &mut GenContext) {
    let id = ctx.next_label_id();
    let condition = emit_exp(&if_st.test, instructions, ctx);
    if let Some(alternate) = &if_st.alternate {
        let else_label = format!("IF_ELSE{id}");
        let end_label = format!("IF_END{id}");
        instructions.push(TacInstruction::if_false(condition, else_label.clone()));
        emit_statement(&if_st.consequent, instructions, ctx);
        instructions.push(TacInstruction::goto(end_label.clone()));
        instructions.push(TacInstruction::label(else_label));
        emit_statement(alternate, instructions, ctx);
        instructions.push(TacInstruction::label(end_label));
    } else {
        let end_label = format!("IF_END{id}");
        instructions.push(TacInstruction::if_false(condition, end_label.clone()));
        emit_statement(&if_st.consequent, instructions, ctx);
        instructions.push(TacInstruction::label(end_label));
    }
}

fn emit_while(while_st: &While, instructions: &mut TacListing, ctx: &mut GenContext) {
    let id = ctx.next_label_id();
    let start_label = format!("WHILE_START{id}");
    let end_label = format!("WHILE_END{id}");

    instructions.push(TacInstruction::label(start_label.clone()));
    let condition = emit_exp(&while_st.test, instructions, ctx);
    instructions.push(TacInstruction::if_false(condition, end_label.clone()));

    ctx.loop_stack.push(LoopFrame {
        start_label: start_label.clone(),
        continue_label: start_label.clone(),
        end_label: end_label.clone(),
    });
    emit_statement(&while_st.body, instructions, ctx);
    ctx.loop_stack.pop();

    instructions.push(TacInstruction::goto(start_label));
    instructions.push(TacInstruction::label(end_label));
}

fn emit_for(for_st: &For, instructions: &mut TacListing, ctx: &mut GenContext) {
    let id = ctx.next_label_id();
    let start_label = format!("FOR_START{id}");
    let continue_label = format!("FOR_CONTINUE{id}");
    let end_label = format!("FOR_END{id}");

    match &for_st.init {
        Some(ForInit::Declaration(declaration)) => emit_declaration(declaration, instructions, ctx),
        Some(ForInit::Exp(exp)) => {
            emit_exp(exp, instructions, ctx);
        }
        None => {}
    }

    instructions.push(TacInstruction::label(start_label.clone()));
    if let Some(test) = &for_st.test {
        let condition = emit_exp(test, instructions, ctx);
        instructions.push(TacInstruction::if_false(condition, end_label.clone()));
    }

    ctx.loop_stack.push(LoopFrame {
        start_label: start_label.clone(),
        continue_label: continue_label.clone(),
        end_label: end_label.clone(),
    });
    emit_statement(&for_st.body, instructions, ctx);
    ctx.loop_stack.pop();

    instructions.push(TacInstruction::label(continue_label));
    if let Some(update) = &for_st.update {
        emit_exp(update, instructions, ctx);
    }
    instructions.push(TacInstruction::goto(start_label));
    instructions.push(TacInstruction::label(end_label));
}

fn emit_statement(statement: &Statement, instructions: &mut TacListing, ctx: &mut GenContext) {
    match statement {
        Statement::Block(block) => {
            for item in &block.body {
                emit_block_item(item, instructions, ctx);
            }
        }
        Statement::If(if_st) => emit_if(if_st, instructions, ctx),
        Statement::While(while_st) => emit_while(while_st, instructions, ctx),
        Statement::For(for_st) => emit_for(for_st, instructions, ctx),
        Statement::Return(ret) => {
            let value = ret
                .argument
                .as_ref()
                .map(|argument| emit_exp(argument, instructions, ctx));
            instructions.push(TacInstruction::ret(value));
        }
        Statement::Exp(exp) => {
            emit_exp(exp, instructions, ctx);
        }
        Statement::Break(span) => match ctx.loop_stack.last() {
            Some(frame) => {
                let target = frame.end_label.clone();
                instructions.push(TacInstruction::goto(target));
            }
            None => ctx.error(CodegenErrorKind::BreakOutsideLoop, *span),
        },
        Statement::Continue(span) => match ctx.loop_stack.last() {
            Some(frame) => {
                let target = frame.continue_label.clone();
                instructions.push(TacInstruction::goto(target));
            }
            None => ctx.error(CodegenErrorKind::ContinueOutsideLoop, *span),
        },
        Statement::Null(_) => {}
    }
}

fn emit_block_item(item: &BlockItem, instructions: &mut TacListing, ctx: &mut GenContext) {
    match item {
        BlockItem::S(statement) => emit_statement(statement, instructions, ctx),
        BlockItem::D(declaration) => emit_declaration(declaration, instructions, ctx),
    }
}

fn emit_function(
    function: &FunctionDeclaration,
    instructions: &mut TacListing,
    ctx: &mut GenContext,
) {
    let Some(body) = &function.body else {
        return;
    };
    instructions.push(TacInstruction::label(function.id.clone()));
    instructions.push(TacInstruction::with_arg1(
        TacOp::FunctionStart,
        function.id.clone(),
    ));
    for param in &function.params {
        instructions.push(TacInstruction::with_arg1(
            TacOp::ParamDecl,
            param.name.clone(),
        ));
    }
    for item in &body.body {
        emit_block_item(item, instructions, ctx);
    }
    instructions.push(TacInstruction::with_arg1(
        TacOp::FunctionEnd,
        function.id.clone(),
    ));
}

fn emit_toplevel(item: &TopLevel, instructions: &mut TacListing, ctx: &mut GenContext) {
    match item {
        TopLevel::Include(include) => {
            ctx.included_headers.push(include.header.clone());
            instructions.push(TacInstruction::with_arg1(
                TacOp::Include,
                include.header.clone(),
            ));
        }
        TopLevel::Function(function) => emit_function(function, instructions, ctx),
        TopLevel::Variable(declaration) => emit_declaration(declaration, instructions, ctx),
        TopLevel::Directive(_) | TopLevel::Typedef(_) => {}
    }
}

/// Lowers a program to three-address code.
///
/// Assumes the tree already passed analysis; anything it still cannot lower
/// becomes a diagnostic rather than a panic.
pub fn emit(program: &Program) -> TacProgram {
    let mut ctx = GenContext::new();
    let mut instructions = TacListing::new();
    for item in &program.body {
        emit_toplevel(item, &mut instructions, &mut ctx);
    }
    renumber(&mut instructions);

    TacProgram {
        instructions,
        string_literals: ctx.string_literals,
        temp_count: ctx.temp_counter,
        included_headers: ctx.included_headers,
        errors: ctx.errors,
    }
}
