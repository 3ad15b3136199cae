#[cfg(all(test, feature = "emission"))]
mod codegen_tests;
#[cfg(feature = "emission")]
mod machine;

use crate::ast::Program;
use crate::semantic_analysis::SymbolTable;
use crate::tac::{self, CodegenError, CodegenErrorKind, TacInstruction, TacOp};

use std::panic::{catch_unwind, AssertUnwindSafe};

/// A symbolic assembly operand. Numeric TAC operands become immediates;
/// names stay as they are, since this backend illustrates instruction
/// selection, not storage allocation.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AsmOperand {
    Imm(String),
    Sym(String),
    Reg(&'static str),
}

/// One output line of the AT&T-syntax listing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum AsmLine {
    Section(&'static str),
    Globl(String),
    /// `label: .string value` in the data section.
    StringConst { label: String, value: String },
    Label(String),
    Ins0(&'static str),
    Ins1(&'static str, AsmOperand),
    Ins2(&'static str, AsmOperand, AsmOperand),
    Comment(String),
}

pub type AsmListing = Vec<AsmLine>;

fn operand(value: &str) -> AsmOperand {
    if value.parse::<f64>().is_ok() {
        AsmOperand::Imm(value.to_owned())
    } else {
        AsmOperand::Sym(value.to_owned())
    }
}

fn arg1(instruction: &TacInstruction) -> AsmOperand {
    operand(instruction.arg1.as_deref().unwrap_or("0"))
}

fn arg2(instruction: &TacInstruction) -> AsmOperand {
    operand(instruction.arg2.as_deref().unwrap_or("0"))
}

fn result_sym(instruction: &TacInstruction) -> AsmOperand {
    AsmOperand::Sym(instruction.result.clone().unwrap_or_default())
}

const RAX: AsmOperand = AsmOperand::Reg("rax");
const RDX: AsmOperand = AsmOperand::Reg("rdx");
const RDI: AsmOperand = AsmOperand::Reg("rdi");
const RBP: AsmOperand = AsmOperand::Reg("rbp");
const RSP: AsmOperand = AsmOperand::Reg("rsp");
const AL: AsmOperand = AsmOperand::Reg("al");

fn emit_instruction(instruction: &TacInstruction, lines: &mut AsmListing) {
    match instruction.op {
        TacOp::Label => {
            lines.push(AsmLine::Label(
                instruction.label.clone().unwrap_or_default(),
            ));
        }
        TacOp::FunctionStart => {
            lines.push(AsmLine::Ins1("pushq", RBP));
            lines.push(AsmLine::Ins2("movq", RSP, RBP));
        }
        TacOp::FunctionEnd => {
            lines.push(AsmLine::Ins1("popq", RBP));
            lines.push(AsmLine::Ins0("ret"));
        }
        TacOp::Return => {
            if instruction.arg1.is_some() {
                lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            }
            lines.push(AsmLine::Ins1("popq", RBP));
            lines.push(AsmLine::Ins0("ret"));
        }
        TacOp::Assign => {
            lines.push(AsmLine::Ins2("movq", arg1(instruction), result_sym(instruction)));
        }
        TacOp::Add | TacOp::Sub | TacOp::Mul | TacOp::And | TacOp::Or => {
            let mnemonic = match instruction.op {
                TacOp::Sub => "subq",
                TacOp::Mul => "imulq",
                TacOp::And => "andq",
                TacOp::Or => "orq",
                _ => "addq",
            };
            lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins2(mnemonic, arg2(instruction), RAX));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::Div | TacOp::Mod => {
            lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins0("cqo"));
            lines.push(AsmLine::Ins1("idivq", arg2(instruction)));
            let quotient_or_remainder = if instruction.op == TacOp::Div { RAX } else { RDX };
            lines.push(AsmLine::Ins2("movq", quotient_or_remainder, result_sym(instruction)));
        }
        TacOp::Neg => {
            lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins1("negq", RAX));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::Not => {
            lines.push(AsmLine::Ins2("cmpq", AsmOperand::Imm("0".into()), arg1(instruction)));
            lines.push(AsmLine::Ins1("sete", AL));
            lines.push(AsmLine::Ins2("movzbq", AL, RAX));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::Eq | TacOp::Ne | TacOp::Lt | TacOp::Gt | TacOp::Le | TacOp::Ge => {
            let set = match instruction.op {
                TacOp::Ne => "setne",
                TacOp::Lt => "setl",
                TacOp::Gt => "setg",
                TacOp::Le => "setle",
                TacOp::Ge => "setge",
                _ => "sete",
            };
            lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins2("cmpq", arg2(instruction), RAX));
            lines.push(AsmLine::Ins1(set, AL));
            lines.push(AsmLine::Ins2("movzbq", AL, RAX));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::Addr => {
            lines.push(AsmLine::Ins2("leaq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::Deref => {
            lines.push(AsmLine::Ins2("movq", arg1(instruction), RAX));
            lines.push(AsmLine::Ins2(
                "movq",
                AsmOperand::Sym("(%rax)".into()),
                RAX,
            ));
            lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
        }
        TacOp::IfFalse => {
            lines.push(AsmLine::Ins2("cmpq", AsmOperand::Imm("0".into()), arg1(instruction)));
            lines.push(AsmLine::Ins1("je", result_sym(instruction)));
        }
        TacOp::Goto => {
            lines.push(AsmLine::Ins1("jmp", result_sym(instruction)));
        }
        TacOp::Call => {
            lines.push(AsmLine::Ins1("call", arg1(instruction)));
            if instruction.result.is_some() {
                lines.push(AsmLine::Ins2("movq", RAX, result_sym(instruction)));
            }
        }
        // Bookkeeping ops have no machine counterpart here; they stay
        // visible as comments.
        TacOp::Param | TacOp::Declare | TacOp::ParamDecl | TacOp::Include => {
            let text = match &instruction.arg1 {
                Some(arg) => format!("{} {arg}", instruction.op.as_str()),
                None => instruction.op.as_str().to_owned(),
            };
            lines.push(AsmLine::Comment(text));
        }
    }
}

/// Builds the AT&T listing for a TAC sequence. With a `main` label present a
/// `_start` stub is emitted that calls it and feeds its value to the exit
/// syscall.
pub fn assemble(
    instructions: &[TacInstruction],
    string_literals: &[(String, String)],
    has_main: bool,
) -> AsmListing {
    let mut lines = AsmListing::new();

    if !string_literals.is_empty() {
        lines.push(AsmLine::Section(".data"));
        for (label, value) in string_literals {
            lines.push(AsmLine::StringConst {
                label: label.clone(),
                value: value.clone(),
            });
        }
    }

    lines.push(AsmLine::Section(".text"));
    lines.push(AsmLine::Globl("_start".to_owned()));
    if has_main {
        lines.push(AsmLine::Label("_start".to_owned()));
        lines.push(AsmLine::Ins1("call", AsmOperand::Sym("main".into())));
        lines.push(AsmLine::Ins2("movq", RAX, RDI));
        lines.push(AsmLine::Ins2("movq", AsmOperand::Imm("60".into()), RAX));
        lines.push(AsmLine::Ins0("syscall"));
    }

    for instruction in instructions {
        emit_instruction(instruction, &mut lines);
    }

    lines
}

/// Per-run counters of the generator, for display next to the listings.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Statistics {
    pub instruction_count: usize,
    pub optimized_instruction_count: usize,
    pub temp_variables: u64,
    pub labels: usize,
    pub optimization_passes: u64,
    pub included_headers: Vec<String>,
}

/// Everything the back-end produces for one program.
///
/// The rendered text fields need the `emission` feature (on by default);
/// without it this stage still yields the instruction-level artifacts via
/// [`tac::emit`], [`tac::optimize`] and [`assemble`].
#[derive(Debug)]
pub struct Generated {
    #[cfg(feature = "emission")]
    pub intermediate_code: String,
    #[cfg(feature = "emission")]
    pub optimized_code: String,
    #[cfg(feature = "emission")]
    pub assembly_code: String,
    #[cfg(feature = "emission")]
    pub optimized_assembly_code: String,
    /// Illustrative encoding of the optimized listing; see [`machine`].
    #[cfg(feature = "emission")]
    pub machine_code: String,
    pub string_literals: Vec<(String, String)>,
    pub statistics: Statistics,
    pub errors: Vec<CodegenError>,
}

fn instruction_count(instructions: &[TacInstruction]) -> usize {
    instructions.iter().filter(|i| !i.is_label()).count()
}

fn label_count(instructions: &[TacInstruction]) -> usize {
    instructions.iter().filter(|i| i.is_label()).count()
}

fn run(program: &Program, symbols: &SymbolTable) -> Generated {
    let tac = tac::emit(program);
    let optimized = tac::optimize(&tac.instructions);

    let statistics = Statistics {
        instruction_count: instruction_count(&tac.instructions),
        optimized_instruction_count: instruction_count(&optimized.instructions),
        temp_variables: tac.temp_count,
        labels: label_count(&tac.instructions),
        optimization_passes: optimized.passes,
        included_headers: tac.included_headers.clone(),
    };

    #[cfg(not(feature = "emission"))]
    let _ = symbols;

    #[cfg(feature = "emission")]
    let (intermediate_code, optimized_code, assembly_code, optimized_assembly_code, machine_code) = {
        let has_main = symbols
            .get(crate::semantic_analysis::GLOBAL_SCOPE, "main")
            .is_some_and(crate::semantic_analysis::Symbol::is_function);
        let assembly = assemble(&tac.instructions, &tac.string_literals, has_main);
        let optimized_assembly = assemble(&optimized.instructions, &tac.string_literals, has_main);
        (
            crate::emission::listing(&tac.instructions),
            crate::emission::listing(&optimized.instructions),
            crate::emission::assembly(&assembly),
            crate::emission::assembly(&optimized_assembly),
            machine::encode(&optimized_assembly),
        )
    };

    Generated {
        #[cfg(feature = "emission")]
        intermediate_code,
        #[cfg(feature = "emission")]
        optimized_code,
        #[cfg(feature = "emission")]
        assembly_code,
        #[cfg(feature = "emission")]
        optimized_assembly_code,
        #[cfg(feature = "emission")]
        machine_code,
        string_literals: tac.string_literals,
        statistics,
        errors: tac.errors,
    }
}

/// Runs the whole back-end: TAC, optimized TAC, both assembly listings, the
/// illustrative machine encoding and the statistics.
///
/// Callable on any tree; input that slipped past analysis surfaces as
/// diagnostics, and an internal fault collapses to a single one.
pub fn generate(program: &Program, symbols: &SymbolTable) -> Generated {
    catch_unwind(AssertUnwindSafe(|| run(program, symbols))).unwrap_or_else(|panic| Generated {
        #[cfg(feature = "emission")]
        intermediate_code: String::new(),
        #[cfg(feature = "emission")]
        optimized_code: String::new(),
        #[cfg(feature = "emission")]
        assembly_code: String::new(),
        #[cfg(feature = "emission")]
        optimized_assembly_code: String::new(),
        #[cfg(feature = "emission")]
        machine_code: String::new(),
        string_literals: Vec::new(),
        statistics: Statistics {
            instruction_count: 0,
            optimized_instruction_count: 0,
            temp_variables: 0,
            labels: 0,
            optimization_passes: 0,
            included_headers: Vec::new(),
        },
        errors: vec![CodegenErrorKind::Internal(crate::panic_message(panic))
            .at(crate::ast::Span::default())],
    })
}
