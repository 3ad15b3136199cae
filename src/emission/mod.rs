//! Text rendering for the back-end artifacts: the numbered TAC listing
//! format and the AT&T assembly layout.

use crate::codegen::{AsmLine, AsmOperand};
use crate::tac::{TacInstruction, TacOp};

use std::fmt;

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// `OP ARG1 ARG2 -> RESULT` with absent operands omitted; a label renders
/// as `name:`.
impl fmt::Display for TacInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_label() {
            return write!(f, "{}:", self.label.as_deref().unwrap_or_default());
        }
        write!(f, "{}", self.op)?;
        if let Some(arg1) = &self.arg1 {
            write!(f, " {arg1}")?;
        }
        if let Some(arg2) = &self.arg2 {
            write!(f, " {arg2}")?;
        }
        if let Some(result) = &self.result {
            write!(f, " -> {result}")?;
        }
        Ok(())
    }
}

/// The numbered multi-line TAC listing: label lines bare, instruction lines
/// prefixed with their sequence number.
pub fn listing(instructions: &[TacInstruction]) -> String {
    let mut output = String::new();
    for instruction in instructions {
        if instruction.is_label() {
            output.push_str(&format!("{instruction}\n"));
        } else {
            output.push_str(&format!("{:03}: {instruction}\n", instruction.line_number));
        }
    }
    output
}

impl fmt::Display for AsmOperand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Imm(value) => write!(f, "${value}"),
            Self::Sym(name) => write!(f, "{name}"),
            Self::Reg(name) => write!(f, "%{name}"),
        }
    }
}

/// Renders one assembly line with conventional indentation: directives and
/// instructions indented, labels flush left.
pub(crate) fn asm_line(line: &AsmLine) -> String {
    match line {
        AsmLine::Section(name) => format!("    .section {name}"),
        AsmLine::Globl(name) => format!("    .globl {name}"),
        AsmLine::StringConst { label, value } => format!("{label}: .string {value}"),
        AsmLine::Label(name) => format!("{name}:"),
        AsmLine::Ins0(mnemonic) => format!("    {mnemonic}"),
        AsmLine::Ins1(mnemonic, operand) => format!("    {mnemonic} {operand}"),
        AsmLine::Ins2(mnemonic, first, second) => format!("    {mnemonic} {first}, {second}"),
        AsmLine::Comment(text) => format!("    # {text}"),
    }
}

impl fmt::Display for AsmLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", asm_line(self))
    }
}

/// The complete assembly listing as text.
pub fn assembly(lines: &[AsmLine]) -> String {
    let mut output = String::new();
    for line in lines {
        output.push_str(&asm_line(line));
        output.push('\n');
    }
    output
}
