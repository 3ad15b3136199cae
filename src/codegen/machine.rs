//! Illustrative machine encoding.
//!
//! This is a fixed mnemonic → opcode-byte lookup, not an instruction
//! encoder: operands, addressing modes and relocations are not encoded. It
//! exists so the final stage of the pipeline can be inspected side by side
//! with the assembly it came from.

use super::{AsmLine, AsmListing};
use crate::emission;

fn opcode(mnemonic: &str) -> &'static str {
    match mnemonic {
        "pushq" => "55",
        "popq" => "5d",
        "movq" => "48 89",
        "movzbq" => "48 0f b6",
        "leaq" => "48 8d",
        "addq" => "48 01",
        "subq" => "48 29",
        "imulq" => "48 0f af",
        "idivq" => "48 f7",
        "andq" => "48 21",
        "orq" => "48 09",
        "negq" => "48 f7 d8",
        "cqo" => "48 99",
        "cmpq" => "48 39",
        "sete" => "0f 94",
        "setne" => "0f 95",
        "setl" => "0f 9c",
        "setg" => "0f 9f",
        "setle" => "0f 9e",
        "setge" => "0f 9d",
        "jmp" => "e9",
        "je" => "0f 84",
        "call" => "e8",
        "ret" => "c3",
        "syscall" => "0f 05",
        _ => "??",
    }
}

/// Renders each instruction line as `opcode-bytes  instruction`; labels and
/// directives pass through unencoded.
pub(super) fn encode(lines: &AsmListing) -> String {
    let mut output = String::new();
    for line in lines {
        let rendered = emission::asm_line(line);
        match line {
            AsmLine::Ins0(mnemonic)
            | AsmLine::Ins1(mnemonic, _)
            | AsmLine::Ins2(mnemonic, _, _) => {
                output.push_str(&format!("{:<12}{}\n", opcode(mnemonic), rendered.trim_start()));
            }
            _ => {
                output.push_str(&rendered);
                output.push('\n');
            }
        }
    }
    output
}
