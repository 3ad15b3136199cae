use super::{renumber, TacInstruction, TacListing, TacOp};

/// Upper bound on optimization passes; the loop also stops as soon as a pass
/// changes nothing, so a second run over already-optimized code is a no-op.
const MAX_PASSES: u64 = 5;

#[derive(Debug)]
pub struct Optimized {
    pub instructions: TacListing,
    /// Passes actually executed, including the final no-change pass.
    pub passes: u64,
}

fn as_integer(operand: &Option<String>) -> Option<i64> {
    operand.as_deref()?.parse().ok()
}

fn as_number(operand: &Option<String>) -> Option<f64> {
    operand.as_deref()?.parse().ok()
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Constant folding for ADD/SUB/MUL with two numeric operands.
fn fold(instruction: &TacInstruction) -> Option<TacInstruction> {
    let result = instruction.result.clone()?;
    if let (Some(a), Some(b)) = (as_integer(&instruction.arg1), as_integer(&instruction.arg2)) {
        let folded = match instruction.op {
            TacOp::Add => a.checked_add(b)?,
            TacOp::Sub => a.checked_sub(b)?,
            TacOp::Mul => a.checked_mul(b)?,
            _ => return None,
        };
        return Some(TacInstruction::assign(folded.to_string(), result));
    }
    let (a, b) = (as_number(&instruction.arg1)?, as_number(&instruction.arg2)?);
    let folded = match instruction.op {
        TacOp::Add => a + b,
        TacOp::Sub => a - b,
        TacOp::Mul => a * b,
        _ => return None,
    };
    Some(TacInstruction::assign(format_number(folded), result))
}

/// `x + 0`, `x * 1` and `x * 0` in either operand order.
fn algebraic_identity(instruction: &TacInstruction) -> Option<TacInstruction> {
    let result = instruction.result.clone()?;
    let arg1 = instruction.arg1.as_deref()?;
    let arg2 = instruction.arg2.as_deref()?;
    match instruction.op {
        TacOp::Add if arg2 == "0" => Some(TacInstruction::assign(arg1, result)),
        TacOp::Add if arg1 == "0" => Some(TacInstruction::assign(arg2, result)),
        TacOp::Mul if arg1 == "0" || arg2 == "0" => Some(TacInstruction::assign("0", result)),
        TacOp::Mul if arg2 == "1" => Some(TacInstruction::assign(arg1, result)),
        TacOp::Mul if arg1 == "1" => Some(TacInstruction::assign(arg2, result)),
        _ => None,
    }
}

fn simplify(instruction: &TacInstruction) -> TacInstruction {
    fold(instruction)
        .or_else(|| algebraic_identity(instruction))
        .unwrap_or_else(|| instruction.clone())
}

/// Two consecutive stores into the same target where the second does not
/// read it: the first never becomes observable.
fn is_dead_store(first: &TacInstruction, second: &TacInstruction) -> bool {
    first.op == TacOp::Assign
        && second.op == TacOp::Assign
        && first.result.is_some()
        && first.result == second.result
        && second.arg1 != first.result
}

fn is_temp(name: &str) -> bool {
    name.strip_prefix('t')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// `ASSIGN v -> tN; ASSIGN tN -> x` collapses to `ASSIGN v -> x` when `tN`
/// is a generated temporary. The emitter never reads such a temp again after
/// copying it on, so the pair carries a single value.
fn collapse_copy(first: &TacInstruction, second: &TacInstruction) -> Option<TacInstruction> {
    if first.op != TacOp::Assign || second.op != TacOp::Assign {
        return None;
    }
    let temp = first.result.as_deref()?;
    if !is_temp(temp) || second.arg1.as_deref() != Some(temp) {
        return None;
    }
    Some(TacInstruction::assign(
        first.arg1.clone()?,
        second.result.clone()?,
    ))
}

fn run_pass(instructions: &[TacInstruction]) -> TacListing {
    let simplified: TacListing = instructions.iter().map(simplify).collect();

    let mut result = TacListing::with_capacity(simplified.len());
    let mut index = 0;
    while index < simplified.len() {
        let instruction = &simplified[index];
        if let Some(next) = simplified.get(index + 1) {
            if is_dead_store(instruction, next) {
                index += 1;
                continue;
            }
            if let Some(merged) = collapse_copy(instruction, next) {
                result.push(merged);
                index += 2;
                continue;
            }
        }
        result.push(instruction.clone());
        index += 1;
    }

    renumber(&mut result);
    result
}

/// Peephole optimization to a bounded fixed point: constant folding,
/// algebraic identities, dead-store and redundant-copy elimination, repeated
/// until a pass changes nothing or the pass budget runs out. The output
/// never has more instructions than the input.
pub fn optimize(instructions: &[TacInstruction]) -> Optimized {
    let mut current = instructions.to_vec();
    renumber(&mut current);
    let mut passes = 0;

    while passes < MAX_PASSES {
        passes += 1;
        let next = run_pass(&current);
        let changed = next != current;
        current = next;
        if !changed {
            break;
        }
    }

    Optimized {
        instructions: current,
        passes,
    }
}
