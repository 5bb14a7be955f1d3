//! Shared plumbing for lowering helpers: building a multi-instruction sequence in front of
//! the instruction a helper is replacing.

use vc4c_ir::{Instruction, InstructionWalker, NopReason};

/// Inserts `instructions` in order immediately before the walker's current position,
/// leaving the walker positioned at whatever was there before the call (so the caller can
/// `reset`/`erase` it next).
pub fn emit_before(walker: &mut InstructionWalker, instructions: Vec<Instruction>) {
    for instruction in instructions {
        walker.emplace(instruction);
        walker.next_in_block();
    }
}

/// Pops the last instruction of `sequence` and uses it to replace whatever instruction the
/// walker is positioned at, after emitting everything before it via [`emit_before`]. For a
/// sequence built to finalize a single abstract instruction in one shot.
pub fn replace_with_sequence(walker: &mut InstructionWalker, mut sequence: Vec<Instruction>) {
    let last = sequence.pop().expect("lowering sequence must not be empty");
    emit_before(walker, sequence);
    walker.reset(last);
}

/// Runs a self-contained lowering helper (one that finalizes via its own internal `reset`)
/// as one step of a larger composite lowering, without letting it consume the walker's true
/// original position.
///
/// Inserts a scratch placeholder, runs `f` positioned at it (so `f`'s internal `reset`
/// consumes the placeholder instead of the real instruction still further down the block),
/// then advances back onto that real instruction so the next composite step - or the
/// caller's own final `reset`/`erase` - still finds it untouched.
pub fn with_placeholder<R>(walker: &mut InstructionWalker, f: impl FnOnce(&mut InstructionWalker) -> R) -> R {
    walker.emplace(Instruction::Nop(NopReason::Other("lowering scratch")));
    let result = f(walker);
    walker.next_in_block();
    result
}
