//! Drives the builtin/intrinsic and legalization rewrites to a fixed point over one method.

use crate::builtins::{lower_named_builtin, lower_work_item_builtin};
use crate::error::CompilationError;
use crate::legalize::legalize_operation;
use vc4c_ir::{Instruction, InstructionWalker, Method};

/// Walks every block of `method`, rewriting work-item builtins, named builtins, and generic
/// arithmetic, re-examining whatever a rewrite leaves behind until nothing in the method
/// changes anymore (a rewrite can itself introduce a call or a generic op).
pub fn run_to_fixed_point(method: &mut Method) -> Result<(), CompilationError> {
    loop {
        let mut changed = false;
        for block_index in 0..method.blocks().len() {
            let mut walker = InstructionWalker::at_block_start(method, block_index);
            while !walker.is_end() {
                if rewrite_once(&mut walker)? {
                    changed = true;
                } else {
                    walker.next_in_block();
                }
            }
        }
        if !changed {
            return Ok(());
        }
    }
}

fn rewrite_once(walker: &mut InstructionWalker) -> Result<bool, CompilationError> {
    match walker.get().cloned() {
        Some(Instruction::MethodCall { name, args, dest, .. }) => {
            if let Some(dest_value) = dest.clone() {
                if lower_work_item_builtin(walker, &name, &args, dest_value)? {
                    return Ok(true);
                }
            }
            if lower_named_builtin(walker, &name, &args, dest)? {
                return Ok(true);
            }
            Err(CompilationError::optimizer(format!("unrecognized call to '{}'", name)))
        }
        Some(Instruction::Operation { op, args, dest, meta }) if op.info().is_abstract => {
            legalize_operation(walker, op, args, dest, meta.decorations)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}
