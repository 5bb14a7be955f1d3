//! Replication: broadcasting one quad's value across its four lanes via the
//! replicate-all peripheral register.

use vc4c_ir::{Instruction, InstructionMeta, InstructionWalker, Register, Value};

/// Writes `src` into the replicate-all register, then (if `dest` is given) moves the
/// broadcast value back out into a normal local.
pub fn replicate(walker: &mut InstructionWalker, src: Value, dest: Option<Value>) {
    let replicate_value = Value::Register(Register::replicate_all(), src.get_type().clone());
    match dest {
        None => {
            walker.reset(Instruction::Move {
                src,
                dest: replicate_value,
                meta: InstructionMeta::default(),
            });
        }
        Some(dest) => {
            let write = Instruction::Move {
                src,
                dest: replicate_value.clone(),
                meta: InstructionMeta::default(),
            };
            crate::seq::emit_before(walker, vec![write]);
            walker.reset(Instruction::Move {
                src: replicate_value,
                dest,
                meta: InstructionMeta::default(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, NopReason, ScalarType};

    #[test]
    fn replicate_with_destination_writes_then_reads_back() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let ty = DataType::Scalar(ScalarType::I32);
        let src_local = method.add_new_local(ty.clone(), "src");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        replicate(
            &mut walker,
            Value::Local(src_local, ty.clone()),
            Some(Value::Local(dest_local, ty.clone())),
        );
        assert!(matches!(walker.get(), Some(Instruction::Move { .. })));
        assert!(walker.previous_in_block());
        match walker.get() {
            Some(Instruction::Move { dest: Value::Register(reg, _), .. }) => {
                assert_eq!(*reg, Register::replicate_all());
            }
            other => panic!("unexpected instruction: {:?}", other),
        }
    }
}
