//! Vector rotation: rotates the 16 SIMD lanes of a value by a compile-time or runtime
//! offset, respecting the hardware's accumulator-input and write-hazard constraints.

use crate::seq::emit_before;
use vc4c_ir::{
    Instruction, InstructionMeta, InstructionWalker, NopReason, OpCode, Register, SmallImmediate, Value,
};

/// A rotation amount: a compile-time lane count plus direction, or a runtime value that
/// must be moved into the rotation accumulator first.
pub enum RotationAmount {
    Literal { offset: u8, down: bool },
    Dynamic(Value),
}

fn is_accumulator(value: &Value) -> bool {
    matches!(value, Value::Register(reg, _) if reg.is_accumulator())
}

/// Builds the full instruction sequence implementing a rotation of `src` by `amount` into
/// `dest`, in program order. The caller is responsible for placing it (typically
/// [`rotate`] for a standalone rotation, or spliced into a larger sequence for vector
/// insert/shuffle).
pub fn build_rotation(src: Value, amount: RotationAmount, dest: Value) -> Vec<Instruction> {
    // Case (a): a literal source has every lane identical - any rotation is a no-op move.
    if src.is_compile_time_constant() {
        return vec![Instruction::Move {
            src,
            dest,
            meta: InstructionMeta::default(),
        }];
    }

    match amount {
        RotationAmount::Literal { offset, down } => match SmallImmediate::from_rotation(offset, down) {
            None => vec![Instruction::Move {
                src,
                dest,
                meta: InstructionMeta::default(),
            }],
            Some(imm) => {
                let mut seq = Vec::new();
                if !is_accumulator(&src) {
                    seq.push(Instruction::Nop(NopReason::WaitRegister));
                }
                seq.push(Instruction::VectorRotation {
                    src,
                    offset: imm,
                    dest,
                    meta: InstructionMeta::default(),
                });
                seq
            }
        },
        RotationAmount::Dynamic(offset_value) => {
            let acc_dest = Value::Register(Register::rotation_accumulator(), offset_value.get_type().clone());
            let mut seq = Vec::new();
            if down {
                // "16 - offset", masked to 4 bits so an offset of 0 collapses back to 0
                // rather than the out-of-range value 16.
                let sixteen = Value::uint(16, offset_value.get_type().clone());
                let mask = Value::uint(0xF, offset_value.get_type().clone());
                seq.push(Instruction::Operation {
                    op: OpCode::Sub,
                    args: vec![sixteen, offset_value],
                    dest: acc_dest.clone(),
                    meta: InstructionMeta::default(),
                });
                seq.push(Instruction::Operation {
                    op: OpCode::And,
                    args: vec![acc_dest.clone(), mask],
                    dest: acc_dest.clone(),
                    meta: InstructionMeta::default(),
                });
            } else {
                seq.push(Instruction::Move {
                    src: offset_value,
                    dest: acc_dest.clone(),
                    meta: InstructionMeta::default(),
                });
            }
            if !is_accumulator(&src) {
                seq.push(Instruction::Nop(NopReason::WaitRegister));
            }
            seq.push(Instruction::VectorRotation {
                src,
                offset: SmallImmediate::RotationFromAccumulator,
                dest,
                meta: InstructionMeta::default(),
            });
            seq
        }
    }
}

/// Lowers a standalone rotation, replacing whatever instruction `walker` is positioned at.
pub fn rotate(walker: &mut InstructionWalker, src: Value, amount: RotationAmount, dest: Value) {
    let mut seq = build_rotation(src, amount, dest);
    let last = seq.pop().expect("build_rotation always returns at least one instruction");
    emit_before(walker, seq);
    walker.reset(last);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, ScalarType};

    fn i32_ty() -> DataType {
        DataType::Scalar(ScalarType::I32)
    }

    #[test]
    fn literal_rotation_offset_collapses_zero_to_move() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let local_src = method.add_new_local(i32_ty(), "src");
        let local_dest = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        rotate(
            &mut walker,
            Value::Local(local_src, i32_ty()),
            RotationAmount::Literal { offset: 0, down: false },
            Value::Local(local_dest, i32_ty()),
        );
        assert!(matches!(walker.get(), Some(Instruction::Move { .. })));
    }

    #[test]
    fn rotation_with_register_source_inserts_wait_nop() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let local_src = method.add_new_local(i32_ty(), "src");
        let local_dest = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        rotate(
            &mut walker,
            Value::Local(local_src, i32_ty()),
            RotationAmount::Literal { offset: 3, down: false },
            Value::Local(local_dest, i32_ty()),
        );
        assert!(matches!(walker.get(), Some(Instruction::VectorRotation { .. })));
        assert!(walker.previous_in_block());
        assert!(matches!(walker.get(), Some(Instruction::Nop(NopReason::WaitRegister))));
    }
}
