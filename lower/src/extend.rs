//! Narrowing and widening conversions: zero/sign extension between integer widths, and
//! saturating/truncating narrowing via pack modes.

use vc4c_ir::{Instruction, InstructionMeta, InstructionWalker, Literal, OpCode, PackMode, Value};

/// Zero-extends a value already held in a 32-bit register from `src_width` bits: masking
/// off everything above the source width is sufficient since the upper bits are garbage
/// only if some previous op left them set.
pub fn zero_extend(walker: &mut InstructionWalker, src: Value, src_width: u8, dest: Value) {
    if let Some(lit) = src.as_literal() {
        let mask = mask_for_width(src_width);
        walker.reset(Instruction::Move {
            src: Value::uint(lit.as_u64() & mask, dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return;
    }
    let mask = Value::uint(mask_for_width(src_width), src.get_type().clone());
    walker.reset(Instruction::Operation {
        op: OpCode::And,
        args: vec![src, mask],
        dest,
        meta: InstructionMeta::default(),
    });
}

/// Sign-extends from `src_width` bits: `shl (32 - src_width)` then `asr` by the same
/// amount, letting the arithmetic shift replicate the sign bit back down.
pub fn sign_extend(walker: &mut InstructionWalker, src: Value, src_width: u8, dest: Value) {
    if let Some(lit) = src.as_literal() {
        let shift = 32 - u32::from(src_width);
        let value = ((lit.as_i64() as i32) << shift) >> shift;
        walker.reset(Instruction::Move {
            src: Value::int(i64::from(value), dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return;
    }
    let shift_amount = Value::uint(u64::from(32 - u32::from(src_width)), src.get_type().clone());
    let shifted = walker.new_local(src.get_type().clone(), "sext_shl");
    let shifted_value = Value::Local(shifted, src.get_type().clone());
    let shl = Instruction::Operation {
        op: OpCode::Shl,
        args: vec![src, shift_amount.clone()],
        dest: shifted_value.clone(),
        meta: InstructionMeta::default(),
    };
    crate::seq::emit_before(walker, vec![shl]);
    walker.reset(Instruction::Operation {
        op: OpCode::Asr,
        args: vec![shifted_value, shift_amount],
        dest,
        meta: InstructionMeta::default(),
    });
}

fn mask_for_width(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Narrows `src` (a full 32-bit value) to `dest_bits`, saturating against the destination
/// range rather than wrapping, choosing the pack mode by destination width/signedness.
pub fn saturating_truncate(walker: &mut InstructionWalker, src: Value, dest_bits: u8, dest_signed: bool, dest: Value) {
    if let Some(lit) = src.as_literal() {
        let clamped = clamp_literal(lit, dest_bits, dest_signed);
        walker.reset(Instruction::Move {
            src: Value::int(clamped, dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return;
    }
    walker.reset(Instruction::Move {
        src,
        dest,
        meta: InstructionMeta {
            pack: Some(PackMode::for_saturating_store(dest_bits, dest_signed)),
            ..InstructionMeta::default()
        },
    });
}

/// Narrows `src`, truncating (wrapping) rather than saturating.
pub fn truncate(walker: &mut InstructionWalker, src: Value, dest_bits: u8, dest: Value) {
    walker.reset(Instruction::Move {
        src,
        dest,
        meta: InstructionMeta {
            pack: Some(PackMode::for_truncating_store(dest_bits)),
            ..InstructionMeta::default()
        },
    });
}

fn clamp_literal(lit: Literal, dest_bits: u8, dest_signed: bool) -> i64 {
    let value = lit.as_i64();
    let (lo, hi) = if dest_signed {
        let hi = (1i64 << (dest_bits - 1)) - 1;
        (-hi - 1, hi)
    } else {
        (0, (1i64 << dest_bits) - 1)
    };
    value.clamp(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, NopReason, ScalarType};

    #[test]
    fn saturating_truncate_clamps_constants_c_style() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let ty = DataType::Scalar(ScalarType::I32);
        let dest_local = method.add_new_local(DataType::Scalar(ScalarType::I8), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        saturating_truncate(
            &mut walker,
            Value::int(1000, ty),
            8,
            true,
            Value::Local(dest_local, DataType::Scalar(ScalarType::I8)),
        );
        match walker.get() {
            Some(Instruction::Move { src: Value::Literal(Literal::Int(v), _), .. }) => assert_eq!(*v, 127),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn sign_extend_of_negative_byte_widens_correctly() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let ty = DataType::Scalar(ScalarType::I32);
        let dest_local = method.add_new_local(ty.clone(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        sign_extend(&mut walker, Value::int(0xFF, ty.clone()), 8, Value::Local(dest_local, ty));
        match walker.get() {
            Some(Instruction::Move { src: Value::Literal(Literal::Int(v), _), .. }) => assert_eq!(*v, -1),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
