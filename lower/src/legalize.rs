//! Generic arithmetic legalization: rewrites the abstract opcodes (`mul`, `udiv`, `fdiv`, …)
//! that only exist to let the front end emit simple IR into the sequences the hardware's
//! fixed ALU opcodes and SFU can actually execute.

use crate::seq::{emit_before, replace_with_sequence, with_placeholder};
use crate::sign::{build_invert, make_positive};
use vc4c_ir::{
    Condition, DataType, Decorations, Instruction, InstructionMeta, InstructionWalker, NopReason, OpCode, Register,
    ScalarType, SfuFunction, Value,
};

/// Empirical constant from the original design's reciprocal-division fit; chosen so the
/// resulting `factor`/`shift` pair stays within one ULP of the true quotient for all
/// dividends the word-width bound below allows.
const RECIPROCAL_K: f64 = 16100.0;

/// Rewrites one abstract `Operation` into concrete instructions, replacing whatever the
/// walker is positioned at. `decorations` carries the original instruction's decoration
/// bits (`FAST_MATH`, `ALLOW_RECIPROCAL`, `SATURATED_CONVERSION`) that some rewrites consult.
pub fn legalize_operation(
    walker: &mut InstructionWalker,
    op: OpCode,
    args: Vec<Value>,
    dest: Value,
    decorations: Decorations,
) -> Result<(), crate::error::CompilationError> {
    match op {
        OpCode::Mul => {
            lower_mul(walker, args[0].clone(), args[1].clone(), dest);
            Ok(())
        }
        OpCode::UDiv => {
            lower_udiv(walker, args[0].clone(), args[1].clone(), dest, false);
            Ok(())
        }
        OpCode::URem => {
            lower_udiv(walker, args[0].clone(), args[1].clone(), dest, true);
            Ok(())
        }
        OpCode::SDiv => {
            lower_sdiv(walker, args[0].clone(), args[1].clone(), dest, false);
            Ok(())
        }
        OpCode::SRem => {
            lower_sdiv(walker, args[0].clone(), args[1].clone(), dest, true);
            Ok(())
        }
        OpCode::FDiv => {
            lower_fdiv(walker, args[0].clone(), args[1].clone(), dest, decorations);
            Ok(())
        }
        OpCode::Trunc => {
            lower_trunc(walker, args[0].clone(), dest, decorations);
            Ok(())
        }
        OpCode::FpTrunc => {
            walker.reset(Instruction::Move { src: args[0].clone(), dest, meta: InstructionMeta::default() });
            Ok(())
        }
        OpCode::AShr => {
            walker.reset(Instruction::Operation { op: OpCode::Asr, args, dest, meta: InstructionMeta::default() });
            Ok(())
        }
        OpCode::LShr => {
            walker.reset(Instruction::Operation { op: OpCode::Shr, args, dest, meta: InstructionMeta::default() });
            Ok(())
        }
        OpCode::SiToFp => {
            lower_sitofp(walker, args[0].clone(), dest);
            Ok(())
        }
        OpCode::UiToFp => {
            lower_uitofp(walker, args[0].clone(), dest);
            Ok(())
        }
        OpCode::FpToSi => {
            lower_fptosi(walker, args[0].clone(), dest);
            Ok(())
        }
        OpCode::FpToUi => {
            lower_fptoui(walker, args[0].clone(), dest);
            Ok(())
        }
        OpCode::Sext => {
            let width = args[0].get_type().scalar_bit_width();
            crate::extend::sign_extend(walker, args[0].clone(), width, dest);
            Ok(())
        }
        OpCode::Zext => {
            let width = args[0].get_type().scalar_bit_width();
            crate::extend::zero_extend(walker, args[0].clone(), width, dest);
            Ok(())
        }
        other => Err(crate::error::CompilationError::optimizer(format!(
            "{} is not a generic opcode this pass knows how to legalize",
            other
        ))),
    }
}

fn fits_in_24_bits(value: &Value) -> bool {
    value.get_type().scalar_bit_width() <= 24
}

enum Half {
    Skip,
    Value(Value),
}

fn lo_half(seq: &mut Vec<Instruction>, walker: &mut InstructionWalker, value: &Value, ty: &vc4c_ir::DataType, tag: &str) -> Half {
    if let Some(lit) = value.as_literal() {
        let lo = lit.as_u64() & 0xFFFF;
        return if lo == 0 { Half::Skip } else { Half::Value(Value::uint(lo, ty.clone())) };
    }
    let local = walker.new_local(ty.clone(), tag);
    let local_value = Value::Local(local, ty.clone());
    seq.push(Instruction::Operation {
        op: OpCode::And,
        args: vec![value.clone(), Value::uint(0xFFFF, ty.clone())],
        dest: local_value.clone(),
        meta: InstructionMeta::default(),
    });
    Half::Value(local_value)
}

fn hi_half(seq: &mut Vec<Instruction>, walker: &mut InstructionWalker, value: &Value, ty: &vc4c_ir::DataType, tag: &str) -> Half {
    if let Some(lit) = value.as_literal() {
        let hi = (lit.as_u64() >> 16) & 0xFFFF;
        return if hi == 0 { Half::Skip } else { Half::Value(Value::uint(hi, ty.clone())) };
    }
    let local = walker.new_local(ty.clone(), tag);
    let local_value = Value::Local(local, ty.clone());
    seq.push(Instruction::Operation {
        op: OpCode::Shr,
        args: vec![value.clone(), Value::uint(16, ty.clone())],
        dest: local_value.clone(),
        meta: InstructionMeta::default(),
    });
    Half::Value(local_value)
}

/// `out = a_lo*b_lo + (a_lo*b_hi << 16) + (a_hi*b_lo << 16)`, dropping any partial product
/// whose literal half is known to be zero.
fn build_split_mul(walker: &mut InstructionWalker, a: Value, b: Value, dest: Value) -> Vec<Instruction> {
    let ty = dest.get_type().clone();
    let mut seq = Vec::new();
    let a_lo = lo_half(&mut seq, walker, &a, &ty, "mul_a_lo");
    let a_hi = hi_half(&mut seq, walker, &a, &ty, "mul_a_hi");
    let b_lo = lo_half(&mut seq, walker, &b, &ty, "mul_b_lo");
    let b_hi = hi_half(&mut seq, walker, &b, &ty, "mul_b_hi");

    let mut partials = Vec::new();
    if let (Half::Value(al), Half::Value(bl)) = (&a_lo, &b_lo) {
        let v = walker.new_local(ty.clone(), "mul_lo_lo");
        let v = Value::Local(v, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Mul24, args: vec![al.clone(), bl.clone()], dest: v.clone(), meta: InstructionMeta::default() });
        partials.push(v);
    }
    if let (Half::Value(al), Half::Value(bh)) = (&a_lo, &b_hi) {
        let prod = walker.new_local(ty.clone(), "mul_lo_hi");
        let prod = Value::Local(prod, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Mul24, args: vec![al.clone(), bh.clone()], dest: prod.clone(), meta: InstructionMeta::default() });
        let shifted = walker.new_local(ty.clone(), "mul_lo_hi_shl");
        let shifted = Value::Local(shifted, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Shl, args: vec![prod, Value::uint(16, ty.clone())], dest: shifted.clone(), meta: InstructionMeta::default() });
        partials.push(shifted);
    }
    if let (Half::Value(ah), Half::Value(bl)) = (&a_hi, &b_lo) {
        let prod = walker.new_local(ty.clone(), "mul_hi_lo");
        let prod = Value::Local(prod, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Mul24, args: vec![ah.clone(), bl.clone()], dest: prod.clone(), meta: InstructionMeta::default() });
        let shifted = walker.new_local(ty.clone(), "mul_hi_lo_shl");
        let shifted = Value::Local(shifted, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Shl, args: vec![prod, Value::uint(16, ty.clone())], dest: shifted.clone(), meta: InstructionMeta::default() });
        partials.push(shifted);
    }

    if partials.is_empty() {
        seq.push(Instruction::Move { src: Value::uint(0, ty.clone()), dest, meta: InstructionMeta::default() });
        return seq;
    }

    let mut acc = partials[0].clone();
    for term in &partials[1..] {
        let sum = walker.new_local(ty.clone(), "mul_sum");
        let sum = Value::Local(sum, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Add, args: vec![acc, term.clone()], dest: sum.clone(), meta: InstructionMeta::default() });
        acc = sum;
    }
    seq.push(Instruction::Move { src: acc, dest, meta: InstructionMeta::default() });
    seq
}

fn lower_mul(walker: &mut InstructionWalker, a: Value, b: Value, dest: Value) {
    if let (Some(la), Some(lb)) = (a.as_literal(), b.as_literal()) {
        let folded = OpCode::Mul.precalculate(&[la, lb]).expect("two literals always fold");
        walker.reset(Instruction::Move { src: Value::Literal(folded, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    if let Some(shift) = a.as_literal().and_then(|l| l.is_power_of_two()) {
        walker.reset(Instruction::Operation { op: OpCode::Shl, args: vec![b, Value::uint(u64::from(shift), dest.get_type().clone())], dest, meta: InstructionMeta::default() });
        return;
    }
    if let Some(shift) = b.as_literal().and_then(|l| l.is_power_of_two()) {
        walker.reset(Instruction::Operation { op: OpCode::Shl, args: vec![a, Value::uint(u64::from(shift), dest.get_type().clone())], dest, meta: InstructionMeta::default() });
        return;
    }
    if fits_in_24_bits(&a) && fits_in_24_bits(&b) {
        walker.reset(Instruction::Operation { op: OpCode::Mul24, args: vec![a, b], dest, meta: InstructionMeta::default() });
        return;
    }
    let signed = dest.get_type().element_scalar().map(|s| s.is_signed).unwrap_or(false);
    if signed {
        lower_signed_mul(walker, a, b, dest);
    } else {
        let seq = build_split_mul(walker, a, b, dest);
        replace_with_sequence(walker, seq);
    }
}

fn lower_signed_mul(walker: &mut InstructionWalker, a: Value, b: Value, dest: Value) {
    let ty = dest.get_type().clone();

    let abs_a = walker.new_local(ty.clone(), "mul_abs_a");
    let abs_a_value = Value::Local(abs_a, ty.clone());
    with_placeholder(walker, |w| make_positive(w, a.clone(), abs_a_value.clone()));

    let abs_b = walker.new_local(ty.clone(), "mul_abs_b");
    let abs_b_value = Value::Local(abs_b, ty.clone());
    with_placeholder(walker, |w| make_positive(w, b.clone(), abs_b_value.clone()));

    let unsigned_result = walker.new_local(ty.clone(), "mul_unsigned");
    let unsigned_result_value = Value::Local(unsigned_result, ty.clone());
    let unsigned_seq = build_split_mul(walker, abs_a_value, abs_b_value, unsigned_result_value.clone());
    emit_before(walker, unsigned_seq);

    let shift = Value::uint(u64::from(ty.scalar_bit_width() - 1), ty.clone());
    let sign_a = walker.new_local(ty.clone(), "mul_sign_a");
    let sign_a_value = Value::Local(sign_a, ty.clone());
    emit_before(walker, vec![Instruction::Operation { op: OpCode::Asr, args: vec![a, shift.clone()], dest: sign_a_value.clone(), meta: InstructionMeta::default() }]);
    let sign_b = walker.new_local(ty.clone(), "mul_sign_b");
    let sign_b_value = Value::Local(sign_b, ty.clone());
    emit_before(walker, vec![Instruction::Operation { op: OpCode::Asr, args: vec![b, shift], dest: sign_b_value.clone(), meta: InstructionMeta::default() }]);
    let discard = Value::Register(Register::nop_register(), ty.clone());
    emit_before(walker, vec![Instruction::Operation {
        op: OpCode::Xor,
        args: vec![sign_a_value, sign_b_value],
        dest: discard,
        meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
    }]);

    let invert_seq = build_invert(walker, unsigned_result_value, dest, Condition::ZeroClear, false);
    replace_with_sequence(walker, invert_seq);
}

fn lower_udiv(walker: &mut InstructionWalker, n: Value, d: Value, dest: Value, want_remainder: bool) {
    let ty = dest.get_type().clone();
    if let (Some(ln), Some(ld)) = (n.as_literal(), d.as_literal()) {
        let (nn, dd) = (ln.as_u64(), ld.as_u64());
        let value = if dd == 0 { 0 } else if want_remainder { nn % dd } else { nn / dd };
        walker.reset(Instruction::Move { src: Value::uint(value, ty), dest, meta: InstructionMeta::default() });
        return;
    }
    if let Some(ld) = d.as_literal() {
        if let Some(shift) = ld.is_power_of_two() {
            if want_remainder {
                let mask = Value::uint(ld.as_u64() - 1, ty.clone());
                walker.reset(Instruction::Operation { op: OpCode::And, args: vec![n, mask], dest, meta: InstructionMeta::default() });
            } else {
                let shift_value = Value::uint(u64::from(shift), ty.clone());
                walker.reset(Instruction::Operation { op: OpCode::Shr, args: vec![n, shift_value], dest, meta: InstructionMeta::default() });
            }
            return;
        }
        if ty.scalar_bit_width() <= 16 {
            let seq = build_reciprocal_division(walker, n, ld.as_u64(), dest, want_remainder);
            replace_with_sequence(walker, seq);
            return;
        }
    }
    let seq = build_restoring_division(walker, n, d, dest, want_remainder);
    replace_with_sequence(walker, seq);
}

/// `q = (n * factor) >> shift` with the one-ULP correction, for a compile-time divisor
/// small enough (dividend width <= 16) that the fixed `K` keeps the error bounded.
fn build_reciprocal_division(walker: &mut InstructionWalker, n: Value, d: u64, dest: Value, want_remainder: bool) -> Vec<Instruction> {
    // `n * factor` needs the full 32 bits (a 16-bit dividend times a ~17-bit factor); carry
    // every intermediate in a 32-bit local so it isn't truncated before the final `>> shift`
    // narrows it back down to something that always fits the destination width.
    let wide_ty = DataType::Scalar(ScalarType::U32);
    let shift = (d as f64 * RECIPROCAL_K).log2().ceil() as u32;
    let factor = (2f64.powi(shift as i32) / d as f64).round() as u64;
    let mut seq = Vec::new();

    let prod = walker.new_local(wide_ty.clone(), "div_recip_prod");
    let prod_value = Value::Local(prod, wide_ty.clone());
    seq.push(Instruction::Operation { op: OpCode::Mul24, args: vec![n.clone(), Value::uint(factor, wide_ty.clone())], dest: prod_value.clone(), meta: InstructionMeta::default() });

    let q0 = walker.new_local(wide_ty.clone(), "div_recip_q0");
    let q0_value = Value::Local(q0, wide_ty.clone());
    seq.push(Instruction::Operation { op: OpCode::Shr, args: vec![prod_value, Value::uint(u64::from(shift), wide_ty.clone())], dest: q0_value.clone(), meta: InstructionMeta::default() });

    let qd = walker.new_local(wide_ty.clone(), "div_recip_qd");
    let qd_value = Value::Local(qd, wide_ty.clone());
    seq.push(Instruction::Operation { op: OpCode::Mul24, args: vec![q0_value.clone(), Value::uint(d, wide_ty.clone())], dest: qd_value.clone(), meta: InstructionMeta::default() });

    let r0 = walker.new_local(wide_ty.clone(), "div_recip_r0");
    let r0_value = Value::Local(r0, wide_ty.clone());
    seq.push(Instruction::Operation { op: OpCode::Sub, args: vec![n, qd_value], dest: r0_value.clone(), meta: InstructionMeta::default() });

    let cmp_discard = Value::Register(Register::nop_register(), wide_ty.clone());
    seq.push(Instruction::Operation {
        op: OpCode::Sub,
        args: vec![r0_value.clone(), Value::uint(d, wide_ty.clone())],
        dest: cmp_discard,
        meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
    });

    if want_remainder {
        let rem = walker.new_local(wide_ty.clone(), "div_recip_rem");
        let rem_value = Value::Local(rem, wide_ty.clone());
        seq.push(Instruction::Move { src: r0_value.clone(), dest: rem_value.clone(), meta: InstructionMeta::default() });
        seq.push(Instruction::Operation {
            op: OpCode::Sub,
            args: vec![r0_value, Value::uint(d, wide_ty.clone())],
            dest: rem_value.clone(),
            meta: InstructionMeta { condition: Condition::NegativeClear, ..InstructionMeta::default() },
        });
        seq.push(Instruction::Move { src: rem_value, dest, meta: InstructionMeta::default() });
    } else {
        let q_final = walker.new_local(wide_ty.clone(), "div_recip_q");
        let q_final_value = Value::Local(q_final, wide_ty.clone());
        seq.push(Instruction::Move { src: q0_value.clone(), dest: q_final_value.clone(), meta: InstructionMeta::default() });
        seq.push(Instruction::Operation {
            op: OpCode::Add,
            args: vec![q0_value, Value::uint(1, wide_ty.clone())],
            dest: q_final_value.clone(),
            meta: InstructionMeta { condition: Condition::NegativeClear, ..InstructionMeta::default() },
        });
        seq.push(Instruction::Move { src: q_final_value, dest, meta: InstructionMeta::default() });
    }
    seq
}

/// Iterative restoring division, unrolled over every bit of the operand width: the
/// fallback when the divisor isn't a compile-time constant (or the dividend is too wide
/// for the reciprocal approximation above to stay within one ULP).
fn build_restoring_division(walker: &mut InstructionWalker, n: Value, d: Value, dest: Value, want_remainder: bool) -> Vec<Instruction> {
    let ty = dest.get_type().clone();
    let width = ty.scalar_bit_width();
    let mut seq = Vec::new();

    let remainder = walker.new_local(ty.clone(), "div_rem");
    let mut remainder_value = Value::Local(remainder, ty.clone());
    seq.push(Instruction::Move { src: Value::uint(0, ty.clone()), dest: remainder_value.clone(), meta: InstructionMeta::default() });

    let quotient = walker.new_local(ty.clone(), "div_quot");
    let mut quotient_value = Value::Local(quotient, ty.clone());
    seq.push(Instruction::Move { src: Value::uint(0, ty.clone()), dest: quotient_value.clone(), meta: InstructionMeta::default() });

    for i in (0..width).rev() {
        let shifted = walker.new_local(ty.clone(), "div_step_shifted");
        let shifted_value = Value::Local(shifted, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Shl, args: vec![remainder_value.clone(), Value::uint(1, ty.clone())], dest: shifted_value.clone(), meta: InstructionMeta::default() });

        let bit = walker.new_local(ty.clone(), "div_step_bit");
        let bit_value = Value::Local(bit, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Shr, args: vec![n.clone(), Value::uint(u64::from(i), ty.clone())], dest: bit_value.clone(), meta: InstructionMeta::default() });
        seq.push(Instruction::Operation { op: OpCode::And, args: vec![bit_value.clone(), Value::uint(1, ty.clone())], dest: bit_value.clone(), meta: InstructionMeta::default() });

        let candidate = walker.new_local(ty.clone(), "div_step_rem");
        let candidate_value = Value::Local(candidate, ty.clone());
        seq.push(Instruction::Operation { op: OpCode::Or, args: vec![shifted_value, bit_value], dest: candidate_value.clone(), meta: InstructionMeta::default() });

        let cmp_discard = Value::Register(Register::nop_register(), ty.clone());
        seq.push(Instruction::Operation {
            op: OpCode::Sub,
            args: vec![candidate_value.clone(), d.clone()],
            dest: cmp_discard,
            meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
        });

        let next_remainder = walker.new_local(ty.clone(), "div_step_rem_next");
        let next_remainder_value = Value::Local(next_remainder, ty.clone());
        seq.push(Instruction::Move { src: candidate_value.clone(), dest: next_remainder_value.clone(), meta: InstructionMeta::default() });
        seq.push(Instruction::Operation {
            op: OpCode::Sub,
            args: vec![candidate_value, d.clone()],
            dest: next_remainder_value.clone(),
            meta: InstructionMeta { condition: Condition::NegativeClear, ..InstructionMeta::default() },
        });

        let next_quotient = walker.new_local(ty.clone(), "div_step_quot_next");
        let next_quotient_value = Value::Local(next_quotient, ty.clone());
        seq.push(Instruction::Move { src: quotient_value.clone(), dest: next_quotient_value.clone(), meta: InstructionMeta::default() });
        seq.push(Instruction::Operation {
            op: OpCode::Or,
            args: vec![quotient_value, Value::uint(1u64 << i, ty.clone())],
            dest: next_quotient_value.clone(),
            meta: InstructionMeta { condition: Condition::NegativeClear, ..InstructionMeta::default() },
        });

        remainder_value = next_remainder_value;
        quotient_value = next_quotient_value;
    }

    let result = if want_remainder { remainder_value } else { quotient_value };
    seq.push(Instruction::Move { src: result, dest, meta: InstructionMeta::default() });
    seq
}

fn lower_sdiv(walker: &mut InstructionWalker, n: Value, d: Value, dest: Value, want_remainder: bool) {
    let ty = dest.get_type().clone();
    if let (Some(ln), Some(ld)) = (n.as_literal(), d.as_literal()) {
        let (nn, dd) = (ln.as_i64(), ld.as_i64());
        let value = if dd == 0 { 0 } else if want_remainder { nn % dd } else { nn / dd };
        walker.reset(Instruction::Move { src: Value::int(value, ty), dest, meta: InstructionMeta::default() });
        return;
    }

    let abs_n = walker.new_local(ty.clone(), "sdiv_abs_n");
    let abs_n_value = Value::Local(abs_n, ty.clone());
    with_placeholder(walker, |w| make_positive(w, n.clone(), abs_n_value.clone()));

    let abs_d = walker.new_local(ty.clone(), "sdiv_abs_d");
    let abs_d_value = Value::Local(abs_d, ty.clone());
    with_placeholder(walker, |w| make_positive(w, d.clone(), abs_d_value.clone()));

    let unsigned_result = walker.new_local(ty.clone(), "sdiv_unsigned");
    let unsigned_result_value = Value::Local(unsigned_result, ty.clone());
    with_placeholder(walker, |w| lower_udiv(w, abs_n_value, abs_d_value, unsigned_result_value.clone(), want_remainder));

    let shift = Value::uint(u64::from(ty.scalar_bit_width() - 1), ty.clone());
    if want_remainder {
        // The sign of a remainder follows the dividend's sign in C/OpenCL semantics.
        let discard = Value::Register(Register::nop_register(), ty.clone());
        emit_before(walker, vec![Instruction::Operation {
            op: OpCode::Asr,
            args: vec![n, shift],
            dest: discard,
            meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
        }]);
        let seq = build_invert(walker, unsigned_result_value, dest, Condition::NegativeSet, false);
        replace_with_sequence(walker, seq);
    } else {
        let sign_n = walker.new_local(ty.clone(), "sdiv_sign_n");
        let sign_n_value = Value::Local(sign_n, ty.clone());
        emit_before(walker, vec![Instruction::Operation { op: OpCode::Asr, args: vec![n, shift.clone()], dest: sign_n_value.clone(), meta: InstructionMeta::default() }]);
        let sign_d = walker.new_local(ty.clone(), "sdiv_sign_d");
        let sign_d_value = Value::Local(sign_d, ty.clone());
        emit_before(walker, vec![Instruction::Operation { op: OpCode::Asr, args: vec![d, shift], dest: sign_d_value.clone(), meta: InstructionMeta::default() }]);
        let discard = Value::Register(Register::nop_register(), ty.clone());
        emit_before(walker, vec![Instruction::Operation {
            op: OpCode::Xor,
            args: vec![sign_n_value, sign_d_value],
            dest: discard,
            meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
        }]);
        let seq = build_invert(walker, unsigned_result_value, dest, Condition::ZeroClear, false);
        replace_with_sequence(walker, seq);
    }
}

fn build_sfu_call(sfu: SfuFunction, arg: Value, dest: Value) -> Vec<Instruction> {
    let ty = dest.get_type().clone();
    vec![
        Instruction::Move { src: arg, dest: Value::Register(Register::sfu_input(sfu), ty.clone()), meta: InstructionMeta::default() },
        Instruction::Nop(NopReason::WaitSfu),
        Instruction::Nop(NopReason::WaitSfu),
        Instruction::Move { src: Value::Register(Register::sfu_output(), ty), dest, meta: InstructionMeta::default() },
    ]
}

fn lower_fdiv(walker: &mut InstructionWalker, n: Value, d: Value, dest: Value, decorations: Decorations) {
    let ty = dest.get_type().clone();
    if let (Some(ln), Some(ld)) = (n.as_literal(), d.as_literal()) {
        let value = if ld.as_f64() == 0.0 { 0.0 } else { ln.as_f64() / ld.as_f64() };
        walker.reset(Instruction::Move { src: Value::real(value, ty), dest, meta: InstructionMeta::default() });
        return;
    }
    if let Some(ld) = d.as_literal() {
        let recip = 1.0 / ld.as_f64();
        walker.reset(Instruction::Operation { op: OpCode::FMul, args: vec![n, Value::real(recip, ty.clone())], dest, meta: InstructionMeta::default() });
        return;
    }

    let estimate = walker.new_local(ty.clone(), "fdiv_recip");
    let estimate_value = Value::Local(estimate, ty.clone());

    if decorations.contains(Decorations::ALLOW_RECIPROCAL) || decorations.contains(Decorations::FAST_MATH) {
        emit_before(walker, build_sfu_call(SfuFunction::Reciprocal, d, estimate_value.clone()));
        walker.reset(Instruction::Operation { op: OpCode::FMul, args: vec![n, estimate_value], dest, meta: InstructionMeta::default() });
        return;
    }

    emit_before(walker, build_sfu_call(SfuFunction::Reciprocal, d.clone(), estimate_value.clone()));

    let mut current = estimate_value;
    for _ in 0..5 {
        let dp = walker.new_local(ty.clone(), "fdiv_dp");
        let dp_value = Value::Local(dp, ty.clone());
        emit_before(walker, vec![Instruction::Operation { op: OpCode::FMul, args: vec![d.clone(), current.clone()], dest: dp_value.clone(), meta: InstructionMeta::default() }]);
        let corr = walker.new_local(ty.clone(), "fdiv_corr");
        let corr_value = Value::Local(corr, ty.clone());
        emit_before(walker, vec![Instruction::Operation { op: OpCode::FSub, args: vec![Value::real(2.0, ty.clone()), dp_value], dest: corr_value.clone(), meta: InstructionMeta::default() }]);
        let next = walker.new_local(ty.clone(), "fdiv_next");
        let next_value = Value::Local(next, ty.clone());
        emit_before(walker, vec![Instruction::Operation { op: OpCode::FMul, args: vec![current, corr_value], dest: next_value.clone(), meta: InstructionMeta::default() }]);
        current = next_value;
    }

    walker.reset(Instruction::Operation { op: OpCode::FMul, args: vec![n, current], dest, meta: InstructionMeta::default() });
}

fn lower_trunc(walker: &mut InstructionWalker, src: Value, dest: Value, decorations: Decorations) {
    let dest_bits = dest.get_type().scalar_bit_width();
    let src_bits = src.get_type().scalar_bit_width();
    if src_bits == 64 && dest_bits == 32 {
        walker.reset(Instruction::Move { src, dest, meta: InstructionMeta::default() });
        return;
    }
    if decorations.contains(Decorations::SATURATED_CONVERSION) {
        let dest_signed = dest.get_type().element_scalar().map(|s| s.is_signed).unwrap_or(true);
        crate::extend::saturating_truncate(walker, src, dest_bits, dest_signed, dest);
        return;
    }
    let mask = if dest_bits >= 64 { u64::MAX } else { (1u64 << dest_bits) - 1 };
    if let Some(lit) = src.as_literal() {
        walker.reset(Instruction::Move { src: Value::uint(lit.as_u64() & mask, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    walker.reset(Instruction::Operation {
        op: OpCode::And,
        args: vec![src.clone(), Value::uint(mask, src.get_type().clone())],
        dest,
        meta: InstructionMeta::default(),
    });
}

fn lower_sitofp(walker: &mut InstructionWalker, src: Value, dest: Value) {
    if let Some(lit) = src.as_literal() {
        walker.reset(Instruction::Move { src: Value::real(lit.as_i64() as f64, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    walker.reset(Instruction::Operation { op: OpCode::Itof, args: vec![src], dest, meta: InstructionMeta::default() });
}

/// `itof` misreads a value with the MSB set as negative; restores the fix-up the original
/// design left commented out: conditionally add `2^31` when the source's sign bit is set.
fn lower_uitofp(walker: &mut InstructionWalker, src: Value, dest: Value) {
    if let Some(lit) = src.as_literal() {
        walker.reset(Instruction::Move { src: Value::real(lit.as_u64() as f64, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    let ty = dest.get_type().clone();
    let base = walker.new_local(ty.clone(), "uitofp_base");
    let base_value = Value::Local(base, ty.clone());
    emit_before(walker, vec![Instruction::Operation { op: OpCode::Itof, args: vec![src.clone()], dest: base_value.clone(), meta: InstructionMeta::default() }]);

    let discard = Value::Register(Register::nop_register(), ty.clone());
    emit_before(walker, vec![Instruction::Operation {
        op: OpCode::Asr,
        args: vec![src, Value::uint(31, ty.clone())],
        dest: discard,
        meta: InstructionMeta { set_flags: true, ..InstructionMeta::default() },
    }]);

    let corrected = walker.new_local(ty.clone(), "uitofp_corrected");
    let corrected_value = Value::Local(corrected, ty.clone());
    emit_before(walker, vec![Instruction::Move { src: base_value.clone(), dest: corrected_value.clone(), meta: InstructionMeta::default() }]);
    emit_before(walker, vec![Instruction::Operation {
        op: OpCode::FAdd,
        args: vec![base_value, Value::real(2f64.powi(31), ty.clone())],
        dest: corrected_value.clone(),
        meta: InstructionMeta { condition: Condition::NegativeSet, ..InstructionMeta::default() },
    }]);
    walker.reset(Instruction::Move { src: corrected_value, dest, meta: InstructionMeta::default() });
}

fn lower_fptosi(walker: &mut InstructionWalker, src: Value, dest: Value) {
    if let Some(lit) = src.as_literal() {
        walker.reset(Instruction::Move { src: Value::int(lit.as_f64() as i64, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    walker.reset(Instruction::Operation { op: OpCode::Ftoi, args: vec![src], dest, meta: InstructionMeta::default() });
}

fn lower_fptoui(walker: &mut InstructionWalker, src: Value, dest: Value) {
    if let Some(lit) = src.as_literal() {
        walker.reset(Instruction::Move { src: Value::uint(lit.as_f64() as u64, dest.get_type().clone()), dest, meta: InstructionMeta::default() });
        return;
    }
    walker.reset(Instruction::Operation {
        op: OpCode::Ftoi,
        args: vec![src],
        dest,
        meta: InstructionMeta { decorations: Decorations::UNSIGNED_RESULT, ..InstructionMeta::default() },
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, ScalarType};

    fn i32_ty() -> DataType {
        DataType::Scalar(ScalarType::I32)
    }

    fn i16_ty() -> DataType {
        DataType::Scalar(ScalarType::I16)
    }

    #[test]
    fn mul_of_literals_folds() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let dest_local = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        lower_mul(&mut walker, Value::int(6, i32_ty()), Value::int(7, i32_ty()), Value::Local(dest_local, i32_ty()));
        match walker.get() {
            Some(Instruction::Move { src: Value::Literal(lit, _), .. }) => assert_eq!(lit.as_i64(), 42),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn udiv_by_power_of_two_becomes_shift() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let n_local = method.add_new_local(i32_ty(), "n");
        let dest_local = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        lower_udiv(&mut walker, Value::Local(n_local, i32_ty()), Value::int(8, i32_ty()), Value::Local(dest_local, i32_ty()), false);
        assert!(matches!(walker.get(), Some(Instruction::Operation { op: OpCode::Shr, .. })));
    }

    /// Checks the constant-reciprocal division sequence against `/`/`%` by interpreting the
    /// generated program directly (conditions resolved from the flag-setting `Sub` beside
    /// each conditional write, same style as `sign::tests::evaluate`).
    fn run_reciprocal_division(n: u64, d: u64, want_remainder: bool) -> u64 {
        let ty = i16_ty();
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let n_local = method.add_new_local(ty.clone(), "n");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        {
            let mut walker = InstructionWalker::at_block_start(&mut method, entry);
            walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
            let seq = build_reciprocal_division(&mut walker, Value::Local(n_local, ty.clone()), d, Value::Local(dest_local, ty.clone()), want_remainder);
            replace_with_sequence(&mut walker, seq);
        }
        interpret(&method, entry, n_local, n, dest_local)
    }

    fn interpret(method: &Method, block: usize, input_local: vc4c_ir::LocalId, input: u64, dest_local: vc4c_ir::LocalId) -> u64 {
        let mut values = std::collections::HashMap::new();
        values.insert(input_local, input);
        interpret_from(method, block, values, dest_local)
    }

    fn interpret_from(
        method: &Method,
        block: usize,
        mut values: std::collections::HashMap<vc4c_ir::LocalId, u64>,
        dest_local: vc4c_ir::LocalId,
    ) -> u64 {
        use std::collections::HashMap;
        let mut last_negative = false;
        let resolve = |values: &HashMap<vc4c_ir::LocalId, u64>, v: &Value| -> u64 {
            match v {
                Value::Local(id, _) => *values.get(id).unwrap_or(&0),
                Value::Literal(lit, _) => lit.as_u64(),
                _ => 0,
            }
        };
        for (_, ins) in method.block(block).iter() {
            match ins {
                Instruction::Operation { op, args, dest, meta } => {
                    // Flags from a `set_flags` compare must update `last_negative` even when
                    // the result itself is discarded into a register (the usual "compare and
                    // throw away the difference" idiom) - only the *value* write below is
                    // conditional on the destination being a local.
                    let applies = match meta.condition {
                        Condition::Always => true,
                        Condition::NegativeSet => last_negative,
                        Condition::NegativeClear => !last_negative,
                        _ => true,
                    };
                    if !applies {
                        continue;
                    }
                    let width = u32::from(dest.get_type().scalar_bit_width());
                    let mask = if width >= 64 { u64::MAX } else { (1u64 << width) - 1 };
                    let a = resolve(&values, &args[0]);
                    let b = args.get(1).map(|v| resolve(&values, v)).unwrap_or(0);
                    let result = match op {
                        OpCode::Mul24 => a.wrapping_mul(b) & mask,
                        OpCode::Shr => ((a as u32).wrapping_shr(b as u32)) as u64,
                        OpCode::Shl => (a.wrapping_shl(b as u32)) & mask,
                        OpCode::Sub => {
                            let diff = (a as i64).wrapping_sub(b as i64);
                            if meta.set_flags {
                                last_negative = diff < 0;
                            }
                            (diff as u64) & mask
                        }
                        OpCode::Add => a.wrapping_add(b) & mask,
                        OpCode::And => a & b & mask,
                        OpCode::Or => (a | b) & mask,
                        _ => 0,
                    };
                    if let Value::Local(out, _) = dest {
                        values.insert(*out, result);
                    }
                }
                Instruction::Move { src, dest, meta } => {
                    let applies = match meta.condition {
                        Condition::Always => true,
                        Condition::NegativeSet => last_negative,
                        Condition::NegativeClear => !last_negative,
                        _ => true,
                    };
                    if !applies {
                        continue;
                    }
                    if let Value::Local(out, _) = dest {
                        values.insert(*out, resolve(&values, src));
                    }
                }
                _ => {}
            }
        }
        *values.get(&dest_local).unwrap()
    }

    #[quickcheck_macros::quickcheck]
    fn reciprocal_division_matches_hardware_division(n: u16, d: std::num::NonZeroU16) -> bool {
        let d = u64::from(d.get());
        let n = u64::from(n);
        run_reciprocal_division(n, d, false) == n / d
    }

    #[quickcheck_macros::quickcheck]
    fn reciprocal_remainder_matches_hardware_modulo(n: u16, d: std::num::NonZeroU16) -> bool {
        let d = u64::from(d.get());
        let n = u64::from(n);
        run_reciprocal_division(n, d, true) == n % d
    }

    fn run_restoring_division(n: u64, d: u64, want_remainder: bool) -> u64 {
        let ty = i16_ty();
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let n_local = method.add_new_local(ty.clone(), "n");
        let d_local = method.add_new_local(ty.clone(), "d");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        {
            let mut walker = InstructionWalker::at_block_start(&mut method, entry);
            walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
            let seq = build_restoring_division(
                &mut walker,
                Value::Local(n_local, ty.clone()),
                Value::Local(d_local, ty.clone()),
                Value::Local(dest_local, ty.clone()),
                want_remainder,
            );
            replace_with_sequence(&mut walker, seq);
        }
        let mut values = std::collections::HashMap::new();
        values.insert(d_local, d);
        interpret_with(&method, entry, values, n_local, n, dest_local)
    }

    /// Same evaluator as [`interpret`], but seeded with extra locals (here, the divisor)
    /// that the generated program reads but never writes.
    fn interpret_with(
        method: &Method,
        block: usize,
        mut seed: std::collections::HashMap<vc4c_ir::LocalId, u64>,
        input_local: vc4c_ir::LocalId,
        input: u64,
        dest_local: vc4c_ir::LocalId,
    ) -> u64 {
        seed.insert(input_local, input);
        interpret_from(method, block, seed, dest_local)
    }

    #[quickcheck_macros::quickcheck]
    fn restoring_division_matches_hardware_quotient(n: u16, d: std::num::NonZeroU16) -> bool {
        run_restoring_division(u64::from(n), u64::from(d.get()), false) == u64::from(n) / u64::from(d.get())
    }

    #[quickcheck_macros::quickcheck]
    fn restoring_division_satisfies_division_identity(n: u16, d: std::num::NonZeroU16) -> bool {
        let n = u64::from(n);
        let d = u64::from(d.get());
        let q = run_restoring_division(n, d, false);
        let r = run_restoring_division(n, d, true);
        q * d + r == n && r < d
    }

    #[quickcheck_macros::quickcheck]
    fn mul24_square_matches_hardware_multiplication(x: u16) -> bool {
        // Both operands are 16 bits wide, well inside the 24-bit `Mul24` fast path
        // (`fits_in_24_bits` checks the static type's width, not the runtime value), so this
        // actually exercises `Mul24` rather than falling through to the split-multiply path.
        let ty = i16_ty();
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let x_local = method.add_new_local(ty.clone(), "x");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        {
            let mut walker = InstructionWalker::at_block_start(&mut method, entry);
            walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
            lower_mul(&mut walker, Value::Local(x_local, ty.clone()), Value::Local(x_local, ty.clone()), Value::Local(dest_local, ty.clone()));
        }
        let x64 = u64::from(x);
        interpret(&method, entry, x_local, x64, dest_local) == (x64 * x64) & 0xFFFF
    }
}
