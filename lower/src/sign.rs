//! Branch-free absolute value and conditional sign inversion via two's-complement.

use vc4c_ir::{Condition, Instruction, InstructionMeta, InstructionWalker, OpCode, Register, Value};

fn width_of(value: &Value) -> u8 {
    value.get_type().scalar_bit_width()
}

/// Emits `|x|`: sets flags from the sign bit, then conditionally negates.
///
/// `set_flags on (x >> (width-1))` then, under the negative predicate, `not` followed by
/// `+1`; otherwise the value passes through unchanged. Lowered here as a flags-setting
/// shift followed by a conditional invert, matching [`invert_sign`] with a fixed
/// `NegativeSet` condition.
pub fn make_positive(walker: &mut InstructionWalker, x: Value, dest: Value) {
    invert_sign_with_flags(walker, x, dest, true);
}

/// Emits a conditional negation of `x` gated on `condition`; `condition == Always` negates
/// unconditionally, `condition` computed from the caller's own flags otherwise.
pub fn invert_sign(walker: &mut InstructionWalker, x: Value, dest: Value, condition: Condition) {
    invert(walker, x, dest, condition, false);
}

fn invert_sign_with_flags(walker: &mut InstructionWalker, x: Value, dest: Value, derive_from_sign: bool) {
    invert(walker, x, dest, Condition::NegativeSet, derive_from_sign);
}

/// Builds the instruction sequence for a conditional negation without placing it, so a
/// composite lowering (e.g. signed multiply/divide) can splice it alongside other steps and
/// finalize everything with one `reset` at the end.
pub fn build_invert(walker: &mut InstructionWalker, x: Value, dest: Value, condition: Condition, derive_from_sign: bool) -> Vec<Instruction> {
    invert_sequence(walker, x, dest, condition, derive_from_sign)
}

fn invert(walker: &mut InstructionWalker, x: Value, dest: Value, condition: Condition, derive_from_sign: bool) {
    let seq = invert_sequence(walker, x, dest, condition, derive_from_sign);
    crate::seq::replace_with_sequence(walker, seq);
}

fn invert_sequence(walker: &mut InstructionWalker, x: Value, dest: Value, condition: Condition, derive_from_sign: bool) -> Vec<Instruction> {
    let mut seq = Vec::new();
    if derive_from_sign {
        let width = width_of(&x);
        let shift_amount = Value::uint(u64::from(width - 1), x.get_type().clone());
        let discard = Value::Register(Register::nop_register(), x.get_type().clone());
        seq.push(Instruction::Operation {
            op: OpCode::Asr,
            args: vec![x.clone(), shift_amount],
            dest: discard,
            meta: InstructionMeta {
                set_flags: true,
                ..InstructionMeta::default()
            },
        });
    }

    let negated = walker.new_local(x.get_type().clone(), "inv_sign");
    let negated_value = Value::Local(negated, x.get_type().clone());
    seq.push(Instruction::Operation {
        op: OpCode::Not,
        args: vec![x.clone()],
        dest: negated_value.clone(),
        meta: InstructionMeta::default(),
    });
    seq.push(Instruction::Operation {
        op: OpCode::Add,
        args: vec![negated_value.clone(), Value::int(1, x.get_type().clone())],
        dest: negated_value.clone(),
        meta: InstructionMeta {
            condition,
            ..InstructionMeta::default()
        },
    });
    // `condition == Always` has no hardware opposite ("never" isn't a condition code;
    // `Condition::invert()` maps `Always` back to itself), so skip the passthrough move
    // rather than have it unconditionally clobber the negation just written above.
    if !condition.is_always() {
        seq.push(Instruction::Move {
            src: x.clone(),
            dest: negated_value.clone(),
            meta: InstructionMeta {
                condition: condition.invert(),
                ..InstructionMeta::default()
            },
        });
    }
    seq.push(Instruction::Move {
        src: negated_value,
        dest,
        meta: InstructionMeta::default(),
    });
    seq
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, NopReason, ScalarType};

    fn apply_make_positive(x: i32) -> i32 {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let ty = DataType::Scalar(ScalarType::I32);
        let x_local = method.add_new_local(ty.clone(), "x");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        {
            let mut walker = InstructionWalker::at_block_start(&mut method, entry);
            walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
            make_positive(&mut walker, Value::Local(x_local, ty.clone()), Value::Local(dest_local, ty.clone()));
        }
        evaluate(&method, entry, x_local, dest_local, x)
    }

    /// Interprets the tiny generated program directly, treating unresolved locals as the
    /// caller-supplied input and ignoring flag-setting/nop bookkeeping instructions; good
    /// enough to check the arithmetic the lowering performs without a full interpreter.
    fn evaluate(method: &Method, block: usize, input_local: vc4c_ir::LocalId, dest_local: vc4c_ir::LocalId, input: i32) -> i32 {
        use std::collections::HashMap;
        let mut values: HashMap<vc4c_ir::LocalId, i32> = HashMap::new();
        values.insert(input_local, input);
        let negative = input < 0;
        for (_, ins) in method.block(block).iter() {
            if let Instruction::Operation { op, args, dest, meta } = ins {
                if let Value::Local(out, _) = dest {
                    let applies = match meta.condition {
                        Condition::Always => true,
                        Condition::NegativeSet => negative,
                        Condition::NegativeClear => !negative,
                        _ => true,
                    };
                    if !applies {
                        continue;
                    }
                    let resolve = |v: &Value| -> i32 {
                        match v {
                            Value::Local(id, _) => *values.get(id).unwrap_or(&0),
                            Value::Literal(lit, _) => lit.as_i64() as i32,
                            _ => 0,
                        }
                    };
                    let result = match op {
                        OpCode::Not => !resolve(&args[0]),
                        OpCode::Add => resolve(&args[0]).wrapping_add(resolve(&args[1])),
                        _ => *values.get(out).unwrap_or(&0),
                    };
                    values.insert(*out, result);
                }
            }
            if let Instruction::Move { src, dest, meta } = ins {
                let applies = match meta.condition {
                    Condition::Always => true,
                    Condition::NegativeSet => negative,
                    Condition::NegativeClear => !negative,
                    _ => true,
                };
                if !applies {
                    continue;
                }
                if let Value::Local(out, _) = dest {
                    let value = match src {
                        Value::Local(id, _) => *values.get(id).unwrap_or(&0),
                        Value::Literal(lit, _) => lit.as_i64() as i32,
                        _ => 0,
                    };
                    values.insert(*out, value);
                }
            }
        }
        *values.get(&dest_local).unwrap()
    }

    #[test]
    fn make_positive_matches_abs_for_sample_values() {
        for x in [-5, 0, 5, i32::MIN + 1, i32::MAX] {
            assert_eq!(apply_make_positive(x), x.wrapping_abs());
        }
    }

    fn apply_invert_sign(x: i32, condition: Condition) -> i32 {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let ty = DataType::Scalar(ScalarType::I32);
        let x_local = method.add_new_local(ty.clone(), "x");
        let dest_local = method.add_new_local(ty.clone(), "dest");
        {
            let mut walker = InstructionWalker::at_block_start(&mut method, entry);
            walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
            invert_sign(&mut walker, Value::Local(x_local, ty.clone()), Value::Local(dest_local, ty.clone()), condition);
        }
        evaluate(&method, entry, x_local, dest_local, x)
    }

    #[quickcheck_macros::quickcheck]
    fn make_positive_matches_abs(x: i32) -> bool {
        x == i32::MIN || apply_make_positive(x) == x.abs()
    }

    #[quickcheck_macros::quickcheck]
    fn invert_sign_always_negates(x: i32) -> bool {
        x == i32::MIN || apply_invert_sign(x, Condition::Always) == -x
    }

}
