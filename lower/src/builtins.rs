//! Work-item builtins (`get_global_id`, …) and the named-builtin dispatch tables
//! (mutex/semaphore, element/QPU number, single/SFU/two-arg ALU intrinsics, DMA access,
//! type-cast intrinsics). Each resolves one `MethodCall` into concrete instructions.

use crate::error::CompilationError;
use crate::sign::{invert_sign, make_positive};
use vc4c_ir::{
    Condition, Decorations, Instruction, InstructionMeta, InstructionWalker, NopReason, OpCode, PackMode, Register,
    SfuFunction, UnpackMode, Value,
};

/// Names of the UNIFORM-backed locals the runtime populates before kernel dispatch.
pub const WORK_DIM: &str = "%work_dim";
pub const NUM_GROUPS: [&str; 3] = ["%num_groups_x", "%num_groups_y", "%num_groups_z"];
pub const GROUP_ID: [&str; 3] = ["%group_id_x", "%group_id_y", "%group_id_z"];
pub const GLOBAL_OFFSET: [&str; 3] = ["%global_offset_x", "%global_offset_y", "%global_offset_z"];
pub const LOCAL_SIZES: &str = "%local_sizes";
pub const LOCAL_IDS: &str = "%local_ids";

fn literal_dim(args: &[Value]) -> Option<u8> {
    args.first().and_then(Value::as_literal).map(|l| l.as_i64() as u8)
}

fn find_well_known(walker: &InstructionWalker, name: &str) -> Option<Value> {
    walker
        .method()
        .find_local_by_name(name)
        .map(|id| Value::Local(id, walker.method().local(id).unwrap().ty.clone()))
}

/// Extracts one packed byte (`(info >> (dim*8)) & 0xFF`) from a three-lanes-in-one-word
/// UNIFORM, for a literal `dim`.
fn packed_literal_lane(walker: &mut InstructionWalker, packed_name: &str, dim: u8, dest: Value, decoration: Decorations) {
    let packed = find_well_known(walker, packed_name).expect("runtime-populated local must exist");
    let shift = Value::uint(u64::from(dim) * 8, dest.get_type().clone());
    let shifted = walker.new_local(dest.get_type().clone(), "builtin_shift");
    let shifted_value = Value::Local(shifted, dest.get_type().clone());
    crate::seq::emit_before(
        walker,
        vec![Instruction::Operation {
            op: OpCode::Shr,
            args: vec![packed, shift],
            dest: shifted_value.clone(),
            meta: InstructionMeta::default(),
        }],
    );
    walker.reset(Instruction::Operation {
        op: OpCode::And,
        args: vec![shifted_value, Value::uint(0xFF, dest.get_type().clone())],
        dest,
        meta: InstructionMeta {
            decorations: decoration,
            ..InstructionMeta::default()
        },
    });
}

/// Extracts one packed byte for a runtime `dim`, via a three-way decision tree gated on
/// `dim xor {0,1,2}`.
fn packed_dynamic_lane(walker: &mut InstructionWalker, packed_name: &str, dim: Value, dest: Value, decoration: Decorations) {
    let packed = find_well_known(walker, packed_name).expect("runtime-populated local must exist");
    let ty = dest.get_type().clone();
    for candidate in 0u8..3 {
        let discard = Value::Register(Register::nop_register(), ty.clone());
        crate::seq::emit_before(
            walker,
            vec![Instruction::Operation {
                op: OpCode::Xor,
                args: vec![dim.clone(), Value::uint(u64::from(candidate), ty.clone())],
                dest: discard,
                meta: InstructionMeta {
                    set_flags: true,
                    ..InstructionMeta::default()
                },
            }],
        );
        let shift = Value::uint(u64::from(candidate) * 8, ty.clone());
        let shifted = walker.new_local(ty.clone(), "builtin_shift");
        let shifted_value = Value::Local(shifted, ty.clone());
        crate::seq::emit_before(
            walker,
            vec![Instruction::Operation {
                op: OpCode::Shr,
                args: vec![packed.clone(), shift],
                dest: shifted_value.clone(),
                meta: InstructionMeta {
                    condition: Condition::ZeroSet,
                    ..InstructionMeta::default()
                },
            }],
        );
        crate::seq::emit_before(
            walker,
            vec![Instruction::Operation {
                op: OpCode::And,
                args: vec![shifted_value, Value::uint(0xFF, ty.clone())],
                dest: dest.clone(),
                meta: InstructionMeta {
                    condition: Condition::ZeroSet,
                    decorations: decoration,
                    ..InstructionMeta::default()
                },
            }],
        );
    }
    // Collapse the sequence of conditional writes into the final instruction occupying
    // the walker's slot by re-emitting the last candidate as the terminal `reset`.
    walker.previous_in_block();
    let last = walker.erase();
    walker.reset(last);
}

/// Lowers a work-item builtin call; returns `Ok(false)` if `name` is not one of them.
pub fn lower_work_item_builtin(
    walker: &mut InstructionWalker,
    name: &str,
    args: &[Value],
    dest: Value,
) -> Result<bool, CompilationError> {
    match name {
        "work_dim" | "get_work_dim" => {
            let src = find_well_known(walker, WORK_DIM).expect("%work_dim must exist");
            walker.reset(Instruction::Move {
                src,
                dest,
                meta: InstructionMeta {
                    decorations: Decorations::BUILTIN_WORK_DIM,
                    ..InstructionMeta::default()
                },
            });
            Ok(true)
        }
        "num_groups" | "get_num_groups" => {
            lower_dim_array(walker, &NUM_GROUPS, args, dest, Decorations::BUILTIN_NUM_GROUPS);
            Ok(true)
        }
        "group_id" | "get_group_id" => {
            lower_dim_array(walker, &GROUP_ID, args, dest, Decorations::BUILTIN_GROUP_ID);
            Ok(true)
        }
        "global_offset" | "get_global_offset" => {
            lower_dim_array(walker, &GLOBAL_OFFSET, args, dest, Decorations::BUILTIN_GLOBAL_OFFSET);
            Ok(true)
        }
        "local_size" | "get_local_size" => {
            lower_packed(walker, LOCAL_SIZES, args, dest, Decorations::BUILTIN_LOCAL_SIZE);
            Ok(true)
        }
        "local_id" | "get_local_id" => {
            lower_packed(walker, LOCAL_IDS, args, dest, Decorations::BUILTIN_LOCAL_ID);
            Ok(true)
        }
        "global_size" | "get_global_size" => {
            let ty = dest.get_type().clone();
            let local_size = walker.new_local(ty.clone(), "global_size_local");
            let local_size_value = Value::Local(local_size, ty.clone());
            crate::seq::with_placeholder(walker, |w| {
                lower_packed(w, LOCAL_SIZES, args, local_size_value.clone(), Decorations::BUILTIN_LOCAL_SIZE)
            });
            let num_groups = walker.new_local(ty.clone(), "global_size_groups");
            let num_groups_value = Value::Local(num_groups, ty.clone());
            crate::seq::with_placeholder(walker, |w| {
                lower_dim_array(w, &NUM_GROUPS, args, num_groups_value.clone(), Decorations::BUILTIN_NUM_GROUPS)
            });
            walker.reset(Instruction::Operation {
                op: OpCode::Mul24,
                args: vec![local_size_value, num_groups_value],
                dest,
                meta: InstructionMeta::default(),
            });
            Ok(true)
        }
        "global_id" | "get_global_id" => {
            let ty = dest.get_type().clone();
            let offset = walker.new_local(ty.clone(), "global_id_offset");
            let offset_value = Value::Local(offset, ty.clone());
            crate::seq::with_placeholder(walker, |w| {
                lower_dim_array(w, &GLOBAL_OFFSET, args, offset_value.clone(), Decorations::BUILTIN_GLOBAL_OFFSET)
            });
            let group = walker.new_local(ty.clone(), "global_id_group");
            let group_value = Value::Local(group, ty.clone());
            crate::seq::with_placeholder(walker, |w| lower_dim_array(w, &GROUP_ID, args, group_value.clone(), Decorations::BUILTIN_GROUP_ID));
            let local_size = walker.new_local(ty.clone(), "global_id_local_size");
            let local_size_value = Value::Local(local_size, ty.clone());
            crate::seq::with_placeholder(walker, |w| {
                lower_packed(w, LOCAL_SIZES, args, local_size_value.clone(), Decorations::BUILTIN_LOCAL_SIZE)
            });
            let local_id = walker.new_local(ty.clone(), "global_id_local_id");
            let local_id_value = Value::Local(local_id, ty.clone());
            crate::seq::with_placeholder(walker, |w| lower_packed(w, LOCAL_IDS, args, local_id_value.clone(), Decorations::BUILTIN_LOCAL_ID));
            let group_times_size = walker.new_local(ty.clone(), "global_id_scaled");
            crate::seq::emit_before(
                walker,
                vec![Instruction::Operation {
                    op: OpCode::Mul24,
                    args: vec![group_value, local_size_value],
                    dest: Value::Local(group_times_size, ty.clone()),
                    meta: InstructionMeta::default(),
                }],
            );
            let partial = walker.new_local(ty.clone(), "global_id_partial");
            crate::seq::emit_before(
                walker,
                vec![Instruction::Operation {
                    op: OpCode::Add,
                    args: vec![offset_value, Value::Local(group_times_size, ty.clone())],
                    dest: Value::Local(partial, ty.clone()),
                    meta: InstructionMeta::default(),
                }],
            );
            walker.reset(Instruction::Operation {
                op: OpCode::Add,
                args: vec![Value::Local(partial, ty.clone()), local_id_value],
                dest,
                meta: InstructionMeta::default(),
            });
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn lower_dim_array(walker: &mut InstructionWalker, locals: &[&str; 3], args: &[Value], dest: Value, decoration: Decorations) {
    match literal_dim(args) {
        Some(dim) if (dim as usize) < 3 => {
            let src = find_well_known(walker, locals[dim as usize]).expect("runtime-populated local must exist");
            walker.reset(Instruction::Move {
                src,
                dest,
                meta: InstructionMeta {
                    decorations: decoration,
                    ..InstructionMeta::default()
                },
            });
        }
        _ => {
            let dim = args.first().cloned().unwrap_or_else(|| Value::uint(0, dest.get_type().clone()));
            let ty = dest.get_type().clone();
            for candidate in 0u8..3 {
                let discard = Value::Register(Register::nop_register(), ty.clone());
                crate::seq::emit_before(
                    walker,
                    vec![Instruction::Operation {
                        op: OpCode::Xor,
                        args: vec![dim.clone(), Value::uint(u64::from(candidate), ty.clone())],
                        dest: discard,
                        meta: InstructionMeta {
                            set_flags: true,
                            ..InstructionMeta::default()
                        },
                    }],
                );
                let src = find_well_known(walker, locals[candidate as usize]).expect("runtime-populated local must exist");
                crate::seq::emit_before(
                    walker,
                    vec![Instruction::Move {
                        src,
                        dest: dest.clone(),
                        meta: InstructionMeta {
                            condition: Condition::ZeroSet,
                            decorations: decoration,
                            ..InstructionMeta::default()
                        },
                    }],
                );
            }
            walker.previous_in_block();
            let last = walker.erase();
            walker.reset(last);
        }
    }
}

fn lower_packed(walker: &mut InstructionWalker, packed_name: &str, args: &[Value], dest: Value, decoration: Decorations) {
    match literal_dim(args) {
        Some(dim) => packed_literal_lane(walker, packed_name, dim, dest, decoration),
        None => {
            let dim = args.first().cloned().unwrap_or_else(|| Value::uint(0, dest.get_type().clone()));
            packed_dynamic_lane(walker, packed_name, dim, dest, decoration)
        }
    }
}

/// Lowers the non-work-item named builtins: mutex/semaphore, element/QPU number, SFU and
/// ALU intrinsics, DMA access, and type-cast intrinsics. Returns `Ok(false)` if `name` does
/// not match any of these tables.
pub fn lower_named_builtin(
    walker: &mut InstructionWalker,
    name: &str,
    args: &[Value],
    dest: Option<Value>,
) -> Result<bool, CompilationError> {
    if name.contains("mutex_lock") {
        walker.reset(Instruction::MutexLock(vc4c_ir::MutexAction::Acquire));
        return Ok(true);
    }
    if name.contains("mutex_unlock") {
        walker.reset(Instruction::MutexLock(vc4c_ir::MutexAction::Release));
        return Ok(true);
    }
    if name.contains("semaphore_increment") || name.contains("semaphore_decrement") {
        let id = args
            .first()
            .and_then(Value::as_literal)
            .map(|l| l.as_i64())
            .ok_or_else(|| CompilationError::optimizer("semaphore id must be a compile-time literal"))?;
        if !(0..16).contains(&id) {
            return Err(CompilationError::optimizer("semaphore id out of range [0, 15]"));
        }
        walker.reset(Instruction::SemaphoreAdjustment {
            id: id as u8,
            increment: name.contains("increment"),
        });
        return Ok(true);
    }
    if name.contains("element_number") {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("element_number requires a destination"))?;
        walker.reset(Instruction::Move {
            src: Value::Register(Register::element_number(), dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return Ok(true);
    }
    if name.contains("qpu_number") {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("qpu_number requires a destination"))?;
        walker.reset(Instruction::Move {
            src: Value::Register(Register::qpu_number(), dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return Ok(true);
    }

    if let Some(sfu) = sfu_function_for(name) {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("SFU intrinsic requires a destination"))?;
        let arg = args
            .first()
            .cloned()
            .ok_or_else(|| CompilationError::optimizer("SFU intrinsic requires one argument"))?;
        if let Some(lit) = arg.as_literal() {
            let folded = match sfu {
                SfuFunction::Reciprocal => 1.0 / lit.as_f64(),
                SfuFunction::ReciprocalSqrt => 1.0 / lit.as_f64().sqrt(),
                SfuFunction::Exp2 => lit.as_f64().exp2(),
                SfuFunction::Log2 => lit.as_f64().log2(),
            };
            walker.reset(Instruction::Move {
                src: Value::real(folded, dest.get_type().clone()),
                dest,
                meta: InstructionMeta::default(),
            });
            return Ok(true);
        }
        let write = Instruction::Move {
            src: arg,
            dest: Value::Register(Register::sfu_input(sfu), dest.get_type().clone()),
            meta: InstructionMeta::default(),
        };
        crate::seq::emit_before(walker, vec![write, Instruction::Nop(NopReason::WaitSfu), Instruction::Nop(NopReason::WaitSfu)]);
        walker.reset(Instruction::Move {
            src: Value::Register(Register::sfu_output(), dest.get_type().clone()),
            dest,
            meta: InstructionMeta::default(),
        });
        return Ok(true);
    }

    if let Some((pack, unpack)) = pack_unpack_move_for(name) {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("intrinsic requires a destination"))?;
        let arg = args
            .first()
            .cloned()
            .ok_or_else(|| CompilationError::optimizer("intrinsic requires one argument"))?;
        walker.reset(Instruction::Move {
            src: arg,
            dest,
            meta: InstructionMeta {
                pack,
                unpack,
                ..InstructionMeta::default()
            },
        });
        return Ok(true);
    }

    if let Some((op, pack, unpack)) = single_arg_alu_for(name) {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("intrinsic requires a destination"))?;
        let arg = args
            .first()
            .cloned()
            .ok_or_else(|| CompilationError::optimizer("intrinsic requires one argument"))?;
        if let Some(lit) = arg.as_literal() {
            if let Some(value) = op.precalculate(&[lit]) {
                walker.reset(Instruction::Move {
                    src: Value::Literal(value, dest.get_type().clone()),
                    dest,
                    meta: InstructionMeta::default(),
                });
                return Ok(true);
            }
        }
        walker.reset(Instruction::Operation {
            op,
            args: vec![arg],
            dest,
            meta: InstructionMeta {
                pack,
                unpack,
                ..InstructionMeta::default()
            },
        });
        return Ok(true);
    }

    if let Some(op) = two_arg_alu_for(name) {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("intrinsic requires a destination"))?;
        if args.len() != 2 {
            return Err(CompilationError::optimizer("two-argument intrinsic called with the wrong arity"));
        }
        if let (Some(a), Some(b)) = (args[0].as_literal(), args[1].as_literal()) {
            if let Some(folded) = op.precalculate(&[a, b]) {
                walker.reset(Instruction::Move {
                    src: Value::Literal(folded, dest.get_type().clone()),
                    dest,
                    meta: InstructionMeta::default(),
                });
                return Ok(true);
            }
        }
        walker.reset(Instruction::Operation {
            op,
            args: args.to_vec(),
            dest,
            meta: InstructionMeta::default(),
        });
        return Ok(true);
    }

    if let Some(bits) = bitcast_width_for(name) {
        let dest = dest.ok_or_else(|| CompilationError::optimizer("bitcast intrinsic requires a destination"))?;
        let arg = args
            .first()
            .cloned()
            .ok_or_else(|| CompilationError::optimizer("bitcast intrinsic requires one argument"))?;
        if bits >= 32 {
            walker.reset(Instruction::Move {
                src: arg,
                dest,
                meta: InstructionMeta::default(),
            });
        } else {
            crate::extend::zero_extend(walker, arg, bits, dest);
        }
        return Ok(true);
    }

    if name.contains("vc4cl_dma_read") || name.contains("vc4cl_dma_write") || name.contains("vc4cl_dma_copy") {
        lower_dma_access(walker, name, args);
        return Ok(true);
    }

    if name.contains("read_image") || name.contains("write_image") || name.contains("get_image") {
        return Err(CompilationError::code_generation("image builtins are not supported by this backend", name));
    }

    Ok(false)
}

fn sfu_function_for(name: &str) -> Option<SfuFunction> {
    if name.contains("rsqrt") {
        Some(SfuFunction::ReciprocalSqrt)
    } else if name.contains("exp2") {
        Some(SfuFunction::Exp2)
    } else if name.contains("log2") {
        Some(SfuFunction::Log2)
    } else if name.contains("recip") {
        Some(SfuFunction::Reciprocal)
    } else {
        None
    }
}

fn single_arg_alu_for(name: &str) -> Option<(OpCode, Option<PackMode>, Option<UnpackMode>)> {
    if name.contains("ftoi") {
        Some((OpCode::Ftoi, None, None))
    } else if name.contains("itof") {
        Some((OpCode::Itof, None, None))
    } else if name.contains("clz") {
        Some((OpCode::Clz, None, None))
    } else {
        None
    }
}

/// Builtins that only reshape a value through the ALU's pack/unpack hardware and otherwise
/// pass it through unchanged - lowered as a plain `Move` carrying the pack/unpack mode, not
/// an `Operation`, since there is no actual ALU opcode involved.
fn pack_unpack_move_for(name: &str) -> Option<(Option<PackMode>, Option<UnpackMode>)> {
    if name.contains("unpack_sext8") {
        Some((None, Some(UnpackMode::SignExtend8)))
    } else if name.contains("unpack_sext16") {
        Some((None, Some(UnpackMode::SignExtend16)))
    } else if name.contains("unpack_zext8") {
        Some((None, Some(UnpackMode::ZeroExtend8)))
    } else if name.contains("unpack_zext16") {
        Some((None, Some(UnpackMode::ZeroExtend16)))
    } else if name.contains("pack_sat8") {
        Some((Some(PackMode::Int8Saturate), None))
    } else if name.contains("pack_sat16") {
        Some((Some(PackMode::Int16Saturate), None))
    } else {
        None
    }
}

fn two_arg_alu_for(name: &str) -> Option<OpCode> {
    if name.contains("fmaxabs") {
        Some(OpCode::FMaxAbs)
    } else if name.contains("fminabs") {
        Some(OpCode::FMinAbs)
    } else if name.contains("fmax") {
        Some(OpCode::FMax)
    } else if name.contains("fmin") {
        Some(OpCode::FMin)
    } else if name.contains("shr") {
        Some(OpCode::Shr)
    } else if name.contains("asr") {
        Some(OpCode::Asr)
    } else if name.contains("ror") {
        Some(OpCode::Ror)
    } else if name.contains("shl") {
        Some(OpCode::Shl)
    } else if name.contains("min") {
        Some(OpCode::Min)
    } else if name.contains("max") {
        Some(OpCode::Max)
    } else if name.contains("and") {
        Some(OpCode::And)
    } else if name.contains("mul24") {
        Some(OpCode::Mul24)
    } else if name.contains("v8adds") {
        Some(OpCode::V8Adds)
    } else if name.contains("v8subs") {
        Some(OpCode::V8Subs)
    } else {
        None
    }
}

fn bitcast_width_for(name: &str) -> Option<u8> {
    if name.contains("bitcast_uchar") || name.contains("bitcast_char") {
        Some(8)
    } else if name.contains("bitcast_ushort") || name.contains("bitcast_short") {
        Some(16)
    } else if name.contains("bitcast_uint") || name.contains("bitcast_int") || name.contains("bitcast_float") {
        Some(32)
    } else {
        None
    }
}

fn lower_dma_access(walker: &mut InstructionWalker, name: &str, args: &[Value]) {
    let ty = args
        .first()
        .map(|v| v.get_type().clone())
        .unwrap_or_else(|| vc4c_ir::DataType::Scalar(vc4c_ir::ScalarType::I32));
    let setup_register = if name.contains("write") {
        Register::vpm_dma_write_setup()
    } else {
        Register::vpm_dma_read_setup()
    };
    let mut seq: Vec<Instruction> = args
        .iter()
        .map(|arg| Instruction::Move {
            src: arg.clone(),
            dest: Value::Register(setup_register, ty.clone()),
            meta: InstructionMeta::default(),
        })
        .collect();
    seq.push(Instruction::Nop(NopReason::WaitDma));
    let last = seq.pop().unwrap();
    crate::seq::emit_before(walker, seq);
    walker.reset(last);
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, Method, NopReason, ScalarType};

    fn i32_ty() -> DataType {
        DataType::Scalar(ScalarType::I32)
    }

    fn prepare_method_with_uniforms() -> Method {
        let mut method = Method::new("k", true);
        for name in [WORK_DIM, LOCAL_SIZES, LOCAL_IDS]
            .iter()
            .chain(NUM_GROUPS.iter())
            .chain(GROUP_ID.iter())
            .chain(GLOBAL_OFFSET.iter())
        {
            let id = method.add_new_local(i32_ty(), "uniform");
            method.local_mut(id).unwrap().name = name.to_string();
        }
        method
    }

    #[test]
    fn work_dim_reads_well_known_local() {
        let mut method = prepare_method_with_uniforms();
        let entry = method.entry_block_index();
        let dest_local = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        let handled = lower_work_item_builtin(&mut walker, "work_dim", &[], Value::Local(dest_local, i32_ty())).unwrap();
        assert!(handled);
        assert!(matches!(walker.get(), Some(Instruction::Move { .. })));
    }

    #[test]
    fn local_id_with_literal_dim_extracts_packed_byte() {
        let mut method = prepare_method_with_uniforms();
        let entry = method.entry_block_index();
        let dest_local = method.add_new_local(i32_ty(), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        let handled = lower_work_item_builtin(
            &mut walker,
            "get_local_id",
            &[Value::int(0, i32_ty())],
            Value::Local(dest_local, i32_ty()),
        )
        .unwrap();
        assert!(handled);
        assert!(matches!(walker.get(), Some(Instruction::Operation { op: OpCode::And, .. })));
    }

    #[test]
    fn semaphore_out_of_range_id_is_rejected() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        let result = lower_named_builtin(&mut walker, "vc4cl_semaphore_increment", &[Value::int(99, i32_ty())], None);
        assert!(result.is_err());
    }

    #[test]
    fn rsqrt_of_literal_folds_at_compile_time() {
        let mut method = Method::new("k", true);
        let entry = method.entry_block_index();
        let dest_local = method.add_new_local(DataType::Scalar(ScalarType::F32), "dest");
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Nop(NopReason::Other("placeholder")));
        let handled = lower_named_builtin(
            &mut walker,
            "vc4cl_sfu_rsqrt",
            &[Value::real(4.0, DataType::Scalar(ScalarType::F32))],
            Some(Value::Local(dest_local, DataType::Scalar(ScalarType::F32))),
        )
        .unwrap();
        assert!(handled);
        assert!(matches!(walker.get(), Some(Instruction::Move { .. })));
    }
}
