//! Pointer arithmetic: walking a chain of indices into a pointer/array/struct type and
//! producing the addend to fold into a single `add`.

use crate::error::CompilationError;
use vc4c_ir::{DataType, Instruction, InstructionMeta, InstructionWalker, Local, LocalReference, OpCode, Value};

/// One step of an index chain: either a runtime value (pointer/array subscript) or a
/// compile-time-only struct field index.
pub enum GepIndex {
    Value(Value),
    StructField(u32),
}

/// Computes the byte offset implied by `indices` walked through `base_type`, folding
/// literal-times-literal products and accumulating struct field offsets directly, then
/// emits `dest = base + offset`, replacing whatever instruction `walker` is positioned at.
///
/// Records a [`LocalReference`] from `dest` back to `base_local`'s first index so later
/// passes can recover which parameter the resulting pointer aliases.
pub fn compute_index(
    walker: &mut InstructionWalker,
    base: Value,
    base_local: vc4c_ir::LocalId,
    base_type: &DataType,
    indices: &[GepIndex],
    dest: Value,
) -> Result<(), CompilationError> {
    let mut ty = base_type.clone();
    let mut literal_offset: i64 = 0;
    let mut dynamic_terms: Vec<Instruction> = Vec::new();
    let mut offset_local: Option<Value> = None;
    let mut first_index: Option<i64> = None;

    for index in indices {
        match index {
            GepIndex::StructField(field) => {
                let offset = ty
                    .struct_field_offset(*field as usize)
                    .ok_or_else(|| CompilationError::optimizer("struct field index used on a non-struct type"))?;
                literal_offset += i64::from(offset);
                if first_index.is_none() {
                    first_index = Some(i64::from(*field));
                }
                ty = struct_field_type(&ty, *field as usize)?;
            }
            GepIndex::Value(index_value) => {
                let element_width = element_width_of(&ty)?;
                if first_index.is_none() {
                    if let Some(lit) = index_value.as_literal() {
                        first_index = Some(lit.as_i64());
                    }
                }
                match index_value.as_literal() {
                    Some(lit) => literal_offset += lit.as_i64() * i64::from(element_width),
                    None => {
                        let scaled = walker.new_local(dest.get_type().clone(), "gep_term");
                        let scaled_value = Value::Local(scaled, dest.get_type().clone());
                        dynamic_terms.push(Instruction::Operation {
                            op: OpCode::Mul24,
                            args: vec![index_value.clone(), Value::uint(u64::from(element_width), dest.get_type().clone())],
                            dest: scaled_value.clone(),
                            meta: InstructionMeta::default(),
                        });
                        offset_local = Some(match offset_local.take() {
                            None => scaled_value,
                            Some(prev) => {
                                let sum = walker.new_local(dest.get_type().clone(), "gep_sum");
                                let sum_value = Value::Local(sum, dest.get_type().clone());
                                dynamic_terms.push(Instruction::Operation {
                                    op: OpCode::Add,
                                    args: vec![prev, scaled_value],
                                    dest: sum_value.clone(),
                                    meta: InstructionMeta::default(),
                                });
                                sum_value
                            }
                        });
                    }
                }
                ty = element_type_of(&ty)?;
            }
        }
    }

    crate::seq::emit_before(walker, dynamic_terms);

    let offset_value = match offset_local {
        None => Value::int(literal_offset, dest.get_type().clone()),
        Some(dynamic) if literal_offset == 0 => dynamic,
        Some(dynamic) => {
            let combined = walker.new_local(dest.get_type().clone(), "gep_offset");
            let combined_value = Value::Local(combined, dest.get_type().clone());
            crate::seq::emit_before(
                walker,
                vec![Instruction::Operation {
                    op: OpCode::Add,
                    args: vec![dynamic, Value::int(literal_offset, dest.get_type().clone())],
                    dest: combined_value.clone(),
                    meta: InstructionMeta::default(),
                }],
            );
            combined_value
        }
    };

    walker.reset(Instruction::Operation {
        op: OpCode::Add,
        args: vec![base, offset_value],
        dest: dest.clone(),
        meta: InstructionMeta::default(),
    });

    if let (Some(index), Some(dest_local)) = (first_index, dest.as_local()) {
        if let Some(local) = walker.method_mut().local_mut(dest_local) {
            set_reference(local, base_local, index);
        }
    }

    Ok(())
}

fn set_reference(local: &mut Local, base: vc4c_ir::LocalId, index: i64) {
    local.reference = Some(LocalReference { base, index });
}

fn element_width_of(ty: &DataType) -> Result<u32, CompilationError> {
    match ty {
        DataType::Pointer { pointee, .. } => Ok(pointee.physical_width()),
        DataType::Array { element, .. } => Ok(element.physical_width()),
        other => Err(CompilationError::optimizer(format!(
            "cannot index into non-pointer, non-array type {:?}",
            other
        ))),
    }
}

fn element_type_of(ty: &DataType) -> Result<DataType, CompilationError> {
    match ty {
        DataType::Pointer { pointee, .. } => Ok((**pointee).clone()),
        DataType::Array { element, .. } => Ok((**element).clone()),
        other => Err(CompilationError::optimizer(format!(
            "cannot index into non-pointer, non-array type {:?}",
            other
        ))),
    }
}

fn struct_field_type(ty: &DataType, field: usize) -> Result<DataType, CompilationError> {
    match ty {
        DataType::Struct { fields, .. } => fields
            .get(field)
            .cloned()
            .ok_or_else(|| CompilationError::optimizer("struct field index out of range")),
        other => Err(CompilationError::optimizer(format!("not a struct type: {:?}", other))),
    }
}
