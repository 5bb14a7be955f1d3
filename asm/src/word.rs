//! Packs one [`Instruction`] into the hardware's 64-bit instruction word.
//!
//! Field layout, high bit to low:
//!
//! | bits  | field     | meaning                                              |
//! |-------|-----------|-------------------------------------------------------|
//! | 63:58 | add_op    | add-ALU opcode, 0 = nop                                |
//! | 57:52 | mul_op    | mul-ALU opcode, 0 = nop                                |
//! | 51:46 | raddr_a   | register-file read address A                          |
//! | 45:40 | raddr_b   | register-file read address B, or a small immediate     |
//! | 39:34 | waddr_add | write address for the add-ALU result                   |
//! | 33:28 | waddr_mul | write address for the mul-ALU result                   |
//! | 27:24 | sig       | signal / small-immediate-present nibble                |
//! | 23:20 | pack      | pack mode applied at the writer                        |
//! | 19:17 | unpack    | unpack mode applied at a reader                        |
//! | 16:14 | cond_add  | condition code gating the add-ALU write                |
//! | 13:11 | cond_mul  | condition code gating the mul-ALU write                |
//! | 10    | sf        | set-flags                                              |
//! | 9:0   | aux       | semaphore id / mutex action / nop reason / branch bits |
//!
//! This backend does not schedule two independent operations into one word: each concrete
//! instruction activates exactly one ALU side (per [`OpInfo::side`](vc4c_ir::OpInfo)) and
//! leaves the other at its `nop` opcode with the write address forced to [`NOP_ADDRESS`].
//! Full add/mul dual issue is a scheduling pass this backend doesn't implement; see
//! `DESIGN.md`.

use vc4c_ir::{
    AluSide, Condition, Instruction, MutexAction, NopReason, OpCode, PackMode, Register, RegisterFile, UnpackMode,
    Value,
};

pub const NOP_ADDRESS: u8 = 0x3F;
const ACCUMULATOR_BASE: u8 = 32;
const PERIPHERAL_BASE: u8 = 38;
/// Peripheral registers share the tail of the same 6-bit address space as the
/// accumulators (`PERIPHERAL_BASE..=NOP_ADDRESS`, 26 slots); this IR's peripheral index
/// space is wider than that (it names up to 80 distinct special registers), so it folds
/// down with a modulus rather than a straight offset. Real hardware packs the same
/// information into the same 26 slots by giving most of them file-dependent (A vs B)
/// meaning, which this backend does not model.
const PERIPHERAL_SLOTS: u8 = NOP_ADDRESS - PERIPHERAL_BASE;

const SIG_NONE: u8 = 0x0;
const SIG_SMALL_IMMEDIATE: u8 = 0x1;
const SIG_LOAD_IMMEDIATE: u8 = 0x2;
const SIG_BRANCH: u8 = 0x3;
const SIG_SEMAPHORE: u8 = 0x4;
const SIG_MUTEX: u8 = 0x5;
const SIG_NOP: u8 = 0x6;

fn register_address(register: &Register) -> u8 {
    match register.file {
        RegisterFile::A | RegisterFile::B => register.index & 0x3F,
        RegisterFile::Accumulator => ACCUMULATOR_BASE + (register.index & 0x07),
        RegisterFile::Peripheral => PERIPHERAL_BASE + (register.index % PERIPHERAL_SLOTS),
    }
}

/// Address for a read operand: physical registers resolve directly, everything else
/// (locals, literals, containers) is the job of an earlier register-allocation pass this
/// backend doesn't implement, so it resolves to [`NOP_ADDRESS`] as a documented placeholder.
fn value_address(value: &Value) -> u8 {
    match value {
        Value::Register(register, _) => register_address(register),
        _ => NOP_ADDRESS,
    }
}

fn condition_code(condition: Condition) -> u8 {
    match condition {
        Condition::Always => 0,
        Condition::ZeroSet => 1,
        Condition::ZeroClear => 2,
        Condition::NegativeSet => 3,
        Condition::NegativeClear => 4,
        Condition::CarrySet => 5,
        Condition::CarryClear => 6,
    }
}

fn pack_code(mode: PackMode) -> u8 {
    match mode {
        PackMode::Int32 => 0,
        PackMode::Int8Truncate => 1,
        PackMode::Int8Saturate => 2,
        PackMode::UInt8Saturate => 3,
        PackMode::Int16Saturate => 4,
        PackMode::UInt16Truncate => 5,
        PackMode::Int32Saturate => 6,
    }
}

fn unpack_code(mode: UnpackMode) -> u8 {
    match mode {
        UnpackMode::Int32 => 0,
        UnpackMode::SignExtend8 => 1,
        UnpackMode::SignExtend16 => 2,
        UnpackMode::ZeroExtend8 => 3,
        UnpackMode::ZeroExtend16 => 4,
    }
}

/// Dense opcode id within the add-ALU's opcode space; `0` is always `nop`.
fn add_opcode_id(op: OpCode) -> u8 {
    match op {
        OpCode::Add => 1,
        OpCode::Sub => 2,
        OpCode::And => 3,
        OpCode::Or => 4,
        OpCode::Xor => 5,
        OpCode::Not => 6,
        OpCode::Shl => 7,
        OpCode::Shr => 8,
        OpCode::Asr => 9,
        OpCode::Ror => 10,
        OpCode::FAdd => 11,
        OpCode::FSub => 12,
        OpCode::FMin => 13,
        OpCode::FMax => 14,
        OpCode::FMinAbs => 15,
        OpCode::FMaxAbs => 16,
        OpCode::Itof => 17,
        OpCode::Ftoi => 18,
        OpCode::Clz => 19,
        OpCode::V8Subs => 20,
        OpCode::V8Adds => 21,
        _ => 0,
    }
}

/// Dense opcode id within the mul-ALU's opcode space; `0` is always `nop`.
fn mul_opcode_id(op: OpCode) -> u8 {
    match op {
        OpCode::Mul24 => 1,
        OpCode::Min => 2,
        OpCode::Max => 3,
        OpCode::FMul => 4,
        OpCode::Add => 5,
        OpCode::V8Adds => 6,
        _ => 0,
    }
}

fn active_side(op: OpCode) -> AluSide {
    match op.info().side {
        AluSide::Mul => AluSide::Mul,
        AluSide::Add | AluSide::Either => AluSide::Add,
    }
}

struct WordBuilder {
    word: u64,
}

impl WordBuilder {
    fn new() -> WordBuilder {
        WordBuilder { word: 0 }
    }

    fn set(mut self, shift: u32, width: u32, value: u64) -> WordBuilder {
        let mask = (1u64 << width) - 1;
        self.word |= (value & mask) << shift;
        self
    }

    fn finish(self) -> u64 {
        self.word
    }
}

fn base(raddr_a: u8, raddr_b: u8, sig: u8, meta_pack: Option<PackMode>, meta_unpack: Option<UnpackMode>) -> WordBuilder {
    WordBuilder::new()
        .set(46, 6, u64::from(raddr_a))
        .set(40, 6, u64::from(raddr_b))
        .set(24, 4, u64::from(sig))
        .set(20, 4, u64::from(meta_pack.map(pack_code).unwrap_or(0)))
        .set(17, 3, u64::from(meta_unpack.map(unpack_code).unwrap_or(0)))
}

fn encode_operation(op: OpCode, args: &[Value], dest: &Value, meta: &vc4c_ir::InstructionMeta) -> u64 {
    let raddr_a = value_address(&args[0]);
    let raddr_b = args.get(1).map(value_address).unwrap_or(NOP_ADDRESS);
    let waddr = value_address(dest);
    let condition = condition_code(meta.condition);

    let mut builder = base(raddr_a, raddr_b, SIG_NONE, meta.pack, meta.unpack).set(10, 1, meta.set_flags as u64);
    builder = match active_side(op) {
        AluSide::Add => builder
            .set(58, 6, u64::from(add_opcode_id(op)))
            .set(34, 6, u64::from(waddr))
            .set(33, 6, u64::from(NOP_ADDRESS))
            .set(14, 3, u64::from(condition))
            .set(11, 3, 0),
        AluSide::Mul => builder
            .set(52, 6, u64::from(mul_opcode_id(op)))
            .set(39, 6, u64::from(NOP_ADDRESS))
            .set(28, 6, u64::from(waddr))
            .set(14, 3, 0)
            .set(11, 3, u64::from(condition)),
        AluSide::Either => unreachable!("active_side never returns Either"),
    };
    builder.finish()
}

fn encode_move(src: &Value, dest: &Value, meta: &vc4c_ir::InstructionMeta) -> u64 {
    let raddr_a = value_address(src);
    let waddr = value_address(dest);
    base(raddr_a, NOP_ADDRESS, SIG_NONE, meta.pack, meta.unpack)
        .set(58, 6, u64::from(add_opcode_id(OpCode::Or)))
        .set(34, 6, u64::from(waddr))
        .set(33, 6, u64::from(NOP_ADDRESS))
        .set(14, 3, u64::from(condition_code(meta.condition)))
        .set(10, 1, meta.set_flags as u64)
        .finish()
}

fn encode_load_immediate(value: &vc4c_ir::Literal, dest: &Value, meta: &vc4c_ir::InstructionMeta) -> u64 {
    let waddr = value_address(dest);
    base(NOP_ADDRESS, (value.as_u64() & 0xFF) as u8, SIG_LOAD_IMMEDIATE, meta.pack, meta.unpack)
        .set(34, 6, u64::from(waddr))
        .set(33, 6, u64::from(NOP_ADDRESS))
        .set(14, 3, u64::from(condition_code(meta.condition)))
        .set(10, 1, meta.set_flags as u64)
        .finish()
}

fn encode_rotation(src: &Value, offset: vc4c_ir::SmallImmediate, dest: &Value, meta: &vc4c_ir::InstructionMeta) -> u64 {
    let raddr_a = value_address(src);
    let waddr = value_address(dest);
    base(raddr_a, offset.encode(), SIG_SMALL_IMMEDIATE, meta.pack, meta.unpack)
        .set(52, 6, u64::from(mul_opcode_id(OpCode::Mul24)))
        .set(28, 6, u64::from(waddr))
        .set(39, 6, u64::from(NOP_ADDRESS))
        .set(11, 3, u64::from(condition_code(meta.condition)))
        .set(10, 1, meta.set_flags as u64)
        .finish()
}

fn encode_nop(reason: NopReason) -> u64 {
    let aux = match reason {
        NopReason::WaitRegister => 1,
        NopReason::WaitSfu => 2,
        NopReason::WaitVpm => 3,
        NopReason::WaitDma => 4,
        NopReason::Other(_) => 0,
    };
    WordBuilder::new().set(24, 4, u64::from(SIG_NOP)).set(0, 10, aux).finish()
}

fn encode_mutex(action: MutexAction) -> u64 {
    let aux = match action {
        MutexAction::Acquire => 0,
        MutexAction::Release => 1,
    };
    WordBuilder::new().set(24, 4, u64::from(SIG_MUTEX)).set(0, 10, aux).finish()
}

fn encode_semaphore(id: u8, increment: bool) -> u64 {
    WordBuilder::new()
        .set(24, 4, u64::from(SIG_SEMAPHORE))
        .set(0, 5, u64::from(id))
        .set(5, 1, increment as u64)
        .finish()
}

fn encode_branch(condition: Condition) -> u64 {
    // Label -> word-offset resolution is a linker concern outside this backend's scope;
    // the offset bits stay zero here and are patched in by whatever resolves labels.
    WordBuilder::new()
        .set(24, 4, u64::from(SIG_BRANCH))
        .set(14, 3, u64::from(condition_code(condition)))
        .finish()
}

/// Packs a concrete, already-legalized [`Instruction`] into its 64-bit word. Panics on
/// `MethodCall`/`BranchLabel`/`Return`, which never reach emission: calls are resolved by
/// the intrinsics pass, labels and returns are structural and carry no ALU payload of
/// their own.
pub fn encode(instruction: &Instruction) -> u64 {
    match instruction {
        Instruction::Operation { op, args, dest, meta } => encode_operation(*op, args, dest, meta),
        Instruction::Move { src, dest, meta } => encode_move(src, dest, meta),
        Instruction::LoadImmediate { value, dest, meta } => encode_load_immediate(value, dest, meta),
        Instruction::VectorRotation { src, offset, dest, meta } => encode_rotation(src, *offset, dest, meta),
        Instruction::Nop(reason) => encode_nop(*reason),
        Instruction::MutexLock(action) => encode_mutex(*action),
        Instruction::SemaphoreAdjustment { id, increment } => encode_semaphore(*id, *increment),
        Instruction::Branch { condition, .. } => encode_branch(*condition),
        Instruction::BranchLabel { .. } => 0,
        Instruction::Return => WordBuilder::new().set(24, 4, u64::from(SIG_NOP)).finish(),
        Instruction::MethodCall { name, .. } => {
            panic!("unresolved call to '{}' reached instruction emission", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vc4c_ir::{DataType, InstructionMeta, ScalarType};

    fn reg(file: RegisterFile, index: u8) -> Value {
        Value::Register(Register::new(file, index), DataType::Scalar(ScalarType::I32))
    }

    #[test]
    fn add_operation_activates_only_the_add_side() {
        let word = encode_operation(
            OpCode::Add,
            &[reg(RegisterFile::A, 1), reg(RegisterFile::B, 2)],
            &reg(RegisterFile::A, 3),
            &InstructionMeta::default(),
        );
        let mul_op = (word >> 52) & 0x3F;
        let add_op = (word >> 58) & 0x3F;
        assert_eq!(mul_op, 0);
        assert_eq!(add_op, u64::from(add_opcode_id(OpCode::Add)));
    }

    #[test]
    fn mul24_operation_activates_only_the_mul_side() {
        let word = encode_operation(
            OpCode::Mul24,
            &[reg(RegisterFile::A, 1), reg(RegisterFile::B, 2)],
            &reg(RegisterFile::A, 3),
            &InstructionMeta::default(),
        );
        let add_op = (word >> 58) & 0x3F;
        let mul_op = (word >> 52) & 0x3F;
        assert_eq!(add_op, 0);
        assert_eq!(mul_op, u64::from(mul_opcode_id(OpCode::Mul24)));
    }

    #[test]
    fn nop_reason_round_trips_through_the_aux_field() {
        let word = encode_nop(NopReason::WaitSfu);
        assert_eq!(word & 0x3FF, 2);
        assert_eq!((word >> 24) & 0xF, u64::from(SIG_NOP));
    }

    #[quickcheck_macros::quickcheck]
    fn register_address_always_fits_the_six_bit_read_write_field(index: u8) -> bool {
        let a = register_address(&Register::new(RegisterFile::A, index));
        let b = register_address(&Register::new(RegisterFile::B, index));
        let acc = register_address(&Register::new(RegisterFile::Accumulator, index));
        let periph = register_address(&Register::new(RegisterFile::Peripheral, index));
        a < 64 && b < 64 && (32..40).contains(&acc) && periph < 64 && periph >= PERIPHERAL_BASE
    }
}
