//! The instruction variant hierarchy and the metadata every variant that reaches the ALU
//! shares (condition code, set-flags, pack/unpack, decorations).

use crate::decoration::Decorations;
use crate::literal::{Literal, SmallImmediate};
use crate::local::LocalId;
use crate::opcode::OpCode;
use crate::{Condition, PackMode, UnpackMode, Value};

/// Condition, set-flags, pack/unpack and decorations shared by every ALU-capable variant.
#[derive(Clone, Debug, Default)]
pub struct InstructionMeta {
    pub condition: Condition,
    pub set_flags: bool,
    pub pack: Option<PackMode>,
    pub unpack: Option<UnpackMode>,
    pub decorations: Decorations,
}

impl InstructionMeta {
    /// Copies condition/set-flags/pack/unpack/decorations from `other`, leaving anything
    /// variant-specific (opcode, operands) untouched. Mirrors the "clone-extras" behaviour
    /// every instruction variant must provide per the IR design.
    pub fn clone_extras_from(&mut self, other: &InstructionMeta) {
        self.condition = other.condition;
        self.set_flags = other.set_flags;
        self.pack = other.pack;
        self.unpack = other.unpack;
        self.decorations = other.decorations;
    }
}

/// Why a `Nop` was inserted; purely documentary except for the two hazards the scheduler
/// must actually guard against (`WaitRegister`, `WaitSfu`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NopReason {
    /// Precedes a vector rotation whose source was written by the immediately preceding
    /// instruction.
    WaitRegister,
    /// One of two bubbles inserted between an SFU input write and the matching read.
    WaitSfu,
    WaitVpm,
    WaitDma,
    Other(&'static str),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MutexAction {
    Acquire,
    Release,
}

/// One instruction. Variants that can be scheduled onto an ALU pipeline carry an
/// [`InstructionMeta`]; control-flow and fence variants do not.
#[derive(Clone, Debug)]
pub enum Instruction {
    Move {
        src: Value,
        dest: Value,
        meta: InstructionMeta,
    },
    Operation {
        op: OpCode,
        args: Vec<Value>,
        dest: Value,
        meta: InstructionMeta,
    },
    VectorRotation {
        src: Value,
        offset: SmallImmediate,
        dest: Value,
        meta: InstructionMeta,
    },
    MethodCall {
        name: String,
        args: Vec<Value>,
        dest: Option<Value>,
        meta: InstructionMeta,
    },
    Branch {
        target: String,
        condition: Condition,
    },
    BranchLabel {
        name: String,
        meta: InstructionMeta,
    },
    Return,
    Nop(NopReason),
    SemaphoreAdjustment {
        id: u8,
        increment: bool,
    },
    MutexLock(MutexAction),
    LoadImmediate {
        value: Literal,
        dest: Value,
        meta: InstructionMeta,
    },
}

/// How a local participates in an instruction, for use-def bookkeeping.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LocalRole {
    Read,
    Write,
}

impl Instruction {
    pub fn output(&self) -> Option<&Value> {
        match self {
            Instruction::Move { dest, .. }
            | Instruction::Operation { dest, .. }
            | Instruction::VectorRotation { dest, .. }
            | Instruction::LoadImmediate { dest, .. } => Some(dest),
            Instruction::MethodCall { dest, .. } => dest.as_ref(),
            _ => None,
        }
    }

    pub fn output_mut(&mut self) -> Option<&mut Value> {
        match self {
            Instruction::Move { dest, .. }
            | Instruction::Operation { dest, .. }
            | Instruction::VectorRotation { dest, .. }
            | Instruction::LoadImmediate { dest, .. } => Some(dest),
            Instruction::MethodCall { dest, .. } => dest.as_mut(),
            _ => None,
        }
    }

    pub fn arguments(&self) -> Vec<&Value> {
        match self {
            Instruction::Move { src, .. } => vec![src],
            Instruction::Operation { args, .. } => args.iter().collect(),
            Instruction::VectorRotation { src, .. } => vec![src],
            Instruction::MethodCall { args, .. } => args.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn meta(&self) -> Option<&InstructionMeta> {
        match self {
            Instruction::Move { meta, .. }
            | Instruction::Operation { meta, .. }
            | Instruction::VectorRotation { meta, .. }
            | Instruction::MethodCall { meta, .. }
            | Instruction::BranchLabel { meta, .. }
            | Instruction::LoadImmediate { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn meta_mut(&mut self) -> Option<&mut InstructionMeta> {
        match self {
            Instruction::Move { meta, .. }
            | Instruction::Operation { meta, .. }
            | Instruction::VectorRotation { meta, .. }
            | Instruction::MethodCall { meta, .. }
            | Instruction::BranchLabel { meta, .. }
            | Instruction::LoadImmediate { meta, .. } => Some(meta),
            _ => None,
        }
    }

    pub fn condition(&self) -> Condition {
        match self {
            Instruction::Branch { condition, .. } => *condition,
            other => other.meta().map(|m| m.condition).unwrap_or(Condition::Always),
        }
    }

    /// Every `(local, role)` pair this instruction participates in, for the block's
    /// use-def maintenance.
    pub fn locals_used(&self) -> Vec<(LocalId, LocalRole)> {
        let mut result = Vec::new();
        for arg in self.arguments() {
            if let Some(id) = arg.as_local() {
                result.push((id, LocalRole::Read));
            }
        }
        if let Some(out) = self.output() {
            if let Some(id) = out.as_local() {
                result.push((id, LocalRole::Write));
            }
        }
        result
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Instruction::Branch { .. } | Instruction::Return)
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::BranchLabel { .. })
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Instruction::Move { src, dest, .. } => write!(f, "mov {:?}, {:?}", dest, src),
            Instruction::Operation { op, args, dest, .. } => {
                write!(f, "{} {:?}, {:?}", op, dest, args)
            }
            Instruction::VectorRotation { src, offset, dest, .. } => {
                write!(f, "rotate {:?}, {:?}, {:?}", dest, src, offset)
            }
            Instruction::MethodCall { name, args, dest, .. } => {
                write!(f, "call {:?} = {}({:?})", dest, name, args)
            }
            Instruction::Branch { target, condition } => {
                write!(f, "branch {} ({:?})", target, condition)
            }
            Instruction::BranchLabel { name, .. } => write!(f, "{}:", name),
            Instruction::Return => write!(f, "ret"),
            Instruction::Nop(reason) => write!(f, "nop ({:?})", reason),
            Instruction::SemaphoreAdjustment { id, increment } => {
                write!(f, "semaphore {} {}", if *increment { "incr" } else { "decr" }, id)
            }
            Instruction::MutexLock(action) => write!(f, "mutex {:?}", action),
            Instruction::LoadImmediate { value, dest, .. } => {
                write!(f, "li {:?}, {:?}", dest, value)
            }
        }
    }
}
