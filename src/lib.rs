//! Intermediate representation for the VC4C QPU backend.
//!
//! A [`Module`] owns a list of [`Method`]s and [`Global`]s. Each `Method` owns an ordered
//! list of [`BasicBlock`]s, a pool of [`Local`]s, its parameters and stack allocations.
//! Each `BasicBlock` owns its [`Instruction`]s in a `slotmap` arena threaded together with
//! an intrusive prev/next list, addressed from the outside only through the stable
//! [`InstKey`](block::InstKey) or through an [`InstructionWalker`](walker::InstructionWalker).
//!
//! This crate contains components A-C of the backend (IR model, instruction cursor,
//! instruction variants). Lowering passes live in the `vc4c-lower` crate; binary
//! serialization lives in `vc4c-asm`.

pub mod block;
pub mod condition;
pub mod decoration;
pub mod instruction;
pub mod literal;
pub mod local;
pub mod method;
pub mod module;
pub mod opcode;
pub mod pack;
pub mod register;
pub mod types;
pub mod value;
pub mod walker;

#[cfg(test)]
mod test;

pub use block::{BasicBlock, InstKey};
pub use condition::Condition;
pub use decoration::Decorations;
pub use instruction::{Instruction, InstructionMeta, MutexAction, NopReason};
pub use literal::{Literal, SmallImmediate};
pub use local::{Local, LocalId, LocalReference};
pub use method::{Method, Parameter, ParameterDecorations, StackAllocation, WorkGroupSize};
pub use module::{Global, Module};
pub use opcode::{AluSide, OpCode, OpInfo};
pub use pack::{PackMode, UnpackMode};
pub use register::{Register, RegisterFile, SfuFunction};
pub use types::{AddressSpace, DataType, ScalarType};
pub use value::Value;
pub use walker::InstructionWalker;

/// A single 32-bit hardware word; the native element size of the register file.
pub type Word = u32;
