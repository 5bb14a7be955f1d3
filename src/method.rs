//! Kernels and helper functions: parameters, basic blocks, the locals pool, stack
//! allocations, and work-group-size metadata.

use crate::block::{BasicBlock, InstKey};
use crate::instruction::{Instruction, LocalRole};
use crate::local::{Local, LocalId};
use crate::types::DataType;
use slotmap::SlotMap;
use std::collections::HashMap;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct ParameterDecorations: u16 {
        const READ_ONLY  = 1 << 0;
        const WRITE_ONLY = 1 << 1;
        const RESTRICT   = 1 << 2;
        const VOLATILE   = 1 << 3;
        const SIGN_EXTEND = 1 << 4;
        const ZERO_EXTEND = 1 << 5;
    }
}

#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub ty: DataType,
    pub decorations: ParameterDecorations,
    pub local: LocalId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StackAllocation {
    pub local: LocalId,
    pub size: u32,
    pub alignment: u32,
    pub offset: u32,
}

/// Compile-time-required or hinted work-group dimensions.
pub type WorkGroupSize = (u32, u32, u32);

/// A named kernel or helper function.
pub struct Method {
    pub name: String,
    pub is_kernel: bool,
    pub params: Vec<Parameter>,
    blocks: Vec<BasicBlock>,
    block_index: HashMap<String, usize>,
    locals: SlotMap<LocalId, Local>,
    pub stack_allocations: Vec<StackAllocation>,
    pub required_work_group_size: Option<WorkGroupSize>,
    pub work_group_size_hint: Option<WorkGroupSize>,
    local_name_counters: HashMap<String, u32>,
}

impl Method {
    pub fn new(name: impl Into<String>, is_kernel: bool) -> Method {
        let mut method = Method {
            name: name.into(),
            is_kernel,
            params: Vec::new(),
            blocks: Vec::new(),
            block_index: HashMap::new(),
            locals: SlotMap::with_key(),
            stack_allocations: Vec::new(),
            required_work_group_size: None,
            work_group_size_hint: None,
            local_name_counters: HashMap::new(),
        };
        method.add_block("entry");
        method
    }

    /// Registers a fresh local named `"<name_prefix>.<n>"` where `n` disambiguates
    /// repeated prefixes, mirroring `Method::addNewLocal`.
    pub fn add_new_local(&mut self, ty: DataType, name_prefix: &str) -> LocalId {
        let counter = self.local_name_counters.entry(name_prefix.to_string()).or_insert(0);
        let name = format!("%{}.{}", name_prefix, counter);
        *counter += 1;
        self.locals.insert(Local::new(name, ty))
    }

    pub fn add_parameter(&mut self, name: impl Into<String>, ty: DataType, decorations: ParameterDecorations) -> LocalId {
        let name = name.into();
        let local = self.locals.insert(Local::new(format!("%{}", name), ty.clone()));
        self.params.push(Parameter {
            name,
            ty,
            decorations,
            local,
        });
        local
    }

    pub fn add_block(&mut self, label: impl Into<String>) -> usize {
        let label = label.into();
        let index = self.blocks.len();
        self.block_index.insert(label.clone(), index);
        self.blocks.push(BasicBlock::new(label));
        index
    }

    pub fn block_index(&self, label: &str) -> Option<usize> {
        self.block_index.get(label).copied()
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [BasicBlock] {
        &mut self.blocks
    }

    pub fn block(&self, index: usize) -> &BasicBlock {
        &self.blocks[index]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut BasicBlock {
        &mut self.blocks[index]
    }

    pub fn entry_block_index(&self) -> usize {
        0
    }

    pub fn locals(&self) -> &SlotMap<LocalId, Local> {
        &self.locals
    }

    pub fn local(&self, id: LocalId) -> Option<&Local> {
        self.locals.get(id)
    }

    pub fn local_mut(&mut self, id: LocalId) -> Option<&mut Local> {
        self.locals.get_mut(id)
    }

    pub fn find_local_by_name(&self, name: &str) -> Option<LocalId> {
        self.locals.iter().find(|(_, l)| l.name == name).map(|(id, _)| id)
    }

    /// Hooks instruction insertion into the use-def bookkeeping: called by
    /// [`InstructionWalker`](crate::walker::InstructionWalker) right after an instruction
    /// is placed into one of this method's blocks.
    pub(crate) fn hook_insert(&mut self, block_index: usize, key: InstKey) {
        let used = self.blocks[block_index]
            .get(key)
            .expect("freshly inserted instruction must be present")
            .locals_used();
        for (id, role) in used {
            if let Some(local) = self.locals.get_mut(id) {
                match role {
                    LocalRole::Read => local.add_reader(key),
                    LocalRole::Write => local.add_writer(key),
                }
            }
        }
    }

    /// Hooks instruction removal: called with the instruction that was just removed (and
    /// its former key) so that readers/writers can be un-recorded.
    pub(crate) fn hook_remove(&mut self, removed: &Instruction, key: InstKey) {
        for (id, role) in removed.locals_used() {
            if let Some(local) = self.locals.get_mut(id) {
                match role {
                    LocalRole::Read => local.remove_reader(key),
                    LocalRole::Write => local.remove_writer(key),
                }
            }
        }
    }
}
