//! A position-stable cursor over a method's instructions.
//!
//! Holding a walker across an insertion or removal elsewhere in the same block never
//! invalidates it: positions are [`InstKey`]s into the block's arena, not indices, so they
//! stay valid under every mutation this module performs.

use crate::block::InstKey;
use crate::instruction::Instruction;
use crate::method::Method;

/// A cursor positioned at a specific instruction within a specific block of a method.
pub struct InstructionWalker<'a> {
    method: &'a mut Method,
    block_index: usize,
    current: Option<InstKey>,
}

impl<'a> InstructionWalker<'a> {
    pub fn at_block_start(method: &'a mut Method, block_index: usize) -> InstructionWalker<'a> {
        let current = method.block(block_index).first_key();
        InstructionWalker {
            method,
            block_index,
            current,
        }
    }

    pub fn at(method: &'a mut Method, block_index: usize, key: InstKey) -> InstructionWalker<'a> {
        InstructionWalker {
            method,
            block_index,
            current: Some(key),
        }
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    /// Registers a fresh local in the underlying method, for lowering helpers that need a
    /// scratch value without threading a separate `&mut Method` alongside the cursor.
    pub fn new_local(&mut self, ty: crate::types::DataType, name_prefix: &str) -> crate::local::LocalId {
        self.method.add_new_local(ty, name_prefix)
    }

    pub fn method(&self) -> &Method {
        self.method
    }

    pub fn method_mut(&mut self) -> &mut Method {
        self.method
    }

    pub fn key(&self) -> Option<InstKey> {
        self.current
    }

    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// The instruction at the current position, or `None` if the cursor has run off the
    /// end of the block.
    pub fn get(&self) -> Option<&Instruction> {
        self.current.and_then(|key| self.method.block(self.block_index).get(key))
    }

    pub fn get_mut(&mut self) -> Option<&mut Instruction> {
        let key = self.current?;
        self.method.block_mut(self.block_index).get_mut(key)
    }

    /// Inserts `instruction` at the cursor's position, pushing whatever instruction was
    /// there (if any) one step forward. The cursor keeps pointing at the new instruction.
    pub fn emplace(&mut self, instruction: Instruction) -> InstKey {
        let key = match self.current {
            Some(at) => self.method.block_mut(self.block_index).insert_before(at, instruction),
            None => self.method.block_mut(self.block_index).push_back(instruction),
        };
        self.method.hook_insert(self.block_index, key);
        self.current = Some(key);
        key
    }

    /// Replaces the instruction at the cursor's position in place, keeping the same key.
    pub fn reset(&mut self, instruction: Instruction) -> Instruction {
        let key = self.current.expect("reset called on an end-of-block cursor");
        let old = self.method.block_mut(self.block_index).replace(key, instruction);
        self.method.hook_remove(&old, key);
        self.method.hook_insert(self.block_index, key);
        old
    }

    /// Removes the instruction at the cursor's position, leaving the cursor at the
    /// instruction that followed it (or at end-of-block).
    pub fn erase(&mut self) -> Instruction {
        let key = self.current.expect("erase called on an end-of-block cursor");
        let (removed, next) = self.method.block_mut(self.block_index).remove(key);
        self.method.hook_remove(&removed, key);
        self.current = next;
        removed
    }

    /// Moves forward within the current block only; returns `false` (leaving the cursor at
    /// end-of-block) when there is no next instruction in this block.
    pub fn next_in_block(&mut self) -> bool {
        match self.current {
            Some(key) => {
                self.current = self.method.block(self.block_index).next_key(key);
                self.current.is_some()
            }
            None => false,
        }
    }

    /// Moves backward within the current block only.
    pub fn previous_in_block(&mut self) -> bool {
        match self.current {
            Some(key) => {
                let prev = self.method.block(self.block_index).prev_key(key);
                if prev.is_some() {
                    self.current = prev;
                    true
                } else {
                    false
                }
            }
            None => {
                let last = self.method.block(self.block_index).last_key();
                self.current = last;
                last.is_some()
            }
        }
    }

    /// Moves forward, crossing into the next block once the current one is exhausted.
    /// Returns `false` once the cursor has run past the method's last block.
    pub fn next(&mut self) -> bool {
        if self.next_in_block() {
            return true;
        }
        while self.block_index + 1 < self.method.blocks().len() {
            self.block_index += 1;
            self.current = self.method.block(self.block_index).first_key();
            if self.current.is_some() {
                return true;
            }
        }
        false
    }
}
