//! An ordered container of instructions, addressed by stable arena keys threaded together
//! with an intrusive prev/next list so that insertion anywhere in the middle never
//! invalidates an outstanding [`InstructionWalker`](crate::walker::InstructionWalker).

use crate::instruction::Instruction;
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable identity of an instruction within the [`BasicBlock`] that owns it.
    pub struct InstKey;
}

struct InstNode {
    prev: Option<InstKey>,
    next: Option<InstKey>,
    data: Instruction,
}

/// An ordered list of instructions with a label and (usually) a terminator at the end.
///
/// Instructions are stored in a `slotmap` arena; order is not the arena's insertion order
/// but an explicit intrusive doubly-linked list (`head`/`tail` plus each node's
/// `prev`/`next`), which is what makes insertion anywhere in the block an O(1),
/// cursor-stable operation.
pub struct BasicBlock {
    pub label: String,
    arena: SlotMap<InstKey, InstNode>,
    head: Option<InstKey>,
    tail: Option<InstKey>,
}

impl BasicBlock {
    pub fn new(label: impl Into<String>) -> BasicBlock {
        BasicBlock {
            label: label.into(),
            arena: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn first_key(&self) -> Option<InstKey> {
        self.head
    }

    pub fn last_key(&self) -> Option<InstKey> {
        self.tail
    }

    pub fn next_key(&self, key: InstKey) -> Option<InstKey> {
        self.arena.get(key).and_then(|n| n.next)
    }

    pub fn prev_key(&self, key: InstKey) -> Option<InstKey> {
        self.arena.get(key).and_then(|n| n.prev)
    }

    pub fn get(&self, key: InstKey) -> Option<&Instruction> {
        self.arena.get(key).map(|n| &n.data)
    }

    pub fn get_mut(&mut self, key: InstKey) -> Option<&mut Instruction> {
        self.arena.get_mut(key).map(|n| &mut n.data)
    }

    /// Replaces the instruction at `key` in place, returning the instruction it replaced.
    pub fn replace(&mut self, key: InstKey, instruction: Instruction) -> Instruction {
        std::mem::replace(&mut self.arena[key].data, instruction)
    }

    pub fn push_back(&mut self, instruction: Instruction) -> InstKey {
        let key = self.arena.insert(InstNode {
            prev: self.tail,
            next: None,
            data: instruction,
        });
        match self.tail {
            Some(tail) => self.arena[tail].next = Some(key),
            None => self.head = Some(key),
        }
        self.tail = Some(key);
        key
    }

    /// Inserts `instruction` immediately before `at`, returning its new key. The key
    /// previously denoting `at` keeps pointing at the same (unmoved) instruction.
    pub fn insert_before(&mut self, at: InstKey, instruction: Instruction) -> InstKey {
        let prev = self.arena[at].prev;
        let key = self.arena.insert(InstNode {
            prev,
            next: Some(at),
            data: instruction,
        });
        self.arena[at].prev = Some(key);
        match prev {
            Some(p) => self.arena[p].next = Some(key),
            None => self.head = Some(key),
        }
        key
    }

    /// Inserts `instruction` immediately after `at`, returning its new key.
    pub fn insert_after(&mut self, at: InstKey, instruction: Instruction) -> InstKey {
        let next = self.arena[at].next;
        let key = self.arena.insert(InstNode {
            prev: Some(at),
            next,
            data: instruction,
        });
        self.arena[at].next = Some(key);
        match next {
            Some(n) => self.arena[n].prev = Some(key),
            None => self.tail = Some(key),
        }
        key
    }

    /// Removes `key` from the block, returning the removed instruction and the key that a
    /// cursor positioned at `key` should advance to (`None` means block-end).
    pub fn remove(&mut self, key: InstKey) -> (Instruction, Option<InstKey>) {
        let node = self
            .arena
            .remove(key)
            .expect("InstKey must belong to this block");
        match node.prev {
            Some(p) => self.arena[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.arena[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        (node.data, node.next)
    }

    pub fn iter(&self) -> BlockIter {
        BlockIter {
            block: self,
            current: self.head,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = InstKey> + '_ {
        self.iter().map(|(key, _)| key)
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.tail.and_then(|key| self.get(key))
    }
}

pub struct BlockIter<'a> {
    block: &'a BasicBlock,
    current: Option<InstKey>,
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = (InstKey, &'a Instruction);

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.current?;
        self.current = self.block.next_key(key);
        self.block.get(key).map(|ins| (key, ins))
    }
}
