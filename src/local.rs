//! SSA-like named locations belonging to a [`Method`](crate::Method).

use crate::block::InstKey;
use crate::types::DataType;
use std::collections::HashSet;

slotmap::new_key_type! {
    /// Stable identity of a [`Local`] within the `Method` that owns it.
    ///
    /// A generational arena key plays the role the original design's "address serves as
    /// identity" comment implies a raw pointer would: it is `Copy`, remains valid as the
    /// locals pool grows, and is the only way other structures (instruction arguments,
    /// use-def sets) ever refer to a local.
    pub struct LocalId;
}

/// A back-reference recording that this local's value is derived from `base` by applying
/// (at least) the given index - used to propagate parameter identity through pointer and
/// struct GEP chains.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct LocalReference {
    pub base: LocalId,
    pub index: i64,
}

/// A named, typed location. Locals are never copied or removed once registered in a
/// method's pool; `Method::add_new_local` is the only constructor.
#[derive(Clone, Debug)]
pub struct Local {
    pub name: String,
    pub ty: DataType,
    pub reference: Option<LocalReference>,
    readers: HashSet<InstKey>,
    writers: HashSet<InstKey>,
}

impl Local {
    pub(crate) fn new(name: String, ty: DataType) -> Local {
        Local {
            name,
            ty,
            reference: None,
            readers: HashSet::new(),
            writers: HashSet::new(),
        }
    }

    pub fn readers(&self) -> impl Iterator<Item = InstKey> + '_ {
        self.readers.iter().copied()
    }

    pub fn writers(&self) -> impl Iterator<Item = InstKey> + '_ {
        self.writers.iter().copied()
    }

    pub fn has_single_writer(&self) -> bool {
        self.writers.len() == 1
    }

    pub(crate) fn add_reader(&mut self, inst: InstKey) {
        self.readers.insert(inst);
    }

    pub(crate) fn remove_reader(&mut self, inst: InstKey) {
        self.readers.remove(&inst);
    }

    pub(crate) fn add_writer(&mut self, inst: InstKey) {
        self.writers.insert(inst);
    }

    pub(crate) fn remove_writer(&mut self, inst: InstKey) {
        self.writers.remove(&inst);
    }
}
