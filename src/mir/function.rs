//! A single lowered function: one per [`crate::checked::CheckedFunSignature`]
//! that body checking actually instantiated (spec.md §4.5.4's
//! monomorphization feeds spec.md §4.6's "one top-level instruction per
//! declaration" directly — one `MirFunction` per concrete signature).

use crate::mir::block::MirBlock;
use crate::mir::value::{BlockId, MirType, RegId};

#[derive(Debug, Clone)]
pub struct MirParam {
    pub reg: RegId,
    pub ty: MirType,
}

#[derive(Debug, Clone)]
pub struct MirFunction {
    pub global_name: String,
    pub params: Vec<MirParam>,
    pub return_type: MirType,
    pub blocks: Vec<MirBlock>,
    pub can_raise: bool,
}

impl MirFunction {
    pub fn block(&self, id: BlockId) -> Option<&MirBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut MirBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }
}

/// A callee the module doesn't define locally — external, `sys`, or
/// `builtin` — registered idempotently so two call sites naming the same
/// callee don't produce two prototypes (spec.md §4.6's `key_is_unique`
/// check).
#[derive(Debug, Clone, PartialEq)]
pub struct FunPrototype {
    pub global_name: String,
    pub params: Vec<MirType>,
    pub return_type: MirType,
}
