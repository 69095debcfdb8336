//! Basic blocks and terminators (spec.md §4.6). Every block ends in exactly
//! one terminator; `jmp`/`jmpcond`/`switch` targets are [`BlockId`]s that
//! must exist somewhere in the owning function by the time generation
//! finishes (a pending-block table absorbs forward references while the
//! generator is still walking the checked tree).

use crate::mir::inst::MirInst;
use crate::mir::value::{BlockId, MirOperand};

#[derive(Debug, Clone, PartialEq)]
pub enum MirTerminator {
    Jmp(BlockId),
    JmpCond { condition: MirOperand, then_block: BlockId, else_block: BlockId },
    Switch { discriminant: MirOperand, cases: Vec<(MirOperand, BlockId)>, default: BlockId },
    Ret(Option<MirOperand>),
    /// A branch the analyzer should have made statically unreachable; if
    /// the generator ever has to emit one, that's an analyzer bug (spec.md
    /// §7's MIR taxonomy entry), not a user-facing error.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirBlock {
    pub id: BlockId,
    pub insts: Vec<MirInst>,
    pub terminator: MirTerminator,
}

impl MirBlock {
    pub fn new(id: BlockId) -> Self {
        MirBlock { id, insts: Vec::new(), terminator: MirTerminator::Unreachable }
    }
}
