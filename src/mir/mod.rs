//! Mid-level IR (spec.md §4.6): a block/terminator/register model lowered
//! from the checked tree, aimed squarely at an LLVM backend rather than the
//! teacher's WASM target. No borrow checking happens at this layer.

pub(crate) mod block;
pub(crate) mod debug_info;
pub(crate) mod function;
pub(crate) mod generator;
pub(crate) mod inst;
pub(crate) mod module;
pub(crate) mod value;

pub use block::{MirBlock, MirTerminator};
pub use debug_info::{
    DebugInfoBlock, DebugInfoCompositeType, DebugInfoDerivedType, DebugInfoElements, DebugInfoEncoding, DebugInfoEnumerator,
    DebugInfoFile, DebugInfoGlobalVariable, DebugInfoId, DebugInfoLocalVariable, DebugInfoLocation, DebugInfoManager, DebugInfoNode,
    DebugInfoSubProgram, DebugInfoTag, DebugInfoType,
};
pub use function::{FunPrototype, MirFunction, MirParam};
pub use generator::generate_package;
pub use inst::{BinOp, MirInst, MirInstKind, UnOp};
pub use module::MirModule;
pub use value::{BlockId, MirOperand, MirType, MirValue, RegId};
