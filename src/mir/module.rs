//! The generator's output: one `MirModule` per package, self-consistent per
//! spec.md §4.6's contract (every `reg`/`jmp`/`call` target resolves within
//! the module or as a registered prototype).

use crate::mir::debug_info::DebugInfoManager;
use crate::mir::function::{FunPrototype, MirFunction};
use crate::mir::value::MirType;
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MirModule {
    pub functions: Vec<MirFunction>,
    pub fun_prototypes: Vec<FunPrototype>,
    /// Struct layouts referenced by [`MirType::Struct`] keys: records,
    /// collapsed multi-error `result` tagged unions, tuples.
    pub structs: HashMap<String, Vec<MirType>>,
    /// De-duplicating debug-info store (spec.md §3's "plus the debug-info
    /// manager"). Nothing in the generator populates it yet, since emitting
    /// real debug info needs the LLVM backend this pipeline stops short of;
    /// it's here so a backend can intern and query debug-info nodes against
    /// the module it was lowered from.
    pub debug_info: DebugInfoManager,
}

impl MirModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_function(&mut self, function: MirFunction) {
        self.functions.push(function);
    }

    /// Registers `prototype` unless a prototype with the same global name
    /// is already present (`key_is_unique`, spec.md §4.6).
    pub fn register_prototype(&mut self, prototype: FunPrototype) {
        let exists = self.fun_prototypes.iter().any(|p| p.global_name == prototype.global_name)
            || self.functions.iter().any(|f| f.global_name == prototype.global_name);
        if !exists {
            self.fun_prototypes.push(prototype);
        }
    }

    pub fn register_struct(&mut self, name: String, fields: Vec<MirType>) {
        self.structs.entry(name).or_insert(fields);
    }

    pub fn find_function(&self, global_name: &str) -> Option<&MirFunction> {
        self.functions.iter().find(|f| f.global_name == global_name)
    }

    /// Every `reg`, `jmp`/`jmpcond`/`switch` target, and `call` callee
    /// resolves (spec.md §4.6's self-consistency contract, spec.md §8's
    /// universal invariant on MIR functions).
    pub fn is_self_consistent(&self) -> bool {
        self.functions.iter().all(|f| self.function_is_self_consistent(f))
    }

    fn function_is_self_consistent(&self, function: &MirFunction) -> bool {
        use crate::mir::block::MirTerminator;
        use crate::mir::inst::MirInstKind;
        use crate::mir::value::MirOperand;

        let block_exists = |id: crate::mir::value::BlockId| function.block(id).is_some();
        let mut seen_regs: std::collections::HashSet<u32> = std::collections::HashSet::new();

        for block in &function.blocks {
            for inst in &block.insts {
                let operand_ok = |op: &MirOperand| match op {
                    MirOperand::Reg(id) => seen_regs.contains(&id.0),
                    MirOperand::Const(_) => true,
                };
                let ok = match &inst.kind {
                    MirInstKind::Val(_) => true,
                    MirInstKind::BinOp { left, right, .. } => operand_ok(left) && operand_ok(right),
                    MirInstKind::UnOp { operand, .. } => operand_ok(operand),
                    MirInstKind::Call { callee, args } => {
                        args.iter().all(operand_ok)
                            && (self.find_function(callee).is_some() || self.fun_prototypes.iter().any(|p| &p.global_name == callee))
                    }
                    MirInstKind::Struct { fields } => fields.iter().all(operand_ok),
                    MirInstKind::Array { elements } => elements.iter().all(operand_ok),
                    MirInstKind::GetField { base, .. } => operand_ok(base),
                    MirInstKind::GetArray { base, index } => operand_ok(base) && operand_ok(index),
                    MirInstKind::GetPtr { base } => operand_ok(base),
                    MirInstKind::Load { ptr } => operand_ok(ptr),
                    MirInstKind::Store { ptr, value } => operand_ok(ptr) && operand_ok(value),
                    MirInstKind::Cast { value, .. } => operand_ok(value),
                    MirInstKind::IsOk { value } => operand_ok(value),
                    MirInstKind::UnwrapResult { value, .. } => operand_ok(value),
                };
                if !ok {
                    return false;
                }
                seen_regs.insert(inst.id.0);
            }

            let terminator_ok = match &block.terminator {
                MirTerminator::Jmp(target) => block_exists(*target),
                MirTerminator::JmpCond { then_block, else_block, .. } => block_exists(*then_block) && block_exists(*else_block),
                MirTerminator::Switch { cases, default, .. } => cases.iter().all(|(_, t)| block_exists(*t)) && block_exists(*default),
                MirTerminator::Ret(_) | MirTerminator::Unreachable => true,
            };
            if !terminator_ok {
                return false;
            }
        }
        true
    }
}
