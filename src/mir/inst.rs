//! MIR instructions: one register-producing operation each, addressed by a
//! monotonic [`RegId`] within its function (spec.md §4.6's self-consistency
//! contract: every `reg(id)` resolves to a preceding instruction).

use crate::mir::value::{MirOperand, MirType, MirValue, RegId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    FAdd,
    Sub,
    FSub,
    Mul,
    FMul,
    SDiv,
    UDiv,
    FDiv,
    SRem,
    URem,
    FRem,
    CmpEq,
    FCmpEq,
    CmpNe,
    FCmpNe,
    CmpLt,
    UCmpLt,
    FCmpLt,
    CmpLe,
    UCmpLe,
    FCmpLe,
    CmpGt,
    UCmpGt,
    FCmpGt,
    CmpGe,
    UCmpGe,
    FCmpGe,
    And,
    Or,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    FNeg,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MirInstKind {
    Val(MirValue),
    BinOp { op: BinOp, left: MirOperand, right: MirOperand },
    UnOp { op: UnOp, operand: MirOperand },
    /// `callee` is already the resolved global name
    /// (`get_fun_name_from_types`, spec.md §4.6); monomorphization happened
    /// in the analyzer.
    Call { callee: String, args: Vec<MirOperand> },
    Struct { fields: Vec<MirOperand> },
    Array { elements: Vec<MirOperand> },
    GetField { base: MirOperand, indices: Vec<u32> },
    GetArray { base: MirOperand, index: MirOperand },
    GetPtr { base: MirOperand },
    Load { ptr: MirOperand },
    Store { ptr: MirOperand, value: MirOperand },
    Cast { value: MirOperand, to: MirType },
    /// Tests a `result{tag, ...}` value's tag for the `ok` arm, used by
    /// `try`/`catch` lowering ahead of a `jmpcond`.
    IsOk { value: MirOperand },
    /// Extracts the `ok`/`err` payload of a `result` value once its tag is
    /// known.
    UnwrapResult { value: MirOperand, is_ok: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirInst {
    pub id: RegId,
    pub kind: MirInstKind,
    pub ty: MirType,
}
