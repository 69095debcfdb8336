//! Checked expressions: every node carries its resolved [`TypeId`] once body
//! checking (spec.md §4.5.4) assigns one, so MIR lowering never has to infer
//! anything.

use crate::ast::{BinaryOp, Literal, UnaryOp};
use crate::checked::data_type::TypeId;
use crate::checked::scope::SymbolId;
use crate::token::Location;

#[derive(Debug, Clone)]
pub enum CheckedCallArg {
    Positional(CheckedExpr),
    Named(String, CheckedExpr),
}

#[derive(Debug, Clone)]
pub enum CheckedCall {
    /// `global_name` is the monomorphized signature's callee key (spec.md
    /// §4.5.4) — identical to `name` for a non-generic function.
    Fun { global_name: String, args: Vec<CheckedCallArg> },
    FunSys { name: String, args: Vec<CheckedCallArg> },
    FunBuiltin { name: String, args: Vec<CheckedCallArg> },
    Len(Box<CheckedExpr>),
    Record { name: String, fields: Vec<(String, CheckedExpr)> },
    Variant { name: String, variant: String, args: Vec<CheckedCallArg> },
    Method { base: Box<CheckedExpr>, name: String, args: Vec<CheckedCallArg> },
}

#[derive(Debug, Clone)]
pub enum CheckedExprKind {
    Literal(Literal),
    Identifier(SymbolId),
    /// A name the scope walk could not resolve; already reported.
    UnresolvedIdentifier(String),
    Call(CheckedCall),
    Binary { op: BinaryOp, left: Box<CheckedExpr>, right: Box<CheckedExpr> },
    Unary { op: UnaryOp, operand: Box<CheckedExpr> },
    FieldAccess { base: Box<CheckedExpr>, field: String },
    Cast { expr: Box<CheckedExpr>, to: TypeId },
    Tuple(Vec<CheckedExpr>),
    Array(Vec<CheckedExpr>),
    Lambda { params: Vec<TypeId>, body: Box<CheckedExpr> },
}

#[derive(Debug, Clone)]
pub struct CheckedExpr {
    pub kind: CheckedExprKind,
    pub ty: TypeId,
    pub location: Location,
}

impl CheckedExpr {
    pub fn new(kind: CheckedExprKind, ty: TypeId, location: Location) -> Self {
        CheckedExpr { kind, ty, location }
    }
}
