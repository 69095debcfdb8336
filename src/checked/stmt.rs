//! Checked statements: structurally close to [`crate::ast::AstStmt`], but
//! `match` has already been rewritten into `switch` wherever the analyzer
//! chose `use_switch = true` (spec.md §4.5.6), and every binding carries its
//! resolved [`SymbolId`]/[`TypeId`].

use crate::checked::data_type::TypeId;
use crate::checked::expr::CheckedExpr;
use crate::checked::pattern::SwitchCase;
use crate::checked::scope::SymbolId;
use crate::token::Location;

#[derive(Debug, Clone)]
pub struct CheckedIfBranch {
    pub condition: CheckedExpr,
    pub body: Vec<CheckedStmt>,
}

#[derive(Debug, Clone)]
pub enum CheckedStmtKind {
    Block(Vec<CheckedStmt>),
    Break,
    Next,
    Drop(CheckedExpr),
    Defer(Box<CheckedStmt>),
    Return(Option<CheckedExpr>),
    Raise(CheckedExpr),
    Await(CheckedExpr),
    Unsafe(Vec<CheckedStmt>),
    Asm { template: String, operands: Vec<CheckedExpr> },
    If { branches: Vec<CheckedIfBranch>, else_body: Option<Vec<CheckedStmt>> },
    /// Every `match`/`switch` in the checked tree is a `Switch`: the
    /// analyzer either rewrote a `match` into one case set, or this was
    /// already a surface `switch`.
    Switch { scrutinee: CheckedExpr, case: SwitchCase, default: Option<Vec<CheckedStmt>> },
    For { binding: SymbolId, iterable: CheckedExpr, body: Vec<CheckedStmt> },
    Try { body: Vec<CheckedStmt>, catch_binding: Option<SymbolId>, catch_body: Vec<CheckedStmt> },
    Variable { symbol: SymbolId, ty: TypeId, value: Option<CheckedExpr> },
    Expr(CheckedExpr),
}

#[derive(Debug, Clone)]
pub struct CheckedStmt {
    pub kind: CheckedStmtKind,
    pub location: Location,
}

impl CheckedStmt {
    pub fn new(kind: CheckedStmtKind, location: Location) -> Self {
        CheckedStmt { kind, location }
    }
}
