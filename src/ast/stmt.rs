//! `AstStmt`: statements, grounded in `parser/ast/stmt.c`'s `LilyAstStmtKind`
//! variant set (Asm, Await, Block, Break, Defer, Drop, For, If, Match, Next,
//! Raise, Return, Try, Unsafe, Variable, While).

use crate::ast::data_type::AstDataType;
use crate::ast::expr::AstExpr;
use crate::ast::pattern::AstPattern;
use crate::token::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: AstPattern,
    pub guard: Option<AstExpr>,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub pattern: AstPattern,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfBranch {
    pub condition: AstExpr,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstStmtKind {
    Asm { template: String, operands: Vec<AstExpr> },
    Await(AstExpr),
    Block(Vec<AstStmt>),
    Break,
    Defer(Box<AstStmt>),
    Drop(AstExpr),
    For { pattern: AstPattern, iterable: AstExpr, body: Vec<AstStmt> },
    If { branches: Vec<IfBranch>, else_body: Option<Vec<AstStmt>> },
    Match { scrutinee: AstExpr, arms: Vec<MatchArm> },
    Switch { scrutinee: AstExpr, cases: Vec<SwitchCase>, default: Option<Vec<AstStmt>> },
    Next,
    Raise(AstExpr),
    Return(Option<AstExpr>),
    Try { body: Vec<AstStmt>, catch_pattern: Option<AstPattern>, catch_body: Vec<AstStmt> },
    Unsafe(Vec<AstStmt>),
    Variable { name: String, mutable: bool, ty: Option<AstDataType>, value: Option<AstExpr> },
    Expr(AstExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstStmt {
    pub kind: AstStmtKind,
    pub location: Location,
}

impl AstStmt {
    pub fn new(kind: AstStmtKind, location: Location) -> Self {
        AstStmt { kind, location }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::expr::{AstExprKind, Literal};
    use crate::token::{Position, SourceFileId};

    fn loc() -> Location {
        let p = Position::default();
        Location::new(SourceFileId(0), p, p)
    }

    #[test]
    fn if_without_else_leaves_else_body_none() {
        let cond = AstExpr::new(AstExprKind::Literal(Literal::Bool(true)), loc());
        let stmt = AstStmt::new(
            AstStmtKind::If { branches: vec![IfBranch { condition: cond, body: vec![] }], else_body: None },
            loc(),
        );
        match stmt.kind {
            AstStmtKind::If { else_body, .. } => assert!(else_body.is_none()),
            _ => panic!("expected if statement"),
        }
    }

    #[test]
    fn return_with_no_value_carries_none() {
        let stmt = AstStmt::new(AstStmtKind::Return(None), loc());
        assert_eq!(stmt.kind, AstStmtKind::Return(None));
    }
}
