//! Pattern checking and match-to-switch lowering (spec.md §4.5.6).
//!
//! When the analyzer decides a `match` compiles to a `switch`
//! (`use_switch = true`), each [`crate::ast::AstPattern`] becomes one
//! [`SwitchCaseValue`]; adding a case to a [`SwitchCase`] reports which of
//! {Ok, UnusedCase, DuplicateCase} occurred so the caller can warn or error.

use crate::ast::Literal;
use crate::checked::expr::CheckedExpr;
use crate::checked::scope::SymbolId;
use crate::token::Location;

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchCaseValue {
    Constant(Literal),
    Else,
    /// A nested tuple/record/variant destructure: one sub-value per field,
    /// in declaration order.
    Union(Vec<SwitchCaseValue>),
}

#[derive(Debug, Clone)]
pub struct SwitchSubCase {
    pub value: SwitchCaseValue,
    pub binding: Option<SymbolId>,
    pub guard: Option<CheckedExpr>,
    pub body: Vec<crate::checked::stmt::CheckedStmt>,
    pub location: Location,
}

#[derive(Debug, Default)]
pub struct SwitchCase {
    pub sub_cases: Vec<SwitchSubCase>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddCaseResult {
    Ok,
    UnusedCase,
    DuplicateCase,
}

impl SwitchCase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `sub_case`, reporting `DuplicateCase` if an identical value
    /// (ignoring guards) is already present, and `UnusedCase` if a prior
    /// unguarded `Else`/wildcard already makes this one unreachable.
    pub fn add_case(&mut self, sub_case: SwitchSubCase) -> AddCaseResult {
        let shadowed_by_else = self
            .sub_cases
            .iter()
            .any(|existing| matches!(existing.value, SwitchCaseValue::Else) && existing.guard.is_none());
        if shadowed_by_else {
            return AddCaseResult::UnusedCase;
        }

        let is_duplicate = self.sub_cases.iter().any(|existing| existing.value == sub_case.value && existing.guard.is_none() && sub_case.guard.is_none());
        if is_duplicate {
            return AddCaseResult::DuplicateCase;
        }

        self.sub_cases.push(sub_case);
        AddCaseResult::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, SourceFileId};

    fn loc() -> Location {
        let p = Position::default();
        Location::new(SourceFileId(0), p, p)
    }

    fn sub_case(value: SwitchCaseValue) -> SwitchSubCase {
        SwitchSubCase { value, binding: None, guard: None, body: Vec::new(), location: loc() }
    }

    #[test]
    fn duplicate_constant_case_is_rejected() {
        let mut case = SwitchCase::new();
        assert_eq!(case.add_case(sub_case(SwitchCaseValue::Constant(Literal::Bool(true)))), AddCaseResult::Ok);
        assert_eq!(case.add_case(sub_case(SwitchCaseValue::Constant(Literal::Bool(true)))), AddCaseResult::DuplicateCase);
    }

    #[test]
    fn case_after_unguarded_else_is_unused() {
        let mut case = SwitchCase::new();
        assert_eq!(case.add_case(sub_case(SwitchCaseValue::Else)), AddCaseResult::Ok);
        assert_eq!(case.add_case(sub_case(SwitchCaseValue::Constant(Literal::Bool(false)))), AddCaseResult::UnusedCase);
    }
}
