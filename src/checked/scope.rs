//! Scope graph for declaration registration and name resolution (spec.md
//! §4.5.1/§4.5.3). A stack of name -> [`SymbolId`] maps, the same shape as
//! the teacher's `hir::variable_manager::VariableManager` scope stack, but
//! generalized to every declaration kind instead of only local variables.

use crate::checked::data_type::TypeId;
use crate::token::Location;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Function,
    Type,
    Object,
    Error,
    Constant,
    Variable { mutable: bool },
    GenericParam,
    Module,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Option<TypeId>,
    pub location: Location,
}

#[derive(Debug, Default)]
pub struct ScopeGraph {
    symbols: Vec<Symbol>,
    scopes: Vec<HashMap<String, SymbolId>>,
}

impl ScopeGraph {
    pub fn new() -> Self {
        ScopeGraph { symbols: Vec::new(), scopes: vec![HashMap::new()] }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the root scope");
        self.scopes.pop();
    }

    /// Declares `name` in the innermost scope. Returns `Err` with the
    /// previously-declared symbol's location if `name` is already bound in
    /// that same scope (spec.md §4.5.1's same-name-same-kind conflict rule
    /// is enforced by the caller, which decides whether same-kind matters).
    pub fn declare(&mut self, name: impl Into<String>, kind: SymbolKind, ty: Option<TypeId>, location: Location) -> Result<SymbolId, Location> {
        let name = name.into();
        if let Some(&existing) = self.scopes.last().unwrap().get(&name) {
            return Err(self.symbols[existing.0 as usize].location);
        }
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { name: name.clone(), kind, ty, location });
        self.scopes.last_mut().unwrap().insert(name, id);
        Ok(id)
    }

    /// Walks from the innermost scope outward, returning the first binding
    /// found.
    pub fn resolve(&self, name: &str) -> Option<SymbolId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return Some(id);
            }
        }
        None
    }

    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
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

    #[test]
    fn inner_scope_shadows_outer_declaration() {
        let mut scope = ScopeGraph::new();
        let outer = scope.declare("x", SymbolKind::Variable { mutable: false }, None, loc()).unwrap();
        scope.push_scope();
        let inner = scope.declare("x", SymbolKind::Variable { mutable: true }, None, loc()).unwrap();
        assert_eq!(scope.resolve("x"), Some(inner));
        scope.pop_scope();
        assert_eq!(scope.resolve("x"), Some(outer));
    }

    #[test]
    fn redeclaring_in_the_same_scope_reports_the_prior_location() {
        let mut scope = ScopeGraph::new();
        scope.declare("f", SymbolKind::Function, None, loc()).unwrap();
        assert!(scope.declare("f", SymbolKind::Function, None, loc()).is_err());
    }
}
