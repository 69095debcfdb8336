//! Macro template storage and textual substitution. A macro is an ordered
//! token list with parameter placeholders; expansion splices the invocation's
//! argument token groups in for each placeholder occurrence (spec.md §3,
//! §4.2, Glossary "Macro expansion as token-tree substitution").

use crate::token::{Location, Token, TokenKind};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Token>,
    pub location: Location,
}

impl MacroDef {
    /// Hygienic parameter substitution: only `Identifier` tokens in the body
    /// that exactly match a declared parameter name are replaced by that
    /// parameter's argument tokens. Everything else in the body — including
    /// identifiers that happen to collide with names visible at the call
    /// site — passes through untouched, so the substitution can never
    /// accidentally capture an unrelated binding.
    pub fn expand(&self, args: &[Vec<Token>]) -> Vec<Token> {
        let mut out = Vec::with_capacity(self.body.len());
        for token in &self.body {
            if let TokenKind::Identifier(name) = &token.kind {
                if let Some(slot) = self.params.iter().position(|p| p == name) {
                    if let Some(arg_tokens) = args.get(slot) {
                        out.extend(arg_tokens.iter().cloned());
                        continue;
                    }
                }
            }
            out.push(token.clone());
        }
        out
    }
}

#[derive(Debug, Default)]
pub struct MacroTable {
    public: FxHashMap<String, MacroDef>,
    private: FxHashMap<String, MacroDef>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Err(existing_location)` if `name` is already bound in
    /// either visibility tier within this package.
    pub fn define(&mut self, def: MacroDef, public: bool) -> Result<(), Location> {
        if let Some(existing) = self.private.get(&def.name).or_else(|| self.public.get(&def.name)) {
            return Err(existing.location);
        }
        if public {
            self.public.insert(def.name.clone(), def);
        } else {
            self.private.insert(def.name.clone(), def);
        }
        Ok(())
    }

    /// Package-local lookup sees both private and public macros.
    pub fn lookup(&self, name: &str) -> Option<&MacroDef> {
        self.private.get(name).or_else(|| self.public.get(name))
    }

    /// Lookup as seen from a dependent package: only public macros.
    pub fn lookup_public(&self, name: &str) -> Option<&MacroDef> {
        self.public.get(name)
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

    fn ident(name: &str) -> Token {
        Token::new(TokenKind::Identifier(name.into()), loc())
    }

    #[test]
    fn expand_substitutes_matching_params_only() {
        let def = MacroDef {
            name: "wrap".into(),
            params: vec!["x".into()],
            body: vec![ident("before"), ident("x"), ident("after")],
            location: loc(),
        };
        let expanded = def.expand(&[vec![ident("42")]]);
        assert_eq!(expanded.len(), 3);
        assert!(matches!(&expanded[1].kind, TokenKind::Identifier(n) if n == "42"));
    }

    #[test]
    fn define_rejects_duplicate_name() {
        let mut table = MacroTable::new();
        let def = MacroDef {
            name: "m".into(),
            params: vec![],
            body: vec![],
            location: loc(),
        };
        assert!(table.define(def.clone(), false).is_ok());
        assert!(table.define(def, true).is_err());
    }
}
