//! `AstPattern`: match/switch/destructuring patterns, grounded in
//! `src/core/lily/ast/pattern.c`'s `LilyAstPattern` variant set.

use crate::ast::expr::Literal;
use crate::token::Location;

#[derive(Debug, Clone, PartialEq)]
pub enum AstPatternKind {
    Array(Vec<AstPattern>),
    As { pattern: Box<AstPattern>, name: String },
    AutoComplete,
    Wildcard,
    Exception { name: Option<String>, pattern: Box<AstPattern> },
    List(Vec<AstPattern>),
    Literal(Literal),
    Name(String),
    Range { from: Box<AstPattern>, to: Box<AstPattern> },
    RecordCall { name: String, fields: Vec<(String, AstPattern)> },
    Tuple(Vec<AstPattern>),
    VariantCall { name: String, variant: String, args: Vec<AstPattern> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstPattern {
    pub kind: AstPatternKind,
    pub location: Location,
}

impl AstPattern {
    pub fn new(kind: AstPatternKind, location: Location) -> Self {
        AstPattern { kind, location }
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
    fn as_pattern_wraps_an_inner_pattern() {
        let inner = AstPattern::new(AstPatternKind::Name("x".into()), loc());
        let as_pattern = AstPattern::new(
            AstPatternKind::As { pattern: Box::new(inner), name: "bound".into() },
            loc(),
        );
        match as_pattern.kind {
            AstPatternKind::As { name, .. } => assert_eq!(name, "bound"),
            _ => panic!("expected as-pattern"),
        }
    }
}
