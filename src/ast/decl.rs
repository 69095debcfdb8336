//! `AstDecl`: top-level and nested declarations, grounded in
//! `parser/ast/decl.c`'s `LilyAstDeclKind` (Constant, Error, Fun, Include,
//! Method, Module, Object, Type, Use). `Module`/`Fun`/`Object`/`Type`/
//! `Error`/`Constant` line up with [`crate::preparser::PreparsedKind`];
//! `Include` and `Use` have no preparser counterpart because they only
//! rewrite the token stream the parser consumes, not a named symbol the
//! precompiler's dependency graph needs to see.

use crate::ast::data_type::AstDataType;
use crate::ast::expr::AstExpr;
use crate::ast::stmt::AstStmt;
use crate::token::Location;

#[derive(Debug, Clone, PartialEq)]
pub struct FunParam {
    pub name: String,
    pub ty: Option<AstDataType>,
    pub default: Option<AstExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub params: Vec<FunParam>,
    pub return_type: Option<AstDataType>,
    pub body: Vec<AstStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstantDecl {
    pub name: String,
    pub ty: Option<AstDataType>,
    pub value: AstExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDecl {
    pub name: String,
    pub payload: Option<AstDataType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeBody {
    Record(Vec<(String, AstDataType)>),
    Enum(Vec<(String, Option<AstDataType>)>),
    Alias(AstDataType),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub body: TypeBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectBody {
    Class { attributes: Vec<(String, AstDataType)>, methods: Vec<FunDecl> },
    Trait { method_signatures: Vec<FunDecl> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDecl {
    pub name: String,
    pub generics: Vec<String>,
    pub implements: Vec<String>,
    pub body: ObjectBody,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub object_name: String,
    pub fun: FunDecl,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDecl {
    pub name: String,
    pub decls: Vec<AstDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstDeclKind {
    Constant(ConstantDecl),
    Error(ErrorDecl),
    Fun(FunDecl),
    Include { path: String },
    Method(MethodDecl),
    Module(ModuleDecl),
    Object(ObjectDecl),
    Type(TypeDecl),
    Use { path: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AstDecl {
    pub kind: AstDeclKind,
    pub location: Location,
}

impl AstDecl {
    pub fn new(kind: AstDeclKind, location: Location) -> Self {
        AstDecl { kind, location }
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
    fn module_decl_nests_child_decls() {
        let inner = AstDecl::new(
            AstDeclKind::Constant(ConstantDecl {
                name: "x".into(),
                ty: None,
                value: AstExpr::new(AstExprKind::Literal(Literal::SuffixI32(1)), loc()),
            }),
            loc(),
        );
        let module = AstDecl::new(
            AstDeclKind::Module(ModuleDecl { name: "m".into(), decls: vec![inner] }),
            loc(),
        );
        match module.kind {
            AstDeclKind::Module(m) => assert_eq!(m.decls.len(), 1),
            _ => panic!("expected module decl"),
        }
    }

    #[test]
    fn type_alias_wraps_a_data_type() {
        let aliased = AstDataType::new(crate::ast::data_type::AstDataTypeKind::Int32, loc());
        let decl = TypeDecl { name: "MyInt".into(), generics: vec![], body: TypeBody::Alias(aliased) };
        assert!(matches!(decl.body, TypeBody::Alias(_)));
    }
}
