//! Checked declaration shells (spec.md §4.5.1/§4.5.2): one entry per AST
//! declaration, carrying a resolved signature list instead of surface
//! syntax. A function or type's "original" signature is always
//! `signatures[0]`; later entries are monomorphizations pushed by body
//! checking (spec.md §4.5.4).

use crate::checked::data_type::TypeId;
use crate::checked::scope::SymbolId;
use crate::checked::stmt::CheckedStmt;
use crate::token::Location;

#[derive(Debug, Clone)]
pub struct CheckedFunSignature {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    /// The serialized global name the MIR generator uses as this
    /// signature's callee key: the base global name for the original
    /// signature, `base$T1$T2…` for a monomorphization.
    pub global_name: String,
}

#[derive(Debug, Clone)]
pub struct CheckedFun {
    pub name: String,
    pub global_name: String,
    pub symbol: SymbolId,
    pub generics: Vec<String>,
    pub signatures: Vec<CheckedFunSignature>,
    /// Parameter symbols in declaration order, aligned 1:1 with
    /// `signatures[0].params` — MIR generation binds each to its entry
    /// block's incoming register.
    pub param_symbols: Vec<SymbolId>,
    pub can_raise: bool,
    pub raised_errors: Vec<TypeId>,
    pub body: Vec<CheckedStmt>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum CheckedTypeBody {
    Record(Vec<(String, TypeId)>),
    Enum(Vec<(String, Option<TypeId>)>),
    Alias(TypeId),
}

#[derive(Debug, Clone)]
pub struct CheckedTypeDecl {
    pub name: String,
    pub symbol: SymbolId,
    pub generics: Vec<String>,
    pub body: CheckedTypeBody,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct CheckedObjectDecl {
    pub name: String,
    pub symbol: SymbolId,
    pub generics: Vec<String>,
    pub implements: Vec<String>,
    pub attributes: Vec<(String, TypeId)>,
    pub methods: Vec<CheckedFun>,
    pub is_trait: bool,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct CheckedErrorDecl {
    pub name: String,
    pub symbol: SymbolId,
    pub payload: Option<TypeId>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct CheckedConstantDecl {
    pub name: String,
    pub symbol: SymbolId,
    pub ty: TypeId,
    pub value: crate::checked::expr::CheckedExpr,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub struct CheckedModuleDecl {
    pub name: String,
    pub symbol: SymbolId,
    pub decls: Vec<CheckedDecl>,
    pub location: Location,
}

#[derive(Debug, Clone)]
pub enum CheckedDecl {
    Fun(CheckedFun),
    Type(CheckedTypeDecl),
    Object(CheckedObjectDecl),
    Error(CheckedErrorDecl),
    Constant(CheckedConstantDecl),
    Module(CheckedModuleDecl),
}
