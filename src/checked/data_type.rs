//! Canonical, fully-resolved type representation (spec.md §4.5.3). Every
//! `CheckedDataType` is interned and addressed by [`TypeId`] the way the
//! teacher's `hir::hir_datatypes::TypeContext` interns `HirType`s — no AST
//! residue, no surface syntax, one entry per distinct shape.

use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckedArrayKind {
    Dynamic,
    MultiPointers,
    Sized(u64),
    Undetermined,
}

/// One surviving candidate of an unresolved operator-overload choice
/// (spec.md §4.5.4): a (left, right) operand pair mapped to the return type
/// that candidate signature would produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChoiceCondition {
    pub left: TypeId,
    pub right: TypeId,
    pub result: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CheckedDataTypeKind {
    Any,
    Bool,
    Byte,
    Bytes,
    Char,
    Str,
    Unit,
    Never,
    Int8,
    Int16,
    Int32,
    Int64,
    Isize,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Usize,
    Float32,
    Float64,
    Cshort,
    Cushort,
    Cint,
    Cuint,
    Clong,
    Culong,
    Clonglong,
    Culonglong,
    Cfloat,
    Cdouble,
    Cstr,
    Cvoid,

    Array(CheckedArrayKind, TypeId),
    Ref(TypeId),
    Ptr(TypeId),
    Trace(TypeId),
    Mut(TypeId),
    List(TypeId),
    Optional(TypeId),
    Tuple(Vec<TypeId>),
    Result { ok: TypeId, errs: Vec<TypeId> },
    /// A resolved custom name (record/enum/object), with its generic
    /// arguments already substituted.
    Custom { name: String, generics: Vec<TypeId> },
    Lambda { params: Vec<TypeId>, return_type: TypeId },
    /// A reference to the enclosing declaration's Nth generic parameter,
    /// bound to a concrete type once that declaration is monomorphized.
    Generic(String),
    /// Still-unconstrained operand slot in an overloaded operator call; the
    /// choice set is resolved once both operand types (or context) are known.
    CompilerChoice(Vec<ChoiceCondition>),
    /// A name the scope walk could not resolve, or a malformed surface type.
    /// Analysis that touches this sentinel must already have reported an
    /// error at the point it was produced.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckedDataType {
    pub kind: CheckedDataTypeKind,
}

#[derive(Debug, Default)]
pub struct CheckedTypeTable {
    types: Vec<CheckedDataType>,
    by_kind: HashMap<CheckedDataTypeKind, TypeId>,
}

impl CheckedTypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `kind`, returning the existing [`TypeId`] if an identical
    /// shape was already inserted.
    pub fn intern(&mut self, kind: CheckedDataTypeKind) -> TypeId {
        if let Some(&existing) = self.by_kind.get(&kind) {
            return existing;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(CheckedDataType { kind: kind.clone() });
        self.by_kind.insert(kind, id);
        id
    }

    pub fn get(&self, id: TypeId) -> &CheckedDataType {
        &self.types[id.0 as usize]
    }

    pub fn is_unknown(&self, id: TypeId) -> bool {
        matches!(self.get(id).kind, CheckedDataTypeKind::Unknown)
    }

    pub fn is_compiler_choice(&self, id: TypeId) -> bool {
        matches!(self.get(id).kind, CheckedDataTypeKind::CompilerChoice(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_the_same_shape_twice_returns_the_same_id() {
        let mut table = CheckedTypeTable::new();
        let a = table.intern(CheckedDataTypeKind::Int32);
        let b = table.intern(CheckedDataTypeKind::Int32);
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_shapes_get_distinct_ids() {
        let mut table = CheckedTypeTable::new();
        let i32_id = table.intern(CheckedDataTypeKind::Int32);
        let array_id = table.intern(CheckedDataTypeKind::Array(CheckedArrayKind::Dynamic, i32_id));
        assert_ne!(i32_id, array_id);
    }
}
