//! Driver for semantic analysis (spec.md §4.5): registers every declaration
//! in a [`ScopeGraph`], seeds signatures, resolves surface types to
//! [`TypeId`]s, checks bodies, builds the operator register, lowers `match`
//! to `switch`, and scans for raised exceptions — in that pass order,
//! mirroring the teacher's `hir::hir_builder::HirBuilder` driver shape (one
//! stateful context, one `lower_*` method per node family).

use crate::ast::{
    AstDecl, AstDeclKind, AstExpr, AstExprKind, AstPattern, AstPatternKind, AstStmt, AstStmtKind, BinaryOp, Call,
    CallArg, Literal, ObjectBody, TypeBody, UnaryOp,
};
use crate::ast::data_type::AstDataType;
use crate::checked::data_type::{CheckedArrayKind, CheckedDataTypeKind, CheckedTypeTable, TypeId};
use crate::checked::decl::{
    CheckedConstantDecl, CheckedDecl, CheckedErrorDecl, CheckedFun, CheckedFunSignature, CheckedModuleDecl,
    CheckedObjectDecl, CheckedTypeBody, CheckedTypeDecl,
};
use crate::checked::expr::{CheckedCall, CheckedCallArg, CheckedExpr, CheckedExprKind};
use crate::checked::operator_register::{OperatorRegister, OperatorSignature};
use crate::checked::pattern::{AddCaseResult, SwitchCase, SwitchCaseValue, SwitchSubCase};
use crate::checked::scope::{ScopeGraph, SymbolId, SymbolKind};
use crate::checked::stmt::{CheckedIfBranch, CheckedStmt, CheckedStmtKind};
use crate::diagnostics::errors::{CompilerError, ErrorLocation, ErrorMetaDataKey, ErrorType};
use crate::diagnostics::warnings::{CompilerWarning, WarningKind};
use crate::token::Location;
use std::collections::HashMap;
use std::path::PathBuf;

/// One fully-lowered package: every surviving declaration plus whatever
/// diagnostics analysis produced along the way.
pub struct AnalyzedPackage {
    pub decls: Vec<CheckedDecl>,
    /// Every `TypeId` reachable from `decls` resolves against this table —
    /// MIR generation (spec.md §4.6) takes it alongside `decls`.
    pub types: CheckedTypeTable,
    pub errors: Vec<CompilerError>,
    pub warnings: Vec<CompilerWarning>,
}

/// `imported` carries the already-parsed declarations of every package this
/// one directly depends on (spec.md line 197: a dependency's declarations
/// must be visible before the importer's own parser/analyzer starts). Their
/// signatures and types are re-lowered into this package's own
/// [`CheckedTypeTable`]/`mono_signatures` rather than reusing the
/// dependency's `TypeId`s, which belong to a different table entirely.
pub fn analyze_package(decls: &[AstDecl], imported: &[AstDecl]) -> AnalyzedPackage {
    let mut analyzer = Analyzer::new();
    analyzer.seed_imported_decls(imported);
    let checked = analyzer.lower_decls(decls);
    AnalyzedPackage { decls: checked, types: analyzer.types, errors: analyzer.errors, warnings: analyzer.warnings }
}

struct Analyzer {
    types: CheckedTypeTable,
    scope: ScopeGraph,
    operators: OperatorRegister,
    errors: Vec<CompilerError>,
    warnings: Vec<CompilerWarning>,
    /// Every signature known for a function's base name, index 0 is the
    /// declared (possibly generic) signature, later entries are
    /// monomorphizations discovered at call sites (spec.md §4.5.4).
    mono_signatures: HashMap<String, Vec<CheckedFunSignature>>,
    /// `(object name, method name) -> return type`, filled while lowering
    /// objects so `Call::Method` can resolve a result type without a second
    /// tree walk.
    method_returns: HashMap<(String, String), TypeId>,
    /// `record/enum name -> (field name, field type)`, filled while
    /// lowering types so record literals and field access can resolve.
    record_fields: HashMap<String, Vec<(String, TypeId)>>,
    /// `enum name -> variant names`, filled while lowering types so
    /// `switch`/`match` exhaustiveness can tell which variants a case list
    /// is missing.
    enum_variants: HashMap<String, Vec<String>>,
}

fn loc_err(location: Location, msg: impl Into<String>) -> CompilerError {
    CompilerError::new(msg, ErrorLocation::resolve(location, PathBuf::new()), ErrorType::Analyzer)
}

impl Analyzer {
    fn new() -> Self {
        let mut analyzer = Analyzer {
            types: CheckedTypeTable::new(),
            scope: ScopeGraph::new(),
            operators: OperatorRegister::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            mono_signatures: HashMap::new(),
            method_returns: HashMap::new(),
            record_fields: HashMap::new(),
            enum_variants: HashMap::new(),
        };
        analyzer.seed_builtin_operators();
        analyzer
    }

    fn error(&mut self, location: Location, msg: impl Into<String>) {
        self.errors.push(loc_err(location, msg));
    }

    fn warn(&mut self, kind: WarningKind, location: Location, msg: impl Into<String>) {
        self.warnings.push(CompilerWarning::new(kind, msg, ErrorLocation::resolve(location, PathBuf::new())));
    }

    // ----------------------------------------------------------------
    // 4.5.5 operator register
    // ----------------------------------------------------------------

    /// Registers the arithmetic/comparison/logical overloads built into
    /// every package before user declarations are seen. A user `fun`
    /// declaration with a matching operator name widens this same register
    /// (not modeled here: no surface syntax declares new operators).
    fn seed_builtin_operators(&mut self) {
        let i32_ty = self.types.intern(CheckedDataTypeKind::Int32);
        let i64_ty = self.types.intern(CheckedDataTypeKind::Int64);
        let f32_ty = self.types.intern(CheckedDataTypeKind::Float32);
        let f64_ty = self.types.intern(CheckedDataTypeKind::Float64);
        let bool_ty = self.types.intern(CheckedDataTypeKind::Bool);

        let numeric = [i32_ty, i64_ty, f32_ty, f64_ty];
        for &ty in &numeric {
            for name in ["**", "*", "/", "%", "+", "-"] {
                self.operators.add(OperatorSignature { name: name.into(), params: vec![ty, ty], return_type: ty });
            }
            for name in ["<", "<=", ">", ">=", "==", "!="] {
                self.operators.add(OperatorSignature { name: name.into(), params: vec![ty, ty], return_type: bool_ty });
            }
            self.operators.add(OperatorSignature { name: "-".into(), params: vec![ty], return_type: ty });
        }
        for name in ["&", "^", "|"] {
            self.operators.add(OperatorSignature { name: name.into(), params: vec![i32_ty, i32_ty], return_type: i32_ty });
            self.operators.add(OperatorSignature { name: name.into(), params: vec![i64_ty, i64_ty], return_type: i64_ty });
        }
        for name in ["&&", "||"] {
            self.operators.add(OperatorSignature { name: name.into(), params: vec![bool_ty, bool_ty], return_type: bool_ty });
        }
        self.operators.add(OperatorSignature { name: "not".into(), params: vec![bool_ty], return_type: bool_ty });
        self.operators.add(OperatorSignature { name: "==".into(), params: vec![bool_ty, bool_ty], return_type: bool_ty });
    }

    // ----------------------------------------------------------------
    // 4.5.1 declaration registration + top-level driver
    // ----------------------------------------------------------------

    fn lower_decls(&mut self, decls: &[AstDecl]) -> Vec<CheckedDecl> {
        let mut symbols = Vec::with_capacity(decls.len());
        for decl in decls {
            symbols.push(self.register_decl(decl));
        }

        // Seed every function's signature before any body is lowered so a
        // self-recursive call, or a call to a function declared later in
        // this same package, resolves through `mono_signatures` instead of
        // failing with "cannot find function" (spec.md §4.5.2 must finish
        // before §4.5.4 starts).
        for decl in decls {
            if let AstDeclKind::Fun(f) = &decl.kind {
                self.seed_fun_signature(f, decl.location);
            }
        }

        let mut checked: Vec<CheckedDecl> = decls
            .iter()
            .zip(symbols)
            .filter_map(|(decl, symbol)| self.lower_decl(decl, symbol))
            .collect();

        // Methods declared at top level (`method Object.fun name(...)`) fold
        // into the object they extend; the object may have been declared
        // before or after the method, so this runs as a second pass.
        for decl in decls {
            if let AstDeclKind::Method(method) = &decl.kind {
                self.fold_method_into_object(&mut checked, method, decl.location);
            }
        }

        checked
    }

    fn register_decl(&mut self, decl: &AstDecl) -> Option<SymbolId> {
        let (name, kind) = match &decl.kind {
            AstDeclKind::Fun(f) => (f.name.as_str(), SymbolKind::Function),
            AstDeclKind::Type(t) => (t.name.as_str(), SymbolKind::Type),
            AstDeclKind::Object(o) => (o.name.as_str(), SymbolKind::Object),
            AstDeclKind::Error(e) => (e.name.as_str(), SymbolKind::Error),
            AstDeclKind::Constant(c) => (c.name.as_str(), SymbolKind::Constant),
            AstDeclKind::Module(m) => (m.name.as_str(), SymbolKind::Module),
            AstDeclKind::Method(_) | AstDeclKind::Include { .. } | AstDeclKind::Use { .. } => return None,
        };
        match self.scope.declare(name, kind, None, decl.location) {
            Ok(id) => Some(id),
            Err(prior) => {
                self.error(decl.location, format!("`{name}` is already declared at {prior:?}"));
                None
            }
        }
    }

    fn lower_decl(&mut self, decl: &AstDecl, symbol: Option<SymbolId>) -> Option<CheckedDecl> {
        match &decl.kind {
            AstDeclKind::Fun(f) => {
                let symbol = symbol?;
                let checked = self.lower_fun(f, symbol, decl.location);
                Some(CheckedDecl::Fun(checked))
            }
            AstDeclKind::Type(t) => {
                let symbol = symbol?;
                Some(CheckedDecl::Type(self.lower_type(t, symbol, decl.location)))
            }
            AstDeclKind::Object(o) => {
                let symbol = symbol?;
                Some(CheckedDecl::Object(self.lower_object(o, symbol, decl.location)))
            }
            AstDeclKind::Error(e) => {
                let symbol = symbol?;
                let payload = e.payload.as_ref().map(|t| self.lower_data_type(t));
                if let Some(ty) = payload {
                    self.scope.symbol_mut(symbol).ty = Some(ty);
                }
                Some(CheckedDecl::Error(CheckedErrorDecl { name: e.name.clone(), symbol, payload, location: decl.location }))
            }
            AstDeclKind::Constant(c) => {
                let symbol = symbol?;
                let declared = c.ty.as_ref().map(|t| self.lower_data_type(t));
                let value = self.lower_expr(&c.value, declared);
                let ty = declared.unwrap_or(value.ty);
                self.scope.symbol_mut(symbol).ty = Some(ty);
                Some(CheckedDecl::Constant(CheckedConstantDecl { name: c.name.clone(), symbol, ty, value, location: decl.location }))
            }
            AstDeclKind::Module(m) => {
                let symbol = symbol?;
                self.scope.push_scope();
                let decls = self.lower_decls(&m.decls);
                self.scope.pop_scope();
                Some(CheckedDecl::Module(CheckedModuleDecl { name: m.name.clone(), symbol, decls, location: decl.location }))
            }
            AstDeclKind::Method(_) | AstDeclKind::Include { .. } | AstDeclKind::Use { .. } => None,
        }
    }

    fn fold_method_into_object(&mut self, checked: &mut [CheckedDecl], method: &crate::ast::MethodDecl, location: Location) {
        let symbol = self.scope.resolve(&method.object_name);
        let Some(symbol) = symbol else {
            self.error(location, format!("method extends unknown object `{}`", method.object_name));
            return;
        };
        let fun = self.lower_fun(&method.fun, symbol, location);
        self.method_returns.insert(
            (method.object_name.clone(), method.fun.name.clone()),
            fun.signatures.first().map(|s| s.return_type).unwrap_or(self.types_unknown()),
        );
        for decl in checked.iter_mut() {
            if let CheckedDecl::Object(object) = decl {
                if object.name == method.object_name {
                    object.methods.push(fun);
                    return;
                }
            }
        }
        self.error(location, format!("method extends unknown object `{}`", method.object_name));
    }

    fn types_unknown(&mut self) -> TypeId {
        self.types.intern(CheckedDataTypeKind::Unknown)
    }

    // ----------------------------------------------------------------
    // 4.5.2 / 4.5.3 signature seeding + type resolution
    // ----------------------------------------------------------------

    /// Lowers just `fun`'s params/return type and records the resulting
    /// signature, without touching its body or declaring its parameters as
    /// scope symbols. Called once ahead of [`Self::lower_decl`] for every
    /// `fun` in a package (forward references/self-recursion), and once per
    /// dependency `fun` when seeding an imported package's exports.
    fn seed_fun_signature(&mut self, fun: &crate::ast::FunDecl, location: Location) {
        self.scope.push_scope();
        for generic in &fun.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }
        let params: Vec<TypeId> = fun
            .params
            .iter()
            .map(|p| p.ty.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types_unknown()))
            .collect();
        let return_type = fun.return_type.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types.intern(CheckedDataTypeKind::Unit));
        self.scope.pop_scope();

        let signature = CheckedFunSignature { params, return_type, global_name: fun.name.clone() };
        let signatures = self.mono_signatures.entry(fun.name.clone()).or_insert_with(Vec::new);
        if signatures.is_empty() {
            signatures.push(signature);
        } else {
            signatures[0] = signature;
        }
    }

    /// Seeds a dependency package's exported declarations into this
    /// analyzer's own scope/type table (spec.md line 197): re-lowers each
    /// one through the normal `lower_data_type`/signature machinery instead
    /// of reusing the dependency's own `TypeId`s, which belong to a
    /// different [`CheckedTypeTable`] and would be meaningless here.
    fn seed_imported_decls(&mut self, decls: &[AstDecl]) {
        for decl in decls {
            match &decl.kind {
                AstDeclKind::Fun(f) => self.seed_fun_signature(f, decl.location),
                AstDeclKind::Type(t) => {
                    if let Some(symbol) = self.register_decl(decl) {
                        self.seed_imported_type(t, symbol, decl.location);
                    }
                }
                AstDeclKind::Object(o) => {
                    if let Some(symbol) = self.register_decl(decl) {
                        self.seed_imported_object(o, symbol, decl.location);
                    }
                }
                AstDeclKind::Error(e) => {
                    if let Some(symbol) = self.register_decl(decl) {
                        if let Some(ty) = e.payload.as_ref().map(|t| self.lower_data_type(t)) {
                            self.scope.symbol_mut(symbol).ty = Some(ty);
                        }
                    }
                }
                AstDeclKind::Constant(c) => {
                    if let Some(symbol) = self.register_decl(decl) {
                        let ty = c.ty.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types_unknown());
                        self.scope.symbol_mut(symbol).ty = Some(ty);
                    }
                }
                AstDeclKind::Module(_) | AstDeclKind::Method(_) | AstDeclKind::Include { .. } | AstDeclKind::Use { .. } => {}
            }
        }
    }

    fn seed_imported_type(&mut self, decl: &crate::ast::TypeDecl, symbol: SymbolId, location: Location) {
        self.scope.push_scope();
        for generic in &decl.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }
        match &decl.body {
            TypeBody::Record(fields) => {
                let lowered: Vec<(String, TypeId)> = fields.iter().map(|(name, ty)| (name.clone(), self.lower_data_type(ty))).collect();
                self.record_fields.insert(decl.name.clone(), lowered);
            }
            TypeBody::Enum(variants) => {
                self.enum_variants.insert(decl.name.clone(), variants.iter().map(|(name, _)| name.clone()).collect());
                for (_, ty) in variants {
                    if let Some(ty) = ty {
                        self.lower_data_type(ty);
                    }
                }
            }
            TypeBody::Alias(ty) => {
                self.lower_data_type(ty);
            }
        }
        self.scope.pop_scope();

        let own_type = self.types.intern(CheckedDataTypeKind::Custom { name: decl.name.clone(), generics: Vec::new() });
        self.scope.symbol_mut(symbol).ty = Some(own_type);
    }

    fn seed_imported_object(&mut self, decl: &crate::ast::ObjectDecl, symbol: SymbolId, location: Location) {
        self.scope.push_scope();
        for generic in &decl.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }
        let methods: &[crate::ast::FunDecl] = match &decl.body {
            ObjectBody::Class { methods, .. } => methods,
            ObjectBody::Trait { method_signatures } => method_signatures,
        };
        for method in methods {
            let return_type = method.return_type.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types.intern(CheckedDataTypeKind::Unit));
            self.method_returns.insert((decl.name.clone(), method.name.clone()), return_type);
        }
        self.scope.pop_scope();

        let own_type = self.types.intern(CheckedDataTypeKind::Custom { name: decl.name.clone(), generics: Vec::new() });
        self.scope.symbol_mut(symbol).ty = Some(own_type);
    }

    fn lower_data_type(&mut self, ty: &AstDataType) -> TypeId {
        use crate::ast::AstDataTypeKind as K;
        let kind = match &ty.kind {
            K::Any => CheckedDataTypeKind::Any,
            K::Bool => CheckedDataTypeKind::Bool,
            K::Byte => CheckedDataTypeKind::Byte,
            K::Bytes => CheckedDataTypeKind::Bytes,
            K::Char => CheckedDataTypeKind::Char,
            K::Str => CheckedDataTypeKind::Str,
            K::Unit => CheckedDataTypeKind::Unit,
            K::Never => CheckedDataTypeKind::Never,
            K::SelfType | K::Object => CheckedDataTypeKind::Any,
            K::Cshort => CheckedDataTypeKind::Cshort,
            K::Cushort => CheckedDataTypeKind::Cushort,
            K::Cint => CheckedDataTypeKind::Cint,
            K::Cuint => CheckedDataTypeKind::Cuint,
            K::Clong => CheckedDataTypeKind::Clong,
            K::Culong => CheckedDataTypeKind::Culong,
            K::Clonglong => CheckedDataTypeKind::Clonglong,
            K::Culonglong => CheckedDataTypeKind::Culonglong,
            K::Cfloat => CheckedDataTypeKind::Cfloat,
            K::Cdouble => CheckedDataTypeKind::Cdouble,
            K::Cstr => CheckedDataTypeKind::Cstr,
            K::Cvoid => CheckedDataTypeKind::Cvoid,
            K::Int8 => CheckedDataTypeKind::Int8,
            K::Int16 => CheckedDataTypeKind::Int16,
            K::Int32 => CheckedDataTypeKind::Int32,
            K::Int64 => CheckedDataTypeKind::Int64,
            K::Isize => CheckedDataTypeKind::Isize,
            K::Uint8 => CheckedDataTypeKind::Uint8,
            K::Uint16 => CheckedDataTypeKind::Uint16,
            K::Uint32 => CheckedDataTypeKind::Uint32,
            K::Uint64 => CheckedDataTypeKind::Uint64,
            K::Usize => CheckedDataTypeKind::Usize,
            K::Float32 => CheckedDataTypeKind::Float32,
            K::Float64 => CheckedDataTypeKind::Float64,
            K::Array(kind, elem) => {
                let elem = self.lower_data_type(elem);
                let kind = match kind {
                    crate::ast::ArrayKind::Dynamic => CheckedArrayKind::Dynamic,
                    crate::ast::ArrayKind::MultiPointers => CheckedArrayKind::MultiPointers,
                    crate::ast::ArrayKind::Sized(n) => CheckedArrayKind::Sized(*n),
                    crate::ast::ArrayKind::Undetermined => CheckedArrayKind::Undetermined,
                };
                CheckedDataTypeKind::Array(kind, elem)
            }
            K::Lambda(lambda) => {
                let params = lambda.params.iter().map(|p| self.lower_data_type(p)).collect();
                let return_type = self.lower_data_type(&lambda.return_type);
                CheckedDataTypeKind::Lambda { params, return_type }
            }
            K::List(inner) => CheckedDataTypeKind::List(self.lower_data_type(inner)),
            K::Mut(inner) => CheckedDataTypeKind::Mut(self.lower_data_type(inner)),
            K::Ref(inner) => CheckedDataTypeKind::Ref(self.lower_data_type(inner)),
            K::Ptr(inner) => CheckedDataTypeKind::Ptr(self.lower_data_type(inner)),
            K::Trace(inner) => CheckedDataTypeKind::Trace(self.lower_data_type(inner)),
            K::Optional(inner) => CheckedDataTypeKind::Optional(self.lower_data_type(inner)),
            K::Custom(custom) => {
                if custom.generics.is_empty() && matches!(self.scope.resolve(&custom.name).map(|id| self.scope.symbol(id).kind), Some(SymbolKind::GenericParam)) {
                    CheckedDataTypeKind::Generic(custom.name.clone())
                } else {
                    let generics = custom.generics.iter().map(|g| self.lower_data_type(g)).collect();
                    CheckedDataTypeKind::Custom { name: custom.name.clone(), generics }
                }
            }
            K::Result(result) => {
                let ok = self.lower_data_type(&result.ok);
                let errs = result.errs.iter().map(|e| self.lower_data_type(e)).collect();
                CheckedDataTypeKind::Result { ok, errs }
            }
            K::Tuple(elems) => CheckedDataTypeKind::Tuple(elems.iter().map(|e| self.lower_data_type(e)).collect()),
        };
        self.types.intern(kind)
    }

    fn lower_fun(&mut self, fun: &crate::ast::FunDecl, symbol: SymbolId, location: Location) -> CheckedFun {
        self.scope.push_scope();
        for generic in &fun.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }

        let mut params = Vec::with_capacity(fun.params.len());
        let mut param_symbols = Vec::with_capacity(fun.params.len());
        for param in &fun.params {
            let ty = param.ty.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types_unknown());
            params.push(ty);
            match self.scope.declare(param.name.clone(), SymbolKind::Variable { mutable: false }, Some(ty), location) {
                Ok(id) => param_symbols.push(id),
                Err(prior) => self.error(location, format!("parameter `{}` collides with declaration at {prior:?}", param.name)),
            }
        }
        let return_type = fun.return_type.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types.intern(CheckedDataTypeKind::Unit));

        let global_name = fun.name.clone();
        let body = self.lower_stmts(&fun.body, return_type);
        let (raises, raised_errors) = scan_can_raise(&body);

        self.scope.pop_scope();

        let signature = CheckedFunSignature { params, return_type, global_name: global_name.clone() };
        let signatures = self.mono_signatures.entry(global_name.clone()).or_insert_with(Vec::new);
        if signatures.is_empty() {
            signatures.push(signature.clone());
        } else {
            signatures[0] = signature.clone();
        }
        let signatures = signatures.clone();

        CheckedFun {
            name: fun.name.clone(),
            global_name,
            symbol,
            generics: fun.generics.clone(),
            signatures,
            param_symbols,
            can_raise: raises,
            raised_errors,
            body,
            location,
        }
    }

    fn lower_type(&mut self, decl: &crate::ast::TypeDecl, symbol: SymbolId, location: Location) -> CheckedTypeDecl {
        self.scope.push_scope();
        for generic in &decl.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }
        let body = match &decl.body {
            TypeBody::Record(fields) => {
                let lowered: Vec<(String, TypeId)> = fields.iter().map(|(name, ty)| (name.clone(), self.lower_data_type(ty))).collect();
                self.record_fields.insert(decl.name.clone(), lowered.clone());
                CheckedTypeBody::Record(lowered)
            }
            TypeBody::Enum(variants) => {
                self.enum_variants.insert(decl.name.clone(), variants.iter().map(|(name, _)| name.clone()).collect());
                CheckedTypeBody::Enum(variants.iter().map(|(name, ty)| (name.clone(), ty.as_ref().map(|t| self.lower_data_type(t)))).collect())
            }
            TypeBody::Alias(ty) => CheckedTypeBody::Alias(self.lower_data_type(ty)),
        };
        self.scope.pop_scope();

        let own_type = self.types.intern(CheckedDataTypeKind::Custom { name: decl.name.clone(), generics: Vec::new() });
        self.scope.symbol_mut(symbol).ty = Some(own_type);

        CheckedTypeDecl { name: decl.name.clone(), symbol, generics: decl.generics.clone(), body, location }
    }

    fn lower_object(&mut self, decl: &crate::ast::ObjectDecl, symbol: SymbolId, location: Location) -> CheckedObjectDecl {
        self.scope.push_scope();
        for generic in &decl.generics {
            let _ = self.scope.declare(generic.clone(), SymbolKind::GenericParam, None, location);
        }

        let (attributes, methods, is_trait) = match &decl.body {
            ObjectBody::Class { attributes, methods } => {
                let attrs: Vec<(String, TypeId)> = attributes.iter().map(|(name, ty)| (name.clone(), self.lower_data_type(ty))).collect();
                let lowered_methods = methods.iter().map(|m| self.lower_fun(m, symbol, location)).collect::<Vec<_>>();
                (attrs, lowered_methods, false)
            }
            ObjectBody::Trait { method_signatures } => {
                let lowered_methods = method_signatures.iter().map(|m| self.lower_fun(m, symbol, location)).collect::<Vec<_>>();
                (Vec::new(), lowered_methods, true)
            }
        };
        for method in &methods {
            if let Some(sig) = method.signatures.first() {
                self.method_returns.insert((decl.name.clone(), method.name.clone()), sig.return_type);
            }
        }

        self.scope.pop_scope();
        let own_type = self.types.intern(CheckedDataTypeKind::Custom { name: decl.name.clone(), generics: Vec::new() });
        self.scope.symbol_mut(symbol).ty = Some(own_type);

        CheckedObjectDecl {
            name: decl.name.clone(),
            symbol,
            generics: decl.generics.clone(),
            implements: decl.implements.clone(),
            attributes,
            methods,
            is_trait,
            location,
        }
    }

    // ----------------------------------------------------------------
    // 4.5.4 body checking
    // ----------------------------------------------------------------

    fn lower_stmts(&mut self, stmts: &[AstStmt], expected_return: TypeId) -> Vec<CheckedStmt> {
        stmts.iter().map(|s| self.lower_stmt(s, expected_return)).collect()
    }

    fn lower_stmt(&mut self, stmt: &AstStmt, expected_return: TypeId) -> CheckedStmt {
        let kind = match &stmt.kind {
            AstStmtKind::Asm { template, operands } => CheckedStmtKind::Asm {
                template: template.clone(),
                operands: operands.iter().map(|o| self.lower_expr(o, None)).collect(),
            },
            AstStmtKind::Await(e) => CheckedStmtKind::Await(self.lower_expr(e, None)),
            AstStmtKind::Block(body) => {
                self.scope.push_scope();
                let body = self.lower_stmts(body, expected_return);
                self.scope.pop_scope();
                CheckedStmtKind::Block(body)
            }
            AstStmtKind::Break => CheckedStmtKind::Break,
            AstStmtKind::Defer(inner) => CheckedStmtKind::Defer(Box::new(self.lower_stmt(inner, expected_return))),
            AstStmtKind::Drop(e) => CheckedStmtKind::Drop(self.lower_expr(e, None)),
            AstStmtKind::For { pattern, iterable, body } => {
                let iterable = self.lower_expr(iterable, None);
                self.scope.push_scope();
                let binding = self.bind_pattern_name(pattern, self.types_any(), stmt.location);
                let body = self.lower_stmts(body, expected_return);
                self.scope.pop_scope();
                CheckedStmtKind::For { binding, iterable, body }
            }
            AstStmtKind::If { branches, else_body } => {
                let branches = branches
                    .iter()
                    .map(|b| {
                        let condition = self.lower_expr(&b.condition, None);
                        self.scope.push_scope();
                        let body = self.lower_stmts(&b.body, expected_return);
                        self.scope.pop_scope();
                        CheckedIfBranch { condition, body }
                    })
                    .collect();
                let else_body = else_body.as_ref().map(|b| {
                    self.scope.push_scope();
                    let body = self.lower_stmts(b, expected_return);
                    self.scope.pop_scope();
                    body
                });
                CheckedStmtKind::If { branches, else_body }
            }
            AstStmtKind::Match { scrutinee, arms } => {
                let scrutinee = self.lower_expr(scrutinee, None);
                let mut switch = SwitchCase::new();
                for arm in arms {
                    self.scope.push_scope();
                    let value = self.pattern_to_switch_value(&arm.pattern);
                    let binding = self.bind_pattern_name_if_name(&arm.pattern);
                    let guard = arm.guard.as_ref().map(|g| self.lower_expr(g, None));
                    let body = self.lower_stmts(&arm.body, expected_return);
                    self.scope.pop_scope();
                    let sub_case = SwitchSubCase { value, binding, guard, body, location: arm.pattern.location };
                    self.report_case_result(switch.add_case(sub_case), arm.pattern.location);
                }
                self.check_exhaustiveness(scrutinee.ty, &switch, false, stmt.location);
                CheckedStmtKind::Switch { scrutinee, case: switch, default: None }
            }
            AstStmtKind::Switch { scrutinee, cases, default } => {
                let scrutinee = self.lower_expr(scrutinee, None);
                let mut switch = SwitchCase::new();
                for case in cases {
                    self.scope.push_scope();
                    let value = self.pattern_to_switch_value(&case.pattern);
                    let binding = self.bind_pattern_name_if_name(&case.pattern);
                    let body = self.lower_stmts(&case.body, expected_return);
                    self.scope.pop_scope();
                    let sub_case = SwitchSubCase { value, binding, guard: None, body, location: case.pattern.location };
                    self.report_case_result(switch.add_case(sub_case), case.pattern.location);
                }
                let default = default.as_ref().map(|d| {
                    self.scope.push_scope();
                    let body = self.lower_stmts(d, expected_return);
                    self.scope.pop_scope();
                    body
                });
                self.check_exhaustiveness(scrutinee.ty, &switch, default.is_some(), stmt.location);
                CheckedStmtKind::Switch { scrutinee, case: switch, default }
            }
            AstStmtKind::Next => CheckedStmtKind::Next,
            AstStmtKind::Raise(e) => CheckedStmtKind::Raise(self.lower_expr(e, None)),
            AstStmtKind::Return(value) => CheckedStmtKind::Return(value.as_ref().map(|v| self.lower_expr(v, Some(expected_return)))),
            AstStmtKind::Try { body, catch_pattern, catch_body } => {
                self.scope.push_scope();
                let body = self.lower_stmts(body, expected_return);
                self.scope.pop_scope();
                self.scope.push_scope();
                let catch_binding = catch_pattern.as_ref().map(|p| self.bind_pattern_name(p, self.types_any(), stmt.location));
                let catch_body = self.lower_stmts(catch_body, expected_return);
                self.scope.pop_scope();
                CheckedStmtKind::Try { body, catch_binding, catch_body }
            }
            AstStmtKind::Unsafe(body) => {
                self.scope.push_scope();
                let body = self.lower_stmts(body, expected_return);
                self.scope.pop_scope();
                CheckedStmtKind::Unsafe(body)
            }
            AstStmtKind::Variable { name, mutable, ty, value } => {
                let declared = ty.as_ref().map(|t| self.lower_data_type(t));
                let value = value.as_ref().map(|v| self.lower_expr(v, declared));
                let resolved_ty = declared.or_else(|| value.as_ref().map(|v| v.ty)).unwrap_or_else(|| self.types_unknown());
                let symbol = match self.scope.declare(name.clone(), SymbolKind::Variable { mutable: *mutable }, Some(resolved_ty), stmt.location) {
                    Ok(id) => id,
                    Err(prior) => {
                        self.error(stmt.location, format!("`{name}` shadows a binding in the same scope, declared at {prior:?}"));
                        self.scope.declare(format!("{name}$shadow"), SymbolKind::Variable { mutable: *mutable }, Some(resolved_ty), stmt.location).unwrap()
                    }
                };
                CheckedStmtKind::Variable { symbol, ty: resolved_ty, value }
            }
            AstStmtKind::Expr(e) => CheckedStmtKind::Expr(self.lower_expr(e, None)),
        };
        CheckedStmt::new(kind, stmt.location)
    }

    fn types_any(&mut self) -> TypeId {
        self.types.intern(CheckedDataTypeKind::Any)
    }

    fn bind_pattern_name(&mut self, pattern: &AstPattern, fallback_ty: TypeId, location: Location) -> SymbolId {
        let name = match &pattern.kind {
            AstPatternKind::Name(name) => name.clone(),
            AstPatternKind::As { name, .. } => name.clone(),
            _ => "$binding".to_string(),
        };
        match self.scope.declare(name, SymbolKind::Variable { mutable: false }, Some(fallback_ty), location) {
            Ok(id) => id,
            Err(_) => self.scope.declare("$binding$dup".to_string(), SymbolKind::Variable { mutable: false }, Some(fallback_ty), location).unwrap(),
        }
    }

    fn bind_pattern_name_if_name(&mut self, pattern: &AstPattern) -> Option<SymbolId> {
        match &pattern.kind {
            AstPatternKind::Name(name) => {
                let ty = self.types_any();
                self.scope.declare(name.clone(), SymbolKind::Variable { mutable: false }, Some(ty), pattern.location).ok()
            }
            AstPatternKind::As { name, .. } => {
                let ty = self.types_any();
                self.scope.declare(name.clone(), SymbolKind::Variable { mutable: false }, Some(ty), pattern.location).ok()
            }
            _ => None,
        }
    }

    fn pattern_to_switch_value(&mut self, pattern: &AstPattern) -> SwitchCaseValue {
        match &pattern.kind {
            AstPatternKind::Literal(lit) => SwitchCaseValue::Constant(lit.clone()),
            AstPatternKind::Wildcard | AstPatternKind::Name(_) | AstPatternKind::AutoComplete => SwitchCaseValue::Else,
            AstPatternKind::As { pattern, .. } => self.pattern_to_switch_value(pattern),
            AstPatternKind::Tuple(items) | AstPatternKind::Array(items) | AstPatternKind::List(items) => {
                SwitchCaseValue::Union(items.iter().map(|p| self.pattern_to_switch_value(p)).collect())
            }
            AstPatternKind::VariantCall { variant, args, .. } => {
                let mut values = vec![SwitchCaseValue::Constant(Literal::Str(variant.clone()))];
                values.extend(args.iter().map(|p| self.pattern_to_switch_value(p)));
                SwitchCaseValue::Union(values)
            }
            AstPatternKind::RecordCall { fields, .. } => {
                SwitchCaseValue::Union(fields.iter().map(|(_, p)| self.pattern_to_switch_value(p)).collect())
            }
            AstPatternKind::Range { from, to } => {
                SwitchCaseValue::Union(vec![self.pattern_to_switch_value(from), self.pattern_to_switch_value(to)])
            }
            AstPatternKind::Exception { pattern, .. } => self.pattern_to_switch_value(pattern),
        }
    }

    fn report_case_result(&mut self, result: AddCaseResult, location: Location) {
        match result {
            AddCaseResult::Ok => {}
            AddCaseResult::UnusedCase => self.warn(WarningKind::UnreachableCase, location, "case is unreachable after a prior catch-all"),
            AddCaseResult::DuplicateCase => self.warn(WarningKind::UnusedMatchCase, location, "duplicate case is never reached"),
        }
    }

    /// Reports an "exhaustiveness hole" (spec.md §7) when a `switch`/`match`
    /// over an enum has neither a catch-all arm nor a case for every
    /// variant. Silently accepts anything that isn't a switch over a known
    /// enum, since a record/tuple/literal scrutinee has no notion of
    /// "variant" to check coverage against.
    fn check_exhaustiveness(&mut self, scrutinee_ty: TypeId, switch: &SwitchCase, has_default: bool, location: Location) {
        if has_default || switch.sub_cases.iter().any(|c| matches!(c.value, SwitchCaseValue::Else) && c.guard.is_none()) {
            return;
        }
        let CheckedDataTypeKind::Custom { name, .. } = &self.types.get(scrutinee_ty).kind else { return };
        let name = name.clone();
        let Some(variants) = self.enum_variants.get(&name) else { return };

        let covered: std::collections::HashSet<&str> = switch
            .sub_cases
            .iter()
            .filter_map(|c| match &c.value {
                SwitchCaseValue::Union(parts) => match parts.first() {
                    Some(SwitchCaseValue::Constant(Literal::Str(v))) => Some(v.as_str()),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        let missing: Vec<&str> = variants.iter().map(|v| v.as_str()).filter(|v| !covered.contains(v)).collect();
        if !missing.is_empty() {
            let err = loc_err(location, format!("exhaustiveness hole: `{name}` is missing variant(s) `{}`", missing.join("`, `")))
                .with_metadata(ErrorMetaDataKey::ExhaustivenessHole, "add a case for the missing variant(s) or an `_`/`else` arm");
            self.errors.push(err);
        }
    }

    fn lower_expr(&mut self, expr: &AstExpr, expected: Option<TypeId>) -> CheckedExpr {
        match &expr.kind {
            AstExprKind::Grouping(inner) => {
                let inner = self.lower_expr(inner, expected);
                CheckedExpr::new(inner.kind, inner.ty, expr.location)
            }
            AstExprKind::Literal(lit) => {
                let ty = self.literal_type(lit, expected);
                CheckedExpr::new(CheckedExprKind::Literal(lit.clone()), ty, expr.location)
            }
            AstExprKind::Identifier(name) => match self.scope.resolve(name) {
                Some(id) => {
                    let ty = self.scope.symbol(id).ty.unwrap_or_else(|| self.types_unknown());
                    CheckedExpr::new(CheckedExprKind::Identifier(id), ty, expr.location)
                }
                None => {
                    self.error(expr.location, format!("cannot find `{name}` in this scope"));
                    let ty = self.types_unknown();
                    CheckedExpr::new(CheckedExprKind::UnresolvedIdentifier(name.clone()), ty, expr.location)
                }
            },
            AstExprKind::Call(call) => self.lower_call(call, expr.location),
            AstExprKind::Binary { op, left, right } => self.lower_binary(*op, left, right, expr.location),
            AstExprKind::Unary { op, operand } => self.lower_unary(*op, operand, expr.location),
            AstExprKind::AccessChain(segments) => {
                let checked: Vec<CheckedExpr> = segments.iter().map(|s| self.lower_expr(s, None)).collect();
                let ty = checked.last().map(|e| e.ty).unwrap_or_else(|| self.types_unknown());
                CheckedExpr::new(CheckedExprKind::Tuple(checked), ty, expr.location)
            }
            AstExprKind::Cast { expr: inner, to } => {
                let inner = self.lower_expr(inner, None);
                let to = self.lower_data_type(to);
                CheckedExpr::new(CheckedExprKind::Cast { expr: Box::new(inner), to }, to, expr.location)
            }
            AstExprKind::Lambda { params, return_type, body } => {
                self.scope.push_scope();
                let mut param_tys = Vec::with_capacity(params.len());
                for (name, ty) in params {
                    let ty = ty.as_ref().map(|t| self.lower_data_type(t)).unwrap_or_else(|| self.types_unknown());
                    param_tys.push(ty);
                    let _ = self.scope.declare(name.clone(), SymbolKind::Variable { mutable: false }, Some(ty), expr.location);
                }
                let expected_ret = return_type.as_ref().map(|t| self.lower_data_type(t));
                let body = self.lower_expr(body, expected_ret);
                self.scope.pop_scope();
                let return_type = expected_ret.unwrap_or(body.ty);
                let ty = self.types.intern(CheckedDataTypeKind::Lambda { params: param_tys.clone(), return_type });
                CheckedExpr::new(CheckedExprKind::Lambda { params: param_tys, body: Box::new(body) }, ty, expr.location)
            }
            AstExprKind::Tuple(elems) => {
                let checked: Vec<CheckedExpr> = elems.iter().map(|e| self.lower_expr(e, None)).collect();
                let ty = {
                    let ids: Vec<TypeId> = checked.iter().map(|e| e.ty).collect();
                    self.types.intern(CheckedDataTypeKind::Tuple(ids))
                };
                CheckedExpr::new(CheckedExprKind::Tuple(checked), ty, expr.location)
            }
            AstExprKind::Array(elems) => {
                let checked: Vec<CheckedExpr> = elems.iter().map(|e| self.lower_expr(e, None)).collect();
                let elem_ty = checked.first().map(|e| e.ty).unwrap_or_else(|| self.types_unknown());
                let ty = self.types.intern(CheckedDataTypeKind::Array(CheckedArrayKind::Sized(checked.len() as u64), elem_ty));
                CheckedExpr::new(CheckedExprKind::Array(checked), ty, expr.location)
            }
            AstExprKind::FieldAccess { base, field } => {
                let base = self.lower_expr(base, None);
                let ty = self.field_type(base.ty, field).unwrap_or_else(|| {
                    self.error(expr.location, format!("no field `{field}` on this type"));
                    self.types_unknown()
                });
                CheckedExpr::new(CheckedExprKind::FieldAccess { base: Box::new(base), field: field.clone() }, ty, expr.location)
            }
        }
    }

    fn field_type(&self, base: TypeId, field: &str) -> Option<TypeId> {
        let CheckedDataTypeKind::Custom { name, .. } = &self.types.get(base).kind else { return None };
        self.record_fields.get(name)?.iter().find(|(f, _)| f == field).map(|(_, ty)| *ty)
    }

    fn literal_type(&mut self, lit: &Literal, expected: Option<TypeId>) -> TypeId {
        use Literal::*;
        let kind = match lit {
            Bool(_) => CheckedDataTypeKind::Bool,
            Byte(_) => CheckedDataTypeKind::Byte,
            Bytes(_) => CheckedDataTypeKind::Bytes,
            Char(_) => CheckedDataTypeKind::Char,
            Float32(_) => CheckedDataTypeKind::Float32,
            Float64(_) => return expected.filter(|&t| self.is_float(t)).unwrap_or_else(|| self.types.intern(CheckedDataTypeKind::Float64)),
            Int { .. } => return expected.filter(|&t| self.is_integer(t)).unwrap_or_else(|| self.types.intern(CheckedDataTypeKind::Int32)),
            SuffixI8(_) => CheckedDataTypeKind::Int8,
            SuffixI16(_) => CheckedDataTypeKind::Int16,
            SuffixI32(_) => CheckedDataTypeKind::Int32,
            SuffixI64(_) => CheckedDataTypeKind::Int64,
            SuffixIsize(_) => CheckedDataTypeKind::Isize,
            SuffixU8(_) => CheckedDataTypeKind::Uint8,
            SuffixU16(_) => CheckedDataTypeKind::Uint16,
            SuffixU32(_) => CheckedDataTypeKind::Uint32,
            SuffixU64(_) => CheckedDataTypeKind::Uint64,
            SuffixUsize(_) => CheckedDataTypeKind::Usize,
            SuffixF32(_) => CheckedDataTypeKind::Float32,
            SuffixF64(_) => CheckedDataTypeKind::Float64,
            Str(_) => CheckedDataTypeKind::Str,
            Nil => CheckedDataTypeKind::Optional(self.types_unknown()),
            Undef => CheckedDataTypeKind::Unknown,
            Unit => CheckedDataTypeKind::Unit,
        };
        self.types.intern(kind)
    }

    fn is_integer(&self, ty: TypeId) -> bool {
        matches!(
            self.types.get(ty).kind,
            CheckedDataTypeKind::Int8
                | CheckedDataTypeKind::Int16
                | CheckedDataTypeKind::Int32
                | CheckedDataTypeKind::Int64
                | CheckedDataTypeKind::Isize
                | CheckedDataTypeKind::Uint8
                | CheckedDataTypeKind::Uint16
                | CheckedDataTypeKind::Uint32
                | CheckedDataTypeKind::Uint64
                | CheckedDataTypeKind::Usize
        )
    }

    fn is_float(&self, ty: TypeId) -> bool {
        matches!(self.types.get(ty).kind, CheckedDataTypeKind::Float32 | CheckedDataTypeKind::Float64)
    }

    fn lower_call_args(&mut self, args: &[CallArg]) -> Vec<CheckedCallArg> {
        args.iter()
            .map(|a| match a {
                CallArg::Positional(e) => CheckedCallArg::Positional(self.lower_expr(e, None)),
                CallArg::Named(name, e) => CheckedCallArg::Named(name.clone(), self.lower_expr(e, None)),
            })
            .collect()
    }

    fn lower_call(&mut self, call: &Call, location: Location) -> CheckedExpr {
        match call {
            Call::Fun { name, args } => {
                let args = self.lower_call_args(args);
                let arg_tys: Vec<TypeId> = args
                    .iter()
                    .map(|a| match a {
                        CheckedCallArg::Positional(e) | CheckedCallArg::Named(_, e) => e.ty,
                    })
                    .collect();
                let (global_name, return_type) = self.resolve_fun_call(name, &arg_tys, location);
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::Fun { global_name, args }), return_type, location)
            }
            Call::FunSys { name, args } => {
                let args = self.lower_call_args(args);
                let ty = self.types_any();
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::FunSys { name: name.clone(), args }), ty, location)
            }
            Call::FunBuiltin { name, args } => {
                let args = self.lower_call_args(args);
                let ty = self.types_any();
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::FunBuiltin { name: name.clone(), args }), ty, location)
            }
            Call::Len(inner) => {
                let inner = self.lower_expr(inner, None);
                let ty = self.types.intern(CheckedDataTypeKind::Usize);
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::Len(Box::new(inner))), ty, location)
            }
            Call::Record { name, fields } => {
                let fields: Vec<(String, CheckedExpr)> = fields.iter().map(|(n, e)| (n.clone(), self.lower_expr(e, None))).collect();
                let ty = self.types.intern(CheckedDataTypeKind::Custom { name: name.clone(), generics: Vec::new() });
                if !self.record_fields.contains_key(name) {
                    self.error(location, format!("unknown record type `{name}`"));
                }
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::Record { name: name.clone(), fields }), ty, location)
            }
            Call::Variant { name, variant, args } => {
                let args = self.lower_call_args(args);
                let ty = self.types.intern(CheckedDataTypeKind::Custom { name: name.clone(), generics: Vec::new() });
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::Variant { name: name.clone(), variant: variant.clone(), args }), ty, location)
            }
            Call::Method { base, name, args } => {
                let base = self.lower_expr(base, None);
                let args = self.lower_call_args(args);
                let object_name = match &self.types.get(base.ty).kind {
                    CheckedDataTypeKind::Custom { name, .. } => Some(name.clone()),
                    _ => None,
                };
                let ty = object_name
                    .and_then(|object_name| self.method_returns.get(&(object_name, name.clone())).copied())
                    .unwrap_or_else(|| self.types_unknown());
                CheckedExpr::new(CheckedExprKind::Call(CheckedCall::Method { base: Box::new(base), name: name.clone(), args }), ty, location)
            }
        }
    }

    /// Resolves a plain function call, monomorphizing on demand: if the
    /// callee's declared signature still has unbound [`CheckedDataTypeKind::Generic`]
    /// slots, this substitutes them from the argument types and records the
    /// resulting `base$T1$T2…` signature the first time a given
    /// instantiation is seen (spec.md §4.5.4).
    fn resolve_fun_call(&mut self, name: &str, arg_tys: &[TypeId], location: Location) -> (String, TypeId) {
        let Some(signatures) = self.mono_signatures.get(name).cloned() else {
            self.error(location, format!("cannot find function `{name}`"));
            let unknown = self.types_unknown();
            return (name.to_string(), unknown);
        };
        let Some(base) = signatures.first() else {
            let unknown = self.types_unknown();
            return (name.to_string(), unknown);
        };

        let has_generics = base.params.iter().any(|&p| matches!(self.types.get(p).kind, CheckedDataTypeKind::Generic(_)));
        if !has_generics {
            return (base.global_name.clone(), base.return_type);
        }

        let mut substitutions: HashMap<String, TypeId> = HashMap::new();
        for (&param, &arg) in base.params.iter().zip(arg_tys) {
            if let CheckedDataTypeKind::Generic(g) = &self.types.get(param).kind {
                substitutions.entry(g.clone()).or_insert(arg);
            }
        }

        let mono_params: Vec<TypeId> = base.params.iter().map(|&p| self.substitute(p, &substitutions)).collect();
        let mono_return = self.substitute(base.return_type, &substitutions);
        let mut suffix = String::new();
        for &p in &mono_params {
            suffix.push('$');
            suffix.push_str(&self.type_name(p));
        }
        let global_name = format!("{name}{suffix}");

        let entry = self.mono_signatures.entry(name.to_string()).or_insert_with(Vec::new);
        if !entry.iter().any(|s| s.global_name == global_name) {
            entry.push(CheckedFunSignature { params: mono_params, return_type: mono_return, global_name: global_name.clone() });
        }
        (global_name, mono_return)
    }

    fn substitute(&mut self, ty: TypeId, substitutions: &HashMap<String, TypeId>) -> TypeId {
        if let CheckedDataTypeKind::Generic(g) = &self.types.get(ty).kind {
            if let Some(&concrete) = substitutions.get(g) {
                return concrete;
            }
        }
        ty
    }

    fn type_name(&self, ty: TypeId) -> String {
        match &self.types.get(ty).kind {
            CheckedDataTypeKind::Custom { name, .. } => name.clone(),
            other => format!("{other:?}"),
        }
    }

    fn lower_binary(&mut self, op: BinaryOp, left: &AstExpr, right: &AstExpr, location: Location) -> CheckedExpr {
        let left = self.lower_expr(left, None);
        let is_assignment = OperatorRegister::binary_op_name(op) == "=";
        let right = self.lower_expr(right, if is_assignment { Some(left.ty) } else { None });

        let ty = if is_assignment {
            left.ty
        } else {
            let name = OperatorRegister::binary_op_name(op);
            match self.operators.search(name, &[left.ty, right.ty]) {
                Some(sig) => sig.return_type,
                None => {
                    let candidates = self.operators.collect_all(name, 2);
                    if candidates.is_empty() {
                        self.error(location, format!("no operator `{name}` for the given operand types"));
                        self.types_unknown()
                    } else {
                        let conditions = candidates
                            .iter()
                            .map(|c| crate::checked::data_type::ChoiceCondition { left: c.params[0], right: c.params[1], result: c.return_type })
                            .collect();
                        self.types.intern(CheckedDataTypeKind::CompilerChoice(conditions))
                    }
                }
            }
        };

        CheckedExpr::new(CheckedExprKind::Binary { op, left: Box::new(left), right: Box::new(right) }, ty, location)
    }

    fn lower_unary(&mut self, op: UnaryOp, operand: &AstExpr, location: Location) -> CheckedExpr {
        let operand = self.lower_expr(operand, None);
        let ty = match op {
            UnaryOp::Not => self.types.intern(CheckedDataTypeKind::Bool),
            UnaryOp::Neg => operand.ty,
            UnaryOp::AddressOf | UnaryOp::RefKeyword => self.types.intern(CheckedDataTypeKind::Ref(operand.ty)),
            UnaryOp::Deref => match &self.types.get(operand.ty).kind {
                CheckedDataTypeKind::Ref(inner) | CheckedDataTypeKind::Ptr(inner) => *inner,
                _ => {
                    self.error(location, "cannot dereference a non-pointer type");
                    self.types_unknown()
                }
            },
        };
        CheckedExpr::new(CheckedExprKind::Unary { op, operand: Box::new(operand) }, ty, location)
    }
}

/// Walks a checked function body for `raise` statements (spec.md §4.5.7),
/// including those nested inside control flow but not inside a `try` that
/// already catches them.
fn scan_can_raise(body: &[CheckedStmt]) -> (bool, Vec<TypeId>) {
    let mut raised = Vec::new();
    scan_stmts(body, &mut raised);
    (!raised.is_empty(), raised)
}

fn scan_stmts(stmts: &[CheckedStmt], raised: &mut Vec<TypeId>) {
    for stmt in stmts {
        scan_stmt(stmt, raised);
    }
}

fn scan_stmt(stmt: &CheckedStmt, raised: &mut Vec<TypeId>) {
    match &stmt.kind {
        CheckedStmtKind::Raise(e) => raised.push(e.ty),
        CheckedStmtKind::Block(body) | CheckedStmtKind::Unsafe(body) => scan_stmts(body, raised),
        CheckedStmtKind::Defer(inner) => scan_stmt(inner, raised),
        CheckedStmtKind::If { branches, else_body } => {
            for branch in branches {
                scan_stmts(&branch.body, raised);
            }
            if let Some(else_body) = else_body {
                scan_stmts(else_body, raised);
            }
        }
        CheckedStmtKind::Switch { case, default, .. } => {
            for sub_case in &case.sub_cases {
                scan_stmts(&sub_case.body, raised);
            }
            if let Some(default) = default {
                scan_stmts(default, raised);
            }
        }
        CheckedStmtKind::For { body, .. } => scan_stmts(body, raised),
        // A `try` block's own raises are caught locally; only the catch
        // body's raises propagate to the enclosing function.
        CheckedStmtKind::Try { catch_body, .. } => scan_stmts(catch_body, raised),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstDeclKind, AstExpr, AstExprKind, ConstantDecl, FunDecl};
    use crate::token::{Position, SourceFileId};

    fn loc() -> Location {
        let p = Position::default();
        Location::new(SourceFileId(0), p, p)
    }

    #[test]
    fn a_literal_constant_is_assigned_its_default_type() {
        let decl = AstDecl::new(
            AstDeclKind::Constant(ConstantDecl { name: "x".into(), ty: None, value: AstExpr::new(AstExprKind::Literal(Literal::SuffixI32(1)), loc()) }),
            loc(),
        );
        let analyzed = analyze_package(&[decl], &[]);
        assert!(analyzed.errors.is_empty());
        match &analyzed.decls[0] {
            CheckedDecl::Constant(c) => assert!(matches!(c.value.kind, CheckedExprKind::Literal(_))),
            _ => panic!("expected constant"),
        }
    }

    #[test]
    fn calling_an_undeclared_function_is_reported() {
        let decl = AstDecl::new(
            AstDeclKind::Fun(FunDecl {
                name: "main".into(),
                generics: vec![],
                params: vec![],
                return_type: None,
                body: vec![AstStmt::new(
                    AstStmtKind::Expr(AstExpr::new(AstExprKind::Call(Call::Fun { name: "missing".into(), args: vec![] }), loc())),
                    loc(),
                )],
            }),
            loc(),
        );
        let analyzed = analyze_package(&[decl], &[]);
        assert_eq!(analyzed.errors.len(), 1);
    }

    #[test]
    fn binary_addition_on_two_integers_resolves_through_the_operator_register() {
        let left = AstExpr::new(AstExprKind::Literal(Literal::SuffixI32(1)), loc());
        let right = AstExpr::new(AstExprKind::Literal(Literal::SuffixI32(2)), loc());
        let decl = AstDecl::new(
            AstDeclKind::Constant(ConstantDecl {
                name: "sum".into(),
                ty: None,
                value: AstExpr::new(AstExprKind::Binary { op: BinaryOp::Add, left: Box::new(left), right: Box::new(right) }, loc()),
            }),
            loc(),
        );
        let analyzed = analyze_package(&[decl], &[]);
        assert!(analyzed.errors.is_empty());
    }

    fn fun_decl(name: &str, body: Vec<AstStmt>) -> AstDecl {
        AstDecl::new(
            AstDeclKind::Fun(FunDecl { name: name.into(), generics: vec![], params: vec![], return_type: None, body }),
            loc(),
        )
    }

    fn call_stmt(name: &str) -> AstStmt {
        AstStmt::new(AstStmtKind::Expr(AstExpr::new(AstExprKind::Call(Call::Fun { name: name.into(), args: vec![] }), loc())), loc())
    }

    #[test]
    fn a_self_recursive_function_resolves_its_own_call() {
        let decl = fun_decl("fact", vec![call_stmt("fact")]);
        let analyzed = analyze_package(&[decl], &[]);
        assert!(analyzed.errors.is_empty(), "{:?}", analyzed.errors.iter().map(|e| &e.msg).collect::<Vec<_>>());
    }

    #[test]
    fn a_function_can_call_another_declared_later_in_the_same_package() {
        let caller = fun_decl("main", vec![call_stmt("helper")]);
        let callee = fun_decl("helper", vec![]);
        let analyzed = analyze_package(&[caller, callee], &[]);
        assert!(analyzed.errors.is_empty(), "{:?}", analyzed.errors.iter().map(|e| &e.msg).collect::<Vec<_>>());
    }

    #[test]
    fn a_function_call_resolves_against_an_imported_package_declaration() {
        let imported = fun_decl("helper", vec![]);
        let caller = fun_decl("main", vec![call_stmt("helper")]);
        let analyzed = analyze_package(&[caller], &[imported]);
        assert!(analyzed.errors.is_empty(), "{:?}", analyzed.errors.iter().map(|e| &e.msg).collect::<Vec<_>>());
    }

    #[test]
    fn a_switch_missing_an_enum_variant_with_no_catch_all_is_an_exhaustiveness_hole() {
        use crate::ast::{AstDataType, AstDataTypeKind, AstPattern, AstPatternKind, CustomType, TypeBody, TypeDecl};

        let color_ty = AstDecl::new(
            AstDeclKind::Type(TypeDecl { name: "Color".into(), generics: vec![], body: TypeBody::Enum(vec![("Red".into(), None), ("Green".into(), None)]) }),
            loc(),
        );
        let param_ty = AstDataType::new(AstDataTypeKind::Custom(CustomType { name: "Color".into(), generics: vec![] }), loc());
        let red_case = crate::ast::SwitchCase {
            pattern: AstPattern::new(AstPatternKind::VariantCall { name: "Color".into(), variant: "Red".into(), args: vec![] }, loc()),
            body: vec![],
        };
        let describe = AstDecl::new(
            AstDeclKind::Fun(FunDecl {
                name: "describe".into(),
                generics: vec![],
                params: vec![FunParam { name: "c".into(), ty: Some(param_ty), default: None }],
                return_type: None,
                body: vec![AstStmt::new(
                    AstStmtKind::Switch { scrutinee: AstExpr::new(AstExprKind::Identifier("c".into()), loc()), cases: vec![red_case], default: None },
                    loc(),
                )],
            }),
            loc(),
        );

        let analyzed = analyze_package(&[color_ty, describe], &[]);
        assert_eq!(analyzed.errors.len(), 1);
        assert!(analyzed.errors[0].msg.contains("exhaustiveness hole"), "{}", analyzed.errors[0].msg);
    }

    #[test]
    fn a_switch_covering_every_enum_variant_has_no_exhaustiveness_hole() {
        use crate::ast::{AstDataType, AstDataTypeKind, AstPattern, AstPatternKind, CustomType, TypeBody, TypeDecl};

        let color_ty = AstDecl::new(
            AstDeclKind::Type(TypeDecl { name: "Color".into(), generics: vec![], body: TypeBody::Enum(vec![("Red".into(), None), ("Green".into(), None)]) }),
            loc(),
        );
        let param_ty = AstDataType::new(AstDataTypeKind::Custom(CustomType { name: "Color".into(), generics: vec![] }), loc());
        let cases = vec![
            crate::ast::SwitchCase {
                pattern: AstPattern::new(AstPatternKind::VariantCall { name: "Color".into(), variant: "Red".into(), args: vec![] }, loc()),
                body: vec![],
            },
            crate::ast::SwitchCase {
                pattern: AstPattern::new(AstPatternKind::VariantCall { name: "Color".into(), variant: "Green".into(), args: vec![] }, loc()),
                body: vec![],
            },
        ];
        let describe = AstDecl::new(
            AstDeclKind::Fun(FunDecl {
                name: "describe".into(),
                generics: vec![],
                params: vec![FunParam { name: "c".into(), ty: Some(param_ty), default: None }],
                return_type: None,
                body: vec![AstStmt::new(
                    AstStmtKind::Switch { scrutinee: AstExpr::new(AstExprKind::Identifier("c".into()), loc()), cases, default: None },
                    loc(),
                )],
            }),
            loc(),
        );

        let analyzed = analyze_package(&[color_ty, describe], &[]);
        assert!(analyzed.errors.is_empty(), "{:?}", analyzed.errors.iter().map(|e| &e.msg).collect::<Vec<_>>());
    }
}
