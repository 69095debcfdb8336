//! Lowers the checked tree into [`MirModule`] (spec.md §4.6). One
//! `FunctionBuilder` per function walks its body with a "current block"
//! cursor, exactly the way the teacher's `hir::hir_builder::HirBuilder`
//! tracks `current_function`/`current_block` while linearizing control
//! flow, except there's no borrow-checking pass downstream of this one —
//! Lily's MIR feeds an LLVM backend directly.

use crate::checked::{
    CheckedArrayKind, CheckedCall, CheckedCallArg, CheckedDataTypeKind, CheckedDecl, CheckedExpr, CheckedExprKind,
    CheckedFun, CheckedIfBranch, CheckedStmt, CheckedStmtKind, CheckedTypeBody, CheckedTypeTable,
    SwitchCaseValue, SymbolId, TypeId,
};
use crate::mir::block::{MirBlock, MirTerminator};
use crate::mir::function::{FunPrototype, MirFunction, MirParam};
use crate::mir::inst::{BinOp, MirInst, MirInstKind, UnOp};
use crate::mir::module::MirModule;
use crate::mir::value::{BlockId, MirOperand, MirType, MirValue, RegId};
use std::collections::{HashMap, HashSet};

pub fn generate_package(decls: &[CheckedDecl], types: &CheckedTypeTable) -> MirModule {
    let mut module = MirModule::new();
    let mut type_cache = HashMap::new();
    let mut field_order = HashMap::new();
    register_struct_layouts(decls, types, &mut module, &mut type_cache, &mut field_order);

    let mut raising = HashSet::new();
    collect_raising_functions(decls, &mut raising);

    generate_decls(decls, types, &mut module, &mut type_cache, &raising, &field_order);
    module
}

fn generate_decls(
    decls: &[CheckedDecl],
    types: &CheckedTypeTable,
    module: &mut MirModule,
    type_cache: &mut HashMap<TypeId, MirType>,
    raising: &HashSet<String>,
    field_order: &HashMap<String, Vec<String>>,
) {
    for decl in decls {
        match decl {
            CheckedDecl::Fun(fun) => {
                let mir_fun = FunctionBuilder::new(types, module, type_cache, raising, field_order).build(fun);
                module.add_function(mir_fun);
            }
            CheckedDecl::Object(object) => {
                for method in &object.methods {
                    let mir_fun = FunctionBuilder::new(types, module, type_cache, raising, field_order).build(method);
                    module.add_function(mir_fun);
                }
            }
            CheckedDecl::Module(m) => generate_decls(&m.decls, types, module, type_cache, raising, field_order),
            CheckedDecl::Type(_) | CheckedDecl::Error(_) | CheckedDecl::Constant(_) => {}
        }
    }
}

fn collect_raising_functions(decls: &[CheckedDecl], out: &mut HashSet<String>) {
    for decl in decls {
        match decl {
            CheckedDecl::Fun(fun) => collect_raising_fun(fun, out),
            CheckedDecl::Object(object) => object.methods.iter().for_each(|m| collect_raising_fun(m, out)),
            CheckedDecl::Module(m) => collect_raising_functions(&m.decls, out),
            _ => {}
        }
    }
}

fn collect_raising_fun(fun: &CheckedFun, out: &mut HashSet<String>) {
    if fun.can_raise {
        out.insert(fun.global_name.clone());
    }
}

fn register_struct_layouts(
    decls: &[CheckedDecl],
    types: &CheckedTypeTable,
    module: &mut MirModule,
    cache: &mut HashMap<TypeId, MirType>,
    field_order: &mut HashMap<String, Vec<String>>,
) {
    for decl in decls {
        match decl {
            CheckedDecl::Type(t) => {
                if let CheckedTypeBody::Record(fields) = &t.body {
                    let mir_fields = fields.iter().map(|(_, ty)| lower_type(*ty, types, module, cache)).collect();
                    module.register_struct(t.name.clone(), mir_fields);
                    field_order.insert(t.name.clone(), fields.iter().map(|(n, _)| n.clone()).collect());
                }
            }
            CheckedDecl::Object(object) => {
                let mir_fields = object.attributes.iter().map(|(_, ty)| lower_type(*ty, types, module, cache)).collect();
                module.register_struct(object.name.clone(), mir_fields);
                field_order.insert(object.name.clone(), object.attributes.iter().map(|(n, _)| n.clone()).collect());
            }
            CheckedDecl::Module(m) => register_struct_layouts(&m.decls, types, module, cache, field_order),
            _ => {}
        }
    }
}

/// Structural mapping from a checked type to its MIR representation
/// (spec.md §4.6's data-type lowering rules).
fn lower_type(id: TypeId, types: &CheckedTypeTable, module: &mut MirModule, cache: &mut HashMap<TypeId, MirType>) -> MirType {
    if let Some(cached) = cache.get(&id) {
        return cached.clone();
    }
    let ty = match &types.get(id).kind {
        CheckedDataTypeKind::Bool => MirType::I1,
        CheckedDataTypeKind::Char => MirType::U32,
        CheckedDataTypeKind::Cstr => MirType::ptr(MirType::U8),
        CheckedDataTypeKind::Bytes => MirType::ptr(MirType::U8),
        CheckedDataTypeKind::Byte => MirType::U8,
        CheckedDataTypeKind::Str => {
            module.register_struct("str".into(), vec![MirType::ptr(MirType::U8), MirType::Isize]);
            MirType::Struct("str".into())
        }
        CheckedDataTypeKind::Cvoid | CheckedDataTypeKind::Unit | CheckedDataTypeKind::Never | CheckedDataTypeKind::Any => MirType::Unit,
        CheckedDataTypeKind::Int8 => MirType::I8,
        CheckedDataTypeKind::Int16 | CheckedDataTypeKind::Cshort => MirType::I16,
        CheckedDataTypeKind::Int32 | CheckedDataTypeKind::Cint => MirType::I32,
        CheckedDataTypeKind::Int64 | CheckedDataTypeKind::Clong | CheckedDataTypeKind::Clonglong => MirType::I64,
        CheckedDataTypeKind::Isize => MirType::Isize,
        CheckedDataTypeKind::Uint8 => MirType::U8,
        CheckedDataTypeKind::Uint16 | CheckedDataTypeKind::Cushort => MirType::U16,
        CheckedDataTypeKind::Uint32 | CheckedDataTypeKind::Cuint => MirType::U32,
        CheckedDataTypeKind::Uint64 | CheckedDataTypeKind::Culong | CheckedDataTypeKind::Culonglong => MirType::U64,
        CheckedDataTypeKind::Usize => MirType::Usize,
        CheckedDataTypeKind::Float32 | CheckedDataTypeKind::Cfloat => MirType::F32,
        CheckedDataTypeKind::Float64 | CheckedDataTypeKind::Cdouble => MirType::F64,
        CheckedDataTypeKind::Array(kind, elem) => {
            let elem_ty = lower_type(*elem, types, module, cache);
            match kind {
                CheckedArrayKind::Sized(n) => MirType::Array(Box::new(elem_ty), *n),
                CheckedArrayKind::Dynamic | CheckedArrayKind::MultiPointers | CheckedArrayKind::Undetermined => MirType::ptr(elem_ty),
            }
        }
        CheckedDataTypeKind::Ref(inner) | CheckedDataTypeKind::Ptr(inner) | CheckedDataTypeKind::Mut(inner) | CheckedDataTypeKind::Trace(inner) => {
            MirType::ptr(lower_type(*inner, types, module, cache))
        }
        // `optional T` lowers straight to `T`; presence is tracked by a
        // side mechanism the type lowering rule doesn't model.
        CheckedDataTypeKind::Optional(inner) => lower_type(*inner, types, module, cache),
        CheckedDataTypeKind::List(inner) => {
            let elem_ty = lower_type(*inner, types, module, cache);
            let name = format!("list_{elem_ty:?}");
            module.register_struct(name.clone(), vec![MirType::ptr(elem_ty), MirType::Usize, MirType::Usize]);
            MirType::Struct(name)
        }
        CheckedDataTypeKind::Tuple(elems) => {
            let fields: Vec<MirType> = elems.iter().map(|e| lower_type(*e, types, module, cache)).collect();
            let name = format!("tuple_{}", fields.iter().map(|f| format!("{f:?}")).collect::<Vec<_>>().join("_"));
            module.register_struct(name.clone(), fields);
            MirType::Struct(name)
        }
        CheckedDataTypeKind::Custom { name, .. } => MirType::Struct(name.clone()),
        CheckedDataTypeKind::Result { ok, errs } => {
            let ok_ty = lower_type(*ok, types, module, cache);
            let err_ty = if errs.len() == 1 {
                lower_type(errs[0], types, module, cache)
            } else {
                let variants: Vec<MirType> = errs.iter().map(|e| lower_type(*e, types, module, cache)).collect();
                let name = format!("err_union_{}", variants.iter().map(|v| format!("{v:?}")).collect::<Vec<_>>().join("_"));
                module.register_struct(name.clone(), variants);
                MirType::Struct(name)
            };
            let name = format!("result_{ok_ty:?}_{err_ty:?}");
            module.register_struct(name.clone(), vec![MirType::U8, ok_ty, err_ty]);
            MirType::Struct(name)
        }
        CheckedDataTypeKind::Lambda { params, return_type } => MirType::Lambda {
            params: params.iter().map(|p| lower_type(*p, types, module, cache)).collect(),
            return_type: Box::new(lower_type(*return_type, types, module, cache)),
        },
        // Neither should survive a successful analysis pass (spec.md §4.5's
        // contract); map to `unit` as an inert placeholder rather than
        // panicking the generator over an analyzer bug.
        CheckedDataTypeKind::Generic(_) | CheckedDataTypeKind::CompilerChoice(_) | CheckedDataTypeKind::Unknown => MirType::Unit,
    };
    cache.insert(id, ty.clone());
    ty
}

struct TryFrame {
    err_reg: RegId,
    catch_block: BlockId,
    after_block: BlockId,
}

struct FunctionBuilder<'a> {
    types: &'a CheckedTypeTable,
    module: &'a mut MirModule,
    type_cache: &'a mut HashMap<TypeId, MirType>,
    raising: &'a HashSet<String>,
    field_order: &'a HashMap<String, Vec<String>>,
    blocks: Vec<MirBlock>,
    current: BlockId,
    next_reg: u32,
    next_block: u32,
    locals: HashMap<SymbolId, RegId>,
    loop_stack: Vec<(BlockId, BlockId)>,
    try_stack: Vec<TryFrame>,
}

impl<'a> FunctionBuilder<'a> {
    fn new(
        types: &'a CheckedTypeTable,
        module: &'a mut MirModule,
        type_cache: &'a mut HashMap<TypeId, MirType>,
        raising: &'a HashSet<String>,
        field_order: &'a HashMap<String, Vec<String>>,
    ) -> Self {
        FunctionBuilder {
            types,
            module,
            type_cache,
            raising,
            field_order,
            blocks: Vec::new(),
            current: BlockId(0),
            next_reg: 0,
            next_block: 0,
            locals: HashMap::new(),
            loop_stack: Vec::new(),
            try_stack: Vec::new(),
        }
    }

    fn lower_ty(&mut self, id: TypeId) -> MirType {
        lower_type(id, self.types, self.module, self.type_cache)
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.push(MirBlock::new(id));
        id
    }

    fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    fn current_block_mut(&mut self) -> &mut MirBlock {
        let id = self.current;
        self.blocks.iter_mut().find(|b| b.id == id).expect("current block always exists")
    }

    fn fresh_reg(&mut self) -> RegId {
        let id = RegId(self.next_reg);
        self.next_reg += 1;
        id
    }

    fn emit_raw(&mut self, id: RegId, kind: MirInstKind, ty: MirType) {
        self.current_block_mut().insts.push(MirInst { id, kind, ty });
    }

    fn emit(&mut self, kind: MirInstKind, ty: MirType) -> RegId {
        let id = self.fresh_reg();
        self.emit_raw(id, kind, ty);
        id
    }

    /// Binds a symbol to a register, materializing a constant operand into
    /// its own `Val` instruction first — `locals` always maps to a real reg.
    fn materialize(&mut self, operand: MirOperand, ty: MirType) -> RegId {
        match operand {
            MirOperand::Reg(id) => id,
            MirOperand::Const(value) => self.emit(MirInstKind::Val(value), ty),
        }
    }

    fn set_terminator(&mut self, terminator: MirTerminator) {
        self.current_block_mut().terminator = terminator;
    }

    fn terminator_is_open(&self) -> bool {
        matches!(self.blocks.iter().find(|b| b.id == self.current).unwrap().terminator, MirTerminator::Unreachable)
    }

    fn jump_if_open(&mut self, target: BlockId) {
        if self.terminator_is_open() {
            self.set_terminator(MirTerminator::Jmp(target));
        }
    }

    fn build(mut self, fun: &CheckedFun) -> MirFunction {
        let signature = fun.signatures.first().expect("a checked function always carries its own signature");
        let return_type = self.lower_ty(signature.return_type);

        let entry = self.new_block();
        self.switch_to(entry);

        let mut params = Vec::with_capacity(fun.param_symbols.len());
        for (symbol, &param_ty) in fun.param_symbols.iter().zip(&signature.params) {
            let reg = self.fresh_reg();
            self.locals.insert(*symbol, reg);
            params.push(MirParam { reg, ty: self.lower_ty(param_ty) });
        }

        self.lower_stmts(&fun.body);

        if self.terminator_is_open() {
            let implicit = if matches!(return_type, MirType::Unit) { Some(MirOperand::Const(MirValue::Unit)) } else { None };
            self.set_terminator(MirTerminator::Ret(implicit));
        }

        MirFunction { global_name: fun.global_name.clone(), params, return_type, blocks: self.blocks, can_raise: fun.can_raise }
    }

    fn lower_stmts(&mut self, stmts: &[CheckedStmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &CheckedStmt) {
        match &stmt.kind {
            CheckedStmtKind::Block(body) | CheckedStmtKind::Unsafe(body) => self.lower_stmts(body),
            CheckedStmtKind::Break => {
                if let Some(&(_, exit)) = self.loop_stack.last() {
                    self.set_terminator(MirTerminator::Jmp(exit));
                }
            }
            CheckedStmtKind::Next => {
                if let Some(&(header, _)) = self.loop_stack.last() {
                    self.set_terminator(MirTerminator::Jmp(header));
                }
            }
            CheckedStmtKind::Drop(e) => {
                self.lower_operand(e);
            }
            // Scope-exit semantics aren't modeled yet: a deferred
            // statement just runs in place. TODO: hoist to the enclosing
            // block's every exit edge once block-parameter support lands.
            CheckedStmtKind::Defer(inner) => self.lower_stmt(inner),
            CheckedStmtKind::Return(value) => {
                let operand = value.as_ref().map(|v| self.lower_operand(v));
                self.set_terminator(MirTerminator::Ret(operand));
            }
            CheckedStmtKind::Raise(e) => {
                let operand = self.lower_operand(e);
                self.raise(operand);
            }
            CheckedStmtKind::Await(e) => {
                self.lower_operand(e);
            }
            CheckedStmtKind::Asm { operands, .. } => {
                for o in operands {
                    self.lower_operand(o);
                }
            }
            CheckedStmtKind::If { branches, else_body } => self.lower_if(branches, else_body.as_deref()),
            CheckedStmtKind::Switch { scrutinee, case, default } => self.lower_switch(scrutinee, case, default.as_deref()),
            CheckedStmtKind::For { binding, iterable, body } => self.lower_for(*binding, iterable, body),
            CheckedStmtKind::Try { body, catch_binding, catch_body } => self.lower_try(body, *catch_binding, catch_body),
            CheckedStmtKind::Variable { symbol, ty, value } => {
                let mir_ty = self.lower_ty(*ty);
                let reg = match value {
                    Some(v) => {
                        let operand = self.lower_operand(v);
                        self.materialize(operand, mir_ty)
                    }
                    None => self.emit(MirInstKind::Val(MirValue::Undef), mir_ty),
                };
                self.locals.insert(*symbol, reg);
            }
            CheckedStmtKind::Expr(e) => {
                self.lower_operand(e);
            }
        }
    }

    fn lower_if(&mut self, branches: &[CheckedIfBranch], else_body: Option<&[CheckedStmt]>) {
        let after = self.new_block();
        for branch in branches {
            let condition = self.lower_operand(&branch.condition);
            let then_block = self.new_block();
            let else_block = self.new_block();
            self.set_terminator(MirTerminator::JmpCond { condition, then_block, else_block });

            self.switch_to(then_block);
            self.lower_stmts(&branch.body);
            self.jump_if_open(after);

            self.switch_to(else_block);
        }
        if let Some(else_body) = else_body {
            self.lower_stmts(else_body);
        }
        self.jump_if_open(after);
        self.switch_to(after);
    }

    fn lower_switch(&mut self, scrutinee: &CheckedExpr, case: &crate::checked::SwitchCase, default: Option<&[CheckedStmt]>) {
        let discriminant = self.lower_operand(scrutinee);
        let switch_block = self.current;
        let after = self.new_block();
        let default_block = self.new_block();

        let mut targets = Vec::with_capacity(case.sub_cases.len());
        for sub_case in &case.sub_cases {
            let value_operand = switch_value_operand(&sub_case.value);
            let block = self.new_block();
            targets.push((value_operand, block));

            self.switch_to(block);
            if let Some(binding) = sub_case.binding {
                let reg = self.fresh_reg();
                self.locals.insert(binding, reg);
            }
            if let Some(guard) = &sub_case.guard {
                let guard_value = self.lower_operand(guard);
                let guard_then = self.new_block();
                self.set_terminator(MirTerminator::JmpCond { condition: guard_value, then_block: guard_then, else_block: default_block });
                self.switch_to(guard_then);
            }
            self.lower_stmts(&sub_case.body);
            self.jump_if_open(after);
        }

        self.switch_to(switch_block);
        self.set_terminator(MirTerminator::Switch { discriminant, cases: targets, default: default_block });

        self.switch_to(default_block);
        if let Some(default) = default {
            self.lower_stmts(default);
        }
        self.jump_if_open(after);

        self.switch_to(after);
    }

    // `for x in iterable` lowers against the iterator protocol's
    // `has_next`/`next` pair; since those aren't distinct MIR ops yet this
    // emits placeholder calls rather than the real ABI (see DESIGN.md).
    fn lower_for(&mut self, binding: SymbolId, iterable: &CheckedExpr, body: &[CheckedStmt]) {
        let iterable_reg = self.lower_operand(iterable);
        self.module.register_prototype(FunPrototype { global_name: "has_next".into(), params: vec![MirType::Unit], return_type: MirType::I1 });
        self.module.register_prototype(FunPrototype { global_name: "next".into(), params: vec![MirType::Unit], return_type: MirType::Unit });

        let header = self.new_block();
        let loop_body = self.new_block();
        let exit = self.new_block();

        self.set_terminator(MirTerminator::Jmp(header));

        self.switch_to(header);
        let has_next = self.emit(MirInstKind::Call { callee: "has_next".into(), args: vec![iterable_reg.clone()] }, MirType::I1);
        self.set_terminator(MirTerminator::JmpCond { condition: MirOperand::Reg(has_next), then_block: loop_body, else_block: exit });

        self.switch_to(loop_body);
        let item_reg = self.emit(MirInstKind::Call { callee: "next".into(), args: vec![iterable_reg] }, MirType::Unit);
        self.locals.insert(binding, item_reg);
        self.loop_stack.push((header, exit));
        self.lower_stmts(body);
        self.loop_stack.pop();
        self.jump_if_open(header);

        self.switch_to(exit);
    }

    fn lower_try(&mut self, body: &[CheckedStmt], catch_binding: Option<SymbolId>, catch_body: &[CheckedStmt]) {
        let err_reg = self.fresh_reg();
        let catch_block = self.new_block();
        let after_block = self.new_block();

        self.try_stack.push(TryFrame { err_reg, catch_block, after_block });
        self.lower_stmts(body);
        self.try_stack.pop();
        self.jump_if_open(after_block);

        self.switch_to(catch_block);
        if let Some(binding) = catch_binding {
            self.locals.insert(binding, err_reg);
        }
        self.lower_stmts(catch_body);
        self.jump_if_open(after_block);

        self.switch_to(after_block);
    }

    /// Raises the already-lowered `operand`: propagates to the nearest
    /// enclosing `try`'s catch block, or to the caller if none is open
    /// (spec.md §4.5.7's `can_raise` propagation mirrored at the MIR
    /// level).
    fn raise(&mut self, operand: MirOperand) {
        if let Some(frame) = self.try_stack.last() {
            let (err_reg, catch_block) = (frame.err_reg, frame.catch_block);
            self.emit_raw(err_reg, MirInstKind::UnwrapResult { value: operand, is_ok: false }, MirType::Unit);
            self.set_terminator(MirTerminator::Jmp(catch_block));
        } else {
            let err_reg = self.emit(MirInstKind::UnwrapResult { value: operand, is_ok: false }, MirType::Unit);
            self.set_terminator(MirTerminator::Ret(Some(MirOperand::Reg(err_reg))));
        }
    }

    fn lower_operand(&mut self, expr: &CheckedExpr) -> MirOperand {
        let ty = self.lower_ty(expr.ty);
        match &expr.kind {
            CheckedExprKind::Literal(lit) => MirOperand::Const(literal_value(lit)),
            CheckedExprKind::Identifier(symbol) => match self.locals.get(symbol) {
                Some(&reg) => MirOperand::Reg(reg),
                None => MirOperand::Const(MirValue::Undef),
            },
            CheckedExprKind::UnresolvedIdentifier(_) => MirOperand::Const(MirValue::Undef),
            CheckedExprKind::Call(call) => self.lower_call(call, ty),
            CheckedExprKind::Binary { op, left, right } => {
                let left_operand = self.lower_operand(left);
                let right_operand = self.lower_operand(right);
                let mir_op = binary_op(*op, &self.lower_ty(left.ty));
                MirOperand::Reg(self.emit(MirInstKind::BinOp { op: mir_op, left: left_operand, right: right_operand }, ty))
            }
            CheckedExprKind::Unary { op, operand } => {
                let operand_value = self.lower_operand(operand);
                let mir_op = match op {
                    crate::ast::UnaryOp::Not => UnOp::Not,
                    crate::ast::UnaryOp::Neg if matches!(self.lower_ty(operand.ty), MirType::F32 | MirType::F64) => UnOp::FNeg,
                    crate::ast::UnaryOp::Neg => UnOp::Neg,
                    crate::ast::UnaryOp::AddressOf | crate::ast::UnaryOp::RefKeyword => {
                        return MirOperand::Reg(self.emit(MirInstKind::GetPtr { base: operand_value }, ty));
                    }
                    crate::ast::UnaryOp::Deref => return MirOperand::Reg(self.emit(MirInstKind::Load { ptr: operand_value }, ty)),
                };
                MirOperand::Reg(self.emit(MirInstKind::UnOp { op: mir_op, operand: operand_value }, ty))
            }
            CheckedExprKind::FieldAccess { base, field } => {
                let base_operand = self.lower_operand(base);
                let index = self.field_index(base.ty, field);
                MirOperand::Reg(self.emit(MirInstKind::GetField { base: base_operand, indices: vec![index] }, ty))
            }
            CheckedExprKind::Cast { expr: inner, to } => {
                let inner_operand = self.lower_operand(inner);
                let to_ty = self.lower_ty(*to);
                MirOperand::Reg(self.emit(MirInstKind::Cast { value: inner_operand, to: to_ty.clone() }, to_ty))
            }
            CheckedExprKind::Tuple(elems) | CheckedExprKind::Array(elems) => {
                let fields: Vec<MirOperand> = elems.iter().map(|e| self.lower_operand(e)).collect();
                let kind = if matches!(expr.kind, CheckedExprKind::Array(_)) { MirInstKind::Array { elements: fields } } else { MirInstKind::Struct { fields } };
                MirOperand::Reg(self.emit(kind, ty))
            }
            CheckedExprKind::Lambda { body, .. } => {
                // Closures aren't lifted to top-level functions by this
                // generator; the body is evaluated inline as a best-effort
                // placeholder value.
                self.lower_operand(body)
            }
        }
    }

    fn field_index(&self, base_ty: TypeId, field: &str) -> u32 {
        if let CheckedDataTypeKind::Custom { name, .. } = &self.types.get(base_ty).kind {
            if let Some(names) = self.field_order.get(name) {
                if let Some(index) = names.iter().position(|n| n == field) {
                    return index as u32;
                }
            }
        }
        0
    }

    fn lower_call(&mut self, call: &CheckedCall, ty: MirType) -> MirOperand {
        match call {
            CheckedCall::Fun { global_name, args } => {
                let operands = self.lower_call_args(args);
                self.register_external_if_needed(global_name, &operands, &ty);
                let raises = self.raising.contains(global_name);
                let result = self.emit(MirInstKind::Call { callee: global_name.clone(), args: operands }, ty.clone());
                if raises {
                    self.check_raise(MirOperand::Reg(result), ty)
                } else {
                    MirOperand::Reg(result)
                }
            }
            CheckedCall::FunSys { name, args } | CheckedCall::FunBuiltin { name, args } => {
                let operands = self.lower_call_args(args);
                self.register_external_if_needed(name, &operands, &ty);
                MirOperand::Reg(self.emit(MirInstKind::Call { callee: name.clone(), args: operands }, ty))
            }
            CheckedCall::Len(inner) => {
                let operand = self.lower_operand(inner);
                self.module.register_prototype(FunPrototype { global_name: "len".into(), params: vec![MirType::Unit], return_type: ty.clone() });
                MirOperand::Reg(self.emit(MirInstKind::Call { callee: "len".into(), args: vec![operand] }, ty))
            }
            CheckedCall::Record { fields, .. } => {
                let operands: Vec<MirOperand> = fields.iter().map(|(_, e)| self.lower_operand(e)).collect();
                MirOperand::Reg(self.emit(MirInstKind::Struct { fields: operands }, ty))
            }
            CheckedCall::Variant { args, .. } => {
                let operands = self.lower_call_args(args);
                MirOperand::Reg(self.emit(MirInstKind::Struct { fields: operands }, ty))
            }
            CheckedCall::Method { base, name, args } => {
                let base_operand = self.lower_operand(base);
                let mut operands = vec![base_operand];
                operands.extend(self.lower_call_args(args));
                self.register_external_if_needed(name, &operands, &ty);
                let raises = self.raising.contains(name);
                let result = self.emit(MirInstKind::Call { callee: name.clone(), args: operands }, ty.clone());
                if raises {
                    self.check_raise(MirOperand::Reg(result), ty)
                } else {
                    MirOperand::Reg(result)
                }
            }
        }
    }

    fn lower_call_args(&mut self, args: &[CheckedCallArg]) -> Vec<MirOperand> {
        args.iter()
            .map(|a| match a {
                CheckedCallArg::Positional(e) | CheckedCallArg::Named(_, e) => self.lower_operand(e),
            })
            .collect()
    }

    fn register_external_if_needed(&mut self, global_name: &str, args: &[MirOperand], return_type: &MirType) {
        if self.module.find_function(global_name).is_some() {
            return;
        }
        let params = args.iter().map(|_| MirType::Unit).collect();
        self.module.register_prototype(FunPrototype { global_name: global_name.to_string(), params, return_type: return_type.clone() });
    }

    /// Inserts the call-site raise-check spec.md §4.6 describes: test the
    /// result's tag, branch to the enclosing `try`'s catch path (or
    /// propagate) on error, continue with the unwrapped `ok` payload.
    fn check_raise(&mut self, result: MirOperand, ok_ty: MirType) -> MirOperand {
        let is_ok = self.emit(MirInstKind::IsOk { value: result.clone() }, MirType::I1);
        let ok_block = self.new_block();
        let err_block = self.new_block();
        self.set_terminator(MirTerminator::JmpCond { condition: MirOperand::Reg(is_ok), then_block: ok_block, else_block: err_block });

        self.switch_to(err_block);
        self.raise(result.clone());

        self.switch_to(ok_block);
        let unwrapped = self.emit(MirInstKind::UnwrapResult { value: result, is_ok: true }, ok_ty);
        MirOperand::Reg(unwrapped)
    }
}

fn switch_value_operand(value: &SwitchCaseValue) -> MirOperand {
    match value {
        SwitchCaseValue::Constant(lit) => MirOperand::Const(literal_value(lit)),
        SwitchCaseValue::Else => MirOperand::Const(MirValue::Undef),
        SwitchCaseValue::Union(values) => values.first().map(switch_value_operand).unwrap_or(MirOperand::Const(MirValue::Undef)),
    }
}

fn literal_value(lit: &crate::ast::Literal) -> MirValue {
    use crate::ast::Literal::*;
    match lit {
        Bool(b) => MirValue::Bool(*b),
        Byte(b) => MirValue::Uint(*b as u64),
        Bytes(bytes) => MirValue::Bytes(bytes.clone()),
        Char(c) => MirValue::Uint(*c as u64),
        Float32(f) => MirValue::Float(*f as f64),
        Float64(f) => MirValue::Float(*f),
        Int { digits, base } => MirValue::Int { digits: digits.clone(), base: *base },
        SuffixI8(v) => MirValue::Int { digits: v.to_string(), base: crate::token::IntBase::Decimal },
        SuffixI16(v) => MirValue::Int { digits: v.to_string(), base: crate::token::IntBase::Decimal },
        SuffixI32(v) => MirValue::Int { digits: v.to_string(), base: crate::token::IntBase::Decimal },
        SuffixI64(v) => MirValue::Int { digits: v.to_string(), base: crate::token::IntBase::Decimal },
        SuffixIsize(v) => MirValue::Int { digits: v.to_string(), base: crate::token::IntBase::Decimal },
        SuffixU8(v) => MirValue::Uint(*v as u64),
        SuffixU16(v) => MirValue::Uint(*v as u64),
        SuffixU32(v) => MirValue::Uint(*v as u64),
        SuffixU64(v) => MirValue::Uint(*v),
        SuffixUsize(v) => MirValue::Uint(*v as u64),
        SuffixF32(f) => MirValue::Float(*f as f64),
        SuffixF64(f) => MirValue::Float(*f),
        Str(s) => MirValue::Str(s.clone()),
        Nil => MirValue::Nil,
        Undef => MirValue::Undef,
        Unit => MirValue::Unit,
    }
}

fn binary_op(op: crate::ast::BinaryOp, left_ty: &MirType) -> BinOp {
    use crate::ast::BinaryOp::*;
    let is_float = matches!(left_ty, MirType::F32 | MirType::F64);
    let is_unsigned = matches!(left_ty, MirType::U8 | MirType::U16 | MirType::U32 | MirType::U64 | MirType::Usize);
    match op {
        Add | AssignAdd => if is_float { BinOp::FAdd } else { BinOp::Add },
        Sub | AssignSub => if is_float { BinOp::FSub } else { BinOp::Sub },
        Mul | AssignMul => if is_float { BinOp::FMul } else { BinOp::Mul },
        Div | AssignDiv => if is_float { BinOp::FDiv } else if is_unsigned { BinOp::UDiv } else { BinOp::SDiv },
        Mod | AssignMod => if is_float { BinOp::FRem } else if is_unsigned { BinOp::URem } else { BinOp::SRem },
        Exp | AssignExp => if is_float { BinOp::FMul } else { BinOp::Mul },
        Eq => if is_float { BinOp::FCmpEq } else { BinOp::CmpEq },
        NotEq => if is_float { BinOp::FCmpNe } else { BinOp::CmpNe },
        Lt => if is_float { BinOp::FCmpLt } else if is_unsigned { BinOp::UCmpLt } else { BinOp::CmpLt },
        LtEq => if is_float { BinOp::FCmpLe } else if is_unsigned { BinOp::UCmpLe } else { BinOp::CmpLe },
        Gt => if is_float { BinOp::FCmpGt } else if is_unsigned { BinOp::UCmpGt } else { BinOp::CmpGt },
        GtEq => if is_float { BinOp::FCmpGe } else if is_unsigned { BinOp::UCmpGe } else { BinOp::CmpGe },
        BitAnd | And => BinOp::And,
        BitOr | Or => BinOp::Or,
        Xor | AssignXor => BinOp::Xor,
        Range | Assign => BinOp::Add,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checked::{analyze_package, CheckedDecl};

    fn analyzed(decls: Vec<crate::ast::AstDecl>) -> (Vec<CheckedDecl>, CheckedTypeTable) {
        let package = analyze_package(&decls, &[]);
        (package.decls, package.types)
    }

    #[test]
    fn a_function_returning_unit_gets_an_implicit_ret() {
        use crate::ast::{AstDecl, AstDeclKind, AstStmt, AstStmtKind, FunDecl};
        use crate::token::{Location, Position, SourceFileId};

        let loc = Location::new(SourceFileId(0), Position::default(), Position::default());
        let fun = AstDecl::new(
            AstDeclKind::Fun(FunDecl { name: "noop".into(), generics: vec![], params: vec![], return_type: None, body: vec![AstStmt::new(AstStmtKind::Break, loc)] }),
            loc,
        );
        let (decls, types) = analyzed(vec![fun]);
        let module = generate_package(&decls, &types);
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].global_name, "noop");
        assert!(module.is_self_consistent());
    }
}
