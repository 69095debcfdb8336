//! Operator register (spec.md §4.5.5), grounded verbatim in
//! `analysis/checked/operator_register.c`'s
//! `add_operator__LilyCheckedOperatorRegister` /
//! `search_operator__LilyCheckedOperatorRegister`: a flat list of
//! `(name, positional signature, return type)` triples, searched linearly by
//! name plus exact positional-type match, with duplicate signatures
//! rejected at insertion.

use crate::ast::BinaryOp;
use crate::checked::data_type::TypeId;

#[derive(Debug, Clone)]
pub struct OperatorSignature {
    pub name: String,
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
}

#[derive(Debug, Default)]
pub struct OperatorRegister {
    operators: Vec<OperatorSignature>,
}

impl OperatorRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `op` unless an operator with the same name and identical
    /// positional parameter types is already registered. Returns `false`
    /// (and leaves the register unchanged) on a duplicate, mirroring the C
    /// function's `0`/`1` result.
    pub fn add(&mut self, op: OperatorSignature) -> bool {
        if self.search(&op.name, &op.params).is_some() {
            return false;
        }
        self.operators.push(op);
        true
    }

    pub fn search(&self, name: &str, params: &[TypeId]) -> Option<&OperatorSignature> {
        self.operators
            .iter()
            .find(|op| op.name == name && op.params.len() == params.len() && op.params == params)
    }

    /// Every registered signature sharing `name` and arity, regardless of
    /// operand types — the candidate set a still-unconstrained operand
    /// narrows against (spec.md §4.5.4's compiler-choice construction).
    pub fn collect_all(&self, name: &str, arity: usize) -> Vec<&OperatorSignature> {
        self.operators.iter().filter(|op| op.name == name && op.params.len() == arity).collect()
    }

    pub fn binary_op_name(op: BinaryOp) -> &'static str {
        use BinaryOp::*;
        match op {
            Exp => "**",
            Mul => "*",
            Div => "/",
            Mod => "%",
            Add => "+",
            Sub => "-",
            Lt => "<",
            LtEq => "<=",
            Gt => ">",
            GtEq => ">=",
            Eq => "==",
            NotEq => "!=",
            BitAnd => "&",
            Xor => "^",
            BitOr => "|",
            And => "&&",
            Or => "||",
            Range => "..",
            Assign | AssignAdd | AssignSub | AssignMul | AssignDiv | AssignMod | AssignExp | AssignXor => "=",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_signature_is_rejected() {
        let mut register = OperatorRegister::new();
        let sig = OperatorSignature { name: "+".into(), params: vec![TypeId(0), TypeId(0)], return_type: TypeId(0) };
        assert!(register.add(sig.clone()));
        assert!(!register.add(sig));
    }

    #[test]
    fn collect_all_filters_by_name_and_arity() {
        let mut register = OperatorRegister::new();
        register.add(OperatorSignature { name: "+".into(), params: vec![TypeId(0), TypeId(0)], return_type: TypeId(0) });
        register.add(OperatorSignature { name: "+".into(), params: vec![TypeId(1), TypeId(1)], return_type: TypeId(1) });
        register.add(OperatorSignature { name: "-".into(), params: vec![TypeId(0), TypeId(0)], return_type: TypeId(0) });
        assert_eq!(register.collect_all("+", 2).len(), 2);
    }
}
