//! The stack walker: one abstract [`Vec<VariableType>`] per function,
//! pushed and popped by each [`ResolvedItem`] exactly as the corresponding
//! bytecode would push and pop real values at runtime.

use std::collections::HashMap;

use crate::crossref::{
    FunctionArgument, Identifiable, IdentifierKind, Identifiables, ReturnTypeSet, ResolvedBody,
    ResolvedItem, SymbolId, TypeKind, VariableType,
};
use crate::position::Position;

use super::errors::TypeCheckError;
use super::unify::{self, Bindings};
use super::BuiltinTypes;

type TypeStack = Vec<VariableType>;
type Env = HashMap<String, VariableType>;

pub fn check_function(
    id: SymbolId,
    struct_name: Option<&str>,
    name: &str,
    args: &[FunctionArgument],
    return_types: &ReturnTypeSet,
    body: &ResolvedBody,
    identifiables: &Identifiables,
    builtins: &BuiltinTypes,
    errors: &mut Vec<TypeCheckError>,
) {
    let position = match identifiables.get(id) {
        Identifiable::Function(f) => f.position.clone(),
        _ => return,
    };

    if let Some(owner) = struct_name {
        let first_arg_ok = args
            .first()
            .map(|a| a.type_.root_name() == owner)
            .unwrap_or(false);
        let first_return_ok = matches!(
            return_types,
            ReturnTypeSet::Types(types) if matches!(types.first(), Some(t) if t.root_name() == owner)
        );
        if !first_arg_ok || !first_return_ok {
            errors.push(TypeCheckError::InvalidMemberFunctionSignature {
                position: position.clone(),
                struct_name: owner.to_string(),
            });
        }
    }

    if struct_name.is_none() && name == "main" {
        let args_ok = args.is_empty()
            || matches!(args, [single] if single.type_.root_name() == "vec" && matches!(single.type_.type_params().first(), Some(t) if t.root_name() == "str"));
        let returns_ok = matches!(return_types, ReturnTypeSet::Never)
            || matches!(
                return_types,
                ReturnTypeSet::Types(types) if types.is_empty() || matches!(types.as_slice(), [t] if t.root_name() == "int")
            );
        if !args_ok || !returns_ok {
            errors.push(TypeCheckError::InvalidMainSignuture { position: position.clone() });
        }
    }

    let mut env: Env = args.iter().map(|a| (a.name.clone(), a.type_.clone())).collect();
    let mut stack: TypeStack = Vec::new();
    let mut checker = FunctionChecker {
        identifiables,
        builtins,
        return_types: return_types.clone(),
        errors,
    };
    let diverged = checker.check_body(&mut env, &mut stack, body);

    if !diverged {
        let expected = match return_types {
            ReturnTypeSet::Never => {
                // A function declared `never` must never fall off the end
                // of its body without returning or calling another
                // `never` function.
                errors.push(TypeCheckError::FunctionTypeError {
                    position,
                    expected: vec![],
                    found: stack,
                });
                return;
            }
            ReturnTypeSet::Types(types) => types.clone(),
        };
        if stack != expected {
            errors.push(TypeCheckError::FunctionTypeError {
                position,
                expected,
                found: stack,
            });
        }
    }
}

struct FunctionChecker<'a> {
    identifiables: &'a Identifiables,
    builtins: &'a BuiltinTypes,
    return_types: ReturnTypeSet,
    errors: &'a mut Vec<TypeCheckError>,
}

impl<'a> FunctionChecker<'a> {
    /// Returns whether control flow diverges (the rest of the enclosing
    /// body, if any, is unreachable).
    fn check_body(&mut self, env: &mut Env, stack: &mut TypeStack, body: &ResolvedBody) -> bool {
        for item in &body.items {
            if self.check_item(env, stack, item) {
                return true;
            }
        }
        false
    }

    fn check_item(&mut self, env: &mut Env, stack: &mut TypeStack, item: &ResolvedItem) -> bool {
        match item {
            ResolvedItem::IntegerLiteral { .. } => {
                stack.push(self.builtins.int.clone());
                false
            }
            ResolvedItem::StringLiteral { .. } => {
                stack.push(self.builtins.str_.clone());
                false
            }
            ResolvedItem::BooleanLiteral { .. } => {
                stack.push(self.builtins.bool_.clone());
                false
            }
            ResolvedItem::Call(call) => self.check_call(env, stack, &call.kind, &call.position),
            ResolvedItem::GetFunctionPointer { target, position } => {
                if let Identifiable::Function(f) = self.identifiables.get(*target) {
                    let arg_types = f
                        .args
                        .resolved()
                        .map(|args| args.iter().map(|a| a.type_.clone()).collect())
                        .unwrap_or_default();
                    let return_types = f
                        .return_types
                        .resolved()
                        .cloned()
                        .unwrap_or(ReturnTypeSet::Types(vec![]));
                    stack.push(VariableType::FunctionPointer {
                        arg_types,
                        return_types,
                    });
                }
                let _ = position;
                false
            }
            ResolvedItem::FieldQuery { field, position } => {
                let Some(struct_ty) = stack.last().cloned() else {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: vec![],
                        found: vec![],
                        context: format!("field query {field}"),
                    });
                    return false;
                };
                match self.field_type(&struct_ty, field) {
                    Some(field_ty) => stack.push(field_ty),
                    None => self.errors.push(TypeCheckError::UnknownField {
                        position: position.clone(),
                        struct_name: struct_ty.to_string(),
                        field: field.clone(),
                    }),
                }
                false
            }
            ResolvedItem::FieldUpdate { field, body, position } => {
                let Some(struct_ty) = stack.pop() else {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: vec![],
                        found: vec![],
                        context: format!("field update {field}"),
                    });
                    return false;
                };
                let Some(field_ty) = self.field_type(&struct_ty, field) else {
                    self.errors.push(TypeCheckError::UnknownField {
                        position: position.clone(),
                        struct_name: struct_ty.to_string(),
                        field: field.clone(),
                    });
                    stack.push(struct_ty);
                    return false;
                };
                let mut sub_stack = Vec::new();
                self.check_body(env, &mut sub_stack, body);
                if sub_stack.len() != 1 {
                    self.errors.push(TypeCheckError::StructUpdateStackError {
                        position: position.clone(),
                        field: field.clone(),
                        found: sub_stack,
                    });
                } else if sub_stack[0] != field_ty {
                    self.errors.push(TypeCheckError::StructUpdateTypeError {
                        position: position.clone(),
                        field: field.clone(),
                        expected: field_ty,
                        found: sub_stack.into_iter().next().unwrap(),
                    });
                }
                stack.push(struct_ty);
                false
            }
            ResolvedItem::Return { position } => {
                match &self.return_types {
                    ReturnTypeSet::Never => {
                        self.errors.push(TypeCheckError::FunctionTypeError {
                            position: position.clone(),
                            expected: vec![],
                            found: stack.clone(),
                        });
                    }
                    ReturnTypeSet::Types(expected) => {
                        if stack != expected {
                            self.errors.push(TypeCheckError::FunctionTypeError {
                                position: position.clone(),
                                expected: expected.clone(),
                                found: stack.clone(),
                            });
                        }
                    }
                }
                true
            }
            ResolvedItem::IndirectCall { position } => {
                let Some(popped) = stack.pop() else {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: vec![],
                        found: vec![],
                        context: "indirect call".to_string(),
                    });
                    return false;
                };
                let VariableType::FunctionPointer { arg_types, return_types } = popped else {
                    self.errors.push(TypeCheckError::NotAFunctionPointer {
                        position: position.clone(),
                        found: popped,
                    });
                    return false;
                };
                self.apply_signature(stack, &arg_types, &return_types, position)
            }
            ResolvedItem::If {
                condition,
                if_body,
                else_body,
                position,
            } => self.check_if(env, stack, condition, if_body, else_body.as_ref(), position),
            ResolvedItem::While { condition, body, position } => {
                self.check_while(env, stack, condition, body, position)
            }
            ResolvedItem::Foreach { body, position } => self.check_foreach(env, stack, body, position),
            ResolvedItem::Match { cases, default, position } => {
                self.check_match(env, stack, cases, default.as_ref(), position)
            }
            ResolvedItem::Use { variables, body, position } => {
                self.check_use(env, stack, variables, body, position)
            }
            ResolvedItem::Assign { variables, body, position } => {
                self.check_assign(env, stack, variables, body, position)
            }
        }
    }

    fn check_call(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        kind: &IdentifierKind,
        position: &Position,
    ) -> bool {
        match kind {
            IdentifierKind::CallArgument(name) | IdentifierKind::CallLocalVariable(name) => {
                if let Some(ty) = env.get(name) {
                    stack.push(ty.clone());
                }
                false
            }
            IdentifierKind::CallFunction(target) => {
                let Identifiable::Function(f) = self.identifiables.get(*target) else {
                    return false;
                };
                let arg_types: Vec<VariableType> = f
                    .args
                    .resolved()
                    .map(|args| args.iter().map(|a| a.type_.clone()).collect())
                    .unwrap_or_default();
                let return_types = f
                    .return_types
                    .resolved()
                    .cloned()
                    .unwrap_or(ReturnTypeSet::Types(vec![]));
                self.apply_signature(stack, &arg_types, &return_types, position)
            }
            IdentifierKind::CallType(target, params) => {
                if let Identifiable::Type(t) = self.identifiables.get(*target) {
                    stack.push(VariableType::Type {
                        type_id: *target,
                        name: t.name.clone(),
                        params: params.clone(),
                        is_const: false,
                    });
                }
                false
            }
            IdentifierKind::CallEnumConstructor(enum_id, variant) => {
                let Identifiable::Type(t) = self.identifiables.get(*enum_id) else {
                    return false;
                };
                let TypeKind::Enum { variants } = &t.kind else {
                    return false;
                };
                let data = variants
                    .iter()
                    .find(|(name, _)| name == variant)
                    .and_then(|(_, data)| data.resolved())
                    .cloned()
                    .unwrap_or_default();
                if stack.len() < data.len() {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: data,
                        found: stack.clone(),
                        context: format!("enum constructor {variant}"),
                    });
                    return false;
                }
                let split_at = stack.len() - data.len();
                let actual: Vec<VariableType> = stack.split_off(split_at);
                if actual != data {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: data,
                        found: actual,
                        context: format!("enum constructor {variant}"),
                    });
                }
                stack.push(VariableType::Type {
                    type_id: *enum_id,
                    name: t.name.clone(),
                    params: vec![],
                    is_const: false,
                });
                false
            }
        }
    }

    /// Pops `arg_types.len()` actual values, unifies them against
    /// `arg_types` (binding placeholders), then pushes the substituted
    /// return types. Returns whether the call diverges (`never`).
    fn apply_signature(
        &mut self,
        stack: &mut TypeStack,
        arg_types: &[VariableType],
        return_types: &ReturnTypeSet,
        position: &Position,
    ) -> bool {
        if stack.len() < arg_types.len() {
            self.errors.push(TypeCheckError::StackTypesError {
                position: position.clone(),
                expected: arg_types.to_vec(),
                found: stack.clone(),
                context: "function call".to_string(),
            });
            return false;
        }
        let split_at = stack.len() - arg_types.len();
        let actuals: Vec<VariableType> = stack.split_off(split_at);

        let mut bindings: Bindings = Bindings::new();
        let unified = arg_types
            .iter()
            .zip(&actuals)
            .all(|(expected, actual)| unify::unify(expected, actual, &mut bindings));

        if !unified {
            self.errors.push(TypeCheckError::FunctionTypeError {
                position: position.clone(),
                expected: arg_types.to_vec(),
                found: actuals,
            });
            return false;
        }

        match return_types {
            ReturnTypeSet::Never => true,
            ReturnTypeSet::Types(types) => {
                for t in types {
                    stack.push(unify::substitute(t, &bindings));
                }
                false
            }
        }
    }

    fn field_type(&self, struct_ty: &VariableType, field: &str) -> Option<VariableType> {
        let VariableType::Type { type_id, params, .. } = struct_ty else {
            return None;
        };
        let Identifiable::Type(t) = self.identifiables.get(*type_id) else {
            return None;
        };
        let TypeKind::Struct { type_params, fields } = &t.kind else {
            return None;
        };
        let declared = fields.iter().find(|(name, _)| name == field)?.1.resolved()?;
        let bindings: Bindings = type_params.iter().cloned().zip(params.iter().cloned()).collect();
        Some(unify::substitute(declared, &bindings))
    }

    /// Runs `body` starting from a clone of `stack`; the body must leave
    /// exactly one additional `bool` on top for `stack` to be a valid
    /// condition. Returns the popped-back stack (post-evaluation, before
    /// the branch decision) on success.
    fn check_condition(
        &mut self,
        env: &mut Env,
        stack: &TypeStack,
        condition: &ResolvedBody,
        position: &Position,
    ) -> Option<TypeStack> {
        let mut cond_stack = stack.clone();
        let diverged = self.check_body(env, &mut cond_stack, condition);
        if diverged {
            return None;
        }
        match cond_stack.pop() {
            Some(VariableType::Type { ref name, .. }) if name == "bool" => {
                if cond_stack == *stack {
                    Some(cond_stack)
                } else {
                    self.errors.push(TypeCheckError::ConditionTypeError {
                        position: position.clone(),
                        found: Some(self.builtins.bool_.clone()),
                    });
                    None
                }
            }
            other => {
                self.errors.push(TypeCheckError::ConditionTypeError {
                    position: position.clone(),
                    found: other,
                });
                None
            }
        }
    }

    fn check_if(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        condition: &ResolvedBody,
        if_body: &ResolvedBody,
        else_body: Option<&ResolvedBody>,
        position: &Position,
    ) -> bool {
        let Some(branch_stack) = self.check_condition(env, stack, condition, position) else {
            *stack = Vec::new();
            return true;
        };

        let mut if_stack = branch_stack.clone();
        let if_diverged = self.check_body(env, &mut if_stack, if_body);

        match else_body {
            Some(else_body) => {
                let mut else_stack = branch_stack;
                let else_diverged = self.check_body(env, &mut else_stack, else_body);
                match (if_diverged, else_diverged) {
                    (true, true) => {
                        *stack = Vec::new();
                        true
                    }
                    (true, false) => {
                        *stack = else_stack;
                        false
                    }
                    (false, true) => {
                        *stack = if_stack;
                        false
                    }
                    (false, false) => {
                        if if_stack != else_stack {
                            self.errors.push(TypeCheckError::BranchTypeError {
                                position: position.clone(),
                                if_stack: if_stack.clone(),
                                else_stack,
                            });
                        }
                        *stack = if_stack;
                        false
                    }
                }
            }
            None => {
                if !if_diverged && if_stack != branch_stack {
                    self.errors.push(TypeCheckError::BranchTypeError {
                        position: position.clone(),
                        if_stack,
                        else_stack: branch_stack.clone(),
                    });
                    *stack = branch_stack;
                } else if if_diverged {
                    *stack = branch_stack;
                } else {
                    *stack = if_stack;
                }
                false
            }
        }
    }

    fn check_while(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        condition: &ResolvedBody,
        body: &ResolvedBody,
        position: &Position,
    ) -> bool {
        let Some(branch_stack) = self.check_condition(env, stack, condition, position) else {
            *stack = Vec::new();
            return true;
        };
        let mut body_stack = branch_stack.clone();
        let diverged = self.check_body(env, &mut body_stack, body);
        if !diverged && body_stack != branch_stack {
            self.errors.push(TypeCheckError::LoopTypeError {
                position: position.clone(),
                before: branch_stack.clone(),
                after: body_stack,
            });
        }
        *stack = branch_stack;
        false
    }

    /// Foreach is sugar over a container's `iter`/`const_iter` and the
    /// resulting iterator's `next`. `next` is expected to have the shape
    /// `args iter as Iter return Iter, bool, T` (continuation iterator,
    /// has-next flag, element), mirroring how the other loop forms expose
    /// their condition as a trailing bool.
    fn check_foreach(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        body: &ResolvedBody,
        position: &Position,
    ) -> bool {
        let Some(container) = stack.pop() else {
            self.errors.push(TypeCheckError::StackTypesError {
                position: position.clone(),
                expected: vec![],
                found: vec![],
                context: "foreach".to_string(),
            });
            return false;
        };

        let Some(element) = self.foreach_element_type(&container) else {
            self.errors.push(TypeCheckError::NotAStruct {
                position: position.clone(),
                found: container,
            });
            return false;
        };

        let mut body_stack = stack.clone();
        body_stack.push(element);
        let diverged = self.check_body(env, &mut body_stack, body);
        if !diverged && body_stack != *stack {
            self.errors.push(TypeCheckError::LoopTypeError {
                position: position.clone(),
                before: stack.clone(),
                after: body_stack,
            });
        }
        false
    }

    fn foreach_element_type(&self, container: &VariableType) -> Option<VariableType> {
        let root = container.root_name();
        let iter_key = format!("{root}:iter");
        let const_iter_key = format!("{root}:const_iter");
        let iter_fn = self
            .lookup_member(&iter_key)
            .or_else(|| self.lookup_member(&const_iter_key))?;
        let Identifiable::Function(iter_fn) = self.identifiables.get(iter_fn) else {
            return None;
        };
        let iterator_type = match iter_fn.return_types.resolved()? {
            ReturnTypeSet::Types(types) => types.first()?.clone(),
            ReturnTypeSet::Never => return None,
        };
        let next_key = format!("{}:next", iterator_type.root_name());
        let next_fn = self.lookup_member(&next_key)?;
        let Identifiable::Function(next_fn) = self.identifiables.get(next_fn) else {
            return None;
        };
        match next_fn.return_types.resolved()? {
            ReturnTypeSet::Types(types) if types.len() == 3 => Some(types[2].clone()),
            _ => None,
        }
    }

    fn lookup_member(&self, key: &str) -> Option<SymbolId> {
        self.identifiables.iter().find_map(|(id, item)| match item {
            Identifiable::Function(f) if f.symbol_name() == key => Some(id),
            _ => None,
        })
    }

    fn check_match(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        cases: &[crate::crossref::ResolvedMatchCase],
        default: Option<&ResolvedBody>,
        position: &Position,
    ) -> bool {
        let Some(matched) = stack.pop() else {
            self.errors.push(TypeCheckError::StackTypesError {
                position: position.clone(),
                expected: vec![],
                found: vec![],
                context: "match".to_string(),
            });
            return false;
        };
        let VariableType::Type { type_id, .. } = &matched else {
            self.errors.push(TypeCheckError::NotAnEnum {
                position: position.clone(),
                found: matched,
            });
            return false;
        };
        let all_variants: Vec<String> = match self.identifiables.get(*type_id) {
            Identifiable::Type(t) => match &t.kind {
                TypeKind::Enum { variants } => variants.iter().map(|(n, _)| n.clone()).collect(),
                _ => vec![],
            },
            _ => vec![],
        };

        if default.is_none() {
            let mut seen = std::collections::HashSet::new();
            for case in cases {
                if !seen.insert(case.variant.clone()) {
                    self.errors.push(TypeCheckError::DuplicateMatchCase {
                        position: case.position.clone(),
                        variant: case.variant.clone(),
                    });
                }
            }
            let missing: Vec<String> = all_variants
                .iter()
                .filter(|v| !seen.contains(*v))
                .cloned()
                .collect();
            if !missing.is_empty() {
                self.errors.push(TypeCheckError::NonExhaustiveMatch {
                    position: position.clone(),
                    missing_variants: missing,
                });
            }
        }

        let variant_data: HashMap<&str, Vec<VariableType>> = match self.identifiables.get(*type_id) {
            Identifiable::Type(t) => match &t.kind {
                TypeKind::Enum { variants } => variants
                    .iter()
                    .map(|(n, d)| (n.as_str(), d.resolved().cloned().unwrap_or_default()))
                    .collect(),
                _ => HashMap::new(),
            },
            _ => HashMap::new(),
        };

        let mut branch_stacks: Vec<(Position, TypeStack, bool)> = Vec::new();
        for case in cases {
            let mut case_stack = stack.clone();
            let data = variant_data.get(case.variant.as_str()).cloned().unwrap_or_default();
            for (name, ty) in case.bindings.iter().zip(&data) {
                env.insert(name.clone(), ty.clone());
            }
            let diverged = self.check_body(env, &mut case_stack, &case.body);
            for name in &case.bindings {
                env.remove(name);
            }
            branch_stacks.push((case.position.clone(), case_stack, diverged));
        }
        if let Some(default_body) = default {
            let mut default_stack = stack.clone();
            let diverged = self.check_body(env, &mut default_stack, default_body);
            branch_stacks.push((position.clone(), default_stack, diverged));
        }

        let live: Vec<&TypeStack> = branch_stacks
            .iter()
            .filter(|(_, _, diverged)| !diverged)
            .map(|(_, s, _)| s)
            .collect();
        if let Some(first) = live.first() {
            if live.iter().any(|s| *s != *first) {
                self.errors.push(TypeCheckError::BranchTypeError {
                    position: position.clone(),
                    if_stack: (*first).clone(),
                    else_stack: live
                        .iter()
                        .find(|s| **s != *first)
                        .map(|s| (*s).clone())
                        .unwrap_or_default(),
                });
            }
            *stack = (*first).clone();
        } else {
            *stack = Vec::new();
            return true;
        }
        false
    }

    fn check_use(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        variables: &[String],
        body: &ResolvedBody,
        position: &Position,
    ) -> bool {
        if stack.len() < variables.len() {
            self.errors.push(TypeCheckError::StackTypesError {
                position: position.clone(),
                expected: vec![],
                found: stack.clone(),
                context: "use".to_string(),
            });
            return false;
        }
        let split_at = stack.len() - variables.len();
        let popped: Vec<VariableType> = stack.split_off(split_at);
        let mut shadowed = Vec::new();
        for (name, ty) in variables.iter().rev().zip(popped.into_iter().rev()) {
            shadowed.push((name.clone(), env.insert(name.clone(), ty)));
        }
        let diverged = self.check_body(env, stack, body);
        for (name, previous) in shadowed {
            match previous {
                Some(ty) => {
                    env.insert(name, ty);
                }
                None => {
                    env.remove(&name);
                }
            }
        }
        diverged
    }

    fn check_assign(
        &mut self,
        env: &mut Env,
        stack: &mut TypeStack,
        variables: &[String],
        body: &ResolvedBody,
        position: &Position,
    ) -> bool {
        let mut rhs_stack = Vec::new();
        let diverged = self.check_body(env, &mut rhs_stack, body);
        if diverged {
            return true;
        }
        if rhs_stack.len() != variables.len() {
            self.errors.push(TypeCheckError::StackTypesError {
                position: position.clone(),
                expected: vec![],
                found: rhs_stack,
                context: "assignment".to_string(),
            });
            return false;
        }
        for (name, new_ty) in variables.iter().rev().zip(rhs_stack.into_iter().rev()) {
            match env.get(name) {
                Some(existing) if *existing == new_ty => {}
                Some(existing) => {
                    self.errors.push(TypeCheckError::StackTypesError {
                        position: position.clone(),
                        expected: vec![existing.clone()],
                        found: vec![new_ty],
                        context: format!("assignment to {name}"),
                    });
                }
                None => {
                    self.errors.push(TypeCheckError::UnknownVariable {
                        position: position.clone(),
                        name: name.clone(),
                    });
                }
            }
        }
        false
    }
}
