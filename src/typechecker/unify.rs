//! Generic placeholder unification, the mechanism that lets one `vec:push`
//! declaration (`args v as vec[A], item as A`) type-check a call site with
//! concrete types substituted in for `A`.

use std::collections::HashMap;

use crate::crossref::{ReturnTypeSet, VariableType};

pub type Bindings = HashMap<String, VariableType>;

/// Attempts to unify a declared (possibly placeholder-containing) type
/// against a concrete actual type, recording placeholder bindings as it
/// goes. A placeholder bound once must agree with every later occurrence.
pub fn unify(expected: &VariableType, actual: &VariableType, bindings: &mut Bindings) -> bool {
    match expected {
        VariableType::Placeholder { name, .. } => match bindings.get(name) {
            Some(bound) => bound == actual,
            None => {
                bindings.insert(name.clone(), actual.clone());
                true
            }
        },
        VariableType::Type {
            type_id,
            params: expected_params,
            ..
        } => match actual {
            VariableType::Type {
                type_id: actual_id,
                params: actual_params,
                ..
            } => {
                type_id == actual_id
                    && expected_params.len() == actual_params.len()
                    && expected_params
                        .iter()
                        .zip(actual_params)
                        .all(|(e, a)| unify(e, a, bindings))
            }
            _ => false,
        },
        VariableType::FunctionPointer {
            arg_types: expected_args,
            return_types: expected_returns,
        } => match actual {
            VariableType::FunctionPointer {
                arg_types: actual_args,
                return_types: actual_returns,
            } => {
                expected_args.len() == actual_args.len()
                    && expected_args
                        .iter()
                        .zip(actual_args)
                        .all(|(e, a)| unify(e, a, bindings))
                    && unify_return_types(expected_returns, actual_returns, bindings)
            }
            _ => false,
        },
    }
}

fn unify_return_types(expected: &ReturnTypeSet, actual: &ReturnTypeSet, bindings: &mut Bindings) -> bool {
    match (expected, actual) {
        (ReturnTypeSet::Never, ReturnTypeSet::Never) => true,
        (ReturnTypeSet::Types(e), ReturnTypeSet::Types(a)) => {
            e.len() == a.len() && e.iter().zip(a).all(|(e, a)| unify(e, a, bindings))
        }
        _ => false,
    }
}

/// Replaces every placeholder in `ty` with its bound type. A placeholder
/// left unbound (never constrained by an argument) stays a placeholder,
/// which callers treat as a type-mismatch further up.
pub fn substitute(ty: &VariableType, bindings: &Bindings) -> VariableType {
    match ty {
        VariableType::Placeholder { name, .. } => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        VariableType::Type {
            type_id,
            name,
            params,
            is_const,
        } => VariableType::Type {
            type_id: *type_id,
            name: name.clone(),
            params: params.iter().map(|p| substitute(p, bindings)).collect(),
            is_const: *is_const,
        },
        VariableType::FunctionPointer {
            arg_types,
            return_types,
        } => VariableType::FunctionPointer {
            arg_types: arg_types.iter().map(|a| substitute(a, bindings)).collect(),
            return_types: substitute_return_types(return_types, bindings),
        },
    }
}

pub fn substitute_return_types(returns: &ReturnTypeSet, bindings: &Bindings) -> ReturnTypeSet {
    match returns {
        ReturnTypeSet::Never => ReturnTypeSet::Never,
        ReturnTypeSet::Types(types) => {
            ReturnTypeSet::Types(types.iter().map(|t| substitute(t, bindings)).collect())
        }
    }
}
