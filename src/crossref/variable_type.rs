//! Resolved types: the cross-referencer's output form of a [`crate::ast::TypeOrFnPtr`].

use super::symbols::TypeId;

/// A fully resolved type: either a concrete or generic-placeholder named
/// type, or a function pointer type. Placeholder types compare structurally
/// (by name) rather than by the type they are eventually bound to, which is
/// what lets [`crate::typechecker::unify`] treat them as unification
/// variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableType {
    Type {
        type_id: TypeId,
        name: String,
        params: Vec<VariableType>,
        is_const: bool,
    },
    Placeholder {
        name: String,
        is_const: bool,
    },
    FunctionPointer {
        arg_types: Vec<VariableType>,
        return_types: ReturnTypeSet,
    },
}

/// A function's resolved return types: either an ordinary list or `never`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnTypeSet {
    Never,
    Types(Vec<VariableType>),
}

impl VariableType {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, VariableType::Placeholder { .. })
    }

    pub fn is_const(&self) -> bool {
        match self {
            VariableType::Type { is_const, .. } | VariableType::Placeholder { is_const, .. } => {
                *is_const
            }
            VariableType::FunctionPointer { .. } => false,
        }
    }

    /// The root type name for display purposes (`int`, `vec`, a struct
    /// name, a placeholder's name, or `fn` for a function pointer).
    pub fn root_name(&self) -> &str {
        match self {
            VariableType::Type { name, .. } => name,
            VariableType::Placeholder { name, .. } => name,
            VariableType::FunctionPointer { .. } => "fn",
        }
    }

    /// This type's generic type parameters, or an empty slice for anything
    /// that isn't a `Type` (placeholders and function pointers have none).
    pub fn type_params(&self) -> &[VariableType] {
        match self {
            VariableType::Type { params, .. } => params,
            VariableType::Placeholder { .. } | VariableType::FunctionPointer { .. } => &[],
        }
    }
}

impl std::fmt::Display for VariableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Type {
                name,
                params,
                is_const,
                ..
            } => {
                if *is_const {
                    write!(f, "const ")?;
                }
                write!(f, "{name}")?;
                if !params.is_empty() {
                    let inner = params
                        .iter()
                        .map(|p| p.to_string())
                        .collect::<Vec<_>>()
                        .join(", ");
                    write!(f, "[{inner}]")?;
                }
                Ok(())
            }
            VariableType::Placeholder { name, .. } => write!(f, "{name}"),
            VariableType::FunctionPointer {
                arg_types,
                return_types,
            } => {
                let args = arg_types
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                let rets = match return_types {
                    ReturnTypeSet::Never => "never".to_string(),
                    ReturnTypeSet::Types(types) => types
                        .iter()
                        .map(|t| t.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                };
                write!(f, "fn[{args}][{rets}]")
            }
        }
    }
}

/// A value that is only legitimately known after a later cross-reference
/// sub-pass runs. Never observed as `Unresolved` by a later stage: the
/// type checker only ever sees fully-resolved [`Resolved`] values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved<T> {
    Unresolved,
    Resolved(T),
}

impl<T> Unresolved<T> {
    pub fn resolved(&self) -> Option<&T> {
        match self {
            Unresolved::Resolved(value) => Some(value),
            Unresolved::Unresolved => None,
        }
    }

    pub fn into_resolved(self) -> Option<T> {
        match self {
            Unresolved::Resolved(value) => Some(value),
            Unresolved::Unresolved => None,
        }
    }
}
