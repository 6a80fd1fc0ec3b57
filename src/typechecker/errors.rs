//! Type-checker error taxonomy. Each function is checked independently, so
//! one function's type errors never suppress another's.

use crate::crossref::VariableType;
use crate::diagnostics::Diagnostic;
use crate::position::Position;

fn render_stack(stack: &[VariableType]) -> String {
    if stack.is_empty() {
        return "<empty>".to_string();
    }
    stack
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone)]
pub enum TypeCheckError {
    StackTypesError {
        position: Position,
        expected: Vec<VariableType>,
        found: Vec<VariableType>,
        context: String,
    },
    FunctionTypeError {
        position: Position,
        expected: Vec<VariableType>,
        found: Vec<VariableType>,
    },
    ConditionTypeError {
        position: Position,
        found: Option<VariableType>,
    },
    BranchTypeError {
        position: Position,
        if_stack: Vec<VariableType>,
        else_stack: Vec<VariableType>,
    },
    LoopTypeError {
        position: Position,
        before: Vec<VariableType>,
        after: Vec<VariableType>,
    },
    InvalidMainSignuture {
        position: Position,
    },
    InvalidMemberFunctionSignature {
        position: Position,
        struct_name: String,
    },
    StructUpdateStackError {
        position: Position,
        field: String,
        found: Vec<VariableType>,
    },
    StructUpdateTypeError {
        position: Position,
        field: String,
        expected: VariableType,
        found: VariableType,
    },
    NonExhaustiveMatch {
        position: Position,
        missing_variants: Vec<String>,
    },
    DuplicateMatchCase {
        position: Position,
        variant: String,
    },
    UnknownField {
        position: Position,
        struct_name: String,
        field: String,
    },
    NotAStruct {
        position: Position,
        found: VariableType,
    },
    NotAnEnum {
        position: Position,
        found: VariableType,
    },
    NotAFunctionPointer {
        position: Position,
        found: VariableType,
    },
    UnknownVariable {
        position: Position,
        name: String,
    },
}

impl From<TypeCheckError> for Diagnostic {
    fn from(error: TypeCheckError) -> Self {
        match error {
            TypeCheckError::StackTypesError {
                position,
                expected,
                found,
                context,
            } => Diagnostic::new(
                position,
                format!(
                    "invalid stack types for {context}\n  expected: {}\n     found: {}",
                    render_stack(&expected),
                    render_stack(&found)
                ),
            ),
            TypeCheckError::FunctionTypeError {
                position,
                expected,
                found,
            } => Diagnostic::new(
                position,
                format!(
                    "function does not return the declared types\n  expected: {}\n     found: {}",
                    render_stack(&expected),
                    render_stack(&found)
                ),
            ),
            TypeCheckError::ConditionTypeError { position, found } => Diagnostic::new(
                position,
                format!(
                    "condition must leave a bool on top of the stack, found {}",
                    found.map(|t| t.to_string()).unwrap_or_else(|| "<empty>".to_string())
                ),
            ),
            TypeCheckError::BranchTypeError {
                position,
                if_stack,
                else_stack,
            } => Diagnostic::new(
                position,
                format!(
                    "branches leave different stacks\n  if:   {}\n  else: {}",
                    render_stack(&if_stack),
                    render_stack(&else_stack)
                ),
            ),
            TypeCheckError::LoopTypeError {
                position,
                before,
                after,
            } => Diagnostic::new(
                position,
                format!(
                    "loop body does not preserve the stack\n  before: {}\n  after:  {}",
                    render_stack(&before),
                    render_stack(&after)
                ),
            ),
            TypeCheckError::InvalidMainSignuture { position } => Diagnostic::new(
                position,
                "main must take no arguments and return never or a single int".to_string(),
            ),
            TypeCheckError::InvalidMemberFunctionSignature {
                position,
                struct_name,
            } => Diagnostic::new(
                position,
                format!("member function's first argument must be of type {struct_name}"),
            ),
            TypeCheckError::StructUpdateStackError {
                position,
                field,
                found,
            } => Diagnostic::new(
                position,
                format!(
                    "field update for {field} must leave exactly one value on the stack, found: {}",
                    render_stack(&found)
                ),
            ),
            TypeCheckError::StructUpdateTypeError {
                position,
                field,
                expected,
                found,
            } => Diagnostic::new(
                position,
                format!("field {field} expects {expected}, found {found}"),
            ),
            TypeCheckError::NonExhaustiveMatch {
                position,
                missing_variants,
            } => Diagnostic::new(
                position,
                format!(
                    "match is not exhaustive, missing variants: {}",
                    missing_variants.join(", ")
                ),
            ),
            TypeCheckError::DuplicateMatchCase { position, variant } => {
                Diagnostic::new(position, format!("duplicate match case for variant {variant}"))
            }
            TypeCheckError::UnknownField {
                position,
                struct_name,
                field,
            } => Diagnostic::new(position, format!("{struct_name} has no field {field}")),
            TypeCheckError::NotAStruct { position, found } => {
                Diagnostic::new(position, format!("expected a struct, found {found}"))
            }
            TypeCheckError::NotAnEnum { position, found } => {
                Diagnostic::new(position, format!("expected an enum, found {found}"))
            }
            TypeCheckError::NotAFunctionPointer { position, found } => {
                Diagnostic::new(position, format!("expected a function pointer, found {found}"))
            }
            TypeCheckError::UnknownVariable { position, name } => Diagnostic::new(
                position,
                format!("cannot assign to {name}: no such variable is in scope"),
            ),
        }
    }
}
