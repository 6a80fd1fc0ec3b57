//! Cross-referencer error taxonomy, grounded directly on the exception
//! classes of the reference implementation's cross-referencer.

use std::path::PathBuf;

use crate::diagnostics::Diagnostic;
use crate::position::Position;

use super::symbols::Identifiable;

#[derive(Debug, Clone)]
pub enum CrossRefError {
    CollidingIdentifier {
        first: (Position, String),
        second: (Position, String),
    },
    CollidingEnumVariant {
        enum_name: String,
        first: Position,
        second: Position,
        variant_name: String,
    },
    ImportedItemNotFound {
        position: Position,
        source_file: PathBuf,
        source_name: String,
    },
    IndirectImportException {
        position: Position,
    },
    CircularDependencyError {
        files: Vec<PathBuf>,
    },
    UnknownIdentifier {
        position: Position,
        name: String,
    },
    InvalidType {
        position: Position,
        description: String,
    },
    InvalidEnumType {
        position: Position,
        description: String,
    },
    InvalidEnumVariant {
        position: Position,
        enum_name: String,
        variant_name: String,
    },
    InvalidArgument {
        position: Position,
        description: String,
    },
    InvalidReturnType {
        position: Position,
        description: String,
    },
    UnexpectedTypeParameterCount {
        position: Position,
        expected: usize,
        found: usize,
    },
}

impl CrossRefError {
    pub fn colliding(a: (&Position, &str), b: (&Position, &str)) -> Self {
        let a = (a.0.clone(), a.1.to_string());
        let b = (b.0.clone(), b.1.to_string());
        // Sorted by position so the error always names the earlier
        // declaration first, regardless of discovery order.
        if (a.0.line, a.0.column) <= (b.0.line, b.0.column) {
            CrossRefError::CollidingIdentifier {
                first: a,
                second: b,
            }
        } else {
            CrossRefError::CollidingIdentifier {
                first: b,
                second: a,
            }
        }
    }

    pub fn invalid_type(position: Position, found: &Identifiable) -> Self {
        CrossRefError::InvalidType {
            position,
            description: found.describe(),
        }
    }

    pub fn invalid_return_type(position: Position, found: &Identifiable) -> Self {
        CrossRefError::InvalidReturnType {
            position,
            description: found.describe(),
        }
    }

    pub fn invalid_argument(position: Position, found: &Identifiable) -> Self {
        CrossRefError::InvalidArgument {
            position,
            description: found.describe(),
        }
    }
}

impl From<CrossRefError> for Diagnostic {
    fn from(error: CrossRefError) -> Self {
        match error {
            CrossRefError::CollidingIdentifier { first, second } => Diagnostic::new(
                second.0.clone(),
                format!(
                    "found name collision:\n  {}: {}\n  {}: {}",
                    first.0, first.1, second.0, second.1
                ),
            ),
            CrossRefError::CollidingEnumVariant {
                enum_name,
                first,
                second,
                variant_name,
            } => Diagnostic::new(
                second.clone(),
                format!(
                    "duplicate enum variant name collision: {enum_name}:{variant_name}\n  first declared at {first}"
                ),
            ),
            CrossRefError::ImportedItemNotFound {
                position,
                source_file,
                source_name,
            } => Diagnostic::new(
                position,
                format!(
                    "could not import {source_name} from {}",
                    source_file.display()
                ),
            ),
            CrossRefError::IndirectImportException { position } => {
                Diagnostic::new(position, "indirect imports are forbidden".to_string())
            }
            CrossRefError::CircularDependencyError { files } => Diagnostic::without_position(
                format!(
                    "circular dependency detected:\n{}",
                    files
                        .iter()
                        .map(|f| format!("- {}", f.display()))
                        .collect::<Vec<_>>()
                        .join("\n")
                ),
            ),
            CrossRefError::UnknownIdentifier { position, name } => {
                Diagnostic::new(position, format!("usage of unknown identifier {name}"))
            }
            CrossRefError::InvalidType {
                position,
                description,
            } => Diagnostic::new(position, format!("cannot use {description} as type")),
            CrossRefError::InvalidEnumType {
                position,
                description,
            } => Diagnostic::new(position, format!("cannot use {description} as enum type")),
            CrossRefError::InvalidEnumVariant {
                position,
                enum_name,
                variant_name,
            } => Diagnostic::new(
                position,
                format!("variant {variant_name} of enum {enum_name} does not exist"),
            ),
            CrossRefError::InvalidArgument {
                position,
                description,
            } => Diagnostic::new(position, format!("cannot use {description} as argument")),
            CrossRefError::InvalidReturnType {
                position,
                description,
            } => Diagnostic::new(
                position,
                format!("cannot use {description} as return type"),
            ),
            CrossRefError::UnexpectedTypeParameterCount {
                position,
                expected,
                found,
            } => Diagnostic::new(
                position,
                format!(
                    "unexpected number of type parameters\nexpected parameter count: {expected}\n   found parameter count: {found}"
                ),
            ),
        }
    }
}
