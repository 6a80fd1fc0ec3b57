//! Parser driver: discovers and parses every file transitively imported by
//! the entry point and the builtins file.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, warn};

use crate::ast::SourceFile;
use crate::diagnostics::Diagnostic;
use crate::lexer::{tokenize_filtered, Token};
use crate::parser::{parse_builtins_file, parse_regular_file};
use crate::position::Position;

/// Resolve an import's source string relative to the importing file.
///
/// A source ending in `.aaa` is used literally, relative to the current
/// working directory. Anything else is a dotted module path (`"x.y.z"`),
/// resolved relative to the importing file's parent directory as
/// `<parent>/x/y/z.aaa`.
pub fn resolve_import_path(current_file: &Path, source: &str) -> PathBuf {
    if source.ends_with(".aaa") {
        return PathBuf::from(source);
    }
    let parent = current_file.parent().unwrap_or_else(|| Path::new("."));
    let mut path = parent.to_path_buf();
    for segment in source.split('.') {
        path.push(segment);
    }
    path.set_extension("aaa");
    path
}

pub struct ParsedProgram {
    pub files: HashMap<PathBuf, SourceFile>,
    pub builtins_path: PathBuf,
    pub entry_path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
    /// Files in the order they were dequeued: entry point and builtins
    /// first, then imports in the order they were first seen. Downstream
    /// stages rely on this order for deterministic diagnostics.
    pub file_order: Vec<PathBuf>,
}

/// Parses the entry point and the builtins file, transitively loading every
/// file imported (directly or indirectly) from either, each exactly once.
pub fn load_program(entry_path: &Path, builtins_path: &Path) -> ParsedProgram {
    let entry_path = normalize(entry_path);
    let builtins_path = normalize(builtins_path);

    let mut files = HashMap::new();
    let mut file_order = Vec::new();
    let mut diagnostics = Vec::new();
    let mut enqueued: HashMap<PathBuf, ()> = HashMap::new();
    let mut queue: VecDeque<(PathBuf, bool)> = VecDeque::new();

    queue.push_back((entry_path.clone(), false));
    enqueued.insert(entry_path.clone(), ());
    if builtins_path != entry_path {
        queue.push_back((builtins_path.clone(), true));
        enqueued.insert(builtins_path.clone(), ());
    }

    while let Some((path, is_builtins)) = queue.pop_front() {
        debug!("loading file '{}'", path.display());
        file_order.push(path.clone());

        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(err) => {
                warn!("could not read file '{}': {err}", path.display());
                diagnostics.push(Diagnostic::without_position(format!(
                    "could not read file '{}': {err}",
                    path.display()
                )));
                continue;
            }
        };

        let rc_path = Rc::new(path.clone());
        let tokens: Vec<Token> = match tokenize_filtered(Rc::clone(&rc_path), &source) {
            Ok(tokens) => tokens,
            Err(err) => {
                warn!("tokenizing '{}' failed: {}", path.display(), err.message);
                diagnostics.push(Diagnostic::new(err.position.clone(), err.message));
                continue;
            }
        };

        let eof_position = Position::from_offset(Rc::clone(&rc_path), &source, source.len());
        let parsed = if is_builtins || path == builtins_path {
            parse_builtins_file(&tokens, eof_position)
        } else {
            parse_regular_file(&tokens, eof_position)
        };

        let source_file = match parsed {
            Ok(file) => file,
            Err(err) => {
                warn!("parsing '{}' failed: {err}", path.display());
                diagnostics.push(Diagnostic::new(err.position.clone(), err.to_string()));
                continue;
            }
        };

        for import in source_file.imports() {
            let target = normalize(&resolve_import_path(&path, &import.source));
            if enqueued.insert(target.clone(), ()).is_none() {
                debug!("discovered import '{}' from '{}'", target.display(), path.display());
                queue.push_back((target, false));
            }
        }

        files.insert(path, source_file);
    }

    ParsedProgram {
        files,
        builtins_path,
        entry_path,
        diagnostics,
        file_order,
    }
}

fn normalize(path: &Path) -> PathBuf {
    path.to_path_buf()
}
