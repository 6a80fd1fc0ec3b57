//! Source positions shared by every stage of the pipeline.

use std::fmt::{self, Display};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A `(file, line, column)` triple. Line and column are 1-based and counted
/// in scalar characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    file: Rc<PathBuf>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: Rc<PathBuf>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn file_rc(&self) -> Rc<PathBuf> {
        Rc::clone(&self.file)
    }

    /// Recompute a `(line, column)` pair from a byte offset into `source`.
    ///
    /// Counts newlines up to `offset` and locates the last one to derive the
    /// column; both are 1-based.
    pub fn from_offset(file: Rc<PathBuf>, source: &str, offset: usize) -> Self {
        let consumed = &source[..offset];
        let line = consumed.chars().filter(|c| *c == '\n').count() + 1;
        let column = match consumed.rfind('\n') {
            Some(idx) => consumed[idx + '\n'.len_utf8()..].chars().count() + 1,
            None => consumed.chars().count() + 1,
        };
        Self::new(file, line, column)
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> Rc<PathBuf> {
        Rc::new(PathBuf::from("test.aaa"))
    }

    #[test]
    fn first_character_is_line_one_column_one() {
        let pos = Position::from_offset(file(), "hello", 0);
        assert_eq!((pos.line, pos.column), (1, 1));
    }

    #[test]
    fn offset_after_newline_resets_column() {
        let source = "ab\ncd";
        let pos = Position::from_offset(file(), source, 3);
        assert_eq!((pos.line, pos.column), (2, 1));
    }

    #[test]
    fn column_counts_characters_not_bytes() {
        // multi-byte character at index 0, then an ascii one right after.
        let source = "é!";
        let offset = 'é'.len_utf8();
        let pos = Position::from_offset(file(), source, offset);
        assert_eq!((pos.line, pos.column), (1, 2));
    }

    #[test]
    fn display_matches_file_colon_line_colon_column() {
        let pos = Position::new(file(), 3, 7);
        assert_eq!(pos.to_string(), "test.aaa:3:7");
    }
}
