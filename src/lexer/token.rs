use std::fmt::{self, Display};

use crate::position::Position;

/// The kind of a lexed token. Open classes (`Identifier`, `Integer`, ...)
/// carry their text on the `Token` itself; every other variant is a fixed
/// literal and the text is redundant with the kind but kept anyway so the
/// formatter (out of scope here) can reconstruct source text byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // keywords
    Fn,
    Struct,
    Enum,
    If,
    Else,
    While,
    Foreach,
    Match,
    Case,
    Default,
    Use,
    Return,
    Args,
    As,
    From,
    Import,
    True,
    False,
    Const,
    Never,
    Builtin,
    Call,
    // punctuation
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    LeftArrow,
    Question,
    Bang,
    // open classes
    Identifier,
    Integer,
    String,
    Comment,
    Whitespace,
    Shebang,
}

impl TokenKind {
    /// Fixed literal tokens recognised by step 3 of the tokenizer, longest
    /// literal first so that e.g. `<-` is tried before any prefix of it
    /// would be, and `foreach` before `for`-like prefixes (there are none,
    /// but the ordering rule is load-bearing for keyword/identifier splits
    /// such as `args`/`as`).
    pub fn fixed_literals() -> &'static [(&'static str, TokenKind)] {
        use TokenKind::*;
        const TABLE: &[(&str, TokenKind)] = &[
            ("builtin", Builtin),
            ("foreach", Foreach),
            ("default", Default),
            ("struct", Struct),
            ("return", Return),
            ("import", Import),
            ("never", Never),
            ("const", Const),
            ("match", Match),
            ("false", False),
            ("while", While),
            ("case", Case),
            ("enum", Enum),
            ("true", True),
            ("from", From),
            ("call", Call),
            ("args", Args),
            ("use", Use),
            ("if", If),
            ("as", As),
            ("fn", Fn),
            ("else", Else),
            ("<-", LeftArrow),
            ("{", LBrace),
            ("}", RBrace),
            ("[", LBracket),
            ("]", RBracket),
            (",", Comma),
            (":", Colon),
            ("?", Question),
            ("!", Bang),
        ];
        TABLE
    }

    /// Whether this kind's fixed literal is made up of alphabetic
    /// characters, and therefore needs a boundary check against the
    /// following character so `and_foo` lexes as one identifier rather than
    /// `and` followed by `_foo`.
    pub fn is_alphabetic_literal(lit: &str) -> bool {
        lit.chars().all(|c| c.is_ascii_alphabetic())
    }

    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Comment | TokenKind::Shebang
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.kind, self.text)
    }
}
