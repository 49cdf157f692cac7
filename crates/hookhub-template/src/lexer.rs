//! Template lexer (tokenizer).
//!
//! Converts raw template source into a lazy stream of [`Token`]s. The lexer
//! keeps a stack of modes: literal text at the bottom, and an expression mode
//! pushed for every `${` and popped by the matching `}`. Block bodies such as
//! the inside of `${if ...}...${endif}` are plain literal text again, so the
//! stack never grows beyond the expression currently being scanned.
//!
//! Literal mode recognizes, in priority order:
//!
//! - `${` - start of an expression
//! - `\$` - an escaped dollar sign
//! - `$data.a.b` (roots `data`, `config`, `env`, `key`) - a shortcut variable
//! - any other single character, whitespace and `}` included
//!
//! Expression mode skips spaces and recognizes `}`, dotted variable paths, a
//! single-character loop index, and the keywords `if`, `not`, `else`,
//! `endif`, `for`, `in`, and `endfor`.

use std::fmt;

use hookhub_core::error::TemplateError;
use once_cell::sync::Lazy;
use regex::{Match, Regex};

static SHORTCUT_VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$(?:data|config|env|key)(?:\.[\w\-]+)*").expect("valid shortcut pattern")
});

static VARIABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:data|config|env|key)(?:\.[\w\-]+)*").expect("valid variable pattern")
});

static INDEX_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\w\b").expect("valid index variable pattern"));

/// Keywords in the order they are tried; longer words sharing a prefix come first.
const KEYWORDS: [(&str, Token); 7] = [
    ("endfor", Token::EndFor),
    ("endif", Token::EndIf),
    ("else", Token::Else),
    ("for", Token::For),
    ("not", Token::Not),
    ("if", Token::If),
    ("in", Token::In),
];

/// A token produced by the template lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// One literal character.
    Text(char),
    /// An escape sequence, kept raw (always `\$` from the lexer).
    EscapedChar(String),
    /// A `$`-prefixed path outside braces; the `$` is stripped.
    ShortcutVariable(String),
    /// `${`
    ExprStart,
    /// `}` closing an expression.
    ExprEnd,
    /// A dotted path inside an expression.
    Variable(String),
    /// `if`
    If,
    /// `not`
    Not,
    /// `else`
    Else,
    /// `endif`
    EndIf,
    /// `for`
    For,
    /// `in`
    In,
    /// `endfor`
    EndFor,
    /// A single-character loop index name.
    IndexVar(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(c) => write!(f, "text '{c}'"),
            Self::EscapedChar(s) => write!(f, "escape '{s}'"),
            Self::ShortcutVariable(path) => write!(f, "'${path}'"),
            Self::ExprStart => f.write_str("'${'"),
            Self::ExprEnd => f.write_str("'}'"),
            Self::Variable(path) => write!(f, "variable '{path}'"),
            Self::If => f.write_str("'if'"),
            Self::Not => f.write_str("'not'"),
            Self::Else => f.write_str("'else'"),
            Self::EndIf => f.write_str("'endif'"),
            Self::For => f.write_str("'for'"),
            Self::In => f.write_str("'in'"),
            Self::EndFor => f.write_str("'endfor'"),
            Self::IndexVar(c) => write!(f, "index variable '{c}'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Literal,
    Expression,
}

/// A lazy tokenizer over one template source.
///
/// Yields `Err` at most once: after a [`TemplateError::LexError`] the
/// iterator is exhausted.
///
/// # Examples
///
/// ```
/// use hookhub_template::lexer::{Lexer, Token};
///
/// let tokens: Vec<Token> = Lexer::new("a${data.b}")
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(
///     tokens,
///     vec![
///         Token::Text('a'),
///         Token::ExprStart,
///         Token::Variable("data.b".to_string()),
///         Token::ExprEnd,
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    cursor: usize,
    modes: Vec<Mode>,
    failed: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `source`.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: 0,
            modes: vec![Mode::Literal],
            failed: false,
        }
    }

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Literal)
    }

    fn remaining(&self) -> &'a str {
        &self.source[self.cursor..]
    }

    /// Matches `re` only if the match begins exactly at the cursor.
    ///
    /// Searching the whole source (rather than the remaining slice) keeps
    /// `\b` aware of the character before the cursor.
    fn match_here(&self, re: &Regex) -> Option<Match<'a>> {
        re.find_at(self.source, self.cursor)
            .filter(|m| m.start() == self.cursor)
    }

    fn next_literal(&mut self) -> Option<Token> {
        let rest = self.remaining();

        if rest.starts_with("${") {
            self.cursor += 2;
            self.modes.push(Mode::Expression);
            return Some(Token::ExprStart);
        }

        if rest.starts_with("\\$") {
            self.cursor += 2;
            return Some(Token::EscapedChar("\\$".to_string()));
        }

        if let Some(m) = self.match_here(&SHORTCUT_VARIABLE) {
            self.cursor = m.end();
            return Some(Token::ShortcutVariable(m.as_str()[1..].to_string()));
        }

        let c = rest.chars().next()?;
        self.cursor += c.len_utf8();
        Some(Token::Text(c))
    }

    fn next_expression(&mut self) -> Option<Result<Token, TemplateError>> {
        let skipped = self.remaining().len() - self.remaining().trim_start_matches(' ').len();
        self.cursor += skipped;

        let rest = self.remaining();
        let c = rest.chars().next()?;

        if c == '}' {
            self.cursor += 1;
            if self.modes.len() > 1 {
                self.modes.pop();
            }
            return Some(Ok(Token::ExprEnd));
        }

        if let Some(m) = self.match_here(&VARIABLE) {
            self.cursor = m.end();
            return Some(Ok(Token::Variable(m.as_str().to_string())));
        }

        if self.match_here(&INDEX_VAR).is_some() {
            self.cursor += c.len_utf8();
            return Some(Ok(Token::IndexVar(c)));
        }

        for (word, token) in &KEYWORDS {
            if rest.starts_with(word) {
                self.cursor += word.len();
                return Some(Ok(token.clone()));
            }
        }

        self.failed = true;
        Some(Err(TemplateError::LexError {
            character: c,
            offset: self.cursor,
        }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, TemplateError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.cursor >= self.source.len() {
            return None;
        }

        match self.mode() {
            Mode::Literal => self.next_literal().map(Ok),
            Mode::Expression => self.next_expression(),
        }
    }
}

/// Tokenizes a whole template source into a `Vec<Token>`.
///
/// # Errors
///
/// Returns a `LexError` for the first character that matches no pattern of
/// the active mode.
pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let tokens: Vec<Token> = Lexer::new(source).collect::<Result<_, _>>()?;
    tracing::trace!(count = tokens.len(), "tokenized template");
    Ok(tokens)
}
