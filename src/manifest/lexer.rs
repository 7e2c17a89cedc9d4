//! Tokenizer for PHP manifest files.
//!
//! Only the lexical structure needed to find a returned array literal is
//! recognized: strings (single-quoted, double-quoted, heredoc and nowdoc),
//! names, variables, numbers, comments and punctuation. Anything else is
//! passed through as [`TokenKind::Punct`] so that arbitrary expressions inside
//! the manifest can be skipped without being understood.

use std::iter::Peekable;
use std::str::Chars;

/// A lexical token together with its 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    /// A string with a fully known value (no interpolation).
    Str(String),
    /// A double-quoted or heredoc string containing `$` interpolation.
    Interpolated,
    /// An identifier or namespaced name (`array`, `return`, `\oat\Foo`).
    Name(String),
    /// A `$variable`.
    Variable(String),
    Number(String),
    /// `=>`
    Arrow,
    Comma,
    Semicolon,
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    /// Any other operator or punctuation.
    Punct(String),
}

impl TokenKind {
    /// Whether this token is the given name, ignoring ASCII case.
    pub fn is_name(&self, expected: &str) -> bool {
        matches!(self, TokenKind::Name(name) if name.eq_ignore_ascii_case(expected))
    }

    /// Short human description used in syntax diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Str(value) => format!("string '{}'", value),
            TokenKind::Interpolated => "interpolated string".to_string(),
            TokenKind::Name(name) => format!("`{}`", name),
            TokenKind::Variable(name) => format!("`${}`", name),
            TokenKind::Number(number) => format!("number {}", number),
            TokenKind::Arrow => "`=>`".to_string(),
            TokenKind::Comma => "`,`".to_string(),
            TokenKind::Semicolon => "`;`".to_string(),
            TokenKind::OpenParen => "`(`".to_string(),
            TokenKind::CloseParen => "`)`".to_string(),
            TokenKind::OpenBracket => "`[`".to_string(),
            TokenKind::CloseBracket => "`]`".to_string(),
            TokenKind::OpenBrace => "`{`".to_string(),
            TokenKind::CloseBrace => "`}`".to_string(),
            TokenKind::Punct(punct) => format!("`{}`", punct),
        }
    }
}

/// A tokenizer failure with the position where it was detected.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LexError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut lookahead = self.chars.clone();
        lookahead.next();
        lookahead.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn starts_with(&self, prefix: &str) -> bool {
        let mut lookahead = self.chars.clone();
        prefix.chars().all(|expected| lookahead.next() == Some(expected))
    }

    /// The rest of the current line, without consuming it.
    fn peek_line(&self) -> String {
        self.chars.clone().take_while(|&c| c != '\n').collect()
    }

    fn skip(&mut self, count: usize) {
        for _ in 0..count {
            self.bump();
        }
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> LexError {
        LexError {
            line,
            column,
            message: message.into(),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || !c.is_ascii()
}

/// Split manifest source into tokens.
///
/// Text before the `<?php` open tag is ignored when the tag is present, and
/// tokenizing stops at a `?>` close tag.
pub(crate) fn tokenize(text: &str) -> Result<Vec<Token>, LexError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut cursor = Cursor::new(text);

    if let Some(open) = text.find("<?php") {
        let skipped = &text[..open + "<?php".len()];
        cursor.skip(skipped.chars().count());
    }

    let mut tokens = Vec::new();
    while let Some(c) = cursor.peek() {
        let (line, column) = (cursor.line, cursor.column);

        if c.is_whitespace() {
            cursor.bump();
            continue;
        }
        if cursor.starts_with("?>") {
            break;
        }
        if cursor.starts_with("//") || (c == '#' && cursor.peek_second() != Some('[')) {
            while let Some(next) = cursor.peek() {
                if next == '\n' || cursor.starts_with("?>") {
                    break;
                }
                cursor.bump();
            }
            continue;
        }
        if cursor.starts_with("/*") {
            cursor.skip(2);
            loop {
                if cursor.starts_with("*/") {
                    cursor.skip(2);
                    break;
                }
                if cursor.bump().is_none() {
                    return Err(cursor.error(line, column, "unterminated comment"));
                }
            }
            continue;
        }

        let kind = match c {
            '\'' => {
                cursor.bump();
                TokenKind::Str(single_quoted(&mut cursor, line, column)?)
            }
            '"' => {
                cursor.bump();
                double_quoted(&mut cursor, line, column)?
            }
            '<' if cursor.starts_with("<<<") => {
                cursor.skip(3);
                heredoc(&mut cursor, line, column)?
            }
            '$' if cursor.peek_second().is_some_and(is_name_start) => {
                cursor.bump();
                TokenKind::Variable(take_while(&mut cursor, is_name_char))
            }
            '\\' if cursor.peek_second().is_some_and(is_name_start) => {
                TokenKind::Name(take_while(&mut cursor, |c| is_name_char(c) || c == '\\'))
            }
            c if is_name_start(c) => {
                TokenKind::Name(take_while(&mut cursor, |c| is_name_char(c) || c == '\\'))
            }
            c if c.is_ascii_digit() => {
                TokenKind::Number(take_while(&mut cursor, |c| is_name_char(c) || c == '.'))
            }
            '=' if cursor.starts_with("=>") => {
                cursor.skip(2);
                TokenKind::Arrow
            }
            _ => {
                cursor.bump();
                match c {
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '(' => TokenKind::OpenParen,
                    ')' => TokenKind::CloseParen,
                    '[' => TokenKind::OpenBracket,
                    ']' => TokenKind::CloseBracket,
                    '{' => TokenKind::OpenBrace,
                    '}' => TokenKind::CloseBrace,
                    other => TokenKind::Punct(other.to_string()),
                }
            }
        };

        tokens.push(Token { kind, line, column });
    }

    Ok(tokens)
}

fn take_while(cursor: &mut Cursor<'_>, accept: impl Fn(char) -> bool) -> String {
    let mut out = String::new();
    while let Some(c) = cursor.peek() {
        if !accept(c) {
            break;
        }
        out.push(c);
        cursor.bump();
    }
    out
}

fn single_quoted(cursor: &mut Cursor<'_>, line: usize, column: usize) -> Result<String, LexError> {
    let mut value = String::new();
    loop {
        match cursor.bump() {
            None => return Err(cursor.error(line, column, "unterminated string literal")),
            Some('\'') => return Ok(value),
            Some('\\') => match cursor.peek() {
                Some(escaped @ ('\'' | '\\')) => {
                    value.push(escaped);
                    cursor.bump();
                }
                _ => value.push('\\'),
            },
            Some(c) => value.push(c),
        }
    }
}

fn double_quoted(
    cursor: &mut Cursor<'_>,
    line: usize,
    column: usize,
) -> Result<TokenKind, LexError> {
    let mut value = String::new();
    let mut interpolated = false;
    loop {
        match cursor.bump() {
            None => return Err(cursor.error(line, column, "unterminated string literal")),
            Some('"') => break,
            Some('\\') => match cursor.bump() {
                None => return Err(cursor.error(line, column, "unterminated string literal")),
                Some(escaped) => push_escape(&mut value, escaped),
            },
            Some('$') if starts_interpolation(cursor.peek()) => {
                interpolated = true;
                value.push('$');
            }
            Some('{') if cursor.peek() == Some('$') => {
                interpolated = true;
                value.push('{');
            }
            Some(c) => value.push(c),
        }
    }
    Ok(if interpolated {
        TokenKind::Interpolated
    } else {
        TokenKind::Str(value)
    })
}

fn starts_interpolation(next: Option<char>) -> bool {
    next.is_some_and(|c| is_name_start(c) || c == '{')
}

fn push_escape(value: &mut String, escaped: char) {
    match escaped {
        'n' => value.push('\n'),
        't' => value.push('\t'),
        'r' => value.push('\r'),
        'v' => value.push('\u{0b}'),
        'e' => value.push('\u{1b}'),
        'f' => value.push('\u{0c}'),
        '\\' | '$' | '"' => value.push(escaped),
        other => {
            value.push('\\');
            value.push(other);
        }
    }
}

fn heredoc(cursor: &mut Cursor<'_>, line: usize, column: usize) -> Result<TokenKind, LexError> {
    while cursor.peek().is_some_and(|c| c == ' ' || c == '\t') {
        cursor.bump();
    }
    let nowdoc = cursor.eat('\'');
    let quoted = !nowdoc && cursor.eat('"');
    let label = take_while(cursor, is_name_char);
    if label.is_empty() {
        return Err(cursor.error(line, column, "missing heredoc label"));
    }
    if (nowdoc && !cursor.eat('\'')) || (quoted && !cursor.eat('"')) {
        return Err(cursor.error(line, column, "malformed heredoc label"));
    }
    cursor.eat('\r');
    if !cursor.eat('\n') {
        return Err(cursor.error(line, column, "heredoc label must end the line"));
    }

    let mut lines: Vec<String> = Vec::new();
    loop {
        if cursor.peek().is_none() {
            return Err(cursor.error(line, column, format!("unterminated heredoc {}", label)));
        }
        let current = cursor.peek_line();
        let trimmed = current.trim_start();
        let closes = trimmed
            .strip_prefix(label.as_str())
            .is_some_and(|rest| !rest.starts_with(is_name_char));
        if closes {
            let indent = current.chars().count() - trimmed.chars().count();
            cursor.skip(indent + label.chars().count());
            let body = lines
                .iter()
                .map(|l| strip_indent(l, indent))
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(if !nowdoc && body.contains('$') {
                TokenKind::Interpolated
            } else {
                TokenKind::Str(body)
            });
        }
        cursor.skip(current.chars().count());
        cursor.bump();
        lines.push(current);
    }
}

fn strip_indent(line: &str, indent: usize) -> &str {
    let mut rest = line;
    for _ in 0..indent {
        match rest.strip_prefix([' ', '\t']) {
            Some(stripped) => rest = stripped,
            None => break,
        }
    }
    rest
}
