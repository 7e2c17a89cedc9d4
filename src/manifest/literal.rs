//! Literal-structure parser for the array returned by a manifest.
//!
//! The parser only understands array literals (`array(...)` and `[...]`) and
//! string literals. Every other expression is skipped as an opaque, balanced
//! run of tokens and reported as [`Literal::Opaque`].

use super::lexer::{Token, TokenKind};

/// A parsed manifest value.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
    Str(String),
    Array(Vec<Entry>),
    Opaque,
}

/// One `key => value` (or bare `value`) element of an array literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub key: Option<Literal>,
    pub value: Literal,
}

impl Entry {
    /// The key as a string literal, if it is one.
    pub fn key_str(&self) -> Option<&str> {
        match &self.key {
            Some(Literal::Str(key)) => Some(key),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Find the first `return` statement at file scope and parse its array.
///
/// Returns `Ok(None)` when there is no such statement or when it returns
/// something other than an array literal.
pub(crate) fn returned_array(tokens: &[Token]) -> Result<Option<Vec<Entry>>, SyntaxError> {
    check_balance(tokens)?;

    let mut depth = 0usize;
    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenParen | TokenKind::OpenBracket | TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace => {
                depth = depth.saturating_sub(1)
            }
            _ if depth == 0 && token.kind.is_name("return") => {
                let mut parser = Parser {
                    tokens,
                    pos: index + 1,
                };
                return match parser.array_start(parser.pos) {
                    Some((inner, closer)) => {
                        parser.pos = inner;
                        parser.parse_array(&closer).map(Some)
                    }
                    None => Ok(None),
                };
            }
            _ => {}
        }
    }

    Ok(None)
}

fn closer_for(kind: &TokenKind) -> Option<TokenKind> {
    match kind {
        TokenKind::OpenParen => Some(TokenKind::CloseParen),
        TokenKind::OpenBracket => Some(TokenKind::CloseBracket),
        TokenKind::OpenBrace => Some(TokenKind::CloseBrace),
        _ => None,
    }
}

fn is_closer(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::CloseParen | TokenKind::CloseBracket | TokenKind::CloseBrace
    )
}

/// Every opening delimiter must be closed by its matching counterpart.
fn check_balance(tokens: &[Token]) -> Result<(), SyntaxError> {
    let mut open: Vec<&Token> = Vec::new();
    for token in tokens {
        if closer_for(&token.kind).is_some() {
            open.push(token);
        } else if is_closer(&token.kind) {
            let Some(opener) = open.pop() else {
                return Err(SyntaxError {
                    line: token.line,
                    column: token.column,
                    message: format!("unexpected {}", token.kind.describe()),
                });
            };
            if closer_for(&opener.kind).as_ref() != Some(&token.kind) {
                return Err(SyntaxError {
                    line: token.line,
                    column: token.column,
                    message: format!(
                        "unexpected {}, {} opened at line {} is still open",
                        token.kind.describe(),
                        opener.kind.describe(),
                        opener.line
                    ),
                });
            }
        }
    }

    match open.pop() {
        Some(opener) => Err(SyntaxError {
            line: opener.line,
            column: opener.column,
            message: format!("unclosed {}", opener.kind.describe()),
        }),
        None => Ok(()),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn kind_at(&self, pos: usize) -> Option<&'a TokenKind> {
        self.tokens.get(pos).map(|token| &token.kind)
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.kind_at(self.pos) == Some(kind)
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxError {
        let (line, column) = match self.tokens.get(self.pos).or(self.tokens.last()) {
            Some(token) => (token.line, token.column),
            None => (1, 1),
        };
        SyntaxError {
            line,
            column,
            message: message.into(),
        }
    }

    fn found(&self) -> String {
        self.kind_at(self.pos)
            .map(TokenKind::describe)
            .unwrap_or_else(|| "end of input".to_string())
    }

    /// If an array literal starts at `pos`, the position of its first element
    /// and the token that closes it.
    fn array_start(&self, pos: usize) -> Option<(usize, TokenKind)> {
        match self.kind_at(pos)? {
            TokenKind::OpenBracket => Some((pos + 1, TokenKind::CloseBracket)),
            kind if kind.is_name("array") && self.kind_at(pos + 1) == Some(&TokenKind::OpenParen) => {
                Some((pos + 2, TokenKind::CloseParen))
            }
            _ => None,
        }
    }

    /// Parse array elements up to and including `closer`.
    fn parse_array(&mut self, closer: &TokenKind) -> Result<Vec<Entry>, SyntaxError> {
        let mut entries = Vec::new();
        loop {
            if self.at(closer) {
                self.pos += 1;
                return Ok(entries);
            }

            let first = self.parse_expr(closer, true)?;
            let entry = if self.at(&TokenKind::Arrow) {
                self.pos += 1;
                Entry {
                    key: Some(first),
                    value: self.parse_expr(closer, false)?,
                }
            } else {
                Entry {
                    key: None,
                    value: first,
                }
            };
            entries.push(entry);

            if self.at(&TokenKind::Comma) {
                self.pos += 1;
            } else if !self.at(closer) {
                return Err(self.error_here(format!(
                    "expected `,` or {}, found {}",
                    closer.describe(),
                    self.found()
                )));
            }
        }
    }

    fn at_expr_end(&self, closer: &TokenKind, stop_at_arrow: bool) -> bool {
        match self.kind_at(self.pos) {
            Some(TokenKind::Comma) => true,
            Some(TokenKind::Arrow) => stop_at_arrow,
            Some(kind) => kind == closer,
            None => true,
        }
    }

    /// Parse one element expression. Keys stop at `=>`; values do not, so
    /// that arrow functions inside a value are skipped whole.
    fn parse_expr(&mut self, closer: &TokenKind, stop_at_arrow: bool) -> Result<Literal, SyntaxError> {
        let start = self.pos;

        let literal = match self.kind_at(self.pos) {
            Some(TokenKind::Str(value)) => {
                self.pos += 1;
                Some(Literal::Str(value.clone()))
            }
            _ => match self.array_start(self.pos) {
                Some((inner, nested_closer)) => {
                    self.pos = inner;
                    Some(Literal::Array(self.parse_array(&nested_closer)?))
                }
                None => None,
            },
        };
        if let Some(literal) = literal {
            if self.at_expr_end(closer, stop_at_arrow) {
                return Ok(literal);
            }
        }

        self.skip_opaque(closer, stop_at_arrow)?;
        if self.pos == start {
            return Err(self.error_here(format!("expected expression, found {}", self.found())));
        }
        Ok(Literal::Opaque)
    }

    fn skip_opaque(&mut self, closer: &TokenKind, stop_at_arrow: bool) -> Result<(), SyntaxError> {
        let mut depth = 0usize;
        loop {
            let Some(kind) = self.kind_at(self.pos) else {
                return Err(self.error_here("unexpected end of input inside array"));
            };
            if depth == 0 && self.at_expr_end(closer, stop_at_arrow) {
                return Ok(());
            }
            if closer_for(kind).is_some() {
                depth += 1;
            } else if is_closer(kind) {
                if depth == 0 {
                    return Err(self.error_here(format!("unexpected {}", kind.describe())));
                }
                depth -= 1;
            } else if depth == 0 && *kind == TokenKind::Semicolon {
                return Err(self.error_here("unexpected `;` inside array"));
            }
            self.pos += 1;
        }
    }
}
