//! Logos-based lexer and token classifier for model expressions.
//!
//! Generic tokenization plus the allow-list check: an expression may contain
//! only identifier names, numeric literals, and the punctuation
//! `+ - * / ( ) , . [ ]`. Anything else is a bad token; all bad tokens in an
//! expression are aggregated into one error. Unbalanced `()`/`[]` brackets
//! are a distinct, structural failure.
//!
//! This module has no model knowledge; it classifies raw text only.

use logos::Logos;
use smol_str::SmolStr;

use super::error::ParseError;

/// Lexical kind of one raw token, after classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    Name,
    Number,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
    Dot,
    LBracket,
    RBracket,
}

impl RawKind {
    /// Operator/punctuation kinds (everything except names and numbers)
    pub fn is_operator(self) -> bool {
        !matches!(self, Self::Name | Self::Number)
    }
}

/// A raw token with its kind, text, and byte offsets into the stripped
/// expression. Ephemeral: produced fresh per parse, discarded after the
/// tokenizer driver finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawToken<'a> {
    pub kind: RawKind,
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Logos token enum - allowed tokens plus the disallowed operators that
/// must still lex as single units so error messages can name them
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,

    #[regex(r"([0-9]+(\.[0-9]*)?|\.[0-9]+)([eE][+-]?[0-9]+)?")]
    Number,

    // =========================================================================
    // MULTI-CHARACTER PUNCTUATION (must come before single-char)
    // =========================================================================
    #[token("**")]
    StarStar,

    #[token("//")]
    SlashSlash,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("@=")]
    AtEq,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<<")]
    LtLt,

    #[token(">>")]
    GtGt,

    #[token("->")]
    Arrow,

    #[token(":=")]
    ColonEq,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION (the allowed set)
    // =========================================================================
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    // =========================================================================
    // SINGLE-CHARACTER PUNCTUATION (disallowed in expressions)
    // =========================================================================
    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("=")]
    Eq,

    #[token("@")]
    At,

    #[token("%")]
    Percent,

    #[token("^")]
    Caret,

    #[token("&")]
    Amp,

    #[token("|")]
    Pipe,

    #[token("!")]
    Bang,

    #[token("~")]
    Tilde,

    #[token("?")]
    Question,
}

impl LogosToken {
    /// Classify into an allowed raw kind, or `None` for a bad token
    fn classify(self) -> Option<RawKind> {
        match self {
            Self::Ident => Some(RawKind::Name),
            Self::Number => Some(RawKind::Number),
            Self::Plus => Some(RawKind::Plus),
            Self::Minus => Some(RawKind::Minus),
            Self::Star => Some(RawKind::Star),
            Self::Slash => Some(RawKind::Slash),
            Self::LParen => Some(RawKind::LParen),
            Self::RParen => Some(RawKind::RParen),
            Self::Comma => Some(RawKind::Comma),
            Self::Dot => Some(RawKind::Dot),
            Self::LBracket => Some(RawKind::LBracket),
            Self::RBracket => Some(RawKind::RBracket),
            _ => None,
        }
    }
}

/// Lex a stripped expression into classified raw tokens.
///
/// Returns every lexical problem at once: one aggregated bad-token error
/// naming each offending substring, and/or one structural error for
/// unbalanced brackets.
pub(crate) fn lex(expr: &str) -> Result<Vec<RawToken<'_>>, Vec<ParseError>> {
    let mut tokens = Vec::new();
    let mut bad: Vec<SmolStr> = Vec::new();

    let mut lexer = LogosToken::lexer(expr);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        match result {
            Ok(LogosToken::Whitespace) => {}
            Ok(token) => match token.classify() {
                Some(kind) => tokens.push(RawToken {
                    kind,
                    text,
                    start: span.start,
                    end: span.end,
                }),
                None => bad.push(SmolStr::new(text)),
            },
            Err(()) => bad.push(SmolStr::new(text)),
        }
    }

    let mut errors = Vec::new();
    if !bad.is_empty() {
        errors.push(ParseError::BadTokens {
            expr: expr.to_string(),
            tokens: bad,
        });
    }
    if let Err(detail) = check_balance(&tokens) {
        errors.push(ParseError::Malformed {
            expr: expr.to_string(),
            detail,
        });
    }
    if errors.is_empty() { Ok(tokens) } else { Err(errors) }
}

/// Check `()`/`[]` nesting; a mismatch makes the expression structurally
/// unparseable rather than merely containing a bad token
fn check_balance(tokens: &[RawToken<'_>]) -> Result<(), String> {
    let mut stack: Vec<RawKind> = Vec::new();
    for token in tokens {
        match token.kind {
            RawKind::LParen | RawKind::LBracket => stack.push(token.kind),
            RawKind::RParen => {
                if stack.pop() != Some(RawKind::LParen) {
                    return Err("unmatched ')'".to_string());
                }
            }
            RawKind::RBracket => {
                if stack.pop() != Some(RawKind::LBracket) {
                    return Err("unmatched ']'".to_string());
                }
            }
            _ => {}
        }
    }
    match stack.pop() {
        Some(RawKind::LParen) => Err("unclosed '('".to_string()),
        Some(_) => Err("unclosed '['".to_string()),
        None => Ok(()),
    }
}
