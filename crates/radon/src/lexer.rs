use std::rc::Rc;

use logos::Logos;

use crate::{
    error::{Error, ErrorKind},
    position::{LineIndex, Span},
};

/// Unescapes the body of a double-quoted string literal.
///
/// Returns `None` for a dangling backslash, which logos reports as a lex
/// error for the whole literal.
fn unescape(raw: &str) -> Option<String> {
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            other => out.push(other),
        }
    }
    Some(out)
}

/// Radon tokens.
///
/// Whitespace (except newlines) and `#` line comments are skipped. Newlines
/// and semicolons both terminate statements and lex to the same token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    #[token("\n")]
    #[token(";")]
    Newline,

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[token("let")]
    Let,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("while")]
    While,
    #[token("fun")]
    Fun,
    #[token("class")]
    Class,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("continue_outer")]
    ContinueOuter,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,

    #[token("==")]
    EqEq,
    #[token("!=")]
    Neq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Lte,
    #[token(">=")]
    Gte,
    #[token("=")]
    Assign,
    #[token("->")]
    Arrow,

    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    /// Appended by `lex` so the parser always has a span to point at.
    /// A stray NUL byte in source text also reads as end of input.
    #[token("\0")]
    Eof,
}

impl Token {
    /// Short human-readable form used in syntax error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Newline => "newline".to_owned(),
            Self::Eof => "end of input".to_owned(),
            Self::Int(n) => format!("'{n}'"),
            Self::Float(n) => format!("'{n}'"),
            Self::Str(_) => "string literal".to_owned(),
            Self::Ident(name) => format!("'{name}'"),
            other => format!("'{}'", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::If => "if",
            Self::Elif => "elif",
            Self::Else => "else",
            Self::For => "for",
            Self::In => "in",
            Self::While => "while",
            Self::Fun => "fun",
            Self::Class => "class",
            Self::Return => "return",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::ContinueOuter => "continue_outer",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Caret => "^",
            Self::EqEq => "==",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Lte => "<=",
            Self::Gte => ">=",
            Self::Assign => "=",
            Self::Arrow => "->",
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Colon => ":",
            Self::Dot => ".",
            _ => "?",
        }
    }
}

/// A token plus the source span it was lexed from.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexes Radon source text into a token stream terminated by `Token::Eof`.
///
/// Fails with `IllegalCharError` on a character that starts no token, and
/// with `ExpectedCharError` for the two near-miss cases (`!` without `=`,
/// an unterminated string literal).
pub fn lex(file: &str, text: &str) -> Result<Vec<SpannedToken>, Error> {
    let file: Rc<str> = Rc::from(file);
    let index = LineIndex::new(Rc::clone(&file), text);
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(text);
    while let Some(result) = lexer.next() {
        let span = index.span(lexer.span());
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                let slice = lexer.slice();
                let err = if slice.starts_with('!') {
                    Error::new(ErrorKind::ExpectedCharError, span, "'=' (after '!')")
                } else if slice.starts_with('"') {
                    Error::new(ErrorKind::ExpectedCharError, span, "'\"' (string was never closed)")
                } else {
                    let shown = slice.chars().next().unwrap_or('?');
                    Error::new(ErrorKind::IllegalCharError, span, format!("'{shown}'"))
                };
                return Err(err);
            }
        }
    }
    let end = index.span(text.len()..text.len());
    tokens.push(SpannedToken {
        token: Token::Eof,
        span: end,
    });
    Ok(tokens)
}
