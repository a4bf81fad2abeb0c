//! Expression tokens.

use logos::{Logos, Span};
use tableau_error::{ExpressionError, ExpressionErrorKind};

/// Expression token.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token<'src> {
    // === Literals ===
    /// Decimal number literal
    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    /// Quoted string, quotes stripped, escapes untouched
    #[regex(r#""([^"\\]|\\.)*""#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| { let s = lex.slice(); &s[1..s.len() - 1] })]
    Str(&'src str),

    /// `true`
    #[token("true")]
    True,
    /// `false`
    #[token("false")]
    False,
    /// `null`
    #[token("null")]
    Null,
    /// `undefined`
    #[token("undefined")]
    Undefined,

    /// Identifier
    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    // === Operators ===
    /// `===`
    #[token("===")]
    StrictEq,
    /// `!==`
    #[token("!==")]
    StrictNotEq,
    /// `==`
    #[token("==")]
    Eq,
    /// `!=`
    #[token("!=")]
    NotEq,
    /// `<=`
    #[token("<=")]
    LessEq,
    /// `>=`
    #[token(">=")]
    GreaterEq,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `&&`
    #[token("&&")]
    And,
    /// `||`
    #[token("||")]
    Or,
    /// `!`
    #[token("!")]
    Bang,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `?`
    #[token("?")]
    Question,
    /// `:`
    #[token(":")]
    Colon,

    // === Punctuation ===
    /// `(`
    #[token("(")]
    ParenOpen,
    /// `)`
    #[token(")")]
    ParenClose,
    /// `[`
    #[token("[")]
    BracketOpen,
    /// `]`
    #[token("]")]
    BracketClose,
    /// `.`
    #[token(".")]
    Dot,
    /// `,`
    #[token(",")]
    Comma,
}

/// A token with its byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    /// The token
    pub token: T,
    /// Byte range in the source
    pub span: Span,
}

/// Tokenize an expression.
///
/// # Errors
///
/// Returns a lex error naming the first unrecognized input.
pub fn lex(source: &str) -> Result<Vec<Spanned<Token<'_>>>, ExpressionError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push(Spanned {
                token,
                span: lexer.span(),
            }),
            Err(()) => {
                return Err(ExpressionError::new(ExpressionErrorKind::Lex {
                    text: lexer.slice().to_string(),
                    offset: lexer.span().start,
                }));
            }
        }
    }

    Ok(tokens)
}
