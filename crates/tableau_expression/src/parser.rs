//! Precedence-climbing parser over the token stream.

use crate::lexer::{Spanned, Token, lex};
use crate::{BinaryOp, Expr, UnaryOp, Value};
use tableau_core::value::parse_number;
use tableau_error::{ExpressionError, ExpressionErrorKind};

/// Deepest syntax tree the parser will build.
const MAX_DEPTH: usize = 128;

/// Parse an expression into a syntax tree.
///
/// # Errors
///
/// Returns a lex or parse error for input outside the grammar.
pub fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.conditional()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some(extra) => Err(parse_error(format!(
            "unexpected {:?} at offset {}",
            extra.token, extra.span.start
        ))),
    }
}

#[track_caller]
fn parse_error(message: String) -> ExpressionError {
    ExpressionError::new(ExpressionErrorKind::Parse(message))
}

struct Parser<'t, 'src> {
    tokens: &'t [Spanned<Token<'src>>],
    pos: usize,
    depth: usize,
}

impl<'t, 'src> Parser<'t, 'src> {
    fn peek(&self) -> Option<Token<'src>> {
        self.tokens.get(self.pos).map(|t| t.token)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: Token<'src>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token<'src>) -> Result<(), ExpressionError> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(parse_error(format!(
                "expected {:?}, found {:?}",
                expected, token
            ))),
            None => Err(ExpressionError::new(ExpressionErrorKind::UnexpectedEnd)),
        }
    }

    /// Count one more level of tree height, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(parse_error("expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn conditional(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        self.descend()?;
        let expr = self.ternary();
        self.depth = base;
        expr
    }

    fn ternary(&mut self) -> Result<Expr, ExpressionError> {
        let test = self.binary(0)?;
        if !self.eat(Token::Question) {
            return Ok(test);
        }
        let then = self.conditional()?;
        self.expect(Token::Colon)?;
        let otherwise = self.conditional()?;
        Ok(Expr::Conditional(
            Box::new(test),
            Box::new(then),
            Box::new(otherwise),
        ))
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek().and_then(binary_op) {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.pos += 1;
            // Each fold deepens the left spine.
            self.descend()?;
            let rhs = self.binary(precedence + 1)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ExpressionError> {
        let op = match self.peek() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.postfix(),
        };
        self.pos += 1;
        let base = self.depth;
        self.descend()?;
        let operand = self.unary()?;
        self.depth = base;
        Ok(Expr::Unary(op, Box::new(operand)))
    }

    fn postfix(&mut self) -> Result<Expr, ExpressionError> {
        let base = self.depth;
        let mut expr = self.primary()?;
        loop {
            let link = self.peek();
            if matches!(
                link,
                Some(Token::Dot | Token::BracketOpen | Token::ParenOpen)
            ) {
                self.descend()?;
            }
            match link {
                Some(Token::Dot) => {
                    self.pos += 1;
                    match self.advance() {
                        Some(Token::Ident(name)) => {
                            expr = Expr::Member(Box::new(expr), name.to_string());
                        }
                        Some(other) => {
                            return Err(parse_error(format!(
                                "expected property name after '.', found {:?}",
                                other
                            )));
                        }
                        None => return Err(ExpressionError::new(ExpressionErrorKind::UnexpectedEnd)),
                    }
                }
                Some(Token::BracketOpen) => {
                    self.pos += 1;
                    let index = self.conditional()?;
                    self.expect(Token::BracketClose)?;
                    expr = Expr::Index(Box::new(expr), Box::new(index));
                }
                Some(Token::ParenOpen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if !self.eat(Token::ParenClose) {
                        loop {
                            args.push(self.conditional()?);
                            if self.eat(Token::ParenClose) {
                                break;
                            }
                            self.expect(Token::Comma)?;
                        }
                    }
                    expr = Expr::Call(Box::new(expr), args);
                }
                _ => {
                    self.depth = base;
                    return Ok(expr);
                }
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ExpressionError> {
        let token = self
            .advance()
            .ok_or_else(|| ExpressionError::new(ExpressionErrorKind::UnexpectedEnd))?;
        let expr = match token {
            Token::Number(text) => Expr::Literal(Value::Number(
                parse_number(text).ok_or_else(|| parse_error(format!("bad number '{}'", text)))?,
            )),
            Token::Str(text) => Expr::Literal(Value::String(unescape(text))),
            Token::True => Expr::Literal(Value::Bool(true)),
            Token::False => Expr::Literal(Value::Bool(false)),
            Token::Null => Expr::Literal(Value::Null),
            Token::Undefined => Expr::Literal(Value::Undefined),
            Token::Ident(name) => Expr::Ident(name.to_string()),
            Token::ParenOpen => {
                let inner = self.conditional()?;
                self.expect(Token::ParenClose)?;
                inner
            }
            other => return Err(parse_error(format!("unexpected {:?}", other))),
        };
        Ok(expr)
    }
}

fn binary_op(token: Token<'_>) -> Option<BinaryOp> {
    Some(match token {
        Token::Or => BinaryOp::Or,
        Token::And => BinaryOp::And,
        Token::Eq => BinaryOp::Eq,
        Token::NotEq => BinaryOp::NotEq,
        Token::StrictEq => BinaryOp::StrictEq,
        Token::StrictNotEq => BinaryOp::StrictNotEq,
        Token::Less => BinaryOp::Less,
        Token::LessEq => BinaryOp::LessEq,
        Token::Greater => BinaryOp::Greater,
        Token::GreaterEq => BinaryOp::GreaterEq,
        Token::Plus => BinaryOp::Add,
        Token::Minus => BinaryOp::Sub,
        Token::Star => BinaryOp::Mul,
        Token::Slash => BinaryOp::Div,
        Token::Percent => BinaryOp::Rem,
        _ => return None,
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    fn num(n: f64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Number(n)))
    }

    #[test]
    fn test_multiplication_binds_tighter() {
        assert_eq!(
            parse("a + 2 * 3").unwrap(),
            Expr::Binary(
                BinaryOp::Add,
                ident("a"),
                Box::new(Expr::Binary(BinaryOp::Mul, num(2.0), num(3.0)))
            )
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(
            parse("10 - 4 - 3").unwrap(),
            Expr::Binary(
                BinaryOp::Sub,
                Box::new(Expr::Binary(BinaryOp::Sub, num(10.0), num(4.0))),
                num(3.0)
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = parse("a || b && c").unwrap();
        assert!(matches!(expr, Expr::Binary(BinaryOp::Or, _, ref rhs)
            if matches!(**rhs, Expr::Binary(BinaryOp::And, _, _))));
    }

    #[test]
    fn test_conditional_is_right_associative() {
        let expr = parse("a ? 1 : b ? 2 : 3").unwrap();
        assert!(matches!(expr, Expr::Conditional(_, _, ref otherwise)
            if matches!(**otherwise, Expr::Conditional(_, _, _))));
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(
            parse("custom.get('k').length").unwrap(),
            Expr::Member(
                Box::new(Expr::Call(
                    Box::new(Expr::Member(ident("custom"), "get".into())),
                    vec![Expr::Literal(Value::String("k".into()))]
                )),
                "length".into()
            )
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            parse(r#"'it\'s'"#).unwrap(),
            Expr::Literal(Value::String("it's".into()))
        );
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let cases = [
            format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000)),
            format!("{}true", "!".repeat(10_000)),
            vec!["1"; 10_000].join(" + "),
            format!("a{}", ".b".repeat(10_000)),
            format!("a{}", "[0]".repeat(10_000)),
        ];
        for source in cases {
            let err = parse(&source).unwrap_err();
            assert!(matches!(err.kind, ExpressionErrorKind::Parse(ref m) if m.contains("too deeply")));
        }
    }

    #[test]
    fn test_moderate_nesting_parses() {
        let source = format!("{}1{}", "(".repeat(40), ")".repeat(40));
        assert_eq!(parse(&source).unwrap(), Expr::Literal(Value::Number(1.0)));
        assert!(parse(&vec!["1"; 60].join(" + ")).is_ok());
        assert!(parse(&format!("{}x", "!".repeat(60))).is_ok());
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse("score >").unwrap_err().kind,
            ExpressionErrorKind::UnexpectedEnd
        ));
        assert!(matches!(
            parse("a b").unwrap_err().kind,
            ExpressionErrorKind::Parse(_)
        ));
        assert!(matches!(
            parse("(a").unwrap_err().kind,
            ExpressionErrorKind::UnexpectedEnd
        ));
    }
}
