//! Parser for model expressions.

use crate::ast::{BinOp, Expression};
use crate::error::{ExprError, ExprResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Deepest nesting of parentheses, signs and exponents accepted by [`parse`].
pub const MAX_DEPTH: usize = 256;

/// Parse an expression source string into an AST.
pub fn parse(source: &str) -> ExprResult<Expression> {
    let mut parser = Parser::new(source)?;
    if parser.is_eof() {
        return Err(ExprError::Empty);
    }
    let expr = parser.parse_expression()?;

    // Everything must be consumed: `x0 x1` is not an expression.
    if let Some(trailing) = parser.tokens.get(parser.pos) {
        return Err(ExprError::UnexpectedToken {
            position: trailing.span.start,
            expected: "operator or end of input".into(),
            found: trailing.token.to_string(),
        });
    }
    Ok(expr)
}

/// Parser state.
struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ExprResult<Self> {
        let mut tokens = Vec::new();

        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, msg)) => {
                    return Err(ExprError::LexerError {
                        position: span.start,
                        message: msg,
                    });
                }
            }
        }

        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    /// Check if we've reached the end.
    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Byte offset of the current token (or of the end of input).
    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(0, |t| t.span.start)
    }

    /// Advance and return the current token.
    fn advance(&mut self) -> Option<Token> {
        if self.is_eof() {
            return None;
        }
        let token = self.tokens[self.pos].token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Expect a specific token.
    fn expect(&mut self, expected: &Token) -> ExprResult<()> {
        let position = self.position();
        let found = self
            .advance()
            .ok_or_else(|| ExprError::UnexpectedEof(expected.to_string()))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(expected) {
            return Err(ExprError::UnexpectedToken {
                position,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Consume token if it matches.
    fn consume(&mut self, token: &Token) -> bool {
        let matches = self
            .peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token));
        if matches {
            self.advance();
        }
        matches
    }

    fn parse_expression(&mut self) -> ExprResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse additive and multiplicative chains with precedence climbing.
    ///
    /// Operators at this level are collected into one flat [`Expression::Chain`].
    fn parse_binary_expr(&mut self, min_prec: u8) -> ExprResult<Expression> {
        let first = self.parse_unary_expr()?;
        let mut rest = Vec::new();

        while let Some(op) = self.peek_binary_op() {
            let prec = op_precedence(op);
            if prec < min_prec {
                break;
            }
            self.advance();
            rest.push((op, self.parse_binary_expr(prec + 1)?));
        }

        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expression::Chain {
                first: Box::new(first),
                rest,
            })
        }
    }

    /// Parse unary expression. Negation binds looser than `**`.
    ///
    /// Every nesting level passes through here, so this is where depth is
    /// counted.
    fn parse_unary_expr(&mut self) -> ExprResult<Expression> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        let expr = self.parse_signed_expr();
        self.depth -= 1;
        expr
    }

    fn parse_signed_expr(&mut self) -> ExprResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_unary_expr()?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_unary_expr();
        }
        self.parse_power_expr()
    }

    /// Parse `primary ('**' unary)?`, right associative.
    fn parse_power_expr(&mut self) -> ExprResult<Expression> {
        let base = self.parse_primary_expr()?;
        if self.consume(&Token::Power) {
            let exponent = self.parse_unary_expr()?;
            return Ok(Expression::Pow {
                base: Box::new(base),
                exponent: Box::new(exponent),
            });
        }
        Ok(base)
    }

    /// Parse primary expression.
    #[allow(clippy::cast_precision_loss)]
    fn parse_primary_expr(&mut self) -> ExprResult<Expression> {
        let position = self.position();
        let token = self
            .advance()
            .ok_or_else(|| ExprError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => Ok(Expression::Number(v as f64)),
            Token::FloatLiteral(v) => Ok(Expression::Number(v)),
            Token::Identifier(name) => {
                if self.consume(&Token::LBracket) {
                    let index = self.parse_index()?;
                    self.expect(&Token::RBracket)?;
                    Ok(Expression::Index { name, index })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            other => Err(ExprError::UnexpectedToken {
                position,
                expected: "expression".into(),
                found: other.to_string(),
            }),
        }
    }

    /// Parse an array subscript (a non-negative integer literal).
    fn parse_index(&mut self) -> ExprResult<u64> {
        let position = self.position();
        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(v),
            Some(other) => Err(ExprError::UnexpectedToken {
                position,
                expected: "integer index".into(),
                found: other.to_string(),
            }),
            None => Err(ExprError::UnexpectedEof("integer index".into())),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            _ => None,
        }
    }
}

/// Get operator precedence. `**` is handled by `parse_power_expr`.
fn op_precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<Expression> {
        Box::new(Expression::Identifier(name.into()))
    }

    fn num(v: f64) -> Box<Expression> {
        Box::new(Expression::Number(v))
    }

    #[test]
    fn test_parse_precedence() {
        let expr = parse("a + 2 * b").unwrap();
        assert_eq!(
            expr,
            Expression::Chain {
                first: ident("a"),
                rest: vec![(
                    BinOp::Add,
                    Expression::Chain {
                        first: num(2.0),
                        rest: vec![(BinOp::Mul, *ident("b"))],
                    }
                )],
            }
        );
    }

    #[test]
    fn test_parse_flattens_long_chains() {
        let source = vec!["x"; 10_000].join(" + ");
        match parse(&source).unwrap() {
            Expression::Chain { rest, .. } => assert_eq!(rest.len(), 9_999),
            other => panic!("expected a chain, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_deep_nesting() {
        let source = format!("{}x{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(parse(&source), Err(ExprError::TooDeep(MAX_DEPTH)));

        let source = format!("{}x", "-".repeat(100_000));
        assert_eq!(parse(&source), Err(ExprError::TooDeep(MAX_DEPTH)));

        let source = vec!["2"; 100_000].join(" ** ");
        assert_eq!(parse(&source), Err(ExprError::TooDeep(MAX_DEPTH)));

        let source = format!("{}x{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(parse(&source), Ok(Expression::Identifier("x".into())));
    }

    #[test]
    fn test_parse_left_associative_subtraction() {
        let expr = parse("a - b - c").unwrap();
        assert_eq!(expr.to_string(), "((a - b) - c)");
    }

    #[test]
    fn test_parse_power_right_associative() {
        let expr = parse("2 ** 3 ** 2").unwrap();
        assert_eq!(expr.to_string(), "(2 ** (3 ** 2))");
    }

    #[test]
    fn test_parse_negation_binds_looser_than_power() {
        let expr = parse("-x ** 2").unwrap();
        assert_eq!(expr.to_string(), "-((x ** 2))");

        let expr = parse("2 ** -1").unwrap();
        assert_eq!(expr.to_string(), "(2 ** -(1))");
    }

    #[test]
    fn test_parse_index() {
        let expr = parse("q[3] * 2").unwrap();
        assert_eq!(
            expr,
            Expression::Chain {
                first: Box::new(Expression::Index {
                    name: "q".into(),
                    index: 3
                }),
                rest: vec![(BinOp::Mul, Expression::Number(2.0))],
            }
        );
    }

    #[test]
    fn test_parse_huge_integer_literal() {
        let expr = parse("123456789012345678901234567890 * x").unwrap();
        let Expression::Chain { first, .. } = expr else {
            panic!("expected a product");
        };
        assert!(matches!(*first, Expression::Number(v) if (v - 1.234_567_89e29).abs() < 1e15));
    }

    #[test]
    fn test_parse_parenthesised_square() {
        let expr = parse("(x0 + x1 - 1) ** 2").unwrap();
        assert_eq!(expr.to_string(), "(((x0 + x1) - 1) ** 2)");
        assert_eq!(expr.identifiers(), vec!["x0", "x1"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(""), Err(ExprError::Empty));
        assert_eq!(parse("   "), Err(ExprError::Empty));
        assert!(matches!(parse("x +"), Err(ExprError::UnexpectedEof(_))));
        assert!(matches!(
            parse("x y"),
            Err(ExprError::UnexpectedToken { position: 2, .. })
        ));
        assert!(matches!(parse("(x"), Err(ExprError::UnexpectedEof(_))));
        assert!(matches!(
            parse("q[x]"),
            Err(ExprError::UnexpectedToken { .. })
        ));
        assert!(matches!(
            parse("__import__('os')"),
            Err(ExprError::LexerError { .. })
        ));
    }
}
