//! Abstract syntax tree for model expressions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An arithmetic expression over declared variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Numeric literal.
    Number(f64),
    /// Reference to a declared variable: `x0`.
    Identifier(String),
    /// Element of a declared array: `q[3]`.
    Index { name: String, index: u64 },
    /// Unary negation.
    Neg(Box<Expression>),
    /// Left-associative chain `first op1 e1 op2 e2 ...`, folded in order.
    ///
    /// Long sums stay flat here, so tree depth only grows with nesting.
    Chain {
        first: Box<Expression>,
        rest: Vec<(BinOp, Expression)>,
    },
    /// `base ** exponent`.
    Pow {
        base: Box<Expression>,
        exponent: Box<Expression>,
    },
}

/// Left-associative binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Source symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
        }
    }
}

impl Expression {
    /// Names of all variables referenced by this expression, in first-use order.
    pub fn identifiers(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_identifiers(&mut names);
        names
    }

    fn collect_identifiers<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Number(_) => {}
            Expression::Identifier(name) | Expression::Index { name, .. } => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expression::Neg(inner) => inner.collect_identifiers(names),
            Expression::Chain { first, rest } => {
                first.collect_identifiers(names);
                for (_, operand) in rest {
                    operand.collect_identifiers(names);
                }
            }
            Expression::Pow { base, exponent } => {
                base.collect_identifiers(names);
                exponent.collect_identifiers(names);
            }
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Number(v) => write!(f, "{v}"),
            Expression::Identifier(name) => write!(f, "{name}"),
            Expression::Index { name, index } => write!(f, "{name}[{index}]"),
            Expression::Neg(inner) => write!(f, "-({inner})"),
            Expression::Chain { first, rest } => {
                for _ in rest {
                    f.write_str("(")?;
                }
                write!(f, "{first}")?;
                for (op, operand) in rest {
                    write!(f, " {} {operand})", op.symbol())?;
                }
                Ok(())
            }
            Expression::Pow { base, exponent } => write!(f, "({base} ** {exponent})"),
        }
    }
}
