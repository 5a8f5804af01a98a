//! Evaluation of expression trees against declared symbols.

use std::collections::BTreeMap;

use crate::ast::{BinOp, Expression};
use crate::error::{ExprError, ExprResult};
use crate::parser::parse;
use crate::poly::Polynomial;

/// Highest exponent expanded when the base depends on variables.
pub const MAX_EXPONENT: u64 = 16;

/// Most variables in one monomial. A QUBO holds at most pairwise terms.
pub const MAX_DEGREE: usize = 2;

/// A declared symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Binary variable taking values in {0, 1}.
    Binary(String),
    /// Spin variable taking values in {-1, +1}, lowered to `2b - 1`.
    Spin(String),
    /// Array of binary variables, one label per element.
    Array(Vec<String>),
}

impl Symbol {
    /// Binary labels introduced by this symbol.
    pub fn labels(&self) -> &[String] {
        match self {
            Symbol::Binary(label) | Symbol::Spin(label) => std::slice::from_ref(label),
            Symbol::Array(labels) => labels,
        }
    }
}

/// Name → symbol mapping built from a request's variable declarations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SymbolTable {
    symbols: BTreeMap<String, Symbol>,
}

impl SymbolTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a symbol, returning the previous one with the same name.
    pub fn insert(&mut self, name: impl Into<String>, symbol: Symbol) -> Option<Symbol> {
        self.symbols.insert(name.into(), symbol)
    }

    /// Look up a symbol by name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    /// Iterate declared `(name, symbol)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.symbols.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of declared names (an array counts once).
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Every binary label, array elements included, in declaration-name order.
    pub fn labels(&self) -> Vec<&str> {
        self.symbols
            .values()
            .flat_map(Symbol::labels)
            .map(String::as_str)
            .collect()
    }

    /// Scalar polynomial for each declared label (spins lowered).
    pub fn label_polynomials(&self) -> Vec<Polynomial> {
        self.symbols
            .values()
            .flat_map(|symbol| match symbol {
                Symbol::Binary(label) => vec![Polynomial::variable(label.as_str())],
                Symbol::Spin(label) => vec![Polynomial::spin(label.as_str())],
                Symbol::Array(labels) => labels
                    .iter()
                    .map(|l| Polynomial::variable(l.as_str()))
                    .collect(),
            })
            .collect()
    }
}

/// Parse and evaluate a source string in one step.
pub fn evaluate_str(source: &str, symbols: &SymbolTable) -> ExprResult<Polynomial> {
    let expr = parse(source)?;
    evaluate(&expr, symbols)
}

/// Evaluate an expression tree into a polynomial.
pub fn evaluate(expr: &Expression, symbols: &SymbolTable) -> ExprResult<Polynomial> {
    match expr {
        Expression::Number(v) => Ok(Polynomial::constant(*v)),
        Expression::Identifier(name) => match symbols.get(name) {
            Some(Symbol::Binary(label)) => Ok(Polynomial::variable(label.as_str())),
            Some(Symbol::Spin(label)) => Ok(Polynomial::spin(label.as_str())),
            Some(Symbol::Array(_)) => Err(ExprError::ArrayAsScalar(name.clone())),
            None => Err(ExprError::UndefinedIdentifier(name.clone())),
        },
        Expression::Index { name, index } => match symbols.get(name) {
            Some(Symbol::Array(labels)) => usize::try_from(*index)
                .ok()
                .and_then(|i| labels.get(i))
                .map(|label| Polynomial::variable(label.as_str()))
                .ok_or_else(|| ExprError::IndexOutOfBounds {
                    name: name.clone(),
                    index: *index,
                    size: labels.len(),
                }),
            Some(_) => Err(ExprError::NotIndexable(name.clone())),
            None => Err(ExprError::UndefinedIdentifier(name.clone())),
        },
        Expression::Neg(inner) => Ok(-evaluate(inner, symbols)?),
        Expression::Chain { first, rest } => {
            let mut acc = evaluate(first, symbols)?;
            for (op, operand) in rest {
                let rhs = evaluate(operand, symbols)?;
                acc = match op {
                    BinOp::Add => acc + rhs,
                    BinOp::Sub => acc - rhs,
                    BinOp::Mul => acc.checked_mul(&rhs, MAX_DEGREE)?,
                    BinOp::Div => divide(acc, &rhs)?,
                };
            }
            // Terms are never pruned, so a non-finite coefficient survives to here.
            if acc.is_finite() {
                Ok(acc)
            } else {
                Err(ExprError::NonFinite(expr.to_string()))
            }
        }
        Expression::Pow { base, exponent } => {
            let base = evaluate(base, symbols)?;
            let exponent = evaluate(exponent, symbols)?;
            let result = power(&base, &exponent)?;
            if result.is_finite() {
                Ok(result)
            } else {
                Err(ExprError::NonFinite(expr.to_string()))
            }
        }
    }
}

fn divide(lhs: Polynomial, rhs: &Polynomial) -> ExprResult<Polynomial> {
    let divisor = rhs.as_constant().ok_or(ExprError::NonConstantDivisor)?;
    if divisor == 0.0 {
        return Err(ExprError::DivisionByZero);
    }
    Ok(lhs.scale(1.0 / divisor))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn power(base: &Polynomial, exponent: &Polynomial) -> ExprResult<Polynomial> {
    let exp = exponent
        .as_constant()
        .ok_or_else(|| ExprError::InvalidExponent(exponent.to_string()))?;

    if let Some(b) = base.as_constant() {
        if b == 0.0 && exp < 0.0 {
            return Err(ExprError::DivisionByZero);
        }
        return Ok(Polynomial::constant(b.powf(exp)));
    }

    if exp < 0.0 || exp.fract() != 0.0 {
        return Err(ExprError::InvalidExponent(exp.to_string()));
    }
    if exp > MAX_EXPONENT as f64 {
        return Err(ExprError::ExponentTooLarge {
            exponent: exp as u64,
            max: MAX_EXPONENT,
        });
    }
    base.checked_pow(exp as u32, MAX_DEGREE)
}
