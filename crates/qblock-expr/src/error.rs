//! Error types for parsing and evaluating expressions.

use thiserror::Error;

/// Errors that can occur while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ExprError {
    /// Lexer error (invalid token).
    #[error("Lexer error at position {position}: {message}")]
    LexerError { position: usize, message: String },

    /// Unexpected token.
    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    /// Unexpected end of input.
    #[error("Unexpected end of input: expected {0}")]
    UnexpectedEof(String),

    /// The source contained no tokens at all.
    #[error("Empty expression")]
    Empty,

    /// Identifier that is not in the symbol table.
    #[error("Undefined identifier: {0}")]
    UndefinedIdentifier(String),

    /// Subscript applied to a scalar variable.
    #[error("Variable '{0}' is not an array and cannot be indexed")]
    NotIndexable(String),

    /// Array subscript past the end.
    #[error("Index {index} out of bounds for array '{name}' of size {size}")]
    IndexOutOfBounds {
        name: String,
        index: u64,
        size: usize,
    },

    /// Whole array used where a scalar is required.
    #[error("Array '{0}' cannot be used as a scalar; index it like {0}[0]")]
    ArrayAsScalar(String),

    /// Division by an expression that depends on variables.
    #[error("Division by a non-constant expression is not supported")]
    NonConstantDivisor,

    /// Division by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Exponent that cannot be expanded into a polynomial.
    #[error("Invalid exponent {0}: powers of variables need a non-negative integer exponent")]
    InvalidExponent(String),

    /// Exponent above the expansion ceiling.
    #[error("Exponent {exponent} exceeds the maximum of {max}")]
    ExponentTooLarge { exponent: u64, max: u64 },

    /// A product would create a monomial of more than `max` variables.
    #[error("Term of degree {degree} exceeds the maximum degree of {max}")]
    DegreeTooHigh { degree: usize, max: usize },

    /// A product would need more pairwise term multiplications than allowed.
    #[error("Product of {terms} term pairs exceeds the limit of {max}")]
    ProductTooLarge { terms: usize, max: usize },

    /// Parentheses, signs or powers nested deeper than `MAX_DEPTH`.
    #[error("Expression nested deeper than {0} levels")]
    TooDeep(usize),

    /// Arithmetic on constants produced NaN or infinity.
    #[error("Arithmetic produced a non-finite value in '{0}'")]
    NonFinite(String),
}

/// Result type for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;
