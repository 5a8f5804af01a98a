//! Error types for model building.

use qblock_expr::ExprError;
use thiserror::Error;

/// Errors raised while turning a request into a QUBO.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// `variables` is present but is not a mapping.
    #[error("'variables' must be an object, got {0}")]
    VariablesNotAnObject(String),

    /// Variable definition is not an object or has no `type`.
    #[error("Invalid variable definition for {0}")]
    InvalidVariableDefinition(String),

    /// `type` is not Binary, Spin or Array.
    #[error("Unsupported variable type: {0}")]
    UnsupportedVariableType(String),

    /// Array `size` is not a non-negative integer.
    #[error("Invalid size for array '{name}': {size}")]
    InvalidArraySize { name: String, size: String },

    /// Array `size` above the configured ceiling.
    #[error("Array '{name}' has {size} elements, the maximum is {max}")]
    ArrayTooLarge { name: String, size: u64, max: usize },

    /// Two declarations produce the same variable label.
    #[error("Variable label '{0}' is declared more than once")]
    DuplicateLabel(String),

    /// `Constraints` is present but is not a list.
    #[error("'Constraints' must be a list, got {0}")]
    ConstraintsNotAList(String),

    /// A constraint entry is structurally wrong.
    #[error("Constraint {index}: {reason}")]
    InvalidConstraint { index: usize, reason: String },

    /// A constraint uses an operator other than `=`, `<=`, `>=`, `!=`.
    #[error("Constraint {index}: unsupported comparison '{comparison}'")]
    UnsupportedComparison { index: usize, comparison: String },

    /// A constraint's left-hand side could not be evaluated.
    #[error("Constraint {index} ('{lhs}'): {source}")]
    ConstraintExpression {
        index: usize,
        lhs: String,
        #[source]
        source: ExprError,
    },

    /// `Objective` is present but is not a string.
    #[error("'Objective' must be a string, got {0}")]
    ObjectiveNotAString(String),

    /// The objective could not be evaluated.
    #[error("Objective ('{expr}'): {source}")]
    ObjectiveExpression {
        expr: String,
        #[source]
        source: ExprError,
    },

    /// A compiled monomial has more than two variables.
    #[error("Term {term} has degree {degree}; a QUBO allows at most quadratic terms")]
    HigherOrderTerm { term: String, degree: usize },

    /// The compiled model references no variables.
    #[error("The model does not reference any variables")]
    NoVariables,

    /// The compiled model has a NaN or infinite coefficient.
    #[error("The model has a non-finite coefficient")]
    NonFinite,
}

impl ModelError {
    /// Whether this error comes from validating declarations rather than
    /// building symbols from them.
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            ModelError::VariablesNotAnObject(_)
                | ModelError::InvalidVariableDefinition(_)
                | ModelError::UnsupportedVariableType(_)
        )
    }
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
