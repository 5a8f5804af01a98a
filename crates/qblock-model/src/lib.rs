//! QUBO model builder with a deterministic fallback.
//!
//! A request declares variables, constraints and an objective as JSON. The
//! builder evaluates each expression with `qblock-expr`, turns every
//! constraint into a squared penalty, adds the objective and compiles the
//! sum into a QUBO. Any failure along the way yields a fixed board-strategy
//! QUBO instead, so [`respond`] always produces an answer.
//!
//! | Comparison | Penalty |
//! |------------|---------|
//! | `=`  | `(lhs - rhs)^2` |
//! | `<=` | `(lhs - rhs)^2` |
//! | `>=` | `(rhs - lhs)^2` |
//! | `!=` | `100 * (lhs - rhs)^2` |
//!
//! # Example
//!
//! ```rust
//! use qblock_model::{ModelLimits, respond};
//! use serde_json::json;
//!
//! let request = json!({
//!     "variables": {"x0": {"type": "Binary"}, "x1": {"type": "Binary"}},
//!     "Constraints": [{"lhs": "x0 + x1", "comparison": "=", "rhs": 1}],
//!     "Objective": "x0 - x1",
//! });
//!
//! let outcome = respond(Some(&request), &ModelLimits::default());
//! assert!(!outcome.is_fallback());
//! assert_eq!(outcome.qubo.get("x0", "x1"), Some(2.0));
//! ```

mod builder;
mod error;
mod explain;
mod fallback;
mod pipeline;
mod qubo;
mod spec;

pub use builder::{
    DEFAULT_MAX_ARRAY_SIZE, ModelLimits, Penalty, compile, parse_constraints, parse_objective,
    parse_variables,
};
pub use error::{ModelError, ModelResult};
pub use explain::{Diagnostic, Explanation, Method, ProblemType, Stage};
pub use fallback::{DEFAULT_BOARD_SIZE, create_fallback_qubo};
pub use pipeline::{
    CompiledModel, FailureCause, ModelFailure, Outcome, QuboResponse, build_model,
    fallback_outcome, respond,
};
pub use qubo::{Qubo, pair_key};
pub use spec::{
    Comparison, ConstraintSpec, DEFAULT_ARRAY_SIZE, NOT_EQUAL_WEIGHT, VariableKind, VariableSpec,
};
