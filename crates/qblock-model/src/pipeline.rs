//! Request handling: build the user's QUBO or fall back.
//!
//! [`build_model`] runs the stages in order and stops at the first failure,
//! returning a [`ModelFailure`] that records which stage failed and why.
//! [`respond`] turns either result into an [`Outcome`] and never fails.

use std::collections::BTreeMap;

use qblock_expr::SymbolTable;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::builder::{ModelLimits, Penalty, compile, parse_constraints, parse_objective, parse_variables};
use crate::error::ModelError;
use crate::explain::{Diagnostic, Explanation, Stage};
use crate::fallback::create_fallback_qubo;
use crate::qubo::Qubo;

/// Why a request was diverted to the fallback QUBO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    NoData,
    MissingVariables,
    InvalidVariables,
    VariableParse,
    ConstraintParse,
    ObjectiveParse,
    Compilation,
    EmptyQubo,
    Unexpected,
}

impl FailureCause {
    /// Canonical message for this cause.
    pub fn reason(self) -> &'static str {
        match self {
            Self::NoData => "No valid QUBO data received",
            Self::MissingVariables => "Missing or empty 'variables' field",
            Self::InvalidVariables => "Invalid variable definitions",
            Self::VariableParse => "Failed to parse variables",
            Self::ConstraintParse => "Failed to parse constraints",
            Self::ObjectiveParse => "Failed to parse objective function",
            Self::Compilation => "QUBO compilation error",
            Self::EmptyQubo => "Empty QUBO generated",
            Self::Unexpected => "Unexpected error",
        }
    }

    pub fn stage(self) -> Stage {
        match self {
            Self::NoData => Stage::Request,
            Self::MissingVariables | Self::InvalidVariables | Self::VariableParse => {
                Stage::Variables
            }
            Self::ConstraintParse => Stage::Constraints,
            Self::ObjectiveParse => Stage::Objective,
            Self::Compilation | Self::EmptyQubo => Stage::Compile,
            Self::Unexpected => Stage::Sampler,
        }
    }

    fn hints(self) -> &'static [&'static str] {
        match self {
            Self::NoData => &["Send a JSON object with 'variables', 'Constraints' and 'Objective'"],
            Self::MissingVariables => &[
                "Your QUBO model needs variables defined with a type such as 'Binary'",
                "Example: {\"x0\": {\"type\": \"Binary\"}, \"x1\": {\"type\": \"Binary\"}}",
            ],
            Self::InvalidVariables => &[
                "Variables must have type 'Binary', 'Spin' or 'Array'",
                "Check your variable definitions",
            ],
            Self::VariableParse => &[
                "Check variable names and array sizes",
                "Each variable label must be unique",
            ],
            Self::ConstraintParse => &[
                "Check constraint format",
                "Each constraint needs 'lhs', 'comparison' and 'rhs' fields",
            ],
            Self::ObjectiveParse => &[
                "Check your objective expression syntax",
                "Example: '3 * x0 + 2 * x1 - x2'",
            ],
            Self::Compilation => &[
                "Your QUBO model could not be compiled",
                "Terms may combine at most two variables",
            ],
            Self::EmptyQubo => &["The compiled model has no terms"],
            Self::Unexpected => &["The fallback strategy follows classical tic-tac-toe play"],
        }
    }
}

/// A failed build with everything collected before the failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{reason}")]
pub struct ModelFailure {
    pub cause: FailureCause,
    pub reason: String,
    /// Replaces the raw request in `user_qubo_data` when set.
    pub context: Option<Value>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ModelFailure {
    pub fn new(cause: FailureCause, reason: impl Into<String>) -> Self {
        Self {
            cause,
            reason: reason.into(),
            context: None,
            diagnostics: Vec::new(),
        }
    }

    /// Failure whose reason is the cause's canonical message.
    pub fn canonical(cause: FailureCause) -> Self {
        Self::new(cause, cause.reason())
    }

    /// Failure that wraps a builder error under a stage prefix.
    fn from_error(cause: FailureCause, err: &ModelError) -> Self {
        Self::new(cause, format!("{}: {err}", cause.reason()))
    }

    #[must_use]
    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn stage(&self) -> Stage {
        self.cause.stage()
    }

    fn highlights(&self) -> Vec<String> {
        let mut highlights = vec![format!("Using fallback QUBO: {}", self.reason)];
        highlights.extend(self.cause.hints().iter().map(|s| (*s).to_string()));
        highlights.push("The fallback assigns higher values to better board positions".to_string());
        highlights.push("Center (9) > Corners (7) > Edges (5)".to_string());
        highlights
    }
}

/// A successfully compiled user model.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub qubo: Qubo,
    pub symbols: SymbolTable,
    pub penalties: Vec<Penalty>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledModel {
    /// Highlights naming the label with the largest absolute diagonal weight.
    pub fn highlights(&self) -> Vec<String> {
        let mut highlights = vec!["Your QUBO model compiled successfully".to_string()];

        let strongest = self
            .qubo
            .diagonal()
            .reduce(|best, cur| if cur.1.abs() > best.1.abs() { cur } else { best });
        if let Some((label, weight)) = strongest {
            match label.strip_prefix('x').and_then(|i| i.parse::<usize>().ok()) {
                Some(position) => {
                    highlights.push(format!("The optimal move is to position {position}"));
                    highlights.push(format!("This position has the highest weight: {weight}"));
                }
                None => {
                    highlights.push(format!("The strongest preference is on {label}"));
                    highlights.push(format!("It has the highest weight: {weight}"));
                }
            }
        }

        highlights.push("Higher weights indicate stronger preferences in the model".to_string());
        highlights
    }

    pub fn into_outcome(self) -> Outcome {
        let explanation = Explanation::compiled(
            self.highlights(),
            self.symbols.len(),
            self.penalties.len(),
            self.diagnostics,
        );
        Outcome {
            qubo: self.qubo,
            explanation,
        }
    }
}

/// The QUBO handed back to the client with its explanation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub qubo: Qubo,
    pub explanation: Explanation,
}

impl Outcome {
    pub fn is_fallback(&self) -> bool {
        self.explanation.using_fallback
    }

    pub fn to_response(&self) -> QuboResponse {
        QuboResponse {
            qubo: self.qubo.keyed_terms(),
            offset: self.qubo.offset(),
            explanation: self.explanation.clone(),
        }
    }
}

/// Wire form of an [`Outcome`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuboResponse {
    pub qubo: BTreeMap<String, f64>,
    pub offset: f64,
    pub explanation: Explanation,
}

/// Empty containers, empty strings, `false`, zero and null all count as a
/// missing field.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Run every stage on a request body.
pub fn build_model(
    request: Option<&Value>,
    limits: &ModelLimits,
) -> Result<CompiledModel, ModelFailure> {
    let mut diagnostics = Vec::new();
    let fail = |failure: ModelFailure, mut diagnostics: Vec<Diagnostic>| {
        diagnostics.push(Diagnostic::new(failure.stage(), failure.reason.clone()));
        failure.with_diagnostics(diagnostics)
    };

    let body = match request {
        Some(Value::Object(body)) if !body.is_empty() => body,
        _ => return Err(fail(ModelFailure::canonical(FailureCause::NoData), diagnostics)),
    };

    let variables = match body.get("variables") {
        Some(Value::Object(map)) if !map.is_empty() => map,
        Some(other) if !is_empty_value(other) => {
            let err = ModelError::VariablesNotAnObject(other.to_string());
            return Err(fail(
                ModelFailure::new(FailureCause::InvalidVariables, err.to_string()),
                diagnostics,
            ));
        }
        _ => {
            return Err(fail(
                ModelFailure::canonical(FailureCause::MissingVariables),
                diagnostics,
            ));
        }
    };

    let symbols = match parse_variables(variables, limits) {
        Ok(symbols) => symbols,
        Err(err) if err.is_definition_error() => {
            return Err(fail(
                ModelFailure::new(FailureCause::InvalidVariables, err.to_string()),
                diagnostics,
            ));
        }
        Err(err) => {
            return Err(fail(
                ModelFailure::from_error(FailureCause::VariableParse, &err),
                diagnostics,
            ));
        }
    };
    diagnostics.push(Diagnostic::new(
        Stage::Variables,
        format!(
            "Declared {} variable(s) with {} label(s)",
            symbols.len(),
            symbols.labels().len()
        ),
    ));

    let penalties = match parse_constraints(body.get("Constraints"), &symbols) {
        Ok(penalties) => penalties,
        Err(err) => {
            return Err(fail(
                ModelFailure::from_error(FailureCause::ConstraintParse, &err),
                diagnostics,
            ));
        }
    };
    diagnostics.push(Diagnostic::new(
        Stage::Constraints,
        format!("Built {} penalty term(s)", penalties.len()),
    ));

    let objective = match body.get("Objective") {
        None | Some(Value::Null) => parse_objective("0", &symbols, &mut diagnostics),
        Some(Value::String(source)) => parse_objective(source, &symbols, &mut diagnostics),
        Some(other) => Err(ModelError::ObjectiveNotAString(other.to_string())),
    };
    let objective = match objective {
        Ok(objective) => objective,
        Err(err) => {
            return Err(fail(
                ModelFailure::from_error(FailureCause::ObjectiveParse, &err),
                diagnostics,
            ));
        }
    };

    let summary = json!({
        "variables": symbols.labels(),
        "objective": objective.to_string(),
        "constraints": penalties
            .iter()
            .map(|p| p.constraint.to_string())
            .collect::<Vec<_>>(),
    });
    let qubo = match compile(&penalties, objective) {
        Ok(qubo) => qubo,
        Err(err) => {
            return Err(fail(
                ModelFailure::from_error(FailureCause::Compilation, &err).with_context(summary),
                diagnostics,
            ));
        }
    };

    if qubo.is_empty() {
        return Err(fail(
            ModelFailure::canonical(FailureCause::EmptyQubo),
            diagnostics,
        ));
    }

    diagnostics.push(Diagnostic::new(
        Stage::Compile,
        format!("Compiled {} QUBO term(s)", qubo.len()),
    ));

    Ok(CompiledModel {
        qubo,
        symbols,
        penalties,
        diagnostics,
    })
}

/// Build the fallback outcome for a failure.
pub fn fallback_outcome(
    failure: &ModelFailure,
    request: Option<&Value>,
    limits: &ModelLimits,
) -> Outcome {
    warn!(
        stage = %failure.stage(),
        reason = %failure.reason,
        "Using fallback QUBO"
    );

    let data = failure.context.clone().or_else(|| request.cloned());
    let explanation = Explanation::fallback(
        failure.highlights(),
        failure.reason.clone(),
        failure.cause.reason(),
        data,
        failure.diagnostics.clone(),
    );

    Outcome {
        qubo: create_fallback_qubo(limits.fallback_board_size),
        explanation,
    }
}

/// Compile a request, substituting the fallback on any failure.
pub fn respond(request: Option<&Value>, limits: &ModelLimits) -> Outcome {
    match build_model(request, limits) {
        Ok(model) => {
            info!(
                variables = model.symbols.len(),
                constraints = model.penalties.len(),
                terms = model.qubo.len(),
                "Compiled user QUBO"
            );
            model.into_outcome()
        }
        Err(failure) => {
            debug!(cause = ?failure.cause, "Model build failed");
            fallback_outcome(&failure, request, limits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ModelLimits {
        ModelLimits::default()
    }

    #[test]
    fn test_no_data() {
        let failure = build_model(None, &limits()).unwrap_err();
        assert_eq!(failure.cause, FailureCause::NoData);
        assert_eq!(failure.reason, "No valid QUBO data received");

        let failure = build_model(Some(&json!({})), &limits()).unwrap_err();
        assert_eq!(failure.cause, FailureCause::NoData);

        let failure = build_model(Some(&json!([1, 2])), &limits()).unwrap_err();
        assert_eq!(failure.cause, FailureCause::NoData);
    }

    #[test]
    fn test_missing_variables() {
        for body in [
            json!({"Objective": "x0"}),
            json!({"variables": {}}),
            json!({"variables": null}),
        ] {
            let failure = build_model(Some(&body), &limits()).unwrap_err();
            assert_eq!(failure.cause, FailureCause::MissingVariables);
        }

        let failure = build_model(Some(&json!({"variables": [1]})), &limits()).unwrap_err();
        assert_eq!(failure.cause, FailureCause::InvalidVariables);
    }

    #[test]
    fn test_stage_classification() {
        let cases = [
            (
                json!({"variables": {"x": {"type": "Integer"}}}),
                FailureCause::InvalidVariables,
            ),
            (
                json!({"variables": {"q": {"type": "Array", "size": 5000}}}),
                FailureCause::VariableParse,
            ),
            (
                json!({"variables": {"x": {"type": "Binary"}},
                       "Constraints": [{"lhs": "y", "rhs": 1}]}),
                FailureCause::ConstraintParse,
            ),
            (
                json!({"variables": {"x": {"type": "Binary"}}, "Objective": "x +"}),
                FailureCause::ObjectiveParse,
            ),
            (
                json!({"variables": {"x": {"type": "Binary"}}, "Objective": 3}),
                FailureCause::ObjectiveParse,
            ),
            (
                json!({"variables": {"a": {"type": "Binary"}, "b": {"type": "Binary"},
                                     "c": {"type": "Binary"}},
                       "Objective": "a * b * c"}),
                FailureCause::ObjectiveParse,
            ),
            (
                json!({"variables": {"a": {"type": "Binary"}},
                       "Constraints": [{"lhs": "1e200 * a", "comparison": "=", "rhs": 0}]}),
                FailureCause::Compilation,
            ),
            (
                json!({"variables": []}),
                FailureCause::MissingVariables,
            ),
            (
                json!({"variables": ""}),
                FailureCause::MissingVariables,
            ),
            (
                json!({"variables": false}),
                FailureCause::MissingVariables,
            ),
            (
                json!({"variables": [{"x": {"type": "Binary"}}]}),
                FailureCause::InvalidVariables,
            ),
        ];

        for (body, expected) in cases {
            let failure = build_model(Some(&body), &limits()).unwrap_err();
            assert_eq!(failure.cause, expected, "body: {body}");
            if expected != FailureCause::InvalidVariables {
                assert!(failure.reason.starts_with(expected.reason()));
            }
            assert_eq!(
                failure.diagnostics.last().map(|d| d.stage),
                Some(expected.stage())
            );
        }
    }

    #[test]
    fn test_compilation_failure_carries_summary() {
        let body = json!({
            "variables": {"a": {"type": "Binary"}, "b": {"type": "Binary"}, "c": {"type": "Binary"}},
            "Constraints": [{"lhs": "1e200 * a", "comparison": "=", "rhs": 0}],
            "Objective": "a + b + c",
        });
        let outcome = respond(Some(&body), &limits());
        let data = outcome.explanation.user_qubo_data.unwrap();
        assert_eq!(data["variables"], json!(["a", "b", "c"]));
        assert_eq!(data["constraints"], json!(["1e200 * a = 0"]));
    }

    #[test]
    fn test_success_highlights() {
        let body = json!({
            "variables": {"x0": {"type": "Binary"}, "x1": {"type": "Binary"}},
            "Objective": "x0 - 5 * x1",
        });
        let outcome = respond(Some(&body), &limits());
        assert!(!outcome.is_fallback());
        assert_eq!(
            outcome.explanation.highlights[1],
            "The optimal move is to position 1"
        );
        assert_eq!(outcome.explanation.variable_count, Some(2));
        assert_eq!(outcome.explanation.constraint_count, Some(0));
    }

    #[test]
    fn test_fallback_response_shape() {
        let body = json!({"variables": {"x": {"type": "Integer"}}});
        let response = respond(Some(&body), &limits()).to_response();

        assert_eq!(response.qubo.len(), 45);
        assert_eq!(response.qubo["('x4', 'x4')"], 9.0);
        assert_eq!(response.offset, 1.0);
        assert_eq!(
            response.explanation.user_qubo_error.as_deref(),
            Some("Unsupported variable type: Integer")
        );
        assert_eq!(
            response.explanation.fallback_reason.as_deref(),
            Some("Invalid variable definitions")
        );
        assert_eq!(response.explanation.user_qubo_data, Some(body));
        assert!(response.explanation.highlights[0].contains("Integer"));
    }
}
