//! Explanation payload returned alongside every QUBO.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the returned QUBO was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    QuantumAnnealing,
    ClassicalFallback,
}

/// What the returned QUBO models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemType {
    BinaryQuadraticOptimization,
    TicTacToeStrategy,
}

/// Pipeline stage a diagnostic or failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Request,
    Variables,
    Constraints,
    Objective,
    Compile,
    Sampler,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Request => "request",
            Stage::Variables => "variables",
            Stage::Constraints => "constraints",
            Stage::Objective => "objective",
            Stage::Compile => "compile",
            Stage::Sampler => "sampler",
        };
        f.write_str(name)
    }
}

/// A note recorded while handling one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub stage: Stage,
    pub message: String,
}

impl Diagnostic {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

/// Human-oriented account of how a response was built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub highlights: Vec<String>,
    pub method: Method,
    pub problem_type: ProblemType,
    pub using_fallback: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_qubo_error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_qubo_data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint_count: Option<usize>,

    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl Explanation {
    /// Explanation for a successfully compiled user model.
    pub fn compiled(
        highlights: Vec<String>,
        variable_count: usize,
        constraint_count: usize,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            highlights,
            method: Method::QuantumAnnealing,
            problem_type: ProblemType::BinaryQuadraticOptimization,
            using_fallback: false,
            user_qubo_error: None,
            fallback_reason: None,
            user_qubo_data: None,
            variable_count: Some(variable_count),
            constraint_count: Some(constraint_count),
            diagnostics,
        }
    }

    /// Explanation for a fallback response.
    pub fn fallback(
        highlights: Vec<String>,
        error: String,
        reason: &str,
        data: Option<Value>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        Self {
            highlights,
            method: Method::ClassicalFallback,
            problem_type: ProblemType::TicTacToeStrategy,
            using_fallback: true,
            user_qubo_error: Some(error),
            fallback_reason: Some(reason.to_string()),
            user_qubo_data: data,
            variable_count: None,
            constraint_count: None,
            diagnostics,
        }
    }
}
