//! Model builder: declarations to symbols, constraints to penalties, and the
//! summed model to a QUBO.

use std::collections::BTreeSet;

use qblock_expr::{Polynomial, Symbol, SymbolTable, evaluate_str};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::explain::{Diagnostic, Stage};
use crate::fallback::DEFAULT_BOARD_SIZE;
use crate::qubo::Qubo;
use crate::spec::{ConstraintSpec, VariableKind, VariableSpec};

/// Default ceiling on `Array` sizes.
pub const DEFAULT_MAX_ARRAY_SIZE: usize = 1024;

/// Per-request resource limits and fallback shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelLimits {
    /// Largest accepted `Array` size.
    pub max_array_size: usize,
    /// Number of cells in the fallback board.
    pub fallback_board_size: usize,
}

impl Default for ModelLimits {
    fn default() -> Self {
        Self {
            max_array_size: DEFAULT_MAX_ARRAY_SIZE,
            fallback_board_size: DEFAULT_BOARD_SIZE,
        }
    }
}

/// A constraint together with its compiled penalty polynomial.
#[derive(Debug, Clone, PartialEq)]
pub struct Penalty {
    pub constraint: ConstraintSpec,
    pub polynomial: Polynomial,
}

/// Build the symbol table from the `variables` mapping.
///
/// All declarations are validated before any symbol is created, so a bad
/// `type` anywhere is reported ahead of size problems.
pub fn parse_variables(spec: &Map<String, Value>, limits: &ModelLimits) -> ModelResult<SymbolTable> {
    let decls = spec
        .iter()
        .map(|(name, value)| VariableSpec::from_json(name, value))
        .collect::<ModelResult<Vec<_>>>()?;

    let mut symbols = SymbolTable::new();
    let mut seen = BTreeSet::new();

    for decl in decls {
        if let Some(size) = decl.size {
            if usize::try_from(size).map_or(true, |s| s > limits.max_array_size) {
                return Err(ModelError::ArrayTooLarge {
                    name: decl.name,
                    size,
                    max: limits.max_array_size,
                });
            }
        }

        let labels = decl.labels();
        for label in &labels {
            if !seen.insert(label.clone()) {
                return Err(ModelError::DuplicateLabel(label.clone()));
            }
        }

        let symbol = match decl.kind {
            VariableKind::Binary => Symbol::Binary(decl.name.clone()),
            VariableKind::Spin => Symbol::Spin(decl.name.clone()),
            VariableKind::Array => Symbol::Array(labels),
        };
        symbols.insert(decl.name, symbol);
    }

    debug!(
        variables = symbols.len(),
        labels = seen.len(),
        "Parsed variable declarations"
    );
    Ok(symbols)
}

/// Turn the `Constraints` list into penalty polynomials.
///
/// A missing or null list is empty.
pub fn parse_constraints(list: Option<&Value>, symbols: &SymbolTable) -> ModelResult<Vec<Penalty>> {
    let items = match list {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(ModelError::ConstraintsNotAList(other.to_string())),
    };

    let mut penalties = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let constraint = ConstraintSpec::from_json(index, item)?;
        let expression_error = |source| ModelError::ConstraintExpression {
            index,
            lhs: constraint.lhs.clone(),
            source,
        };
        let lhs = evaluate_str(&constraint.lhs, symbols).map_err(expression_error)?;
        let polynomial = constraint
            .comparison
            .penalty(&lhs, constraint.rhs)
            .map_err(expression_error)?;

        debug!(index, constraint = %constraint, terms = polynomial.len(), "Built penalty");
        penalties.push(Penalty {
            constraint,
            polynomial,
        });
    }

    Ok(penalties)
}

/// Evaluate the objective.
///
/// An empty or `"0"` objective becomes a zero-weighted sum over every label,
/// so each declared variable still appears in the QUBO. A non-trivial
/// objective that folds to a constant gets the same terms added.
pub fn parse_objective(
    source: &str,
    symbols: &SymbolTable,
    diagnostics: &mut Vec<Diagnostic>,
) -> ModelResult<Polynomial> {
    let source = source.trim();
    if source.is_empty() || source == "0" {
        diagnostics.push(Diagnostic::new(
            Stage::Objective,
            "No objective given; every variable is included with weight 0",
        ));
        return Ok(zero_weighted(symbols));
    }

    let objective = evaluate_str(source, symbols).map_err(|err| ModelError::ObjectiveExpression {
        expr: source.to_string(),
        source: err,
    })?;

    if let Some(value) = objective.as_constant() {
        diagnostics.push(Diagnostic::new(
            Stage::Objective,
            format!("Objective '{source}' is the constant {value}; every variable is included with weight 0"),
        ));
        return Ok(objective + zero_weighted(symbols));
    }

    Ok(objective)
}

fn zero_weighted(symbols: &SymbolTable) -> Polynomial {
    symbols
        .labels()
        .into_iter()
        .map(|label| Polynomial::variable(label).scale(0.0))
        .sum()
}

/// Sum penalties and objective and fold the result into a QUBO.
pub fn compile(penalties: &[Penalty], objective: Polynomial) -> ModelResult<Qubo> {
    let model = penalties
        .iter()
        .map(|p| p.polynomial.clone())
        .sum::<Polynomial>()
        + objective;

    if !model.is_finite() {
        return Err(ModelError::NonFinite);
    }
    if model.variables().is_empty() {
        return Err(ModelError::NoVariables);
    }

    // `+ 0.0` turns a negative zero into zero
    let mut qubo = Qubo::new(model.constant_term() + 0.0);
    for (monomial, coeff) in model.terms() {
        match monomial.as_slice() {
            [] => {}
            [a] => qubo.add(a, a, coeff),
            [a, b] => qubo.add(a, b, coeff),
            _ => {
                return Err(ModelError::HigherOrderTerm {
                    term: monomial.join("*"),
                    degree: monomial.len(),
                });
            }
        }
    }

    debug!(terms = qubo.len(), offset = qubo.offset(), "Compiled QUBO");
    Ok(qubo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qblock_expr::ExprError;
    use serde_json::json;

    fn variables(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    fn binary(names: &[&str]) -> SymbolTable {
        let spec = names
            .iter()
            .map(|n| ((*n).to_string(), json!({"type": "Binary"})))
            .collect();
        parse_variables(&spec, &ModelLimits::default()).unwrap()
    }

    #[test]
    fn test_parse_variables() {
        let spec = variables(json!({
            "x": {"type": "Binary"},
            "s": {"type": "Spin"},
            "q": {"type": "Array", "size": 2},
        }));
        let symbols = parse_variables(&spec, &ModelLimits::default()).unwrap();

        assert_eq!(symbols.len(), 3);
        assert_eq!(symbols.labels(), vec!["q[0]", "q[1]", "s", "x"]);
        assert_eq!(symbols.get("s"), Some(&Symbol::Spin("s".into())));
    }

    #[test]
    fn test_parse_variables_limits() {
        let limits = ModelLimits {
            max_array_size: 4,
            ..ModelLimits::default()
        };
        let spec = variables(json!({"q": {"type": "Array", "size": 5}}));
        assert!(matches!(
            parse_variables(&spec, &limits),
            Err(ModelError::ArrayTooLarge { size: 5, max: 4, .. })
        ));
    }

    #[test]
    fn test_parse_variables_type_errors_win() {
        let spec = variables(json!({
            "a": {"type": "Array", "size": 100000},
            "b": {"type": "Integer"},
        }));
        assert_eq!(
            parse_variables(&spec, &ModelLimits::default()),
            Err(ModelError::UnsupportedVariableType("Integer".into()))
        );
    }

    #[test]
    fn test_duplicate_labels() {
        let spec = variables(json!({
            "q": {"type": "Array", "size": 2},
            "q[1]": {"type": "Binary"},
        }));
        assert_eq!(
            parse_variables(&spec, &ModelLimits::default()),
            Err(ModelError::DuplicateLabel("q[1]".into()))
        );
    }

    #[test]
    fn test_parse_constraints() {
        let symbols = binary(&["x0", "x1"]);
        let list = json!([{"lhs": "x0 + x1", "comparison": "=", "rhs": 1}]);
        let penalties = parse_constraints(Some(&list), &symbols).unwrap();

        assert_eq!(penalties.len(), 1);
        let p = &penalties[0].polynomial;
        assert_eq!(p.coefficient(&["x0", "x1"]), Some(2.0));
        assert_eq!(p.coefficient(&["x0"]), Some(-1.0));
        assert_eq!(p.constant_term(), 1.0);

        assert!(parse_constraints(None, &symbols).unwrap().is_empty());
        assert!(parse_constraints(Some(&Value::Null), &symbols).unwrap().is_empty());
    }

    #[test]
    fn test_parse_constraints_errors() {
        let symbols = binary(&["x0"]);

        let undeclared = json!([{"lhs": "x0 + y", "rhs": 1}]);
        assert!(matches!(
            parse_constraints(Some(&undeclared), &symbols),
            Err(ModelError::ConstraintExpression { index: 0, .. })
        ));

        let not_a_list = json!({"lhs": "x0"});
        assert!(matches!(
            parse_constraints(Some(&not_a_list), &symbols),
            Err(ModelError::ConstraintsNotAList(_))
        ));
    }

    #[test]
    fn test_zero_objective() {
        let symbols = binary(&["a", "b"]);
        let mut diagnostics = Vec::new();
        let objective = parse_objective(" 0 ", &symbols, &mut diagnostics).unwrap();

        assert_eq!(objective.coefficient(&["a"]), Some(0.0));
        assert_eq!(objective.coefficient(&["b"]), Some(0.0));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].stage, Stage::Objective);
    }

    #[test]
    fn test_constant_objective() {
        let symbols = binary(&["a"]);
        let mut diagnostics = Vec::new();
        let objective = parse_objective("2 * 3", &symbols, &mut diagnostics).unwrap();

        assert_eq!(objective.constant_term(), 6.0);
        assert_eq!(objective.coefficient(&["a"]), Some(0.0));
        assert!(diagnostics[0].message.contains("constant 6"));
    }

    #[test]
    fn test_compile() {
        let symbols = binary(&["x0", "x1"]);
        let list = json!([{"lhs": "x0 + x1", "rhs": 1}]);
        let penalties = parse_constraints(Some(&list), &symbols).unwrap();
        let objective = parse_objective("x0 - x1", &symbols, &mut Vec::new()).unwrap();
        let qubo = compile(&penalties, objective).unwrap();

        assert_eq!(qubo.get("x0", "x0"), Some(0.0));
        assert_eq!(qubo.get("x1", "x1"), Some(-2.0));
        assert_eq!(qubo.get("x0", "x1"), Some(2.0));
        assert_eq!(qubo.offset(), 1.0);
    }

    #[test]
    fn test_compile_rejects_cubic_terms() {
        let objective = Polynomial::variable("a") * Polynomial::variable("b") * Polynomial::variable("c");
        assert!(matches!(
            compile(&[], objective),
            Err(ModelError::HigherOrderTerm { degree: 3, .. })
        ));
    }

    #[test]
    fn test_cubic_expressions_fail_while_parsing() {
        let symbols = binary(&["a", "b", "c"]);
        assert!(matches!(
            parse_objective("a * b * c", &symbols, &mut Vec::new()),
            Err(ModelError::ObjectiveExpression {
                source: ExprError::DegreeTooHigh { degree: 3, .. },
                ..
            })
        ));

        // Squaring a quadratic left-hand side with a third variable.
        let list = json!([{"lhs": "a * b + c", "rhs": 1}]);
        assert!(matches!(
            parse_constraints(Some(&list), &symbols),
            Err(ModelError::ConstraintExpression {
                index: 0,
                source: ExprError::DegreeTooHigh { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_compile_requires_variables() {
        assert_eq!(
            compile(&[], Polynomial::constant(3.0)),
            Err(ModelError::NoVariables)
        );
    }
}
