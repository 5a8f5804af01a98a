//! Typed views of the request's variable and constraint declarations.
//!
//! Requests arrive as loose JSON, so these are read field by field from a
//! `serde_json::Value` instead of derived, letting each malformed field map
//! to its own [`ModelError`].

use std::fmt;

use qblock_expr::{ExprResult, MAX_DEGREE, Polynomial};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ModelError, ModelResult};

/// Default number of elements for an `Array` variable without `size`.
pub const DEFAULT_ARRAY_SIZE: usize = 10;

/// Weight applied to `!=` penalties.
pub const NOT_EQUAL_WEIGHT: f64 = 100.0;

/// Variable kind as written in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableKind {
    Binary,
    Spin,
    Array,
}

impl VariableKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "Binary" => Some(Self::Binary),
            "Spin" => Some(Self::Spin),
            "Array" => Some(Self::Array),
            _ => None,
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "Binary",
            Self::Spin => "Spin",
            Self::Array => "Array",
        };
        f.write_str(name)
    }
}

/// One entry of the `variables` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    pub kind: VariableKind,
    /// Element count, only meaningful for arrays.
    pub size: Option<u64>,
}

impl VariableSpec {
    /// Read a declaration of the form `{"type": ..., "size"?: ...}`.
    pub fn from_json(name: &str, value: &Value) -> ModelResult<Self> {
        let invalid = || ModelError::InvalidVariableDefinition(name.to_string());

        let obj = value.as_object().ok_or_else(invalid)?;
        let ty = obj.get("type").ok_or_else(invalid)?;
        let kind = match ty {
            Value::String(s) => VariableKind::from_name(s)
                .ok_or_else(|| ModelError::UnsupportedVariableType(s.clone()))?,
            other => return Err(ModelError::UnsupportedVariableType(other.to_string())),
        };

        let size = match (kind, obj.get("size")) {
            (VariableKind::Array, Some(Value::Null) | None) => None,
            (VariableKind::Array, Some(raw)) => {
                Some(raw.as_u64().ok_or_else(|| ModelError::InvalidArraySize {
                    name: name.to_string(),
                    size: raw.to_string(),
                })?)
            }
            _ => None,
        };

        Ok(Self {
            name: name.to_string(),
            kind,
            size,
        })
    }

    /// Labels this declaration introduces.
    pub fn labels(&self) -> Vec<String> {
        match self.kind {
            VariableKind::Binary | VariableKind::Spin => vec![self.name.clone()],
            VariableKind::Array => {
                let size = self
                    .size
                    .and_then(|s| usize::try_from(s).ok())
                    .unwrap_or(DEFAULT_ARRAY_SIZE);
                (0..size).map(|i| format!("{}[{i}]", self.name)).collect()
            }
        }
    }
}

/// Constraint comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparison {
    #[default]
    #[serde(rename = "=")]
    Equal,
    #[serde(rename = "<=")]
    LessEqual,
    #[serde(rename = ">=")]
    GreaterEqual,
    #[serde(rename = "!=")]
    NotEqual,
}

impl Comparison {
    /// Parse the operator's textual form.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Equal),
            "<=" => Some(Self::LessEqual),
            ">=" => Some(Self::GreaterEqual),
            "!=" => Some(Self::NotEqual),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::NotEqual => "!=",
        }
    }

    /// Quadratic penalty for `lhs <op> rhs`.
    ///
    /// Inequalities use the same squared difference as equality, so they
    /// penalize deviation in both directions. Squaring fails if `lhs`
    /// already has quadratic terms that would grow past [`MAX_DEGREE`].
    pub fn penalty(self, lhs: &Polynomial, rhs: f64) -> ExprResult<Polynomial> {
        let rhs = Polynomial::constant(rhs);
        Ok(match self {
            Self::Equal | Self::LessEqual => (lhs.clone() - rhs).checked_pow(2, MAX_DEGREE)?,
            Self::GreaterEqual => (rhs - lhs.clone()).checked_pow(2, MAX_DEGREE)?,
            Self::NotEqual => (lhs.clone() - rhs)
                .checked_pow(2, MAX_DEGREE)?
                .scale(NOT_EQUAL_WEIGHT),
        })
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One entry of the `Constraints` list.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    pub lhs: String,
    pub comparison: Comparison,
    pub rhs: f64,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        Self {
            lhs: "0".to_string(),
            comparison: Comparison::Equal,
            rhs: 0.0,
        }
    }
}

impl ConstraintSpec {
    /// Read `{"lhs"?, "comparison"?, "rhs"?}`; absent or null fields take
    /// their defaults.
    pub fn from_json(index: usize, value: &Value) -> ModelResult<Self> {
        let invalid = |reason: String| ModelError::InvalidConstraint { index, reason };

        let obj = value
            .as_object()
            .ok_or_else(|| invalid(format!("expected an object, got {value}")))?;
        let mut spec = Self::default();

        match obj.get("lhs") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => spec.lhs.clone_from(s),
            Some(other) => return Err(invalid(format!("'lhs' must be a string, got {other}"))),
        }

        match obj.get("comparison") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => {
                spec.comparison =
                    Comparison::from_symbol(s.trim()).ok_or_else(|| {
                        ModelError::UnsupportedComparison {
                            index,
                            comparison: s.clone(),
                        }
                    })?;
            }
            Some(other) => {
                return Err(ModelError::UnsupportedComparison {
                    index,
                    comparison: other.to_string(),
                });
            }
        }

        match obj.get("rhs") {
            None | Some(Value::Null) => {}
            Some(Value::Number(n)) => {
                spec.rhs = n
                    .as_f64()
                    .ok_or_else(|| invalid(format!("'rhs' is out of range: {n}")))?;
            }
            Some(other) => return Err(invalid(format!("'rhs' must be a number, got {other}"))),
        }

        Ok(spec)
    }
}

impl fmt::Display for ConstraintSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.comparison, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_variable_kinds() {
        let v = VariableSpec::from_json("x", &json!({"type": "Binary"})).unwrap();
        assert_eq!(v.kind, VariableKind::Binary);
        assert_eq!(v.labels(), vec!["x"]);

        let v = VariableSpec::from_json("q", &json!({"type": "Array", "size": 3})).unwrap();
        assert_eq!(v.labels(), vec!["q[0]", "q[1]", "q[2]"]);

        let v = VariableSpec::from_json("q", &json!({"type": "Array"})).unwrap();
        assert_eq!(v.labels().len(), DEFAULT_ARRAY_SIZE);
    }

    #[test]
    fn test_variable_errors() {
        assert_eq!(
            VariableSpec::from_json("x", &json!("Binary")),
            Err(ModelError::InvalidVariableDefinition("x".into()))
        );
        assert_eq!(
            VariableSpec::from_json("x", &json!({"size": 2})),
            Err(ModelError::InvalidVariableDefinition("x".into()))
        );
        assert_eq!(
            VariableSpec::from_json("x", &json!({"type": "Integer"})),
            Err(ModelError::UnsupportedVariableType("Integer".into()))
        );
        assert!(matches!(
            VariableSpec::from_json("q", &json!({"type": "Array", "size": -1})),
            Err(ModelError::InvalidArraySize { .. })
        ));
        assert!(matches!(
            VariableSpec::from_json("q", &json!({"type": "Array", "size": 2.5})),
            Err(ModelError::InvalidArraySize { .. })
        ));
    }

    #[test]
    fn test_constraint_defaults() {
        let c = ConstraintSpec::from_json(0, &json!({})).unwrap();
        assert_eq!(c, ConstraintSpec::default());
        assert_eq!(c.to_string(), "0 = 0");
    }

    #[test]
    fn test_constraint_errors() {
        assert!(matches!(
            ConstraintSpec::from_json(1, &json!({"lhs": "x", "comparison": "<"})),
            Err(ModelError::UnsupportedComparison { index: 1, .. })
        ));
        assert!(matches!(
            ConstraintSpec::from_json(0, &json!({"lhs": "x", "rhs": "1"})),
            Err(ModelError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            ConstraintSpec::from_json(0, &json!(["x", "=", 1])),
            Err(ModelError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_penalties() {
        let x = Polynomial::variable("x");

        // (x - 1)^2 = x - 2x + 1 = -x + 1
        let eq = Comparison::Equal.penalty(&x, 1.0).unwrap();
        assert_eq!(eq.coefficient(&["x"]), Some(-1.0));
        assert_eq!(eq.constant_term(), 1.0);

        let le = Comparison::LessEqual.penalty(&x, 1.0).unwrap();
        assert_eq!(le, eq);

        let ge = Comparison::GreaterEqual.penalty(&x, 1.0).unwrap();
        assert_eq!(ge.coefficient(&["x"]), Some(-1.0));

        let ne = Comparison::NotEqual.penalty(&x, 1.0).unwrap();
        assert_eq!(ne.coefficient(&["x"]), Some(-100.0));
        assert_eq!(ne.constant_term(), 100.0);
    }

    #[test]
    fn test_penalty_of_quadratic_lhs_is_bounded() {
        let ab = Polynomial::variable("a") * Polynomial::variable("b");
        // (ab - 1)^2 = ab - 2ab + 1 stays quadratic.
        let eq = Comparison::Equal.penalty(&ab, 1.0).unwrap();
        assert_eq!(eq.coefficient(&["a", "b"]), Some(-1.0));

        let abc = ab + Polynomial::variable("c");
        assert!(matches!(
            Comparison::Equal.penalty(&abc, 1.0),
            Err(qblock_expr::ExprError::DegreeTooHigh { degree: 3, .. })
        ));
    }
}
