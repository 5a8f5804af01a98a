//! Binary quadratic model over labelled 0/1 variables.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::{AnnealError, AnnealResult};

/// `E(x) = offset + Σ hᵢ xᵢ + Σ_{i<j} Jᵢⱼ xᵢ xⱼ` with `xᵢ ∈ {0, 1}`.
///
/// Variables are indexed by their position in the sorted label list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BinaryQuadraticModel {
    labels: Vec<String>,
    linear: Vec<f64>,
    /// Keyed by `(i, j)` with `i < j`.
    quadratic: BTreeMap<(usize, usize), f64>,
    offset: f64,
}

impl BinaryQuadraticModel {
    /// Build from QUBO entries. Diagonal entries become linear biases and
    /// off-diagonal entries quadratic biases; repeated pairs accumulate.
    pub fn from_qubo<I, S>(terms: I, offset: f64) -> Self
    where
        I: IntoIterator<Item = (S, S, f64)>,
        S: AsRef<str>,
    {
        let terms: Vec<(S, S, f64)> = terms.into_iter().collect();

        let mut labels: Vec<String> = terms
            .iter()
            .flat_map(|(a, b, _)| [a.as_ref().to_string(), b.as_ref().to_string()])
            .collect();
        labels.sort_unstable();
        labels.dedup();

        let index: FxHashMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut linear = vec![0.0; labels.len()];
        let mut quadratic = BTreeMap::new();
        for (a, b, bias) in &terms {
            let i = index[a.as_ref()];
            let j = index[b.as_ref()];
            if i == j {
                linear[i] += bias;
            } else {
                *quadratic.entry((i.min(j), i.max(j))).or_insert(0.0) += bias;
            }
        }

        Self {
            labels,
            linear,
            quadratic,
            offset,
        }
    }

    pub fn num_variables(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Linear bias of a label.
    pub fn linear(&self, label: &str) -> Option<f64> {
        let i = self.index_of(label)?;
        Some(self.linear[i])
    }

    /// Quadratic bias between two labels, in either order.
    pub fn quadratic(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.quadratic.get(&(i.min(j), i.max(j))).copied()
    }

    fn index_of(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
    }

    /// Energy of a state given in label order.
    ///
    /// # Panics
    ///
    /// Panics if `state.len()` differs from [`num_variables`](Self::num_variables).
    pub fn energy(&self, state: &[bool]) -> f64 {
        assert_eq!(state.len(), self.labels.len(), "state length mismatch");
        let linear: f64 = self
            .linear
            .iter()
            .zip(state)
            .filter(|(_, x)| **x)
            .map(|(h, _)| h)
            .sum();
        let quadratic: f64 = self
            .quadratic
            .iter()
            .filter(|((i, j), _)| state[*i] && state[*j])
            .map(|(_, j)| j)
            .sum();
        self.offset + linear + quadratic
    }

    /// Per-variable neighbour lists `(j, Jᵢⱼ)`, symmetric.
    pub(crate) fn adjacency(&self) -> Vec<Vec<(usize, f64)>> {
        let mut adjacency = vec![Vec::new(); self.labels.len()];
        for (&(i, j), &bias) in &self.quadratic {
            adjacency[i].push((j, bias));
            adjacency[j].push((i, bias));
        }
        adjacency
    }

    pub(crate) fn linear_biases(&self) -> &[f64] {
        &self.linear
    }

    /// Reject NaN or infinite biases.
    pub fn check_finite(&self) -> AnnealResult<()> {
        if !self.offset.is_finite() {
            return Err(AnnealError::NonFiniteBias("offset".to_string()));
        }
        for (label, h) in self.labels.iter().zip(&self.linear) {
            if !h.is_finite() {
                return Err(AnnealError::NonFiniteBias(label.clone()));
            }
        }
        for (&(i, j), bias) in &self.quadratic {
            if !bias.is_finite() {
                return Err(AnnealError::NonFiniteBias(format!(
                    "({}, {})",
                    self.labels[i], self.labels[j]
                )));
            }
        }
        Ok(())
    }

    /// Default `(hot, cold)` inverse temperatures.
    ///
    /// Hot: a flip against the largest possible field is accepted with
    /// probability 1/2. Cold: a flip against the smallest non-zero bias is
    /// accepted with probability 1/100.
    pub fn default_beta_range(&self) -> (f64, f64) {
        let mut max_field: f64 = 0.0;
        for (i, neighbours) in self.adjacency().iter().enumerate() {
            let field = self.linear[i].abs() + neighbours.iter().map(|(_, b)| b.abs()).sum::<f64>();
            max_field = max_field.max(field);
        }

        let min_bias = self
            .linear
            .iter()
            .chain(self.quadratic.values())
            .map(|b| b.abs())
            .filter(|b| *b > 0.0)
            .fold(f64::INFINITY, f64::min);

        if max_field == 0.0 || !min_bias.is_finite() {
            return (0.1, 1.0);
        }
        let hot = 2f64.ln() / max_field;
        let cold = 100f64.ln() / min_bias;
        // Fields near f64::MAX overflow, and tiny biases overflow `cold`.
        if !(hot.is_finite() && cold.is_finite() && hot > 0.0) {
            return (0.1, 1.0);
        }
        (hot, cold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_model() -> BinaryQuadraticModel {
        BinaryQuadraticModel::from_qubo(
            [
                ("x0", "x0", -1.0),
                ("x1", "x1", -2.0),
                ("x1", "x0", 3.0),
                ("x0", "x1", 1.0),
            ],
            0.5,
        )
    }

    #[test]
    fn test_from_qubo() {
        let bqm = pair_model();
        assert_eq!(bqm.labels(), ["x0", "x1"]);
        assert_eq!(bqm.linear("x0"), Some(-1.0));
        assert_eq!(bqm.linear("x1"), Some(-2.0));
        assert_eq!(bqm.quadratic("x1", "x0"), Some(4.0));
        assert_eq!(bqm.linear("x9"), None);
    }

    #[test]
    fn test_energy() {
        let bqm = pair_model();
        assert_eq!(bqm.energy(&[false, false]), 0.5);
        assert_eq!(bqm.energy(&[true, false]), -0.5);
        assert_eq!(bqm.energy(&[false, true]), -1.5);
        assert_eq!(bqm.energy(&[true, true]), 1.5);
    }

    #[test]
    fn test_default_beta_range() {
        let (hot, cold) = pair_model().default_beta_range();
        // max field = |−2| + |4| = 6, min bias = 1
        assert!((hot - 2f64.ln() / 6.0).abs() < 1e-12);
        assert!((cold - 100f64.ln()).abs() < 1e-12);

        let empty = BinaryQuadraticModel::from_qubo([("a", "a", 0.0)], 0.0);
        assert_eq!(empty.default_beta_range(), (0.1, 1.0));
    }

    #[test]
    fn test_default_beta_range_with_overflowing_field() {
        let huge = BinaryQuadraticModel::from_qubo(
            [("a", "a", 1e308), ("b", "b", 1e308), ("a", "b", 1e308)],
            0.0,
        );
        assert!(huge.check_finite().is_ok());
        assert_eq!(huge.default_beta_range(), (0.1, 1.0));

        let tiny = BinaryQuadraticModel::from_qubo([("a", "a", 5e-324), ("b", "b", 1.0)], 0.0);
        let (hot, cold) = tiny.default_beta_range();
        assert!(hot.is_finite() && cold.is_finite());
    }

    #[test]
    fn test_check_finite() {
        let bqm = BinaryQuadraticModel::from_qubo([("a", "b", f64::NAN)], 0.0);
        assert!(matches!(bqm.check_finite(), Err(AnnealError::NonFiniteBias(_))));
        assert!(pair_model().check_finite().is_ok());
    }
}
