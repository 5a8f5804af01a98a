//! Compiled QUBO: coefficients on unordered label pairs plus an offset.

use std::collections::BTreeMap;

/// Quadratic unconstrained binary optimization problem.
///
/// Pairs are stored with their labels in ascending order; a diagonal entry is
/// keyed by the label repeated.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Qubo {
    terms: BTreeMap<(String, String), f64>,
    offset: f64,
}

impl Qubo {
    /// Create an empty QUBO with the given offset.
    pub fn new(offset: f64) -> Self {
        Self {
            terms: BTreeMap::new(),
            offset,
        }
    }

    /// Add `coeff` to the entry for `(a, b)`, in either order.
    pub fn add(&mut self, a: &str, b: &str, coeff: f64) {
        *self.terms.entry(ordered_pair(a, b)).or_insert(0.0) += coeff;
    }

    /// Coefficient for `(a, b)`, in either order.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        self.terms.get(&ordered_pair(a, b)).copied()
    }

    /// Iterate `(a, b, coefficient)` with `a <= b`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> {
        self.terms
            .iter()
            .map(|((a, b), c)| (a.as_str(), b.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Distinct labels appearing in any entry, sorted.
    pub fn labels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = self
            .terms
            .keys()
            .flat_map(|(a, b)| [a.as_str(), b.as_str()])
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Diagonal entries as `(label, coefficient)`.
    pub fn diagonal(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter(|(a, b, _)| a == b).map(|(a, _, c)| (a, c))
    }

    /// Entries keyed the way clients expect them: `"('a', 'b')"`.
    pub fn keyed_terms(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(a, b, c)| (pair_key(a, b), c)).collect()
    }
}

/// Render a pair as a tuple-style key string.
pub fn pair_key(a: &str, b: &str) -> String {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    format!("('{a}', '{b}')")
}

fn ordered_pair(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairs_are_unordered() {
        let mut q = Qubo::new(0.5);
        q.add("x1", "x0", -2.0);
        q.add("x0", "x1", 1.0);
        q.add("x0", "x0", 3.0);

        assert_eq!(q.len(), 2);
        assert_eq!(q.get("x0", "x1"), Some(-1.0));
        assert_eq!(q.get("x1", "x0"), Some(-1.0));
        assert_eq!(q.labels(), vec!["x0", "x1"]);
        assert_eq!(q.diagonal().collect::<Vec<_>>(), vec![("x0", 3.0)]);
        assert_eq!(q.offset(), 0.5);
    }

    #[test]
    fn test_keyed_terms() {
        let mut q = Qubo::new(0.0);
        q.add("b", "a", 1.5);
        q.add("q[1]", "q[1]", -1.0);

        let keyed = q.keyed_terms();
        assert_eq!(keyed.get("('a', 'b')"), Some(&1.5));
        assert_eq!(keyed.get("('q[1]', 'q[1]')"), Some(&-1.0));
        assert_eq!(pair_key("x1", "x0"), "('x0', 'x1')");
    }
}
