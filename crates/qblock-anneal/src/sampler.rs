//! Sampler seam and sample containers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bqm::BinaryQuadraticModel;
use crate::error::AnnealResult;

/// Anything that can draw low-energy samples from a model.
pub trait Sampler: Send + Sync {
    /// Human-readable sampler name.
    fn name(&self) -> &str;

    /// Sample `bqm`, returning results ordered by ascending energy.
    fn sample(&self, bqm: &BinaryQuadraticModel) -> AnnealResult<SampleSet>;
}

/// One assignment and its energy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub assignment: BTreeMap<String, u8>,
    pub energy: f64,
}

impl Sample {
    /// Build from a state vector in the model's label order.
    pub fn from_state(bqm: &BinaryQuadraticModel, state: &[bool]) -> Self {
        let assignment = bqm
            .labels()
            .iter()
            .zip(state)
            .map(|(label, x)| (label.clone(), u8::from(*x)))
            .collect();
        Self {
            assignment,
            energy: bqm.energy(state),
        }
    }

    /// Labels set to 1, ascending.
    pub fn selected(&self) -> Vec<&str> {
        self.assignment
            .iter()
            .filter(|(_, v)| **v == 1)
            .map(|(label, _)| label.as_str())
            .collect()
    }
}

/// Samples sorted by ascending energy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleSet {
    samples: Vec<Sample>,
}

impl SampleSet {
    pub fn new(mut samples: Vec<Sample>) -> Self {
        samples.sort_by(|a, b| a.energy.total_cmp(&b.energy));
        Self { samples }
    }

    /// Lowest-energy sample.
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl IntoIterator for SampleSet {
    type Item = Sample;
    type IntoIter = std::vec::IntoIter<Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_set_is_sorted() {
        let bqm = BinaryQuadraticModel::from_qubo([("a", "a", -1.0), ("b", "b", 2.0)], 0.0);
        let set = SampleSet::new(vec![
            Sample::from_state(&bqm, &[false, true]),
            Sample::from_state(&bqm, &[true, false]),
            Sample::from_state(&bqm, &[false, false]),
        ]);

        let energies: Vec<f64> = set.iter().map(|s| s.energy).collect();
        assert_eq!(energies, vec![-1.0, 0.0, 2.0]);

        let best = set.first().unwrap();
        assert_eq!(best.selected(), vec!["a"]);
        assert_eq!(best.assignment["b"], 0);
    }
}
