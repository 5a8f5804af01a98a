//! Single-flip Metropolis simulated annealing.
//!
//! Each read starts from a uniformly random state and sweeps every variable
//! once per β step, with β following a geometric schedule from hot to cold.
//! Local fields are updated incrementally on every accepted flip, so a sweep
//! costs O(n + edges touched).

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bqm::BinaryQuadraticModel;
use crate::error::{AnnealError, AnnealResult};
use crate::sampler::{Sample, SampleSet, Sampler};

/// Default number of independent reads.
pub const DEFAULT_NUM_READS: usize = 10;

/// Default number of sweeps (β steps) per read.
pub const DEFAULT_NUM_SWEEPS: usize = 1000;

/// Annealing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnealParams {
    pub num_reads: usize,
    pub num_sweeps: usize,
    /// `(hot, cold)`; derived from the model when absent.
    pub beta_range: Option<(f64, f64)>,
    pub seed: Option<u64>,
}

impl Default for AnnealParams {
    fn default() -> Self {
        Self {
            num_reads: DEFAULT_NUM_READS,
            num_sweeps: DEFAULT_NUM_SWEEPS,
            beta_range: None,
            seed: None,
        }
    }
}

impl AnnealParams {
    pub fn validate(&self) -> AnnealResult<()> {
        if self.num_reads == 0 {
            return Err(AnnealError::InvalidReads(self.num_reads));
        }
        if self.num_sweeps == 0 {
            return Err(AnnealError::InvalidSweeps(self.num_sweeps));
        }
        if let Some((hot, cold)) = self.beta_range {
            let valid = hot.is_finite() && cold.is_finite() && hot > 0.0 && hot <= cold;
            if !valid {
                return Err(AnnealError::InvalidBetaRange { hot, cold });
            }
        }
        Ok(())
    }
}

/// Simulated-annealing sampler.
#[derive(Debug, Clone, Default)]
pub struct SimulatedAnnealingSampler {
    params: AnnealParams,
}

impl SimulatedAnnealingSampler {
    pub fn new(params: AnnealParams) -> Self {
        Self { params }
    }

    #[must_use]
    pub fn with_num_reads(mut self, num_reads: usize) -> Self {
        self.params.num_reads = num_reads;
        self
    }

    #[must_use]
    pub fn with_num_sweeps(mut self, num_sweeps: usize) -> Self {
        self.params.num_sweeps = num_sweeps;
        self
    }

    #[must_use]
    pub fn with_beta_range(mut self, hot: f64, cold: f64) -> Self {
        self.params.beta_range = Some((hot, cold));
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params.seed = Some(seed);
        self
    }

    pub fn params(&self) -> &AnnealParams {
        &self.params
    }
}

/// β values from `hot` to `cold`, geometrically spaced.
#[allow(clippy::cast_precision_loss)]
pub fn geometric_schedule(hot: f64, cold: f64, steps: usize) -> Vec<f64> {
    match steps {
        0 => Vec::new(),
        1 => vec![cold],
        _ => {
            let ratio = cold / hot;
            let last = (steps - 1) as f64;
            (0..steps)
                .map(|k| hot * ratio.powf(k as f64 / last))
                .collect()
        }
    }
}

impl Sampler for SimulatedAnnealingSampler {
    fn name(&self) -> &str {
        "simulated_annealing"
    }

    fn sample(&self, bqm: &BinaryQuadraticModel) -> AnnealResult<SampleSet> {
        self.params.validate()?;
        bqm.check_finite()?;

        let (hot, cold) = self
            .params
            .beta_range
            .unwrap_or_else(|| bqm.default_beta_range());
        let schedule = geometric_schedule(hot, cold, self.params.num_sweeps);
        let adjacency = bqm.adjacency();

        let mut rng = match self.params.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        debug!(
            variables = bqm.num_variables(),
            reads = self.params.num_reads,
            sweeps = self.params.num_sweeps,
            hot,
            cold,
            "Annealing"
        );

        let samples = (0..self.params.num_reads)
            .map(|_| {
                let state = anneal_once(bqm.linear_biases(), &adjacency, &schedule, &mut rng);
                Sample::from_state(bqm, &state)
            })
            .collect();

        Ok(SampleSet::new(samples))
    }
}

fn anneal_once<R: Rng>(
    linear: &[f64],
    adjacency: &[Vec<(usize, f64)>],
    schedule: &[f64],
    rng: &mut R,
) -> Vec<bool> {
    let n = linear.len();
    let mut state: Vec<bool> = (0..n).map(|_| rng.gen_bool(0.5)).collect();

    // field[i] = hᵢ + Σⱼ Jᵢⱼ xⱼ; flipping i changes the energy by ±field[i]
    let mut field: Vec<f64> = (0..n)
        .map(|i| {
            linear[i]
                + adjacency[i]
                    .iter()
                    .filter(|(j, _)| state[*j])
                    .map(|(_, b)| b)
                    .sum::<f64>()
        })
        .collect();

    for &beta in schedule {
        for i in 0..n {
            let delta = if state[i] { -field[i] } else { field[i] };
            if delta <= 0.0 || rng.gen_range(0.0..1.0) < (-beta * delta).exp() {
                state[i] = !state[i];
                let sign = if state[i] { 1.0 } else { -1.0 };
                for &(j, bias) in &adjacency[i] {
                    field[j] += sign * bias;
                }
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule() {
        let s = geometric_schedule(0.1, 10.0, 3);
        assert_eq!(s.len(), 3);
        assert!((s[0] - 0.1).abs() < 1e-12);
        assert!((s[1] - 1.0).abs() < 1e-12);
        assert!((s[2] - 10.0).abs() < 1e-12);
        assert_eq!(geometric_schedule(0.1, 10.0, 1), vec![10.0]);
    }

    #[test]
    fn test_param_validation() {
        let bqm = BinaryQuadraticModel::from_qubo([("a", "a", 1.0)], 0.0);

        let err = SimulatedAnnealingSampler::default()
            .with_num_reads(0)
            .sample(&bqm)
            .unwrap_err();
        assert_eq!(err, AnnealError::InvalidReads(0));

        let err = SimulatedAnnealingSampler::default()
            .with_num_sweeps(0)
            .sample(&bqm)
            .unwrap_err();
        assert_eq!(err, AnnealError::InvalidSweeps(0));

        let err = SimulatedAnnealingSampler::default()
            .with_beta_range(2.0, 1.0)
            .sample(&bqm)
            .unwrap_err();
        assert!(matches!(err, AnnealError::InvalidBetaRange { .. }));
    }

    #[test]
    fn test_reads_count() {
        let bqm = BinaryQuadraticModel::from_qubo([("a", "a", 1.0)], 0.0);
        let set = SimulatedAnnealingSampler::default()
            .with_num_reads(4)
            .with_num_sweeps(10)
            .with_seed(1)
            .sample(&bqm)
            .unwrap();
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_huge_biases_give_a_usable_schedule() {
        let bqm = BinaryQuadraticModel::from_qubo(
            [("a", "a", 1e308), ("b", "b", 1e308), ("a", "b", 1e308)],
            0.0,
        );
        let set = SimulatedAnnealingSampler::default()
            .with_num_reads(3)
            .with_num_sweeps(20)
            .with_seed(5)
            .sample(&bqm)
            .unwrap();

        let best = set.first().unwrap();
        assert_eq!(best.energy, 0.0);
        assert!(best.selected().is_empty());
    }
}
