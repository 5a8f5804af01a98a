//! Simulated-annealing sampler for binary quadratic models.
//!
//! ```rust
//! use qblock_anneal::{BinaryQuadraticModel, Sampler, SimulatedAnnealingSampler};
//!
//! // Minimised by choosing exactly one of a, b.
//! let bqm = BinaryQuadraticModel::from_qubo(
//!     [("a", "a", -1.0), ("b", "b", -1.0), ("a", "b", 2.0)],
//!     1.0,
//! );
//! let samples = SimulatedAnnealingSampler::default()
//!     .with_seed(7)
//!     .sample(&bqm)
//!     .unwrap();
//! assert_eq!(samples.first().unwrap().energy, 0.0);
//! ```

mod bqm;
mod error;
mod sampler;
mod simulated;

pub use bqm::BinaryQuadraticModel;
pub use error::{AnnealError, AnnealResult};
pub use sampler::{Sample, SampleSet, Sampler};
pub use simulated::{
    AnnealParams, DEFAULT_NUM_READS, DEFAULT_NUM_SWEEPS, SimulatedAnnealingSampler,
    geometric_schedule,
};
