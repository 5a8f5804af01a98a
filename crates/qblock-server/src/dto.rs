//! Data transfer objects for API requests and responses.

use std::collections::BTreeMap;

use qblock_model::QuboResponse;
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status (always "ok" if responding).
    pub status: String,
    /// Server version.
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Optional `sampler` section of a `/solve` request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerOverrides {
    #[serde(default)]
    pub num_reads: Option<usize>,
    #[serde(default)]
    pub num_sweeps: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// `/solve` response: the QUBO response plus the best sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    #[serde(flatten)]
    pub result: QuboResponse,
    /// Best assignment found, label → 0/1.
    pub sample: BTreeMap<String, u8>,
    /// Energy of `sample`, offset included.
    pub energy: f64,
    /// Labels set to 1, ascending.
    pub selected: Vec<String>,
}
