//! Compile-and-anneal endpoint.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use qblock_anneal::{
    AnnealParams, BinaryQuadraticModel, SampleSet, Sampler, SimulatedAnnealingSampler,
};
use qblock_model::{
    Diagnostic, FailureCause, ModelFailure, ModelLimits, Qubo, Stage, fallback_outcome,
};
use serde_json::Value;
use tracing::{info, warn};

use super::{compile_request, read_body};
use crate::config::SamplerConfig;
use crate::dto::{SamplerOverrides, SolveResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /solve - Compile a model and return the best annealed sample.
///
/// If annealing the user's QUBO fails, the fallback QUBO is annealed
/// instead; only a failure on the fallback itself is an error.
pub async fn solve(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SolveResponse>, ApiError> {
    let response = tokio::task::spawn_blocking(move || {
        let (request, note) = read_body(&body);
        let mut notes = Vec::new();
        let params = resolve_params(
            &state.anneal,
            &state.config.sampler,
            request.as_ref(),
            &mut notes,
        );
        let sampler = SimulatedAnnealingSampler::new(params);
        solve_request(request.as_ref(), note, notes, &state.limits, &sampler)
    })
    .await??;

    Ok(Json(response))
}

/// Apply a request's `sampler` section to the configured defaults.
///
/// Overrides that are malformed, zero or above the configured ceiling are
/// ignored with a diagnostic.
pub fn resolve_params(
    defaults: &AnnealParams,
    limits: &SamplerConfig,
    request: Option<&Value>,
    notes: &mut Vec<Diagnostic>,
) -> AnnealParams {
    let mut params = *defaults;
    let Some(raw) = request.and_then(|r| r.get("sampler")) else {
        return params;
    };

    let overrides: SamplerOverrides = match serde_json::from_value(raw.clone()) {
        Ok(overrides) => overrides,
        Err(e) => {
            notes.push(Diagnostic::new(
                Stage::Sampler,
                format!("Ignoring malformed sampler settings: {e}"),
            ));
            return params;
        }
    };

    match overrides.num_reads {
        Some(n) if (1..=limits.max_num_reads).contains(&n) => params.num_reads = n,
        Some(n) => notes.push(Diagnostic::new(
            Stage::Sampler,
            format!("Ignoring num_reads={n}; allowed range is 1..={}", limits.max_num_reads),
        )),
        None => {}
    }
    match overrides.num_sweeps {
        Some(n) if (1..=limits.max_num_sweeps).contains(&n) => params.num_sweeps = n,
        Some(n) => notes.push(Diagnostic::new(
            Stage::Sampler,
            format!("Ignoring num_sweeps={n}; allowed range is 1..={}", limits.max_num_sweeps),
        )),
        None => {}
    }
    if let Some(seed) = overrides.seed {
        params.seed = Some(seed);
    }

    params
}

/// Compile, anneal and pick the best sample.
pub fn solve_request(
    request: Option<&Value>,
    note: Option<Diagnostic>,
    notes: Vec<Diagnostic>,
    limits: &ModelLimits,
    sampler: &dyn Sampler,
) -> Result<SolveResponse, ApiError> {
    let mut outcome = compile_request(request, note, limits);
    outcome.explanation.diagnostics.extend(notes);

    let samples = match anneal(sampler, &outcome.qubo) {
        Ok(samples) => samples,
        Err(e) if !outcome.is_fallback() => {
            warn!(error = %e, sampler = sampler.name(), "Annealing the user QUBO failed");
            let reason = format!("Sampler failed: {e}");
            let mut diagnostics = outcome.explanation.diagnostics.clone();
            diagnostics.push(Diagnostic::new(Stage::Sampler, reason.clone()));
            let failure =
                ModelFailure::new(FailureCause::Unexpected, reason).with_diagnostics(diagnostics);
            outcome = fallback_outcome(&failure, request, limits);
            anneal(sampler, &outcome.qubo)?
        }
        Err(e) => return Err(e),
    };

    let best = samples
        .first()
        .ok_or_else(|| ApiError::Sampler("Sampler returned no samples".to_string()))?;
    let selected = best.selected().into_iter().map(str::to_string).collect();

    info!(
        sampler = sampler.name(),
        reads = samples.len(),
        energy = best.energy,
        fallback = outcome.is_fallback(),
        "Annealed QUBO"
    );

    Ok(SolveResponse {
        result: outcome.to_response(),
        sample: best.assignment.clone(),
        energy: best.energy,
        selected,
    })
}

fn anneal(sampler: &dyn Sampler, qubo: &Qubo) -> Result<SampleSet, ApiError> {
    let bqm = BinaryQuadraticModel::from_qubo(qubo.iter(), qubo.offset());
    Ok(sampler.sample(&bqm)?)
}
