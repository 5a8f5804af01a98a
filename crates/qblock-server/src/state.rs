//! Application state for the HTTP server.

use qblock_anneal::AnnealParams;
use qblock_model::ModelLimits;

use crate::config::Config;

/// Shared, read-only application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Full server configuration.
    pub config: Config,
    /// Limits handed to the model builder on every request.
    pub limits: ModelLimits,
    /// Default annealing parameters for `/solve`.
    pub anneal: AnnealParams,
}

impl AppState {
    /// Create application state with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create application state with custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            limits: config.model_limits(),
            anneal: config.anneal_params(),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
