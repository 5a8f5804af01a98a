//! HTTP front end for the qblock QUBO compiler.
//!
//! Routes:
//!
//! - `POST /quantum` compiles a model description into a QUBO. Any failure
//!   yields the fallback board QUBO with status 200 and an explanation.
//! - `POST /solve` does the same, then anneals the QUBO and returns the best
//!   sample alongside it.
//! - `GET /api/health` reports liveness and version.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use qblock_server::{AppState, Config, create_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let addr = config.socket_addr()?;
//!     let app = create_router(Arc::new(AppState::with_config(config)));
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod dto;
pub mod error;
pub mod server;
pub mod state;
pub mod tracing_config;

pub use config::{Config, ConfigError};
pub use dto::{HealthResponse, SamplerOverrides, SolveResponse};
pub use error::ApiError;
pub use server::create_router;
pub use state::AppState;
pub use tracing_config::{TracingConfig, TracingFormat, init_tracing};
