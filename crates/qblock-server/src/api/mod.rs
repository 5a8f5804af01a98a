//! API endpoint handlers.

pub mod health;
pub mod quantum;
pub mod solve;

use qblock_model::{Diagnostic, ModelLimits, Outcome, Stage, respond};
use serde_json::Value;
use tracing::debug;

/// Decode a raw body as JSON. Empty or malformed bodies become `None` plus a
/// note explaining why.
pub(crate) fn read_body(body: &[u8]) -> (Option<Value>, Option<Diagnostic>) {
    if body.iter().all(u8::is_ascii_whitespace) {
        return (
            None,
            Some(Diagnostic::new(Stage::Request, "Request body is empty")),
        );
    }
    match serde_json::from_slice(body) {
        Ok(value) => (Some(value), None),
        Err(e) => {
            debug!(error = %e, "Request body is not valid JSON");
            (
                None,
                Some(Diagnostic::new(
                    Stage::Request,
                    format!("Request body is not valid JSON: {e}"),
                )),
            )
        }
    }
}

/// Compile a decoded request, putting any body diagnostic first.
pub(crate) fn compile_request(
    request: Option<&Value>,
    note: Option<Diagnostic>,
    limits: &ModelLimits,
) -> Outcome {
    let mut outcome = respond(request, limits);
    if let Some(note) = note {
        outcome.explanation.diagnostics.insert(0, note);
    }
    outcome
}
