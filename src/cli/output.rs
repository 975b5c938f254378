//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::CaptureError;

/// Map domain errors to a string for CLI output, with a hint where one helps.
pub fn map_error(e: &CaptureError) -> String {
    match e {
        CaptureError::UpstreamUnavailable(_) | CaptureError::UpstreamStatus { .. } => format!(
            "{}\nCheck network access and `plugin.endpoint` in the configuration.",
            e
        ),
        CaptureError::ConfigError(_) => format!(
            "{}\nSee config/config.toml in the workspace or pass --config.",
            e
        ),
        _ => e.to_string(),
    }
}
