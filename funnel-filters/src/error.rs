//! Top-level error for the filter builder.

use funnel_http::TransportError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub enum FiltersError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

pub type FiltersResult<T> = Result<T, FiltersError>;
