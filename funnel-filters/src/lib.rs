//! Funnel filter builder state.
//!
//! A [`FiltersOrchestrator`] owns an ordered list of filter steps. Each step
//! picks an event type and one or more attribute conditions whose choices
//! cascade (event type, then property, then operator, then value shape).
//! The orchestrator snapshots complete conditions into an applied-filters
//! payload on demand. The event catalog comes from an [`EventSource`],
//! normally an [`EventCatalogSource`] reading through the shared response
//! cache.

pub mod attribute;
pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ids;
pub mod orchestrator;
pub mod step;
pub mod telemetry;
pub mod widgets;

pub use attribute::AttributeFilter;
pub use bootstrap::{bootstrap, build_orchestrator};
pub use catalog::{
    decode_events, CatalogState, EventCatalogSource, EventSource, DEFAULT_EVENTS_URL,
    EVENTS_CACHE_KEY, EVENTS_MAX_AGE,
};
pub use config::{
    CacheSettings, CatalogConfig, ConfigError, FiltersConfig, HttpConfig, LoggingConfig,
};
pub use error::{FiltersError, FiltersResult};
pub use ids::{IdAllocator, BASELINE_ID};
pub use orchestrator::{
    AppliedAttributeFilter, AppliedFilter, FilterStep, FiltersOrchestrator, NO_ACTIVE_FILTERS,
};
pub use step::{event_type_options, FilterStepValue, DEFAULT_STEP_NAME};
pub use telemetry::{init_tracing, TelemetryError};
pub use widgets::{EditableLabel, LabelKey, SelectState, FALLBACK_LABEL};
