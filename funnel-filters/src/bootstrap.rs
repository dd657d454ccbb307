//! Process startup: config, tracing and the orchestrator wired together.

use std::sync::Arc;

use funnel_http::HttpResponseCache;

use crate::catalog::EventCatalogSource;
use crate::config::FiltersConfig;
use crate::error::FiltersResult;
use crate::orchestrator::FiltersOrchestrator;
use crate::telemetry::init_tracing;

/// Load the config named by `FUNNEL_CONFIG`, install tracing and build an
/// orchestrator reading the catalog through `cache`.
///
/// The catalog is not fetched; call [`FiltersOrchestrator::load_events`].
pub fn bootstrap(cache: Arc<HttpResponseCache>) -> FiltersResult<FiltersOrchestrator> {
    let config = FiltersConfig::load()?;
    init_tracing(&config.logging)?;
    build_orchestrator(&config, cache)
}

/// Orchestrator backed by a real HTTP client, configured from `config`.
pub fn build_orchestrator(
    config: &FiltersConfig,
    cache: Arc<HttpResponseCache>,
) -> FiltersResult<FiltersOrchestrator> {
    let source = EventCatalogSource::from_config(config, cache)?;
    tracing::info!(
        url = %source.url(),
        key = %source.cache_key(),
        "Event catalog source configured"
    );
    Ok(FiltersOrchestrator::new(Arc::new(source)))
}
