//! Event catalog source.
//!
//! Fetches the `{ events: [...] }` document through the response cache under
//! a fixed key with a five minute max age. A malformed payload yields an
//! empty catalog; transport failures propagate to the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use funnel_core::{EventType, EventsResponse};
use funnel_http::{
    CacheConfig, CacheGateway, EndpointClient, HttpResponseCache, HttpTransport, RequestContext,
    ReqwestTransport, TransportError,
};
use serde::{Deserialize, Serialize};

use crate::config::FiltersConfig;

/// Cache key the catalog is stored under.
pub const EVENTS_CACHE_KEY: &str = "customer-events";

/// How long a fetched catalog is served from cache.
pub const EVENTS_MAX_AGE: Duration = Duration::from_secs(5 * 60);

pub const DEFAULT_EVENTS_URL: &str =
    "https://br-fe-assignment.github.io/customer-events/events.json";

/// Anything that can produce the event catalog.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Catalog, served from cache while fresh.
    async fn events(&self) -> Result<Vec<EventType>, TransportError>;

    /// Forget any cached catalog so the next read fetches again.
    fn clear_cache(&self);

    /// Drop the cached catalog and fetch it again.
    async fn refresh_events(&self) -> Result<Vec<EventType>, TransportError> {
        self.clear_cache();
        self.events().await
    }
}

/// Loading state of the catalog as seen by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogState {
    pub event_types: Vec<EventType>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// [`EventSource`] reading a remote JSON document through a [`CacheGateway`].
pub struct EventCatalogSource<T: HttpTransport + ?Sized> {
    client: EndpointClient<T>,
    url: String,
    cache_key: String,
    cache_config: CacheConfig,
}

impl<T: HttpTransport + ?Sized + 'static> EventCatalogSource<T> {
    pub fn new(gateway: CacheGateway<T>, url: impl Into<String>) -> Self {
        Self {
            client: EndpointClient::new(gateway),
            url: url.into(),
            cache_key: EVENTS_CACHE_KEY.to_string(),
            cache_config: CacheConfig::new().with_max_age(EVENTS_MAX_AGE),
        }
    }

    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = key.into();
        self
    }

    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    fn cache(&self) -> &Arc<HttpResponseCache> {
        self.client.gateway().cache()
    }

    pub fn is_cached(&self) -> bool {
        self.cache().has(&self.cache_key)
    }

    async fn fetch(&self) -> Result<Vec<EventType>, TransportError> {
        let context =
            RequestContext::with_cache(Some(self.cache_config), Some(self.cache_key.clone()));
        let response = self.client.get(&self.url, &context).await?;
        Ok(decode_events(response.body))
    }
}

impl EventCatalogSource<ReqwestTransport> {
    /// Source backed by a real HTTP client, configured from `config`.
    pub fn from_config(
        config: &FiltersConfig,
        cache: Arc<HttpResponseCache>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        Ok(Self::new(CacheGateway::new(cache, transport), config.catalog.url.clone())
            .with_cache_key(config.catalog.cache_key.clone())
            .with_cache_config(config.catalog_cache_config()))
    }
}

#[async_trait]
impl<T: HttpTransport + ?Sized + 'static> EventSource for EventCatalogSource<T> {
    async fn events(&self) -> Result<Vec<EventType>, TransportError> {
        self.fetch().await
    }

    fn clear_cache(&self) {
        if self.cache().invalidate(&self.cache_key) {
            tracing::debug!(key = %self.cache_key, "Event catalog cache cleared");
        }
    }
}

/// Decode a catalog document, treating anything malformed as empty.
pub fn decode_events(body: serde_json::Value) -> Vec<EventType> {
    match serde_json::from_value::<EventsResponse>(body) {
        Ok(response) => response.events,
        Err(err) => {
            tracing::warn!(error = %err, "Malformed event catalog, using empty list");
            Vec::new()
        }
    }
}
