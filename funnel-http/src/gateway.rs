//! Per-request cache policy in front of an [`HttpTransport`].
//!
//! Only reads participate, and only when the caller opts in through
//! [`RequestContext::with_cache`]. Everything else goes straight to the
//! transport.

use std::sync::Arc;

use crate::cache::{CacheConfig, ResponseCache, SharedResult};
use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Namespace for keys derived from request URLs.
pub const CACHE_KEY_PREFIX: &str = "http-cache:";

/// The cache instance shared by every gateway in a process.
pub type HttpResponseCache = ResponseCache<HttpResponse, TransportError>;

/// Cache settings attached to a single request. Caching is off by default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub cache_enabled: bool,
    pub cache_config: CacheConfig,
    pub cache_key: Option<String>,
}

impl RequestContext {
    /// A context that does not touch the cache.
    pub fn uncached() -> Self {
        Self::default()
    }

    /// A context that opts into caching, with optional config and key override.
    pub fn with_cache(config: Option<CacheConfig>, key: Option<String>) -> Self {
        Self {
            cache_enabled: true,
            cache_config: config.unwrap_or_default(),
            cache_key: key.filter(|k| !k.is_empty()),
        }
    }
}

/// Cache key for a request: the full URL with query parameters, namespaced.
pub fn cache_key_for(request: &HttpRequest) -> String {
    format!("{}{}", CACHE_KEY_PREFIX, request.url_with_params())
}

/// Routes requests through the shared [`HttpResponseCache`] when allowed.
pub struct CacheGateway<T: HttpTransport + ?Sized> {
    cache: Arc<HttpResponseCache>,
    transport: Arc<T>,
}

impl<T: HttpTransport + ?Sized + 'static> CacheGateway<T> {
    pub fn new(cache: Arc<HttpResponseCache>, transport: Arc<T>) -> Self {
        Self { cache, transport }
    }

    pub fn cache(&self) -> &Arc<HttpResponseCache> {
        &self.cache
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Send `request`, consulting and populating the cache when `context`
    /// enables it and the request is a read.
    pub fn send(
        &self,
        request: HttpRequest,
        context: &RequestContext,
    ) -> SharedResult<HttpResponse, TransportError> {
        if !request.method.is_read() || !context.cache_enabled {
            return SharedResult::new(self.dispatch(request));
        }

        let key = context
            .cache_key
            .clone()
            .unwrap_or_else(|| cache_key_for(&request));
        self.cache
            .get(&key, || self.dispatch(request), &context.cache_config)
    }

    fn dispatch(
        &self,
        request: HttpRequest,
    ) -> impl std::future::Future<Output = Result<HttpResponse, TransportError>> + Send + 'static
    {
        let transport = Arc::clone(&self.transport);
        async move { transport.send(&request).await }
    }
}

impl<T: HttpTransport + ?Sized> Clone for CacheGateway<T> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            transport: Arc::clone(&self.transport),
        }
    }
}
