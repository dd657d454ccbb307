//! Funnel HTTP - transport seam, response cache and cache gateway.
//!
//! Reads flow through [`CacheGateway`], which decides per request whether the
//! [`ResponseCache`] participates. Cached reads are handed out as
//! [`SharedResult`]s so concurrent callers asking for the same key share one
//! underlying request.

pub mod cache;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod transport;

pub use cache::{
    CacheConfig, CacheStats, Clock, ManualClock, ResponseCache, SharedResult, SystemClock,
};
pub use endpoint::EndpointClient;
pub use error::TransportError;
pub use gateway::{cache_key_for, CacheGateway, HttpResponseCache, RequestContext, CACHE_KEY_PREFIX};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
