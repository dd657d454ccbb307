//! Convenience verbs over a [`CacheGateway`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::TransportError;
use crate::gateway::{CacheGateway, RequestContext};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method};

/// Thin client issuing JSON requests through a gateway.
pub struct EndpointClient<T: HttpTransport + ?Sized> {
    gateway: CacheGateway<T>,
}

impl<T: HttpTransport + ?Sized + 'static> EndpointClient<T> {
    pub fn new(gateway: CacheGateway<T>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &CacheGateway<T> {
        &self.gateway
    }

    /// Send a prepared request (query parameters, headers, body) through the
    /// gateway. Only reads honour `context`'s cache settings.
    pub async fn send(
        &self,
        request: HttpRequest,
        context: &RequestContext,
    ) -> Result<HttpResponse, TransportError> {
        self.gateway.send(request, context).await
    }

    /// Send a prepared request and decode the body into `R`.
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
        context: &RequestContext,
    ) -> Result<R, TransportError> {
        let response = self.send(request, context).await?;
        Ok(serde_json::from_value(response.body)?)
    }

    pub async fn get(
        &self,
        url: &str,
        context: &RequestContext,
    ) -> Result<HttpResponse, TransportError> {
        self.send(HttpRequest::get(url)?, context).await
    }

    /// GET and decode the body into `R`.
    pub async fn get_json<R: DeserializeOwned>(
        &self,
        url: &str,
        context: &RequestContext,
    ) -> Result<R, TransportError> {
        self.send_json(HttpRequest::get(url)?, context).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        self.send_with_body(Method::Post, url, body).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        self.send_with_body(Method::Put, url, body).await
    }

    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        self.send_with_body(Method::Patch, url, body).await
    }

    pub async fn delete(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let request = HttpRequest::new(Method::Delete, url)?;
        self.gateway.send(request, &RequestContext::uncached()).await
    }

    async fn send_with_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, TransportError> {
        let request = HttpRequest::new(method, url)?.with_body(serde_json::to_value(body)?);
        self.gateway.send(request, &RequestContext::uncached()).await
    }
}

impl<T: HttpTransport + ?Sized> Clone for EndpointClient<T> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}
