//! Funnel Test Utilities
//!
//! Shared test infrastructure for the funnel workspace:
//! - A scripted HTTP transport with call counting and gating
//! - Proptest generators for catalogs and user input
//! - The demo event catalog used across integration tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

pub use funnel_core::{EventProperty, EventType, PropertyType, SelectOption};
pub use funnel_http::{HttpRequest, HttpResponse, HttpTransport, TransportError};

// ============================================================================
// MOCK TRANSPORT
// ============================================================================

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that replays scripted outcomes instead of touching the network.
///
/// Scripted outcomes are consumed in order; once exhausted, every request
/// gets the fallback. A gated transport parks each request until
/// [`MockTransport::release`] hands out a permit.
#[derive(Debug)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    fallback: Scripted,
    requests: Mutex<Vec<HttpRequest>>,
    calls: AtomicUsize,
    gate: Option<Semaphore>,
}

impl MockTransport {
    /// Every request answers 200 with `body`.
    pub fn responding(body: serde_json::Value) -> Self {
        Self::with_fallback(Ok(HttpResponse::ok(body)))
    }

    /// Every request fails with `error`.
    pub fn failing(error: TransportError) -> Self {
        Self::with_fallback(Err(error))
    }

    fn with_fallback(fallback: Scripted) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Queue an outcome ahead of the fallback.
    pub fn then(self, outcome: Scripted) -> Self {
        lock(&self.script).push_back(outcome);
        self
    }

    /// Park requests until released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Let `n` parked (or future) requests through.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        lock(&self.requests).last().cloned()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => {
                    return Err(TransportError::Request {
                        message: "mock gate closed".to_string(),
                    })
                }
            }
        }

        let scripted = lock(&self.script).pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built catalogs and options for common scenarios.

    use super::*;
    use funnel_core::format_label;

    pub const EVENTS_URL: &str = "https://br-fe-assignment.github.io/customer-events/events.json";

    /// The six-event demo catalog.
    pub fn demo_catalog() -> Vec<EventType> {
        use PropertyType::{Number, String};
        let event = |name: &str, props: &[(&str, PropertyType)]| {
            EventType::new(
                name,
                props
                    .iter()
                    .map(|(p, t)| EventProperty::new(*p, *t))
                    .collect(),
            )
        };
        vec![
            event("session_start", &[("device", String), ("browser", String)]),
            event("session_end", &[("session_length", Number)]),
            event("page_visit", &[("url", String), ("duration", Number)]),
            event(
                "purchase",
                &[("amount", Number), ("currency", String), ("item_count", Number)],
            ),
            event("cart_update", &[("cart_value", Number), ("item_id", String)]),
            event("view_item", &[("item_id", String), ("price", Number)]),
        ]
    }

    /// The demo catalog in its wire shape.
    pub fn demo_catalog_json() -> serde_json::Value {
        let events: Vec<serde_json::Value> = demo_catalog()
            .iter()
            .map(|e| {
                let properties: Vec<serde_json::Value> = e
                    .properties
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "property": p.property,
                            "type": p.property_type.as_str(),
                        })
                    })
                    .collect();
                serde_json::json!({ "type": e.event_type, "properties": properties })
            })
            .collect();
        serde_json::json!({ "events": events })
    }

    /// Select option for an event type id, labelled the way the UI shows it.
    pub fn event_option(event_type: &str) -> SelectOption {
        SelectOption::new(format_label(event_type), event_type.to_string())
    }

    /// Select option for a property of the demo catalog, carrying its type.
    pub fn property_option(event_type: &str, property: &str) -> SelectOption {
        let kind = demo_catalog()
            .iter()
            .find(|e| e.event_type == event_type)
            .and_then(|e| e.property(property))
            .map(|p| p.property_type)
            .unwrap_or_default();
        SelectOption::new(format_label(property), property.to_string()).with_kind(kind)
    }

    /// Operator option by value for the given property type.
    pub fn operator_option(property_type: PropertyType, operator: &str) -> SelectOption {
        funnel_core::operators_for(property_type)
            .into_iter()
            .find(|o| o.value == operator)
            .unwrap_or_else(|| SelectOption::new(operator, operator.to_string()))
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for catalogs and user input.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_property_type() -> impl Strategy<Value = PropertyType> {
        prop_oneof![Just(PropertyType::String), Just(PropertyType::Number)]
    }

    pub fn arb_identifier() -> impl Strategy<Value = String> {
        "[a-z]{1,8}(_[a-z]{1,8}){0,2}"
    }

    pub fn arb_event_type() -> impl Strategy<Value = EventType> {
        (
            arb_identifier(),
            prop::collection::vec((arb_identifier(), arb_property_type()), 0..5),
        )
            .prop_map(|(name, props)| {
                EventType::new(
                    name,
                    props
                        .into_iter()
                        .map(|(p, t)| EventProperty::new(p, t))
                        .collect(),
                )
            })
    }

    pub fn arb_catalog() -> impl Strategy<Value = Vec<EventType>> {
        prop::collection::vec(arb_event_type(), 0..6)
    }

    /// Text typed into a value field, including the empty string.
    pub fn arb_input() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            Just(Some(String::new())),
            "[a-z0-9]{1,6}".prop_map(Some),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_core::EventsResponse;

    #[test]
    fn test_demo_catalog_json_round_trips() {
        let parsed: EventsResponse = serde_json::from_value(fixtures::demo_catalog_json()).unwrap();
        assert_eq!(parsed.events, fixtures::demo_catalog());
    }

    #[test]
    fn test_property_option_carries_type() {
        let option = fixtures::property_option("purchase", "amount");
        assert_eq!(option.label, "Amount");
        assert_eq!(option.kind, Some(PropertyType::Number));
    }

    #[tokio::test]
    async fn test_mock_transport_replays_script_then_fallback() {
        let transport = MockTransport::responding(serde_json::json!({ "ok": true }))
            .then(Err(TransportError::Timeout));
        let request = HttpRequest::get(fixtures::EVENTS_URL).unwrap();

        assert_eq!(transport.send(&request).await, Err(TransportError::Timeout));
        assert!(transport.send(&request).await.is_ok());
        assert_eq!(transport.calls(), 2);
        assert_eq!(transport.last_request(), Some(request));
    }
}
