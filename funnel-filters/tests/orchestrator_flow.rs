use std::sync::Arc;

use funnel_core::PropertyType;
use funnel_filters::{
    EventCatalogSource, EventSource, FilterStepValue, FiltersOrchestrator, BASELINE_ID,
    EVENTS_CACHE_KEY, NO_ACTIVE_FILTERS,
};
use funnel_http::{CacheGateway, HttpResponseCache, TransportError};
use funnel_test_utils::fixtures::{
    demo_catalog, demo_catalog_json, event_option, operator_option, property_option, EVENTS_URL,
};
use funnel_test_utils::MockTransport;

fn source(
    transport: MockTransport,
) -> (
    Arc<EventCatalogSource<MockTransport>>,
    Arc<MockTransport>,
    Arc<HttpResponseCache>,
) {
    let transport = Arc::new(transport);
    let cache = Arc::new(HttpResponseCache::new());
    let gateway = CacheGateway::new(Arc::clone(&cache), Arc::clone(&transport));
    (
        Arc::new(EventCatalogSource::new(gateway, EVENTS_URL)),
        transport,
        cache,
    )
}

async fn loaded_orchestrator() -> FiltersOrchestrator {
    let (source, _, _) = source(MockTransport::responding(demo_catalog_json()));
    let mut orchestrator = FiltersOrchestrator::new(source);
    orchestrator.load_events().await;
    orchestrator
}

/// Turn `step` into a complete `page_visit` step with `url contains checkout`.
fn complete_step(orchestrator: &mut FiltersOrchestrator, step: u64) {
    orchestrator.select_event_type(step, Some(event_option("page_visit")));
    let row = orchestrator.step(step).unwrap().value.attribute_filters[0].id;
    orchestrator.select_property(step, row, Some(property_option("page_visit", "url")));
    orchestrator.select_operator(
        step,
        row,
        Some(operator_option(PropertyType::String, "contains")),
    );
    orchestrator.set_value(step, row, Some("checkout"));
}

#[tokio::test]
async fn duplicate_allocates_step_id_then_row_ids_in_order() {
    let mut orchestrator = loaded_orchestrator().await;
    orchestrator.add_attribute_filter(BASELINE_ID);
    orchestrator.add_attribute_filter(BASELINE_ID);
    assert_eq!(
        orchestrator.step(BASELINE_ID).unwrap().value.attribute_filters.len(),
        3
    );

    let n = orchestrator.next_id();
    let copy = orchestrator.duplicate_step(BASELINE_ID).unwrap();

    assert_eq!(copy, n);
    let rows: Vec<u64> = orchestrator
        .step(copy)
        .unwrap()
        .value
        .attribute_filters
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(rows, vec![n + 1, n + 2, n + 3]);
    assert_eq!(orchestrator.next_id(), n + 4);
    assert_eq!(orchestrator.steps()[1].id, copy);
}

#[tokio::test]
async fn applied_snapshot_is_isolated_from_later_edits() {
    let mut orchestrator = loaded_orchestrator().await;
    complete_step(&mut orchestrator, BASELINE_ID);

    let snapshot = orchestrator.apply_filters().to_vec();
    assert_eq!(snapshot.len(), 1);

    let row = orchestrator.step(BASELINE_ID).unwrap().value.attribute_filters[0].id;
    orchestrator.set_value(BASELINE_ID, row, Some("cart"));
    orchestrator.rename_step(BASELINE_ID, "Edited");
    let extra = orchestrator.add_step();
    complete_step(&mut orchestrator, extra);

    assert_eq!(orchestrator.applied_filters(), snapshot.as_slice());
    assert_eq!(orchestrator.active_filters().len(), 2);

    orchestrator.apply_filters();
    assert_eq!(orchestrator.applied_filters().len(), 2);
    assert_eq!(
        orchestrator.applied_filters()[0].attribute_filters[0].value.as_deref(),
        Some("cart")
    );
}

#[tokio::test]
async fn active_filters_is_a_pure_read() {
    let mut orchestrator = loaded_orchestrator().await;
    complete_step(&mut orchestrator, BASELINE_ID);
    orchestrator.add_step();

    let steps_before = orchestrator.steps().to_vec();
    let first = orchestrator.active_filters();
    let second = orchestrator.active_filters();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(orchestrator.steps(), steps_before.as_slice());
    assert!(orchestrator.applied_filters().is_empty());
}

#[tokio::test]
async fn clear_all_restores_canonical_state() {
    let mut orchestrator = loaded_orchestrator().await;
    complete_step(&mut orchestrator, BASELINE_ID);
    let extra = orchestrator.add_step();
    orchestrator.duplicate_step(extra);
    orchestrator.apply_filters();

    orchestrator.clear_all();

    assert_eq!(orchestrator.steps().len(), 1);
    assert_eq!(orchestrator.steps()[0].id, BASELINE_ID);
    assert_eq!(orchestrator.steps()[0].value, FilterStepValue::blank());
    assert!(orchestrator.applied_filters().is_empty());
    assert_eq!(orchestrator.filter_summary(), NO_ACTIVE_FILTERS);
    assert_eq!(orchestrator.add_step(), BASELINE_ID + 1);
    assert_eq!(orchestrator.event_types().len(), demo_catalog().len());
}

#[tokio::test]
async fn concurrent_catalog_reads_share_one_request() {
    let (source, transport, cache) =
        source(MockTransport::responding(demo_catalog_json()).gated());

    let (a, b, ()) = tokio::join!(source.events(), source.events(), async {
        tokio::task::yield_now().await;
        transport.release(1);
    });

    assert_eq!(a.unwrap(), demo_catalog());
    assert_eq!(b.unwrap(), demo_catalog());
    assert_eq!(transport.calls(), 1);
    assert!(cache.has(EVENTS_CACHE_KEY));
    assert!(source.is_cached());
}

#[tokio::test]
async fn refresh_invalidates_and_refetches() {
    let (source, transport, _) = source(MockTransport::responding(demo_catalog_json()));

    source.events().await.unwrap();
    source.events().await.unwrap();
    assert_eq!(transport.calls(), 1);

    source.refresh_events().await.unwrap();
    assert_eq!(transport.calls(), 2);

    source.clear_cache();
    assert!(!source.is_cached());
    assert_eq!(
        transport.last_request().map(|r| r.url.to_string()),
        Some(EVENTS_URL.to_string())
    );
}

#[tokio::test]
async fn fetch_failure_surfaces_error_and_is_retried_on_refresh() {
    let transport =
        MockTransport::responding(demo_catalog_json()).then(Err(TransportError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }));
    let (source, transport, _) = source(transport);
    let mut orchestrator = FiltersOrchestrator::new(source);

    orchestrator.load_events().await;
    assert!(!orchestrator.catalog().is_loading);
    assert_eq!(
        orchestrator.catalog().error.as_deref(),
        Some("HTTP 503: unavailable")
    );
    assert!(orchestrator.event_types().is_empty());

    orchestrator.refresh_events().await;
    assert!(orchestrator.catalog().error.is_none());
    assert_eq!(orchestrator.event_types().len(), 6);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn failed_catalog_is_not_served_from_cache() {
    let transport =
        MockTransport::responding(demo_catalog_json()).then(Err(TransportError::Timeout));
    let (source, transport, _) = source(transport);

    assert_eq!(source.events().await, Err(TransportError::Timeout));
    assert_eq!(source.events().await.map(|e| e.len()), Ok(6));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn malformed_catalog_yields_no_event_types() {
    let (source, _, _) = source(MockTransport::responding(serde_json::json!({ "events": 7 })));
    let mut orchestrator = FiltersOrchestrator::new(source);

    orchestrator.load_events().await;

    assert!(orchestrator.catalog().error.is_none());
    assert!(orchestrator.event_types().is_empty());
    assert!(funnel_filters::event_type_options(orchestrator.event_types()).is_empty());
}

#[tokio::test]
async fn loading_flag_is_observable_while_the_fetch_is_parked() {
    let (source, transport, _) = source(MockTransport::responding(demo_catalog_json()).gated());
    let mut orchestrator = FiltersOrchestrator::new(source.clone());

    transport.release(1);
    orchestrator.load_events().await;
    assert!(source.is_cached());

    let fetch = orchestrator.begin_refresh();
    assert!(orchestrator.catalog().is_loading);
    assert!(!source.is_cached());
    assert_eq!(transport.calls(), 1);

    let (result, ()) = tokio::join!(fetch, async {
        tokio::task::yield_now().await;
        transport.release(1);
    });
    assert!(orchestrator.catalog().is_loading);
    assert_eq!(transport.calls(), 2);

    orchestrator.finish_load(result);
    assert!(!orchestrator.catalog().is_loading);
    assert!(orchestrator.catalog().error.is_none());
    assert_eq!(orchestrator.event_types().len(), 6);
}
