//! Ordered list of filter steps plus the applied-filters snapshot.
//!
//! Editing state (`steps`) and the in-force snapshot (`applied`) are kept
//! apart: edits never touch the snapshot until [`FiltersOrchestrator::apply_filters`]
//! is called again. Active filters are recomputed from the steps on every
//! call; nothing is memoized.

use std::future::Future;
use std::sync::Arc;

use funnel_core::{AttributeId, EventType, PropertyType, SelectOption, StepId};
use funnel_http::TransportError;
use serde::{Deserialize, Serialize};

use crate::attribute::AttributeFilter;
use crate::catalog::{CatalogState, EventSource};
use crate::ids::{IdAllocator, BASELINE_ID};
use crate::step::FilterStepValue;

pub const NO_ACTIVE_FILTERS: &str = "No active filters";

/// A step as held by the orchestrator: stable id plus editable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStep {
    pub id: StepId,
    pub value: FilterStepValue,
}

/// One complete condition in the applied snapshot. Carries no row id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedAttributeFilter {
    pub property: SelectOption,
    pub operator: SelectOption,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub value: Option<String>,
    pub value_from: Option<String>,
    pub value_to: Option<String>,
}

impl AppliedAttributeFilter {
    fn from_row(row: &AttributeFilter) -> Option<Self> {
        if !row.is_complete() {
            return None;
        }
        Some(Self {
            property: row.property.clone()?,
            operator: row.operator.clone()?,
            property_type: row.property_type,
            value: row.value.clone(),
            value_from: row.value_from.clone(),
            value_to: row.value_to.clone(),
        })
    }
}

/// One active step in the applied snapshot. Carries no step id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedFilter {
    pub name: String,
    pub event_type: SelectOption,
    pub attribute_filters: Vec<AppliedAttributeFilter>,
}

impl AppliedFilter {
    fn from_step(step: &FilterStepValue) -> Option<Self> {
        if !step.is_complete() {
            return None;
        }
        Some(Self {
            name: step.name.clone(),
            event_type: step.event_type.clone()?,
            attribute_filters: step
                .attribute_filters
                .iter()
                .filter_map(AppliedAttributeFilter::from_row)
                .collect(),
        })
    }
}

/// Owns the filter steps, the id counter and the catalog state.
pub struct FiltersOrchestrator {
    source: Arc<dyn EventSource>,
    catalog: CatalogState,
    steps: Vec<FilterStep>,
    applied: Vec<AppliedFilter>,
    ids: IdAllocator,
}

impl FiltersOrchestrator {
    /// One blank step with id 1; the counter continues at 2.
    pub fn new(source: Arc<dyn EventSource>) -> Self {
        Self {
            source,
            catalog: CatalogState::default(),
            steps: vec![Self::baseline_step()],
            applied: Vec::new(),
            ids: IdAllocator::starting_at(BASELINE_ID + 1),
        }
    }

    fn baseline_step() -> FilterStep {
        FilterStep {
            id: BASELINE_ID,
            value: FilterStepValue::blank(),
        }
    }

    // ------------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------------

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn event_types(&self) -> &[EventType] {
        &self.catalog.event_types
    }

    /// Mark the catalog as loading and return the fetch (cached reads
    /// allowed).
    ///
    /// The returned future owns everything it needs, so the orchestrator
    /// stays usable (and `catalog().is_loading` observable) while it runs.
    /// Hand its output to [`FiltersOrchestrator::finish_load`].
    pub fn begin_load(
        &mut self,
    ) -> impl Future<Output = Result<Vec<EventType>, TransportError>> + Send + 'static {
        self.mark_loading();
        let source = Arc::clone(&self.source);
        async move { source.events().await }
    }

    /// Like [`FiltersOrchestrator::begin_load`], but the cached catalog is
    /// invalidated first so the fetch always goes to the source.
    pub fn begin_refresh(
        &mut self,
    ) -> impl Future<Output = Result<Vec<EventType>, TransportError>> + Send + 'static {
        self.mark_loading();
        self.source.clear_cache();
        let source = Arc::clone(&self.source);
        async move { source.events().await }
    }

    /// Record the outcome of a fetch and clear the loading flag.
    pub fn finish_load(&mut self, result: Result<Vec<EventType>, TransportError>) {
        self.catalog.is_loading = false;
        match result {
            Ok(events) => {
                tracing::debug!(count = events.len(), "Event catalog loaded");
                self.catalog.event_types = events;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load event catalog");
                self.catalog.error = Some(err.to_string());
            }
        }
    }

    /// Fetch the catalog and record the outcome.
    pub async fn load_events(&mut self) {
        let fetch = self.begin_load();
        let result = fetch.await;
        self.finish_load(result);
    }

    /// Invalidate the cached catalog, fetch it again and record the outcome.
    pub async fn refresh_events(&mut self) {
        let fetch = self.begin_refresh();
        let result = fetch.await;
        self.finish_load(result);
    }

    fn mark_loading(&mut self) {
        self.catalog.is_loading = true;
        self.catalog.error = None;
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    pub fn steps(&self) -> &[FilterStep] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&FilterStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: StepId) -> Option<&mut FilterStep> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Next id the counter will hand out.
    pub fn next_id(&self) -> u64 {
        self.ids.peek()
    }

    /// Append a blank step and return its id.
    pub fn add_step(&mut self) -> StepId {
        let id = self.ids.allocate();
        self.steps.push(FilterStep {
            id,
            value: FilterStepValue::blank(),
        });
        id
    }

    /// Remove a step by id. Unknown ids are ignored.
    pub fn remove_step(&mut self, id: StepId) -> bool {
        let before = self.steps.len();
        self.steps.retain(|s| s.id != id);
        self.steps.len() != before
    }

    /// Insert a copy right after the source step.
    ///
    /// The copy gets the next id and each of its rows the following ids in
    /// order. Returns the new step id, or `None` for an unknown source.
    pub fn duplicate_step(&mut self, id: StepId) -> Option<StepId> {
        let index = self.steps.iter().position(|s| s.id == id)?;
        let mut value = self.steps[index].value.clone();
        let new_id = self.ids.allocate();
        for row in &mut value.attribute_filters {
            row.id = self.ids.allocate();
        }
        self.steps.insert(index + 1, FilterStep { id: new_id, value });
        Some(new_id)
    }

    pub fn rename_step(&mut self, id: StepId, name: impl Into<String>) -> bool {
        match self.step_mut(id) {
            Some(step) => {
                step.value.rename(name);
                true
            }
            None => false,
        }
    }

    pub fn select_event_type(&mut self, id: StepId, event_type: Option<SelectOption>) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        step.value.select_event_type(event_type, &mut self.ids);
        true
    }

    pub fn select_property(
        &mut self,
        id: StepId,
        row: AttributeId,
        property: Option<SelectOption>,
    ) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        step.value
            .select_property(row, property, &self.catalog.event_types)
    }

    pub fn select_operator(
        &mut self,
        id: StepId,
        row: AttributeId,
        operator: Option<SelectOption>,
    ) -> bool {
        self.step_mut(id)
            .is_some_and(|step| step.value.select_operator(row, operator))
    }

    pub fn set_value(&mut self, id: StepId, row: AttributeId, input: Option<&str>) -> bool {
        self.step_mut(id)
            .is_some_and(|step| step.value.set_value(row, input))
    }

    pub fn set_value_from(&mut self, id: StepId, row: AttributeId, input: Option<&str>) -> bool {
        self.step_mut(id)
            .is_some_and(|step| step.value.set_value_from(row, input))
    }

    pub fn set_value_to(&mut self, id: StepId, row: AttributeId, input: Option<&str>) -> bool {
        self.step_mut(id)
            .is_some_and(|step| step.value.set_value_to(row, input))
    }

    pub fn add_attribute_filter(&mut self, id: StepId) -> Option<AttributeId> {
        let step = self.steps.iter_mut().find(|s| s.id == id)?;
        Some(step.value.add_attribute_filter(&mut self.ids))
    }

    pub fn remove_attribute_filter(&mut self, id: StepId, row: AttributeId) -> bool {
        let Some(step) = self.steps.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        step.value.remove_attribute_filter(row, &mut self.ids)
    }

    // ------------------------------------------------------------------------
    // Applied filters
    // ------------------------------------------------------------------------

    /// Complete steps with only their complete rows, ids stripped.
    pub fn active_filters(&self) -> Vec<AppliedFilter> {
        self.steps
            .iter()
            .filter_map(|s| AppliedFilter::from_step(&s.value))
            .collect()
    }

    /// Snapshot the active filters as the applied set.
    pub fn apply_filters(&mut self) -> &[AppliedFilter] {
        self.applied = self.active_filters();
        tracing::info!(count = self.applied.len(), "Applying filters");
        &self.applied
    }

    pub fn applied_filters(&self) -> &[AppliedFilter] {
        &self.applied
    }

    /// Drop one entry of the applied snapshot. Out-of-range is a no-op.
    pub fn remove_applied_filter(&mut self, index: usize) -> bool {
        if index >= self.applied.len() {
            return false;
        }
        self.applied.remove(index);
        true
    }

    pub fn filter_summary(&self) -> String {
        match self.applied.len() {
            0 => NO_ACTIVE_FILTERS.to_string(),
            1 => "1 active filter".to_string(),
            n => format!("{n} active filters"),
        }
    }

    /// Back to one blank step with id 1, nothing applied, counter at 2.
    pub fn clear_all(&mut self) {
        self.steps = vec![Self::baseline_step()];
        self.applied.clear();
        self.ids.reset(BASELINE_ID + 1);
    }
}

impl std::fmt::Debug for FiltersOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FiltersOrchestrator")
            .field("catalog", &self.catalog)
            .field("steps", &self.steps)
            .field("applied", &self.applied)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use funnel_core::EventProperty;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticSource {
        result: Result<Vec<EventType>, TransportError>,
        clears: AtomicUsize,
    }

    impl StaticSource {
        fn new(result: Result<Vec<EventType>, TransportError>) -> Self {
            Self {
                result,
                clears: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EventSource for StaticSource {
        async fn events(&self) -> Result<Vec<EventType>, TransportError> {
            self.result.clone()
        }

        fn clear_cache(&self) {
            self.clears.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn catalog() -> Vec<EventType> {
        vec![EventType::new(
            "page_visit",
            vec![
                EventProperty::new("url", PropertyType::String),
                EventProperty::new("duration", PropertyType::Number),
            ],
        )]
    }

    fn orchestrator() -> FiltersOrchestrator {
        FiltersOrchestrator::new(Arc::new(StaticSource::new(Ok(catalog()))))
    }

    fn opt(label: &str, value: &str) -> Option<SelectOption> {
        Some(SelectOption::new(label, value.to_string()))
    }

    #[test]
    fn test_initial_state() {
        let orchestrator = orchestrator();
        assert_eq!(orchestrator.steps().len(), 1);
        assert_eq!(orchestrator.steps()[0].id, BASELINE_ID);
        assert_eq!(orchestrator.next_id(), 2);
        assert!(orchestrator.applied_filters().is_empty());
        assert_eq!(orchestrator.filter_summary(), NO_ACTIVE_FILTERS);
    }

    #[test]
    fn test_add_and_remove_step() {
        let mut orchestrator = orchestrator();
        let id = orchestrator.add_step();
        assert_eq!(id, 2);
        assert_eq!(orchestrator.steps().len(), 2);
        assert!(orchestrator.remove_step(id));
        assert!(!orchestrator.remove_step(id));
        assert_eq!(orchestrator.steps().len(), 1);
    }

    #[test]
    fn test_duplicate_step_inserts_after_source_with_fresh_ids() {
        let mut orchestrator = orchestrator();
        let second = orchestrator.add_step();
        orchestrator.add_attribute_filter(BASELINE_ID);
        orchestrator.rename_step(BASELINE_ID, "Visits");
        let next = orchestrator.next_id();

        let copy = orchestrator.duplicate_step(BASELINE_ID).unwrap();
        assert_eq!(copy, next);

        let ids: Vec<StepId> = orchestrator.steps().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![BASELINE_ID, copy, second]);

        let copied = orchestrator.step(copy).unwrap();
        assert_eq!(copied.value.name, "Visits");
        let row_ids: Vec<_> = copied.value.attribute_filters.iter().map(|r| r.id).collect();
        assert_eq!(row_ids, vec![next + 1, next + 2]);
        assert_eq!(orchestrator.next_id(), next + 3);
        assert_eq!(orchestrator.duplicate_step(999), None);
    }

    #[test]
    fn test_applied_snapshot_strips_ids_and_incomplete_rows() {
        let mut orchestrator = orchestrator();
        orchestrator.select_event_type(BASELINE_ID, opt("Page Visit", "page_visit"));
        let row = orchestrator.step(BASELINE_ID).unwrap().value.attribute_filters[0].id;
        orchestrator.add_attribute_filter(BASELINE_ID);
        orchestrator.select_property(BASELINE_ID, row, opt("Url", "url"));
        orchestrator.select_operator(BASELINE_ID, row, opt("Contains", "contains"));
        orchestrator.set_value(BASELINE_ID, row, Some("checkout"));

        let applied = orchestrator.apply_filters().to_vec();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].name, "Page Visit");
        assert_eq!(applied[0].attribute_filters.len(), 1);
        assert_eq!(applied[0].attribute_filters[0].property_type, Some(PropertyType::String));

        let json = serde_json::to_value(&applied[0]).unwrap();
        assert!(json.get("id").is_none());
        assert!(json["attributeFilters"][0].get("id").is_none());
        assert_eq!(json["eventType"]["value"], "page_visit");
        assert_eq!(orchestrator.filter_summary(), "1 active filter");
    }

    #[test]
    fn test_remove_applied_filter_by_index() {
        let mut orchestrator = orchestrator();
        for _ in 0..2 {
            let id = orchestrator.add_step();
            orchestrator.select_event_type(id, opt("Page Visit", "page_visit"));
            let row = orchestrator.step(id).unwrap().value.attribute_filters[0].id;
            orchestrator.select_property(id, row, opt("Url", "url"));
            orchestrator.select_operator(id, row, opt("Equals", "equals"));
            orchestrator.set_value(id, row, Some("/"));
        }
        orchestrator.apply_filters();
        assert_eq!(orchestrator.filter_summary(), "2 active filters");

        assert!(!orchestrator.remove_applied_filter(5));
        assert!(orchestrator.remove_applied_filter(0));
        assert_eq!(orchestrator.applied_filters().len(), 1);
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut orchestrator = orchestrator();
        assert!(!orchestrator.select_event_type(42, opt("Page Visit", "page_visit")));
        assert!(!orchestrator.select_property(BASELINE_ID, 42, opt("Url", "url")));
        assert!(!orchestrator.remove_attribute_filter(42, 1));
        assert_eq!(orchestrator.add_attribute_filter(42), None);
        assert!(!orchestrator.rename_step(42, "x"));
    }

    #[tokio::test]
    async fn test_load_events_populates_catalog() {
        let mut orchestrator = orchestrator();
        orchestrator.load_events().await;
        assert!(!orchestrator.catalog().is_loading);
        assert!(orchestrator.catalog().error.is_none());
        assert_eq!(orchestrator.event_types().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_message() {
        let source = Arc::new(StaticSource::new(Err(TransportError::Timeout)));
        let mut orchestrator = FiltersOrchestrator::new(source.clone());
        orchestrator.refresh_events().await;
        assert!(!orchestrator.catalog().is_loading);
        assert_eq!(orchestrator.catalog().error.as_deref(), Some("Request timed out"));
        assert_eq!(source.clears.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loading_flag_is_visible_until_finish() {
        let mut orchestrator = orchestrator();
        let fetch = orchestrator.begin_load();
        assert!(orchestrator.catalog().is_loading);
        assert!(orchestrator.catalog().error.is_none());

        let result = fetch.await;
        assert!(orchestrator.catalog().is_loading);

        orchestrator.finish_load(result);
        assert!(!orchestrator.catalog().is_loading);
        assert_eq!(orchestrator.event_types().len(), 1);
    }

    #[tokio::test]
    async fn test_new_load_clears_previous_error() {
        let mut orchestrator = orchestrator();
        orchestrator.finish_load(Err(TransportError::Timeout));
        assert!(orchestrator.catalog().error.is_some());

        let fetch = orchestrator.begin_refresh();
        assert!(orchestrator.catalog().error.is_none());
        orchestrator.finish_load(fetch.await);
        assert!(orchestrator.catalog().error.is_none());
    }
}
