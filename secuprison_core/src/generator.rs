//! The Run Generator - one sampled vulnerability per layer.
//!
//! A run is generated atomically: every layer is sampled, expanded into a
//! checklist and timestamped before the run is handed to the player. Replay
//! of a generated run is therefore deterministic even though sampling is
//! not reproducible across calls (unless the context is seeded).

use chrono::{DateTime, Utc};
use secuprison_env::{PrisonContext, RunId};
use serde::Serialize;
use std::sync::Arc;

use crate::catalog::{ChecklistType, Layer, LayerCatalog, Position};
use crate::checklist::derive_checklist;
use crate::error::SimError;
use crate::timestamp;

/// A single layer's outcome within a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Name of the layer this event belongs to
    pub layer: String,

    /// Sampled vulnerability, one of the layer's candidates
    pub vulnerability: String,

    /// Prison analogy copied from the layer
    pub analogy: String,

    pub checklist_type: ChecklistType,

    /// Remediation steps derived from (type, layer, vulnerability)
    pub checklist: Vec<String>,

    #[serde(serialize_with = "timestamp::serialize")]
    pub timestamp: DateTime<Utc>,

    /// Centre of the layer block (presentation only)
    pub position: Position,
}

/// One complete pass over the catalog.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: RunId,

    #[serde(serialize_with = "timestamp::serialize")]
    pub created_at: DateTime<Utc>,

    /// Exactly one event per catalog layer, in catalog order
    pub events: Vec<Event>,
}

impl Run {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns the event recorded for a layer, if any.
    pub fn event_for_layer(&self, layer: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.layer == layer)
    }
}

/// Samples one candidate uniformly through the context.
pub fn sample_vulnerability<'a, C: PrisonContext + ?Sized>(
    ctx: &C,
    layer: &'a Layer,
) -> Result<&'a str, SimError> {
    let idx = ctx
        .pick_index(layer.vulnerability_candidates.len())
        .ok_or_else(|| SimError::empty_candidates(&layer.name))?;

    layer
        .vulnerability_candidates
        .get(idx)
        .map(String::as_str)
        .ok_or_else(|| SimError::empty_candidates(&layer.name))
}

/// Produces runs from a catalog using an injected context.
pub struct RunGenerator<C: PrisonContext> {
    ctx: Arc<C>,
    catalog: Arc<LayerCatalog>,
}

impl<C: PrisonContext> RunGenerator<C> {
    pub fn new(ctx: Arc<C>, catalog: Arc<LayerCatalog>) -> Self {
        Self { ctx, catalog }
    }

    pub fn catalog(&self) -> &LayerCatalog {
        &self.catalog
    }

    pub fn context(&self) -> &Arc<C> {
        &self.ctx
    }

    /// Generates a new run, failing on the first layer with no candidates.
    pub fn generate_run(&self) -> Result<Run, SimError> {
        let events = self
            .catalog
            .all_layers()
            .iter()
            .map(|layer| self.build_event(layer))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Run {
            id: self.ctx.next_run_id(),
            created_at: timestamp::from_system_time(self.ctx.system_time()),
            events,
        })
    }

    fn build_event(&self, layer: &Layer) -> Result<Event, SimError> {
        let vulnerability = sample_vulnerability(self.ctx.as_ref(), layer)?;

        Ok(Event {
            layer: layer.name.clone(),
            vulnerability: vulnerability.to_string(),
            analogy: layer.analogy.clone(),
            checklist_type: layer.checklist_type,
            checklist: derive_checklist(layer.checklist_type, &layer.name, vulnerability),
            timestamp: timestamp::from_system_time(self.ctx.system_time()),
            position: layer.position.block_center(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedContext;

    fn generator(script: &[usize]) -> RunGenerator<ScriptedContext> {
        RunGenerator::new(
            Arc::new(ScriptedContext::new(script)),
            Arc::new(LayerCatalog::osi()),
        )
    }

    #[test]
    fn test_run_has_one_event_per_layer() {
        let run = generator(&[]).generate_run().unwrap();
        let catalog = LayerCatalog::osi();

        assert_eq!(run.len(), 7);
        for (event, layer) in run.events.iter().zip(catalog.all_layers()) {
            assert_eq!(event.layer, layer.name);
            assert_eq!(event.analogy, layer.analogy);
            assert!(layer.has_candidate(&event.vulnerability));
            assert!(!event.checklist.is_empty());
        }
    }

    #[test]
    fn test_scripted_picks_select_exact_vulnerabilities() {
        let run = generator(&[0, 1, 2, 0, 1, 2, 1]).generate_run().unwrap();
        let picked: Vec<&str> = run.events.iter().map(|e| e.vulnerability.as_str()).collect();
        assert_eq!(
            picked,
            vec![
                "Hardware tampering",
                "MAC cloning",
                "BGP tampering",
                "SYN flood",
                "Token replay",
                "Data format attacks",
                "XSS",
            ]
        );
    }

    #[test]
    fn test_application_read_do_checklist() {
        let run = generator(&[2]).generate_run().unwrap();
        let app = run.event_for_layer("Application").unwrap();

        assert_eq!(app.checklist_type, ChecklistType::ReadDo);
        assert_eq!(app.checklist.len(), 4);
        assert!(app.checklist[1].contains(&app.vulnerability));
        assert!(app.checklist[1].contains("Application"));
    }

    #[test]
    fn test_empty_candidate_set_fails() {
        let layers = vec![
            Layer::new(1, "Physical", "Fence breach", ChecklistType::ReadDo, &["Cable cutting"]),
            Layer::new(2, "Data Link", "Fake ID at gate", ChecklistType::ReadConfirm, &[]),
        ];
        let catalog = LayerCatalog::from_layers(layers).unwrap();
        let gen = RunGenerator::new(Arc::new(ScriptedContext::new(&[])), Arc::new(catalog));

        let err = gen.generate_run().unwrap_err();
        assert!(matches!(err, SimError::EmptyCandidateSet { ref layer } if layer == "Data Link"));
    }

    #[test]
    fn test_event_positions_are_block_centres() {
        let run = generator(&[]).generate_run().unwrap();
        assert_eq!(run.events[0].position, Position::new(120.0, 90.0));
    }

    #[test]
    fn test_run_ids_are_distinct() {
        let gen = generator(&[]);
        let a = gen.generate_run().unwrap();
        let b = gen.generate_run().unwrap();
        assert_ne!(a.id, b.id);
    }
}
