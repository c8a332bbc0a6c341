use std::collections::{HashMap, HashSet};
use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::contacts::ContactRecord;

use super::model::{Filter, GraphLink, GraphModel, GraphNode};

const STRENGTH_PER_WEIGHT: f32 = 20.0;

/// Adds links that are not derived from the records themselves.
pub trait LinkEnrichment: fmt::Debug {
    fn enrich(&self, nodes: &[GraphNode], links: &mut Vec<GraphLink>);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoEnrichment;

impl LinkEnrichment for NoEnrichment {
    fn enrich(&self, _nodes: &[GraphNode], _links: &mut Vec<GraphLink>) {}
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
struct CatalogueEntry {
    source: String,
    target: String,
    weight: f32,
}

/// Fixed, record-independent links that densify the graph once it has more
/// than `min_nodes` nodes. An entry is only added when both ids are present.
#[derive(Clone, Debug, PartialEq)]
pub struct StaticCatalogue {
    min_nodes: usize,
    entries: Vec<CatalogueEntry>,
}

impl StaticCatalogue {
    pub const DEFAULT_MIN_NODES: usize = 3;

    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, S, f32)>,
        S: Into<String>,
    {
        Self {
            min_nodes: Self::DEFAULT_MIN_NODES,
            entries: entries
                .into_iter()
                .map(|(source, target, weight)| CatalogueEntry {
                    source: source.into(),
                    target: target.into(),
                    weight,
                })
                .collect(),
        }
    }

    pub fn with_min_nodes(mut self, min_nodes: usize) -> Self {
        self.min_nodes = min_nodes;
        self
    }

    /// Parses `[{"source": .., "target": .., "weight": ..}, ...]`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let entries: Vec<CatalogueEntry> =
            serde_json::from_str(raw).context("invalid link catalogue JSON")?;
        Ok(Self {
            min_nodes: Self::DEFAULT_MIN_NODES,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticCatalogue {
    fn default() -> Self {
        Self::new([
            ("1", "2", 3.0),
            ("1", "3", 2.0),
            ("2", "4", 1.5),
            ("3", "5", 2.5),
            ("4", "5", 1.0),
        ])
    }
}

impl LinkEnrichment for StaticCatalogue {
    fn enrich(&self, nodes: &[GraphNode], links: &mut Vec<GraphLink>) {
        if nodes.len() <= self.min_nodes {
            return;
        }

        let present = nodes
            .iter()
            .map(|node| node.id.as_str())
            .collect::<HashSet<_>>();
        for entry in &self.entries {
            if entry.source == entry.target
                || !present.contains(entry.source.as_str())
                || !present.contains(entry.target.as_str())
            {
                continue;
            }
            if links
                .iter()
                .any(|link| link.joins(&entry.source, &entry.target))
            {
                continue;
            }

            links.push(GraphLink::new(
                entry.source.clone(),
                entry.target.clone(),
                entry.weight,
            ));
        }
    }
}

#[derive(Debug)]
pub struct GraphModelBuilder {
    enrichment: Box<dyn LinkEnrichment>,
}

impl Default for GraphModelBuilder {
    fn default() -> Self {
        Self::new(StaticCatalogue::default())
    }
}

impl GraphModelBuilder {
    pub fn new(enrichment: impl LinkEnrichment + 'static) -> Self {
        Self {
            enrichment: Box::new(enrichment),
        }
    }

    pub fn build(&self, records: &[ContactRecord], filter: &Filter) -> GraphModel {
        let mut seen = HashSet::new();
        let mut passing = Vec::new();
        for record in records {
            if !filter.accepts(record) {
                continue;
            }
            if !seen.insert(record.id.as_str()) {
                tracing::warn!(id = %record.id, "duplicate contact id, keeping first record");
                continue;
            }
            passing.push(record);
        }

        let nodes = passing
            .iter()
            .map(|record| GraphNode::from_record(record))
            .collect::<Vec<_>>();

        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.as_str(), index))
            .collect::<HashMap<_, _>>();

        let mut links = Vec::new();
        for record in &passing {
            let Some(source_id) = record.meet_through_id.as_deref() else {
                continue;
            };
            if source_id == record.id || !index_by_id.contains_key(source_id) {
                continue;
            }

            links.push(GraphLink::new(
                source_id,
                record.id.as_str(),
                f32::from(record.connection_strength) / STRENGTH_PER_WEIGHT,
            ));
        }

        self.enrichment.enrich(&nodes, &mut links);

        tracing::debug!(
            records = records.len(),
            nodes = nodes.len(),
            links = links.len(),
            "built contact graph"
        );
        GraphModel { nodes, links }
    }
}
