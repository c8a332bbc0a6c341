use std::collections::BTreeSet;

use eframe::egui::{Pos2, Vec2};

use crate::contacts::ContactRecord;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub category: String,
    pub connection_strength: u8,
    pub tags: Vec<String>,
    pub image_ref: Option<String>,
    pub position: Pos2,
    pub(super) velocity: Vec2,
    pub pinned: Option<Pos2>,
}

impl GraphNode {
    pub const BASE_RADIUS: f32 = 20.0;

    pub(super) fn from_record(record: &ContactRecord) -> Self {
        Self {
            id: record.id.clone(),
            label: record.display_name.clone(),
            category: record.category_or_default().to_owned(),
            connection_strength: record.connection_strength.min(100),
            tags: record.tags.clone().unwrap_or_default(),
            image_ref: record.image_ref.clone(),
            position: Pos2::ZERO,
            velocity: Vec2::ZERO,
            pinned: None,
        }
    }

    /// Rendered radius in world units.
    pub fn radius(&self) -> f32 {
        Self::BASE_RADIUS + f32::from(self.connection_strength) / 10.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphLink {
    pub source_id: String,
    pub target_id: String,
    pub weight: f32,
}

impl GraphLink {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>, weight: f32) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            weight,
        }
    }

    pub(super) fn joins(&self, a: &str, b: &str) -> bool {
        (self.source_id == a && self.target_id == b) || (self.source_id == b && self.target_id == a)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Filter {
    /// Empty means every category passes.
    pub categories: BTreeSet<String>,
    pub min_strength: u8,
}

impl Filter {
    pub fn new<I, S>(categories: I, min_strength: u8) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            min_strength,
        }
    }

    pub fn accepts(&self, record: &ContactRecord) -> bool {
        let category_ok =
            self.categories.is_empty() || self.categories.contains(record.category_or_default());
        category_ok && record.connection_strength >= self.min_strength
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphModel {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }
}
