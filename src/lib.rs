//! Force-directed layout and interaction engine for a contact network.
//!
//! [`graph::GraphSession`] is the entry point: it turns contact records and a
//! [`graph::Filter`] into a node/link graph, lays it out with a force
//! simulation stepped once per host frame, and turns raw pointer events into
//! pan, zoom, drag and selection.

pub mod contacts;
pub mod graph;
