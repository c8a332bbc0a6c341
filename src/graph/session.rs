use std::collections::{BTreeSet, HashMap};

use eframe::egui::{Pos2, Vec2, vec2};
use serde::Deserialize;

use crate::contacts::ContactRecord;

use super::build::GraphModelBuilder;
use super::interaction::{
    InteractionConfig, InteractionController, PointerEvent, SelectionEvent, SelectionState,
};
use super::model::{Filter, GraphLink, GraphNode};
use super::simulator::{
    ForceSimulator, SimulationConfig, SimulationState, SimulationStatus, TickHandle,
};
use super::viewport::{Viewport, ViewportController};

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionOptions {
    pub simulation: SimulationConfig,
    pub interaction: InteractionConfig,
    /// Initial drawing surface size, replaced by the host on the first frame.
    pub viewport_size: [f32; 2],
    /// Seed rebuilt graphs with the previous position of surviving nodes.
    pub retain_positions: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            interaction: InteractionConfig::default(),
            viewport_size: [960.0, 720.0],
            retain_positions: false,
        }
    }
}

/// One mounted graph view: the model builder, simulator, viewport and
/// interaction controller wired together.
#[derive(Debug)]
pub struct GraphSession {
    records: Vec<ContactRecord>,
    filter: Filter,
    builder: GraphModelBuilder,
    options: SessionOptions,
    simulator: ForceSimulator,
    viewport: ViewportController,
    interaction: InteractionController,
    links: Vec<GraphLink>,
    tick_handle: Option<TickHandle>,
    live: bool,
    rebuild_count: u64,
}

impl GraphSession {
    pub fn start(
        records: Vec<ContactRecord>,
        filter: Filter,
        builder: GraphModelBuilder,
        options: SessionOptions,
    ) -> Self {
        let [width, height] = options.viewport_size;
        let viewport = ViewportController::new(vec2(width, height));
        let simulator = ForceSimulator::new(options.simulation, viewport.center());

        let mut session = Self {
            records,
            filter,
            builder,
            options,
            simulator,
            viewport,
            interaction: InteractionController::new(options.interaction),
            links: Vec::new(),
            tick_handle: None,
            live: true,
            rebuild_count: 0,
        };
        session.rebuild();
        tracing::info!(
            records = session.records.len(),
            nodes = session.nodes().len(),
            "graph session started"
        );
        session
    }

    fn rebuild(&mut self) -> Option<SelectionEvent> {
        let model = self.builder.build(&self.records, &self.filter);
        let seeds = if self.options.retain_positions {
            self.simulator.positions()
        } else {
            HashMap::new()
        };

        if let Some(handle) = self.tick_handle.take() {
            self.simulator.stop(handle);
        }
        self.interaction.cancel();
        self.links = model.links;
        self.tick_handle = Some(self.simulator.start_seeded(model.nodes, &self.links, &seeds));
        self.rebuild_count += 1;

        let selected_missing = self
            .interaction
            .selection()
            .selected_node_id
            .as_deref()
            .is_some_and(|id| self.simulator.node(id).is_none());
        if selected_missing {
            self.interaction.clear_selection()
        } else {
            None
        }
    }

    /// Replaces the filter. Returns `SelectionCleared` when the selected node
    /// was filtered out.
    pub fn set_filter(&mut self, filter: Filter) -> Option<SelectionEvent> {
        if !self.live || filter == self.filter {
            return None;
        }
        tracing::debug!(?filter, "filter changed");
        self.filter = filter;
        self.rebuild()
    }

    pub fn set_records(&mut self, records: Vec<ContactRecord>) -> Option<SelectionEvent> {
        if !self.live {
            return None;
        }
        self.records = records;
        self.rebuild()
    }

    /// Runs one simulation step for the current frame. Returns whether the host
    /// should schedule another frame.
    pub fn frame(&mut self) -> bool {
        if !self.live {
            return false;
        }
        let Some(handle) = self.tick_handle else {
            return false;
        };
        self.simulator.tick(handle)
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Option<SelectionEvent> {
        if !self.live {
            return None;
        }
        self.interaction
            .handle(event, &mut self.viewport, &mut self.simulator)
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_by(self.options.interaction.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_by(1.0 / self.options.interaction.zoom_step);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn close_selection(&mut self) -> Option<SelectionEvent> {
        self.interaction.clear_selection()
    }

    /// Updates the surface size; the simulator's centering target follows it.
    pub fn resize(&mut self, size: Vec2) {
        if size == self.viewport.size() || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        self.viewport.resize(size);
        self.simulator.set_center(self.viewport.center());
    }

    /// Halts ticking for good. Later frames and events are ignored.
    pub fn stop(&mut self) {
        if let Some(handle) = self.tick_handle.take() {
            self.simulator.stop(handle);
        }
        self.interaction.cancel();
        self.live = false;
        tracing::info!(rebuilds = self.rebuild_count, "graph session stopped");
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn nodes(&self) -> &[GraphNode] {
        self.simulator.nodes()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.simulator.node(id)
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    pub fn transform(&self) -> Viewport {
        self.viewport.transform()
    }

    pub fn selection(&self) -> &SelectionState {
        self.interaction.selection()
    }

    pub fn dragged_node(&self) -> Option<&str> {
        self.interaction.dragged_node()
    }

    pub fn interaction_config(&self) -> InteractionConfig {
        self.interaction.config()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn simulation_state(&self) -> SimulationState {
        self.simulator.state()
    }

    pub fn status(&self) -> SimulationStatus {
        self.simulator.status()
    }

    /// Every category present in the records, for building filter controls.
    pub fn categories(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .map(|record| record.category_or_default().to_owned())
            .collect()
    }

    pub fn hovered(&self, position: Pos2) -> Option<&GraphNode> {
        super::interaction::node_at(self.nodes(), &self.viewport, position)
            .map(|index| &self.nodes()[index])
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;
    use crate::graph::build::NoEnrichment;

    fn records() -> Vec<ContactRecord> {
        vec![
            ContactRecord::new("a", "Ada")
                .with_category("Work")
                .with_strength(90),
            ContactRecord::new("b", "Bo")
                .with_category("Personal")
                .with_strength(10),
            ContactRecord::new("c", "Cy")
                .with_category("Work")
                .with_strength(40)
                .with_meet_through("a"),
        ]
    }

    fn session(options: SessionOptions) -> GraphSession {
        GraphSession::start(
            records(),
            Filter::default(),
            GraphModelBuilder::new(NoEnrichment),
            options,
        )
    }

    fn screen_of(session: &GraphSession, id: &str) -> Pos2 {
        let node = session.node(id).unwrap();
        session.viewport().world_to_screen(node.position)
    }

    #[test]
    fn start_builds_and_runs() {
        let mut session = session(SessionOptions::default());
        assert_eq!(session.nodes().len(), 3);
        assert_eq!(session.links().len(), 1);
        assert_eq!(session.status(), SimulationStatus::Running);
        assert_eq!(session.transform(), Viewport::IDENTITY);
        assert!(session.frame());
        assert_eq!(session.simulation_state().tick_count, 1);
    }

    #[test]
    fn filter_change_rebuilds_and_restarts() {
        let mut session = session(SessionOptions::default());
        for _ in 0..20 {
            session.frame();
        }

        session.set_filter(Filter::new(["Work"], 20));
        let ids = session
            .nodes()
            .iter()
            .map(|node| node.id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(session.simulation_state().alpha, 1.0);
        assert_eq!(session.simulation_state().tick_count, 0);
    }

    #[test]
    fn filtering_out_selected_node_clears_selection() {
        let mut session = session(SessionOptions::default());
        let position = screen_of(&session, "b");
        session.handle_pointer(PointerEvent::Down(position));
        let event = session.handle_pointer(PointerEvent::Up(position));
        assert!(matches!(event, Some(SelectionEvent::NodeSelected { ref id, .. }) if id == "b"));

        let event = session.set_filter(Filter::new(["Work"], 0));
        assert_eq!(event, Some(SelectionEvent::SelectionCleared));
        assert!(session.selection().selected_node_id.is_none());
    }

    #[test]
    fn rebuild_during_drag_returns_to_idle() {
        let mut session = session(SessionOptions::default());
        let position = screen_of(&session, "b");
        session.handle_pointer(PointerEvent::Down(position));
        assert_eq!(session.dragged_node(), Some("b"));

        session.set_filter(Filter::new(["Work"], 0));
        assert_eq!(session.dragged_node(), None);
        assert_eq!(
            session.handle_pointer(PointerEvent::Move(pos2(10.0, 10.0))),
            None
        );
        assert_eq!(session.handle_pointer(PointerEvent::Up(pos2(10.0, 10.0))), None);
    }

    #[test]
    fn host_commands_drive_viewport() {
        let mut session = session(SessionOptions::default());
        session.zoom_in();
        assert!(session.transform().scale > 1.0);
        session.zoom_out();
        session.zoom_out();
        assert!(session.transform().scale < 1.0);
        for _ in 0..50 {
            session.zoom_in();
        }
        assert_eq!(session.transform().scale, 4.0);
        for _ in 0..50 {
            session.zoom_out();
        }
        assert_eq!(session.transform().scale, 0.1);
        session.reset_view();
        assert_eq!(session.transform(), Viewport::IDENTITY);
    }

    #[test]
    fn stopped_session_ignores_frames() {
        let mut session = session(SessionOptions::default());
        session.stop();
        let before = session.nodes().to_vec();

        assert!(!session.frame());
        assert_eq!(session.nodes(), before.as_slice());
        assert_eq!(session.set_filter(Filter::new(["Work"], 0)), None);
        assert_eq!(session.nodes().len(), 3);
    }

    #[test]
    fn retained_positions_survive_rebuild() {
        let options = SessionOptions {
            retain_positions: true,
            ..SessionOptions::default()
        };
        let mut session = session(options);
        for _ in 0..30 {
            session.frame();
        }
        let a_before = session.node("a").unwrap().position;

        session.set_filter(Filter::new(["Work"], 0));
        assert_eq!(session.node("a").unwrap().position, a_before);
    }

    #[test]
    fn resize_moves_centering_target() {
        let mut session = session(SessionOptions::default());
        session.resize(vec2(400.0, 200.0));
        assert_eq!(session.viewport().center(), pos2(200.0, 100.0));
        assert_eq!(session.simulator.center(), pos2(200.0, 100.0));
    }

    #[test]
    fn categories_include_normalized_default() {
        let mut records = records();
        records.push(ContactRecord::new("d", "Di"));
        let session = GraphSession::start(
            records,
            Filter::default(),
            GraphModelBuilder::default(),
            SessionOptions::default(),
        );
        let categories = session.categories().into_iter().collect::<Vec<_>>();
        assert_eq!(categories, vec!["Personal", "Work", "default"]);
    }
}
