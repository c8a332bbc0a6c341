use eframe::egui::{Pos2, Vec2, pos2};
use serde::Deserialize;

use super::model::GraphNode;
use super::simulator::ForceSimulator;
use super::viewport::ViewportController;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    /// Pointer travel, in screen pixels, below which a press counts as a click.
    pub click_threshold: f32,
    pub panel_width: f32,
    pub panel_height: f32,
    pub panel_margin: f32,
    pub panel_offset: f32,
    pub zoom_step: f32,
    pub wheel_sensitivity: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            click_threshold: 4.0,
            panel_width: 220.0,
            panel_height: 200.0,
            panel_margin: 10.0,
            panel_offset: 12.0,
            zoom_step: 1.3,
            wheel_sensitivity: 0.002,
        }
    }
}

/// Raw input from the drawing surface, in surface-local screen coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PointerEvent {
    Down(Pos2),
    Move(Pos2),
    Up(Pos2),
    /// Positive `delta_y` scrolls away from the user and zooms out.
    Wheel { position: Pos2, delta_y: f32 },
    Leave,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SelectionEvent {
    NodeSelected { id: String, anchor: Pos2 },
    SelectionCleared,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionState {
    pub selected_node_id: Option<String>,
    pub anchor: Pos2,
}

#[derive(Clone, Debug, PartialEq)]
enum Gesture {
    Idle,
    Panning {
        origin: Pos2,
        last: Pos2,
        moved: bool,
    },
    Dragging {
        node_id: String,
        origin: Pos2,
        grab_offset: Vec2,
        moved: bool,
    },
}

#[derive(Debug)]
pub struct InteractionController {
    config: InteractionConfig,
    gesture: Gesture,
    selection: SelectionState,
}

/// Index of the node whose rendered circle contains `screen`, nearest first.
pub(super) fn node_at(
    nodes: &[GraphNode],
    viewport: &ViewportController,
    screen: Pos2,
) -> Option<usize> {
    let scale = viewport.transform().scale;
    nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            let distance = viewport.world_to_screen(node.position).distance(screen);
            (distance <= node.radius() * scale).then_some((index, distance))
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(index, _)| index)
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            gesture: Gesture::Idle,
            selection: SelectionState::default(),
        }
    }

    pub fn config(&self) -> InteractionConfig {
        self.config
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn is_idle(&self) -> bool {
        self.gesture == Gesture::Idle
    }

    pub fn dragged_node(&self) -> Option<&str> {
        match &self.gesture {
            Gesture::Dragging { node_id, .. } => Some(node_id.as_str()),
            _ => None,
        }
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        viewport: &mut ViewportController,
        simulator: &mut ForceSimulator,
    ) -> Option<SelectionEvent> {
        match event {
            PointerEvent::Down(position) => {
                self.release(simulator);
                self.press(position, viewport, simulator);
                None
            }
            PointerEvent::Move(position) => {
                self.drag_to(position, viewport, simulator);
                None
            }
            PointerEvent::Up(position) => self.finish(position, viewport, simulator),
            PointerEvent::Wheel { position, delta_y } => {
                let factor = 2.0_f32.powf(-delta_y * self.config.wheel_sensitivity);
                viewport.zoom_by_at(factor, position);
                None
            }
            PointerEvent::Leave => {
                self.release(simulator);
                None
            }
        }
    }

    fn press(
        &mut self,
        position: Pos2,
        viewport: &ViewportController,
        simulator: &mut ForceSimulator,
    ) {
        let Some(index) = node_at(simulator.nodes(), viewport, position) else {
            self.gesture = Gesture::Panning {
                origin: position,
                last: position,
                moved: false,
            };
            return;
        };

        let node = &simulator.nodes()[index];
        let node_id = node.id.clone();
        let node_position = node.position;
        let grab_offset = node_position - viewport.screen_to_world(position);
        if simulator.pin(&node_id, node_position) {
            tracing::trace!(id = %node_id, "drag started");
            self.gesture = Gesture::Dragging {
                node_id,
                origin: position,
                grab_offset,
                moved: false,
            };
        }
    }

    fn drag_to(
        &mut self,
        position: Pos2,
        viewport: &mut ViewportController,
        simulator: &mut ForceSimulator,
    ) {
        let threshold = self.config.click_threshold;
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Panning {
                origin,
                last,
                moved,
            } => {
                let delta = position - *last;
                viewport.pan_by(delta.x, delta.y);
                *last = position;
                *moved |= origin.distance(position) > threshold;
            }
            Gesture::Dragging {
                node_id,
                origin,
                grab_offset,
                moved,
            } => {
                *moved |= origin.distance(position) > threshold;
                if !*moved {
                    return;
                }
                let target = viewport.screen_to_world(position) + *grab_offset;
                if !simulator.pin(node_id, target) {
                    tracing::debug!(id = %node_id, "dragged node vanished, dropping drag");
                    self.gesture = Gesture::Idle;
                }
            }
        }
    }

    fn finish(
        &mut self,
        position: Pos2,
        viewport: &mut ViewportController,
        simulator: &mut ForceSimulator,
    ) -> Option<SelectionEvent> {
        self.drag_to(position, viewport, simulator);
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        match gesture {
            Gesture::Idle => None,
            Gesture::Panning { moved: true, .. } => None,
            Gesture::Panning { moved: false, .. } => self.clear_selection(),
            Gesture::Dragging { node_id, moved, .. } => {
                simulator.unpin(&node_id);
                if moved {
                    None
                } else {
                    self.select(node_id, position, viewport.size())
                }
            }
        }
    }

    /// Ends any gesture in progress, releasing a dragged node.
    fn release(&mut self, simulator: &mut ForceSimulator) {
        if let Gesture::Dragging { node_id, .. } =
            std::mem::replace(&mut self.gesture, Gesture::Idle)
        {
            simulator.unpin(&node_id);
        }
    }

    /// Drops the current gesture without touching the simulator. Used when the
    /// node set it referred to has been replaced.
    pub fn cancel(&mut self) {
        self.gesture = Gesture::Idle;
    }

    fn select(&mut self, node_id: String, pointer: Pos2, surface: Vec2) -> Option<SelectionEvent> {
        if self.selection.selected_node_id.as_deref() == Some(node_id.as_str()) {
            return None;
        }

        let anchor = self.panel_anchor(pointer, surface);
        tracing::debug!(id = %node_id, "node selected");
        self.selection = SelectionState {
            selected_node_id: Some(node_id.clone()),
            anchor,
        };
        Some(SelectionEvent::NodeSelected {
            id: node_id,
            anchor,
        })
    }

    pub fn clear_selection(&mut self) -> Option<SelectionEvent> {
        self.selection.selected_node_id.take()?;
        self.selection = SelectionState::default();
        Some(SelectionEvent::SelectionCleared)
    }

    /// Top-left corner for the summary panel, kept inside the surface.
    fn panel_anchor(&self, pointer: Pos2, surface: Vec2) -> Pos2 {
        let config = &self.config;
        let max_x = (surface.x - config.panel_width - config.panel_margin).max(config.panel_margin);
        let max_y =
            (surface.y - config.panel_height - config.panel_margin).max(config.panel_margin);
        pos2(
            (pointer.x + config.panel_offset).clamp(config.panel_margin, max_x),
            (pointer.y + config.panel_offset).clamp(config.panel_margin, max_y),
        )
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use eframe::egui::vec2;

    use super::*;
    use crate::contacts::ContactRecord;
    use crate::graph::model::GraphLink;
    use crate::graph::simulator::SimulationConfig;

    struct Rig {
        viewport: ViewportController,
        simulator: ForceSimulator,
        controller: InteractionController,
    }

    impl Rig {
        /// Two nodes: `a` (strength 100, radius 30) at (200, 200) and `b`
        /// (strength 0, radius 20) at (600, 400), on an 800x600 surface.
        fn new() -> Self {
            let viewport = ViewportController::new(vec2(800.0, 600.0));
            let mut simulator = ForceSimulator::new(SimulationConfig::default(), viewport.center());
            let records = [
                ContactRecord::new("a", "Ada").with_strength(100),
                ContactRecord::new("b", "Bo"),
            ];
            let nodes = records.iter().map(GraphNode::from_record).collect();
            let seeds = HashMap::from([
                ("a".to_owned(), pos2(200.0, 200.0)),
                ("b".to_owned(), pos2(600.0, 400.0)),
            ]);
            simulator.start_seeded(nodes, &[GraphLink::new("a", "b", 1.0)], &seeds);
            Self {
                viewport,
                simulator,
                controller: InteractionController::default(),
            }
        }

        fn send(&mut self, event: PointerEvent) -> Option<SelectionEvent> {
            self.controller
                .handle(event, &mut self.viewport, &mut self.simulator)
        }

        fn click(&mut self, position: Pos2) -> Option<SelectionEvent> {
            self.send(PointerEvent::Down(position));
            self.send(PointerEvent::Up(position))
        }
    }

    #[test]
    fn hit_test_uses_rendered_radius_and_scale() {
        let mut rig = Rig::new();
        assert_eq!(node_at(rig.simulator.nodes(), &rig.viewport, pos2(229.0, 200.0)), Some(0));
        assert_eq!(node_at(rig.simulator.nodes(), &rig.viewport, pos2(231.0, 200.0)), None);
        assert_eq!(node_at(rig.simulator.nodes(), &rig.viewport, pos2(615.0, 410.0)), Some(1));

        rig.viewport.zoom_by_at(2.0, Pos2::ZERO);
        assert_eq!(node_at(rig.simulator.nodes(), &rig.viewport, pos2(455.0, 400.0)), Some(0));
    }

    #[test]
    fn click_on_node_selects_with_clamped_anchor() {
        let mut rig = Rig::new();
        let event = rig.click(pos2(600.0, 400.0));

        // 800 - 220 - 10 = 570, 600 - 200 - 10 = 390
        let expected = SelectionEvent::NodeSelected {
            id: "b".to_owned(),
            anchor: pos2(570.0, 390.0),
        };
        assert_eq!(event, Some(expected));
        assert_eq!(rig.controller.selection().selected_node_id.as_deref(), Some("b"));
        assert!(rig.controller.is_idle());
    }

    #[test]
    fn anchor_stays_inside_a_tiny_surface() {
        let mut rig = Rig::new();
        rig.viewport.resize(vec2(100.0, 100.0));
        rig.click(pos2(200.0, 200.0));
        assert_eq!(rig.controller.selection().anchor, pos2(10.0, 10.0));
    }

    #[test]
    fn clicking_selected_node_again_changes_nothing() {
        let mut rig = Rig::new();
        rig.click(pos2(200.0, 200.0));
        let before = rig.controller.selection().clone();

        assert_eq!(rig.click(pos2(205.0, 195.0)), None);
        assert_eq!(rig.controller.selection(), &before);
    }

    #[test]
    fn background_click_clears_selection() {
        let mut rig = Rig::new();
        assert_eq!(rig.click(pos2(50.0, 550.0)), None);

        rig.click(pos2(200.0, 200.0));
        assert_eq!(
            rig.click(pos2(50.0, 550.0)),
            Some(SelectionEvent::SelectionCleared)
        );
        assert_eq!(rig.controller.selection(), &SelectionState::default());
    }

    #[test]
    fn drag_pins_then_releases_without_selecting() {
        let mut rig = Rig::new();
        rig.send(PointerEvent::Down(pos2(205.0, 200.0)));
        assert_eq!(rig.controller.dragged_node(), Some("a"));
        assert_eq!(
            rig.simulator.node("a").and_then(|node| node.pinned),
            Some(pos2(200.0, 200.0))
        );

        rig.send(PointerEvent::Move(pos2(305.0, 260.0)));
        assert_eq!(
            rig.simulator.node("a").and_then(|node| node.pinned),
            Some(pos2(300.0, 260.0))
        );

        let event = rig.send(PointerEvent::Up(pos2(305.0, 260.0)));
        assert_eq!(event, None);
        assert_eq!(rig.simulator.node("a").and_then(|node| node.pinned), None);
        assert!(rig.controller.selection().selected_node_id.is_none());
        assert!(rig.controller.is_idle());
    }

    #[test]
    fn background_drag_pans_viewport() {
        let mut rig = Rig::new();
        rig.send(PointerEvent::Down(pos2(400.0, 50.0)));
        rig.send(PointerEvent::Move(pos2(420.0, 40.0)));
        rig.send(PointerEvent::Move(pos2(450.0, 70.0)));
        let event = rig.send(PointerEvent::Up(pos2(450.0, 70.0)));

        assert_eq!(event, None);
        assert_eq!(rig.viewport.transform().translate, vec2(50.0, 20.0));
    }

    #[test]
    fn wheel_zooms_around_pointer() {
        let mut rig = Rig::new();
        let pointer = pos2(600.0, 400.0);
        rig.send(PointerEvent::Wheel {
            position: pointer,
            delta_y: -500.0,
        });

        assert!((rig.viewport.transform().scale - 2.0).abs() < 1.0e-4);
        assert!((rig.viewport.screen_to_world(pointer) - pointer).length() < 1.0e-3);
    }

    #[test]
    fn out_of_order_events_are_ignored() {
        let mut rig = Rig::new();
        assert_eq!(rig.send(PointerEvent::Up(pos2(200.0, 200.0))), None);
        assert_eq!(rig.send(PointerEvent::Move(pos2(10.0, 10.0))), None);
        assert_eq!(rig.send(PointerEvent::Leave), None);
        assert!(rig.controller.is_idle());
        assert_eq!(rig.viewport.transform().translate, Vec2::ZERO);
    }

    #[test]
    fn leave_during_drag_releases_node() {
        let mut rig = Rig::new();
        rig.send(PointerEvent::Down(pos2(600.0, 400.0)));
        rig.send(PointerEvent::Leave);
        assert!(rig.controller.is_idle());
        assert_eq!(rig.simulator.node("b").and_then(|node| node.pinned), None);
    }

    #[test]
    fn drag_of_vanished_node_returns_to_idle() {
        let mut rig = Rig::new();
        rig.send(PointerEvent::Down(pos2(600.0, 400.0)));
        rig.simulator.start(Vec::new(), &[]);

        rig.send(PointerEvent::Move(pos2(700.0, 500.0)));
        assert!(rig.controller.is_idle());
        assert_eq!(rig.send(PointerEvent::Up(pos2(700.0, 500.0))), None);
    }
}
