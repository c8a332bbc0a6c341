use std::collections::HashMap;

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Response, Sense, Stroke, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use contact_graph::graph::{PointerEvent, SelectionEvent};

use super::ViewModel;
use super::render_utils::{Emphasis, draw_background, initials, node_fill};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    /// Turns this frame's egui pointer input into engine events, in
    /// coordinates local to `rect`.
    fn pointer_events(&mut self, ui: &Ui, rect: Rect, response: &Response) -> Vec<PointerEvent> {
        let (pressed, released, hover, scroll) = ui.input(|input| {
            (
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.hover_pos(),
                input.raw_scroll_delta.y,
            )
        });
        let local = hover.map(|position| (position - rect.min).to_pos2());
        let inside = hover.is_some_and(|position| rect.contains(position));
        let tracker = &mut self.pointer;
        let mut events = Vec::new();

        if pressed
            && response.hovered()
            && let Some(position) = local
        {
            events.push(PointerEvent::Down(position));
            tracker.pressed = true;
        }

        if local != tracker.last {
            match local {
                Some(position) if tracker.pressed || inside => {
                    events.push(PointerEvent::Move(position));
                }
                None if tracker.pressed => {
                    events.push(PointerEvent::Leave);
                    tracker.pressed = false;
                }
                _ => {}
            }
        }

        if released && tracker.pressed {
            if let Some(position) = local {
                events.push(PointerEvent::Up(position));
            } else {
                events.push(PointerEvent::Leave);
            }
            tracker.pressed = false;
        }

        if scroll != 0.0
            && response.hovered()
            && let Some(position) = local
        {
            events.push(PointerEvent::Wheel {
                position,
                delta_y: -scroll,
            });
        }

        tracker.last = local;
        events
    }

    fn search_matches(&self) -> Option<Vec<bool>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }
        let matcher = SkimMatcherV2::default();
        Some(
            self.session
                .nodes()
                .iter()
                .map(|node| fuzzy_match_score(&matcher, &node.label, query).is_some())
                .collect(),
        )
    }

    pub(super) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        self.session.resize(rect.size());

        for event in self.pointer_events(ui, rect, &response) {
            if let Some(SelectionEvent::SelectionCleared) = self.session.handle_pointer(event) {
                tracing::debug!("selection cleared");
            }
        }

        let moving = self.session.frame();
        if moving || self.session.dragged_node().is_some() || self.pointer.pressed {
            ui.ctx().request_repaint();
        }

        let painter = ui.painter_at(rect);
        let transform = self.session.transform();
        draw_background(&painter, rect, transform);

        if self.session.nodes().is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No contacts match the current filter.",
                FontId::proportional(16.0),
                Color32::from_gray(170),
            );
            return;
        }

        let viewport = self.session.viewport();
        let to_screen = |world: Pos2| rect.min + viewport.world_to_screen(world).to_vec2();
        let screen_positions = self
            .session
            .nodes()
            .iter()
            .map(|node| (node.id.as_str(), to_screen(node.position)))
            .collect::<HashMap<_, _>>();

        let selected = self.session.selection().selected_node_id.as_deref();
        let matches = self.search_matches();
        let search_active = matches.as_ref().is_some_and(|hits| hits.contains(&true));

        for link in self.session.links() {
            let (Some(&start), Some(&end)) = (
                screen_positions.get(link.source_id.as_str()),
                screen_positions.get(link.target_id.as_str()),
            ) else {
                continue;
            };
            let touches_selection = selected
                .is_some_and(|id| id == link.source_id || id == link.target_id);
            let width = ((0.8 + link.weight * 0.6) * transform.scale.sqrt()).clamp(0.5, 5.0);
            let color = if touches_selection {
                Color32::from_rgb(241, 146, 94)
            } else if selected.is_some() || search_active {
                Color32::from_rgba_unmultiplied(80, 90, 104, 110)
            } else {
                Color32::from_rgba_unmultiplied(120, 128, 140, 180)
            };
            painter.line_segment([start, end], Stroke::new(width, color));
        }

        let hovered_id = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|position| rect.contains(*position))
            .and_then(|position| self.session.hovered((position - rect.min).to_pos2()))
            .map(|node| node.id.clone());
        if hovered_id.is_some() {
            ui.output_mut(|output| output.cursor_icon = egui::CursorIcon::PointingHand);
        }

        let dragged = self.session.dragged_node();
        let selected_color = Color32::from_rgb(245, 206, 93);
        let show_labels = transform.scale >= 0.6;

        for (index, node) in self.session.nodes().iter().enumerate() {
            let position = screen_positions[node.id.as_str()];
            let radius = node.radius() * transform.scale;
            if !rect.expand(radius + 24.0).contains(position) {
                continue;
            }

            let is_selected = selected == Some(node.id.as_str());
            let is_hovered = hovered_id.as_deref() == Some(node.id.as_str());
            let is_dragged = dragged == Some(node.id.as_str());
            let is_match = matches
                .as_ref()
                .is_some_and(|hits| hits.get(index).copied().unwrap_or(false));

            let emphasis = if search_active && !is_match {
                Emphasis::Faded
            } else if is_hovered || is_dragged {
                Emphasis::Hot
            } else {
                Emphasis::Normal
            };
            painter.circle_filled(position, radius, node_fill(&node.category, emphasis));

            let stroke = if is_selected {
                Stroke::new(3.0, selected_color)
            } else if is_match && search_active {
                Stroke::new(2.0, Color32::WHITE)
            } else {
                Stroke::new(1.0, Color32::from_rgba_unmultiplied(10, 12, 16, 200))
            };
            painter.circle_stroke(position, radius, stroke);

            if radius >= 8.0 {
                painter.text(
                    position,
                    Align2::CENTER_CENTER,
                    initials(&node.label),
                    FontId::proportional((radius * 0.7).clamp(8.0, 22.0)),
                    Color32::from_gray(245),
                );
            }
            if show_labels || is_selected || is_hovered {
                painter.text(
                    position + egui::vec2(0.0, radius + 4.0),
                    Align2::CENTER_TOP,
                    &node.label,
                    FontId::proportional(12.0),
                    Color32::from_gray(210),
                );
            }
        }

        self.draw_summary(ui.ctx(), rect.min);
    }
}
