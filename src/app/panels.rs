use eframe::egui::{self, Align, Context, Layout, RichText, Ui, vec2};

use contact_graph::contacts::ContactRecord;
use contact_graph::graph::{Filter, GraphSession, SimulationStatus};

use crate::config::Settings;

use super::render_utils::category_color;
use super::{PointerTracker, ViewModel};

impl ViewModel {
    pub(super) fn new(records: Vec<ContactRecord>, settings: &Settings) -> Self {
        let session = GraphSession::start(
            records,
            settings.filter.clone(),
            settings.enrichment.builder(),
            settings.options,
        );
        let categories = session.categories();

        Self {
            categories,
            selected_categories: settings.filter.categories.clone(),
            min_strength: settings.filter.min_strength,
            search: String::new(),
            pointer: PointerTracker::default(),
            session,
        }
    }

    pub(super) fn replace_records(&mut self, records: Vec<ContactRecord>) {
        if let Some(event) = self.session.set_records(records) {
            tracing::debug!(?event, "selection changed by reload");
        }
        self.categories = self.session.categories();
    }

    pub(super) fn show(
        &mut self,
        ctx: &Context,
        settings: &Settings,
        reload_requested: &mut bool,
        is_reloading: bool,
        reload_error: Option<&str>,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("contact-graph");
                    ui.separator();
                    ui.label(format!("records: {}", settings.records_path.display()));
                    let reload_button =
                        ui.add_enabled(!is_reloading, egui::Button::new("Reload contacts"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    if let Some(error) = reload_error {
                        ui.colored_label(egui::Color32::from_rgb(230, 110, 100), error);
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "nodes: {}  links: {}",
                            self.session.nodes().len(),
                            self.session.links().len()
                        ));
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| self.draw_controls(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));
    }

    fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Filter");
        ui.add_space(4.0);

        ui.label("Categories (none checked shows all)");
        for category in &self.categories {
            let mut checked = self.selected_categories.contains(category);
            let text = RichText::new(category.as_str()).color(category_color(category));
            if ui.checkbox(&mut checked, text).changed() {
                if checked {
                    self.selected_categories.insert(category.clone());
                } else {
                    self.selected_categories.remove(category);
                }
            }
        }

        ui.add_space(6.0);
        ui.add(egui::Slider::new(&mut self.min_strength, 0..=100).text("min strength"));

        let filter = Filter {
            categories: self.selected_categories.clone(),
            min_strength: self.min_strength,
        };
        if let Some(event) = self.session.set_filter(filter) {
            tracing::debug!(?event, "selection changed by filter");
        }

        ui.separator();
        ui.heading("Search");
        ui.add(egui::TextEdit::singleline(&mut self.search).hint_text("name"));

        ui.separator();
        ui.heading("View");
        ui.horizontal(|ui| {
            if ui.button("Zoom in").clicked() {
                self.session.zoom_in();
            }
            if ui.button("Zoom out").clicked() {
                self.session.zoom_out();
            }
            if ui.button("Reset").clicked() {
                self.session.reset_view();
            }
        });
        ui.label(format!("zoom: {:.0}%", self.session.viewport().zoom_percent()));

        ui.separator();
        let state = self.session.simulation_state();
        let status = match self.session.status() {
            SimulationStatus::Idle => "idle",
            SimulationStatus::Running => "running",
            SimulationStatus::Settled => "settled",
        };
        ui.small(format!(
            "layout {status}  alpha {:.3}  ticks {}",
            state.alpha, state.tick_count
        ));
    }

    /// Summary card for the selected contact, placed at the engine's anchor.
    pub(super) fn draw_summary(&mut self, ctx: &Context, origin: egui::Pos2) {
        let selection = self.session.selection().clone();
        let Some(selected_id) = selection.selected_node_id else {
            return;
        };
        let Some(node) = self.session.node(&selected_id) else {
            return;
        };

        let connections = self
            .session
            .links()
            .iter()
            .filter(|link| link.source_id == selected_id || link.target_id == selected_id)
            .count();
        let label = node.label.clone();
        let category = node.category.clone();
        let strength = node.connection_strength;
        let tags = node.tags.join(", ");
        let image_ref = node.image_ref.clone();
        let config = self.session_panel_size();

        let mut close = false;
        egui::Area::new(egui::Id::new("contact_summary"))
            .fixed_pos(origin + selection.anchor.to_vec2())
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_min_size(config);
                    ui.set_max_size(config);
                    ui.horizontal(|ui| {
                        ui.label(RichText::new(label).strong());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("x").clicked() {
                                close = true;
                            }
                        });
                    });
                    ui.colored_label(category_color(&category), category);
                    ui.label(format!("Connection strength: {strength}"));
                    ui.add(egui::ProgressBar::new(f32::from(strength) / 100.0));
                    ui.label(format!("Connections in view: {connections}"));
                    if !tags.is_empty() {
                        ui.label(format!("Tags: {tags}"));
                    }
                    if let Some(image_ref) = image_ref {
                        ui.small(format!("Image: {image_ref}"));
                    }
                });
            });

        if close && self.session.close_selection().is_some() {
            tracing::debug!("summary closed");
        }
    }

    fn session_panel_size(&self) -> egui::Vec2 {
        let config = self.session.interaction_config();
        vec2(config.panel_width, config.panel_height)
    }
}
