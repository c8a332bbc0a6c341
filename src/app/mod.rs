use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Pos2};

use contact_graph::contacts::{ContactRecord, load_records};
use contact_graph::graph::GraphSession;

use crate::config::Settings;

mod panels;
mod render_utils;
mod view;

type LoadResult = Result<Vec<ContactRecord>, String>;

pub struct ContactGraphApp {
    settings: Settings,
    state: AppState,
    reload_rx: Option<Receiver<LoadResult>>,
    reload_error: Option<String>,
}

enum AppState {
    Loading { rx: Receiver<LoadResult> },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    session: GraphSession,
    categories: BTreeSet<String>,
    selected_categories: BTreeSet<String>,
    min_strength: u8,
    search: String,
    pointer: PointerTracker,
}

/// Remembers enough raw pointer state to turn egui input into engine events.
#[derive(Default)]
struct PointerTracker {
    last: Option<Pos2>,
    pressed: bool,
}

impl Drop for ViewModel {
    fn drop(&mut self) {
        self.session.stop();
    }
}

impl ContactGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let state = Self::start_load(settings.records_path.clone());
        Self {
            settings,
            state,
            reload_rx: None,
            reload_error: None,
        }
    }

    fn spawn_load(path: PathBuf) -> Receiver<LoadResult> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_records(&path).map_err(|error| format!("{error:#}"));
            if let Err(error) = &result {
                tracing::error!(%error, "failed to load contact records");
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(path: PathBuf) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(path),
        }
    }
}

impl eframe::App for ContactGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(Ok(records)) => {
                        transition = Some(AppState::Ready(Box::new(ViewModel::new(
                            records,
                            &self.settings,
                        ))));
                    }
                    Ok(Err(error)) => transition = Some(AppState::Error(error)),
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading contacts...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load contacts");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.settings.records_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(
                    ctx,
                    &self.settings,
                    &mut reload_requested,
                    is_reloading,
                    self.reload_error.as_deref(),
                );

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_error = None;
                    self.reload_rx = Some(Self::spawn_load(self.settings.records_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(Ok(records)) => model.replace_records(records),
                        Ok(Err(error)) => self.reload_error = Some(error),
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                            ctx.request_repaint();
                        }
                        Err(TryRecvError::Disconnected) => {
                            self.reload_error = Some("Background load worker disconnected".to_owned());
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
