use eframe::egui::{self, Align, Color32, Context, Layout};

use crate::engine::{Event, RetentionState};

use super::super::TangleApp;

impl TangleApp {
    pub(in crate::app) fn draw_top_bar(&mut self, ctx: &Context, now: f64) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("tangle-viz");
                    ui.separator();

                    let (status, color) = if self.connected {
                        ("connected", Color32::from_rgb(126, 211, 110))
                    } else {
                        ("disconnected", Color32::from_rgb(226, 96, 96))
                    };
                    ui.colored_label(color, status);
                    ui.weak(self.feed_url.as_str());
                    ui.separator();

                    ui.label("Tag filter");
                    let filter = ui.add(
                        egui::TextEdit::singleline(&mut self.filter)
                            .hint_text("substring")
                            .desired_width(180.0),
                    );
                    if filter.changed() {
                        self.engine.dispatch(Event::Filter(self.filter.clone()), now);
                    }

                    let pause_label = match self.engine.retention_state() {
                        RetentionState::Retaining => "Resume",
                        RetentionState::Live | RetentionState::Replaying => "Pause",
                    };
                    if ui.button(pause_label).clicked() {
                        self.engine.dispatch(Event::TogglePause, now);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        if let Some(text) = self.fps_display_text() {
                            ui.monospace(text);
                        }
                    });
                });
            });
    }
}
