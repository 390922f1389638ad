use eframe::egui::{self, Rect, Sense, Ui};

use crate::engine::Event;

use super::super::TangleApp;
use super::super::render_utils::{draw_background, paint_scene};

impl TangleApp {
    pub(in crate::app) fn draw_canvas(&mut self, ui: &mut Ui, now: f64) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.dispatch(Event::Resize(rect.size()), now);
        self.forward_pointer(ui, rect, &response, now);

        draw_background(&painter, rect, self.engine.pan_x());
        let scene = self.engine.frame(now);
        paint_scene(&painter, rect, scene);
    }

    /// Translates egui pointer input into canvas-local engine events.
    fn forward_pointer(&mut self, ui: &Ui, rect: Rect, response: &egui::Response, now: f64) {
        let (pointer, pressed, released, moving, scroll) = ui.input(|input| {
            (
                input.pointer.latest_pos(),
                input.pointer.primary_pressed(),
                input.pointer.primary_released(),
                input.pointer.is_moving(),
                input.raw_scroll_delta.y,
            )
        });
        let Some(pointer) = pointer else {
            return;
        };
        let local = (pointer - rect.min).to_pos2();

        if pressed && response.hovered() {
            self.engine.dispatch(Event::PointerDown(local), now);
        }
        if moving && (response.hovered() || self.engine.is_dragging()) {
            self.engine.dispatch(Event::PointerMove(local), now);
        }
        if released {
            self.engine.dispatch(Event::PointerUp(local), now);
        }
        if response.hovered() && scroll.abs() > f32::EPSILON {
            self.engine.dispatch(Event::Wheel(scroll), now);
        }
    }
}
