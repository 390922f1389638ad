use eframe::egui::Pos2;

use super::frame::in_view;
use super::node::NodeId;
use super::{DragCapture, Engine, tag_matches};

/// Pointer travel below this still counts as a click.
const CLICK_SLOP: f32 = 3.0;

impl Engine {
    pub(in crate::engine) fn pointer_down(&mut self, pos: Pos2) {
        self.view.drag = Some(DragCapture {
            origin: pos,
            moved: false,
        });
    }

    pub(in crate::engine) fn pointer_move(&mut self, pos: Pos2) {
        if let Some(drag) = self.view.drag.as_mut() {
            let offset = pos.x - drag.origin.x;
            if offset.abs() > CLICK_SLOP {
                drag.moved = true;
            }
            if drag.moved {
                self.view.pan_x += offset * self.config.drag_damping;
            }
            return;
        }

        self.hover_at(pos);
    }

    pub(in crate::engine) fn pointer_up(&mut self, pos: Pos2) {
        let Some(drag) = self.view.drag.take() else {
            return;
        };

        if !drag.moved && self.hit_test(pos).is_none() {
            self.view.selected = None;
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.view.drag.is_some()
    }

    pub(in crate::engine) fn wheel(&mut self, delta: f32) {
        if delta > 0.0 {
            self.view.pan_x += self.config.wheel_step;
        } else if delta < 0.0 {
            self.view.pan_x -= self.config.wheel_step;
        }
    }

    /// Flags nodes whose tag does not contain `word` (ignoring case). Only
    /// affects coloring.
    pub fn set_filter_text(&mut self, word: &str) {
        self.view.filter = word.trim().to_lowercase();
        let filter = self.view.filter.as_str();
        for node in self.graph.nodes_mut() {
            node.is_filtered = !tag_matches(&node.tag, filter);
        }
    }

    /// First drawn node under `pos`; nodes outside the view are never hit.
    fn hit_test(&self, pos: Pos2) -> Option<NodeId> {
        let size = self.config.node_size;
        let pan_x = self.view.pan_x;
        let width = self.view.viewport.x;
        self.graph
            .iter()
            .filter(|(_, node)| in_view(node.pos.x + pan_x, width))
            .find(|(_, node)| node.bounds(size, pan_x).contains(pos))
            .map(|(id, _)| id)
    }

    fn hover_at(&mut self, pos: Pos2) {
        let hit = self.hit_test(pos);
        if hit == self.view.hovered {
            return;
        }

        if let Some(previous) = self.view.hovered.and_then(|id| self.graph.get_mut(id)) {
            previous.is_mouse_over = false;
        }
        if let Some(node) = hit.and_then(|id| self.graph.get_mut(id)) {
            node.is_mouse_over = true;
        }

        self.view.hovered = hit;
        if hit.is_some() {
            self.view.selected = hit;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::tests::{engine, feed, tx};
    use crate::engine::{Event, Node};
    use crate::feed::{FeedMessage, Transaction};

    use super::*;

    fn center_of(engine: &Engine, hash: &str) -> Pos2 {
        let node = engine.graph().by_hash(hash).unwrap();
        node.bounds(engine.config.node_size, engine.pan_x()).center()
    }

    fn hovered(engine: &Engine) -> Vec<&Node> {
        engine
            .graph()
            .iter()
            .map(|(_, node)| node)
            .filter(|node| node.is_mouse_over)
            .collect()
    }

    #[test]
    fn hover_selects_a_single_node() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        feed(&mut engine, FeedMessage::Tx(tx("B", "A", "")), 0.0);
        // children land right of their parent, possibly past the edge
        engine.dispatch(Event::Wheel(-1.0), 0.0);

        engine.dispatch(Event::PointerMove(center_of(&engine, "A")), 0.0);
        assert_eq!(hovered(&engine).len(), 1);
        assert_eq!(engine.selected_node().unwrap().hash, "A");

        engine.dispatch(Event::PointerMove(center_of(&engine, "B")), 0.0);
        let over = hovered(&engine);
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].hash, "B");
        assert_eq!(engine.selected_node().unwrap().hash, "B");

        engine.dispatch(Event::PointerMove(Pos2::new(1.0, 1.0)), 0.0);
        assert!(hovered(&engine).is_empty());
        assert_eq!(engine.selected_node().unwrap().hash, "B");

        engine.dispatch(Event::PointerDown(Pos2::new(1.0, 1.0)), 0.0);
        engine.dispatch(Event::PointerUp(Pos2::new(1.0, 1.0)), 0.0);
        assert!(engine.selected_node().is_none());
    }

    #[test]
    fn nodes_beyond_the_view_cannot_be_hovered() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        feed(&mut engine, FeedMessage::Tx(tx("B", "A", "")), 0.0);
        let b = engine.graph.id_of("B").unwrap();
        engine.graph.get_mut(b).unwrap().pos.x = 819.6;

        engine.dispatch(Event::PointerMove(center_of(&engine, "A")), 0.0);
        assert_eq!(engine.selected_node().unwrap().hash, "A");

        let hidden = center_of(&engine, "B");
        let scene = engine.frame(0.0);
        assert!(scene.nodes.iter().all(|shape| shape.id != b));
        engine.dispatch(Event::PointerMove(hidden), 0.0);
        assert!(hovered(&engine).is_empty());
        assert_eq!(engine.selected_node().unwrap().hash, "A");

        engine.dispatch(Event::Wheel(-1.0), 0.0);
        engine.dispatch(Event::PointerMove(center_of(&engine, "B")), 0.0);
        assert_eq!(engine.selected_node().unwrap().hash, "B");
    }

    #[test]
    fn hit_area_grows_with_approvals() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        let corner = center_of(&engine, "A") + eframe::egui::vec2(3.5, 0.0);

        engine.dispatch(Event::PointerMove(corner), 0.0);
        assert!(hovered(&engine).is_empty());

        for child in ["B", "C", "D"] {
            feed(&mut engine, FeedMessage::Tx(tx(child, "A", "")), 0.0);
        }
        engine.dispatch(Event::PointerMove(corner), 0.0);
        assert_eq!(engine.selected_node().unwrap().hash, "A");
    }

    #[test]
    fn dragging_pans_with_damping_without_moving_nodes() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        let x_before = engine.graph().by_hash("A").unwrap().pos.x;

        engine.dispatch(Event::PointerDown(Pos2::new(100.0, 300.0)), 0.0);
        assert!(engine.is_dragging());
        engine.dispatch(Event::PointerMove(Pos2::new(140.0, 300.0)), 0.0);
        assert_eq!(engine.pan_x(), 2.0);
        engine.dispatch(Event::PointerMove(Pos2::new(180.0, 320.0)), 0.0);
        assert_eq!(engine.pan_x(), 6.0);
        engine.dispatch(Event::PointerUp(Pos2::new(180.0, 320.0)), 0.0);
        assert!(!engine.is_dragging());

        engine.dispatch(Event::PointerMove(Pos2::new(300.0, 300.0)), 0.0);
        assert_eq!(engine.pan_x(), 6.0);
        assert_eq!(engine.graph().by_hash("A").unwrap().pos.x, x_before);
    }

    #[test]
    fn wheel_pans_in_fixed_steps() {
        let mut engine = engine();
        engine.dispatch(Event::Wheel(3.2), 0.0);
        engine.dispatch(Event::Wheel(0.4), 0.0);
        assert_eq!(engine.pan_x(), 80.0);
        engine.dispatch(Event::Wheel(-12.0), 0.0);
        engine.dispatch(Event::Wheel(0.0), 0.0);
        assert_eq!(engine.pan_x(), 40.0);
    }

    #[test]
    fn filter_is_case_insensitive_and_non_destructive() {
        let mut engine = engine();
        engine.frame(0.0);
        for (hash, tag) in [("A", "IOTASPAM"), ("B", "hello"), ("C", "")] {
            let tx = Transaction {
                tag: tag.to_owned(),
                ..tx(hash, "", "")
            };
            feed(&mut engine, FeedMessage::Tx(tx), 0.1);
        }

        engine.dispatch(Event::Filter(" Spam ".into()), 0.2);
        let filtered = |engine: &Engine, hash: &str| engine.graph().by_hash(hash).unwrap().is_filtered;
        assert!(!filtered(&engine, "A"));
        assert!(filtered(&engine, "B"));
        assert!(filtered(&engine, "C"));

        feed(
            &mut engine,
            FeedMessage::Tx(Transaction {
                tag: "MORESPAM".into(),
                ..tx("D", "", "")
            }),
            0.3,
        );
        assert!(!filtered(&engine, "D"));

        engine.frame(0.5);
        assert_eq!(engine.stats().total, 4);

        engine.set_filter_text("");
        assert!(engine.graph().iter().all(|(_, node)| !node.is_filtered));
        engine.frame(1.0);
        assert_eq!(engine.stats().total, 4);
    }
}
