use eframe::egui::{RichText, Ui};

use crate::util::{format_span, short_hash};

use super::super::TangleApp;

impl TangleApp {
    pub(in crate::app) fn draw_details(&self, ui: &mut Ui, now: f64) {
        let stats = self.engine.stats();
        ui.heading("Graph");
        ui.add_space(4.0);
        ui.label(format!("Transactions: {}", stats.total));
        ui.label(format!("Tips: {}", stats.tips));
        ui.label(format!("Value transactions: {}", stats.value_txs));
        ui.label(format!("Milestones: {}", stats.milestones));
        ui.label(format!("Confirmed: {}", stats.confirmed));
        ui.label(format!(
            "Throughput: {:.2} tx/s (speed {:.2})",
            self.engine.throughput(),
            self.engine.current_move_speed()
        ));

        ui.separator();
        ui.heading("Transaction");
        ui.add_space(4.0);

        let Some(node) = self.engine.selected_node() else {
            ui.label("Hover a transaction to inspect it.");
            return;
        };

        ui.label(RichText::new(short_hash(&node.hash)).strong().monospace());
        ui.small(node.hash.as_str());
        ui.add_space(6.0);

        let tag = if node.tag.is_empty() { "-" } else { node.tag.as_str() };
        ui.label(format!("Tag: {tag}"));
        ui.label(format!("Value: {}", node.value));
        ui.label(format!("Timestamp: {}", node.timestamp));
        ui.label(format!("Approvers: {}", node.approves));
        ui.label(format!("Seen: {} ago", format_span(now - node.arrival)));

        let flags = [
            ("tip", node.is_tip),
            ("milestone", node.is_milestone),
            ("confirmed", node.is_confirmed),
            ("value transaction", node.is_value_tx),
            ("replayed", node.was_retained),
        ];
        let active = flags
            .iter()
            .filter(|(_, on)| *on)
            .map(|(label, _)| *label)
            .collect::<Vec<_>>();
        if !active.is_empty() {
            ui.add_space(6.0);
            ui.label(active.join(", "));
        }
    }
}
