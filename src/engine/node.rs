use eframe::egui::{Pos2, Rect, vec2};

use crate::feed::RewalkPhase;

/// Insertion-ordered key of a node inside the graph index.
pub type NodeId = u64;

#[derive(Clone, Debug)]
pub struct Node {
    pub hash: String,
    pub tag: String,
    pub value: i64,
    pub timestamp: i64,
    pub pos: Pos2,
    pub trunk: Option<NodeId>,
    pub branch: Option<NodeId>,
    pub approves: u32,
    pub is_tip: bool,
    pub is_value_tx: bool,
    pub is_milestone: bool,
    pub is_confirmed: bool,
    pub is_mouse_over: bool,
    pub is_filtered: bool,
    pub was_retained: bool,
    /// Frames left in the "just arrived" highlight.
    pub is_new: u32,
    /// Frames left in the "just got approved" highlight.
    pub new_approver_pulse: u32,
    pub rewalk: Option<RewalkPhase>,
    pub rewalk_token: u64,
    pub arrival: f64,
}

impl Node {
    pub fn scale_factor(&self) -> f32 {
        1.0 + 0.2 * self.approves as f32
    }

    /// Screen-space square of the node for a given horizontal pan.
    pub fn bounds(&self, node_size: f32, pan_x: f32) -> Rect {
        let side = node_size * self.scale_factor();
        Rect::from_center_size(Pos2::new(self.pos.x + pan_x, self.pos.y), vec2(side, side))
    }

    pub fn references(&self) -> impl Iterator<Item = NodeId> {
        let branch = self.branch.filter(|branch| Some(*branch) != self.trunk);
        self.trunk.into_iter().chain(branch)
    }
}
