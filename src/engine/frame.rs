use eframe::egui::{Pos2, Rect, pos2};

use crate::feed::RewalkPhase;
use crate::util::format_span;

use super::node::{Node, NodeId};
use super::retention::RetentionState;
use super::Engine;

/// Node fill, first match wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeStyle {
    Walk(RewalkPhase),
    MouseOver,
    Milestone,
    Confirmed,
    ApproverPulse,
    Filtered,
    Tip,
    ValueTx,
    Default,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeStyle {
    Walk,
    SelectedNeighbor,
    NewlyCreated,
    MouseOverNeighbor,
    TipNeighbor,
    Default,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeShape {
    pub id: NodeId,
    pub rect: Rect,
    pub style: NodeStyle,
    pub retained: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EdgeShape {
    pub from: Pos2,
    pub to: Pos2,
    pub style: EdgeStyle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OverlayText {
    pub pos: Pos2,
    pub text: String,
}

/// One frame worth of drawing: edges go beneath nodes, overlay on top.
#[derive(Debug, Default)]
pub struct FrameScene {
    pub edges: Vec<EdgeShape>,
    pub nodes: Vec<NodeShape>,
    pub overlay: Vec<OverlayText>,
}

impl FrameScene {
    fn clear(&mut self) {
        self.edges.clear();
        self.nodes.clear();
        self.overlay.clear();
    }
}

struct EdgeSource {
    pos: Pos2,
    in_view: bool,
    is_new: bool,
    is_tip: bool,
    is_selected: bool,
}

const OVERLAY_ORIGIN: Pos2 = pos2(12.0, 10.0);
const OVERLAY_LINE_HEIGHT: f32 = 16.0;

pub(super) fn in_view(x: f32, width: f32) -> bool {
    (0.0..=width).contains(&x)
}

fn node_style(node: &mut Node) -> NodeStyle {
    if let Some(phase) = node.rewalk {
        NodeStyle::Walk(phase)
    } else if node.is_mouse_over {
        NodeStyle::MouseOver
    } else if node.is_milestone {
        NodeStyle::Milestone
    } else if node.is_confirmed {
        NodeStyle::Confirmed
    } else if node.new_approver_pulse > 0 {
        node.new_approver_pulse -= 1;
        NodeStyle::ApproverPulse
    } else if node.is_filtered {
        NodeStyle::Filtered
    } else if node.is_tip {
        NodeStyle::Tip
    } else if node.is_value_tx {
        NodeStyle::ValueTx
    } else {
        NodeStyle::Default
    }
}

fn edge_style(source: &EdgeSource, target: &Node, target_selected: bool) -> EdgeStyle {
    if target.rewalk.is_some_and(RewalkPhase::marks_approver_edges) {
        EdgeStyle::Walk
    } else if source.is_selected || target_selected {
        EdgeStyle::SelectedNeighbor
    } else if source.is_new {
        EdgeStyle::NewlyCreated
    } else if target.is_mouse_over {
        EdgeStyle::MouseOverNeighbor
    } else if source.is_tip {
        EdgeStyle::TipNeighbor
    } else {
        EdgeStyle::Default
    }
}

impl Engine {
    /// Advances timers and paced replay to `now`, then redraws every live node.
    pub fn frame(&mut self, now: f64) -> &FrameScene {
        self.run_due_reverts(now);
        self.drain_replay(now);
        self.run_timers(now);

        self.scene.clear();
        let drift = if self.retention.movement_blocked() {
            0.0
        } else {
            self.move_speed
        };

        let mut ids = std::mem::take(&mut self.id_scratch);
        self.graph.ids_into(&mut ids);
        for &id in &ids {
            self.draw_node(id, drift);
        }
        self.id_scratch = ids;

        self.draw_overlay();
        &self.scene
    }

    fn draw_node(&mut self, id: NodeId, drift: f32) {
        let pan_x = self.view.pan_x;
        let width = self.view.viewport.x;
        let selected = self.view.selected;

        let Some(node) = self.graph.get_mut(id) else {
            return;
        };

        node.is_new = node.is_new.saturating_sub(1);
        if selected != Some(id) {
            node.pos.x -= drift;
        }

        let source = EdgeSource {
            pos: pos2(node.pos.x + pan_x, node.pos.y),
            in_view: in_view(node.pos.x + pan_x, width),
            is_new: node.is_new > 0,
            is_tip: node.is_tip,
            is_selected: selected == Some(id),
        };

        if source.in_view {
            self.scene.nodes.push(NodeShape {
                id,
                rect: node.bounds(self.config.node_size, pan_x),
                style: node_style(node),
                retained: node.was_retained,
            });
        }

        let mut targets = [None; 2];
        for (slot, target) in targets.iter_mut().zip(node.references()) {
            *slot = Some(target);
        }

        for target_id in targets.into_iter().flatten() {
            let Some(target) = self.graph.get_mut(target_id) else {
                continue;
            };

            let to = pos2(target.pos.x + pan_x, target.pos.y);
            if !source.in_view && !in_view(to.x, width) {
                continue;
            }

            let style = edge_style(&source, target, selected == Some(target_id));
            if style == EdgeStyle::NewlyCreated {
                target.new_approver_pulse = self.config.approver_pulse_frames;
            }
            self.scene.edges.push(EdgeShape {
                from: source.pos,
                to,
                style,
            });
        }
    }

    fn draw_overlay(&mut self) {
        let stats = &self.stats;
        let status = match self.retention.state() {
            RetentionState::Live => format!("{:.2} tx/s", self.throughput.average()),
            RetentionState::Retaining => {
                format!("paused, {} events retained", self.retention.retained())
            }
            RetentionState::Replaying => {
                format!("replaying, {} remaining", self.retention.remaining())
            }
        };

        let lines = [
            format!("time span {}", format_span(stats.time_span_secs())),
            format!("in view {} of {} txs", stats.in_view, stats.total),
            format!(
                "tips {:.2}%  approved {:.2}%  confirmed {:.2}%",
                stats.tip_pct, stats.approved_pct, stats.confirmed_pct
            ),
            status,
        ];

        for (row, text) in lines.into_iter().enumerate() {
            self.scene.overlay.push(OverlayText {
                pos: pos2(
                    OVERLAY_ORIGIN.x,
                    OVERLAY_ORIGIN.y + row as f32 * OVERLAY_LINE_HEIGHT,
                ),
                text,
            });
        }
    }
}
