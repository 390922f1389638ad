use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, StrokeKind};

use crate::engine::{EdgeStyle, FrameScene, NodeStyle};
use crate::feed::RewalkPhase;

const BACKGROUND: Color32 = Color32::from_rgb(19, 23, 29);
const DEFAULT_NODE: Color32 = Color32::from_rgb(86, 86, 86);
const RETAINED_OUTLINE: Color32 = Color32::from_rgba_premultiplied(40, 52, 66, 160);
const GRID_STEP: f32 = 120.0;

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn node_color(style: NodeStyle) -> Color32 {
    match style {
        NodeStyle::Walk(RewalkPhase::Entry) => Color32::from_rgb(66, 244, 244),
        NodeStyle::Walk(RewalkPhase::Approver) => Color32::from_rgb(226, 65, 244),
        NodeStyle::Walk(RewalkPhase::Next) => Color32::from_rgb(244, 220, 65),
        NodeStyle::Walk(RewalkPhase::Tip) => Color32::from_rgb(244, 142, 65),
        NodeStyle::MouseOver => Color32::from_rgb(255, 164, 101),
        NodeStyle::Milestone => Color32::from_rgb(191, 78, 78),
        NodeStyle::Confirmed => Color32::from_rgb(186, 186, 186),
        NodeStyle::ApproverPulse => Color32::from_rgb(103, 196, 255),
        NodeStyle::Filtered => dim_color(DEFAULT_NODE, 0.38),
        NodeStyle::Tip => Color32::from_rgb(88, 176, 233),
        NodeStyle::ValueTx => Color32::from_rgb(126, 211, 110),
        NodeStyle::Default => DEFAULT_NODE,
    }
}

pub(super) fn edge_stroke(style: EdgeStyle) -> Stroke {
    match style {
        EdgeStyle::Walk => Stroke::new(1.6, Color32::from_rgb(244, 142, 65)),
        EdgeStyle::SelectedNeighbor => Stroke::new(1.6, Color32::from_rgb(245, 206, 93)),
        EdgeStyle::NewlyCreated => {
            Stroke::new(1.2, Color32::from_rgba_unmultiplied(103, 196, 255, 200))
        }
        EdgeStyle::MouseOverNeighbor => Stroke::new(1.4, Color32::from_rgb(255, 164, 101)),
        EdgeStyle::TipNeighbor => Stroke::new(1.0, Color32::from_rgb(96, 104, 116)),
        EdgeStyle::Default => Stroke::new(1.0, Color32::from_rgb(66, 66, 66)),
    }
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, pan_x: f32) {
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let stroke = Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 50));
    let mut x = rect.left() + pan_x.rem_euclid(GRID_STEP);
    while x < rect.right() {
        painter.line_segment([Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())], stroke);
        x += GRID_STEP;
    }
}

/// Composites one frame: the edge layer, the node layer, then the overlay.
pub(super) fn paint_scene(painter: &Painter, rect: Rect, scene: &FrameScene) {
    let offset = rect.min.to_vec2();

    for edge in &scene.edges {
        painter.line_segment([edge.from + offset, edge.to + offset], edge_stroke(edge.style));
    }

    for node in &scene.nodes {
        let node_rect = node.rect.translate(offset);
        painter.rect_filled(node_rect, 0.0, node_color(node.style));
        if node.retained {
            painter.rect_stroke(
                node_rect,
                0.0,
                Stroke::new(1.0, RETAINED_OUTLINE),
                StrokeKind::Outside,
            );
        }
    }

    for text in &scene.overlay {
        painter.text(
            text.pos + offset,
            Align2::LEFT_TOP,
            &text.text,
            FontId::monospace(12.0),
            Color32::from_gray(220),
        );
    }
}
