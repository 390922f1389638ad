use std::collections::VecDeque;

use super::graph::GraphIndex;

/// Fixed-capacity rolling window of per-second admission counts.
#[derive(Clone, Debug)]
pub struct ThroughputWindow {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl ThroughputWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn push(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn average(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Refills the whole window with one value.
    pub fn reset_flat(&mut self, value: f64) {
        self.samples.clear();
        self.samples.extend(std::iter::repeat_n(value, self.capacity));
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphStats {
    pub total: usize,
    pub in_view: usize,
    pub tips: usize,
    pub value_txs: usize,
    pub milestones: usize,
    pub confirmed: usize,
    pub oldest_in_view: Option<f64>,
    pub newest_in_view: Option<f64>,
    pub tip_pct: f64,
    pub approved_pct: f64,
    pub confirmed_pct: f64,
}

impl GraphStats {
    pub fn collect(graph: &GraphIndex, pan_x: f32, view_width: f32) -> Self {
        let mut stats = Self::default();

        for (_, node) in graph.iter() {
            stats.total += 1;
            if node.is_tip {
                stats.tips += 1;
            }
            if node.is_value_tx {
                stats.value_txs += 1;
            }
            if node.is_milestone {
                stats.milestones += 1;
            }
            if node.is_confirmed {
                stats.confirmed += 1;
            }

            let screen_x = node.pos.x + pan_x;
            if (0.0..=view_width).contains(&screen_x) {
                stats.in_view += 1;
                stats.oldest_in_view = Some(
                    stats
                        .oldest_in_view
                        .map_or(node.arrival, |oldest| oldest.min(node.arrival)),
                );
                stats.newest_in_view = Some(
                    stats
                        .newest_in_view
                        .map_or(node.arrival, |newest| newest.max(node.arrival)),
                );
            }
        }

        stats.tip_pct = percentage(stats.tips, stats.total);
        stats.approved_pct = if stats.total == 0 {
            0.0
        } else {
            round2(100.0 - stats.tip_pct)
        };
        stats.confirmed_pct = percentage(stats.confirmed, stats.total);
        stats
    }

    /// Seconds between the oldest and newest node currently in view.
    pub fn time_span_secs(&self) -> f64 {
        match (self.oldest_in_view, self.newest_in_view) {
            (Some(oldest), Some(newest)) => newest - oldest,
            _ => 0.0,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round2(part as f64 / total as f64 * 100.0)
    }
}

pub fn move_speed(window: &ThroughputWindow, min_speed: f32) -> f32 {
    ((window.average() / window.capacity() as f64) as f32).max(min_speed)
}
