use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Engine tunables. Any field missing from a config file keeps its default.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Nodes older than this are evicted during the aggregation pass.
    pub max_span_secs: f64,
    pub throughput_window: usize,
    pub sample_interval_secs: f64,
    pub aggregate_interval_secs: f64,
    pub min_move_speed: f32,
    pub replay_delay_secs: f64,
    pub drag_damping: f32,
    pub wheel_step: f32,
    pub node_size: f32,
    /// Width of the slice at the right edge where new nodes spawn.
    pub spawn_band: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub min_child_offset: f32,
    pub child_jitter: f32,
    pub new_node_frames: u32,
    pub approver_pulse_frames: u32,
    pub rewalk_revert_secs: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_span_secs: 600.0,
            throughput_window: 10,
            sample_interval_secs: 1.0,
            aggregate_interval_secs: 0.5,
            min_move_speed: 0.1,
            replay_delay_secs: 0.010,
            drag_damping: 1.0 / 20.0,
            wheel_step: 40.0,
            node_size: 5.0,
            spawn_band: 60.0,
            margin_top: 90.0,
            margin_bottom: 30.0,
            min_child_offset: 12.0,
            child_jitter: 18.0,
            new_node_frames: 60,
            approver_pulse_frames: 30,
            rewalk_revert_secs: 0.1,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: EngineConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;

    Ok(EngineConfig {
        throughput_window: config.throughput_window.max(1),
        ..config
    })
}
