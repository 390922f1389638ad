use eframe::egui::{Pos2, Vec2, vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::debug;

use crate::config::EngineConfig;
use crate::feed::{FeedMessage, RewalkPhase, Transaction};

mod frame;
mod graph;
mod interaction;
mod node;
mod retention;
mod stats;

pub use frame::{EdgeStyle, FrameScene, NodeStyle};
pub use graph::GraphIndex;
pub use node::{Node, NodeId};
pub use retention::RetentionState;
pub use stats::GraphStats;

use self::graph::Placement;
use self::retention::{ReplayStep, RetentionController};
use self::stats::{ThroughputWindow, move_speed};

/// Everything that can reach the engine, handled strictly one at a time.
#[derive(Clone, Debug)]
pub enum Event {
    Feed(FeedMessage),
    VisibilityChanged(bool),
    TogglePause,
    PointerDown(Pos2),
    PointerMove(Pos2),
    PointerUp(Pos2),
    Wheel(f32),
    Filter(String),
    Resize(Vec2),
}

struct ScheduledRevert {
    node: NodeId,
    token: u64,
    due: f64,
}

struct DragCapture {
    origin: Pos2,
    moved: bool,
}

/// Transient view state consumed by the render pass.
struct ViewState {
    viewport: Vec2,
    pan_x: f32,
    filter: String,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    drag: Option<DragCapture>,
    hidden: bool,
    /// Retention was started by the pause control; only that control ends it.
    user_paused: bool,
}

pub struct Engine {
    config: EngineConfig,
    graph: GraphIndex,
    view: ViewState,
    retention: RetentionController,
    throughput: ThroughputWindow,
    admitted_this_tick: u32,
    stats: GraphStats,
    move_speed: f32,
    next_sample_at: Option<f64>,
    next_aggregate_at: Option<f64>,
    reverts: Vec<ScheduledRevert>,
    scene: FrameScene,
    id_scratch: Vec<NodeId>,
    rng: StdRng,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Engine with reproducible node placement.
    pub fn seeded(config: EngineConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, rng: StdRng) -> Self {
        Self {
            retention: RetentionController::new(config.replay_delay_secs),
            throughput: ThroughputWindow::new(config.throughput_window),
            move_speed: config.min_move_speed,
            view: ViewState {
                viewport: vec2(1280.0, 720.0),
                pan_x: 0.0,
                filter: String::new(),
                selected: None,
                hovered: None,
                drag: None,
                hidden: false,
                user_paused: false,
            },
            graph: GraphIndex::default(),
            admitted_this_tick: 0,
            stats: GraphStats::default(),
            next_sample_at: None,
            next_aggregate_at: None,
            reverts: Vec::new(),
            scene: FrameScene::default(),
            id_scratch: Vec::new(),
            rng,
            config,
        }
    }

    /// Binds the engine to a drawing surface of the given size.
    pub fn initialize(&mut self, viewport: Vec2) {
        self.view.viewport = viewport;
    }

    pub fn graph(&self) -> &GraphIndex {
        &self.graph
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    pub fn throughput(&self) -> f64 {
        self.throughput.average()
    }

    pub fn current_move_speed(&self) -> f32 {
        self.move_speed
    }

    pub fn retention_state(&self) -> RetentionState {
        self.retention.state()
    }

    pub fn pan_x(&self) -> f32 {
        self.view.pan_x
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.view.selected.and_then(|id| self.graph.get(id))
    }

    pub fn dispatch(&mut self, event: Event, now: f64) {
        match event {
            Event::Feed(message) => self.handle_feed(message, now),
            Event::VisibilityChanged(visible) => self.set_visible(visible, now),
            Event::TogglePause => self.toggle_pause(now),
            Event::PointerDown(pos) => self.pointer_down(pos),
            Event::PointerMove(pos) => self.pointer_move(pos),
            Event::PointerUp(pos) => self.pointer_up(pos),
            Event::Wheel(delta) => self.wheel(delta),
            Event::Filter(word) => self.set_filter_text(&word),
            Event::Resize(viewport) => self.initialize(viewport),
        }
    }

    fn handle_feed(&mut self, message: FeedMessage, now: f64) {
        let Some(message) = self.retention.intercept(message) else {
            return;
        };

        match message {
            FeedMessage::Tx(tx) => {
                self.admit(&tx, now, false);
            }
            FeedMessage::Milestone(hash) => {
                self.graph.mark_milestone(&hash);
            }
            FeedMessage::ConfirmedTx(hash) => {
                self.graph.confirm(&hash);
            }
            FeedMessage::RewalkStep { hash, phase } => self.mark_rewalk(&hash, phase, now),
        }
    }

    fn admit(&mut self, tx: &Transaction, now: f64, was_retained: bool) -> Option<NodeId> {
        let placement = Placement::new(&self.config, self.view.viewport);
        let id = self.graph.admit(tx, &placement, &mut self.rng, now)?;
        self.admitted_this_tick += 1;

        let filter = self.view.filter.as_str();
        if let Some(node) = self.graph.get_mut(id) {
            node.is_new = self.config.new_node_frames;
            node.was_retained = was_retained;
            node.is_filtered = !tag_matches(&node.tag, filter);
        }
        Some(id)
    }

    fn mark_rewalk(&mut self, hash: &str, phase: RewalkPhase, now: f64) {
        let Some(id) = self.graph.id_of(hash) else {
            return;
        };
        let Some(node) = self.graph.get_mut(id) else {
            return;
        };

        node.rewalk = Some(phase);
        node.rewalk_token += 1;
        self.reverts.push(ScheduledRevert {
            node: id,
            token: node.rewalk_token,
            due: now + self.config.rewalk_revert_secs,
        });
    }

    fn run_due_reverts(&mut self, now: f64) {
        let graph = &mut self.graph;
        self.reverts.retain(|revert| {
            if revert.due > now {
                return true;
            }
            if let Some(node) = graph.get_mut(revert.node)
                && node.rewalk_token == revert.token
            {
                node.rewalk = None;
            }
            false
        });
    }

    pub fn set_visible(&mut self, visible: bool, now: f64) {
        if self.view.hidden == !visible {
            return;
        }
        self.view.hidden = !visible;

        if !visible {
            self.retention.begin_retention(self.throughput.average());
        } else if !self.view.user_paused {
            self.retention.begin_replay(now);
        }
    }

    pub fn toggle_pause(&mut self, now: f64) {
        if self.retention.state() == RetentionState::Retaining {
            self.view.user_paused = false;
            if !self.view.hidden {
                self.retention.begin_replay(now);
            }
        } else {
            self.view.user_paused = true;
            self.retention.begin_retention(self.throughput.average());
        }
    }

    fn drain_replay(&mut self, now: f64) {
        while let Some((step, due)) = self.retention.next_due(now) {
            match step {
                ReplayStep::Tx(tx) => {
                    self.admit(&tx, due, true);
                }
                ReplayStep::Milestone(hash) => {
                    self.graph.mark_milestone(&hash);
                }
                ReplayStep::Confirmed(hash) => {
                    self.graph.confirm(&hash);
                }
            }
        }

        if let Some(rate) = self.retention.finish_if_drained() {
            self.throughput.reset_flat(rate);
            self.move_speed = move_speed(&self.throughput, self.config.min_move_speed);
        }
    }

    fn run_timers(&mut self, now: f64) {
        if due(&mut self.next_sample_at, now, self.config.sample_interval_secs) {
            self.throughput.push(f64::from(self.admitted_this_tick));
            self.admitted_this_tick = 0;
        }

        if due(&mut self.next_aggregate_at, now, self.config.aggregate_interval_secs) {
            self.aggregate(now);
        }
    }

    fn aggregate(&mut self, now: f64) {
        let evicted = self.graph.evict_older_than(now - self.config.max_span_secs);
        if evicted > 0 {
            debug!(evicted, "evicted expired transactions");
            if self.view.selected.is_some_and(|id| self.graph.get(id).is_none()) {
                self.view.selected = None;
            }
            if self.view.hovered.is_some_and(|id| self.graph.get(id).is_none()) {
                self.view.hovered = None;
            }
        }

        self.stats = GraphStats::collect(&self.graph, self.view.pan_x, self.view.viewport.x);
        self.move_speed = move_speed(&self.throughput, self.config.min_move_speed);
    }
}

/// Periodic timer helper: arms on first call, then fires once per interval.
fn due(next: &mut Option<f64>, now: f64, interval: f64) -> bool {
    match *next {
        None => {
            *next = Some(now + interval);
            false
        }
        Some(at) if now >= at => {
            let following = at + interval;
            *next = Some(if following <= now { now + interval } else { following });
            true
        }
        Some(_) => false,
    }
}

fn tag_matches(tag: &str, filter: &str) -> bool {
    filter.is_empty() || tag.to_lowercase().contains(filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn tx(hash: &str, trunk: &str, branch: &str) -> Transaction {
        Transaction {
            hash: hash.to_owned(),
            trunk_tx_hash: trunk.to_owned(),
            branch_tx_hash: branch.to_owned(),
            ..Default::default()
        }
    }

    pub(super) fn engine() -> Engine {
        let mut engine = Engine::seeded(EngineConfig::default(), 42);
        engine.initialize(vec2(800.0, 600.0));
        engine
    }

    pub(super) fn feed(engine: &mut Engine, message: FeedMessage, now: f64) {
        engine.dispatch(Event::Feed(message), now);
    }

    #[test]
    fn scenario_tip_milestone_and_confirmation() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        assert!(engine.graph().by_hash("A").unwrap().is_tip);

        feed(&mut engine, FeedMessage::Tx(tx("B", "A", "")), 0.1);
        let a = engine.graph().by_hash("A").unwrap();
        let b = engine.graph().by_hash("B").unwrap();
        assert!(!a.is_tip);
        assert!(b.is_tip);
        assert_eq!(a.approves, 1);
        assert!(b.pos.x > a.pos.x);

        feed(&mut engine, FeedMessage::Milestone("A".into()), 0.2);
        let a = engine.graph().by_hash("A").unwrap();
        assert!(a.is_milestone && a.is_confirmed);

        feed(&mut engine, FeedMessage::Tx(tx("C", "", "A")), 0.3);
        feed(&mut engine, FeedMessage::ConfirmedTx("C".into()), 0.4);
        assert!(engine.graph().by_hash("C").unwrap().is_confirmed);
        assert!(engine.graph().by_hash("A").unwrap().is_confirmed);
        assert!(!engine.graph().by_hash("B").unwrap().is_confirmed);

        feed(&mut engine, FeedMessage::ConfirmedTx("nobody".into()), 0.5);
        feed(&mut engine, FeedMessage::Milestone("nobody".into()), 0.5);
        assert_eq!(engine.graph().len(), 3);
    }

    #[test]
    fn tip_flag_matches_incoming_references() {
        let mut engine = engine();
        let edges = [
            ("A", "", ""),
            ("B", "A", ""),
            ("C", "A", "B"),
            ("D", "C", "C"),
            ("E", "", ""),
            ("F", "E", "missing"),
        ];
        for (index, (hash, trunk, branch)) in edges.iter().enumerate() {
            feed(&mut engine, FeedMessage::Tx(tx(hash, trunk, branch)), index as f64);
        }

        for (id, node) in engine.graph().iter() {
            let referenced = engine
                .graph()
                .iter()
                .any(|(_, other)| other.trunk == Some(id) || other.branch == Some(id));
            assert_eq!(node.is_tip, !referenced, "{}", node.hash);
        }
    }

    #[test]
    fn rewalk_marks_revert_unless_superseded() {
        let mut engine = engine();
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.0);
        feed(
            &mut engine,
            FeedMessage::RewalkStep {
                hash: "A".into(),
                phase: RewalkPhase::Entry,
            },
            1.0,
        );
        feed(
            &mut engine,
            FeedMessage::RewalkStep {
                hash: "A".into(),
                phase: RewalkPhase::Tip,
            },
            1.08,
        );

        engine.frame(1.15);
        assert_eq!(
            engine.graph().by_hash("A").unwrap().rewalk,
            Some(RewalkPhase::Tip)
        );

        engine.frame(1.2);
        assert_eq!(engine.graph().by_hash("A").unwrap().rewalk, None);

        feed(
            &mut engine,
            FeedMessage::RewalkStep {
                hash: "ghost".into(),
                phase: RewalkPhase::Next,
            },
            2.0,
        );
        assert!(engine.reverts.is_empty());
    }

    #[test]
    fn throughput_sampler_and_eviction_follow_their_timers() {
        let mut engine = engine();
        engine.frame(0.0);
        for index in 0..4 {
            feed(&mut engine, FeedMessage::Tx(tx(&format!("T{index}"), "", "")), 0.2);
        }

        engine.frame(1.0);
        assert_eq!(engine.throughput(), 4.0);
        assert_eq!(engine.stats().total, 4);

        engine.frame(2.0);
        assert_eq!(engine.throughput(), 2.0);
        assert_eq!(engine.current_move_speed(), 0.2);

        engine.frame(600.0);
        assert_eq!(engine.stats().total, 4);
        engine.frame(600.5);
        assert_eq!(engine.stats().total, 0);
        assert!(engine.graph().is_empty());
    }

    #[test]
    fn retained_events_replay_in_timestamp_order() {
        let mut engine = engine();
        engine.dispatch(Event::VisibilityChanged(false), 0.0);
        assert_eq!(engine.retention_state(), RetentionState::Retaining);

        for (hash, timestamp) in [("t3", 300), ("t1", 100), ("t2", 200)] {
            let tx = Transaction {
                timestamp,
                ..tx(hash, "", "")
            };
            feed(&mut engine, FeedMessage::Tx(tx), 1.0);
        }
        feed(&mut engine, FeedMessage::Milestone("t1".into()), 1.0);
        assert!(engine.graph().is_empty());

        engine.dispatch(Event::VisibilityChanged(true), 10.0);
        assert_eq!(engine.retention_state(), RetentionState::Replaying);
        engine.frame(10.0);
        assert_eq!(engine.graph().len(), 1);

        engine.frame(11.0);
        assert_eq!(engine.retention_state(), RetentionState::Live);

        let admitted = engine
            .graph()
            .iter()
            .map(|(_, node)| (node.hash.clone(), node.arrival, node.was_retained))
            .collect::<Vec<_>>();
        let order = admitted.iter().map(|(hash, ..)| hash.as_str()).collect::<Vec<_>>();
        assert_eq!(order, ["t1", "t2", "t3"]);
        for pair in admitted.windows(2) {
            assert!((pair[1].1 - pair[0].1 - 0.010).abs() < 1e-9);
        }
        assert!(admitted.iter().all(|(_, _, retained)| *retained));
        assert!(engine.graph().by_hash("t1").unwrap().is_milestone);
    }

    #[test]
    fn replay_finish_flattens_throughput_to_pre_pause_rate() {
        let mut engine = engine();
        engine.frame(0.0);
        for index in 0..6 {
            feed(&mut engine, FeedMessage::Tx(tx(&format!("L{index}"), "", "")), 0.5);
        }
        engine.frame(1.0);
        assert_eq!(engine.throughput(), 6.0);

        engine.dispatch(Event::TogglePause, 1.1);
        for index in 0..3 {
            feed(&mut engine, FeedMessage::Tx(tx(&format!("P{index}"), "", "")), 1.2);
        }
        engine.frame(2.0);
        engine.frame(3.0);
        assert_eq!(engine.throughput(), 2.0);

        engine.dispatch(Event::TogglePause, 3.5);
        engine.frame(3.6);
        assert_eq!(engine.retention_state(), RetentionState::Live);
        assert_eq!(engine.throughput(), 6.0);
        assert_eq!(engine.graph().len(), 9);
    }

    #[test]
    fn visibility_does_not_end_a_manual_pause() {
        let mut engine = engine();
        engine.dispatch(Event::TogglePause, 0.0);
        feed(&mut engine, FeedMessage::Tx(tx("A", "", "")), 0.1);

        engine.dispatch(Event::VisibilityChanged(false), 1.0);
        engine.dispatch(Event::VisibilityChanged(true), 2.5);
        engine.frame(3.0);
        assert_eq!(engine.retention_state(), RetentionState::Retaining);
        assert!(engine.graph().is_empty());

        engine.dispatch(Event::TogglePause, 4.0);
        assert_eq!(engine.retention_state(), RetentionState::Replaying);
        engine.frame(4.0);
        assert_eq!(engine.retention_state(), RetentionState::Live);
        assert_eq!(engine.graph().len(), 1);
    }

    #[test]
    fn resuming_while_hidden_waits_for_visibility() {
        let mut engine = engine();
        engine.dispatch(Event::TogglePause, 0.0);
        engine.dispatch(Event::VisibilityChanged(false), 1.0);
        engine.dispatch(Event::TogglePause, 1.5);
        assert_eq!(engine.retention_state(), RetentionState::Retaining);

        engine.dispatch(Event::VisibilityChanged(true), 2.0);
        assert_eq!(engine.retention_state(), RetentionState::Replaying);
    }

    #[test]
    fn timer_helper_skips_missed_intervals() {
        let mut next = None;
        assert!(!due(&mut next, 0.0, 1.0));
        assert!(!due(&mut next, 0.5, 1.0));
        assert!(due(&mut next, 1.0, 1.0));
        assert_eq!(next, Some(2.0));
        assert!(due(&mut next, 7.3, 1.0));
        assert_eq!(next, Some(8.3));
    }
}
