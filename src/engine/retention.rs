use std::collections::VecDeque;

use tracing::info;

use crate::feed::{FeedMessage, Transaction};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetentionState {
    Live,
    Retaining,
    Replaying,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReplayStep {
    Tx(Transaction),
    Milestone(String),
    Confirmed(String),
}

/// Buffers feed traffic while the view is inactive and hands it back at a
/// fixed pace once the view resumes.
#[derive(Debug)]
pub struct RetentionController {
    state: RetentionState,
    txs: VecDeque<Transaction>,
    milestones: VecDeque<String>,
    confirmations: VecDeque<String>,
    remaining: usize,
    next_due: f64,
    delay: f64,
    pre_retention_rate: f64,
}

impl RetentionController {
    pub fn new(delay: f64) -> Self {
        Self {
            state: RetentionState::Live,
            txs: VecDeque::new(),
            milestones: VecDeque::new(),
            confirmations: VecDeque::new(),
            remaining: 0,
            next_due: 0.0,
            delay,
            pre_retention_rate: 0.0,
        }
    }

    pub fn state(&self) -> RetentionState {
        self.state
    }

    pub fn movement_blocked(&self) -> bool {
        self.state == RetentionState::Retaining
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn retained(&self) -> usize {
        self.txs.len() + self.milestones.len() + self.confirmations.len()
    }

    pub fn pre_retention_rate(&self) -> f64 {
        self.pre_retention_rate
    }

    /// Starts buffering. A replay in progress is suspended, not discarded, so
    /// its leftovers are merged with the new batch on resume.
    pub fn begin_retention(&mut self, current_rate: f64) {
        match self.state {
            RetentionState::Retaining => return,
            RetentionState::Live => self.pre_retention_rate = current_rate,
            RetentionState::Replaying => {}
        }

        self.state = RetentionState::Retaining;
        info!(buffered = self.retained(), "retaining feed events");
    }

    pub fn begin_replay(&mut self, now: f64) {
        if self.state != RetentionState::Retaining {
            return;
        }

        self.txs
            .make_contiguous()
            .sort_by_key(|tx| tx.timestamp);
        self.remaining = self.retained();
        self.next_due = now;
        self.state = RetentionState::Replaying;
        info!(remaining = self.remaining, "replaying retained events");
    }

    /// Takes the message if it has to wait for replay.
    pub fn intercept(&mut self, message: FeedMessage) -> Option<FeedMessage> {
        if self.state == RetentionState::Live {
            return Some(message);
        }

        let replaying = self.state == RetentionState::Replaying;
        match message {
            FeedMessage::Tx(tx) => {
                if replaying {
                    let at = self.txs.partition_point(|queued| queued.timestamp <= tx.timestamp);
                    self.txs.insert(at, tx);
                } else {
                    self.txs.push_back(tx);
                }
            }
            FeedMessage::Milestone(hash) => self.milestones.push_back(hash),
            FeedMessage::ConfirmedTx(hash) => self.confirmations.push_back(hash),
            FeedMessage::RewalkStep { .. } => return None,
        }

        if replaying {
            self.remaining += 1;
        }
        None
    }

    /// Next step whose slot has come up, with the time of that slot.
    pub fn next_due(&mut self, now: f64) -> Option<(ReplayStep, f64)> {
        if self.state != RetentionState::Replaying || self.next_due > now {
            return None;
        }

        let step = if let Some(tx) = self.txs.pop_front() {
            ReplayStep::Tx(tx)
        } else if let Some(hash) = self.milestones.pop_front() {
            ReplayStep::Milestone(hash)
        } else {
            ReplayStep::Confirmed(self.confirmations.pop_front()?)
        };

        let due = self.next_due;
        self.next_due += self.delay;
        self.remaining = self.remaining.saturating_sub(1);
        Some((step, due))
    }

    /// Returns to live once every buffer is drained. Yields the rate the
    /// throughput window should be flattened to.
    pub fn finish_if_drained(&mut self) -> Option<f64> {
        if self.state != RetentionState::Replaying || self.retained() > 0 {
            return None;
        }

        self.txs.clear();
        self.milestones.clear();
        self.confirmations.clear();
        self.remaining = 0;
        self.state = RetentionState::Live;
        info!("replay finished, feed is live again");
        Some(self.pre_retention_rate)
    }
}
