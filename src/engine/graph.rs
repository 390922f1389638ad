use std::collections::{BTreeMap, HashMap};

use eframe::egui::{Pos2, Vec2};
use rand::Rng;
use tracing::debug;

use crate::config::EngineConfig;
use crate::feed::Transaction;

use super::node::{Node, NodeId};

/// Constrained-random placement rules for newly admitted nodes.
#[derive(Clone, Copy, Debug)]
pub struct Placement {
    pub viewport: Vec2,
    pub spawn_band: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub min_child_offset: f32,
    pub child_jitter: f32,
}

impl Placement {
    pub fn new(config: &EngineConfig, viewport: Vec2) -> Self {
        Self {
            viewport,
            spawn_band: config.spawn_band,
            margin_top: config.margin_top,
            margin_bottom: config.margin_bottom,
            min_child_offset: config.min_child_offset,
            child_jitter: config.child_jitter,
        }
    }

    fn initial_position(&self, rng: &mut impl Rng) -> Pos2 {
        let x = self.viewport.x - sample(rng, self.spawn_band.min(self.viewport.x));
        let band = (self.viewport.y - self.margin_top - self.margin_bottom).max(0.0);
        let y = self.margin_top + sample(rng, band);
        Pos2::new(x, y)
    }
}

fn sample(rng: &mut impl Rng, upper: f32) -> f32 {
    if upper > 0.0 {
        rng.gen_range(0.0..upper)
    } else {
        0.0
    }
}

/// Hash-keyed store of live nodes, iterated in admission order.
#[derive(Default)]
pub struct GraphIndex {
    nodes: BTreeMap<NodeId, Node>,
    index_by_hash: HashMap<String, NodeId>,
    next_id: NodeId,
}

impl GraphIndex {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn id_of(&self, hash: &str) -> Option<NodeId> {
        self.index_by_hash.get(hash).copied()
    }

    pub fn by_hash(&self, hash: &str) -> Option<&Node> {
        self.id_of(hash).and_then(|id| self.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut Node> {
        self.nodes.values_mut()
    }

    pub fn ids_into(&self, out: &mut Vec<NodeId>) {
        out.clear();
        out.extend(self.nodes.keys().copied());
    }

    /// Admits `tx` unless its hash is already present. Duplicates are ignored
    /// so edges that other nodes hold into the first copy stay valid.
    pub fn admit(
        &mut self,
        tx: &Transaction,
        placement: &Placement,
        rng: &mut impl Rng,
        now: f64,
    ) -> Option<NodeId> {
        if self.index_by_hash.contains_key(&tx.hash) {
            debug!(hash = %tx.hash, "ignoring duplicate transaction");
            return None;
        }

        let mut pos = placement.initial_position(rng);
        let trunk = self.id_of(&tx.trunk_tx_hash);
        let branch = self.id_of(&tx.branch_tx_hash);

        let mut approved = Vec::with_capacity(2);
        approved.extend(trunk);
        if branch != trunk {
            approved.extend(branch);
        }

        for parent_id in approved {
            let Some(parent) = self.nodes.get_mut(&parent_id) else {
                continue;
            };
            parent.is_tip = false;
            parent.approves += 1;

            if pos.x <= parent.pos.x + placement.min_child_offset {
                pos.x = parent.pos.x + placement.min_child_offset + sample(rng, placement.child_jitter);
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.index_by_hash.insert(tx.hash.clone(), id);
        self.nodes.insert(
            id,
            Node {
                hash: tx.hash.clone(),
                tag: tx.tag.clone(),
                value: tx.value,
                timestamp: tx.timestamp,
                pos,
                trunk,
                branch,
                approves: 0,
                is_tip: true,
                is_value_tx: tx.value > 0,
                is_milestone: false,
                is_confirmed: false,
                is_mouse_over: false,
                is_filtered: false,
                was_retained: false,
                is_new: 0,
                new_approver_pulse: 0,
                rewalk: None,
                rewalk_token: 0,
                arrival: now,
            },
        );

        Some(id)
    }

    /// Confirms `hash` and walks its trunk/branch ancestry, stopping at
    /// nodes that are already confirmed. Returns how many nodes flipped.
    pub fn confirm(&mut self, hash: &str) -> usize {
        let Some(start) = self.id_of(hash) else {
            return 0;
        };

        let mut stack = vec![start];
        let mut flipped = 0;
        while let Some(id) = stack.pop() {
            let Some(node) = self.get_mut(id) else {
                continue;
            };
            if node.is_confirmed {
                continue;
            }

            node.is_confirmed = true;
            flipped += 1;
            stack.extend(node.trunk);
            stack.extend(node.branch);
        }

        flipped
    }

    pub fn mark_milestone(&mut self, hash: &str) -> bool {
        let Some(node) = self.id_of(hash).and_then(|id| self.get_mut(id)) else {
            return false;
        };
        node.is_milestone = true;
        self.confirm(hash);
        true
    }

    /// Removes every node that arrived before `cutoff`.
    pub fn evict_older_than(&mut self, cutoff: f64) -> usize {
        let expired = self
            .nodes
            .iter()
            .filter(|(_, node)| node.arrival < cutoff)
            .map(|(id, _)| *id)
            .collect::<Vec<_>>();

        for id in &expired {
            if let Some(node) = self.nodes.remove(id) {
                self.index_by_hash.remove(&node.hash);
            }
        }

        expired.len()
    }
}
