use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const TX: u8 = 0;
const MILESTONE: u8 = 1;
const CONFIRMED_TX: u8 = 2;
const REWALK_STEP: u8 = 3;

/// A ledger transaction exactly as the feed delivers it.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Transaction {
    pub hash: String,
    pub address: String,
    pub value: i64,
    pub obsolete_tag: String,
    pub timestamp: i64,
    pub current_index: i64,
    pub last_index: i64,
    pub bundle_hash: String,
    pub trunk_tx_hash: String,
    pub branch_tx_hash: String,
    pub arrival_time: String,
    pub tag: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewalkPhase {
    Entry,
    Approver,
    Next,
    Tip,
}

impl RewalkPhase {
    fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Entry),
            1 => Some(Self::Approver),
            2 => Some(Self::Next),
            3 => Some(Self::Tip),
            _ => None,
        }
    }

    /// Entry and next steps also light up the edges from the approvers.
    pub fn marks_approver_edges(self) -> bool {
        matches!(self, Self::Entry | Self::Next)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FeedMessage {
    Tx(Transaction),
    Milestone(String),
    ConfirmedTx(String),
    RewalkStep { hash: String, phase: RewalkPhase },
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid feed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unknown feed message type {0}")]
    UnknownType(u8),
    #[error("unknown rewalk step type {0}")]
    UnknownRewalkPhase(u8),
    #[error("feed message without a transaction hash")]
    MissingHash,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default)]
    obj: Value,
}

#[derive(Deserialize)]
struct HashRef {
    #[serde(default)]
    hash: String,
}

#[derive(Deserialize)]
struct RawRewalkStep {
    #[serde(default)]
    hash: String,
    #[serde(rename = "type")]
    kind: u8,
}

fn require_hash(hash: String) -> Result<String, FeedError> {
    if hash.is_empty() {
        Err(FeedError::MissingHash)
    } else {
        Ok(hash)
    }
}

pub fn decode_message(raw: &str) -> Result<FeedMessage, FeedError> {
    let envelope: Envelope = serde_json::from_str(raw)?;

    match envelope.kind {
        TX => {
            let tx = Transaction::deserialize(envelope.obj)?;
            require_hash(tx.hash.clone())?;
            Ok(FeedMessage::Tx(tx))
        }
        MILESTONE => {
            let HashRef { hash } = HashRef::deserialize(envelope.obj)?;
            Ok(FeedMessage::Milestone(require_hash(hash)?))
        }
        CONFIRMED_TX => {
            let HashRef { hash } = HashRef::deserialize(envelope.obj)?;
            Ok(FeedMessage::ConfirmedTx(require_hash(hash)?))
        }
        REWALK_STEP => {
            let step = RawRewalkStep::deserialize(envelope.obj)?;
            let phase = RewalkPhase::from_wire(step.kind)
                .ok_or(FeedError::UnknownRewalkPhase(step.kind))?;
            Ok(FeedMessage::RewalkStep {
                hash: require_hash(step.hash)?,
                phase,
            })
        }
        other => Err(FeedError::UnknownType(other)),
    }
}
