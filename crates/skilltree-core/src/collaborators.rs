//! External collaborators the engine talks to.
//!
//! The engine only writes to these; none of them feed state back except the
//! wallet balance. In-memory implementations record every call so tests and
//! the harness can inspect what the engine did.

use std::collections::HashMap;

use skilltree_logic::progression::PersistedSkillRecord;
use skilltree_logic::viewport::ViewportState;
use skilltree_logic::{SkillId, StatKey};

/// Currency the player spends on skills.
pub trait CurrencyWallet {
    fn balance(&self) -> u64;
    /// Deduct `amount`. Returns false, deducting nothing, if funds are short.
    fn deduct(&mut self, amount: u64) -> bool;
}

/// Receives aggregate stat values. Never read back by the engine.
pub trait UpgradeStateSink {
    fn set_stat(&mut self, key: &str, value: f64);
}

/// Fire-and-forget durable storage.
pub trait DurableStore {
    fn write_viewport(&mut self, state: &ViewportState);
    fn write_progression(&mut self, records: &HashMap<SkillId, PersistedSkillRecord>);
}

/// One-shot feedback kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    PurchaseSuccess,
    PurchaseRejected,
}

pub trait CueEmitter {
    fn emit(&mut self, cue: Cue);
}

// ── In-memory implementations ──────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryWallet {
    balance: u64,
}

impl MemoryWallet {
    pub fn new(balance: u64) -> Self {
        Self { balance }
    }

    pub fn credit(&mut self, amount: u64) {
        self.balance = self.balance.saturating_add(amount);
    }
}

impl CurrencyWallet for MemoryWallet {
    fn balance(&self) -> u64 {
        self.balance
    }

    fn deduct(&mut self, amount: u64) -> bool {
        match self.balance.checked_sub(amount) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }
}

/// Keeps the latest value per stat plus a write log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    stats: HashMap<StatKey, f64>,
    writes: usize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.stats.get(key).copied()
    }

    pub fn stats(&self) -> &HashMap<StatKey, f64> {
        &self.stats
    }

    /// Total `set_stat` calls received.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl UpgradeStateSink for RecordingSink {
    fn set_stat(&mut self, key: &str, value: f64) {
        self.stats.insert(key.to_string(), value);
        self.writes += 1;
    }
}

/// Keeps the most recent write of each kind and counts them.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub viewport: Option<ViewportState>,
    pub progression: Option<HashMap<SkillId, PersistedSkillRecord>>,
    pub viewport_writes: usize,
    pub progression_writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DurableStore for MemoryStore {
    fn write_viewport(&mut self, state: &ViewportState) {
        self.viewport = Some(*state);
        self.viewport_writes += 1;
    }

    fn write_progression(&mut self, records: &HashMap<SkillId, PersistedSkillRecord>) {
        self.progression = Some(records.clone());
        self.progression_writes += 1;
    }
}

#[derive(Debug, Clone, Default)]
pub struct CueLog {
    pub cues: Vec<Cue>,
}

impl CueLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues.iter().filter(|&&c| c == cue).count()
    }

    pub fn last(&self) -> Option<Cue> {
        self.cues.last().copied()
    }
}

impl CueEmitter for CueLog {
    fn emit(&mut self, cue: Cue) {
        self.cues.push(cue);
    }
}

/// Emitter for front ends without audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentCues;

impl CueEmitter for SilentCues {
    fn emit(&mut self, _cue: Cue) {}
}
