//! Progression state - persisted records plus the session overlay.
//!
//! Effective state is derived, never stored:
//!
//! * `effective_level = persisted.current_level + overlay.session_level`
//! * `effectively_unlocked = persisted.unlocked || overlay.session_unlocked`
//!
//! Session purchases only ever touch the overlay, so resetting a session is
//! discarding one map. The author layer is a third, separately toggled layer
//! that unlocks every catalog node and lifts the root to level 1 while
//! active. Turning it off restores the overlay as it was when it went on.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::catalog::SkillCatalog;
use crate::SkillId;

/// Durable per-skill progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSkillRecord {
    pub current_level: u32,
    pub unlocked: bool,
}

/// Session-only progress layered on top of the persisted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOverlayRecord {
    pub session_level: u32,
    pub session_unlocked: bool,
}

#[derive(Debug, Clone)]
struct AuthorLayer {
    root: SkillId,
    skills: HashSet<SkillId>,
    /// Overlay at the moment the layer went on.
    saved_overlay: HashMap<SkillId, SessionOverlayRecord>,
}

/// Holds both layers and answers effective-state queries.
#[derive(Debug, Clone, Default)]
pub struct ProgressionStore {
    persisted: HashMap<SkillId, PersistedSkillRecord>,
    overlay: HashMap<SkillId, SessionOverlayRecord>,
    author: Option<AuthorLayer>,
}

impl ProgressionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh store for a catalog: the root starts persisted-unlocked.
    pub fn for_catalog(catalog: &SkillCatalog) -> Self {
        let mut store = Self::new();
        store.persisted.insert(
            catalog.root().to_string(),
            PersistedSkillRecord {
                current_level: 0,
                unlocked: true,
            },
        );
        store
    }

    /// Replace the persisted layer with loaded records.
    ///
    /// Unknown ids are dropped and levels above `max_level` are clamped.
    /// The root is always unlocked, as is every purchased skill and every
    /// child of one. Returns the number of records adjusted.
    pub fn load_persisted(
        &mut self,
        records: HashMap<SkillId, PersistedSkillRecord>,
        catalog: &SkillCatalog,
    ) -> usize {
        let mut adjusted = 0;
        self.persisted.clear();
        for (id, mut record) in records {
            let Some(def) = catalog.get(&id) else {
                log::warn!("Dropping persisted record for unknown skill `{}`", id);
                adjusted += 1;
                continue;
            };
            if record.current_level > def.max_level {
                log::warn!(
                    "Persisted level {} of `{}` exceeds max {}, clamping",
                    record.current_level,
                    id,
                    def.max_level
                );
                record.current_level = def.max_level;
                adjusted += 1;
            }
            if record.current_level > 0 && !record.unlocked {
                log::warn!("Persisted skill `{}` has levels but is locked, unlocking", id);
                record.unlocked = true;
                adjusted += 1;
            }
            self.persisted.insert(id, record);
        }
        self.persisted
            .entry(catalog.root().to_string())
            .or_default()
            .unlocked = true;

        let purchased: Vec<SkillId> = self
            .persisted
            .iter()
            .filter(|(_, r)| r.current_level > 0)
            .map(|(id, _)| id.clone())
            .collect();
        for parent in &purchased {
            let Some(def) = catalog.get(parent) else {
                continue;
            };
            for child in def.children.iter().filter(|c| catalog.contains(c)) {
                let record = self.persisted.entry(child.clone()).or_default();
                if !record.unlocked {
                    log::warn!(
                        "Persisted skill `{}` is locked under purchased `{}`, unlocking",
                        child,
                        parent
                    );
                    record.unlocked = true;
                    adjusted += 1;
                }
            }
        }
        adjusted
    }

    /// Persisted level plus session level. Unknown ids are 0.
    pub fn effective_level(&self, id: &str) -> u32 {
        let level = self.layered_level(id);
        match &self.author {
            Some(author) if author.root == id => level.max(1),
            _ => level,
        }
    }

    /// Persisted plus session, ignoring the author layer.
    fn layered_level(&self, id: &str) -> u32 {
        let persisted = self.persisted.get(id).map(|r| r.current_level).unwrap_or(0);
        let session = self.overlay.get(id).map(|r| r.session_level).unwrap_or(0);
        persisted + session
    }

    pub fn effectively_unlocked(&self, id: &str) -> bool {
        let authored = self.author.as_ref().is_some_and(|a| a.skills.contains(id));
        authored || self.unlocked_in_layers(id)
    }

    /// Record one session level on `id`.
    ///
    /// Preconditions (unlocked, below max) are the caller's to check. If
    /// this takes the effective level from 0 to 1, every child gets
    /// `session_unlocked`; returns the children that were newly unlocked.
    pub fn apply_purchase(&mut self, id: &str, children: &[SkillId]) -> Vec<SkillId> {
        let before = self.layered_level(id);
        self.overlay.entry(id.to_string()).or_default().session_level += 1;

        if before != 0 {
            return Vec::new();
        }
        let mut newly = Vec::new();
        for child in children {
            if !self.unlocked_in_layers(child) {
                newly.push(child.clone());
            }
            self.overlay.entry(child.clone()).or_default().session_unlocked = true;
        }
        newly
    }

    fn unlocked_in_layers(&self, id: &str) -> bool {
        self.persisted.get(id).map(|r| r.unlocked).unwrap_or(false)
            || self.overlay.get(id).map(|r| r.session_unlocked).unwrap_or(false)
    }

    /// Discard the whole overlay, including one saved by the author layer.
    /// Idempotent.
    pub fn reset_session(&mut self) {
        self.overlay.clear();
        if let Some(author) = &mut self.author {
            author.saved_overlay.clear();
        }
    }

    /// Fold the overlay into the persisted layer and clear it.
    ///
    /// Effective state is unchanged. Returns the number of skills touched.
    /// Refused while author mode is on, so authoring never reaches storage.
    pub fn commit_session(&mut self) -> usize {
        if self.author.is_some() {
            log::warn!("Ignoring session commit while author mode is on");
            return 0;
        }
        let touched = self.overlay.len();
        for (id, session) in self.overlay.drain() {
            let record = self.persisted.entry(id).or_default();
            record.current_level += session.session_level;
            record.unlocked |= session.session_unlocked;
        }
        touched
    }

    /// Turn the author layer on over `catalog`. Returns false if it was
    /// already on.
    pub fn enable_author_mode(&mut self, catalog: &SkillCatalog) -> bool {
        if self.author.is_some() {
            return false;
        }
        self.author = Some(AuthorLayer {
            root: catalog.root().to_string(),
            skills: catalog.iter().map(|s| s.id.clone()).collect(),
            saved_overlay: self.overlay.clone(),
        });
        true
    }

    /// Turn the author layer off, dropping every session change made while it
    /// was on. Returns false if it was already off.
    pub fn disable_author_mode(&mut self) -> bool {
        match self.author.take() {
            Some(author) => {
                self.overlay = author.saved_overlay;
                true
            }
            None => false,
        }
    }

    pub fn author_mode(&self) -> bool {
        self.author.is_some()
    }

    pub fn persisted(&self) -> &HashMap<SkillId, PersistedSkillRecord> {
        &self.persisted
    }

    pub fn persisted_record(&self, id: &str) -> PersistedSkillRecord {
        self.persisted.get(id).copied().unwrap_or_default()
    }

    pub fn overlay_record(&self, id: &str) -> Option<SessionOverlayRecord> {
        self.overlay.get(id).copied()
    }

    /// True when no session progress has been made.
    pub fn session_is_empty(&self) -> bool {
        self.overlay.is_empty()
    }
}
