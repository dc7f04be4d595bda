//! Stat families and their aggregation rules.
//!
//! A stat is fed by one family of skill identifiers (for example three
//! sequential tiers of "projectile count"). Its value is always recomputed
//! from the sum of the members' effective levels, never accumulated as
//! deltas, so purchase order and session resets cannot skew it:
//!
//! ```text
//! value = rule(Σ effective_level(member)) + Σ bonus(capstone targeting stat, if level ≥ 1)
//! ```
//!
//! | Rule | Value at `n` total levels |
//! |------|---------------------------|
//! | `Linear` | `base + n * per_level` |
//! | `Multiplicative` | `base * multiplier_per_level ^ n` |
//! | `Percent` | `base * (1 + n * percent_per_level)` |
//!
//! Adding a skill to a family is a table edit in `effects.json`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::SkillCatalog;
use crate::progression::ProgressionStore;
use crate::{SkillId, StatKey};

/// How a family's total level maps to a stat value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregationRule {
    Linear { base: f64, per_level: f64 },
    Multiplicative { base: f64, multiplier_per_level: f64 },
    Percent { base: f64, percent_per_level: f64 },
}

impl AggregationRule {
    pub fn apply(&self, total_levels: u32) -> f64 {
        let n = total_levels as f64;
        match *self {
            AggregationRule::Linear { base, per_level } => base + n * per_level,
            AggregationRule::Multiplicative {
                base,
                multiplier_per_level,
            } => base * multiplier_per_level.powi(total_levels as i32),
            AggregationRule::Percent {
                base,
                percent_per_level,
            } => base * (1.0 + n * percent_per_level),
        }
    }
}

/// Skills whose effective levels feed one stat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatFamily {
    pub stat: StatKey,
    pub members: Vec<SkillId>,
    pub rule: AggregationRule,
}

/// One-time flat bonus on another stat while `skill` is at level ≥ 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapstoneBonus {
    pub skill: SkillId,
    pub target_stat: StatKey,
    pub bonus: f64,
}

#[derive(Debug, Default, Deserialize)]
struct EffectFile {
    #[serde(default)]
    families: Vec<StatFamily>,
    #[serde(default)]
    capstones: Vec<CapstoneBonus>,
}

#[derive(Debug, Error)]
pub enum EffectTableError {
    #[error("effect table JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stat `{stat}` lists unknown skill `{skill}`")]
    UnknownMember { stat: StatKey, skill: SkillId },
    #[error("stat `{0}` is defined by more than one family")]
    DuplicateStat(StatKey),
}

/// A computed stat ready for the upgrade-state sink.
#[derive(Debug, Clone, PartialEq)]
pub struct StatValue {
    pub stat: StatKey,
    pub value: f64,
}

/// Lookup table from skill → affected stats.
#[derive(Debug, Clone, Default)]
pub struct EffectTable {
    families: Vec<StatFamily>,
    capstones: Vec<CapstoneBonus>,
    by_stat: HashMap<StatKey, usize>,
    /// skill → family indices it is a member of
    by_skill: HashMap<SkillId, Vec<usize>>,
    /// capstone skill → capstone indices
    capstones_by_skill: HashMap<SkillId, Vec<usize>>,
}

impl EffectTable {
    pub fn from_json(json: &str, catalog: &SkillCatalog) -> Result<Self, EffectTableError> {
        let file: EffectFile = serde_json::from_str(json)?;
        Self::new(file.families, file.capstones, catalog)
    }

    pub fn new(
        families: Vec<StatFamily>,
        capstones: Vec<CapstoneBonus>,
        catalog: &SkillCatalog,
    ) -> Result<Self, EffectTableError> {
        let mut by_stat = HashMap::new();
        let mut by_skill: HashMap<SkillId, Vec<usize>> = HashMap::new();
        for (i, family) in families.iter().enumerate() {
            if by_stat.insert(family.stat.clone(), i).is_some() {
                return Err(EffectTableError::DuplicateStat(family.stat.clone()));
            }
            for member in &family.members {
                if !catalog.contains(member) {
                    return Err(EffectTableError::UnknownMember {
                        stat: family.stat.clone(),
                        skill: member.clone(),
                    });
                }
                by_skill.entry(member.clone()).or_default().push(i);
            }
        }

        let mut capstones_by_skill: HashMap<SkillId, Vec<usize>> = HashMap::new();
        for (i, cap) in capstones.iter().enumerate() {
            if !catalog.contains(&cap.skill) {
                return Err(EffectTableError::UnknownMember {
                    stat: cap.target_stat.clone(),
                    skill: cap.skill.clone(),
                });
            }
            if !by_stat.contains_key(&cap.target_stat) {
                log::warn!(
                    "Capstone `{}` targets stat `{}` which has no family, bonus never applies",
                    cap.skill,
                    cap.target_stat
                );
            }
            if catalog.max_level(&cap.skill) != 1 {
                log::warn!(
                    "Capstone `{}` has max level {}, expected 1",
                    cap.skill,
                    catalog.max_level(&cap.skill)
                );
            }
            capstones_by_skill.entry(cap.skill.clone()).or_default().push(i);
        }

        Ok(Self {
            families,
            capstones,
            by_stat,
            by_skill,
            capstones_by_skill,
        })
    }

    pub fn families(&self) -> &[StatFamily] {
        &self.families
    }

    pub fn family(&self, stat: &str) -> Option<&StatFamily> {
        self.by_stat.get(stat).map(|&i| &self.families[i])
    }

    /// Stats whose value depends on `skill`, in table order, deduplicated.
    pub fn stats_affected_by(&self, skill: &str) -> Vec<StatKey> {
        let mut stats: Vec<StatKey> = Vec::new();
        let families = self.by_skill.get(skill).into_iter().flatten();
        for &i in families {
            stats.push(self.families[i].stat.clone());
        }
        let capstones = self.capstones_by_skill.get(skill).into_iter().flatten();
        for &i in capstones {
            let target = &self.capstones[i].target_stat;
            if self.by_stat.contains_key(target) && !stats.contains(target) {
                stats.push(target.clone());
            }
        }
        stats
    }

    /// Current value of one stat. `None` if no family defines it.
    pub fn compute(&self, stat: &str, store: &ProgressionStore) -> Option<f64> {
        let family = self.family(stat)?;
        let total: u32 = family
            .members
            .iter()
            .map(|m| store.effective_level(m))
            .sum();
        let bonus: f64 = self
            .capstones
            .iter()
            .filter(|c| c.target_stat == stat && store.effective_level(&c.skill) >= 1)
            .map(|c| c.bonus)
            .sum();
        Some(family.rule.apply(total) + bonus)
    }

    /// Recompute every stat `skill` contributes to.
    pub fn recompute_for(&self, skill: &str, store: &ProgressionStore) -> Vec<StatValue> {
        self.stats_affected_by(skill)
            .into_iter()
            .filter_map(|stat| {
                let value = self.compute(&stat, store)?;
                Some(StatValue { stat, value })
            })
            .collect()
    }

    /// Recompute every stat in the table.
    pub fn recompute_all(&self, store: &ProgressionStore) -> Vec<StatValue> {
        self.families
            .iter()
            .filter_map(|f| {
                let value = self.compute(&f.stat, store)?;
                Some(StatValue {
                    stat: f.stat.clone(),
                    value,
                })
            })
            .collect()
    }
}
