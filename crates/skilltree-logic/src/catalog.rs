//! Skill catalog - immutable per-skill definitions loaded once at startup.
//!
//! The catalog is read from a static JSON table:
//!
//! ```json
//! { "root": "core",
//!   "skills": [ { "id": "core", "name": "Core", "base_cost": 0,
//!                 "cost_multiplier": 1.0, "max_level": 1, "children": ["speed"] } ] }
//! ```
//!
//! Children that name no definition are an authoring error: they are kept in
//! the definition as written and reported by [`SkillCatalog::dangling_children`],
//! the graph skips them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::viewport::Point;
use crate::SkillId;

/// Static definition of one skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub id: SkillId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price of the first level.
    pub base_cost: f64,
    /// Per-level price growth factor.
    pub cost_multiplier: f64,
    pub max_level: u32,
    /// Skills unlocked once this one reaches level 1, in authored order.
    #[serde(default)]
    pub children: Vec<SkillId>,
    /// Authored world-space center.
    #[serde(default)]
    pub position: Option<Point>,
    #[serde(default)]
    pub radius: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    root: SkillId,
    skills: Vec<SkillDefinition>,
}

/// Errors raised while loading a catalog table.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("catalog contains no skills")]
    Empty,
    #[error("root skill `{0}` has no definition")]
    MissingRoot(SkillId),
    #[error("skill `{0}` is defined more than once")]
    DuplicateSkill(SkillId),
}

/// Immutable table of skill definitions keyed by identifier.
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    root: SkillId,
    skills: Vec<SkillDefinition>,
    index: HashMap<SkillId, usize>,
}

impl SkillCatalog {
    /// Parse and validate a catalog table.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.root, file.skills)
    }

    /// Build a catalog from already-parsed definitions.
    pub fn new(root: impl Into<SkillId>, skills: Vec<SkillDefinition>) -> Result<Self, CatalogError> {
        let root = root.into();
        if skills.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(skills.len());
        for (i, skill) in skills.iter().enumerate() {
            if index.insert(skill.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateSkill(skill.id.clone()));
            }
        }
        if !index.contains_key(&root) {
            return Err(CatalogError::MissingRoot(root));
        }

        let catalog = Self { root, skills, index };
        for (parent, child) in catalog.dangling_children() {
            log::warn!("Skill `{}` lists unknown child `{}`", parent, child);
        }
        log::info!(
            "Loaded skill catalog: {} skills, root `{}`",
            catalog.skills.len(),
            catalog.root
        );
        Ok(catalog)
    }

    /// Identifier of the designated root skill.
    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn get(&self, id: &str) -> Option<&SkillDefinition> {
        self.index.get(id).map(|&i| &self.skills[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Definitions in authored order.
    pub fn iter(&self) -> impl Iterator<Item = &SkillDefinition> {
        self.skills.iter()
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Maximum level of a skill, 0 for unknown ids.
    pub fn max_level(&self, id: &str) -> u32 {
        self.get(id).map(|s| s.max_level).unwrap_or(0)
    }

    /// Every (parent, child) pair whose child has no definition.
    pub fn dangling_children(&self) -> Vec<(&str, &str)> {
        self.skills
            .iter()
            .flat_map(|s| {
                s.children
                    .iter()
                    .filter(|c| !self.index.contains_key(c.as_str()))
                    .map(move |c| (s.id.as_str(), c.as_str()))
            })
            .collect()
    }
}
