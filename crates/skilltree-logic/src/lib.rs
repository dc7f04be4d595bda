//! Pure skill tree logic for SkillTree.
//!
//! This crate contains all progression logic that is independent of any
//! storage, renderer, or runtime. Functions take plain data and return
//! results, making them unit-testable and portable across the engine crate,
//! the headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`catalog`] | Immutable skill definitions loaded from a JSON table |
//! | [`config`] | Engine configuration (viewport bounds, layout, debounce) |
//! | [`cost`] | Next-level purchase price |
//! | [`effects`] | Stat families, aggregation rules, capstone bonuses |
//! | [`graph`] | Parent→children unlock edges, BFS depth, cycle report |
//! | [`layout`] | World-space node centers and radii with fallback placement |
//! | [`progression`] | Persisted records + session overlay, effective state |
//! | [`render`] | Read-only per-frame snapshot of visible nodes and edges |
//! | [`viewport`] | Pan/zoom affine transform, drag state, hit-testing |
//! | [`visibility`] | Visible node set propagated through purchased ancestors |
//!
//! # Example
//!
//! ```
//! use skilltree_logic::catalog::SkillCatalog;
//! use skilltree_logic::graph::SkillGraph;
//! use skilltree_logic::progression::ProgressionStore;
//! use skilltree_logic::visibility::visible_nodes;
//!
//! let catalog = SkillCatalog::from_json(r#"{
//!     "root": "core",
//!     "skills": [
//!         { "id": "core", "name": "Core", "base_cost": 0, "cost_multiplier": 1, "max_level": 1,
//!           "children": ["speed"] },
//!         { "id": "speed", "name": "Speed", "base_cost": 50, "cost_multiplier": 1.8, "max_level": 5 }
//!     ]
//! }"#).unwrap();
//! let graph = SkillGraph::from_catalog(&catalog);
//! let mut store = ProgressionStore::new();
//!
//! assert_eq!(visible_nodes(&graph, &store).len(), 1);
//! store.apply_purchase("core", graph.children("core"));
//! assert!(store.effectively_unlocked("speed"));
//! assert_eq!(visible_nodes(&graph, &store).len(), 2);
//! ```

pub mod catalog;
pub mod config;
pub mod cost;
pub mod effects;
pub mod graph;
pub mod layout;
pub mod progression;
pub mod render;
pub mod viewport;
pub mod visibility;

/// Skill identifier as authored in the catalog table.
pub type SkillId = String;

/// Stat key written to the upgrade-state sink.
pub type StatKey = String;
