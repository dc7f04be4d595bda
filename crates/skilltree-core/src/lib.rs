//! SkillTree Core - Skill Tree Progression Engine
//!
//! Wires the pure logic in `skilltree_logic` to the outside world: a currency
//! wallet, a stat sink, durable storage, and feedback cues.
//!
//! # Architecture
//!
//! - **Collaborators**: traits the engine writes through, with in-memory
//!   implementations for tests and the headless harness
//! - **Engine**: purchase protocol, viewport input, debounced persistence
//! - **Persistence**: versioned binary progression saves and JSON viewport
//!
//! # Example
//!
//! ```
//! use skilltree_core::prelude::*;
//!
//! let catalog = r#"{
//!     "root": "core",
//!     "skills": [
//!         { "id": "core", "name": "Core", "base_cost": 0, "cost_multiplier": 1, "max_level": 1,
//!           "children": ["speed"] },
//!         { "id": "speed", "name": "Speed", "base_cost": 50, "cost_multiplier": 1.8, "max_level": 5 }
//!     ]
//! }"#;
//! let effects = r#"{ "families": [
//!     { "stat": "move_speed", "members": ["speed"],
//!       "rule": { "kind": "percent", "base": 10, "percent_per_level": 0.5 } }
//! ] }"#;
//!
//! let mut engine = SkillTreeEngine::from_json(catalog, effects, "{}", Collaborators {
//!     wallet: MemoryWallet::new(100),
//!     sink: RecordingSink::new(),
//!     store: MemoryStore::new(),
//!     cues: SilentCues,
//! }).unwrap();
//!
//! assert!(engine.purchase("core").is_purchased());
//! assert!(engine.purchase("speed").is_purchased());
//! assert_eq!(engine.wallet().balance(), 50);
//! assert_eq!(engine.sink().get("move_speed"), Some(15.0));
//! ```

pub mod collaborators;
pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::collaborators::*;
    pub use crate::engine::{
        Collaborators, EngineError, PurchaseOutcome, RejectReason, SkillTreeEngine,
    };
    pub use crate::persistence::{FileStore, SaveError};
}
