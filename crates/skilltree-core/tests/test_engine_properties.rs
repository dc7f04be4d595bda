//! Integration tests for the engine against the bundled data tables.
//!
//! Exercises: catalog + effects + config JSON → SkillTreeEngine → purchase,
//! reset, visibility, viewport, stats
//!
//! All tests use in-memory collaborators. No files, no rendering.

use std::collections::{HashMap, HashSet};

use skilltree_core::prelude::*;
use skilltree_logic::catalog::SkillCatalog;
use skilltree_logic::config::EngineConfig;
use skilltree_logic::effects::EffectTable;
use skilltree_logic::graph::SkillGraph;
use skilltree_logic::progression::{PersistedSkillRecord, ProgressionStore};

const CATALOG: &str = include_str!("../../../data/skill_catalog.json");
const EFFECTS: &str = include_str!("../../../data/effects.json");
const CONFIG: &str = include_str!("../../../data/engine_config.json");

const EPS: f32 = 1e-3;

type Engine = SkillTreeEngine<MemoryWallet, RecordingSink, MemoryStore, CueLog>;

// ── Helpers ────────────────────────────────────────────────────────────

fn collaborators(balance: u64) -> Collaborators<MemoryWallet, RecordingSink, MemoryStore, CueLog> {
    Collaborators {
        wallet: MemoryWallet::new(balance),
        sink: RecordingSink::new(),
        store: MemoryStore::new(),
        cues: CueLog::new(),
    }
}

fn engine(balance: u64) -> Engine {
    SkillTreeEngine::from_json(CATALOG, EFFECTS, CONFIG, collaborators(balance))
        .expect("bundled tables should load")
}

fn skill_ids(engine: &Engine) -> Vec<String> {
    engine.catalog().iter().map(|s| s.id.clone()).collect()
}

fn visible_ids(engine: &Engine) -> HashSet<String> {
    engine.visible_nodes().iter().map(|s| s.id.clone()).collect()
}

/// Brute force: does some simple root→target path have every node before
/// the target purchased?
fn reachable_through_purchased(
    graph: &SkillGraph,
    store: &ProgressionStore,
    node: &str,
    target: &str,
    on_path: &mut Vec<String>,
) -> bool {
    if node == target {
        return true;
    }
    if store.effective_level(node) == 0 {
        return false;
    }
    on_path.push(node.to_string());
    let found = graph.children(node).iter().any(|child| {
        !on_path.contains(child)
            && reachable_through_purchased(graph, store, child, target, on_path)
    });
    on_path.pop();
    found
}

fn assert_visibility_invariant(engine: &Engine) {
    let visible = visible_ids(engine);
    let root = engine.catalog().root().to_string();
    assert!(visible.contains(&root), "root must always be visible");
    for id in skill_ids(engine) {
        if id == root {
            continue;
        }
        let expected = reachable_through_purchased(
            engine.graph(),
            engine.progression(),
            &root,
            &id,
            &mut Vec::new(),
        );
        assert_eq!(
            visible.contains(&id),
            expected,
            "visibility of `{}` disagrees with path rule",
            id
        );
    }
}

// ── Bundled data sanity ────────────────────────────────────────────────

#[test]
fn bundled_tables_load_cleanly() {
    let catalog = SkillCatalog::from_json(CATALOG).unwrap();
    assert!(catalog.dangling_children().is_empty());
    let graph = SkillGraph::from_catalog(&catalog);
    assert!(!graph.has_cycle());
    assert_eq!(graph.node_count(), catalog.len());
    assert!(catalog.iter().all(|s| graph.depth_of(&s.id).is_some()));
    EffectTable::from_json(EFFECTS, &catalog).unwrap();
    EngineConfig::from_json(CONFIG).unwrap();
}

#[test]
fn bundled_layout_is_fully_authored() {
    let e = engine(0);
    assert_eq!(e.layout().len(), e.catalog().len());
    assert_eq!(e.layout().placeholder_count(), 0);
}

// ── Level bounds ───────────────────────────────────────────────────────

#[test]
fn effective_level_never_exceeds_max() {
    let mut e = engine(u64::MAX / 2);
    let ids = skill_ids(&e);
    // Hammer every skill, including ones that are locked at first
    for round in 0..12 {
        for (i, id) in ids.iter().enumerate() {
            if (i + round) % 3 != 0 {
                e.purchase(id);
            }
            e.purchase(id);
        }
    }
    for skill in e.catalog().iter() {
        assert_eq!(
            e.effective_level(&skill.id),
            skill.max_level,
            "`{}` should be exactly maxed",
            skill.id
        );
    }
    for id in &ids {
        assert_eq!(e.purchase(id), PurchaseOutcome::Rejected(RejectReason::Maxed));
    }
}

// ── Reset ──────────────────────────────────────────────────────────────

#[test]
fn reset_is_idempotent_and_restores_persisted() {
    let mut e = engine(100_000);
    e.purchase("core");
    e.purchase("hull");
    e.commit_session();
    e.purchase("hull");
    e.purchase("fire_rate");
    e.purchase("fire_rate");

    e.reset_session();
    let after_first: Vec<u32> = skill_ids(&e).iter().map(|id| e.effective_level(id)).collect();
    e.reset_session();
    let after_second: Vec<u32> = skill_ids(&e).iter().map(|id| e.effective_level(id)).collect();
    assert_eq!(after_first, after_second);

    for id in skill_ids(&e) {
        assert_eq!(
            e.effective_level(&id),
            e.progression().persisted_record(&id).current_level
        );
    }
    assert_eq!(e.effective_level("hull"), 1);
    assert_eq!(e.effective_level("fire_rate"), 0);
    assert!(e.progression().session_is_empty());
}

#[test]
fn reset_hides_orphaned_children() {
    let mut e = engine(100_000);
    e.purchase("core");
    for _ in 0..3 {
        assert!(e.purchase("projectile_1").is_purchased());
    }
    assert_eq!(e.effective_level("projectile_1"), 3);
    assert!(visible_ids(&e).contains("projectile_2"));
    assert!(visible_ids(&e).contains("damage"));

    e.reset_session();
    assert_eq!(e.effective_level("projectile_1"), 0);
    let visible = visible_ids(&e);
    assert!(!visible.contains("projectile_2"));
    assert!(!visible.contains("damage"));
    assert_eq!(visible.len(), 1);
}

// ── Cost ───────────────────────────────────────────────────────────────

#[test]
fn projectile_costs_follow_formula() {
    let mut e = engine(10_000);
    e.purchase("core");
    let mut paid = Vec::new();
    while let PurchaseOutcome::Purchased { cost, .. } = e.purchase("projectile_1") {
        paid.push(cost);
    }
    assert_eq!(paid, vec![50, 90, 162, 291, 524]);
    assert_eq!(e.wallet().balance(), 10_000 - paid.iter().sum::<u64>());
}

#[test]
fn unaffordable_purchase_changes_nothing() {
    let mut e = engine(49);
    e.purchase("core");
    let stats_before = e.sink().stats().clone();
    let writes_before = e.durable().progression_writes;
    assert_eq!(
        e.purchase("projectile_1"),
        PurchaseOutcome::Rejected(RejectReason::InsufficientFunds)
    );
    assert_eq!(e.wallet().balance(), 49);
    assert_eq!(e.effective_level("projectile_1"), 0);
    assert_eq!(e.sink().stats(), &stats_before);
    assert_eq!(e.durable().progression_writes, writes_before);
    assert_eq!(e.cues().last(), Some(Cue::PurchaseRejected));
}

// ── Visibility ─────────────────────────────────────────────────────────

#[test]
fn visibility_matches_path_rule_through_play() {
    let mut e = engine(1_000_000);
    assert_visibility_invariant(&e);
    for id in [
        "core",
        "hull",
        "regen",
        "projectile_1",
        "projectile_2",
        "fire_rate",
        "bulwark",
    ] {
        e.purchase(id);
        assert_visibility_invariant(&e);
    }
    e.reset_session();
    assert_visibility_invariant(&e);
}

#[test]
fn multi_parent_node_unlocks_from_either_parent() {
    let mut e = engine(1_000_000);
    e.purchase("core");
    e.purchase("hull");
    assert!(!e.effectively_unlocked("bulwark"));
    e.purchase("regen");
    assert!(e.effectively_unlocked("bulwark"));
    assert!(visible_ids(&e).contains("bulwark"));
    assert_eq!(e.graph().parents("bulwark").len(), 2);
}

// ── Root scenario ──────────────────────────────────────────────────────

#[test]
fn root_purchase_unlocks_every_child() {
    let mut e = engine(0);
    let children = e.graph().children("core").to_vec();
    assert!(e.effectively_unlocked("core"));
    for child in &children {
        assert!(!e.effectively_unlocked(child));
    }
    let outcome = e.purchase("core");
    assert_eq!(
        outcome,
        PurchaseOutcome::Purchased {
            cost: 0,
            new_level: 1,
            unlocked: children.clone(),
        }
    );
    for child in &children {
        assert!(e.effectively_unlocked(child));
    }
    assert_eq!(e.effective_level("core"), 1);
    assert_eq!(e.purchase("core"), PurchaseOutcome::Rejected(RejectReason::Maxed));
}

// ── Stats ──────────────────────────────────────────────────────────────

const TIERS: &str = r#"{
    "root": "r",
    "skills": [
        { "id": "r", "name": "Root", "base_cost": 0, "cost_multiplier": 1, "max_level": 1,
          "children": ["t1", "t2", "t3"] },
        { "id": "t1", "name": "Tier 1", "base_cost": 1, "cost_multiplier": 1, "max_level": 3 },
        { "id": "t2", "name": "Tier 2", "base_cost": 1, "cost_multiplier": 1, "max_level": 3 },
        { "id": "t3", "name": "Tier 3", "base_cost": 1, "cost_multiplier": 1, "max_level": 3 }
    ]
}"#;

const TIER_EFFECTS: &str = r#"{
    "families": [
        { "stat": "count", "members": ["t1", "t2", "t3"],
          "rule": { "kind": "linear", "base": 2, "per_level": 1 } }
    ]
}"#;

fn tier_engine() -> Engine {
    SkillTreeEngine::from_json(TIERS, TIER_EFFECTS, "{}", collaborators(100)).unwrap()
}

#[test]
fn tier_family_aggregates_regardless_of_order() {
    let mut a = tier_engine();
    a.purchase("r");
    a.purchase("t1");
    a.purchase("t2");

    let mut b = tier_engine();
    b.purchase("r");
    b.purchase("t2");
    b.purchase("t1");

    assert_eq!(a.sink().get("count"), Some(4.0));
    assert_eq!(b.sink().get("count"), Some(4.0));
}

#[test]
fn tier_family_survives_partial_reset() {
    let mut e = tier_engine();
    e.purchase("r");
    e.purchase("t1");
    e.commit_session();
    e.purchase("t2");
    e.purchase("t3");
    assert_eq!(e.sink().get("count"), Some(5.0));
    e.reset_session();
    assert_eq!(e.sink().get("count"), Some(3.0));
}

#[test]
fn capstone_bonus_applies_once() {
    let mut e = engine(u64::MAX / 2);
    for id in ["core", "projectile_1", "projectile_2", "projectile_3"] {
        e.purchase(id);
    }
    assert_eq!(e.sink().get("projectile_count"), Some(4.0));
    assert!(e.purchase("barrage").is_purchased());
    assert_eq!(e.sink().get("projectile_count"), Some(7.0));

    // Redundant recomputation must not stack the bonus
    e.sync_stats();
    e.sync_stats();
    assert_eq!(e.sink().get("projectile_count"), Some(7.0));
    e.purchase("projectile_1");
    assert_eq!(e.sink().get("projectile_count"), Some(8.0));

    e.reset_session();
    assert_eq!(e.sink().get("projectile_count"), Some(1.0));
}

// ── Viewport ───────────────────────────────────────────────────────────

#[test]
fn zoom_keeps_world_point_under_pointer() {
    let mut e = engine(0);
    let pointers = [(0.0, 0.0), (640.0, 360.0), (-50.0, 900.0), (1234.5, 17.25)];
    let factors = [1.1, 0.9, 2.0, 0.5, 10.0, 0.01];
    for &(x, y) in &pointers {
        for &f in &factors {
            let before = e.screen_to_world(x, y);
            e.zoom_at(x, y, f);
            let after = e.screen_to_world(x, y);
            let tol = EPS * before.x.abs().max(before.y.abs()).max(1.0);
            assert!(
                (before.x - after.x).abs() < tol && (before.y - after.y).abs() < tol,
                "anchor drifted at ({}, {}) x{}: {:?} -> {:?}",
                x,
                y,
                f,
                before,
                after
            );
            let scale = e.viewport().scale();
            assert!((0.25..=3.0).contains(&scale));
        }
    }
}

#[test]
fn world_and_screen_transforms_are_inverse() {
    let mut e = engine(0);
    e.pan(-33.0, 12.5);
    e.wheel(200.0, 100.0, 3.0);
    let world = e.screen_to_world(321.0, 654.0);
    let screen = e.world_to_screen(world.x, world.y);
    assert!((screen.x - 321.0).abs() < EPS);
    assert!((screen.y - 654.0).abs() < EPS);
}

#[test]
fn initial_viewport_comes_from_config() {
    let mut e = engine(0);
    assert!((e.viewport().offset().x - 640.0).abs() < EPS);
    e.pan(100.0, 100.0);
    e.reset_view();
    assert!((e.viewport().offset().x - 640.0).abs() < EPS);
    assert!((e.viewport().offset().y - 120.0).abs() < EPS);
    assert_eq!(e.durable().viewport_writes, 1);
}

#[test]
fn click_through_panned_and_zoomed_view() {
    let mut e = engine(1_000);
    // core sits at world (0, 0); initial offset puts it at (640, 120)
    assert!(e.click(640.0, 120.0).unwrap().is_purchased());
    e.zoom_at(640.0, 120.0, 2.0);
    // projectile_1 at world (-160, 140) → screen (640 - 320, 120 + 280)
    assert_eq!(e.hit_test(320.0, 400.0), Some("projectile_1".to_string()));
    // A miss between nodes does nothing
    assert!(e.click(480.0, 260.0).is_none());
}

// ── Rendering ──────────────────────────────────────────────────────────

#[test]
fn snapshot_reflects_state_without_mutating() {
    let mut e = engine(100);
    e.purchase("core");
    let snap = e.render_snapshot();
    assert_eq!(snap.nodes.len(), 4);
    assert_eq!(snap.edges.len(), 3);
    assert_eq!(snap.nodes[0].id, "core");

    let again = e.render_snapshot();
    assert_eq!(snap, again);
    assert_eq!(e.wallet().balance(), 100);
}

// ── Author mode ────────────────────────────────────────────────────────

#[test]
fn author_mode_reveals_everything_then_disappears() {
    let mut e = engine(0);
    e.set_author_mode(true);
    for id in skill_ids(&e) {
        assert!(e.effectively_unlocked(&id));
    }
    // Root counts as purchased, so its children show
    assert_eq!(visible_ids(&e).len(), 4);

    e.set_author_mode(false);
    assert_eq!(e.effective_level("core"), 0);
    assert!(!e.effectively_unlocked("projectile_1"));
    assert_eq!(visible_ids(&e).len(), 1);
}

#[test]
fn author_mode_leaves_no_trace_after_toggle_off() {
    let mut e = engine(1_000);
    e.purchase("core");
    let ids = skill_ids(&e);
    let levels: Vec<u32> = ids.iter().map(|id| e.effective_level(id)).collect();
    let unlocks: Vec<bool> = ids.iter().map(|id| e.effectively_unlocked(id)).collect();
    let stats = e.sink().stats().clone();
    let visible = visible_ids(&e);

    e.set_author_mode(true);
    assert!(e.purchase("projectile_1").is_purchased());
    assert!(e.purchase("projectile_2").is_purchased());
    e.set_author_mode(false);

    let after: Vec<u32> = ids.iter().map(|id| e.effective_level(id)).collect();
    assert_eq!(after, levels);
    let after: Vec<bool> = ids.iter().map(|id| e.effectively_unlocked(id)).collect();
    assert_eq!(after, unlocks);
    assert_eq!(e.sink().stats(), &stats);
    assert_eq!(e.sink().get("projectile_count"), Some(1.0));
    assert_eq!(visible_ids(&e), visible);

    e.commit_session();
    let banked = e.progression().persisted_record("projectile_2");
    assert_eq!(banked.current_level, 0);
    assert!(!banked.unlocked);
}

#[test]
fn loaded_purchase_unlocks_its_children() {
    let mut e = engine(1_000);
    let mut records = HashMap::new();
    records.insert(
        "core".to_string(),
        PersistedSkillRecord {
            current_level: 1,
            unlocked: true,
        },
    );
    e.load_progression(records);

    for id in ["projectile_1", "fire_rate", "hull"] {
        assert!(e.effectively_unlocked(id), "{id} should be unlocked");
    }
    assert_eq!(visible_ids(&e).len(), 4);
    assert!(e.purchase("hull").is_purchased());
    assert_eq!(e.effective_level("hull"), 1);
}
