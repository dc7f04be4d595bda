//! SkillTree Headless Scenario Harness
//!
//! Validates progression logic and the bundled data tables without a
//! renderer. Runs entirely in-process with in-memory collaborators.
//!
//! Usage:
//!   cargo run -p skilltree-simtest
//!   cargo run -p skilltree-simtest -- --verbose
//!   RUST_LOG=debug cargo run -p skilltree-simtest

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use skilltree_core::prelude::*;
use skilltree_logic::catalog::SkillCatalog;
use skilltree_logic::config::EngineConfig;
use skilltree_logic::cost::{cumulative_cost, level_cost};
use skilltree_logic::effects::EffectTable;
use skilltree_logic::graph::SkillGraph;

// ── Data tables (same JSON the engine ships with) ───────────────────────
const CATALOG_JSON: &str = include_str!("../../../data/skill_catalog.json");
const EFFECTS_JSON: &str = include_str!("../../../data/effects.json");
const CONFIG_JSON: &str = include_str!("../../../data/engine_config.json");

/// Authoring view of a catalog entry, looser than the engine's.
#[derive(Debug, Deserialize)]
struct AuthoredSkill {
    id: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    position: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct AuthoredCatalog {
    skills: Vec<AuthoredSkill>,
}

type Engine = SkillTreeEngine<MemoryWallet, RecordingSink, MemoryStore, CueLog>;

fn new_engine(balance: u64) -> Result<Engine, EngineError> {
    SkillTreeEngine::from_json(
        CATALOG_JSON,
        EFFECTS_JSON,
        CONFIG_JSON,
        Collaborators {
            wallet: MemoryWallet::new(balance),
            sink: RecordingSink::new(),
            store: MemoryStore::new(),
            cues: CueLog::new(),
        },
    )
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

impl TestResult {
    fn check(name: &str, passed: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== SkillTree Scenario Harness ===\n");

    let mut results = Vec::new();

    // 1. Data table validation
    results.extend(validate_data_tables(verbose));

    // An engine is required for everything below
    let engine_ok = results.iter().all(|r| r.passed);
    if engine_ok {
        // 2. Cost curve
        results.extend(validate_costs(verbose));

        // 3. Purchase protocol
        results.extend(validate_purchases(verbose));

        // 4. Visibility and session reset
        results.extend(validate_visibility(verbose));

        // 5. Stat aggregation and capstones
        results.extend(validate_stats(verbose));

        // 6. Viewport transform
        results.extend(validate_viewport(verbose));

        // 7. Debounced persistence
        results.extend(validate_persistence(verbose));
    }

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Data Tables ──────────────────────────────────────────────────────

fn validate_data_tables(verbose: bool) -> Vec<TestResult> {
    println!("--- Data Tables ---");
    let mut results = Vec::new();

    let catalog = match SkillCatalog::from_json(CATALOG_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult::check(
                "catalog_parse",
                false,
                format!("catalog error: {}", e),
            ));
            return results;
        }
    };
    results.push(TestResult::check(
        "catalog_parse",
        true,
        format!("{} skills, root `{}`", catalog.len(), catalog.root()),
    ));

    let dangling = catalog.dangling_children();
    results.push(TestResult::check(
        "catalog_children_resolve",
        dangling.is_empty(),
        if dangling.is_empty() {
            "every child id has a definition".to_string()
        } else {
            format!("dangling: {:?}", dangling)
        },
    ));

    let graph = SkillGraph::from_catalog(&catalog);
    let unreachable: Vec<&str> = catalog
        .iter()
        .map(|s| s.id.as_str())
        .filter(|id| graph.depth_of(id).is_none())
        .collect();
    results.push(TestResult::check(
        "graph_acyclic",
        !graph.has_cycle(),
        format!("{} cycle edges", graph.cycle_edges().len()),
    ));
    results.push(TestResult::check(
        "graph_all_reachable",
        unreachable.is_empty(),
        format!("max depth {}, unreachable {:?}", graph.max_depth(), unreachable),
    ));

    let root = catalog.get(catalog.root());
    results.push(TestResult::check(
        "root_free_and_single_level",
        root.is_some_and(|r| r.base_cost == 0.0 && r.max_level == 1),
        "root must cost 0 and max at level 1",
    ));

    match serde_json::from_str::<AuthoredCatalog>(CATALOG_JSON) {
        Ok(authored) => {
            let undocumented: Vec<&str> = authored
                .skills
                .iter()
                .filter(|s| s.description.trim().is_empty())
                .map(|s| s.id.as_str())
                .collect();
            let unplaced = authored.skills.iter().filter(|s| s.position.is_none()).count();
            results.push(TestResult::check(
                "catalog_described",
                undocumented.is_empty(),
                format!("missing descriptions: {:?}", undocumented),
            ));
            results.push(TestResult::check(
                "catalog_positions_authored",
                unplaced == 0,
                format!("{} skills fall back to depth layout", unplaced),
            ));
        }
        Err(e) => results.push(TestResult::check(
            "catalog_authoring_view",
            false,
            format!("JSON error: {}", e),
        )),
    }

    match EffectTable::from_json(EFFECTS_JSON, &catalog) {
        Ok(table) => {
            let unmapped: Vec<&str> = catalog
                .iter()
                .map(|s| s.id.as_str())
                .filter(|&id| id != catalog.root() && table.stats_affected_by(id).is_empty())
                .collect();
            results.push(TestResult::check(
                "effects_parse",
                true,
                format!("{} stat families", table.families().len()),
            ));
            results.push(TestResult::check(
                "effects_cover_catalog",
                unmapped.is_empty(),
                format!("skills with no effect: {:?}", unmapped),
            ));
        }
        Err(e) => results.push(TestResult::check(
            "effects_parse",
            false,
            format!("effect table error: {}", e),
        )),
    }

    match EngineConfig::from_json(CONFIG_JSON) {
        Ok(config) => results.push(TestResult::check(
            "config_parse",
            true,
            format!(
                "scale [{}, {}], debounce {}s",
                config.viewport.min_scale,
                config.viewport.max_scale,
                config.persistence.debounce_secs
            ),
        )),
        Err(e) => results.push(TestResult::check(
            "config_parse",
            false,
            format!("config error: {}", e),
        )),
    }

    if verbose {
        for skill in catalog.iter() {
            println!(
                "  {:<14} depth {:?}  max {}  children {:?}",
                skill.id,
                graph.depth_of(&skill.id),
                skill.max_level,
                graph.children(&skill.id)
            );
        }
    }
    results
}

// ── 2. Costs ────────────────────────────────────────────────────────────

fn validate_costs(verbose: bool) -> Vec<TestResult> {
    println!("--- Cost Curve ---");
    let mut results = Vec::new();

    let curve: Vec<u64> = (0..5).map(|n| level_cost(50.0, 1.8, n)).collect();
    results.push(TestResult::check(
        "cost_reference_curve",
        curve == [50, 90, 162, 291, 524],
        format!("{:?}", curve),
    ));

    let Ok(catalog) = SkillCatalog::from_json(CATALOG_JSON) else {
        return results;
    };
    let mut full_tree = 0u64;
    for skill in catalog.iter() {
        let total = cumulative_cost(skill, 0, skill.max_level);
        full_tree = full_tree.saturating_add(total);
        if verbose {
            println!("  {:<14} to max: {}", skill.id, total);
        }
    }
    results.push(TestResult::check(
        "cost_full_tree_finite",
        full_tree < u64::MAX,
        format!("full tree costs {}", full_tree),
    ));
    results
}

// ── 3. Purchases ────────────────────────────────────────────────────────

fn validate_purchases(_verbose: bool) -> Vec<TestResult> {
    println!("--- Purchase Protocol ---");
    let mut results = Vec::new();
    let Ok(mut e) = new_engine(100) else {
        return results;
    };

    let children = e.graph().children(e.catalog().root()).to_vec();
    let locked_before = children.iter().all(|c| !e.effectively_unlocked(c));
    let root_id = e.catalog().root().to_string();
    let outcome = e.purchase(&root_id);
    let unlocked_after = children.iter().all(|c| e.effectively_unlocked(c));
    results.push(TestResult::check(
        "root_purchase_unlocks_children",
        locked_before && unlocked_after && outcome.is_purchased(),
        format!("{:?}", outcome),
    ));
    results.push(TestResult::check(
        "root_maxed_after_purchase",
        e.effective_level(&root_id) == 1
            && e.purchase(&root_id) == PurchaseOutcome::Rejected(RejectReason::Maxed),
        "second root purchase rejected as maxed",
    ));

    let locked = e.purchase("projectile_2");
    results.push(TestResult::check(
        "locked_rejected",
        locked == PurchaseOutcome::Rejected(RejectReason::Locked),
        format!("{:?}", locked),
    ));

    let balance = e.wallet().balance();
    let poor = e.purchase("shield");
    let pricey = e.purchase("projectile_1");
    let pricey2 = e.purchase("projectile_1");
    let pricey3 = e.purchase("projectile_1");
    results.push(TestResult::check(
        "insufficient_funds_no_change",
        (poor == PurchaseOutcome::Rejected(RejectReason::Locked))
            && pricey.is_purchased()
            && pricey2 == PurchaseOutcome::Rejected(RejectReason::InsufficientFunds)
            && pricey3 == pricey2
            && e.wallet().balance() == balance - 50
            && e.effective_level("projectile_1") == 1,
        format!("balance {} → {}", balance, e.wallet().balance()),
    ));

    results.push(TestResult::check(
        "cues_emitted",
        e.cues().count(Cue::PurchaseSuccess) == 2 && e.cues().count(Cue::PurchaseRejected) == 5,
        format!("{:?}", e.cues().cues),
    ));

    // Every skill capped at max regardless of how hard it is hammered
    let Ok(mut rich) = new_engine(u64::MAX / 2) else {
        return results;
    };
    let ids: Vec<String> = rich.catalog().iter().map(|s| s.id.clone()).collect();
    for _ in 0..15 {
        for id in &ids {
            rich.purchase(id);
        }
    }
    let over: Vec<&String> = ids
        .iter()
        .filter(|id| rich.effective_level(id) > rich.catalog().max_level(id))
        .collect();
    let all_maxed = ids
        .iter()
        .all(|id| rich.effective_level(id) == rich.catalog().max_level(id));
    results.push(TestResult::check(
        "levels_capped_at_max",
        over.is_empty() && all_maxed,
        format!("over max: {:?}", over),
    ));
    results
}

// ── 4. Visibility ───────────────────────────────────────────────────────

fn validate_visibility(verbose: bool) -> Vec<TestResult> {
    println!("--- Visibility & Reset ---");
    let mut results = Vec::new();
    let Ok(mut e) = new_engine(10_000) else {
        return results;
    };

    results.push(TestResult::check(
        "only_root_visible_initially",
        e.visible_nodes().len() == 1,
        format!("{} visible", e.visible_nodes().len()),
    ));

    e.purchase("core");
    for _ in 0..3 {
        e.purchase("projectile_1");
    }
    let shown: Vec<String> = e.visible_nodes().iter().map(|s| s.id.clone()).collect();
    if verbose {
        println!("  visible after purchases: {:?}", shown);
    }
    results.push(TestResult::check(
        "purchased_node_reveals_children",
        shown.iter().any(|s| s == "projectile_2") && !shown.iter().any(|s| s == "projectile_3"),
        format!("{} visible", shown.len()),
    ));

    e.reset_session();
    let level = e.effective_level("projectile_1");
    let after = e.visible_nodes().len();
    e.reset_session();
    results.push(TestResult::check(
        "reset_collapses_session",
        level == 0 && after == 1 && e.visible_nodes().len() == 1,
        format!("level {}, {} visible", level, after),
    ));

    // Multi-parent capstone opens from either side
    e.purchase("core");
    e.purchase("hull");
    e.purchase("regen");
    results.push(TestResult::check(
        "multi_parent_unlock",
        e.effectively_unlocked("bulwark") && !e.effectively_unlocked("overclock"),
        format!("bulwark parents {:?}", e.graph().parents("bulwark")),
    ));
    results
}

// ── 5. Stats ────────────────────────────────────────────────────────────

fn validate_stats(verbose: bool) -> Vec<TestResult> {
    println!("--- Stat Aggregation ---");
    let mut results = Vec::new();

    let orders: [&[&str]; 2] = [
        &["projectile_1", "projectile_2"],
        &["projectile_1", "projectile_2", "projectile_1"],
    ];
    let mut values = Vec::new();
    for order in orders {
        let Ok(mut e) = new_engine(1_000_000) else {
            return results;
        };
        e.purchase("core");
        for id in order {
            e.purchase(id);
        }
        values.push(e.sink().get("projectile_count"));
    }
    results.push(TestResult::check(
        "tier_family_sums_levels",
        values == [Some(3.0), Some(4.0)],
        format!("{:?}", values),
    ));

    let Ok(mut e) = new_engine(u64::MAX / 2) else {
        return results;
    };
    for id in ["core", "projectile_1", "projectile_2", "projectile_3", "barrage"] {
        e.purchase(id);
    }
    let with_bonus = e.sink().get("projectile_count");
    e.sync_stats();
    e.sync_stats();
    let resynced = e.sink().get("projectile_count");
    results.push(TestResult::check(
        "capstone_applies_once",
        with_bonus == Some(7.0) && resynced == with_bonus,
        format!("{:?} → {:?}", with_bonus, resynced),
    ));

    e.commit_session();
    e.purchase("hull");
    e.purchase("hull");
    let hull = e.sink().get("hull");
    e.reset_session();
    let projectile_after_reset = e.sink().get("projectile_count");
    let hull_after_reset = e.sink().get("hull");
    results.push(TestResult::check(
        "reset_keeps_committed_stats",
        hull == Some(140.0) && hull_after_reset == Some(100.0) && projectile_after_reset == Some(7.0),
        format!(
            "hull {:?} → {:?}, projectiles {:?}",
            hull, hull_after_reset, projectile_after_reset
        ),
    ));

    if verbose {
        let mut stats: Vec<_> = e.sink().stats().iter().collect();
        stats.sort_by(|a, b| a.0.cmp(b.0));
        for (stat, value) in stats {
            println!("  {:<18} {:.3}", stat, value);
        }
    }
    results
}

// ── 6. Viewport ─────────────────────────────────────────────────────────

fn validate_viewport(_verbose: bool) -> Vec<TestResult> {
    println!("--- Viewport ---");
    let mut results = Vec::new();
    let Ok(mut e) = new_engine(0) else {
        return results;
    };

    let mut worst = 0.0f32;
    for &(x, y) in &[(0.0, 0.0), (640.0, 360.0), (1280.0, 720.0), (-200.0, 55.5)] {
        for &factor in &[1.1f32, 0.9, 2.0, 0.5, 4.0, 0.1] {
            let before = e.screen_to_world(x, y);
            e.zoom_at(x, y, factor);
            let after = e.screen_to_world(x, y);
            worst = worst.max(before.distance(after));
        }
    }
    results.push(TestResult::check(
        "zoom_anchor_holds",
        worst < 1e-2,
        format!("worst drift {:.6}", worst),
    ));

    let config = e.config().viewport.clone();
    for _ in 0..100 {
        e.wheel(300.0, 300.0, 1.0);
    }
    let max_hit = (e.viewport().scale() - config.max_scale).abs() < 1e-4;
    for _ in 0..200 {
        e.wheel(300.0, 300.0, -1.0);
    }
    let min_hit = (e.viewport().scale() - config.min_scale).abs() < 1e-4;
    results.push(TestResult::check(
        "scale_clamped",
        max_hit && min_hit,
        format!("bounds [{}, {}]", config.min_scale, config.max_scale),
    ));

    e.reset_view();
    let world = e.screen_to_world(900.0, 400.0);
    let back = e.world_to_screen(world.x, world.y);
    results.push(TestResult::check(
        "transform_round_trip",
        (back.x - 900.0).abs() < 1e-3 && (back.y - 400.0).abs() < 1e-3,
        format!("({:.3}, {:.3})", back.x, back.y),
    ));

    let root_screen = e.world_to_screen(0.0, 0.0);
    let hit = e.hit_test(root_screen.x, root_screen.y);
    let miss = e.hit_test(root_screen.x, root_screen.y + 140.0);
    results.push(TestResult::check(
        "hit_test_visible_only",
        hit.as_deref() == Some("core") && miss.is_none(),
        format!("hit {:?}, hidden child {:?}", hit, miss),
    ));
    results
}

// ── 7. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Debounced Persistence ---");
    let mut results = Vec::new();
    let Ok(mut e) = new_engine(1_000) else {
        return results;
    };

    // 30 wheel notches over 1.5s, then silence
    for i in 0..30 {
        e.tick(i as f64 * 0.05);
        e.wheel(400.0, 300.0, if i % 2 == 0 { 1.0 } else { -0.5 });
    }
    let during = e.durable().viewport_writes;
    e.tick(1.6);
    let early = e.durable().viewport_writes;
    e.tick(2.5);
    let settled = e.durable().viewport_writes;
    results.push(TestResult::check(
        "wheel_spam_coalesces",
        during == 0 && early == 0 && settled == 1,
        format!("writes: {} during, {} at 1.6s, {} settled", during, early, settled),
    ));

    e.pointer_down(10.0, 10.0);
    e.pointer_move(30.0, 10.0);
    e.pointer_move(50.0, 25.0);
    let mid_drag = e.durable().viewport_writes;
    e.pointer_up();
    e.tick(10.0);
    results.push(TestResult::check(
        "drag_release_flushes_once",
        mid_drag == 1 && e.durable().viewport_writes == 2 && !e.has_pending_write(),
        format!("{} viewport writes", e.durable().viewport_writes),
    ));

    e.pan(5.0, 5.0);
    e.purchase("core");
    results.push(TestResult::check(
        "purchase_supersedes_debounce",
        e.durable().progression_writes == 1 && !e.has_pending_write(),
        format!(
            "{} progression writes, {} viewport writes",
            e.durable().progression_writes,
            e.durable().viewport_writes
        ),
    ));
    results
}
