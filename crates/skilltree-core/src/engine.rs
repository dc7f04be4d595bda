//! Skill tree engine - main entry point for interaction and rendering
//!
//! All mutation (purchase, drag, zoom, reset) happens synchronously in
//! response to input events. The render pass only reads. Durable writes are
//! fire-and-forget: continuous viewport changes are debounced, committed
//! actions flush immediately and supersede any pending debounced write.

use std::collections::HashMap;

use thiserror::Error;

use skilltree_logic::catalog::{CatalogError, SkillCatalog, SkillDefinition};
use skilltree_logic::config::{ConfigError, EngineConfig};
use skilltree_logic::cost::next_cost;
use skilltree_logic::effects::{EffectTable, EffectTableError, StatValue};
use skilltree_logic::graph::SkillGraph;
use skilltree_logic::layout::NodeLayout;
use skilltree_logic::progression::{PersistedSkillRecord, ProgressionStore};
use skilltree_logic::render::{build_snapshot, RenderInput, RenderSnapshot};
use skilltree_logic::viewport::{hit_test, HitTarget, Point, Viewport, ViewportState};
use skilltree_logic::visibility::{visible_nodes, VisibleSet};
use skilltree_logic::SkillId;

use crate::collaborators::{Cue, CueEmitter, CurrencyWallet, DurableStore, UpgradeStateSink};
use crate::persistence::WriteScheduler;

/// Why a purchase did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownSkill,
    Locked,
    Maxed,
    InsufficientFunds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Purchased {
        cost: u64,
        new_level: u32,
        /// Children that became unlocked through this purchase.
        unlocked: Vec<SkillId>,
    },
    Rejected(RejectReason),
}

impl PurchaseOutcome {
    pub fn is_purchased(&self) -> bool {
        matches!(self, PurchaseOutcome::Purchased { .. })
    }
}

/// Errors from loading the engine's static tables.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Effects(#[from] EffectTableError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The engine's external collaborators, bundled for construction.
pub struct Collaborators<W, S, D, C> {
    pub wallet: W,
    pub sink: S,
    pub store: D,
    pub cues: C,
}

/// Main skill tree engine
pub struct SkillTreeEngine<W, S, D, C> {
    catalog: SkillCatalog,
    graph: SkillGraph,
    effects: EffectTable,
    layout: NodeLayout,
    progression: ProgressionStore,
    viewport: Viewport,
    config: EngineConfig,
    scheduler: WriteScheduler,
    /// Screen size used to center zoom button steps.
    screen_size: Point,
    /// Seconds, as last reported through `tick`.
    now: f64,

    wallet: W,
    sink: S,
    durable: D,
    cues: C,
}

impl<W, S, D, C> SkillTreeEngine<W, S, D, C>
where
    W: CurrencyWallet,
    S: UpgradeStateSink,
    D: DurableStore,
    C: CueEmitter,
{
    /// Build an engine over loaded tables with fresh progression.
    pub fn new(
        catalog: SkillCatalog,
        effects: EffectTable,
        config: EngineConfig,
        collaborators: Collaborators<W, S, D, C>,
    ) -> Self {
        let graph = SkillGraph::from_catalog(&catalog);
        let layout = NodeLayout::compute(&catalog, &graph, &config.layout);
        let progression = ProgressionStore::for_catalog(&catalog);
        let viewport = Viewport::new(&config.viewport);
        let scheduler = WriteScheduler::new(config.persistence.debounce_secs);

        let mut engine = Self {
            catalog,
            graph,
            effects,
            layout,
            progression,
            viewport,
            config,
            scheduler,
            screen_size: Point::default(),
            now: 0.0,
            wallet: collaborators.wallet,
            sink: collaborators.sink,
            durable: collaborators.store,
            cues: collaborators.cues,
        };
        engine.sync_stats();
        engine
    }

    /// Parse the catalog, effect, and config tables, then build the engine.
    pub fn from_json(
        catalog_json: &str,
        effects_json: &str,
        config_json: &str,
        collaborators: Collaborators<W, S, D, C>,
    ) -> Result<Self, EngineError> {
        let catalog = SkillCatalog::from_json(catalog_json)?;
        let effects = EffectTable::from_json(effects_json, &catalog)?;
        let config = EngineConfig::from_json(config_json)?;
        Ok(Self::new(catalog, effects, config, collaborators))
    }

    // ── Loading ─────────────────────────────────────────────────────────

    /// Replace persisted progression with saved records and resync stats.
    pub fn load_progression(&mut self, records: HashMap<SkillId, PersistedSkillRecord>) {
        let adjusted = self.progression.load_persisted(records, &self.catalog);
        if adjusted > 0 {
            log::warn!("Adjusted {} persisted records while loading", adjusted);
        }
        self.sync_stats();
    }

    pub fn load_viewport(&mut self, state: ViewportState) {
        self.viewport.restore(state);
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn catalog(&self) -> &SkillCatalog {
        &self.catalog
    }

    pub fn graph(&self) -> &SkillGraph {
        &self.graph
    }

    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn progression(&self) -> &ProgressionStore {
        &self.progression
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    pub fn wallet_mut(&mut self) -> &mut W {
        &mut self.wallet
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }

    pub fn cues(&self) -> &C {
        &self.cues
    }

    pub fn effective_level(&self, id: &str) -> u32 {
        self.progression.effective_level(id)
    }

    pub fn effectively_unlocked(&self, id: &str) -> bool {
        self.progression.effectively_unlocked(id)
    }

    /// Price of the next level, `None` for unknown or maxed skills.
    pub fn cost_of(&self, id: &str) -> Option<u64> {
        let def = self.catalog.get(id)?;
        let level = self.progression.effective_level(id);
        (level < def.max_level).then(|| next_cost(def, level))
    }

    pub fn visible_set(&self) -> VisibleSet {
        visible_nodes(&self.graph, &self.progression)
    }

    /// Definitions of the visible nodes, root first in BFS order.
    pub fn visible_nodes(&self) -> Vec<&SkillDefinition> {
        self.visible_set()
            .iter()
            .filter_map(|id| self.catalog.get(id))
            .collect()
    }

    // ── Purchasing ──────────────────────────────────────────────────────

    /// Attempt one level of `id`. Rejections change nothing.
    pub fn purchase(&mut self, id: &str) -> PurchaseOutcome {
        let outcome = self.try_purchase(id);
        match &outcome {
            PurchaseOutcome::Purchased {
                cost, new_level, ..
            } => {
                log::debug!("Purchased `{}` level {} for {}", id, new_level, cost);
                self.cues.emit(Cue::PurchaseSuccess);
                self.flush();
            }
            PurchaseOutcome::Rejected(reason) => {
                log::debug!("Rejected purchase of `{}`: {:?}", id, reason);
                self.cues.emit(Cue::PurchaseRejected);
            }
        }
        outcome
    }

    fn try_purchase(&mut self, id: &str) -> PurchaseOutcome {
        let Some(def) = self.catalog.get(id) else {
            return PurchaseOutcome::Rejected(RejectReason::UnknownSkill);
        };
        if !self.progression.effectively_unlocked(id) {
            return PurchaseOutcome::Rejected(RejectReason::Locked);
        }
        let level = self.progression.effective_level(id);
        if level >= def.max_level {
            return PurchaseOutcome::Rejected(RejectReason::Maxed);
        }
        let cost = next_cost(def, level);
        if self.wallet.balance() < cost || !self.wallet.deduct(cost) {
            return PurchaseOutcome::Rejected(RejectReason::InsufficientFunds);
        }

        let unlocked = self.progression.apply_purchase(id, self.graph.children(id));
        let stats = self.effects.recompute_for(id, &self.progression);
        self.write_stats(&stats);

        PurchaseOutcome::Purchased {
            cost,
            new_level: self.progression.effective_level(id),
            unlocked,
        }
    }

    fn write_stats(&mut self, stats: &[StatValue]) {
        for stat in stats {
            self.sink.set_stat(&stat.stat, stat.value);
        }
    }

    /// Recompute every stat family and write the aggregates.
    pub fn sync_stats(&mut self) {
        let stats = self.effects.recompute_all(&self.progression);
        self.write_stats(&stats);
    }

    /// Discard all session progress and resync stats.
    pub fn reset_session(&mut self) {
        self.progression.reset_session();
        self.sync_stats();
        log::info!("Session reset");
    }

    /// Bank session progress into the persisted layer. Refused in author
    /// mode.
    pub fn commit_session(&mut self) {
        if self.progression.author_mode() {
            log::warn!("Session commit ignored while author mode is on");
            return;
        }
        let touched = self.progression.commit_session();
        log::info!("Committed session progress for {} skills", touched);
        self.flush_progression();
    }

    /// Toggle the authoring escape hatch.
    ///
    /// Turning it off restores session progress to what it was when it went
    /// on; currency spent meanwhile is not refunded.
    pub fn set_author_mode(&mut self, enabled: bool) {
        let changed = if enabled {
            self.progression.enable_author_mode(&self.catalog)
        } else {
            self.progression.disable_author_mode()
        };
        if !changed {
            return;
        }
        self.sync_stats();
        log::info!("Author mode {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn author_mode(&self) -> bool {
        self.progression.author_mode()
    }

    // ── Viewport ────────────────────────────────────────────────────────

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen_size = Point::new(width, height);
    }

    pub fn screen_to_world(&self, x: f32, y: f32) -> Point {
        self.viewport.screen_to_world(Point::new(x, y))
    }

    pub fn world_to_screen(&self, x: f32, y: f32) -> Point {
        self.viewport.world_to_screen(Point::new(x, y))
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        self.viewport.pointer_down(Point::new(x, y));
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        if self.viewport.pointer_move(Point::new(x, y)) {
            self.scheduler.mark_dirty(self.now);
        }
    }

    /// End a drag and persist the viewport immediately.
    pub fn pointer_up(&mut self) {
        if self.viewport.pointer_up() {
            self.flush_viewport();
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        if self.viewport.pan(dx, dy) {
            self.scheduler.mark_dirty(self.now);
        }
    }

    pub fn zoom_at(&mut self, x: f32, y: f32, factor: f32) {
        if self.viewport.zoom_at(Point::new(x, y), factor) {
            self.scheduler.mark_dirty(self.now);
        }
    }

    pub fn wheel(&mut self, x: f32, y: f32, notches: f32) {
        if self.viewport.wheel(Point::new(x, y), notches) {
            self.scheduler.mark_dirty(self.now);
        }
    }

    /// Zoom button: one step in about the screen center, persisted now.
    pub fn zoom_in(&mut self) {
        let center = self.screen_center();
        if self.viewport.zoom_step(center, 1) {
            self.flush_viewport();
        }
    }

    pub fn zoom_out(&mut self) {
        let center = self.screen_center();
        if self.viewport.zoom_step(center, -1) {
            self.flush_viewport();
        }
    }

    /// Return to the configured initial viewport.
    pub fn reset_view(&mut self) {
        self.viewport.restore(self.config.viewport.initial);
        self.flush_viewport();
    }

    fn screen_center(&self) -> Point {
        Point::new(self.screen_size.x / 2.0, self.screen_size.y / 2.0)
    }

    /// Visible node under a screen point.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<SkillId> {
        let world = self.screen_to_world(x, y);
        let visible = self.visible_set();
        let targets = visible.iter().filter_map(|id| {
            self.layout.get(id).map(|p| HitTarget {
                id,
                center: p.center,
                radius: p.radius,
            })
        });
        hit_test(targets, world).map(str::to_string)
    }

    /// Purchase the visible node under a screen point, if any.
    pub fn click(&mut self, x: f32, y: f32) -> Option<PurchaseOutcome> {
        let id = self.hit_test(x, y)?;
        Some(self.purchase(&id))
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Advance the clock; fires a debounced viewport write once quiet.
    pub fn tick(&mut self, now: f64) {
        self.now = now;
        if self.scheduler.due(now) {
            log::debug!("Debounced viewport flush at {:.3}s", now);
            self.flush_viewport();
        }
    }

    pub fn has_pending_write(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Write everything now, superseding any pending debounced write.
    pub fn flush(&mut self) {
        self.flush_progression();
        self.flush_viewport();
    }

    fn flush_viewport(&mut self) {
        self.scheduler.cancel();
        self.durable.write_viewport(&self.viewport.state());
    }

    fn flush_progression(&mut self) {
        self.durable.write_progression(self.progression.persisted());
    }

    // ── Rendering ───────────────────────────────────────────────────────

    /// Read-only snapshot for the current frame.
    pub fn render_snapshot(&self) -> RenderSnapshot {
        let visible = self.visible_set();
        build_snapshot(&RenderInput {
            catalog: &self.catalog,
            graph: &self.graph,
            store: &self.progression,
            layout: &self.layout,
            viewport: &self.viewport,
            visible: &visible,
            balance: self.wallet.balance(),
        })
    }
}
