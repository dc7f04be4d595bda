//! Per-frame render snapshot.
//!
//! The render pass is a pure read over current state: it never mutates the
//! progression store or the viewport. A frame built between two mutations
//! simply shows the earlier one.

use serde::Serialize;

use crate::catalog::SkillCatalog;
use crate::cost::next_cost;
use crate::graph::SkillGraph;
use crate::layout::NodeLayout;
use crate::progression::ProgressionStore;
use crate::viewport::{Point, Viewport};
use crate::visibility::VisibleSet;
use crate::SkillId;

/// Purchase availability as shown on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeStatus {
    Locked,
    Affordable,
    Unaffordable,
    Maxed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: SkillId,
    pub name: String,
    pub screen_center: Point,
    /// World radius times the current scale.
    pub screen_radius: f32,
    pub level: u32,
    pub max_level: u32,
    /// Price of the next level, `None` when maxed.
    pub next_cost: Option<u64>,
    pub status: NodeStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    pub from: SkillId,
    pub to: SkillId,
    pub from_screen: Point,
    pub to_screen: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

/// Status of one node given the wallet balance.
pub fn node_status(unlocked: bool, level: u32, max_level: u32, cost: u64, balance: u64) -> NodeStatus {
    if level >= max_level {
        NodeStatus::Maxed
    } else if !unlocked {
        NodeStatus::Locked
    } else if balance >= cost {
        NodeStatus::Affordable
    } else {
        NodeStatus::Unaffordable
    }
}

/// Everything a renderer needs for one frame.
pub struct RenderInput<'a> {
    pub catalog: &'a SkillCatalog,
    pub graph: &'a SkillGraph,
    pub store: &'a ProgressionStore,
    pub layout: &'a NodeLayout,
    pub viewport: &'a Viewport,
    pub visible: &'a VisibleSet,
    pub balance: u64,
}

pub fn build_snapshot(input: &RenderInput<'_>) -> RenderSnapshot {
    let mut snapshot = RenderSnapshot::default();
    let scale = input.viewport.scale();

    for id in input.visible.iter() {
        let (Some(def), Some(place)) = (input.catalog.get(id), input.layout.get(id)) else {
            continue;
        };
        let level = input.store.effective_level(id);
        let cost = next_cost(def, level);
        let status = node_status(
            input.store.effectively_unlocked(id),
            level,
            def.max_level,
            cost,
            input.balance,
        );
        snapshot.nodes.push(NodeView {
            id: def.id.clone(),
            name: def.name.clone(),
            screen_center: input.viewport.world_to_screen(place.center),
            screen_radius: place.radius * scale,
            level,
            max_level: def.max_level,
            next_cost: (status != NodeStatus::Maxed).then_some(cost),
            status,
        });

        for child in input.graph.children(id) {
            if !input.visible.contains(child) {
                continue;
            }
            let (Some(a), Some(b)) = (input.layout.center(id), input.layout.center(child)) else {
                continue;
            };
            snapshot.edges.push(EdgeView {
                from: id.to_string(),
                to: child.clone(),
                from_screen: input.viewport.world_to_screen(a),
                to_screen: input.viewport.world_to_screen(b),
            });
        }
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, LayoutConfig};
    use crate::visibility::visible_nodes;

    const CATALOG: &str = r#"{
        "root": "core",
        "skills": [
            { "id": "core", "name": "Core", "base_cost": 0, "cost_multiplier": 1, "max_level": 1,
              "children": ["a", "b"], "position": { "x": 0, "y": 0 } },
            { "id": "a", "name": "A", "base_cost": 50, "cost_multiplier": 1.8, "max_level": 2,
              "position": { "x": -100, "y": 100 }, "children": ["c"] },
            { "id": "b", "name": "B", "base_cost": 500, "cost_multiplier": 2, "max_level": 2,
              "position": { "x": 100, "y": 100 }, "radius": 10 },
            { "id": "c", "name": "C", "base_cost": 1, "cost_multiplier": 1, "max_level": 1,
              "position": { "x": -100, "y": 200 } }
        ]
    }"#;

    #[test]
    fn status_ordering() {
        assert_eq!(node_status(false, 1, 1, 10, 0), NodeStatus::Maxed);
        assert_eq!(node_status(false, 0, 1, 10, 100), NodeStatus::Locked);
        assert_eq!(node_status(true, 0, 1, 10, 100), NodeStatus::Affordable);
        assert_eq!(node_status(true, 0, 1, 10, 9), NodeStatus::Unaffordable);
    }

    #[test]
    fn snapshot_covers_visible_nodes_and_edges() {
        let catalog = SkillCatalog::from_json(CATALOG).unwrap();
        let graph = SkillGraph::from_catalog(&catalog);
        let mut store = ProgressionStore::for_catalog(&catalog);
        store.apply_purchase("core", graph.children("core"));
        let layout = NodeLayout::compute(&catalog, &graph, &LayoutConfig::default());
        let mut viewport = Viewport::new(&EngineConfig::default().viewport);
        viewport.pan(10.0, 20.0);
        viewport.zoom_at(Point::new(10.0, 20.0), 2.0);
        let visible = visible_nodes(&graph, &store);

        let snap = build_snapshot(&RenderInput {
            catalog: &catalog,
            graph: &graph,
            store: &store,
            layout: &layout,
            viewport: &viewport,
            visible: &visible,
            balance: 100,
        });

        let ids: Vec<&str> = snap.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["core", "a", "b"]);
        assert_eq!(snap.nodes[0].status, NodeStatus::Maxed);
        assert_eq!(snap.nodes[0].next_cost, None);
        assert_eq!(snap.nodes[1].status, NodeStatus::Affordable);
        assert_eq!(snap.nodes[1].next_cost, Some(50));
        assert_eq!(snap.nodes[2].status, NodeStatus::Unaffordable);
        assert!((snap.nodes[2].screen_radius - 20.0).abs() < 1e-4);
        assert_eq!(snap.nodes[1].screen_center, Point::new(-190.0, 220.0));

        // c is hidden, so only the two root edges are drawn
        assert_eq!(snap.edges.len(), 2);
        assert!(snap.edges.iter().all(|e| e.from == "core"));
    }
}
