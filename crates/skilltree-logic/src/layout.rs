//! World-space placement of skill nodes.
//!
//! Authored coordinates win. Nodes without one are placed on their BFS depth
//! layer, spread horizontally around x = 0 in BFS order. Nodes unreachable
//! from the root go on one extra layer below the deepest.

use std::collections::HashMap;

use crate::catalog::SkillCatalog;
use crate::config::LayoutConfig;
use crate::graph::SkillGraph;
use crate::viewport::Point;
use crate::SkillId;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePlacement {
    pub center: Point,
    pub radius: f32,
    /// True when `center` came from the fallback placement.
    pub placeholder: bool,
}

/// Resolved center and radius for every catalog node.
#[derive(Debug, Clone, Default)]
pub struct NodeLayout {
    placements: HashMap<SkillId, NodePlacement>,
}

impl NodeLayout {
    pub fn compute(catalog: &SkillCatalog, graph: &SkillGraph, config: &LayoutConfig) -> Self {
        // Layers in BFS order, then unreachable nodes in catalog order
        let mut layers: Vec<Vec<&str>> = vec![Vec::new(); graph.max_depth() as usize + 1];
        for id in graph.bfs_order() {
            if let Some(depth) = graph.depth_of(id) {
                layers[depth as usize].push(id);
            }
        }
        let orphans: Vec<&str> = catalog
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| graph.depth_of(id).is_none())
            .collect();
        if !orphans.is_empty() {
            layers.push(orphans);
        }

        let mut fallback: HashMap<&str, Point> = HashMap::new();
        for (depth, layer) in layers.iter().enumerate() {
            let half = (layer.len() as f32 - 1.0) / 2.0;
            for (i, id) in layer.iter().enumerate() {
                fallback.insert(
                    *id,
                    Point::new(
                        (i as f32 - half) * config.sibling_spacing,
                        depth as f32 * config.layer_spacing,
                    ),
                );
            }
        }

        let mut placements = HashMap::with_capacity(catalog.len());
        for skill in catalog.iter() {
            let radius = match skill.radius {
                Some(r) if r > 0.0 => r,
                Some(r) => {
                    log::warn!("Skill `{}` has non-positive radius {}, using default", skill.id, r);
                    config.default_radius
                }
                None => config.default_radius,
            };
            let placement = match skill.position {
                Some(center) => NodePlacement {
                    center,
                    radius,
                    placeholder: false,
                },
                None => {
                    log::warn!("Skill `{}` has no authored position, placing by depth", skill.id);
                    NodePlacement {
                        center: fallback.get(skill.id.as_str()).copied().unwrap_or_default(),
                        radius,
                        placeholder: true,
                    }
                }
            };
            placements.insert(skill.id.clone(), placement);
        }
        Self { placements }
    }

    pub fn get(&self, id: &str) -> Option<&NodePlacement> {
        self.placements.get(id)
    }

    pub fn center(&self, id: &str) -> Option<Point> {
        self.placements.get(id).map(|p| p.center)
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Number of nodes placed by the fallback.
    pub fn placeholder_count(&self) -> usize {
        self.placements.values().filter(|p| p.placeholder).count()
    }
}
