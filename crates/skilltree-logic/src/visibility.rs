//! Visible node set.
//!
//! BFS from the root, which is always visible. Every reached node is
//! visible, but only nodes with `effective_level > 0` propagate to their
//! children. A non-root node is therefore visible iff some root-to-node path
//! has every earlier node purchased.

use std::collections::{HashSet, VecDeque};

use crate::graph::SkillGraph;
use crate::progression::ProgressionStore;
use crate::SkillId;

/// Visible nodes in BFS discovery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    order: Vec<SkillId>,
    members: HashSet<SkillId>,
}

impl VisibleSet {
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn as_slice(&self) -> &[SkillId] {
        &self.order
    }

    fn insert(&mut self, id: &str) -> bool {
        if self.members.insert(id.to_string()) {
            self.order.push(id.to_string());
            true
        } else {
            false
        }
    }
}

/// Compute the visible set for the current effective state.
pub fn visible_nodes(graph: &SkillGraph, store: &ProgressionStore) -> VisibleSet {
    let mut visible = VisibleSet::default();
    let mut queue: VecDeque<&str> = VecDeque::new();
    visible.insert(graph.root());
    queue.push_back(graph.root());

    while let Some(current) = queue.pop_front() {
        if store.effective_level(current) == 0 {
            continue;
        }
        for child in graph.children(current) {
            if visible.insert(child) {
                queue.push_back(child);
            }
        }
    }
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{SkillCatalog, SkillDefinition};

    fn skill(id: &str, children: &[&str]) -> SkillDefinition {
        SkillDefinition {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            base_cost: 1.0,
            cost_multiplier: 1.0,
            max_level: 3,
            children: children.iter().map(|c| c.to_string()).collect(),
            position: None,
            radius: None,
        }
    }

    /// r -> a -> c, r -> b -> c, c -> d
    fn diamond() -> SkillGraph {
        let catalog = SkillCatalog::new(
            "r",
            vec![
                skill("r", &["a", "b"]),
                skill("a", &["c"]),
                skill("b", &["c"]),
                skill("c", &["d"]),
                skill("d", &[]),
            ],
        )
        .unwrap();
        SkillGraph::from_catalog(&catalog)
    }

    fn buy(store: &mut ProgressionStore, graph: &SkillGraph, id: &str) {
        store.apply_purchase(id, graph.children(id));
    }

    #[test]
    fn root_only_when_nothing_bought() {
        let g = diamond();
        let store = ProgressionStore::new();
        let v = visible_nodes(&g, &store);
        assert_eq!(v.as_slice(), &["r"]);
    }

    #[test]
    fn purchased_root_reveals_children_only() {
        let g = diamond();
        let mut store = ProgressionStore::new();
        buy(&mut store, &g, "r");
        let v = visible_nodes(&g, &store);
        assert_eq!(v.as_slice(), &["r", "a", "b"]);
        assert!(!v.contains("c"));
    }

    #[test]
    fn either_parent_reveals_shared_child() {
        let g = diamond();
        let mut store = ProgressionStore::new();
        buy(&mut store, &g, "r");
        buy(&mut store, &g, "b");
        let v = visible_nodes(&g, &store);
        assert!(v.contains("c"));
        assert!(!v.contains("d"));
        assert_eq!(v.len(), 4);
    }

    #[test]
    fn unpurchased_root_hides_everything_below() {
        let g = diamond();
        let mut store = ProgressionStore::new();
        // Bought deep nodes without the root, e.g. via stale persisted data
        buy(&mut store, &g, "a");
        buy(&mut store, &g, "c");
        let v = visible_nodes(&g, &store);
        assert_eq!(v.as_slice(), &["r"]);
    }

    #[test]
    fn reset_hides_orphaned_children() {
        let g = diamond();
        let mut store = ProgressionStore::new();
        buy(&mut store, &g, "r");
        buy(&mut store, &g, "a");
        assert!(visible_nodes(&g, &store).contains("c"));
        store.reset_session();
        let v = visible_nodes(&g, &store);
        assert!(!v.contains("c"));
        assert!(!v.contains("a"));
    }

    #[test]
    fn cycle_terminates() {
        let catalog =
            SkillCatalog::new("r", vec![skill("r", &["a"]), skill("a", &["r"])]).unwrap();
        let g = SkillGraph::from_catalog(&catalog);
        let mut store = ProgressionStore::new();
        buy(&mut store, &g, "r");
        buy(&mut store, &g, "a");
        assert_eq!(visible_nodes(&g, &store).len(), 2);
    }
}
