//! Connectivity graph over the skill catalog.
//!
//! `SkillGraph` holds a pre-built parent→children adjacency list and the
//! BFS depth of every node reachable from the root. Depth is first-visit
//! wins: a node with several parents takes the depth of whichever parent is
//! dequeued first, so multi-parent depth follows BFS traversal order.
//!
//! Cycles and dangling children are authoring errors. The graph never fails
//! to build; offending edges are logged and the visited guard in the
//! traversal keeps every node at a single depth.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::catalog::SkillCatalog;
use crate::SkillId;

/// Pre-built unlock graph with BFS depths.
#[derive(Debug, Clone)]
pub struct SkillGraph {
    root: SkillId,
    /// skill → children with a definition, in authored order
    children: HashMap<SkillId, Vec<SkillId>>,
    /// skill → parents, in catalog order
    parents: HashMap<SkillId, Vec<SkillId>>,
    depths: HashMap<SkillId, u32>,
    /// Reachable nodes in BFS visit order.
    bfs_order: Vec<SkillId>,
    /// Edges that close a cycle (parent, child).
    cycle_edges: Vec<(SkillId, SkillId)>,
}

impl SkillGraph {
    /// Build the graph from catalog definitions.
    pub fn from_catalog(catalog: &SkillCatalog) -> Self {
        let mut children: HashMap<SkillId, Vec<SkillId>> = HashMap::new();
        let mut parents: HashMap<SkillId, Vec<SkillId>> = HashMap::new();
        for skill in catalog.iter() {
            let entry = children.entry(skill.id.clone()).or_default();
            for child in &skill.children {
                if !catalog.contains(child) {
                    // Already reported by the catalog loader
                    continue;
                }
                if entry.contains(child) {
                    log::warn!("Skill `{}` lists child `{}` twice", skill.id, child);
                    continue;
                }
                entry.push(child.clone());
                parents
                    .entry(child.clone())
                    .or_default()
                    .push(skill.id.clone());
            }
        }

        let mut graph = Self {
            root: catalog.root().to_string(),
            children,
            parents,
            depths: HashMap::new(),
            bfs_order: Vec::new(),
            cycle_edges: Vec::new(),
        };
        graph.compute_depths();
        graph.cycle_edges = graph.find_cycle_edges();
        for (parent, child) in &graph.cycle_edges {
            log::warn!("Unlock cycle: `{}` -> `{}` leads back to an ancestor", parent, child);
        }
        for skill in catalog.iter() {
            if !graph.depths.contains_key(&skill.id) {
                log::warn!("Skill `{}` is unreachable from root `{}`", skill.id, graph.root);
            }
        }
        graph
    }

    fn compute_depths(&mut self) {
        let mut queue = VecDeque::new();
        self.depths.insert(self.root.clone(), 0);
        self.bfs_order.push(self.root.clone());
        queue.push_back(self.root.clone());

        while let Some(current) = queue.pop_front() {
            let depth = self.depths[&current];
            if let Some(kids) = self.children.get(&current) {
                for child in kids {
                    if self.depths.contains_key(child) {
                        continue;
                    }
                    self.depths.insert(child.clone(), depth + 1);
                    self.bfs_order.push(child.clone());
                    queue.push_back(child.clone());
                }
            }
        }
    }

    /// Iterative DFS from the root; an edge into a node still on the stack
    /// closes a cycle.
    fn find_cycle_edges(&self) -> Vec<(SkillId, SkillId)> {
        let mut on_stack: HashSet<&str> = HashSet::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut edges = Vec::new();
        // (node, index of next child to explore)
        let mut stack: Vec<(&str, usize)> = vec![(self.root.as_str(), 0)];
        on_stack.insert(self.root.as_str());

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let kids = self.children(node);
            if top.1 < kids.len() {
                let child = kids[top.1].as_str();
                top.1 += 1;
                if on_stack.contains(child) {
                    edges.push((node.to_string(), child.to_string()));
                } else if !done.contains(child) {
                    on_stack.insert(child);
                    stack.push((child, 0));
                }
            } else {
                on_stack.remove(node);
                done.insert(node);
                stack.pop();
            }
        }
        edges
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Declared children of a skill; empty for unknown ids.
    pub fn children(&self, id: &str) -> &[SkillId] {
        self.children.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Skills that list `id` as a child.
    pub fn parents(&self, id: &str) -> &[SkillId] {
        self.parents.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// BFS depth from the root. `None` if unreachable or unknown.
    pub fn depth_of(&self, id: &str) -> Option<u32> {
        self.depths.get(id).copied()
    }

    /// Deepest depth of any reachable node.
    pub fn max_depth(&self) -> u32 {
        self.depths.values().copied().max().unwrap_or(0)
    }

    /// Reachable nodes in BFS visit order, root first.
    pub fn bfs_order(&self) -> &[SkillId] {
        &self.bfs_order
    }

    /// Edges that lead back to an ancestor.
    pub fn cycle_edges(&self) -> &[(SkillId, SkillId)] {
        &self.cycle_edges
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycle_edges.is_empty()
    }

    /// Number of skills with a node in the graph.
    pub fn node_count(&self) -> usize {
        self.children.len()
    }
}
