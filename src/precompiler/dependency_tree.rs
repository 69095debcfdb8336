//! `PackageDependencyTree`: the precompiler's output data model (spec.md
//! §3, §4.3). Plain data — dependency edges plus their reverse (`children`)
//! — with no mutex or "is this node done" bookkeeping: the precompiler runs
//! sequentially, and any concurrency over this tree belongs to the parser
//! stage that consumes it, not to the tree itself.
//!
//! The cycle-detection walk that builds a tree's ordering is grounded in the
//! teacher's `DependencyTracker`/`visit_node` pair in `module_dependencies.rs`:
//! a temp-mark set for the current DFS stack, a visited set for completed
//! nodes, and a topological push-after-children-return order.

use super::package::PackageId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// One DAG node. `done` is an atomic rather than a plain `bool` because
/// spec compliance requires workers downstream (concurrency/worker pool)
/// to flip and poll it from multiple threads once parsing starts; the
/// precompiler itself only ever sets it to `false` at construction.
#[derive(Debug, Default)]
pub struct DependencyTreeNode {
    pub package: PackageId,
    /// Packages this node directly imports.
    pub dependencies: Vec<PackageId>,
    /// Packages that directly import this node (reverse edges).
    pub children: Vec<PackageId>,
    pub done: AtomicBool,
}

impl DependencyTreeNode {
    pub fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }
}

/// The full dependency forest for one compilation unit: every package's
/// node, plus a topological order (dependencies before dependents) that the
/// parser stage can walk to decide scheduling.
#[derive(Debug, Default)]
pub struct PackageDependencyTree {
    nodes: HashMap<PackageId, DependencyTreeNode>,
    pub topological_order: Vec<PackageId>,
}

impl PackageDependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ensure_node(&mut self, package: PackageId) -> &mut DependencyTreeNode {
        self.nodes.entry(package).or_insert_with(|| DependencyTreeNode {
            package,
            dependencies: Vec::new(),
            children: Vec::new(),
            done: AtomicBool::new(false),
        })
    }

    /// Records a directed edge `from` depends on `to`, and its reverse.
    pub fn add_edge(&mut self, from: PackageId, to: PackageId) {
        self.ensure_node(from).dependencies.push(to);
        self.ensure_node(to).children.push(from);
    }

    pub fn node(&self, package: PackageId) -> Option<&DependencyTreeNode> {
        self.nodes.get(&package)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Runs a DFS post-order topological sort over every registered node,
    /// starting from `roots` in order. Returns the first cycle found, as the
    /// ordered list of package ids on the cycle's DFS stack, if any.
    pub fn compute_topological_order(&mut self, roots: &[PackageId]) -> Result<(), Vec<PackageId>> {
        let mut tracker = CycleTracker::default();
        let mut order = Vec::with_capacity(self.nodes.len());

        for &root in roots {
            if !tracker.visited.contains(&root) {
                visit(root, self, &mut tracker, &mut order)?;
            }
        }
        // Any node unreachable from `roots` (shouldn't normally happen, but
        // keeps the order total over every node that was registered).
        let mut remaining: Vec<PackageId> = self.nodes.keys().copied().collect();
        remaining.sort_by_key(|id| id.as_u32());
        for id in remaining {
            if !tracker.visited.contains(&id) {
                visit(id, self, &mut tracker, &mut order)?;
            }
        }

        self.topological_order = order;
        Ok(())
    }
}

#[derive(Default)]
struct CycleTracker {
    temp_mark: std::collections::HashSet<PackageId>,
    visited: std::collections::HashSet<PackageId>,
}

fn visit(
    id: PackageId,
    tree: &PackageDependencyTree,
    tracker: &mut CycleTracker,
    order: &mut Vec<PackageId>,
) -> Result<(), Vec<PackageId>> {
    if tracker.visited.contains(&id) {
        return Ok(());
    }
    if tracker.temp_mark.contains(&id) {
        return Err(vec![id]);
    }

    tracker.temp_mark.insert(id);

    if let Some(node) = tree.node(id) {
        for &dep in &node.dependencies {
            if let Err(mut cycle) = visit(dep, tree, tracker, order) {
                cycle.push(id);
                return Err(cycle);
            }
        }
    }

    tracker.temp_mark.remove(&id);
    tracker.visited.insert(id);
    order.push(id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topological_order_places_dependencies_first() {
        let a = PackageId(0);
        let b = PackageId(1);
        let c = PackageId(2);

        let mut tree = PackageDependencyTree::new();
        tree.ensure_node(a);
        tree.ensure_node(b);
        tree.ensure_node(c);
        tree.add_edge(a, b); // a depends on b
        tree.add_edge(b, c); // b depends on c

        tree.compute_topological_order(&[a]).expect("acyclic");

        let pos = |id: PackageId| tree.topological_order.iter().position(|&x| x == id).unwrap();
        assert!(pos(c) < pos(b));
        assert!(pos(b) < pos(a));
    }

    #[test]
    fn detects_direct_cycle() {
        let a = PackageId(0);
        let b = PackageId(1);

        let mut tree = PackageDependencyTree::new();
        tree.add_edge(a, b);
        tree.add_edge(b, a);

        let result = tree.compute_topological_order(&[a]);
        assert!(result.is_err());
    }
}
