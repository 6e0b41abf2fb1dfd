//! Range queries across the layers of the tower.

use crate::quadtree::aabb::Aabb;
use crate::quadtree::arena::NodeArena;
use crate::quadtree::node::NodeId;
use crate::quadtree::node::NodeKey;
use crate::quadtree::node::NodeKind;
use crate::quadtree::point::Point;

/// Calls `visit` once for every child that covers a quadrant of the branch `at`.
///
/// A quadrant is resolved in the coarsest layer that already carries its full detail, which is the
/// case when the child there is a branch exactly one level down: that branch spans the whole
/// quadrant and reaches the rest through its own finer link. Anything else, an empty slot, a leaf
/// or a compressed jump, may hide points that only finer layers store, so the quadrant is retried
/// one layer down. In the finest layer every quadrant resolves.
pub fn resolve_quadrants(arena: &NodeArena, mut at: NodeKey, mut visit: impl FnMut(NodeKey)) {
    let mut resolved = [false; 4];

    loop {
        let branch = arena.expect_branch(at);

        for (q, child) in branch.children.iter().enumerate() {
            if resolved[q] {
                continue;
            }

            match (branch.finer, *child) {
                (None, child) => {
                    resolved[q] = true;

                    if let Some(child) = child {
                        visit(child);
                    }
                }
                (Some(_), Some(child)) => {
                    let direct = arena
                        .branch(child)
                        .is_some_and(|b| b.square.is_direct_child_of(&branch.square));

                    if direct {
                        resolved[q] = true;
                        visit(child);
                    }
                }
                (Some(_), None) => {}
            }
        }

        match branch.finer {
            Some(finer) if resolved.contains(&false) => at = finer,
            _ => return,
        }
    }
}

/// Collects every point under `top` inside `rect`, which must already be expanded by eps.
pub fn range_query(arena: &NodeArena, top: NodeKey, rect: &Aabb, out: &mut Vec<(NodeId, Point)>) {
    // (node, whole subtree is inside `rect`)
    let mut to_process = vec![(top, false)];

    while let Some((key, inside)) = to_process.pop() {
        let node = arena.get(key);

        match &node.kind {
            NodeKind::Leaf(p) => {
                if inside || rect.contains(p) {
                    out.push((node.id, *p));
                }
            }
            NodeKind::Branch(branch) => {
                let inside = if inside {
                    true
                } else if rect.is_disjoint(&branch.square) {
                    continue;
                } else {
                    rect.covers(&branch.square)
                };

                resolve_quadrants(arena, key, |child| to_process.push((child, inside)));
            }
        }
    }
}

/// Collects every point under `top`, resolving quadrants the same way as [`range_query`].
pub fn collect_all(arena: &NodeArena, top: NodeKey, out: &mut Vec<(NodeId, Point)>) {
    let mut to_process = vec![top];

    while let Some(key) = to_process.pop() {
        let node = arena.get(key);

        match &node.kind {
            NodeKind::Leaf(p) => out.push((node.id, *p)),
            NodeKind::Branch(_) => resolve_quadrants(arena, key, |child| to_process.push(child)),
        }
    }
}
