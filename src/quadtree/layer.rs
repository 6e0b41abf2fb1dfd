//! Operations confined to a single layer of the tower.
//!
//! Every layer is a path-compressed quadtree: a branch exists for the layer's root square and for
//! every square that has at least two non-empty quadrants, and for no other square. Keeping that
//! canonical shape is what makes cross-layer linkage work: a square holding a branch in one layer
//! also holds a branch in every finer layer, because finer layers store a superset of the points.

use tracing::trace;
use tracing::warn;

use crate::quadtree::arena::NodeArena;
use crate::quadtree::node::Branch;
use crate::quadtree::node::NodeKey;
use crate::quadtree::node::NodeKind;
use crate::quadtree::point::Point;
use crate::quadtree::square::Square;

/// Where a point sits in one layer: the deepest branch whose square contains it, and that
/// branch's parent in the same layer (`None` for the layer root).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trail {
    pub parent: Option<NodeKey>,
    pub branch: NodeKey,
}

/// What currently occupies the slot a new point wants.
enum Occupant {
    Point(Point),
    Square(Square),
}

impl Occupant {
    fn fits(&self, sq: &Square) -> bool {
        match self {
            Occupant::Point(p) => sq.contains(p),
            Occupant::Square(inner) => sq.contains_square(inner),
        }
    }

    fn anchor(&self) -> Point {
        match self {
            Occupant::Point(p) => *p,
            Occupant::Square(inner) => inner.midpoint(),
        }
    }
}

/// Quadrant of `p` in `sq`, for points the caller already knows to be inside.
pub(crate) fn slot(sq: &Square, p: &Point) -> usize {
    match sq.quadrant(p) {
        Some(q) => q,
        None => panic!("{p:?} escaped {sq}"),
    }
}

/// Walks down from `at` (whose square must contain `p`) to the deepest branch containing `p`.
pub fn descend(arena: &NodeArena, mut parent: Option<NodeKey>, mut at: NodeKey, p: &Point) -> Trail {
    loop {
        let branch = arena.expect_branch(at);

        let next = branch.children[slot(&branch.square, p)]
            .and_then(|child| arena.branch(child).map(|b| (child, b)));

        match next {
            Some((child, b)) if b.square.contains(p) => {
                parent = Some(at);
                at = child;
            }
            _ => return Trail { parent, branch: at },
        }
    }
}

/// Finds the branch with square `target` in the layer below, starting from `at`.
///
/// `target` must contain `p`, and `at` must be an ancestor-or-self of the wanted branch.
///
/// # Panics
///
/// When no such branch exists. Finer layers hold a superset of the points of coarser ones, so every
/// separating square of a coarse layer is also a branch below; a miss means the tower is broken.
pub fn find_finer(arena: &NodeArena, mut at: NodeKey, target: &Square, p: &Point) -> NodeKey {
    loop {
        let branch = arena.expect_branch(at);

        if branch.square == *target {
            return at;
        }

        let next = branch.children[slot(&branch.square, p)]
            .and_then(|child| arena.branch(child).map(|b| (child, b)));

        match next {
            Some((child, b)) if b.square.contains_square(target) => at = child,
            _ => panic!(
                "broken finer link: no branch at {target} below {}",
                branch.square
            ),
        }
    }
}

/// Shrinks `sq` towards `p` for as long as the occupant still fits in the result.
///
/// This is the path compression step: the returned square is the smallest one separating `p`
/// from the occupant, however many levels below `sq` that is. `None` when subdividing stops
/// shrinking the square before the two are apart, which happens once `f64` runs out of precision.
fn separating_square(mut sq: Square, p: &Point, occupant: &Occupant) -> Option<Square> {
    loop {
        let next = sq.localize(p);

        if !occupant.fits(&next) {
            return Some(sq);
        }

        if !next.is_smaller_than(&sq) {
            return None;
        }

        sq = next;
    }
}

/// Inserts `p` into the layer, starting at branch `at`, whose square must contain `p`.
///
/// Returns `false` when a leaf with the exact same coordinates already exists, or when `p` cannot
/// be told apart from its neighbour at `f64` precision. The layer is left untouched in both cases.
pub fn insert(arena: &mut NodeArena, mut at: NodeKey, p: Point) -> bool {
    loop {
        let branch = arena.expect_branch(at);
        let q = slot(&branch.square, &p);

        let Some(child) = branch.children[q] else {
            let leaf = arena.insert_leaf(p);
            arena.expect_branch_mut(at).children[q] = Some(leaf);
            return true;
        };

        let occupant = match &arena.get(child).kind {
            NodeKind::Leaf(existing) if *existing == p => return false,
            NodeKind::Leaf(existing) => Occupant::Point(*existing),
            NodeKind::Branch(b) if b.square.contains(&p) => {
                at = child;
                continue;
            }
            NodeKind::Branch(b) => Occupant::Square(b.square),
        };

        let Some(square) = separating_square(branch.square.localize(&p), &p, &occupant) else {
            warn!("cannot separate {p:?} from its neighbour below {}", branch.square);
            return false;
        };
        let finer = branch.finer.map(|f| find_finer(arena, f, &square, &p));

        let mut split = Branch::new(square);
        split.finer = finer;
        split.children[slot(&square, &p)] = Some(arena.insert_leaf(p));
        split.children[slot(&square, &occupant.anchor())] = Some(child);

        trace!("splitting slot {q} at {square}");

        let split = arena.insert_branch(split);
        arena.expect_branch_mut(at).children[q] = Some(split);

        return true;
    }
}

/// Removes the leaf holding exactly `p` from the slot `p` falls in under `trail.branch`.
///
/// If the branch is left with a single child and is not the layer root, it is collapsed: the
/// parent takes the child directly. Returns `false` if the slot does not hold `p`.
pub fn remove(arena: &mut NodeArena, trail: Trail, p: &Point) -> bool {
    let branch = arena.expect_branch(trail.branch);
    let q = slot(&branch.square, p);

    let Some(child) = branch.children[q] else {
        return false;
    };

    if arena.leaf(child) != Some(*p) {
        return false;
    }

    arena.expect_branch_mut(trail.branch).children[q] = None;
    arena.remove(child);

    let Some(parent) = trail.parent else {
        return true;
    };

    if let Some(sole) = arena.expect_branch(trail.branch).sole_child() {
        let parent_branch = arena.expect_branch_mut(parent);
        let pq = slot(&parent_branch.square, p);
        parent_branch.children[pq] = Some(sole);

        let collapsed = arena.remove(trail.branch);
        trace!("collapsed {:?}", collapsed);
    }

    true
}
