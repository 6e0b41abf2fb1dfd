use core::fmt;

use tracing::debug;
use tracing::trace;

pub use crate::quadtree::aabb::Aabb;
pub use crate::quadtree::node::NodeId;
pub use crate::quadtree::point::Point;
pub use crate::quadtree::promotion::CoinFlip;
pub use crate::quadtree::promotion::Promote;
pub use crate::quadtree::promotion::from_fn;
pub use crate::quadtree::square::Square;
pub use crate::quadtree::view::NodeRef;

use crate::config::TreeConfig;
use crate::error::Result;
use crate::quadtree::arena::NodeArena;
use crate::quadtree::layer::Trail;
use crate::quadtree::layer::slot;
use crate::quadtree::node::Branch;
use crate::quadtree::node::NodeKey;

mod aabb;
mod arena;
mod layer;
mod node;
mod point;
pub mod promotion;
mod query;
mod square;
mod view;

/// Domain an auto-expanding tree starts from before its first growth.
const INITIAL_DOMAIN: Square = Square::new(0, -1.0, 1.0, -1.0, 1.0);

/// The region a tree indexes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Fixed at construction, points outside are rejected.
    Bounded(Square),

    /// Doubles towards any point that falls outside.
    Expanding(Square),
}

impl Domain {
    pub fn square(&self) -> Square {
        match self {
            Domain::Bounded(sq) | Domain::Expanding(sq) => *sq,
        }
    }
}

/// A randomized skip quadtree over 2-D points.
///
/// The tree is a tower of path-compressed quadtrees over the same domain. The finest layer holds
/// every point, and each point is promoted into the next coarser layer with the probability of
/// its [`Promote`] source. Every branch of a coarser layer links to the branch with the same
/// square one layer down, which lets lookups skip most of the finest layer's depth.
pub struct SkipQuadTree<P = CoinFlip> {
    arena: NodeArena,

    /// Top node of every layer, finest first.
    layers: Vec<NodeKey>,

    domain: Domain,

    /// Number of distinct points
    len: usize,

    promotion: P,
}

impl SkipQuadTree<CoinFlip> {
    /// An empty auto-expanding tree promoting with probability one half.
    pub fn new() -> Self {
        Self::with_promotion(CoinFlip::default())
    }

    /// An empty tree over `[from_x, to_x) x [from_y, to_y)`.
    pub fn bounded(from_x: f64, to_x: f64, from_y: f64, to_y: f64) -> Result<Self> {
        Self::bounded_with_promotion(from_x, to_x, from_y, to_y, CoinFlip::default())
    }

    pub fn from_config(config: &TreeConfig) -> Result<Self> {
        let p = config.promotion_probability;

        let promotion = match config.seed {
            Some(seed) => CoinFlip::seeded(p, seed)?,
            None => CoinFlip::from_os_rng(p)?,
        };

        match config.bounds.filter(|_| !config.expanding) {
            Some(b) => Self::bounded_with_promotion(b.from_x, b.to_x, b.from_y, b.to_y, promotion),
            None => Ok(Self::with_promotion(promotion)),
        }
    }
}

impl Default for SkipQuadTree<CoinFlip> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: Promote> SkipQuadTree<P> {
    pub fn with_promotion(promotion: P) -> Self {
        SkipQuadTree {
            arena: NodeArena::new(),
            layers: vec![],
            domain: Domain::Expanding(INITIAL_DOMAIN),
            len: 0,
            promotion,
        }
    }

    pub fn bounded_with_promotion(
        from_x: f64,
        to_x: f64,
        from_y: f64,
        to_y: f64,
        promotion: P,
    ) -> Result<Self> {
        let mut tree = Self::with_promotion(promotion);
        tree.domain = Domain::Bounded(Square::domain(from_x, to_x, from_y, to_y)?);

        Ok(tree)
    }

    /// Inserts `p`, returning `false` if it is already present, not finite, or outside a bounded
    /// domain. Rejected points leave the tree untouched.
    pub fn insert(&mut self, p: Point) -> bool {
        if !p.is_finite() || !self.reach(&p) {
            return false;
        }

        let Some(&finest) = self.layers.first() else {
            self.layers.push(self.arena.insert_leaf(p));
            self.len = 1;
            return true;
        };

        if let Some(existing) = self.arena.leaf(finest) {
            if existing == p {
                return false;
            }

            let domain = self.domain();
            let mut root = Branch::new(domain);
            root.children[slot(&domain, &existing)] = Some(finest);
            self.layers[0] = self.arena.insert_branch(root);
        }

        let trails = self.locate(&p);

        if !layer::insert(&mut self.arena, trails[0].branch, p) {
            // undo the root wrapped around a lone leaf above
            self.shrink();
            return false;
        }

        self.len += 1;

        for trail in trails.iter().skip(1) {
            if !self.promotion.promote() {
                return true;
            }

            layer::insert(&mut self.arena, trail.branch, p);
        }

        if self.promotion.promote() {
            self.push_layer(p);
        }

        true
    }

    /// Deletes the point stored in the slot `p` falls in, if it lies within `eps` of `p` on both
    /// axes. Returns whether a point was removed.
    pub fn delete(&mut self, p: Point, eps: f64) -> bool {
        let Some(&finest) = self.layers.first() else {
            return false;
        };

        if let Some(only) = self.arena.leaf(finest) {
            if !only.near(&p, eps) {
                return false;
            }

            self.reset();
            return true;
        }

        if !p.is_finite() || !self.domain().contains(&p) {
            return false;
        }

        let trails = self.locate(&p);

        let branch = self.arena.expect_branch(trails[0].branch);
        let hit = branch.children[slot(&branch.square, &p)].and_then(|c| self.arena.leaf(c));

        let hit = match hit {
            Some(hit) if hit.near(&p, eps) => hit,
            _ => return false,
        };

        for trail in trails {
            if !layer::remove(&mut self.arena, trail, &hit) {
                break;
            }
        }

        self.len -= 1;
        self.shrink();

        true
    }

    /// Points inside the rectangle spanned by two arbitrary corners, grown by `eps` on every side.
    pub fn range_query(&self, corner1: Point, corner2: Point, eps: f64) -> Vec<Point> {
        self.range_query_with_id(corner1, corner2, eps)
            .into_iter()
            .map(|(_, p)| p)
            .collect()
    }

    /// Like [`SkipQuadTree::range_query`], along with the id of the leaf each point was found in.
    pub fn range_query_with_id(
        &self,
        corner1: Point,
        corner2: Point,
        eps: f64,
    ) -> Vec<(NodeId, Point)> {
        let rect = Aabb::from_corners(corner1, corner2).expand(eps);
        let mut out = vec![];

        let Some(&top) = self.layers.last() else {
            return out;
        };

        match self.arena.leaf(top) {
            Some(p) if rect.contains(&p) => out.push((self.arena.get(top).id, p)),
            Some(_) => {}
            None => query::range_query(&self.arena, top, &rect, &mut out),
        }

        out
    }

    /// Every stored point.
    pub fn points(&self) -> Vec<Point> {
        let mut out = vec![];

        if let Some(&top) = self.layers.last() {
            query::collect_all(&self.arena, top, &mut out);
        }

        out.into_iter().map(|(_, p)| p).collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of layers in the tower.
    pub fn height(&self) -> usize {
        self.layers.len()
    }

    pub fn domain(&self) -> Square {
        self.domain.square()
    }

    pub fn domain_mode(&self) -> Domain {
        self.domain
    }

    /// Number of live nodes across all layers.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Top node of layer `i`, where `0` is the finest layer.
    pub fn layer(&self, i: usize) -> Option<NodeRef<'_>> {
        let key = *self.layers.get(i)?;

        Some(NodeRef::new(&self.arena, key))
    }

    /// Top node of the coarsest layer.
    pub fn top(&self) -> Option<NodeRef<'_>> {
        self.height().checked_sub(1).and_then(|i| self.layer(i))
    }

    /// Removes every point. An auto-expanding domain goes back to its initial size.
    pub fn clear(&mut self) {
        self.reset();

        if let Domain::Expanding(_) = self.domain {
            self.domain = Domain::Expanding(INITIAL_DOMAIN);
        }
    }

    fn reset(&mut self) {
        self.arena.clear();
        self.layers.clear();
        self.len = 0;
    }

    /// Whether `p` is, or can be made, part of the domain.
    fn reach(&mut self, p: &Point) -> bool {
        let mut domain = match self.domain {
            Domain::Bounded(sq) => return sq.contains(p),
            Domain::Expanding(sq) => sq,
        };

        let mut grown = vec![];

        while !domain.contains(p) {
            let next = domain.grow_toward(p);

            if !next.is_finite() || next.localize(&domain.midpoint()) != domain {
                debug!("cannot grow {domain} towards {p:?}");
                return false;
            }

            grown.push(next);
            domain = next;
        }

        if grown.is_empty() {
            return true;
        }

        // an empty tower or a bare leaf has no roots to move
        let rooted = match self.layers.first() {
            Some(&finest) => self.arena.branch(finest).is_some(),
            None => false,
        };

        if rooted {
            for &sq in &grown {
                self.reroot(sq);
            }
        }

        debug!("domain grew {} times to {domain}", grown.len());
        self.domain = Domain::Expanding(domain);

        true
    }

    /// Hangs the root of every layer under a new root covering `sq`, which must have the current
    /// root square as one of its quadrants.
    fn reroot(&mut self, sq: Square) {
        let mut finer = None;

        for i in 0..self.layers.len() {
            let old = self.layers[i];
            let old_branch = self.arena.expect_branch(old);
            let q = slot(&sq, &old_branch.square.midpoint());

            let mut root = Branch::new(sq);
            root.finer = finer;

            if old_branch.child_count() >= 2 {
                root.children[q] = Some(old);
            } else {
                root.children[q] = old_branch.sole_child();
                self.arena.remove(old);
            }

            let root = self.arena.insert_branch(root);
            self.layers[i] = root;
            finer = Some(root);
        }
    }

    /// The insertion branch of `p` in every layer, finest first.
    ///
    /// The search starts at the coarsest root. In each layer it descends to the deepest branch
    /// containing `p`, then continues in the layer below from the finer twin of that branch's
    /// parent, so the parent of the next branch is known as well.
    fn locate(&self, p: &Point) -> Vec<Trail> {
        let mut trails = Vec::with_capacity(self.layers.len());
        let mut at = self.layers.last().copied();

        while let Some(start) = at {
            let trail = layer::descend(&self.arena, None, start, p);
            trails.push(trail);

            at = self.arena.expect_branch(trail.parent.unwrap_or(trail.branch)).finer;
        }

        trails.reverse();
        trails
    }

    /// Adds a coarsest layer holding only `p`.
    fn push_layer(&mut self, p: Point) {
        let domain = self.domain();
        let coarsest = self.layers.last().copied();

        let mut root = Branch::new(domain);
        root.finer = coarsest;
        root.children[slot(&domain, &p)] = Some(self.arena.insert_leaf(p));

        self.layers.push(self.arena.insert_branch(root));
        debug!("new layer {} for {p:?}", self.layers.len() - 1);
    }

    /// Drops empty coarse layers, and turns a tower left with one point into a bare leaf.
    fn shrink(&mut self) {
        while self.layers.len() > 1 {
            let Some(&top) = self.layers.last() else {
                break;
            };

            if !self.arena.expect_branch(top).is_empty() {
                break;
            }

            self.arena.remove(top);
            self.layers.pop();
            debug!("dropped empty layer {}", self.layers.len());
        }

        match self.len {
            0 => self.reset(),
            1 => {
                let finest = self.layers[0];

                for &coarse in &self.layers[1..] {
                    self.arena.remove_subtree(coarse);
                }

                let Some(leaf) = self.arena.expect_branch(finest).sole_child() else {
                    panic!("one point left, but the finest root does not hold exactly one child");
                };

                self.arena.remove(finest);
                self.layers = vec![leaf];

                trace!("collapsed tower to {:?}", self.arena.get(leaf));
            }
            _ => {}
        }
    }
}

impl<P> fmt::Debug for SkipQuadTree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SkipQuadTree")
            .field("domain", &self.domain)
            .field("len", &self.len)
            .field("height", &self.layers.len())
            .field("nodes", &self.arena.len())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    fn never() -> impl Promote {
        from_fn(|| false)
    }

    fn scenario() -> Vec<Point> {
        [
            (-83.0, 32.0),
            (210.0, 50.0),
            (87.0, 108.0),
            (0.0, 124.0),
            (0.0, 179.0),
            (222.0, 59.0),
            (294.0, 60.0),
            (176.0, 174.0),
        ]
        .map(Point::from)
        .to_vec()
    }

    fn sorted(mut points: Vec<Point>) -> Vec<(f64, f64)> {
        points.sort_by(|a, b| (a.x, a.y).partial_cmp(&(b.x, b.y)).unwrap());
        points.into_iter().map(|p| (p.x, p.y)).collect()
    }

    fn layer_points<P: Promote>(tree: &SkipQuadTree<P>, i: usize) -> Vec<(f64, f64)> {
        sorted(tree.layer(i).map(|l| l.points()).unwrap_or_default())
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(SkipQuadTree::bounded(0.0, 0.0, 0.0, 1.0).is_err());
        assert!(SkipQuadTree::bounded(0.0, 1.0, 2.0, 1.0).is_err());
        assert_eq!(
            SkipQuadTree::bounded(0.0, f64::INFINITY, 0.0, 1.0).unwrap_err(),
            Error::InvalidBounds {
                from_x: 0.0,
                to_x: f64::INFINITY,
                from_y: 0.0,
                to_y: 1.0
            }
        );
    }

    #[test]
    fn rejects_bounds_with_overflowing_midpoint() {
        let tree = SkipQuadTree::bounded_with_promotion(1e308, 1.7e308, 0.0, 1.0, from_fn(|| false));
        assert!(matches!(tree, Err(Error::InvalidBounds { .. })));

        assert!(SkipQuadTree::bounded(-1.7e308, 1.7e308, 0.0, 1.0).is_err());
        assert!(SkipQuadTree::bounded(-5e307, 5e307, 0.0, 1.0).is_ok());
    }

    #[test]
    fn scenario_query_returns_everything() {
        let mut tree = SkipQuadTree::bounded_with_promotion(
            -320.0,
            320.0,
            -240.0,
            240.0,
            CoinFlip::seeded(0.5, 3).unwrap(),
        )
        .unwrap();

        for p in scenario() {
            assert!(tree.insert(p));
        }

        let found = tree.range_query(Point::new(-320.0, -240.0), Point::new(320.0, 240.0), 0.1);

        assert_eq!(tree.len(), 8);
        assert_eq!(sorted(found), sorted(scenario()));
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let mut tree = SkipQuadTree::bounded(-320.0, 320.0, -240.0, 240.0).unwrap();

        assert!(!tree.insert(Point::new(320.0, 0.0)));
        assert!(!tree.insert(Point::new(0.0, -240.5)));
        assert!(!tree.insert(Point::new(f64::NAN, 0.0)));
        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn duplicate_pair_counts_once() {
        let mut tree = SkipQuadTree::bounded_with_promotion(
            -320.0,
            320.0,
            -240.0,
            240.0,
            CoinFlip::seeded(0.5, 11).unwrap(),
        )
        .unwrap();

        for p in scenario() {
            tree.insert(p);
        }

        assert!(tree.insert(Point::new(0.239, 0.2391)));
        assert!(!tree.insert(Point::new(0.239, 0.2391)));
        assert_eq!(tree.len(), 9);
    }

    #[test]
    fn single_point_is_a_bare_leaf() {
        let mut tree = SkipQuadTree::with_promotion(never());

        assert!(tree.top().is_none());

        tree.insert(Point::new(0.5, 0.5));

        let top = tree.top().unwrap();
        assert!(top.is_leaf());
        assert_eq!(top.point(), Some(Point::new(0.5, 0.5)));
        assert_eq!(tree.height(), 1);

        tree.insert(Point::new(-0.5, 0.5));

        let top = tree.top().unwrap();
        assert_eq!(top.square(), Some(tree.domain()));
        assert_eq!(top.children().iter().flatten().count(), 2);
    }

    #[test]
    fn promotion_builds_one_layer_at_a_time() {
        let mut tree = SkipQuadTree::with_promotion(from_fn(|| true));

        tree.insert(Point::new(0.1, 0.1));
        assert_eq!(tree.height(), 1);

        // every later point climbs the whole tower and then adds one layer
        tree.insert(Point::new(0.2, 0.6));
        assert_eq!(tree.height(), 2);
        tree.insert(Point::new(-0.7, 0.3));
        assert_eq!(tree.height(), 3);

        assert_eq!(layer_points(&tree, 0).len(), 3);
        assert_eq!(layer_points(&tree, 1).len(), 2);
        assert_eq!(layer_points(&tree, 2), vec![(-0.7, 0.3)]);
    }

    #[test]
    fn coarse_layers_are_subsets() {
        let mut tree = SkipQuadTree::with_promotion(CoinFlip::seeded(0.5, 5).unwrap());

        for i in 0..200 {
            let x = ((i * 37) % 101) as f64 - 50.0;
            let y = ((i * 53) % 89) as f64 - 44.0;
            tree.insert(Point::new(x, y));
        }

        assert!(tree.height() > 1);

        for i in 1..tree.height() {
            let fine = layer_points(&tree, i - 1);

            for p in layer_points(&tree, i) {
                assert!(fine.contains(&p), "{p:?} in layer {i} but not below");
            }
        }

        assert_eq!(layer_points(&tree, 0).len(), tree.len());
    }

    #[test]
    fn finer_links_match_squares() {
        let mut tree = SkipQuadTree::with_promotion(CoinFlip::seeded(0.6, 8).unwrap());

        for i in 0..150 {
            let x = ((i * 29) % 97) as f64 * 0.5;
            let y = ((i * 71) % 83) as f64 * 0.25;
            tree.insert(Point::new(x, y));
        }

        for i in 1..tree.height() {
            let mut to_process = vec![tree.layer(i).unwrap()];

            while let Some(node) = to_process.pop() {
                let Some(square) = node.square() else {
                    continue;
                };

                assert_eq!(node.finer().and_then(|f| f.square()), Some(square));
                to_process.extend(node.children().into_iter().flatten());
            }
        }

        let mut to_process = vec![tree.layer(0).unwrap()];
        while let Some(node) = to_process.pop() {
            assert!(node.finer().is_none());
            to_process.extend(node.children().into_iter().flatten());
        }
    }

    #[test]
    fn delete_within_eps() {
        let mut tree = SkipQuadTree::bounded_with_promotion(
            -320.0,
            320.0,
            -240.0,
            240.0,
            CoinFlip::seeded(0.5, 1).unwrap(),
        )
        .unwrap();

        for p in scenario() {
            tree.insert(p);
        }

        assert!(!tree.delete(Point::new(200.0, 50.0), 5.0));
        assert!(tree.delete(Point::new(208.0, 52.0), 5.0));
        assert!(!tree.delete(Point::new(210.0, 50.0), 0.0));
        assert_eq!(tree.len(), 7);

        let found = tree.range_query(Point::new(200.0, 40.0), Point::new(220.0, 60.0), 0.0);
        assert!(found.is_empty());
    }

    #[test]
    fn delete_everything() {
        let mut tree = SkipQuadTree::with_promotion(CoinFlip::seeded(0.5, 21).unwrap());

        for p in scenario() {
            tree.insert(p);
        }

        for p in scenario().into_iter().rev() {
            assert!(tree.delete(p, 0.0));
            assert_eq!(tree.points().len(), tree.len());

            if tree.len() == 1 {
                assert!(tree.top().is_some_and(|t| t.is_leaf()));
                assert_eq!(tree.height(), 1);
                assert_eq!(tree.node_count(), 1);
            }
        }

        assert!(tree.is_empty());
        assert!(tree.top().is_none());
        assert_eq!(tree.height(), 0);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn grows_towards_far_points() {
        let mut tree = SkipQuadTree::with_promotion(CoinFlip::seeded(0.5, 4).unwrap());

        assert!(tree.insert(Point::new(0.5, 0.5)));
        assert!(tree.insert(Point::new(-0.5, -0.5)));
        assert!(tree.insert(Point::new(1000.0, -3000.0)));
        assert!(tree.insert(Point::new(-1e6, 1e6)));

        let domain = tree.domain();
        assert!(domain.level < 0);

        for p in tree.points() {
            assert!(domain.contains(&p));
        }

        let found = tree.range_query(Point::new(-2e6, -2e6), Point::new(2e6, 2e6), 0.0);
        assert_eq!(found.len(), 4);

        let found = tree.range_query(Point::new(0.0, 0.0), Point::new(1.0, 1.0), 0.0);
        assert_eq!(sorted(found), vec![(0.5, 0.5)]);
    }

    #[test]
    fn growth_with_single_point_keeps_leaf() {
        let mut tree = SkipQuadTree::with_promotion(never());

        tree.insert(Point::new(0.5, 0.5));
        assert!(tree.insert(Point::new(40.0, 40.0)));

        let top = tree.top().unwrap();
        assert_eq!(top.square(), Some(tree.domain()));
        assert_eq!(sorted(tree.points()), vec![(0.5, 0.5), (40.0, 40.0)]);
    }

    #[test]
    fn seeded_towers_are_identical() {
        let build = || {
            let mut tree = SkipQuadTree::with_promotion(CoinFlip::seeded(0.5, 77).unwrap());

            for i in 0..100 {
                tree.insert(Point::new(i as f64 * 0.37, (i * i % 53) as f64));
            }

            tree
        };

        let (a, b) = (build(), build());

        assert_eq!(a.height(), b.height());
        assert_eq!(a.node_count(), b.node_count());

        for i in 0..a.height() {
            assert_eq!(layer_points(&a, i), layer_points(&b, i));
        }
    }

    #[test]
    fn clear_resets_domain() {
        let mut tree = SkipQuadTree::with_promotion(never());

        tree.insert(Point::new(100.0, 100.0));
        tree.insert(Point::new(-100.0, 100.0));
        tree.clear();

        assert!(tree.is_empty());
        assert_eq!(tree.node_count(), 0);
        assert_eq!(tree.domain(), INITIAL_DOMAIN);
    }
}
