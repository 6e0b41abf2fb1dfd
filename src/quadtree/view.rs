use core::fmt;

use crate::quadtree::arena::NodeArena;
use crate::quadtree::node::NodeId;
use crate::quadtree::node::NodeKey;
use crate::quadtree::node::NodeKind;
use crate::quadtree::point::Point;
use crate::quadtree::square::Square;

/// A read-only handle on one node of a [`SkipQuadTree`](crate::quadtree::SkipQuadTree).
///
/// Borrowing the tree keeps it from being mutated while any handle is alive.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    arena: &'a NodeArena,
    key: NodeKey,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(arena: &'a NodeArena, key: NodeKey) -> Self {
        NodeRef { arena, key }
    }

    pub fn id(&self) -> NodeId {
        self.arena.get(self.key).id
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.arena.get(self.key).kind, NodeKind::Leaf(_))
    }

    /// The stored point, for leaves.
    pub fn point(&self) -> Option<Point> {
        self.arena.leaf(self.key)
    }

    /// The covered square, for branches.
    pub fn square(&self) -> Option<Square> {
        self.arena.branch(self.key).map(|b| b.square)
    }

    /// The child in quadrant `i`. Always `None` for leaves and for `i > 3`.
    pub fn child(&self, i: usize) -> Option<NodeRef<'a>> {
        let branch = self.arena.branch(self.key)?;
        let key = (*branch.children.get(i)?)?;

        Some(NodeRef::new(self.arena, key))
    }

    /// All four child slots in quadrant order.
    pub fn children(&self) -> [Option<NodeRef<'a>>; 4] {
        [0, 1, 2, 3].map(|i| self.child(i))
    }

    /// The branch with the same square one layer finer.
    pub fn finer(&self) -> Option<NodeRef<'a>> {
        let finer = self.arena.branch(self.key)?.finer?;

        Some(NodeRef::new(self.arena, finer))
    }

    /// Every point stored below this node within its own layer, in depth-first quadrant order.
    pub fn points(&self) -> Vec<Point> {
        let mut out = vec![];
        let mut to_process = vec![*self];

        while let Some(node) = to_process.pop() {
            match node.point() {
                Some(p) => out.push(p),
                None => to_process.extend(node.children().into_iter().rev().flatten()),
            }
        }

        out
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.arena.get(self.key))
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.key == other.key
    }
}
