use std::fmt;
use std::fmt::Debug;

use crate::quadtree::point::Point;
use crate::quadtree::square::Square;

/// Index of a node in the [`NodeArena`](crate::quadtree::arena::NodeArena).
///
/// Keys are recycled once a node is freed, so they are only meaningful while the tree is not
/// mutated. Use [`NodeId`] to tell nodes apart over time.
pub type NodeKey = usize;

/// Stable, increasing identity of a node. Never reused by the arena that handed it out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
}

pub enum NodeKind {
    Leaf(Point),
    Branch(Branch),
}

/// An internal node of one layer.
///
/// `children` are owned by this branch. `finer` is only a reference: it names the branch with the
/// identical square one layer down, which is owned by that layer.
#[derive(Clone)]
pub struct Branch {
    pub square: Square,
    pub children: [Option<NodeKey>; 4],
    pub finer: Option<NodeKey>,
}

impl Branch {
    pub fn new(square: Square) -> Self {
        Branch {
            square,
            children: [None; 4],
            finer: None,
        }
    }

    pub fn child_count(&self) -> usize {
        self.children.iter().flatten().count()
    }

    /// The only child of this branch, if it has exactly one.
    pub fn sole_child(&self) -> Option<NodeKey> {
        let mut children = self.children.iter().flatten();

        match (children.next(), children.next()) {
            (Some(&child), None) => Some(child),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.iter().all(Option::is_none)
    }
}

impl Debug for Branch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let g = |i: Option<NodeKey>| -> isize { i.map_or(-1, |i| i as isize) };
        let [a, b, c, d] = self.children;

        write!(
            f,
            "{} [0: {}, 1: {}, 2: {}, 3: {}] finer: {}",
            self.square,
            g(a),
            g(b),
            g(c),
            g(d),
            g(self.finer)
        )
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            NodeKind::Leaf(p) => write!(f, "#{} {:?}", self.id, p),
            NodeKind::Branch(b) => write!(f, "#{} {:?}", self.id, b),
        }
    }
}
