use slab::Slab;

use crate::quadtree::node::Branch;
use crate::quadtree::node::Node;
use crate::quadtree::node::NodeId;
use crate::quadtree::node::NodeKey;
use crate::quadtree::node::NodeKind;
use crate::quadtree::point::Point;

/// Owns the nodes of every layer of a tree.
///
/// A node's slot is its [`NodeKey`]. Slots are recycled, ids are not: every node ever allocated
/// by one arena gets the next value of the arena's own counter, starting at `1`.
#[derive(Debug)]
pub struct NodeArena {
    nodes: Slab<Node>,
    next_id: u64,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self {
            nodes: Slab::new(),
            next_id: 1,
        }
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn insert_leaf(&mut self, point: Point) -> NodeKey {
        let id = self.next_id();
        self.nodes.insert(Node {
            id,
            kind: NodeKind::Leaf(point),
        })
    }

    pub fn insert_branch(&mut self, branch: Branch) -> NodeKey {
        let id = self.next_id();
        self.nodes.insert(Node {
            id,
            kind: NodeKind::Branch(branch),
        })
    }

    /// Frees a single node. Its children, if any, are left untouched.
    ///
    /// # Panics
    ///
    /// If `key` does not name a live node.
    pub fn remove(&mut self, key: NodeKey) -> Node {
        self.nodes.remove(key)
    }

    /// Frees `key` and every node it owns.
    pub fn remove_subtree(&mut self, key: NodeKey) {
        let mut to_process = vec![key];

        while let Some(key) = to_process.pop() {
            if let NodeKind::Branch(branch) = self.remove(key).kind {
                to_process.extend(branch.children.into_iter().flatten());
            }
        }
    }

    /// # Panics
    ///
    /// If `key` does not name a live node.
    pub fn get(&self, key: NodeKey) -> &Node {
        &self.nodes[key]
    }

    pub fn branch(&self, key: NodeKey) -> Option<&Branch> {
        match &self.nodes.get(key)?.kind {
            NodeKind::Branch(branch) => Some(branch),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn branch_mut(&mut self, key: NodeKey) -> Option<&mut Branch> {
        match &mut self.nodes.get_mut(key)?.kind {
            NodeKind::Branch(branch) => Some(branch),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn leaf(&self, key: NodeKey) -> Option<Point> {
        match self.nodes.get(key)?.kind {
            NodeKind::Leaf(point) => Some(point),
            NodeKind::Branch(_) => None,
        }
    }

    /// Like [`NodeArena::branch`], for keys that must name a branch.
    ///
    /// # Panics
    ///
    /// If `key` is dangling or names a leaf. Both mean the tree's linkage is broken.
    pub fn expect_branch(&self, key: NodeKey) -> &Branch {
        match self.branch(key) {
            Some(branch) => branch,
            None => panic!("node {key} is not a live branch"),
        }
    }

    /// # Panics
    ///
    /// Same as [`NodeArena::expect_branch`].
    pub fn expect_branch_mut(&mut self, key: NodeKey) -> &mut Branch {
        match self.branch_mut(key) {
            Some(branch) => branch,
            None => panic!("node {key} is not a live branch"),
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Frees every node. The id counter keeps running.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}
