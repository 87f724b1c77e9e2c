//! Search tree with arena allocation.
//!
//! Nodes are stored in a contiguous Vec and referenced by NodeId indices.
//! The root is a movable index: advancing the real game re-roots the tree on
//! a child, detaches it from its parent, and compacts the arena down to the
//! surviving subtree so the previous root and its siblings are reclaimed.

use engine_core::GameState;
use rand::Rng;

use crate::node::{same_mover, NodeId, SearchNode};

/// Search tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree<G> {
    /// Arena storing all nodes
    nodes: Vec<SearchNode<G>>,

    /// Root node index (0 after construction and after every re-root)
    root: NodeId,
}

impl<G: GameState> MctsTree<G> {
    /// Create a new tree rooted at `root_state`, which sits `ply` plies into
    /// the game.
    pub fn new<R: Rng + ?Sized>(root_state: G, ply: u32, rng: &mut R) -> Self {
        let root_node = SearchNode::new(root_state, None, ply, rng);
        Self {
            nodes: vec![root_node],
            root: NodeId(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get the root node.
    #[inline]
    pub fn root_node(&self) -> &SearchNode<G> {
        self.get(self.root)
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &SearchNode<G> {
        &self.nodes[id.index()]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<G> {
        &mut self.nodes[id.index()]
    }

    /// Allocate a new node and return its ID.
    pub fn allocate(&mut self, node: SearchNode<G>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the total number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the arena slice for read access.
    #[inline]
    pub fn arena(&self) -> &[SearchNode<G>] {
        &self.nodes
    }

    /// Add a child holding `state` under `parent_id` for the local `action`.
    /// Returns the new child's NodeId.
    pub fn add_child<R: Rng + ?Sized>(
        &mut self,
        parent_id: NodeId,
        action: usize,
        state: G,
        rng: &mut R,
    ) -> NodeId {
        let ply = self.get(parent_id).ply + 1;
        let child = SearchNode::new(state, Some((parent_id, action)), ply, rng);
        let child_id = self.allocate(child);

        self.get_mut(parent_id).children.push((action, child_id));

        child_id
    }

    /// Backpropagate a leaf outcome to the root.
    ///
    /// `value` is from the perspective of the player to move at the leaf. Each
    /// ancestor records it on the edge leading toward the leaf, signed for
    /// the ancestor's player to move: unchanged if the same player moves at
    /// both, negated otherwise. When either side does not report a player the
    /// mover is inferred from ply parity.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f32) {
        let leaf = self.get(leaf_id);
        let leaf_ply = leaf.ply;
        let leaf_player = leaf.to_play;

        let mut current_id = leaf_id;
        while let Some((parent_id, action)) = self.get(current_id).parent {
            let parent = self.get_mut(parent_id);

            let signed = if same_mover(leaf_player, parent.to_play, leaf_ply - parent.ply) {
                value
            } else {
                -value
            };

            parent.w[action] += signed;
            parent.n[action] += 1.0;
            parent.sum_n += 1;

            current_id = parent_id;
        }
    }

    /// Make `new_root` the root: detach it from its parent and drop every
    /// node that is no longer reachable from it.
    ///
    /// Node ids are remapped; the new root is always `NodeId(0)` afterwards.
    pub fn promote(&mut self, new_root: NodeId) -> NodeId {
        self.get_mut(new_root).parent = None;

        let order = self.subtree(new_root);
        let mut remap = vec![None; self.nodes.len()];
        for (new_index, old_id) in order.iter().enumerate() {
            remap[old_id.index()] = Some(NodeId(new_index as u32));
        }

        let mut slots: Vec<Option<SearchNode<G>>> =
            std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());

        for old_id in order {
            let Some(mut node) = slots[old_id.index()].take() else {
                continue;
            };
            node.parent = node
                .parent
                .and_then(|(p, a)| remap[p.index()].map(|p| (p, a)));
            for (_, child) in node.children.iter_mut() {
                if let Some(mapped) = remap[child.index()] {
                    *child = mapped;
                }
            }
            nodes.push(node);
        }

        self.nodes = nodes;
        self.root = NodeId(0);
        self.root
    }

    /// All nodes reachable from `from` by following children, in
    /// breadth-first order starting with `from`.
    pub fn subtree(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = vec![from];
        let mut next = 0;
        while next < order.len() {
            let id = order[next];
            order.extend(self.get(id).children.iter().map(|(_, child)| *child));
            next += 1;
        }
        order
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.root_node();
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.sum_n,
            max_depth: self.compute_max_depth(self.root, 0),
        }
    }

    fn compute_max_depth(&self, node_id: NodeId, current_depth: u32) -> u32 {
        let node = self.get(node_id);
        if node.children.is_empty() {
            return current_depth;
        }

        node.children
            .iter()
            .map(|(_, id)| self.compute_max_depth(*id, current_depth + 1))
            .max()
            .unwrap_or(current_depth)
    }
}

/// Statistics about a search tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub max_depth: u32,
}
