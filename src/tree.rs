// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::ops::ControlFlow;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::colour::Colour;
use crate::types::date::Date;
use crate::types::node_hash::NodeHash;
use crate::types::training::TrainingData;

/// Index of a node in its tree's arena. Only valid for the tree it came
/// from, and only until the next deletion.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
pub struct Node {
    /// The move leading to this node, in UCI notation. `None` at the root.
    mv: Option<String>,
    parent: Option<NodeId>,
    /// Variations in order. The first child is the main line.
    children: Vec<NodeId>,
    to_move: Colour,
    hash: NodeHash,
    /// Present exactly when the node is a solution.
    training: Option<TrainingData>,
}

impl Node {
    pub fn mv(&self) -> Option<&str> {
        self.mv.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn to_move(&self) -> Colour {
        self.to_move
    }

    pub fn hash(&self) -> NodeHash {
        self.hash
    }

    pub fn training(&self) -> Option<&TrainingData> {
        self.training.as_ref()
    }
}

/// Per-tree bookkeeping, stored alongside the root.
#[derive(Clone, Debug, PartialEq)]
pub struct Meta {
    /// The colour the user plays.
    pub colour: Colour,
    /// The starting position of the tree.
    pub root_fen: String,
    /// The last day the daily recompute ran.
    pub latest_access: Date,
    /// How many cards may be admitted per day.
    pub new_limit: u32,
    /// How many admissions are left for `latest_access`.
    pub new_remaining: u32,
}

impl Meta {
    pub fn new(colour: Colour, root_fen: String, today: Date, new_limit: u32) -> Self {
        Self {
            colour,
            root_fen,
            latest_access: today,
            new_limit,
            new_remaining: new_limit,
        }
    }
}

/// A repertoire: a tree of positions, reached from the root by moves.
#[derive(Clone, Debug)]
pub struct Tree {
    meta: Meta,
    nodes: Vec<Node>,
}

impl Tree {
    /// Creates a tree holding only its root. `to_move` is the side to move in
    /// the root position.
    pub fn new(meta: Meta, to_move: Colour) -> Self {
        let root = Node {
            mv: None,
            parent: None,
            children: Vec::new(),
            to_move,
            hash: NodeHash::root(),
            training: None,
        };
        Self {
            meta,
            nodes: vec![root],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// The number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Every node id, in arena order. The root comes first and every parent
    /// precedes its children.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + use<> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// A problem is a position where the training colour is to move.
    pub fn is_problem(&self, id: NodeId) -> bool {
        self.node(id).to_move == self.meta.colour
    }

    /// A solution is the user's answer to a problem.
    pub fn is_solution(&self, id: NodeId) -> bool {
        match self.node(id).parent {
            Some(parent) => self.is_problem(parent),
            None => false,
        }
    }

    pub fn training(&self, id: NodeId) -> Option<&TrainingData> {
        self.node(id).training.as_ref()
    }

    pub fn training_mut(&mut self, id: NodeId) -> Option<&mut TrainingData> {
        self.nodes[id.0].training.as_mut()
    }

    pub fn child_by_move(&self, parent: NodeId, mv: &str) -> Option<NodeId> {
        self.node(parent)
            .children
            .iter()
            .copied()
            .find(|child| self.node(*child).mv.as_deref() == Some(mv))
    }

    /// The moves leading from the root to `id`.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut moves = Vec::new();
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            if let Some(mv) = self.node(current).mv.as_deref() {
                moves.push(mv);
            }
            current = parent;
        }
        moves.reverse();
        moves
    }

    /// Adds a move below `parent`. Solutions start out inactive.
    pub fn add_child(&mut self, parent: NodeId, mv: &str, today: Date) -> Fallible<NodeId> {
        if self.child_by_move(parent, mv).is_some() {
            return fail(format!("move {mv} already exists."));
        }
        let training = if self.is_problem(parent) {
            Some(TrainingData::new(today))
        } else {
            None
        };
        Ok(self.push_child(parent, mv, training))
    }

    /// Adds a move below `parent` with existing training data, as read back
    /// from storage. Fails if the training data does not match the node's
    /// classification.
    pub fn attach(
        &mut self,
        parent: NodeId,
        mv: &str,
        training: Option<TrainingData>,
    ) -> Fallible<NodeId> {
        if self.child_by_move(parent, mv).is_some() {
            return fail(format!("duplicate move {mv} in stored tree."));
        }
        match (self.is_problem(parent), training.is_some()) {
            (true, false) => fail(format!("solution {mv} has no training data.")),
            (false, true) => fail(format!("non-solution {mv} has training data.")),
            _ => Ok(self.push_child(parent, mv, training)),
        }
    }

    fn push_child(&mut self, parent: NodeId, mv: &str, training: Option<TrainingData>) -> NodeId {
        let parent_node = self.node(parent);
        let child = Node {
            mv: Some(mv.to_string()),
            parent: Some(parent),
            children: Vec::new(),
            to_move: parent_node.to_move.opposite(),
            hash: parent_node.hash.child(mv),
            training,
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(child);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Removes the subtree rooted at `id`. Invalidates every `NodeId` issued
    /// for this tree.
    pub fn delete_variation(&mut self, id: NodeId) -> Fallible<()> {
        let Some(parent) = self.node(id).parent else {
            return fail("cannot delete the root of a tree.");
        };
        self.nodes[parent.0].children.retain(|child| *child != id);
        self.compact();
        Ok(())
    }

    /// Makes `id` the main line among its siblings. The other siblings keep
    /// their relative order.
    pub fn promote(&mut self, id: NodeId) -> Fallible<()> {
        let Some(parent) = self.node(id).parent else {
            return fail("cannot promote the root of a tree.");
        };
        let siblings = &mut self.nodes[parent.0].children;
        siblings.retain(|child| *child != id);
        siblings.insert(0, id);
        Ok(())
    }

    /// The children a training walk descends into. At a problem only the
    /// main line is trained; everywhere else every reply is.
    pub fn trained_children(&self, id: NodeId) -> &[NodeId] {
        let children = &self.node(id).children;
        if self.is_problem(id) {
            &children[..children.len().min(1)]
        } else {
            children
        }
    }

    /// Visits `from` and every node below it that a training walk reaches,
    /// depth first, parents before children, variations in order. Stops as
    /// soon as `visit` breaks.
    pub fn walk<B>(
        &self,
        from: NodeId,
        mut visit: impl FnMut(NodeId) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            visit(id)?;
            stack.extend(self.trained_children(id).iter().rev());
        }
        ControlFlow::Continue(())
    }

    /// Solutions reachable from `from` by a training walk, in walk order.
    pub fn reachable_solutions(&self, from: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let _ = self.walk(from, |id| {
            if self.is_solution(id) {
                found.push(id);
            }
            ControlFlow::<()>::Continue(())
        });
        found
    }

    /// Rebuilds the arena in depth-first order, dropping detached nodes.
    fn compact(&mut self) {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.node(id).children.iter().rev());
        }
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new, old) in order.iter().enumerate() {
            remap[old.0] = Some(NodeId(new));
        }
        let nodes = order
            .iter()
            .map(|old| {
                let mut node = self.nodes[old.0].clone();
                node.parent = node.parent.and_then(|parent| remap[parent.0]);
                node.children = node
                    .children
                    .iter()
                    .filter_map(|child| remap[child.0])
                    .collect();
                node
            })
            .collect();
        log::debug!(
            "Compacted tree from {} to {} nodes.",
            self.nodes.len(),
            order.len()
        );
        self.nodes = nodes;
    }
}

#[cfg(test)]
impl Tree {
    pub fn find_by_hash(&self, hash: NodeHash) -> Option<NodeId> {
        self.ids().find(|id| self.node(*id).hash == hash)
    }

    /// Follows a sequence of UCI moves from the root.
    pub fn find_path<S: AsRef<str>>(&self, moves: &[S]) -> Option<NodeId> {
        let mut current = self.root();
        for mv in moves {
            current = self.child_by_move(current, mv.as_ref())?;
        }
        Some(current)
    }
}
