// Copyright 2019 Karl Sundequist Blomdahl <karl.sundequist.blomdahl@gmail.com>
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

use crate::queue::LazyQueue;
use crate::stat::Stat;

/// A dense index into a [`Tree`]'s node arena. `NodeId(0)` is always the
/// root of a freshly constructed tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

/// One node of the search tree.
///
/// Children are not owned directly -- a node only holds the bandit arms
/// leading to them (`queue`); the child `Node` itself is allocated lazily,
/// the first time an arm is selected (see [`Tree::select_next`]).
#[derive(Debug, Clone)]
pub struct Node<T> {
    parent: Option<NodeId>,
    action: String,
    queue: LazyQueue,
    trials: f32,
    minimize: bool,
    exhausted: bool,
    payload: Option<T>,
}

impl<T> Node<T> {
    fn new(parent: Option<NodeId>, action: String, minimize: bool) -> Self {
        Node {
            parent,
            action,
            queue: LazyQueue::new(),
            trials: 0.0,
            minimize,
            exhausted: false,
            payload: None,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn trials(&self) -> f32 {
        self.trials
    }

    pub fn minimize(&self) -> bool {
        self.minimize
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn payload_mut(&mut self) -> Option<&mut T> {
        self.payload.as_mut()
    }

    pub fn set_payload(&mut self, payload: Option<T>) {
        self.payload = payload;
    }

    pub(crate) fn payload_slot(&mut self) -> &mut Option<T> {
        &mut self.payload
    }

    pub fn arms(&self) -> &[Stat] {
        self.queue.arms()
    }

    pub fn queue(&self) -> &LazyQueue {
        &self.queue
    }

    pub fn is_leaf(&self) -> bool {
        self.queue.is_empty()
    }
}

/// An arena of [`Node`]s addressed by [`NodeId`].
///
/// Parent back-references are indices rather than owned pointers, so the
/// tree has no reference cycles: dropping the `Tree` drops a single `Vec`.
#[derive(Debug, Clone)]
pub struct Tree<T> {
    arena: Vec<Node<T>>,
}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Tree<T> {
    pub fn new() -> Self {
        Tree {
            arena: vec![Node::new(None, String::new(), false)],
        }
    }

    pub fn root_id(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn node(&self, id: NodeId) -> &Node<T> {
        &self.arena[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.arena[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node<T>)> {
        self.arena.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    fn alloc(&mut self, parent: NodeId, action: String, minimize: bool) -> NodeId {
        let id = NodeId(self.arena.len());
        self.arena.push(Node::new(Some(parent), action, minimize));
        id
    }

    /// Adds a new, never-tried arm to `id`'s queue. Returns `false` without
    /// effect if an arm for `action` already exists.
    pub fn add_child(&mut self, id: NodeId, action: String, prior: f32) -> bool {
        let node = &self.arena[id.0];
        if node.queue.index_of(&action).is_some() {
            return false;
        }
        self.arena[id.0].queue.append(Stat::new(action, prior));
        true
    }

    pub fn exhaust(&mut self, id: NodeId) {
        self.arena[id.0].exhausted = true;
    }

    pub fn set_minimize(&mut self, id: NodeId, minimize: bool) {
        self.arena[id.0].minimize = minimize;
    }

    /// Promotes the head of `id`'s bandit queue, lazily allocating a child
    /// node for it on first selection. Returns the id of the arm's child,
    /// or `None` if the promoted head still has no recorded child -- this
    /// should not happen given the allocate-then-promote order below, but
    /// callers must treat it as "stay at `id` and expand from here" rather
    /// than assume it can never occur.
    pub fn select_next(&mut self, id: NodeId) -> Option<NodeId> {
        let node = &self.arena[id.0];
        if let Some(head) = node.queue.lazy_head() {
            let action = node.queue.get(head).action.clone();
            let minimize = node.minimize;
            let child_id = self.alloc(id, action, minimize);
            self.arena[id.0].queue.get_mut(head).child = Some(child_id);
        }
        let node = &mut self.arena[id.0];
        node.queue.next();
        node.queue.get(0).child
    }

    /// Adds `(value, count)` to the arm currently at the head of `id`'s
    /// queue and to `id`'s trial counter. Negates `value` first if `id` is
    /// a minimizing node.
    pub fn add_value_runs(&mut self, id: NodeId, value: f32, count: f32) {
        let node = &mut self.arena[id.0];
        let value = if node.minimize { -value } else { value };
        let head = node.queue.get_mut(0);
        head.value += value;
        head.runs += count;
        node.trials += count;
    }

    /// Recomputes and repairs the priority of the arm currently at the head
    /// of `id`'s queue.
    pub fn recompute_priority(&mut self, id: NodeId, explore_factor: f32) {
        let node = &mut self.arena[id.0];
        let trials = node.trials;
        let priority = node.queue.get(0).compute_priority(trials, explore_factor);
        node.queue.decrease(priority);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_child_rejects_duplicates() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.root_id();
        assert!(tree.add_child(root, "a".into(), 1.0));
        assert!(!tree.add_child(root, "a".into(), 1.0));
        assert_eq!(tree.node(root).arms().len(), 1);
    }

    #[test]
    fn select_next_lazily_allocates_child() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.root_id();
        tree.add_child(root, "a".into(), 1.0);
        assert!(tree.node(root).arms()[0].child.is_none());

        let child = tree.select_next(root).expect("freshly allocated arm must have a child");
        assert!(tree.node(root).arms()[0].child.is_some());
        assert_eq!(tree.node(child).parent(), Some(root));
        assert_eq!(tree.node(child).action(), "a");
    }

    #[test]
    fn add_value_runs_updates_trials_and_negates_for_minimize() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.root_id();
        tree.add_child(root, "a".into(), 1.0);
        tree.select_next(root);
        tree.set_minimize(root, true);
        tree.add_value_runs(root, 2.0, 1.0);

        assert_eq!(tree.node(root).trials(), 1.0);
        assert_eq!(tree.node(root).arms()[0].value, -2.0);
    }
}
