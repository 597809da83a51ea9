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

use crate::stat::Stat;

/// A per-node multi-armed bandit queue.
///
/// `arms[0..lazy_index)` is a valid binary max-heap ordered by
/// `Stat::priority` (ties broken by `Stat::prior`). `arms[lazy_index..]` is
/// an unheapified tail of arms which have never been selected -- they all
/// share priority `+inf`, so any one of them is an equally good next pick
/// and there is no point paying for a heap insert until it is actually
/// chosen.
#[derive(Debug, Clone, Default)]
pub struct LazyQueue {
    lazy_index: usize,
    arms: Vec<Stat>,
}

impl LazyQueue {
    pub fn new() -> Self {
        LazyQueue {
            lazy_index: 0,
            arms: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn has_lazy(&self) -> bool {
        self.lazy_index < self.arms.len()
    }

    /// Index of the next arm that `next()` would promote, if any.
    pub fn lazy_head(&self) -> Option<usize> {
        self.has_lazy().then_some(self.lazy_index)
    }

    pub fn arms(&self) -> &[Stat] {
        &self.arms
    }

    pub fn index_of(&self, action: &str) -> Option<usize> {
        self.arms.iter().position(|a| a.action == action)
    }

    pub fn get(&self, i: usize) -> &Stat {
        &self.arms[i]
    }

    pub fn get_mut(&mut self, i: usize) -> &mut Stat {
        &mut self.arms[i]
    }

    /// Appends a new, never-tried arm to the lazy tail. O(1).
    pub fn append(&mut self, arm: Stat) {
        self.arms.push(arm);
    }

    /// Returns the arm at the head of priority order, promoting one lazy
    /// arm into the heap first if any remain untried.
    ///
    /// Panics if the queue is empty.
    pub fn next(&mut self) -> &Stat {
        if self.has_lazy() {
            self.up(self.lazy_index);
            self.lazy_index += 1;
        }
        &self.arms[0]
    }

    /// Overwrites the payload at `i` without touching heap order. Only valid
    /// when the replacement's priority is unchanged from the original (used
    /// to attach a newly allocated child id to an arm).
    pub fn replace(&mut self, i: usize, arm: Stat) {
        self.arms[i] = arm;
    }

    /// Writes a new priority for the current head (index 0) and repairs the
    /// heap invariant over `[0, lazy_index)`.
    pub fn decrease(&mut self, new_priority: f32) {
        self.arms[0].priority = new_priority;
        self.down(0);
    }

    fn less(&self, i: usize, j: usize) -> bool {
        let (pi, pj) = (self.arms[i].priority, self.arms[j].priority);
        if pi != pj {
            return pi > pj;
        }
        self.arms[i].prior > self.arms[j].prior
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.arms.swap(i, j);
    }

    fn up(&mut self, mut j: usize) {
        loop {
            if j == 0 {
                break;
            }
            let i = (j - 1) / 2;
            if i == j || !self.less(j, i) {
                break;
            }
            self.swap(i, j);
            j = i;
        }
    }

    fn down(&mut self, i0: usize) -> bool {
        let mut i = i0;
        let n = self.lazy_index;
        loop {
            let j1 = 2 * i + 1;
            if j1 >= n {
                break;
            }
            let mut j = j1;
            let j2 = j1 + 1;
            if j2 < n && self.less(j2, j1) {
                j = j2;
            }
            if !self.less(j, i) {
                break;
            }
            self.swap(i, j);
            i = j;
        }
        i > i0
    }

    /// Iterates arms in (approximate) priority order: the untried lazy tail
    /// first, then the heapified prefix in array order. This is not a full
    /// sort of the heap.
    pub fn iter_priority_order(&self) -> impl Iterator<Item = &Stat> {
        let (heap, lazy) = self.arms.split_at(self.lazy_index);
        lazy.iter().chain(heap.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_goes_to_lazy_tail() {
        let mut q = LazyQueue::new();
        q.append(Stat::new("a".into(), 1.0));
        assert!(q.has_lazy());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn next_promotes_lazy_arm_to_head() {
        let mut q = LazyQueue::new();
        q.append(Stat::new("a".into(), 1.0));
        q.append(Stat::new("b".into(), 1.0));
        let head_action = q.next().action.clone();
        assert!(head_action == "a" || head_action == "b");
        assert!(!q.has_lazy() || q.len() == 2);
    }

    #[test]
    fn heap_property_holds_after_decreases() {
        let mut q = LazyQueue::new();
        for name in ["a", "b", "c", "d"] {
            q.append(Stat::new(name.into(), 1.0));
        }
        for _ in 0..4 {
            q.next();
            q.decrease(1.0);
        }
        for i in 0..q.lazy_index {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            if left < q.lazy_index {
                assert!(q.arms[i].priority >= q.arms[left].priority);
            }
            if right < q.lazy_index {
                assert!(q.arms[i].priority >= q.arms[right].priority);
            }
        }
    }

    #[test]
    fn decrease_repairs_head_position() {
        let mut q = LazyQueue::new();
        for name in ["a", "b", "c"] {
            q.append(Stat::new(name.into(), 1.0));
        }
        q.next();
        q.decrease(5.0);
        q.next();
        q.decrease(10.0);
        q.next();
        q.decrease(1.0);
        assert_eq!(q.get(0).priority, 10.0);
    }

    #[test]
    fn replace_overwrites_payload_without_moving_it() {
        let mut q = LazyQueue::new();
        q.append(Stat::new("a".into(), 1.0));
        q.append(Stat::new("b".into(), 1.0));

        let mut arm = q.get(0).clone();
        arm.child = Some(crate::node::NodeId(7));
        q.replace(0, arm);

        assert_eq!(q.get(0).action, "a");
        assert_eq!(q.get(0).child, Some(crate::node::NodeId(7)));
        assert!(q.has_lazy(), "replace must not touch lazy_index");
        assert_eq!(q.len(), 2);
    }
}
