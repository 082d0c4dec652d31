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

use rand::Rng;
use rand::seq::SliceRandom;

use crate::scheduler::Policy;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::date::Date;

/// Whether a card should be rehearsed today.
pub fn is_queueable(tree: &Tree, id: NodeId, today: Date) -> bool {
    match tree.training(id) {
        Some(data) => data.status.is_learning() || data.is_due(today),
        None => false,
    }
}

/// The cards below `from` that are due for rehearsal, in tree order.
pub fn build_queue(tree: &Tree, from: NodeId, today: Date) -> Vec<NodeId> {
    tree.reachable_solutions(from)
        .into_iter()
        .filter(|id| is_queueable(tree, *id, today))
        .collect()
}

pub fn shuffle(queue: &mut [NodeId], rng: &mut impl Rng) {
    queue.shuffle(rng);
}

/// Where to put a failed card back into a queue of `len` cards: a uniform
/// draw from the policy's range, clamped to the queue length, so the card
/// comes back soon but not immediately.
pub fn reinsert_offset(len: usize, policy: &Policy, rng: &mut impl Rng) -> usize {
    let low = policy.requeue_min.min(len);
    let high = policy.requeue_max.min(len);
    rng.random_range(low..=high)
}
