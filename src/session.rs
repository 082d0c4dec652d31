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

use std::collections::VecDeque;

use rand::Rng;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::queue::build_queue;
use crate::queue::reinsert_offset;
use crate::queue::shuffle;
use crate::scheduler::Outcome;
use crate::scheduler::Policy;
use crate::scheduler::answer;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::grade::Grade;
use crate::types::grade::Response;
use crate::types::node_hash::NodeHash;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

/// Shows cards to the user and collects their answers.
pub trait Presenter {
    /// Poses the problem above `card`, reveals the solution, and returns the
    /// user's grade, or `Response::Pause` if they want to stop.
    fn rehearse(&mut self, tree: &Tree, card: NodeId) -> Fallible<Response>;
}

/// A record of one graded card.
#[derive(Clone, Debug)]
pub struct Review {
    pub node: NodeHash,
    pub reviewed_at: Timestamp,
    pub grade: Grade,
    /// The card's status after the answer.
    pub status: Status,
    /// Set when the card left the live queue. `None` means it was put back.
    pub due_date: Option<Date>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SessionEnd {
    /// Every card in the queue was answered.
    Completed,
    /// The user stopped early.
    Paused,
}

/// One rehearsal pass over the cards due in a tree.
pub struct Session<'a, R: Rng> {
    tree: &'a mut Tree,
    queue: VecDeque<NodeId>,
    today: Date,
    policy: Policy,
    rng: R,
}

impl<'a, R: Rng> Session<'a, R> {
    /// Collects the cards due below `from` and shuffles them.
    pub fn new(tree: &'a mut Tree, from: NodeId, today: Date, policy: Policy, mut rng: R) -> Self {
        let mut cards = build_queue(tree, from, today);
        shuffle(&mut cards, &mut rng);
        log::debug!("Session queue holds {} cards.", cards.len());
        Self {
            tree,
            queue: cards.into(),
            today,
            policy,
            rng,
        }
    }

    /// The number of cards left in the live queue.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Runs until the queue is empty or the user pauses. `persist` is called
    /// with the whole tree after every graded card.
    pub fn run(
        &mut self,
        presenter: &mut impl Presenter,
        mut persist: impl FnMut(&Tree, &Review) -> Fallible<()>,
    ) -> Fallible<SessionEnd> {
        while let Some(card) = self.queue.pop_front() {
            let grade = match presenter.rehearse(self.tree, card)? {
                Response::Graded(grade) => grade,
                Response::Pause => {
                    log::debug!("Session paused with {} cards left.", self.queue.len());
                    return Ok(SessionEnd::Paused);
                }
            };
            let review = self.apply(card, grade)?;
            persist(self.tree, &review)?;
        }
        log::debug!("Session completed.");
        Ok(SessionEnd::Completed)
    }

    /// Grades a card that has already been taken off the queue.
    fn apply(&mut self, card: NodeId, grade: Grade) -> Fallible<Review> {
        let hash = self.tree.node(card).hash();
        let data = self
            .tree
            .training_mut(card)
            .ok_or_else(|| ErrorReport::new("rehearsed a node that is not a solution."))?;
        let outcome = answer(data, grade, self.today, &self.policy, &mut self.rng)?;
        let data = *data;
        log::debug!(
            "{} {} -> {} due={}",
            hash.short(),
            grade.as_str(),
            data.status,
            data.due_date
        );
        let due_date = match outcome {
            Outcome::Reinsert => {
                let offset = reinsert_offset(self.queue.len(), &self.policy, &mut self.rng);
                self.queue.insert(offset, card);
                None
            }
            Outcome::Scheduled { graduated, .. } => {
                if graduated {
                    let meta = self.tree.meta_mut();
                    meta.new_remaining = meta.new_remaining.saturating_sub(1);
                }
                Some(data.due_date)
            }
        };
        Ok(Review {
            node: hash,
            reviewed_at: Timestamp::now(),
            grade,
            status: data.status,
            due_date,
        })
    }
}
