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

use rand::Rng;

use crate::error::Fallible;
use crate::error::fail;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::grade::Grade;
use crate::types::status::Status;
use crate::types::training::TrainingData;

/// Interval after graduating from the learning ladder with `Okay`.
const GRADUATION_INTERVAL: i64 = 1;

/// Interval after graduating from the learning ladder with `Easy`.
const EASY_GRADUATION_INTERVAL: i64 = 3;

/// The minimum review interval in days.
const MIN_INTERVAL: i64 = 1;

/// Base growth factor for a review answered `Okay`. A uniform draw from
/// [0, 1) is added to it.
const OKAY_MULTIPLIER: f64 = 2.0;

/// Base growth factor for a review answered `Easy`.
const EASY_MULTIPLIER: f64 = 4.0;

/// Tunable scheduling parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Policy {
    /// The maximum review interval in days.
    pub max_interval: i64,
    /// Bounds of the offset at which a card is put back into the live queue.
    pub requeue_min: usize,
    pub requeue_max: usize,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_interval: 365,
            requeue_min: 1,
            requeue_max: 4,
        }
    }
}

/// What the session should do with a card after it was answered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    /// Put the card back into the live queue.
    Reinsert,
    /// The card leaves the queue until its due date.
    Scheduled {
        /// Days until the card is due.
        interval: i64,
        /// Whether the card just left the learning ladder.
        graduated: bool,
    },
}

/// Applies one answer to a card.
pub fn answer(
    data: &mut TrainingData,
    grade: Grade,
    today: Date,
    policy: &Policy,
    rng: &mut impl Rng,
) -> Fallible<Outcome> {
    let outcome = match (data.status, grade) {
        (Status::Inactive, _) => {
            return fail("cannot rehearse an inactive card.");
        }
        (_, Grade::Hard) | (Status::New, _) => {
            data.status = Status::FirstStep;
            Outcome::Reinsert
        }
        (Status::FirstStep, Grade::Okay) => {
            data.status = Status::SecondStep;
            Outcome::Reinsert
        }
        (Status::FirstStep, Grade::Easy) | (Status::SecondStep, Grade::Easy) => {
            graduate(data, EASY_GRADUATION_INTERVAL, today)
        }
        (Status::SecondStep, Grade::Okay) => graduate(data, GRADUATION_INTERVAL, today),
        (Status::Review, Grade::Easy) => {
            let multiplier = EASY_MULTIPLIER + rng.random::<f64>();
            grow(data, multiplier, today, policy)
        }
        (Status::Review, Grade::Okay) => {
            let multiplier = OKAY_MULTIPLIER + rng.random::<f64>();
            grow(data, multiplier, today, policy)
        }
    };
    Ok(outcome)
}

fn graduate(data: &mut TrainingData, interval: i64, today: Date) -> Outcome {
    schedule(data, interval, today);
    Outcome::Scheduled {
        interval,
        graduated: true,
    }
}

fn grow(data: &mut TrainingData, multiplier: f64, today: Date, policy: &Policy) -> Outcome {
    let previous = data.gap() as f64;
    let interval = (previous * multiplier).round() as i64;
    let interval = interval.clamp(MIN_INTERVAL, policy.max_interval.max(MIN_INTERVAL));
    schedule(data, interval, today);
    Outcome::Scheduled {
        interval,
        graduated: false,
    }
}

fn schedule(data: &mut TrainingData, interval: i64, today: Date) {
    data.status = Status::Review;
    data.due_date = today.add_days(interval);
    data.last_date = today;
}

/// The budget of an admission pass: how many cards may still become new
/// today, and how many this pass has marked so far.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Admission {
    pub remaining: u32,
    pub marked: u32,
}

impl Admission {
    pub fn new(remaining: u32) -> Self {
        Self {
            remaining,
            marked: 0,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.marked >= self.remaining
    }
}

/// Runs the daily recompute if it has not run yet today. Returns whether it
/// ran.
pub fn daily_recompute(tree: &mut Tree, today: Date) -> bool {
    if tree.meta().latest_access >= today {
        return false;
    }
    let meta = tree.meta_mut();
    meta.latest_access = today;
    meta.new_remaining = meta.new_limit;
    let admitted = refresh_statuses(tree);
    log::info!("Daily recompute for {today}: {admitted} cards admitted.");
    true
}

/// Discards unfinished learning and admits new cards up to today's remaining
/// budget. Returns the number of cards admitted.
pub fn refresh_statuses(tree: &mut Tree) -> u32 {
    let erased = erase_incomplete_learning(tree);
    if erased > 0 {
        log::debug!("Erased incomplete learning on {erased} cards.");
    }
    let budget = Admission::new(tree.meta().new_remaining);
    admit_new(tree, budget).marked
}

/// Sends every card in the learning ladder back to inactive. Cards in review
/// are untouched. Returns the number of cards reset.
pub fn erase_incomplete_learning(tree: &mut Tree) -> usize {
    let mut erased = 0;
    for id in tree.ids() {
        if let Some(data) = tree.training_mut(id) {
            if data.status.is_learning() {
                data.status = Status::Inactive;
                erased += 1;
            }
        }
    }
    erased
}

/// Walks the tree in training order, marking inactive cards as new until the
/// budget runs out. Returns the budget with `marked` updated.
pub fn admit_new(tree: &mut Tree, mut admission: Admission) -> Admission {
    let mut chosen = Vec::new();
    let _ = tree.walk(tree.root(), |id| {
        if admission.exhausted() {
            return ControlFlow::Break(());
        }
        if tree
            .training(id)
            .is_some_and(|data| data.status == Status::Inactive)
        {
            chosen.push(id);
            admission.marked += 1;
        }
        ControlFlow::Continue(())
    });
    for id in chosen {
        if let Some(data) = tree.training_mut(id) {
            data.status = Status::New;
        }
    }
    admission
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::tree::NodeId;
    use crate::tree::tests::add_line;
    use crate::tree::tests::empty_tree;
    use crate::tree::tests::today;
    use crate::types::colour::Colour;

    fn card(status: Status) -> TrainingData {
        TrainingData {
            status,
            ..TrainingData::new(today())
        }
    }

    fn review_card(gap: i64) -> TrainingData {
        TrainingData {
            status: Status::Review,
            due_date: today(),
            last_date: today().add_days(-gap),
        }
    }

    fn run(data: &mut TrainingData, grade: Grade) -> Outcome {
        let mut rng = StdRng::seed_from_u64(7);
        answer(data, grade, today(), &Policy::default(), &mut rng).unwrap()
    }

    /// A tree with `n` independent white answers to `n` black replies.
    fn wide_tree(n: usize) -> (crate::tree::Tree, Vec<NodeId>) {
        let mut tree = empty_tree(Colour::Black);
        let replies = ["a7a6", "b7b6", "c7c6", "d7d6", "e7e6", "f7f6", "g7g6", "h7h6"];
        let firsts = ["a2a3", "b2b3", "c2c3", "d2d3", "e2e3", "f2f3", "g2g3", "h2h3"];
        let mut solutions = Vec::new();
        for i in 0..n {
            solutions.push(add_line(&mut tree, &[firsts[i], replies[i]]));
        }
        (tree, solutions)
    }

    #[test]
    fn test_new_always_steps_up() {
        for grade in [Grade::Easy, Grade::Okay, Grade::Hard] {
            let mut data = card(Status::New);
            assert_eq!(run(&mut data, grade), Outcome::Reinsert);
            assert_eq!(data.status, Status::FirstStep);
        }
    }

    #[test]
    fn test_first_step() {
        let mut data = card(Status::FirstStep);
        assert_eq!(
            run(&mut data, Grade::Easy),
            Outcome::Scheduled {
                interval: 3,
                graduated: true
            }
        );
        assert_eq!(data.status, Status::Review);
        assert_eq!(data.due_date, today().add_days(3));
        assert_eq!(data.last_date, today());

        let mut data = card(Status::FirstStep);
        assert_eq!(run(&mut data, Grade::Okay), Outcome::Reinsert);
        assert_eq!(data.status, Status::SecondStep);

        let mut data = card(Status::FirstStep);
        assert_eq!(run(&mut data, Grade::Hard), Outcome::Reinsert);
        assert_eq!(data.status, Status::FirstStep);
    }

    #[test]
    fn test_second_step() {
        let mut data = card(Status::SecondStep);
        run(&mut data, Grade::Easy);
        assert_eq!(data.status, Status::Review);
        assert_eq!(data.due_date, today().add_days(3));

        let mut data = card(Status::SecondStep);
        assert_eq!(
            run(&mut data, Grade::Okay),
            Outcome::Scheduled {
                interval: 1,
                graduated: true
            }
        );
        assert_eq!(data.due_date, today().add_days(1));

        let mut data = card(Status::SecondStep);
        assert_eq!(run(&mut data, Grade::Hard), Outcome::Reinsert);
        assert_eq!(data.status, Status::FirstStep);
    }

    #[test]
    fn test_review_growth_bounds() {
        let mut data = review_card(10);
        let Outcome::Scheduled {
            interval,
            graduated,
        } = run(&mut data, Grade::Okay)
        else {
            panic!("expected the card to be scheduled");
        };
        assert!(!graduated);
        assert!((20..=30).contains(&interval));
        assert_eq!(data.gap(), interval);
        assert_eq!(data.last_date, today());

        let mut data = review_card(10);
        let Outcome::Scheduled { interval, .. } = run(&mut data, Grade::Easy) else {
            panic!("expected the card to be scheduled");
        };
        assert!((40..=50).contains(&interval));
    }

    #[test]
    fn test_review_interval_ceiling() {
        let mut data = review_card(300);
        let policy = Policy {
            max_interval: 365,
            ..Policy::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        answer(&mut data, Grade::Easy, today(), &policy, &mut rng).unwrap();
        assert_eq!(data.gap(), 365);
    }

    #[test]
    fn test_zero_gap_still_moves_forward() {
        let mut data = review_card(0);
        run(&mut data, Grade::Okay);
        assert_eq!(data.due_date, today().add_days(1));
    }

    #[test]
    fn test_inactive_cannot_be_answered() {
        let mut data = card(Status::Inactive);
        let mut rng = StdRng::seed_from_u64(0);
        let result = answer(&mut data, Grade::Okay, today(), &Policy::default(), &mut rng);
        assert!(result.is_err());
        assert_eq!(data.status, Status::Inactive);
    }

    /// Successive non-failing reviews never shrink the interval, and each
    /// grows by at least the base multiplier.
    #[test]
    fn test_interval_monotonic_growth() {
        let mut rng = StdRng::seed_from_u64(42);
        let policy = Policy {
            max_interval: 100_000,
            ..Policy::default()
        };
        for grade in [Grade::Okay, Grade::Easy] {
            let floor = if grade == Grade::Easy { 4 } else { 2 };
            let mut data = review_card(1);
            let mut previous = data.gap();
            for _ in 0..6 {
                let day = data.due_date;
                answer(&mut data, grade, day, &policy, &mut rng).unwrap();
                let gap = data.gap();
                assert!(gap >= previous);
                assert!(gap >= previous * floor);
                assert!(gap <= previous * (floor + 1));
                assert_eq!(data.last_date, day);
                previous = gap;
            }
        }
    }

    /// A hard answer always lands on the first step and keeps the card in the
    /// live queue.
    #[test]
    fn test_hard_regression() {
        for status in [
            Status::New,
            Status::FirstStep,
            Status::SecondStep,
            Status::Review,
        ] {
            let mut data = review_card(20);
            data.status = status;
            let due = data.due_date;
            assert_eq!(run(&mut data, Grade::Hard), Outcome::Reinsert);
            assert_eq!(data.status, Status::FirstStep);
            assert_eq!(data.due_date, due);
        }
    }

    #[test]
    fn test_daily_admission_cap() {
        let (mut tree, solutions) = wide_tree(8);
        tree.meta_mut().new_limit = 5;
        tree.meta_mut().latest_access = today().add_days(-1);
        assert!(daily_recompute(&mut tree, today()));
        let new: Vec<NodeId> = solutions
            .iter()
            .copied()
            .filter(|id| tree.training(*id).unwrap().status == Status::New)
            .collect();
        assert_eq!(new, solutions[..5].to_vec());
        assert_eq!(tree.meta().new_remaining, 5);
        assert_eq!(tree.meta().latest_access, today());
    }

    #[test]
    fn test_admission_with_fewer_cards_than_limit() {
        let (mut tree, solutions) = wide_tree(3);
        tree.meta_mut().latest_access = today().add_days(-1);
        daily_recompute(&mut tree, today());
        for id in solutions {
            assert_eq!(tree.training(id).unwrap().status, Status::New);
        }
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let (mut tree, solutions) = wide_tree(6);
        tree.meta_mut().new_limit = 2;
        tree.meta_mut().latest_access = today().add_days(-3);
        assert!(daily_recompute(&mut tree, today()));
        // Some learning happens during the day.
        tree.training_mut(solutions[0]).unwrap().status = Status::SecondStep;
        tree.meta_mut().new_remaining = 1;
        let snapshot: Vec<TrainingData> = solutions
            .iter()
            .map(|id| *tree.training(*id).unwrap())
            .collect();
        let meta = tree.meta().clone();
        assert!(!daily_recompute(&mut tree, today()));
        let after: Vec<TrainingData> = solutions
            .iter()
            .map(|id| *tree.training(*id).unwrap())
            .collect();
        assert_eq!(snapshot, after);
        assert_eq!(&meta, tree.meta());
    }

    #[test]
    fn test_recompute_erases_learning_but_keeps_review() {
        let (mut tree, solutions) = wide_tree(4);
        tree.meta_mut().new_limit = 0;
        tree.meta_mut().latest_access = today().add_days(-1);
        tree.training_mut(solutions[0]).unwrap().status = Status::New;
        tree.training_mut(solutions[1]).unwrap().status = Status::FirstStep;
        tree.training_mut(solutions[2]).unwrap().status = Status::SecondStep;
        *tree.training_mut(solutions[3]).unwrap() = review_card(5);
        daily_recompute(&mut tree, today());
        for id in &solutions[..3] {
            assert_eq!(tree.training(*id).unwrap().status, Status::Inactive);
        }
        assert_eq!(tree.training(solutions[3]).unwrap(), &review_card(5));
    }

    #[test]
    fn test_admission_skips_dormant_answers() {
        let mut tree = empty_tree(Colour::White);
        let e4 = add_line(&mut tree, &["e2e4"]);
        let d4 = add_line(&mut tree, &["d2d4"]);
        let nf3 = add_line(&mut tree, &["e2e4", "e7e5", "g1f3"]);
        let admitted = refresh_statuses(&mut tree);
        assert_eq!(admitted, 2);
        assert_eq!(tree.training(e4).unwrap().status, Status::New);
        assert_eq!(tree.training(nf3).unwrap().status, Status::New);
        assert_eq!(tree.training(d4).unwrap().status, Status::Inactive);
    }

    #[test]
    fn test_admission_budget_is_threaded() {
        let (mut tree, solutions) = wide_tree(4);
        let result = admit_new(&mut tree, Admission::new(3));
        assert_eq!(
            result,
            Admission {
                remaining: 3,
                marked: 3
            }
        );
        assert!(result.exhausted());
        assert_eq!(
            tree.training(solutions[3]).unwrap().status,
            Status::Inactive
        );
        let result = admit_new(&mut tree, Admission::new(0));
        assert_eq!(result.marked, 0);
    }

    #[test]
    fn test_empty_tree_recompute() {
        let mut tree = empty_tree(Colour::White);
        tree.meta_mut().latest_access = today().add_days(-1);
        assert!(daily_recompute(&mut tree, today()));
        assert_eq!(refresh_statuses(&mut tree), 0);
    }
}
