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

use serde::Serialize;

use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::status::Status;

/// Training statistics for a tree or subtree. Status counts cover only the
/// solutions a training walk reaches; `total` counts every solution.
#[derive(Serialize, Clone, Copy, Default, PartialEq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TreeStats {
    pub new: usize,
    pub first_step: usize,
    pub second_step: usize,
    pub review: usize,
    pub inactive: usize,
    /// Review cards due today or earlier.
    pub due: usize,
    pub reachable: usize,
    pub total: usize,
}

impl TreeStats {
    pub fn compute(tree: &Tree, from: NodeId, today: Date) -> Self {
        let mut stats = Self::default();
        for id in tree.reachable_solutions(from) {
            let Some(data) = tree.training(id) else {
                continue;
            };
            match data.status {
                Status::New => stats.new += 1,
                Status::FirstStep => stats.first_step += 1,
                Status::SecondStep => stats.second_step += 1,
                Status::Review => stats.review += 1,
                Status::Inactive => stats.inactive += 1,
            }
            if data.status == Status::Review && data.is_due(today) {
                stats.due += 1;
            }
            stats.reachable += 1;
        }
        stats.total = tree.ids().filter(|id| tree.is_solution(*id)).count();
        stats
    }

    /// Cards that would be rehearsed in a session today.
    pub fn waiting(&self) -> usize {
        self.new + self.first_step + self.second_step + self.due
    }

    pub fn learned(&self) -> usize {
        self.review
    }

    /// Percentage of reachable cards that are learned, if there are any.
    pub fn coverage(&self) -> Option<usize> {
        if self.reachable == 0 {
            None
        } else {
            Some((self.learned() as f64 / self.reachable as f64 * 100.0).round() as usize)
        }
    }

    pub fn learning(&self) -> usize {
        self.first_step + self.second_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::add_line;
    use crate::tree::tests::empty_tree;
    use crate::tree::tests::today;
    use crate::types::colour::Colour;
    use crate::types::training::TrainingData;

    fn set(tree: &mut Tree, id: NodeId, status: Status, due: Date) {
        *tree.training_mut(id).unwrap() = TrainingData {
            status,
            due_date: due,
            last_date: due.add_days(-1),
        };
    }

    #[test]
    fn test_counts() {
        let mut tree = empty_tree(Colour::Black);
        let a = add_line(&mut tree, &["a2a3", "a7a6"]);
        let b = add_line(&mut tree, &["b2b3", "b7b6"]);
        let c = add_line(&mut tree, &["c2c3", "c7c6"]);
        let d = add_line(&mut tree, &["d2d3", "d7d6"]);
        let e = add_line(&mut tree, &["e2e3", "e7e6"]);
        let _dormant = add_line(&mut tree, &["e2e3", "e7e5"]);
        set(&mut tree, a, Status::New, today());
        set(&mut tree, b, Status::FirstStep, today());
        set(&mut tree, c, Status::Review, today());
        set(&mut tree, d, Status::Review, today().add_days(5));
        set(&mut tree, e, Status::Inactive, today());
        let stats = TreeStats::compute(&tree, tree.root(), today());
        assert_eq!(
            stats,
            TreeStats {
                new: 1,
                first_step: 1,
                second_step: 0,
                review: 2,
                inactive: 1,
                due: 1,
                reachable: 5,
                total: 6,
            }
        );
        assert_eq!(stats.waiting(), 3);
        assert_eq!(stats.learned(), 2);
        assert_eq!(stats.learning(), 1);
        assert_eq!(stats.coverage(), Some(40));
    }

    #[test]
    fn test_empty_tree() {
        let tree = empty_tree(Colour::White);
        let stats = TreeStats::compute(&tree, tree.root(), today());
        assert_eq!(stats, TreeStats::default());
        assert_eq!(stats.coverage(), None);
    }

    #[test]
    fn test_json_keys() -> crate::error::Fallible<()> {
        let tree = empty_tree(Colour::White);
        let stats = TreeStats::compute(&tree, tree.root(), today());
        let json = serde_json::to_string(&stats)?;
        assert!(json.contains("\"firstStep\":0"));
        assert!(json.contains("\"secondStep\":0"));
        Ok(())
    }
}
