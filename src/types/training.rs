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

use crate::types::date::Date;
use crate::types::status::Status;

/// Scheduling information for a solution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingData {
    /// Where the card is in its life cycle.
    pub status: Status,
    /// The date the card becomes eligible again. Only meaningful in
    /// `Status::Review`.
    pub due_date: Date,
    /// The date of the last scheduling event. `due_date - last_date` is the
    /// interval the next successful review grows from.
    pub last_date: Date,
}

impl TrainingData {
    pub fn new(today: Date) -> Self {
        Self {
            status: Status::Inactive,
            due_date: today,
            last_date: today,
        }
    }

    /// The current review interval in days.
    pub fn gap(&self) -> i64 {
        self.due_date.days_since(self.last_date)
    }

    pub fn is_due(&self, today: Date) -> bool {
        self.status == Status::Review && self.due_date <= today
    }
}
