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

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::scheduler::Policy;

pub const CONFIG_FILE: &str = "chessic.toml";

/// Upper bound on `max_interval`: a hundred years.
const MAX_INTERVAL_CEILING: i64 = 36500;

/// Collection-wide settings, read from `chessic.toml` in the collection
/// directory. Every key is optional.
#[derive(Deserialize, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Daily admission cap given to newly created trees.
    pub new_limit: u32,
    /// Longest review interval, in days.
    pub max_interval: i64,
    /// Closest a failed card may be reinserted to the front of the queue.
    pub requeue_min: usize,
    /// Furthest a failed card may be reinserted from the front of the queue.
    pub requeue_max: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            new_limit: 10,
            max_interval: 365,
            requeue_min: 1,
            requeue_max: 4,
        }
    }
}

impl Config {
    /// Loads the configuration file in `directory`, falling back to the
    /// defaults if there is none.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No configuration file, using defaults.");
            return Ok(Self::default());
        }
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        if !(1..=MAX_INTERVAL_CEILING).contains(&config.max_interval) {
            return fail(format!(
                "max_interval must be between 1 and {MAX_INTERVAL_CEILING} days."
            ));
        }
        if config.requeue_min < 1 {
            return fail("requeue_min must be at least 1.");
        }
        if config.requeue_min > config.requeue_max {
            return fail("requeue_min must not exceed requeue_max.");
        }
        Ok(config)
    }

    pub fn policy(&self) -> Policy {
        Policy {
            max_interval: self.max_interval,
            requeue_min: self.requeue_min,
            requeue_max: self.requeue_max,
        }
    }
}
