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

use rusqlite::ToSql;
use rusqlite::types::ToSqlOutput;
use serde::Serialize;

/// The user's self-assessment after seeing the solution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Easy,
    Okay,
    Hard,
}

impl Grade {
    pub fn as_str(&self) -> &str {
        match self {
            Grade::Easy => "easy",
            Grade::Okay => "okay",
            Grade::Hard => "hard",
        }
    }
}

impl ToSql for Grade {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

/// Everything a presenter can hand back for a card.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Response {
    Graded(Grade),
    Pause,
}
