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

use std::fmt::Display;
use std::fmt::Formatter;

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// The training status of a solution.
///
/// A card enters at `Inactive`, is admitted as `New`, climbs the learning
/// ladder (`FirstStep`, `SecondStep`) and graduates to `Review`. A wrong
/// answer sends it back to `FirstStep`; the daily recompute sends unfinished
/// learning back to `Inactive`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Status {
    New,
    FirstStep,
    SecondStep,
    Review,
    Inactive,
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::New => "new",
            Status::FirstStep => "first_step",
            Status::SecondStep => "second_step",
            Status::Review => "review",
            Status::Inactive => "inactive",
        }
    }

    /// True for the statuses that make up a learning pass.
    pub fn is_learning(&self) -> bool {
        matches!(self, Status::New | Status::FirstStep | Status::SecondStep)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for Status {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(Status::New),
            "first_step" => Ok(Status::FirstStep),
            "second_step" => Ok(Status::SecondStep),
            "review" => Ok(Status::Review),
            "inactive" => Ok(Status::Inactive),
            _ => fail(format!("Invalid status: {value}")),
        }
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        Status::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
