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
use crate::error::Fallible;

/// Identifies a node by the sequence of moves leading to it from the root.
///
/// Arena indices are reassigned whenever a tree is loaded or compacted, so
/// anything that must survive those (database rows, log lines) refers to
/// nodes by this hash instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeHash {
    inner: blake3::Hash,
}

impl NodeHash {
    /// The hash of the root node: the empty move path.
    pub fn root() -> Self {
        Self {
            inner: blake3::hash(b"root"),
        }
    }

    /// The hash of the node reached from this one by playing `mv`.
    pub fn child(self, mv: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.inner.as_bytes());
        hasher.update(b"/");
        hasher.update(mv.as_bytes());
        Self {
            inner: hasher.finalize(),
        }
    }

    pub fn to_hex(self) -> String {
        self.inner.to_hex().to_string()
    }

    /// The first eight hex digits, for log lines.
    pub fn short(self) -> String {
        self.to_hex()[..8].to_string()
    }

    pub fn from_hex(s: &str) -> Fallible<Self> {
        let inner = blake3::Hash::from_hex(s)
            .map_err(|_| ErrorReport::new("invalid node hash in database"))?;
        Ok(Self { inner })
    }
}

impl ToSql for NodeHash {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_hex()))
    }
}

impl FromSql for NodeHash {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        NodeHash::from_hex(&string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl Display for NodeHash {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for NodeHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_identity() {
        let a = NodeHash::root().child("e2e4").child("e7e5");
        let b = NodeHash::root().child("e2e4").child("e7e5");
        let c = NodeHash::root().child("e2e4").child("c7c5");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_order_matters() {
        let a = NodeHash::root().child("g1f3").child("d2d4");
        let b = NodeHash::root().child("d2d4").child("g1f3");
        assert_ne!(a, b);
    }

    #[test]
    fn test_hex_round_trip() -> Fallible<()> {
        let hash = NodeHash::root().child("e2e4");
        assert_eq!(NodeHash::from_hex(&hash.to_hex())?, hash);
        assert_eq!(hash.short().len(), 8);
        assert!(NodeHash::from_hex("xyz").is_err());
        Ok(())
    }
}
