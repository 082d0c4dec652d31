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

use tempfile::TempDir;
use tempfile::tempdir;

use crate::error::Fallible;

/// An empty collection directory, deleted when the handle is dropped.
pub fn create_tmp_collection() -> Fallible<TempDir> {
    let dir = tempdir()?;
    Ok(dir)
}

/// The path of a temporary collection, in the form commands take it.
pub fn collection_arg(dir: &TempDir) -> Option<String> {
    Some(dir.path().display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_collection() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        assert!(dir.path().exists());
        assert_eq!(dir.path().read_dir()?.count(), 0);
        assert!(collection_arg(&dir).is_some());
        Ok(())
    }
}
