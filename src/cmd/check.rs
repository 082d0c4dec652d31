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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::position::Position;
use crate::tree::Tree;

/// Reads every tree in the collection and replays every move in it.
pub fn check_collection(directory: Option<String>) -> Fallible<()> {
    let coll = Collection::new(directory)?;
    for name in coll.db.tree_names()? {
        log::debug!("Checking tree {name}.");
        let tree = coll.db.read_tree(&name)?;
        check_moves(&tree)?;
    }
    println!("ok");
    Ok(())
}

/// Fails if any stored move is illegal in its position, or if a node's side
/// to move disagrees with the board.
fn check_moves(tree: &Tree) -> Fallible<()> {
    let mut stack = vec![(tree.root(), Position::from_fen(&tree.meta().root_fen)?)];
    while let Some((id, position)) = stack.pop() {
        if position.side_to_move() != tree.node(id).to_move() {
            return fail(format!("wrong side to move at {}.", tree.path(id).join(" ")));
        }
        for child in tree.node(id).children() {
            let mv = tree.node(*child).mv().unwrap_or_default();
            stack.push((*child, position.play(mv)?));
        }
    }
    Ok(())
}
