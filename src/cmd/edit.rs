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
use crate::scheduler::refresh_statuses;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// Follows `moves` (SAN or UCI) from the root, adding whatever is missing.
/// Returns the last node and the number of nodes created.
pub fn add_line<S: AsRef<str>>(
    tree: &mut Tree,
    moves: &[S],
    today: Date,
) -> Fallible<(NodeId, usize)> {
    let mut position = Position::from_fen(&tree.meta().root_fen)?;
    let mut current = tree.root();
    let mut created = 0;
    for text in moves {
        let mv = position.parse_move(text.as_ref())?;
        current = match tree.child_by_move(current, &mv) {
            Some(child) => child,
            None => {
                created += 1;
                tree.add_child(current, &mv, today)?
            }
        };
        position = position.play(&mv)?;
    }
    Ok((current, created))
}

/// Follows `moves` (SAN or UCI) from the root without changing the tree.
pub fn find_line<S: AsRef<str>>(tree: &Tree, moves: &[S]) -> Fallible<NodeId> {
    let mut position = Position::from_fen(&tree.meta().root_fen)?;
    let mut current = tree.root();
    for text in moves {
        let mv = position.parse_move(text.as_ref())?;
        current = match tree.child_by_move(current, &mv) {
            Some(child) => child,
            None => return fail(format!("the tree has no move {} here.", text.as_ref())),
        };
        position = position.play(&mv)?;
    }
    Ok(current)
}

#[derive(Clone, Copy, Debug)]
pub enum Edit {
    Add,
    Delete,
    Promote,
}

/// Applies an edit to a stored tree and saves it.
pub fn edit_tree(
    directory: Option<String>,
    name: &str,
    edit: Edit,
    moves: &[String],
) -> Fallible<()> {
    if moves.is_empty() {
        return fail("no moves given.");
    }
    let mut coll = Collection::new(directory)?;
    let today = Timestamp::now().local_date();
    let mut tree = coll.db.load_tree(name, today)?;
    let message = apply_edit(&mut tree, edit, moves, today)?;
    let admitted = refresh_statuses(&mut tree);
    log::debug!("{admitted} cards admitted after edit.");
    coll.db.save_tree(name, &tree)?;
    println!("{message}");
    Ok(())
}

fn apply_edit(tree: &mut Tree, edit: Edit, moves: &[String], today: Date) -> Fallible<String> {
    match edit {
        Edit::Add => {
            let (_, created) = add_line(tree, moves, today)?;
            if created == 0 {
                return fail("that line is already in the tree.");
            }
            Ok(format!("Added {created} moves."))
        }
        Edit::Delete => {
            let id = find_line(tree, moves)?;
            let before = tree.len();
            tree.delete_variation(id)?;
            Ok(format!("Deleted {} moves.", before - tree.len()))
        }
        Edit::Promote => {
            let id = find_line(tree, moves)?;
            tree.promote(id)?;
            Ok("Promoted to main line.".to_string())
        }
    }
}
