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

use crate::cmd::edit::add_line;
use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::position::Position;
use crate::position::STARTING_FEN;
use crate::scheduler::refresh_statuses;
use crate::tree::Meta;
use crate::tree::Tree;
use crate::types::colour::Colour;
use crate::types::timestamp::Timestamp;

/// Creates a tree, optionally from a custom position and with an initial
/// line of moves.
pub fn new_tree(
    directory: Option<String>,
    name: &str,
    colour: Colour,
    fen: Option<String>,
    moves: &[String],
) -> Fallible<()> {
    if name.trim().is_empty() {
        return fail("tree names must not be empty.");
    }
    let mut coll = Collection::new(directory)?;
    let now = Timestamp::now();
    let today = now.local_date();

    let (position, fen) = match fen {
        Some(fen) => (Position::from_fen(&fen)?, fen),
        None => (Position::initial(), STARTING_FEN.to_string()),
    };
    let meta = Meta::new(colour, fen, today, coll.config.new_limit);
    let mut tree = Tree::new(meta, position.side_to_move());
    if !moves.is_empty() {
        add_line(&mut tree, moves, today)?;
    }
    refresh_statuses(&mut tree);

    coll.db.create_tree(name, &tree, now)?;
    println!("Created tree {name} ({colour}).");
    Ok(())
}
