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

use crate::collection::Collection;
use crate::error::Fallible;
use crate::error::fail;
use crate::pgn::Game;
use crate::pgn::Token;
use crate::pgn::parse_pgn;
use crate::position::Position;
use crate::position::STARTING_FEN;
use crate::scheduler::refresh_statuses;
use crate::tree::Meta;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::colour::Colour;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// Creates a tree from every game and variation in a PGN file.
pub fn import_tree(
    directory: Option<String>,
    name: &str,
    path: &str,
    colour: Colour,
) -> Fallible<()> {
    if name.trim().is_empty() {
        return fail("tree names must not be empty.");
    }
    let content = read_to_string(path)?;
    let games = parse_pgn(&content)?;
    let mut coll = Collection::new(directory)?;
    let now = Timestamp::now();
    let tree = build_tree(&games, colour, now.local_date(), coll.config.new_limit)?;
    coll.db.create_tree(name, &tree, now)?;
    println!(
        "Imported {} moves from {} games into {name} ({colour}).",
        tree.len() - 1,
        games.len()
    );
    Ok(())
}

fn build_tree(games: &[Game], colour: Colour, today: Date, new_limit: u32) -> Fallible<Tree> {
    let Some(first) = games.first() else {
        return fail("no games found.");
    };
    if games.iter().any(|game| game.fen != first.fen) {
        return fail("every game must start from the same position.");
    }
    let (position, fen) = match &first.fen {
        Some(fen) => (Position::from_fen(fen)?, fen.clone()),
        None => (Position::initial(), STARTING_FEN.to_string()),
    };
    let meta = Meta::new(colour, fen, today, new_limit);
    let mut tree = Tree::new(meta, position.side_to_move());
    for game in games {
        add_game(&mut tree, &position, &game.tokens, today)?;
    }
    let admitted = refresh_statuses(&mut tree);
    log::debug!("{admitted} cards admitted after import.");
    Ok(tree)
}

/// A node and the position reached there.
type Cursor = (NodeId, Position);

/// Merges one game's movetext into the tree. Variations branch from the
/// position before the move they follow.
fn add_game(tree: &mut Tree, start: &Position, tokens: &[Token], today: Date) -> Fallible<()> {
    let mut current: Cursor = (tree.root(), start.clone());
    let mut previous: Option<Cursor> = None;
    let mut stack: Vec<(Cursor, Option<Cursor>)> = Vec::new();
    for token in tokens {
        match token {
            Token::Move(san) => {
                let (node, position) = &current;
                let mv = position.parse_move(san)?;
                let child = match tree.child_by_move(*node, &mv) {
                    Some(child) => child,
                    None => tree.add_child(*node, &mv, today)?,
                };
                let next = (child, position.play(&mv)?);
                previous = Some(std::mem::replace(&mut current, next));
            }
            Token::StartVariation => {
                let Some(branch) = previous.take() else {
                    return fail("variation with no move to replace.");
                };
                stack.push((std::mem::replace(&mut current, branch.clone()), Some(branch)));
            }
            Token::EndVariation => {
                let Some((resume, before)) = stack.pop() else {
                    return fail("unbalanced parentheses.");
                };
                current = resume;
                previous = before;
            }
        }
    }
    if !stack.is_empty() {
        return fail("unbalanced parentheses.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::collection_arg;
    use crate::helper::create_tmp_collection;
    use crate::tree::tests::today;
    use crate::types::status::Status;

    fn import(pgn: &str, colour: Colour) -> Fallible<Tree> {
        build_tree(&parse_pgn(pgn)?, colour, today(), 10)
    }

    fn status(tree: &Tree, moves: &[&str]) -> Status {
        let id = tree.find_path(moves).unwrap();
        tree.training(id).unwrap().status
    }

    #[test]
    fn test_side_variation_for_white() -> Fallible<()> {
        let tree = import(
            "1. e4 e5 2. Nf3 (2. Bc4 Nf6) 2... Nc6 3. Bb5 {Spanish} a6 *",
            Colour::White,
        )?;
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.meta().root_fen, STARTING_FEN);

        let e5 = tree.find_path(&["e2e4", "e7e5"]).unwrap();
        let order: Vec<&str> = tree
            .node(e5)
            .children()
            .iter()
            .filter_map(|&id| tree.node(id).mv())
            .collect();
        assert_eq!(order, vec!["g1f3", "f1c4"]);

        assert_eq!(status(&tree, &["e2e4"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "e7e5", "g1f3"]), Status::New);
        assert_eq!(
            status(&tree, &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]),
            Status::New
        );
        // The side line is a card, but stays dormant behind the main line.
        let bc4 = tree.find_path(&["e2e4", "e7e5", "f1c4"]).unwrap();
        assert!(tree.is_solution(bc4));
        assert_eq!(tree.training(bc4).unwrap().status, Status::Inactive);

        let nf6 = tree.find_path(&["e2e4", "e7e5", "f1c4", "g8f6"]).unwrap();
        assert!(!tree.is_solution(nf6));
        let a6 = tree
            .find_path(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6"])
            .unwrap();
        assert!(tree.training(a6).is_none());
        Ok(())
    }

    #[test]
    fn test_side_variation_for_black() -> Fallible<()> {
        let tree = import("1. e4 c5 (1... e5) 2. Nf3 d6 *", Colour::Black)?;
        assert!(tree.training(tree.find_path(&["e2e4"]).unwrap()).is_none());
        assert_eq!(status(&tree, &["e2e4", "c7c5"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "c7c5", "g1f3", "d7d6"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "e7e5"]), Status::Inactive);
        Ok(())
    }

    #[test]
    fn test_admission_budget() -> Fallible<()> {
        let games = parse_pgn("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6 4. Ba4 *")?;
        let tree = build_tree(&games, Colour::White, today(), 2)?;
        assert_eq!(status(&tree, &["e2e4"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "e7e5", "g1f3"]), Status::New);
        assert_eq!(
            status(&tree, &["e2e4", "e7e5", "g1f3", "b8c6", "f1b5"]),
            Status::Inactive
        );
        Ok(())
    }

    #[test]
    fn test_games_merge() -> Fallible<()> {
        let tree = import(
            "1. d4 d5 2. c4 *\n\n1. d4 Nf6 2. c4 *\n\n1. d4 d5 2. c4 e6 *",
            Colour::White,
        )?;
        let d4 = tree.find_path(&["d2d4"]).unwrap();
        assert_eq!(tree.node(d4).children().len(), 2);
        assert_eq!(tree.len(), 7);
        Ok(())
    }

    #[test]
    fn test_nested_variations() -> Fallible<()> {
        let tree = import(
            "1. e4 c5 (1... e5 2. Nf3 (2. f4 exf4) 2... Nc6) 2. Nf3 *",
            Colour::White,
        )?;
        assert!(tree.find_path(&["e2e4", "e7e5", "f2f4", "e5f4"]).is_some());
        assert!(tree.find_path(&["e2e4", "e7e5", "g1f3", "b8c6"]).is_some());
        assert!(tree.find_path(&["e2e4", "c7c5", "g1f3"]).is_some());
        Ok(())
    }

    #[test]
    fn test_custom_position() -> Fallible<()> {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let tree = import(&format!("[FEN \"{fen}\"]\n\n2. Nf3 Nc6 *"), Colour::White)?;
        assert_eq!(tree.meta().root_fen, fen);
        assert_eq!(status(&tree, &["g1f3"]), Status::New);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(import("", Colour::White).is_err());
        assert!(import("(1. d4) 1. e4 *", Colour::White).is_err());
        assert!(import("1. e4 (1. d4 *", Colour::White).is_err());
        assert!(import("1. e4 e5) *", Colour::White).is_err());
        assert!(import("1. e4 e4 *", Colour::White).is_err());
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let mixed = format!("1. e4 *\n\n[FEN \"{fen}\"]\n\n2. Nf3 *");
        assert!(import(&mixed, Colour::White).is_err());
    }

    #[test]
    fn test_import_command() -> Fallible<()> {
        let dir = create_tmp_collection()?;
        let path = dir.path().join("caro.pgn");
        std::fs::write(&path, "[Event \"Caro-Kann\"]\n\n1. e4 c6 2. d4 d5 (2... g6) *\n")?;
        let path = path.display().to_string();
        import_tree(collection_arg(&dir), "caro", &path, Colour::Black)?;
        assert!(import_tree(collection_arg(&dir), "caro", &path, Colour::Black).is_err());
        assert!(import_tree(collection_arg(&dir), "gone", "missing.pgn", Colour::Black).is_err());

        let coll = Collection::new(collection_arg(&dir))?;
        let tree = coll.db.read_tree("caro")?;
        assert_eq!(tree.meta().colour, Colour::Black);
        assert_eq!(status(&tree, &["e2e4", "c7c6"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "c7c6", "d2d4", "d7d5"]), Status::New);
        assert_eq!(status(&tree, &["e2e4", "c7c6", "d2d4", "g7g6"]), Status::Inactive);
        Ok(())
    }
}
