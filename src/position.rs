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

use std::str::FromStr;

use chess::Board;
use chess::ChessMove;
use chess::Color;
use chess::File;
use chess::MoveGen;
use chess::Piece;
use chess::Rank;
use chess::Square;

use crate::error::Fallible;
use crate::error::fail;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::colour::Colour;

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess position. Thin wrapper around the `chess` crate, exposing only
/// what the trainer needs: legal moves, move parsing, transitions and the
/// side to move. Moves cross this boundary as UCI strings.
#[derive(Clone)]
pub struct Position {
    board: Board,
}

impl Position {
    pub fn initial() -> Self {
        Self {
            board: Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Fallible<Self> {
        let board = Board::from_str(fen)?;
        Ok(Self { board })
    }

    /// The position reached at `id`, replaying its moves from the root.
    pub fn at(tree: &Tree, id: NodeId) -> Fallible<Self> {
        let mut position = Self::from_fen(&tree.meta().root_fen)?;
        for mv in tree.path(id) {
            position = position.play(mv)?;
        }
        Ok(position)
    }

    pub fn fen(&self) -> String {
        self.board.to_string()
    }

    pub fn side_to_move(&self) -> Colour {
        self.board.side_to_move().into()
    }

    /// All legal moves, in UCI notation.
    pub fn legal_moves(&self) -> Vec<String> {
        MoveGen::new_legal(&self.board)
            .map(|mv| mv.to_string())
            .collect()
    }

    /// Parses a move written in either UCI (`g1f3`) or SAN (`Nf3`) notation,
    /// returning it in UCI notation.
    pub fn parse_move(&self, text: &str) -> Fallible<String> {
        let text = text.trim();
        if let Some(mv) = self.legal_moves().into_iter().find(|mv| mv == text) {
            return Ok(mv);
        }
        match ChessMove::from_san(&self.board, text) {
            Ok(mv) if self.board.legal(mv) => Ok(mv.to_string()),
            _ => fail(format!("illegal or unrecognised move: {text}")),
        }
    }

    /// The position after playing `uci`, which must be legal.
    pub fn play(&self, uci: &str) -> Fallible<Self> {
        match MoveGen::new_legal(&self.board).find(|mv| mv.to_string() == uci) {
            Some(mv) => Ok(Self {
                board: self.board.make_move_new(mv),
            }),
            None => fail(format!("illegal move {uci} in position {}", self.fen())),
        }
    }

    /// A plain text board, drawn from `view`'s side.
    pub fn diagram(&self, view: Colour) -> String {
        let ranks: Vec<usize> = match view {
            Colour::White => (0..8).rev().collect(),
            Colour::Black => (0..8).collect(),
        };
        let files: Vec<usize> = match view {
            Colour::White => (0..8).collect(),
            Colour::Black => (0..8).rev().collect(),
        };
        let mut out = String::new();
        for rank in &ranks {
            out.push_str(&format!("{} ", rank + 1));
            for file in &files {
                let square = Square::make_square(Rank::from_index(*rank), File::from_index(*file));
                out.push(' ');
                out.push(self.glyph(square));
            }
            out.push('\n');
        }
        out.push_str("  ");
        for file in &files {
            out.push(' ');
            out.push((b'a' + *file as u8) as char);
        }
        out.push('\n');
        out
    }

    fn glyph(&self, square: Square) -> char {
        let Some(piece) = self.board.piece_on(square) else {
            return '.';
        };
        let c = match piece {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match self.board.color_on(square) {
            Some(Color::White) => c.to_ascii_uppercase(),
            _ => c,
        }
    }
}
