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

use std::iter::Peekable;
use std::str::Chars;

use crate::error::Fallible;
use crate::error::fail;

/// One element of a game's movetext.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// A move in SAN, with check marks and annotations removed.
    Move(String),
    /// `(`: the following moves replace the move just played.
    StartVariation,
    /// `)`: return to the line the variation branched from.
    EndVariation,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Game {
    /// The `FEN` tag, if the game does not start from the initial position.
    pub fen: Option<String>,
    pub tokens: Vec<Token>,
}

const RESULTS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

/// Characters that end a move even without surrounding whitespace.
const DELIMITERS: &str = "(){};[";

/// Reads every game in a PGN file. Comments, NAGs, move numbers and tags
/// other than `FEN` are dropped.
pub fn parse_pgn(content: &str) -> Fallible<Vec<Game>> {
    let mut games = Vec::new();
    let mut game = Game::default();
    let mut chars = content.chars().peekable();
    let mut line_start = true;

    while let Some(c) = chars.next() {
        if c == '\n' {
            line_start = true;
            continue;
        }
        match c {
            '%' if line_start => {
                skip_line(&mut chars);
                continue;
            }
            _ if c.is_whitespace() => {}
            '[' => {
                // A tag after movetext opens the next game.
                finish_game(&mut games, &mut game);
                let body = read_until(&mut chars, ']', "unterminated tag.")?;
                if let Some(fen) = parse_fen_tag(&body)? {
                    game.fen = Some(fen);
                }
            }
            '{' => {
                read_until(&mut chars, '}', "unterminated comment.")?;
            }
            ';' => {
                skip_line(&mut chars);
                line_start = true;
                continue;
            }
            '(' => game.tokens.push(Token::StartVariation),
            ')' => game.tokens.push(Token::EndVariation),
            '$' => {
                while chars.next_if(|c| c.is_ascii_digit()).is_some() {}
            }
            _ => {
                let mut word = String::from(c);
                while let Some(c) =
                    chars.next_if(|c| !c.is_whitespace() && !DELIMITERS.contains(*c))
                {
                    word.push(c);
                }
                if RESULTS.contains(&word.as_str()) {
                    finish_game(&mut games, &mut game);
                } else if let Some(san) = clean_move(&word) {
                    game.tokens.push(Token::Move(san));
                }
            }
        }
        line_start = false;
    }
    finish_game(&mut games, &mut game);
    log::debug!("Read {} games.", games.len());
    Ok(games)
}

fn finish_game(games: &mut Vec<Game>, game: &mut Game) {
    if !game.tokens.is_empty() {
        games.push(std::mem::take(game));
    }
}

fn skip_line(chars: &mut Peekable<Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

fn read_until(chars: &mut Peekable<Chars<'_>>, end: char, message: &str) -> Fallible<String> {
    let mut body = String::new();
    for c in chars.by_ref() {
        if c == end {
            return Ok(body);
        }
        body.push(c);
    }
    fail(message)
}

/// Returns the value of a `[FEN "..."]` tag, or `None` for any other tag.
fn parse_fen_tag(body: &str) -> Fallible<Option<String>> {
    let Some((name, value)) = body.trim().split_once(char::is_whitespace) else {
        return fail(format!("malformed tag: [{body}]"));
    };
    let Some(value) = value
        .trim()
        .strip_prefix('"')
        .and_then(|value| value.strip_suffix('"'))
    else {
        return fail(format!("malformed tag: [{body}]"));
    };
    if name == "FEN" {
        Ok(Some(value.to_string()))
    } else {
        Ok(None)
    }
}

/// Strips a leading move number and trailing annotations. Returns `None` if
/// nothing is left, as with a bare `12.` or `3...`.
fn clean_move(word: &str) -> Option<String> {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let word = if rest.len() < word.len() && (rest.is_empty() || rest.starts_with('.')) {
        rest
    } else {
        word
    };
    let san = word
        .trim_start_matches('.')
        .trim_end_matches(['!', '?', '+', '#']);
    match san {
        "" => None,
        "0-0" => Some("O-O".to_string()),
        "0-0-0" => Some("O-O-O".to_string()),
        _ => Some(san.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(game: &Game) -> Vec<&str> {
        game.tokens
            .iter()
            .filter_map(|token| match token {
                Token::Move(san) => Some(san.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_move_numbers_and_annotations() -> Fallible<()> {
        let games = parse_pgn("1. e4 e5 2.Nf3 Nc6 3. Bb5!? a6 4. Ba4 Nf6 5. 0-0 Be7+ 6... Qxd8# *")?;
        assert_eq!(games.len(), 1);
        assert_eq!(
            moves(&games[0]),
            vec!["e4", "e5", "Nf3", "Nc6", "Bb5", "a6", "Ba4", "Nf6", "O-O", "Be7", "Qxd8"]
        );
        assert_eq!(games[0].fen, None);
        Ok(())
    }

    #[test]
    fn test_comments_and_nags() -> Fallible<()> {
        let content = "\
% exported by hand
1. d4 {the queen's pawn,
spanning lines} d5 $1 2. c4 ; the gambit
e6 $14 *
";
        let games = parse_pgn(content)?;
        assert_eq!(moves(&games[0]), vec!["d4", "d5", "c4", "e6"]);
        Ok(())
    }

    #[test]
    fn test_variations() -> Fallible<()> {
        let games = parse_pgn("1. e4 c5 (1... e5 2. Nf3) 2. Nf3 *")?;
        assert_eq!(
            games[0].tokens,
            vec![
                Token::Move("e4".to_string()),
                Token::Move("c5".to_string()),
                Token::StartVariation,
                Token::Move("e5".to_string()),
                Token::Move("Nf3".to_string()),
                Token::EndVariation,
                Token::Move("Nf3".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_multiple_games_and_fen() -> Fallible<()> {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let content = format!(
            "[Event \"one\"]\n[FEN \"{fen}\"]\n\n2. Nf3 Nc6 1-0\n\n[Event \"two\"]\n[FEN \"{fen}\"]\n\n2. Bc4 1/2-1/2\n"
        );
        let games = parse_pgn(&content)?;
        assert_eq!(games.len(), 2);
        assert_eq!(games[0].fen.as_deref(), Some(fen));
        assert_eq!(moves(&games[0]), vec!["Nf3", "Nc6"]);
        assert_eq!(moves(&games[1]), vec!["Bc4"]);
        Ok(())
    }

    #[test]
    fn test_game_without_result() -> Fallible<()> {
        let games = parse_pgn("[Event \"a\"]\n1. e4\n[Event \"b\"]\n1. d4\n")?;
        assert_eq!(games.len(), 2);
        assert_eq!(moves(&games[1]), vec!["d4"]);
        Ok(())
    }

    #[test]
    fn test_empty() -> Fallible<()> {
        assert!(parse_pgn("")?.is_empty());
        assert!(parse_pgn("[Event \"x\"]\n*\n")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_malformed() {
        assert!(parse_pgn("1. e4 {never closed").is_err());
        assert!(parse_pgn("[Event \"x\"").is_err());
        assert!(parse_pgn("[Event]\n1. e4").is_err());
    }
}
