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

use clap::Parser;
use clap::Subcommand;

use crate::cmd::check::check_collection;
use crate::cmd::drill::drill;
use crate::cmd::edit::Edit;
use crate::cmd::edit::edit_tree;
use crate::cmd::export::export_tree;
use crate::cmd::import::import_tree;
use crate::cmd::new::new_tree;
use crate::cmd::remove::remove_tree;
use crate::cmd::show::show_tree;
use crate::cmd::stats::list_trees;
use crate::cmd::stats::print_tree_stats;
use crate::error::Fallible;
use crate::types::colour::Colour;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the collection directory. Defaults to the current directory.
    #[arg(long, global = true)]
    directory: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new tree.
    New {
        name: String,
        /// The side you play.
        #[arg(long)]
        colour: Colour,
        /// Starting position. Defaults to the standard initial position.
        #[arg(long)]
        fen: Option<String>,
        /// An initial line, in SAN or UCI.
        #[arg(long, num_args = 1..)]
        moves: Vec<String>,
    },
    /// Create a tree from the games and variations in a PGN file.
    Import {
        name: String,
        path: String,
        /// The side you play.
        #[arg(long)]
        colour: Colour,
    },
    /// Add a line from the root, reusing any existing prefix.
    Add { name: String, moves: Vec<String> },
    /// Delete the variation ending at the given line.
    Delete { name: String, moves: Vec<String> },
    /// Make the last move of the given line the main line.
    Promote { name: String, moves: Vec<String> },
    /// Print a tree with the training state of every card.
    Show { name: String },
    /// Summarize every tree in the collection.
    List,
    /// Print statistics for a tree.
    Stats {
        name: String,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Rehearse the cards due today.
    Drill {
        name: String,
        /// Only rehearse the cards below this line.
        #[arg(long, num_args = 1..)]
        from: Vec<String>,
    },
    /// Export a tree as JSON.
    Export { name: String },
    /// Validate every tree in the collection.
    Check,
    /// Delete a tree and its review history.
    Remove { name: String },
}

pub fn entrypoint() -> Fallible<()> {
    let cli: Cli = Cli::parse();
    let directory = cli.directory;
    match cli.command {
        Command::New {
            name,
            colour,
            fen,
            moves,
        } => new_tree(directory, &name, colour, fen, &moves),
        Command::Import { name, path, colour } => import_tree(directory, &name, &path, colour),
        Command::Add { name, moves } => edit_tree(directory, &name, Edit::Add, &moves),
        Command::Delete { name, moves } => edit_tree(directory, &name, Edit::Delete, &moves),
        Command::Promote { name, moves } => edit_tree(directory, &name, Edit::Promote, &moves),
        Command::Show { name } => show_tree(directory, &name),
        Command::List => list_trees(directory),
        Command::Stats { name, json } => print_tree_stats(directory, &name, json),
        Command::Drill { name, from } => drill(directory, &name, &from),
        Command::Export { name } => export_tree(directory, &name),
        Command::Check => check_collection(directory),
        Command::Remove { name } => remove_tree(directory, &name),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_new() {
        let cli = Cli::try_parse_from([
            "chessic", "--directory", "/tmp", "new", "ruy", "--colour", "white", "--moves", "e4",
            "e5",
        ])
        .unwrap();
        assert_eq!(cli.directory.as_deref(), Some("/tmp"));
        match cli.command {
            Command::New {
                name,
                colour,
                fen,
                moves,
            } => {
                assert_eq!(name, "ruy");
                assert_eq!(colour, Colour::White);
                assert_eq!(fen, None);
                assert_eq!(moves, vec!["e4", "e5"]);
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from(["chessic", "add", "ruy", "e4", "e5", "Nf3"]).unwrap();
        match cli.command {
            Command::Add { name, moves } => {
                assert_eq!(name, "ruy");
                assert_eq!(moves, vec!["e4", "e5", "Nf3"]);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_import() {
        let cli = Cli::try_parse_from(["chessic", "import", "caro", "caro.pgn", "--colour", "black"])
            .unwrap();
        match cli.command {
            Command::Import { name, path, colour } => {
                assert_eq!(name, "caro");
                assert_eq!(path, "caro.pgn");
                assert_eq!(colour, Colour::Black);
            }
            _ => panic!("expected import"),
        }
        assert!(Cli::try_parse_from(["chessic", "import", "caro", "caro.pgn"]).is_err());
    }

    #[test]
    fn test_rejects_bad_colour() {
        assert!(Cli::try_parse_from(["chessic", "new", "x", "--colour", "green"]).is_err());
    }
}
