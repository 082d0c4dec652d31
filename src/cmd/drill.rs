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

use std::io::BufRead;
use std::io::Write;

use rand::Rng;

use crate::cmd::edit::find_line;
use crate::collection::Collection;
use crate::db::Database;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::position::Position;
use crate::scheduler::Policy;
use crate::session::Presenter;
use crate::session::Session;
use crate::session::SessionEnd;
use crate::stats::TreeStats;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::grade::Grade;
use crate::types::grade::Response;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

pub fn drill(directory: Option<String>, name: &str, from: &[String]) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let today = Timestamp::now().local_date();
    let policy = coll.config.policy();
    let stdin = std::io::stdin();
    let mut terminal = Terminal::new(stdin.lock(), std::io::stdout(), today);
    let end = run_drill(
        &mut coll.db,
        name,
        from,
        today,
        policy,
        rand::rng(),
        &mut terminal,
    )?;
    match end {
        None => println!("Nothing to rehearse today."),
        Some(SessionEnd::Completed) => println!("Session complete."),
        Some(SessionEnd::Paused) => println!("Session paused."),
    }
    Ok(())
}

/// Loads a tree and rehearses the cards due below `from`, saving after every
/// answer. Returns `None` if nothing was due.
pub fn run_drill(
    db: &mut Database,
    name: &str,
    from: &[String],
    today: Date,
    policy: Policy,
    rng: impl Rng,
    presenter: &mut impl Presenter,
) -> Fallible<Option<SessionEnd>> {
    let mut tree = db.load_tree(name, today)?;
    let from = find_line(&tree, from)?;
    let mut session = Session::new(&mut tree, from, today, policy, rng);
    if session.remaining() == 0 {
        return Ok(None);
    }
    let end = session.run(presenter, |tree, review| db.record_review(name, tree, review))?;
    Ok(Some(end))
}

/// Presents cards on a text terminal.
pub struct Terminal<R: BufRead, W: Write> {
    input: R,
    output: W,
    today: Date,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W, today: Date) -> Self {
        Self {
            input,
            output,
            today,
        }
    }

    /// Reads one line of input, trimmed. `None` at end of input.
    fn read_line(&mut self) -> Fallible<Option<String>> {
        write!(self.output, ": ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Presenter for Terminal<R, W> {
    fn rehearse(&mut self, tree: &Tree, card: NodeId) -> Fallible<Response> {
        let problem = tree
            .node(card)
            .parent()
            .ok_or_else(|| ErrorReport::new("a card must have a problem above it."))?;
        let status = tree
            .training(card)
            .map(|data| data.status)
            .ok_or_else(|| ErrorReport::new("a card must have training data."))?;
        let colour = tree.meta().colour;
        let before = Position::at(tree, problem)?;
        let mv = tree.node(card).mv().unwrap_or_default();
        let after = before.play(mv)?;

        let stats = TreeStats::compute(tree, tree.root(), self.today);
        writeln!(
            self.output,
            "\n{} | {} | {}    {}",
            stats.new,
            stats.learning(),
            stats.due,
            status_label(status)
        )?;
        writeln!(self.output, "{}", before.diagram(colour))?;
        writeln!(self.output, "{colour} to play.")?;
        writeln!(self.output, "<Enter> show solution")?;
        writeln!(self.output, "'p'     pause session")?;
        loop {
            match self.read_line()?.as_deref() {
                None | Some("p") => return Ok(Response::Pause),
                Some("") => break,
                Some(_) => continue,
            }
        }

        writeln!(self.output, "\n{}", after.diagram(colour))?;
        writeln!(self.output, "Solution: {mv}")?;
        if status == Status::New {
            writeln!(self.output, "<Enter> continue")?;
        } else {
            writeln!(self.output, "'e'     easy")?;
            writeln!(self.output, "<Enter> okay")?;
            writeln!(self.output, "'h'     hard")?;
        }
        loop {
            let Some(line) = self.read_line()? else {
                return Ok(Response::Pause);
            };
            if let Some(grade) = parse_grade(&line, status) {
                return Ok(Response::Graded(grade));
            }
        }
    }
}

/// New cards can only be acknowledged, which counts as okay.
fn parse_grade(line: &str, status: Status) -> Option<Grade> {
    match (status, line) {
        (_, "") => Some(Grade::Okay),
        (Status::New, _) => None,
        (_, "e") => Some(Grade::Easy),
        (_, "h") => Some(Grade::Hard),
        _ => None,
    }
}

fn status_label(status: Status) -> &'static str {
    match status {
        Status::New => "NEW",
        Status::FirstStep | Status::SecondStep => "LEARNING",
        Status::Review => "REVIEW",
        Status::Inactive => "INACTIVE",
    }
}
