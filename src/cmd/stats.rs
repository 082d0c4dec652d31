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

use serde::Serialize;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::stats::TreeStats;
use crate::types::colour::Colour;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// Prints the compact summary of every tree in the collection.
pub fn list_trees(directory: Option<String>) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let today = Timestamp::now().local_date();
    print!("{}", list_collection(&mut coll, today)?);
    Ok(())
}

/// The collection path followed by one row per tree.
fn list_collection(coll: &mut Collection, today: Date) -> Fallible<String> {
    let mut rows = Vec::new();
    for name in coll.db.tree_names()? {
        let tree = coll.db.load_tree(&name, today)?;
        let stats = TreeStats::compute(&tree, tree.root(), today);
        rows.push((name, stats));
    }
    let mut out = format!("Collection: {}\n", coll.directory.display());
    out.push_str(&render_list(&rows));
    Ok(out)
}

fn render_list(rows: &[(String, TreeStats)]) -> String {
    let mut out = format!(
        "{:<8}{:<20}{:<9}{:<9}{:<6}\n",
        "", "TREE", "WAITING", "LEARNED", "TOTAL"
    );
    for (index, (name, stats)) in rows.iter().enumerate() {
        let coverage = match stats.coverage() {
            Some(percent) => format!("{percent}% "),
            None => String::new(),
        };
        out.push_str(&format!(
            "{:<3}{:>5}{:<20}{:<9}{:<9}{:<6}\n",
            index + 1,
            coverage,
            name,
            stats.waiting(),
            stats.learned(),
            stats.reachable
        ));
    }
    out
}

pub fn print_tree_stats(directory: Option<String>, name: &str, json: bool) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let today = Timestamp::now().local_date();
    let tree = coll.db.load_tree(name, today)?;
    let stats = TreeStats::compute(&tree, tree.root(), today);
    let report = Report {
        name: name.to_string(),
        colour: tree.meta().colour,
        new_remaining: tree.meta().new_remaining,
        waiting: stats.waiting(),
        learned: stats.learned(),
        coverage: stats.coverage(),
        stats,
        today_review_count: coll.db.today_review_count(today)?,
    };
    if json {
        let report_json = serde_json::to_string_pretty(&report)?;
        println!("{report_json}");
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    name: String,
    colour: Colour,
    new_remaining: u32,
    waiting: usize,
    learned: usize,
    coverage: Option<usize>,
    #[serde(flatten)]
    stats: TreeStats,
    today_review_count: usize,
}

fn render_report(report: &Report) -> String {
    let stats = &report.stats;
    let mut out = format!("{} ({})\n", report.name, report.colour);
    let lines = [
        ("New", stats.new),
        ("First step", stats.first_step),
        ("Second step", stats.second_step),
        ("Review", stats.review),
        ("Inactive", stats.inactive),
        ("Due", stats.due),
        ("Reachable", stats.reachable),
        ("Total", stats.total),
    ];
    for (label, count) in lines {
        out.push_str(&format!("{label:<14}{count}\n"));
    }
    out.push_str(&format!("{:<14}{}\n", "Admissions", report.new_remaining));
    out.push_str(&format!("{:<14}{}\n", "Reviewed", report.today_review_count));
    out
}
