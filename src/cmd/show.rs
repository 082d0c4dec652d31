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

use std::collections::HashSet;

use crate::collection::Collection;
use crate::error::Fallible;
use crate::tree::NodeId;
use crate::tree::Tree;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;

pub fn show_tree(directory: Option<String>, name: &str) -> Fallible<()> {
    let mut coll = Collection::new(directory)?;
    let tree = coll.db.load_tree(name, Timestamp::now().local_date())?;
    println!("{name} ({})", tree.meta().colour);
    print!("{}", render_tree(&tree));
    Ok(())
}

/// One line per move, indented by depth. Solutions show their training
/// state; those a training walk never reaches are marked dormant.
pub fn render_tree(tree: &Tree) -> String {
    let reachable: HashSet<NodeId> = tree.reachable_solutions(tree.root()).into_iter().collect();
    let mut out = String::new();
    let mut stack: Vec<(NodeId, usize)> = tree
        .node(tree.root())
        .children()
        .iter()
        .rev()
        .map(|child| (*child, 0))
        .collect();
    while let Some((id, depth)) = stack.pop() {
        let node = tree.node(id);
        out.push_str(&"  ".repeat(depth));
        out.push_str(node.mv().unwrap_or_default());
        if let Some(data) = node.training() {
            match data.status {
                Status::Review => out.push_str(&format!(" [review, due {}]", data.due_date)),
                status => out.push_str(&format!(" [{status}]")),
            }
            if !reachable.contains(&id) {
                out.push_str(" (dormant)");
            }
        }
        out.push('\n');
        stack.extend(node.children().iter().rev().map(|child| (*child, depth + 1)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::tests::add_line;
    use crate::tree::tests::empty_tree;
    use crate::tree::tests::today;
    use crate::types::colour::Colour;

    #[test]
    fn test_render_tree() {
        let mut tree = empty_tree(Colour::White);
        let e4 = add_line(&mut tree, &["e2e4"]);
        add_line(&mut tree, &["e2e4", "e7e5"]);
        add_line(&mut tree, &["d2d4"]);
        {
            let data = tree.training_mut(e4).unwrap();
            data.status = Status::Review;
            data.due_date = today().add_days(2);
        }
        let expected = "e2e4 [review, due 2024-03-12]\n  e7e5\nd2d4 [inactive] (dormant)\n";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_tree(&empty_tree(Colour::Black)), "");
    }
}
