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
use crate::tree::Tree;
use crate::types::colour::Colour;
use crate::types::date::Date;
use crate::types::node_hash::NodeHash;
use crate::types::training::TrainingData;

pub fn export_tree(directory: Option<String>, name: &str) -> Fallible<()> {
    let coll: Collection = Collection::new(directory)?;
    let tree: Tree = coll.db.read_tree(name)?;
    let export: Export = get_export(name, &tree);
    let json: String = serde_json::to_string_pretty(&export)?;
    println!("{json}");
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export {
    name: String,
    colour: Colour,
    root_fen: String,
    latest_access: Date,
    new_limit: u32,
    new_remaining: u32,
    nodes: Vec<NodeExport>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeExport {
    hash: NodeHash,
    parent: NodeHash,
    moves: Vec<String>,
    training: Option<TrainingData>,
}

fn get_export(name: &str, tree: &Tree) -> Export {
    let meta = tree.meta();
    let nodes = tree
        .ids()
        .filter_map(|id| {
            let node = tree.node(id);
            let parent = node.parent()?;
            Some(NodeExport {
                hash: node.hash(),
                parent: tree.node(parent).hash(),
                moves: tree.path(id).into_iter().map(String::from).collect(),
                training: node.training().copied(),
            })
        })
        .collect();
    Export {
        name: name.to_string(),
        colour: meta.colour,
        root_fen: meta.root_fen.clone(),
        latest_access: meta.latest_access,
        new_limit: meta.new_limit,
        new_remaining: meta.new_remaining,
        nodes,
    }
}
