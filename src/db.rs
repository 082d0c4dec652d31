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

use std::collections::HashMap;

use rusqlite::Connection;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;

use crate::error::Fallible;
use crate::error::fail;
use crate::position::Position;
use crate::scheduler::daily_recompute;
use crate::session::Review;
use crate::tree::Meta;
use crate::tree::Tree;
use crate::types::date::Date;
use crate::types::node_hash::NodeHash;
use crate::types::status::Status;
use crate::types::timestamp::Timestamp;
use crate::types::training::TrainingData;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !schema_exists(&tx)? {
                log::debug!("Creating database schema.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        Ok(Self { conn })
    }

    /// Stores a new tree under `name`.
    ///
    /// If a tree with that name exists, returns an error.
    pub fn create_tree(&mut self, name: &str, tree: &Tree, created_at: Timestamp) -> Fallible<()> {
        if self.tree_exists(name)? {
            return fail(format!("a tree named {name} already exists."));
        }
        log::debug!("Creating tree {name}.");
        let meta = tree.meta();
        let tx = self.conn.transaction()?;
        tx.execute(
            "insert into trees (tree_name, colour, root_fen, latest_access, new_limit, new_remaining, created_at) values (?, ?, ?, ?, ?, ?, ?);",
            (
                name,
                meta.colour,
                &meta.root_fen,
                meta.latest_access,
                meta.new_limit,
                meta.new_remaining,
                created_at,
            ),
        )?;
        insert_nodes(&tx, name, tree)?;
        tx.commit()?;
        Ok(())
    }

    pub fn tree_exists(&self, name: &str) -> Fallible<bool> {
        let count: i64 = self.conn.query_row(
            "select count(*) from trees where tree_name = ?;",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Loads a tree, running the daily recompute if it has not run yet
    /// `today`. A recomputed tree is saved before it is returned.
    pub fn load_tree(&mut self, name: &str, today: Date) -> Fallible<Tree> {
        let mut tree = self.read_tree(name)?;
        if daily_recompute(&mut tree, today) {
            self.save_tree(name, &tree)?;
        }
        Ok(tree)
    }

    /// Reads a tree as stored, without touching its training state.
    pub fn read_tree(&self, name: &str) -> Fallible<Tree> {
        let meta = {
            let sql = "select colour, root_fen, latest_access, new_limit, new_remaining from trees where tree_name = ?;";
            let mut stmt = self.conn.prepare(sql)?;
            let mut rows = stmt.query([name])?;
            match rows.next()? {
                Some(row) => Meta {
                    colour: row.get(0)?,
                    root_fen: row.get(1)?,
                    latest_access: row.get(2)?,
                    new_limit: row.get(3)?,
                    new_remaining: row.get(4)?,
                },
                None => return fail(format!("no tree named {name}.")),
            }
        };
        let to_move = Position::from_fen(&meta.root_fen)?.side_to_move();
        let mut tree = Tree::new(meta, to_move);

        // Rows grouped by parent, each group in variation order.
        let mut children: HashMap<NodeHash, Vec<NodeRow>> = HashMap::new();
        {
            let sql = "select node_hash, parent_hash, move, status, due_date, last_date from nodes where tree_name = ? order by ordinal;";
            let mut stmt = self.conn.prepare(sql)?;
            let mut rows = stmt.query([name])?;
            while let Some(row) = rows.next()? {
                let parent: NodeHash = row.get(1)?;
                children.entry(parent).or_default().push(NodeRow {
                    hash: row.get(0)?,
                    mv: row.get(2)?,
                    status: row.get(3)?,
                    due_date: row.get(4)?,
                    last_date: row.get(5)?,
                });
            }
        }

        let mut stack = vec![tree.root()];
        while let Some(parent) = stack.pop() {
            let Some(rows) = children.remove(&tree.node(parent).hash()) else {
                continue;
            };
            for row in rows {
                let id = tree.attach(parent, &row.mv, row.training()?)?;
                if tree.node(id).hash() != row.hash {
                    return fail(format!("node {} in tree {name} has a bad hash.", row.hash));
                }
                stack.push(id);
            }
        }
        if !children.is_empty() {
            return fail(format!("tree {name} has nodes with no parent."));
        }
        log::debug!("Loaded tree {name} with {} nodes.", tree.len());
        Ok(tree)
    }

    /// Replaces the stored copy of a tree.
    pub fn save_tree(&mut self, name: &str, tree: &Tree) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_tree(&tx, name, tree)?;
        tx.commit()?;
        Ok(())
    }

    /// Saves a tree after a graded card and logs the review, atomically.
    pub fn record_review(&mut self, name: &str, tree: &Tree, review: &Review) -> Fallible<()> {
        let tx = self.conn.transaction()?;
        write_tree(&tx, name, tree)?;
        tx.execute(
            "insert into reviews (tree_name, node_hash, reviewed_at, review_date, grade, status, due_date) values (?, ?, ?, ?, ?, ?, ?);",
            (
                name,
                review.node,
                review.reviewed_at,
                review.reviewed_at.local_date(),
                review.grade,
                review.status,
                review.due_date,
            ),
        )?;
        tx.commit()?;
        Ok(())
    }

    /// The names of every stored tree, alphabetically.
    pub fn tree_names(&self) -> Fallible<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("select tree_name from trees order by tree_name;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            names.push(row.get(0)?);
        }
        Ok(names)
    }

    /// Deletes a tree along with its nodes and review log.
    pub fn delete_tree(&mut self, name: &str) -> Fallible<()> {
        let deleted = self
            .conn
            .execute("delete from trees where tree_name = ?;", [name])?;
        if deleted == 0 {
            return fail(format!("no tree named {name}."));
        }
        log::debug!("Deleted tree {name}.");
        Ok(())
    }

    /// The number of cards graded on `today`, across all trees.
    pub fn today_review_count(&self, today: Date) -> Fallible<usize> {
        let count: i64 = self.conn.query_row(
            "select count(*) from reviews where review_date = ?;",
            [today],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

struct NodeRow {
    hash: NodeHash,
    mv: String,
    status: Option<Status>,
    due_date: Option<Date>,
    last_date: Option<Date>,
}

impl NodeRow {
    fn training(&self) -> Fallible<Option<TrainingData>> {
        let (status, due_date, last_date) = match (self.status, self.due_date, self.last_date) {
            (None, None, None) => return Ok(None),
            (Some(status), Some(due_date), Some(last_date)) => (status, due_date, last_date),
            _ => return fail(format!("node {} has partial training data.", self.hash)),
        };
        if status == Status::Review && due_date < last_date {
            return fail(format!(
                "node {} is due on {due_date}, before its last review on {last_date}.",
                self.hash
            ));
        }
        Ok(Some(TrainingData {
            status,
            due_date,
            last_date,
        }))
    }
}

fn write_tree(tx: &Transaction, name: &str, tree: &Tree) -> Fallible<()> {
    let meta = tree.meta();
    let updated = tx.execute(
        "update trees set latest_access = ?, new_limit = ?, new_remaining = ? where tree_name = ?;",
        (meta.latest_access, meta.new_limit, meta.new_remaining, name),
    )?;
    if updated == 0 {
        return fail(format!("no tree named {name}."));
    }
    tx.execute("delete from nodes where tree_name = ?;", [name])?;
    insert_nodes(tx, name, tree)?;
    log::debug!("Saved tree {name} with {} nodes.", tree.len());
    Ok(())
}

fn insert_nodes(tx: &Transaction, name: &str, tree: &Tree) -> Fallible<()> {
    let sql = "insert into nodes (tree_name, node_hash, parent_hash, ordinal, move, status, due_date, last_date) values (?, ?, ?, ?, ?, ?, ?, ?);";
    let mut stmt = tx.prepare(sql)?;
    for id in tree.ids() {
        let node = tree.node(id);
        for (ordinal, child) in node.children().iter().enumerate() {
            let ordinal = ordinal as i64;
            let child = tree.node(*child);
            let training = child.training();
            stmt.execute((
                name,
                child.hash(),
                node.hash(),
                ordinal,
                child.mv(),
                training.map(|data| data.status),
                training.map(|data| data.due_date),
                training.map(|data| data.last_date),
            ))?;
        }
    }
    Ok(())
}

fn schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["trees"], |row| row.get(0))?;
    Ok(count > 0)
}
