//! Ranked command store.
//!
//! An AVL tree keyed by the exact command string. The ordered layout gives
//! prefix queries a pruned range scan (`[prefix, prefix + U+FFFF)`) while
//! fuzzy queries fall back to a full in-order traversal with a
//! case-insensitive substring test. Ranked search scores every hit with
//! [`crate::score::command_score`] and sorts descending; the sort is stable,
//! so ties keep the tree's ascending key order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::score;

/// Aggregated metadata for one distinct command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMetadata {
    /// The exact command line as it appeared in history.
    pub command: String,
    /// Most recent occurrence observed during ingestion.
    pub last_seen: Option<DateTime<Utc>>,
    /// Aggregate occurrence count; always at least 1 once stored.
    pub frequency: usize,
}

/// A scored query hit. Transient: never persisted.
#[derive(Debug, Clone)]
pub struct RankedCommand {
    pub command: String,
    pub score: f64,
    pub metadata: CommandMetadata,
}

struct Node {
    key: String,
    value: CommandMetadata,
    height: i32,
    left: Link,
    right: Link,
}

type Link = Option<Box<Node>>;

/// Balanced ordered map from command string to [`CommandMetadata`].
#[derive(Default)]
pub struct CommandStore {
    root: Link,
    len: usize,
}

impl CommandStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a command. A duplicate key updates in place: the stored
    /// frequency grows by the incoming one and `last_seen` is promoted to
    /// the later of the two.
    pub fn insert(&mut self, value: CommandMetadata) {
        let key = value.command.clone();
        let mut added = false;
        self.root = Some(insert_node(self.root.take(), key, value, &mut added));
        if added {
            self.len += 1;
        }
    }

    /// Exact-key lookup.
    pub fn get(&self, command: &str) -> Option<&CommandMetadata> {
        let mut cursor = &self.root;
        while let Some(node) = cursor {
            match command.cmp(node.key.as_str()) {
                Ordering::Less => cursor = &node.left,
                Ordering::Greater => cursor = &node.right,
                Ordering::Equal => return Some(&node.value),
            }
        }
        None
    }

    /// Remove a command. Returns true when the key was present.
    pub fn delete(&mut self, command: &str) -> bool {
        let mut removed = false;
        self.root = delete_node(self.root.take(), command, &mut removed);
        if removed {
            self.len -= 1;
        }
        removed
    }

    /// Every record whose command starts with `prefix`, in ascending key
    /// order. Implemented as a range scan over `[prefix, prefix + U+FFFF)`.
    pub fn search_prefix(&self, prefix: &str) -> Vec<&CommandMetadata> {
        let mut results = Vec::new();
        let high = format!("{prefix}\u{ffff}");
        range_scan(&self.root, prefix, &high, &mut results);
        results
    }

    /// Prefix matches ordered most recent first; records without a
    /// timestamp sort last.
    pub fn search_prefix_most_recent(&self, prefix: &str) -> Vec<&CommandMetadata> {
        let mut matches = self.search_prefix(prefix);
        matches.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        matches
    }

    /// Case-insensitive substring scan over the whole tree, in ascending
    /// key order.
    pub fn search_fuzzy(&self, query: &str) -> Vec<&CommandMetadata> {
        let needle = query.to_ascii_lowercase();
        let mut results = Vec::new();
        fuzzy_scan(&self.root, &needle, &mut results);
        results
    }

    /// Prefix or fuzzy search with ranked output, sorted descending by
    /// score. The sort is stable: ties preserve the traversal order.
    pub fn search_ranked(&self, query: &str, fuzzy: bool) -> Vec<RankedCommand> {
        let hits = if fuzzy {
            self.search_fuzzy(query)
        } else {
            self.search_prefix(query)
        };

        let now = Utc::now();
        let mut ranked: Vec<RankedCommand> = hits
            .into_iter()
            .map(|metadata| RankedCommand {
                command: metadata.command.clone(),
                score: score::command_score(metadata.frequency, metadata.last_seen, now),
                metadata: metadata.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }
}

fn height(link: &Link) -> i32 {
    link.as_ref().map_or(0, |node| node.height)
}

fn update_height(node: &mut Node) {
    node.height = height(&node.left).max(height(&node.right)) + 1;
}

fn balance_factor(node: &Node) -> i32 {
    height(&node.left) - height(&node.right)
}

fn rotate_left(mut node: Box<Node>) -> Box<Node> {
    match node.right.take() {
        None => node,
        Some(mut pivot) => {
            node.right = pivot.left.take();
            update_height(&mut node);
            pivot.left = Some(node);
            update_height(&mut pivot);
            pivot
        }
    }
}

fn rotate_right(mut node: Box<Node>) -> Box<Node> {
    match node.left.take() {
        None => node,
        Some(mut pivot) => {
            node.left = pivot.right.take();
            update_height(&mut node);
            pivot.right = Some(node);
            update_height(&mut pivot);
            pivot
        }
    }
}

// Height must be current before the balance factor is read.
fn rebalance(mut node: Box<Node>) -> Box<Node> {
    update_height(&mut node);
    let factor = balance_factor(&node);

    if factor > 1 {
        if node.left.as_ref().map_or(0, |l| balance_factor(l)) < 0 {
            node.left = node.left.take().map(rotate_left);
        }
        return rotate_right(node);
    }

    if factor < -1 {
        if node.right.as_ref().map_or(0, |r| balance_factor(r)) > 0 {
            node.right = node.right.take().map(rotate_right);
        }
        return rotate_left(node);
    }

    node
}

fn insert_node(link: Link, key: String, value: CommandMetadata, added: &mut bool) -> Box<Node> {
    let Some(mut node) = link else {
        *added = true;
        let frequency = value.frequency.max(1);
        return Box::new(Node {
            key,
            value: CommandMetadata { frequency, ..value },
            height: 1,
            left: None,
            right: None,
        });
    };

    match key.cmp(&node.key) {
        Ordering::Less => {
            node.left = Some(insert_node(node.left.take(), key, value, added));
        }
        Ordering::Greater => {
            node.right = Some(insert_node(node.right.take(), key, value, added));
        }
        Ordering::Equal => {
            node.value.frequency = node.value.frequency.saturating_add(value.frequency);
            if value.last_seen > node.value.last_seen {
                node.value.last_seen = value.last_seen;
            }
        }
    }

    rebalance(node)
}

fn delete_node(link: Link, key: &str, removed: &mut bool) -> Link {
    let mut node = link?;

    match key.cmp(node.key.as_str()) {
        Ordering::Less => {
            node.left = delete_node(node.left.take(), key, removed);
        }
        Ordering::Greater => {
            node.right = delete_node(node.right.take(), key, removed);
        }
        Ordering::Equal => {
            *removed = true;
            match (node.left.take(), node.right.take()) {
                (None, None) => return None,
                (Some(child), None) | (None, Some(child)) => return Some(child),
                (Some(left), Some(right)) => {
                    // Replace with the in-order successor from the right subtree.
                    let (rest, successor) = take_min(right);
                    node.key = successor.key;
                    node.value = successor.value;
                    node.left = Some(left);
                    node.right = rest;
                }
            }
        }
    }

    Some(rebalance(node))
}

fn take_min(mut node: Box<Node>) -> (Link, Box<Node>) {
    match node.left.take() {
        None => {
            let rest = node.right.take();
            (rest, node)
        }
        Some(left) => {
            let (rest, min) = take_min(left);
            node.left = rest;
            (Some(rebalance(node)), min)
        }
    }
}

fn range_scan<'a>(link: &'a Link, low: &str, high: &str, out: &mut Vec<&'a CommandMetadata>) {
    let Some(node) = link else { return };

    if node.key.as_str() >= low {
        range_scan(&node.left, low, high, out);
    }
    if node.key.starts_with(low) {
        out.push(&node.value);
    }
    if node.key.as_str() < high {
        range_scan(&node.right, low, high, out);
    }
}

fn fuzzy_scan<'a>(link: &'a Link, needle: &str, out: &mut Vec<&'a CommandMetadata>) {
    let Some(node) = link else { return };

    fuzzy_scan(&node.left, needle, out);
    if node.key.to_ascii_lowercase().contains(needle) {
        out.push(&node.value);
    }
    fuzzy_scan(&node.right, needle, out);
}
