//! Cycle-guarded breadth-first walks over subs or supers.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use aldb_core::{ActivityKey, ActivityVersion};

use crate::index::DirectoryIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Follow `subs`.
    Down,
    /// Follow `supers`.
    Up,
}

/// Lazy breadth-first closure from a start node.
///
/// Yields `(depth, node)` with depth 1 for direct neighbours. The start node
/// is never yielded and every `(id, version)` appears at most once, so the
/// walk ends even when the graph has cycles.
pub struct Traversal {
    index: Arc<DirectoryIndex>,
    direction: Direction,
    max_depth: Option<usize>,
    queue: VecDeque<(usize, Arc<ActivityVersion>)>,
    seen: HashSet<ActivityKey>,
}

impl Traversal {
    pub fn new(
        index: Arc<DirectoryIndex>,
        start: &Arc<ActivityVersion>,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> Self {
        let mut walk = Self {
            index,
            direction,
            max_depth,
            queue: VecDeque::new(),
            seen: HashSet::new(),
        };
        if let Some(key) = start.key() {
            let _ = walk.seen.insert(key);
        }
        walk.expand(0, start);
        walk
    }

    fn expand(&mut self, depth: usize, node: &ActivityVersion) {
        if self.max_depth.is_some_and(|max| depth >= max) {
            return;
        }
        let neighbours = match self.direction {
            Direction::Down => &node.subs,
            Direction::Up => &node.supers,
        };
        for next in self.index.resolve_all(neighbours) {
            let Some(key) = next.key() else { continue };
            if self.seen.insert(key) {
                self.queue.push_back((depth + 1, next));
            }
        }
    }
}

impl Iterator for Traversal {
    type Item = (usize, Arc<ActivityVersion>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.queue.pop_front()?;
        self.expand(depth, &node);
        Some((depth, node))
    }
}
