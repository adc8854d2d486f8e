//! Bidirectional point-to-point shortest path over a link matrix.
//!
//! Two breadth-first frontiers grow toward each other — forward from the
//! start over the matrix, backward from the goal over its transpose — and
//! the path is stitched together at the first node both sides have seen.
//! Expanding whichever side currently knows fewer nodes keeps the explored
//! region small.

use hashbrown::HashMap;

use crate::matrix::LinkMatrix;
use crate::{Error, Result};

/// Find a shortest path from `start` to `goal`, as the full node index
/// sequence including both endpoints. `transposed` must be the transpose of
/// `matrix` — pre-transpose once if you search repeatedly.
///
/// Returns an empty vector when no path exists (both frontiers exhausted
/// without meeting), and [`Error::NodeOutOfBounds`] when either endpoint is
/// not a valid index.
pub fn bidirectional_search(
    matrix: &LinkMatrix,
    transposed: &LinkMatrix,
    start: usize,
    goal: usize,
) -> Result<Vec<usize>> {
    let size = matrix.len();
    for endpoint in [start, goal] {
        if endpoint >= size {
            return Err(Error::NodeOutOfBounds {
                index: endpoint,
                size,
            });
        }
    }
    if start == goal {
        return Ok(vec![start]);
    }

    // Predecessor maps; the roots have no predecessor.
    let mut toward_start: HashMap<usize, Option<usize>> = HashMap::new();
    let mut toward_goal: HashMap<usize, Option<usize>> = HashMap::new();
    toward_start.insert(start, None);
    toward_goal.insert(goal, None);

    let mut frontier_start = vec![start];
    let mut frontier_goal = vec![goal];

    let middle = 'outer: loop {
        if frontier_start.is_empty() || frontier_goal.is_empty() {
            return Ok(Vec::new());
        }
        // Grow the smaller side.
        let (paths, other, frontier, links) = if toward_start.len() <= toward_goal.len() {
            (&mut toward_start, &toward_goal, &mut frontier_start, matrix)
        } else {
            (&mut toward_goal, &toward_start, &mut frontier_goal, transposed)
        };

        let mut next_level = Vec::new();
        for &at in frontier.iter() {
            for candidate in links.neighbors(at) {
                if !paths.contains_key(&candidate) {
                    paths.insert(candidate, Some(at));
                    next_level.push(candidate);
                }
            }
        }
        for &node in &next_level {
            if other.contains_key(&node) {
                *frontier = next_level;
                break 'outer node;
            }
        }
        *frontier = next_level;
    };

    // Stitch start..middle..goal together.
    let mut path = vec![middle];
    let mut at = middle;
    while let Some(&Some(prev)) = toward_start.get(&at) {
        path.insert(0, prev);
        at = prev;
    }
    let mut at = middle;
    while let Some(&Some(next)) = toward_goal.get(&at) {
        path.push(next);
        at = next;
    }
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
