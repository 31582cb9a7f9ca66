//! Ownership-constrained route search over the lane graph.

use std::collections::VecDeque;

use stronghold_core::TowerId;

use crate::towers::Tower;

/// Resolves the route a dispatch from `source` to `target` follows.
///
/// A direct neighbor is always reached in one hop. Otherwise a breadth-first
/// search explores neighbors in lane order, entering a tower only when it is
/// the target or belongs to the source's owner. The returned route excludes
/// the source and ends at the target; `None` means no route exists.
pub(crate) fn find_route(towers: &[Tower], source: TowerId, target: TowerId) -> Option<Vec<TowerId>> {
    let origin = tower(towers, source)?;
    let _ = tower(towers, target)?;

    if origin.is_neighbor(target) {
        return Some(vec![target]);
    }

    let owner = origin.owner;
    let mut came_from: Vec<Option<TowerId>> = vec![None; towers.len()];
    let mut visited = vec![false; towers.len()];
    let mut queue = VecDeque::new();

    visited[index(source)] = true;
    queue.push_back(source);

    while let Some(current) = queue.pop_front() {
        if current == target {
            return Some(unwind(&came_from, source, target));
        }

        let Some(node) = tower(towers, current) else {
            continue;
        };

        for &next in &node.neighbors {
            let Some(candidate) = tower(towers, next) else {
                continue;
            };

            if visited[index(next)] {
                continue;
            }

            if next != target && candidate.owner != owner {
                continue;
            }

            visited[index(next)] = true;
            came_from[index(next)] = Some(current);
            queue.push_back(next);
        }
    }

    None
}

fn unwind(came_from: &[Option<TowerId>], source: TowerId, target: TowerId) -> Vec<TowerId> {
    let mut route = Vec::new();
    let mut cursor = target;
    while cursor != source {
        route.push(cursor);
        match came_from[index(cursor)] {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    route.reverse();
    route
}

fn tower(towers: &[Tower], id: TowerId) -> Option<&Tower> {
    towers.get(index(id))
}

fn index(id: TowerId) -> usize {
    usize::try_from(id.get()).unwrap_or(usize::MAX)
}
