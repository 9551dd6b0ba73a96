//! Propagation engine: recompute every formula cell that transitively reads a
//! just-written cell.
//!
//! Traversal is a breadth-first worklist over the dependency graph with a
//! per-call visited set. The write path rejects cycles before anything is
//! committed, so reaching a key twice means the graph is corrupt; that is
//! reported as [`SheetError::Inconsistent`] instead of looping.

use std::collections::{HashSet, VecDeque};

use super::graph::DependencyGraph;
use super::resolver::resolve;
use super::store::CellSource;
use super::validator::check_type;
use crate::error::{SheetError, SheetResult};
use crate::types::{CellContent, CellKey, Column, Scalar};

/// A new resolved value for one dependent formula cell
#[derive(Debug, Clone, PartialEq)]
pub struct Recompute {
    pub key: CellKey,
    pub value: Scalar,
}

/// Compute fresh values for all dependents of `start`, in visit order.
///
/// Nothing is mutated here; the caller applies the returned updates when it
/// commits the write.
pub fn plan(
    start: &CellKey,
    graph: &DependencyGraph,
    cells: &impl CellSource,
    columns: &[Column],
) -> SheetResult<Vec<Recompute>> {
    let mut visited: HashSet<CellKey> = HashSet::from([start.clone()]);
    let mut queue: VecDeque<CellKey> = graph.dependents(start).cloned().collect();
    let mut updates = Vec::new();

    while let Some(key) = queue.pop_front() {
        if !visited.insert(key.clone()) {
            return Err(SheetError::Inconsistent(format!(
                "propagation from {start} reached {key} twice"
            )));
        }

        let cell = cells.cell(&key).ok_or_else(|| {
            SheetError::Inconsistent(format!("dependency edge points at missing cell {key}"))
        })?;

        // The edge alone proves nothing; only a live formula gets recomputed.
        let CellContent::Formula { lookup, .. } = &cell.content else {
            continue;
        };

        let resolution = resolve(lookup, &key, cells).map_err(|err| {
            SheetError::Inconsistent(format!("re-resolving {key} failed: {err}"))
        })?;

        let column = columns
            .iter()
            .find(|column| column.name == key.column)
            .ok_or_else(|| {
                SheetError::Inconsistent(format!("cell {key} belongs to no column"))
            })?;
        check_type(column, &key, &resolution.value).map_err(|err| {
            SheetError::Inconsistent(format!("recomputed value no longer fits: {err}"))
        })?;

        queue.extend(graph.dependents(&key).cloned());
        updates.push(Recompute {
            key,
            value: resolution.value,
        });
    }

    Ok(updates)
}
