//! A single sheet: fixed columns, a cell store and its dependency graph.
//!
//! `set_cell` is the only mutator. It resolves, type-checks and plans the full
//! propagation against a staged view before touching any state, so a failed
//! write leaves the sheet exactly as it was.

use super::graph::DependencyGraph;
use super::propagation;
use super::resolver::{classify, resolve};
use super::store::{CellStore, Staged};
use super::validator::{check_type, validate_columns};
use crate::error::{Missing, SheetError, SheetResult};
use crate::types::{
    AuditReport, Cell, CellContent, CellKey, Column, Lookup, RawValue, Scalar, SheetId,
    SheetSnapshot,
};

/// What a successful write touched
#[derive(Debug, Clone, PartialEq)]
pub struct WriteReport {
    pub cell: CellKey,
    /// Dependent formula cells whose resolved value was refreshed, in visit order
    pub recomputed: Vec<CellKey>,
}

#[derive(Debug, Clone)]
pub struct Sheet {
    id: SheetId,
    columns: Vec<Column>,
    cells: CellStore,
    dependencies: DependencyGraph,
}

impl Sheet {
    /// Create an empty sheet. Fails with `InvalidSchema` for a bad column list.
    pub fn new(id: SheetId, columns: Vec<Column>) -> SheetResult<Self> {
        validate_columns(&columns)?;
        Ok(Self {
            id,
            columns,
            cells: CellStore::new(),
            dependencies: DependencyGraph::new(),
        })
    }

    pub fn id(&self) -> &SheetId {
        &self.id
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn cells(&self) -> &CellStore {
        &self.cells
    }

    pub fn dependencies(&self) -> &DependencyGraph {
        &self.dependencies
    }

    pub fn cell(&self, key: &CellKey) -> Option<&Cell> {
        self.cells.get(key)
    }

    pub fn effective_value(&self, key: &CellKey) -> Option<&Scalar> {
        self.cells.get(key).map(Cell::effective_value)
    }

    /// Write `value` at `(column, row)` and refresh every dependent formula.
    ///
    /// A string starting with `lookup(` is treated as a formula.
    pub fn set_cell(&mut self, column: &str, row: u64, value: Scalar) -> SheetResult<WriteReport> {
        let declared = self
            .column(column)
            .ok_or_else(|| SheetError::NotFound(Missing::Column(column.to_string())))?;
        let key = CellKey::new(column, row);

        let content = match classify(value)? {
            RawValue::Literal(value) => CellContent::Literal(value),
            RawValue::Formula(lookup) => {
                let resolution = resolve(&lookup, &key, &self.cells)?;
                CellContent::Formula {
                    lookup,
                    resolved: resolution.value,
                }
            }
        };
        check_type(declared, &key, content.effective_value())?;

        let cell = Cell {
            column: column.to_string(),
            row,
            content,
        };

        // Edges with `key` as the dependent are unreachable from `key` once the
        // cycle check passed, so planning over the committed graph is sound.
        let updates = {
            let staged = Staged::new(&self.cells, &cell);
            propagation::plan(&key, &self.dependencies, &staged, &self.columns)?
        };

        // Commit
        let old_source = self
            .cells
            .get(&key)
            .and_then(Cell::lookup)
            .map(Lookup::source_key);
        let new_source = cell.lookup().map(Lookup::source_key);
        if let Some(old) = old_source.filter(|old| Some(old) != new_source.as_ref()) {
            self.dependencies.remove_edge(&old, &key);
        }
        if let Some(source) = new_source {
            self.dependencies.add_edge(source, key.clone());
        }
        self.cells.insert(cell);

        let mut recomputed = Vec::with_capacity(updates.len());
        for update in updates {
            self.cells.set_resolved(&update.key, update.value);
            recomputed.push(update.key);
        }

        Ok(WriteReport {
            cell: key,
            recomputed,
        })
    }

    /// Owned copy of the sheet's public state
    pub fn snapshot(&self) -> SheetSnapshot {
        SheetSnapshot {
            id: self.id.clone(),
            columns: self.columns.clone(),
            cells: self.cells.to_map(),
        }
    }

    /// Lookup chain and transitive dependents of an existing cell
    pub fn audit(&self, column: &str, row: u64) -> SheetResult<AuditReport> {
        if self.column(column).is_none() {
            return Err(SheetError::NotFound(Missing::Column(column.to_string())));
        }
        let key = CellKey::new(column, row);
        let cell = self
            .cells
            .get(&key)
            .ok_or_else(|| SheetError::NotFound(Missing::Cell(key.clone())))?;

        let precedents = match cell.lookup() {
            Some(lookup) => resolve(lookup, &key, &self.cells)?.chain,
            None => Vec::new(),
        };

        Ok(AuditReport {
            formula: cell.lookup().map(ToString::to_string),
            value: cell.effective_value().clone(),
            precedents,
            dependents: self.dependencies.transitive_dependents(&key),
            cell: key,
        })
    }
}
