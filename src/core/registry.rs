//! Sheet registry: owns every sheet and serializes writes per sheet.
//!
//! Each sheet sits behind its own `RwLock`, so `set_cell` on one sheet never
//! waits for another. The registry map has a separate lock that is only held
//! while looking up, inserting or removing a sheet handle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info};
use uuid::Uuid;

use super::sheet::{Sheet, WriteReport};
use super::validator::validate_columns;
use crate::error::{Missing, SheetError, SheetResult};
use crate::types::{AuditReport, Column, Scalar, SheetId, SheetSnapshot};

/// Source of fresh sheet identifiers
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> SheetId;
}

/// Random UUIDv4 identifiers
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> SheetId {
        SheetId::new(Uuid::new_v4().to_string())
    }
}

type SheetHandle = Arc<RwLock<Sheet>>;

#[derive(Default)]
struct Sheets {
    by_id: HashMap<SheetId, SheetHandle>,
    /// Creation order, for listing
    order: Vec<SheetId>,
}

pub struct SheetRegistry {
    sheets: RwLock<Sheets>,
    ids: Box<dyn IdGenerator>,
}

impl Default for SheetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id_generator(UuidGenerator)
    }

    pub fn with_id_generator(ids: impl IdGenerator + 'static) -> Self {
        Self {
            sheets: RwLock::new(Sheets::default()),
            ids: Box::new(ids),
        }
    }

    /// Create an empty sheet with the given columns and return its id
    pub fn create_sheet(&self, columns: Vec<Column>) -> SheetResult<SheetId> {
        // Checked before drawing an id so a rejected schema consumes none;
        // `Sheet::new` checks again for callers that bypass the registry.
        validate_columns(&columns)?;
        let id = self.ids.next_id();
        let column_count = columns.len();
        let sheet = Sheet::new(id.clone(), columns)?;

        let mut sheets = write(&self.sheets);
        if sheets.by_id.contains_key(&id) {
            error!(sheet_id = %id, "identifier generator returned a duplicate id");
            return Err(SheetError::Inconsistent(format!(
                "sheet id {id} is already in use"
            )));
        }
        sheets
            .by_id
            .insert(id.clone(), Arc::new(RwLock::new(sheet)));
        sheets.order.push(id.clone());

        info!(sheet_id = %id, columns = column_count, "sheet created");
        Ok(id)
    }

    pub fn get_sheet(&self, id: &SheetId) -> SheetResult<SheetSnapshot> {
        let handle = self.handle(id)?;
        let sheet = read(&handle);
        Ok(sheet.snapshot())
    }

    /// Snapshots of every sheet, in creation order
    pub fn list_sheets(&self) -> Vec<SheetSnapshot> {
        let handles: Vec<SheetHandle> = {
            let sheets = read(&self.sheets);
            sheets
                .order
                .iter()
                .filter_map(|id| sheets.by_id.get(id).cloned())
                .collect()
        };
        handles.iter().map(|handle| read(handle).snapshot()).collect()
    }

    /// Write one cell and propagate, as a single unit under the sheet's write lock
    pub fn set_cell(
        &self,
        id: &SheetId,
        column: &str,
        row: u64,
        value: Scalar,
    ) -> SheetResult<WriteReport> {
        let handle = self.handle(id)?;
        let mut sheet = write(&handle);

        match sheet.set_cell(column, row, value) {
            Ok(report) => {
                debug!(
                    sheet_id = %id,
                    cell = %report.cell,
                    recomputed = report.recomputed.len(),
                    "cell written"
                );
                Ok(report)
            }
            Err(err) if !err.is_user_error() => {
                error!(sheet_id = %id, column, row, error = %err, "dependency invariant violated");
                Err(err)
            }
            Err(err) => {
                debug!(sheet_id = %id, column, row, error = %err, "cell write rejected");
                Err(err)
            }
        }
    }

    pub fn delete_sheet(&self, id: &SheetId) -> SheetResult<()> {
        let mut sheets = write(&self.sheets);
        if sheets.by_id.remove(id).is_none() {
            return Err(SheetError::NotFound(Missing::Sheet(id.clone())));
        }
        sheets.order.retain(|existing| existing != id);

        info!(sheet_id = %id, "sheet deleted");
        Ok(())
    }

    pub fn audit_cell(&self, id: &SheetId, column: &str, row: u64) -> SheetResult<AuditReport> {
        let handle = self.handle(id)?;
        let sheet = read(&handle);
        sheet.audit(column, row)
    }

    pub fn len(&self) -> usize {
        read(&self.sheets).by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, id: &SheetId) -> SheetResult<SheetHandle> {
        read(&self.sheets)
            .by_id
            .get(id)
            .cloned()
            .ok_or_else(|| SheetError::NotFound(Missing::Sheet(id.clone())))
    }
}

// Writes commit only after every check has passed, so a poisoned lock still
// guards a consistent sheet.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
