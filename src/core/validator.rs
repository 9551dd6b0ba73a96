//! Schema and cell type validation.
//!
//! Type checks are strict: a value satisfies a column only when its own kind
//! equals the declared type. There is no numeric widening and no parsing of
//! numeric strings.

use std::collections::HashSet;

use crate::error::{SheetError, SheetResult};
use crate::types::{CellKey, Column, Scalar};

/// Characters that would make a column unreachable from a lookup formula
const RESERVED_NAME_CHARS: [char; 3] = ['(', ')', ','];

/// Validate a column list for a new sheet
pub fn validate_columns(columns: &[Column]) -> SheetResult<()> {
    if columns.is_empty() {
        return Err(SheetError::InvalidSchema(
            "a sheet needs at least one column".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for column in columns {
        if column.name.trim().is_empty() {
            return Err(SheetError::InvalidSchema(
                "column names must not be empty".to_string(),
            ));
        }
        if column.name.contains(RESERVED_NAME_CHARS) {
            return Err(SheetError::InvalidSchema(format!(
                "column name '{}' must not contain '(', ')' or ','",
                column.name
            )));
        }
        if !seen.insert(column.name.as_str()) {
            return Err(SheetError::InvalidSchema(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
    }

    Ok(())
}

/// Check that `value` may be stored in `column` at `cell`
pub fn check_type(column: &Column, cell: &CellKey, value: &Scalar) -> SheetResult<()> {
    if value.kind() == column.kind {
        Ok(())
    } else {
        Err(SheetError::InvalidType {
            cell: cell.clone(),
            expected: column.kind,
            found: value.kind(),
        })
    }
}
