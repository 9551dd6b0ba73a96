//! Lookup Sheets - typed in-memory sheets with lookup formulas
//!
//! A sheet has a fixed list of typed columns. Each cell holds either a literal
//! value or a `lookup(<column>,<row>)` formula that reads another cell. Writing
//! a cell re-resolves every formula that depends on it, transitively.
//!
//! # Features
//!
//! - Strictly typed columns: boolean, int, double, string (no implicit coercion)
//! - Lookup chains of any length, with full-chain cycle detection
//! - Atomic writes: a rejected write leaves the sheet untouched
//! - Per-sheet locking in the registry, so sheets are written in parallel
//! - HTTP REST API (axum) with a dependency audit endpoint
//!
//! # Example
//!
//! ```
//! use lookup_sheets::core::SheetRegistry;
//! use lookup_sheets::types::{Column, ColumnType, Scalar};
//!
//! let registry = SheetRegistry::new();
//! let id = registry.create_sheet(vec![
//!     Column::new("A", ColumnType::String),
//!     Column::new("C", ColumnType::String),
//! ])?;
//!
//! registry.set_cell(&id, "A", 1, Scalar::from("hello"))?;
//! registry.set_cell(&id, "C", 1, Scalar::from("lookup(A,1)"))?;
//! registry.set_cell(&id, "A", 1, Scalar::from("world"))?;
//!
//! let sheet = registry.get_sheet(&id)?;
//! assert_eq!(sheet.value("C", 1), Some(&Scalar::from("world")));
//! # Ok::<(), lookup_sheets::error::SheetError>(())
//! ```

pub mod api;
pub mod core;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use crate::core::{Sheet, SheetRegistry};
pub use error::{SheetError, SheetResult};
pub use types::{Cell, CellKey, Column, ColumnType, Scalar, SheetId, SheetSnapshot};
