use std::fmt;

use thiserror::Error;

use crate::types::{CellKey, ColumnType, SheetId};

pub type SheetResult<T> = Result<T, SheetError>;

/// The thing a `NotFound` error could not find
#[derive(Debug, Clone, PartialEq)]
pub enum Missing {
    Sheet(SheetId),
    Column(String),
    Cell(CellKey),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Sheet(id) => write!(f, "Sheet '{id}'"),
            Missing::Column(name) => write!(f, "Column '{name}'"),
            Missing::Cell(key) => write!(f, "Cell {key}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SheetError {
    #[error("{0} not found")]
    NotFound(Missing),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Invalid formula '{0}': expected lookup(<column>,<row>)")]
    InvalidFormula(String),

    #[error("Source cell {0} not found")]
    MissingSource(CellKey),

    #[error("Circular dependency detected: {}", render_chain(.0))]
    CircularDependency(Vec<CellKey>),

    #[error("Invalid type for cell {cell}: column expects {expected}, got {found}")]
    InvalidType {
        cell: CellKey,
        expected: ColumnType,
        found: ColumnType,
    },

    /// A dependency invariant the write path should have enforced does not hold
    #[error("Internal consistency violation: {0}")]
    Inconsistent(String),
}

impl SheetError {
    /// Stable name of the error class, used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            SheetError::NotFound(_) => "NotFound",
            SheetError::InvalidSchema(_) => "InvalidSchema",
            SheetError::InvalidFormula(_) => "InvalidFormula",
            SheetError::MissingSource(_) => "MissingSource",
            SheetError::CircularDependency(_) => "CircularDependency",
            SheetError::InvalidType { .. } => "InvalidType",
            SheetError::Inconsistent(_) => "Inconsistent",
        }
    }

    /// False only for internal-consistency violations
    pub fn is_user_error(&self) -> bool {
        !matches!(self, SheetError::Inconsistent(_))
    }
}

fn render_chain(chain: &[CellKey]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
