use serde::de::{self, Visitor};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::SheetError;

//==============================================================================
// Identifiers
//==============================================================================

/// Opaque sheet identifier handed out by the registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetId(String);

impl SheetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SheetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SheetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

//==============================================================================
// Columns
//==============================================================================

/// Declared scalar type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Boolean,
    Int,
    Double,
    String,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "boolean",
            ColumnType::Int => "int",
            ColumnType::Double => "double",
            ColumnType::String => "string",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = SheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(ColumnType::Boolean),
            "int" => Ok(ColumnType::Int),
            "double" => Ok(ColumnType::Double),
            "string" => Ok(ColumnType::String),
            other => Err(SheetError::InvalidSchema(format!(
                "unrecognized column type '{other}'"
            ))),
        }
    }
}

/// A named, typed column. Fixed for the lifetime of its sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

//==============================================================================
// Values
//==============================================================================

/// A literal cell value.
///
/// On the wire a scalar is a bare JSON value: `true`, `3`, `2.5` or `"text"`.
/// Integers and non-integral numbers stay distinct (`3` is an `Int`, `3.0` a `Double`).
/// An integer outside the `i64` range is rejected rather than widened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Boolean(bool),
    Int(i64),
    Double(f64),
    String(String),
}

impl Scalar {
    /// The column type this value satisfies
    pub fn kind(&self) -> ColumnType {
        match self {
            Scalar::Boolean(_) => ColumnType::Boolean,
            Scalar::Int(_) => ColumnType::Int,
            Scalar::Double(_) => ColumnType::Double,
            Scalar::String(_) => ColumnType::String,
        }
    }
}

struct ScalarVisitor;

impl<'de> Visitor<'de> for ScalarVisitor {
    type Value = Scalar;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, integer, number or string")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Scalar, E> {
        Ok(Scalar::Boolean(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Scalar, E> {
        Ok(Scalar::Int(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Scalar, E> {
        i64::try_from(value)
            .map(Scalar::Int)
            .map_err(|_| E::custom(format!("integer {value} out of range for int")))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Scalar, E> {
        Ok(Scalar::Double(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Scalar, E> {
        Ok(Scalar::String(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Scalar, E> {
        Ok(Scalar::String(value))
    }
}

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarVisitor)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Boolean(b) => write!(f, "{b}"),
            Scalar::Int(i) => write!(f, "{i}"),
            Scalar::Double(d) => write!(f, "{d}"),
            Scalar::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Boolean(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Double(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

//==============================================================================
// Cell Keys and Formulas
//==============================================================================

/// Identity of a cell within a sheet. Renders as `<column>:<row>`, e.g. `A:1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub column: String,
    pub row: u64,
}

impl CellKey {
    pub fn new(column: impl Into<String>, row: u64) -> Self {
        Self {
            column: column.into(),
            row,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.column, self.row)
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A parsed `lookup(<column>,<row>)` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lookup {
    pub column: String,
    pub row: u64,
}

impl Lookup {
    pub fn new(column: impl Into<String>, row: u64) -> Self {
        Self {
            column: column.into(),
            row,
        }
    }

    /// Key of the cell this lookup reads from
    pub fn source_key(&self) -> CellKey {
        CellKey::new(self.column.clone(), self.row)
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lookup({},{})", self.column, self.row)
    }
}

/// A written value after classification: either a literal or a lookup formula
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Literal(Scalar),
    Formula(Lookup),
}

//==============================================================================
// Cells
//==============================================================================

/// What a cell holds. Formula cells always carry their resolved value.
#[derive(Debug, Clone, PartialEq)]
pub enum CellContent {
    Literal(Scalar),
    Formula { lookup: Lookup, resolved: Scalar },
}

impl CellContent {
    /// The value the cell denotes: the literal itself, or the cached lookup result
    pub fn effective_value(&self) -> &Scalar {
        match self {
            CellContent::Literal(value) => value,
            CellContent::Formula { resolved, .. } => resolved,
        }
    }
}

/// A stored cell.
///
/// Serializes as `{column, row, value, resolvedValue?}` where `value` is the raw
/// literal or the formula text and `resolvedValue` appears only for formulas.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub column: String,
    pub row: u64,
    pub content: CellContent,
}

impl Cell {
    pub fn key(&self) -> CellKey {
        CellKey::new(self.column.clone(), self.row)
    }

    pub fn effective_value(&self) -> &Scalar {
        self.content.effective_value()
    }

    pub fn lookup(&self) -> Option<&Lookup> {
        match &self.content {
            CellContent::Formula { lookup, .. } => Some(lookup),
            CellContent::Literal(_) => None,
        }
    }

    pub fn resolved_value(&self) -> Option<&Scalar> {
        match &self.content {
            CellContent::Formula { resolved, .. } => Some(resolved),
            CellContent::Literal(_) => None,
        }
    }

    pub fn is_formula(&self) -> bool {
        self.lookup().is_some()
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.is_formula() { 4 } else { 3 };
        let mut state = serializer.serialize_struct("Cell", fields)?;
        state.serialize_field("column", &self.column)?;
        state.serialize_field("row", &self.row)?;
        match &self.content {
            CellContent::Literal(value) => state.serialize_field("value", value)?,
            CellContent::Formula { lookup, resolved } => {
                state.serialize_field("value", &lookup.to_string())?;
                state.serialize_field("resolvedValue", resolved)?;
            }
        }
        state.end()
    }
}

//==============================================================================
// Read Models
//==============================================================================

/// Owned, point-in-time copy of a sheet. The dependency graph is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSnapshot {
    pub id: SheetId,
    pub columns: Vec<Column>,
    pub cells: BTreeMap<CellKey, Cell>,
}

impl SheetSnapshot {
    pub fn cell(&self, column: &str, row: u64) -> Option<&Cell> {
        self.cells.get(&CellKey::new(column, row))
    }

    /// Effective value at `(column, row)`, if the cell exists
    pub fn value(&self, column: &str, row: u64) -> Option<&Scalar> {
        self.cell(column, row).map(Cell::effective_value)
    }
}

/// Dependency audit of a single cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    pub cell: CellKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub value: Scalar,
    /// Lookup chain from this cell down to the literal it resolves to
    pub precedents: Vec<CellKey>,
    /// Every formula cell that transitively reads this cell, breadth-first
    pub dependents: Vec<CellKey>,
}
