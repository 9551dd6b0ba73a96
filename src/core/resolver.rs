//! Formula resolver for `lookup(<column>,<row>)` references.
//!
//! Resolution is a pure walk over a [`CellSource`]: follow each lookup to its
//! source cell until a literal is reached, failing on a missing source or on
//! any key that repeats along the chain.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::store::CellSource;
use crate::error::{SheetError, SheetResult};
use crate::types::{CellContent, CellKey, Lookup, RawValue, Scalar};

/// Strings starting with this prefix are formulas, never literal text
pub const FORMULA_PREFIX: &str = "lookup(";

fn lookup_re() -> &'static Regex {
    static LOOKUP_RE: OnceLock<Regex> = OnceLock::new();
    LOOKUP_RE.get_or_init(|| {
        Regex::new(r"^lookup\(([^(),]+),([0-9]+)\)$").expect("lookup formula regex must compile")
    })
}

pub fn is_formula(text: &str) -> bool {
    text.starts_with(FORMULA_PREFIX)
}

/// Parse the exact form `lookup(<column>,<row>)`
pub fn parse_lookup(formula: &str) -> SheetResult<Lookup> {
    let invalid = || SheetError::InvalidFormula(formula.to_string());

    let caps = lookup_re().captures(formula).ok_or_else(invalid)?;
    let row = caps[2].parse::<u64>().map_err(|_| invalid())?;
    Ok(Lookup::new(&caps[1], row))
}

/// Split a written value into a literal or a parsed lookup
pub fn classify(value: Scalar) -> SheetResult<RawValue> {
    match value {
        Scalar::String(text) if is_formula(&text) => Ok(RawValue::Formula(parse_lookup(&text)?)),
        literal => Ok(RawValue::Literal(literal)),
    }
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub value: Scalar,
    /// Source keys visited, ending at the literal cell that supplied `value`
    pub chain: Vec<CellKey>,
}

/// Resolve `lookup` on behalf of the cell at `requester`.
///
/// Intermediate formula cells are re-resolved from their raw lookups rather
/// than read from their cached values.
pub fn resolve(
    lookup: &Lookup,
    requester: &CellKey,
    cells: &impl CellSource,
) -> SheetResult<Resolution> {
    let mut seen: HashSet<CellKey> = HashSet::from([requester.clone()]);
    let mut path = vec![requester.clone()];
    let mut current = lookup.source_key();

    loop {
        let cell = cells
            .cell(&current)
            .ok_or_else(|| SheetError::MissingSource(current.clone()))?;

        path.push(current.clone());
        if !seen.insert(current) {
            return Err(SheetError::CircularDependency(path));
        }

        match &cell.content {
            CellContent::Literal(value) => {
                path.remove(0);
                return Ok(Resolution {
                    value: value.clone(),
                    chain: path,
                });
            }
            CellContent::Formula { lookup, .. } => current = lookup.source_key(),
        }
    }
}
