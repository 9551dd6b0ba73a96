//! Sheet registry integration tests
//!
//! End-to-end behavior of the public library API: lookup resolution,
//! propagation, atomic rejection and per-sheet concurrency.

use std::sync::Arc;
use std::thread;

use pretty_assertions::assert_eq;

use lookup_sheets::error::Missing;
use lookup_sheets::{CellKey, Column, ColumnType, Scalar, SheetError, SheetId, SheetRegistry};

fn key(column: &str, row: u64) -> CellKey {
    CellKey::new(column, row)
}

fn string_sheet(registry: &SheetRegistry, names: &[&str]) -> SheetId {
    let columns = names
        .iter()
        .map(|name| Column::new(*name, ColumnType::String))
        .collect();
    registry.create_sheet(columns).unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// SHEET LIFECYCLE TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_create_sheet_starts_empty() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::Boolean),
            Column::new("B", ColumnType::Int),
            Column::new("C", ColumnType::Double),
            Column::new("D", ColumnType::String),
        ])
        .unwrap();

    let sheet = registry.get_sheet(&id).unwrap();
    assert_eq!(sheet.id, id);
    assert_eq!(sheet.columns.len(), 4);
    assert!(sheet.cells.is_empty());
}

#[test]
fn test_create_sheet_schema_errors() {
    let registry = SheetRegistry::new();
    let cases = vec![
        vec![],
        vec![
            Column::new("A", ColumnType::Int),
            Column::new("A", ColumnType::String),
        ],
        vec![Column::new("", ColumnType::Int)],
        vec![Column::new("A,B", ColumnType::Int)],
        vec![Column::new("f(x)", ColumnType::Int)],
    ];
    for columns in cases {
        assert!(matches!(
            registry.create_sheet(columns),
            Err(SheetError::InvalidSchema(_))
        ));
    }
    assert!(registry.is_empty());
}

#[test]
fn test_deleted_sheet_is_gone() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A"]);
    registry.set_cell(&id, "A", 1, Scalar::from("x")).unwrap();

    registry.delete_sheet(&id).unwrap();
    assert_eq!(
        registry.get_sheet(&id).unwrap_err(),
        SheetError::NotFound(Missing::Sheet(id.clone()))
    );
    assert!(registry.list_sheets().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// LOOKUP AND PROPAGATION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_lookup_follows_source_updates() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A", "C"]);

    registry.set_cell(&id, "A", 1, Scalar::from("hello")).unwrap();
    registry
        .set_cell(&id, "C", 1, Scalar::from("lookup(A,1)"))
        .unwrap();
    assert_eq!(
        registry.get_sheet(&id).unwrap().value("C", 1),
        Some(&Scalar::from("hello"))
    );

    let report = registry.set_cell(&id, "A", 1, Scalar::from("world")).unwrap();
    assert_eq!(report.recomputed, vec![key("C", 1)]);

    let sheet = registry.get_sheet(&id).unwrap();
    let c1 = sheet.cell("C", 1).unwrap();
    assert!(c1.is_formula());
    assert_eq!(c1.resolved_value(), Some(&Scalar::from("world")));
}

#[test]
fn test_long_chain_propagates_every_level() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![Column::new("N", ColumnType::Int)])
        .unwrap();

    registry.set_cell(&id, "N", 0, Scalar::Int(1)).unwrap();
    for row in 1..50 {
        let formula = format!("lookup(N,{})", row - 1);
        registry.set_cell(&id, "N", row, Scalar::from(formula)).unwrap();
    }

    let report = registry.set_cell(&id, "N", 0, Scalar::Int(99)).unwrap();
    assert_eq!(report.recomputed.len(), 49);

    let sheet = registry.get_sheet(&id).unwrap();
    for row in 0..50 {
        assert_eq!(sheet.value("N", row), Some(&Scalar::Int(99)), "row {row}");
    }
}

#[test]
fn test_fan_out_from_one_source() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::Double),
            Column::new("B", ColumnType::Double),
        ])
        .unwrap();

    registry.set_cell(&id, "A", 1, Scalar::Double(1.5)).unwrap();
    for row in 1..=5 {
        registry
            .set_cell(&id, "B", row, Scalar::from("lookup(A,1)"))
            .unwrap();
    }
    registry.set_cell(&id, "A", 1, Scalar::Double(2.5)).unwrap();

    let sheet = registry.get_sheet(&id).unwrap();
    for row in 1..=5 {
        assert_eq!(sheet.value("B", row), Some(&Scalar::Double(2.5)));
    }
}

#[test]
fn test_lookup_into_other_column_type_is_rejected() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::String),
            Column::new("B", ColumnType::Int),
        ])
        .unwrap();

    registry.set_cell(&id, "A", 1, Scalar::from("text")).unwrap();
    let err = registry
        .set_cell(&id, "B", 1, Scalar::from("lookup(A,1)"))
        .unwrap_err();
    assert_eq!(
        err,
        SheetError::InvalidType {
            cell: key("B", 1),
            expected: ColumnType::Int,
            found: ColumnType::String,
        }
    );
    assert!(registry.get_sheet(&id).unwrap().cell("B", 1).is_none());
}

#[test]
fn test_source_change_that_breaks_dependent_type_is_rejected() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::String),
            Column::new("B", ColumnType::String),
        ])
        .unwrap();

    registry.set_cell(&id, "A", 1, Scalar::from("x")).unwrap();
    registry
        .set_cell(&id, "B", 1, Scalar::from("lookup(A,1)"))
        .unwrap();

    // A literal of the wrong type never reaches the dependent
    let err = registry.set_cell(&id, "A", 1, Scalar::Int(5)).unwrap_err();
    assert!(matches!(err, SheetError::InvalidType { .. }));
    assert_eq!(
        registry.get_sheet(&id).unwrap().value("B", 1),
        Some(&Scalar::from("x"))
    );
}

#[test]
fn test_formula_text_in_wrong_shape() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A"]);

    for text in ["lookup(A,1", "lookup(A,-1)", "lookup(,1)", "lookup(A,1) ", "lookup(A,x)"] {
        assert_eq!(
            registry.set_cell(&id, "A", 2, Scalar::from(text)).unwrap_err(),
            SheetError::InvalidFormula(text.to_string()),
        );
    }

    // Only the prefix marks a formula
    registry.set_cell(&id, "A", 2, Scalar::from(" lookup(A,1)")).unwrap();
    registry.set_cell(&id, "A", 3, Scalar::from("LOOKUP(A,1)")).unwrap();
    let sheet = registry.get_sheet(&id).unwrap();
    assert!(!sheet.cell("A", 2).unwrap().is_formula());
    assert!(!sheet.cell("A", 3).unwrap().is_formula());
}

// ═══════════════════════════════════════════════════════════════════════════
// CYCLE AND ATOMICITY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_three_cell_cycle_is_rejected_with_full_chain() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A", "B", "C"]);

    registry.set_cell(&id, "A", 1, Scalar::from("v")).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();
    registry.set_cell(&id, "C", 1, Scalar::from("lookup(B,1)")).unwrap();
    let before = registry.get_sheet(&id).unwrap();

    let err = registry
        .set_cell(&id, "A", 1, Scalar::from("lookup(C,1)"))
        .unwrap_err();
    assert_eq!(
        err,
        SheetError::CircularDependency(vec![key("A", 1), key("C", 1), key("B", 1), key("A", 1)])
    );
    assert_eq!(registry.get_sheet(&id).unwrap(), before);
}

#[test]
fn test_self_lookup() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A"]);

    assert_eq!(
        registry
            .set_cell(&id, "A", 1, Scalar::from("lookup(A,1)"))
            .unwrap_err(),
        SheetError::MissingSource(key("A", 1))
    );

    registry.set_cell(&id, "A", 1, Scalar::from("x")).unwrap();
    assert!(matches!(
        registry.set_cell(&id, "A", 1, Scalar::from("lookup(A,1)")),
        Err(SheetError::CircularDependency(_))
    ));
}

#[test]
fn test_rejected_writes_change_nothing() {
    let registry = SheetRegistry::new();
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::Int),
            Column::new("B", ColumnType::Int),
        ])
        .unwrap();
    registry.set_cell(&id, "A", 1, Scalar::Int(1)).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();
    let before = registry.get_sheet(&id).unwrap();

    let attempts = [
        ("A", Scalar::from("one")),
        ("A", Scalar::Double(1.0)),
        ("B", Scalar::from("lookup(A,2)")),
        ("B", Scalar::from("lookup(Z,1)")),
        ("A", Scalar::from("lookup(B,1)")),
        ("Z", Scalar::Int(1)),
    ];
    for (column, value) in attempts {
        assert!(registry.set_cell(&id, column, 1, value).is_err());
        assert_eq!(registry.get_sheet(&id).unwrap(), before);
    }
}

#[test]
fn test_lookup_to_undeclared_column_is_missing_source() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A"]);
    assert_eq!(
        registry
            .set_cell(&id, "A", 1, Scalar::from("lookup(Z,1)"))
            .unwrap_err(),
        SheetError::MissingSource(key("Z", 1))
    );
}

#[test]
fn test_repeated_write_is_idempotent() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A", "B"]);

    registry.set_cell(&id, "A", 1, Scalar::from("x")).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();
    let once = registry.get_sheet(&id).unwrap();
    let once_audit = registry.audit_cell(&id, "A", 1).unwrap();

    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();
    assert_eq!(registry.get_sheet(&id).unwrap(), once);
    assert_eq!(registry.audit_cell(&id, "A", 1).unwrap(), once_audit);
}

#[test]
fn test_overwritten_formula_no_longer_follows_old_source() {
    let registry = SheetRegistry::new();
    let id = string_sheet(&registry, &["A", "B"]);

    registry.set_cell(&id, "A", 1, Scalar::from("x")).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("pinned")).unwrap();

    let report = registry.set_cell(&id, "A", 1, Scalar::from("y")).unwrap();
    assert!(report.recomputed.is_empty());
    assert_eq!(
        registry.get_sheet(&id).unwrap().value("B", 1),
        Some(&Scalar::from("pinned"))
    );
    assert!(registry.audit_cell(&id, "A", 1).unwrap().dependents.is_empty());
}

// ═══════════════════════════════════════════════════════════════════════════
// CONCURRENCY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_parallel_writes_to_different_sheets() {
    let registry = Arc::new(SheetRegistry::new());
    let ids: Vec<SheetId> = (0..8)
        .map(|_| {
            registry
                .create_sheet(vec![
                    Column::new("A", ColumnType::Int),
                    Column::new("B", ColumnType::Int),
                ])
                .unwrap()
        })
        .collect();

    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.set_cell(&id, "A", 1, Scalar::Int(0)).unwrap();
                registry
                    .set_cell(&id, "B", 1, Scalar::from("lookup(A,1)"))
                    .unwrap();
                for i in 1..=100 {
                    registry.set_cell(&id, "A", 1, Scalar::Int(i)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    for id in &ids {
        let sheet = registry.get_sheet(id).unwrap();
        assert_eq!(sheet.value("B", 1), Some(&Scalar::Int(100)));
    }
}

#[test]
fn test_concurrent_writes_to_one_sheet_stay_consistent() {
    let registry = Arc::new(SheetRegistry::new());
    let id = registry
        .create_sheet(vec![
            Column::new("A", ColumnType::Int),
            Column::new("B", ColumnType::Int),
        ])
        .unwrap();
    registry.set_cell(&id, "A", 1, Scalar::Int(0)).unwrap();
    registry.set_cell(&id, "B", 1, Scalar::from("lookup(A,1)")).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    registry.set_cell(&id, "A", 1, Scalar::Int(t * 1000 + i)).unwrap();
                }
            })
        })
        .collect();

    // Readers never observe a dependent out of step with its source
    for _ in 0..200 {
        let sheet = registry.get_sheet(&id).unwrap();
        assert_eq!(sheet.value("A", 1), sheet.value("B", 1));
    }
    for writer in writers {
        writer.join().unwrap();
    }

    let sheet = registry.get_sheet(&id).unwrap();
    assert_eq!(sheet.value("A", 1), sheet.value("B", 1));
}
