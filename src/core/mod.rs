//! Core sheet engine: cell store, dependency graph, lookup resolution and
//! update propagation

pub mod graph;
pub mod propagation;
pub mod registry;
pub mod resolver;
pub mod sheet;
pub mod store;
pub mod validator;

pub use graph::DependencyGraph;
pub use registry::{IdGenerator, SheetRegistry, UuidGenerator};
pub use sheet::{Sheet, WriteReport};
pub use store::{CellSource, CellStore};
