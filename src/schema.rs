//! Table schemas and the registry that tracks every table seen in a dump.
mod registry;
mod table;

pub use registry::Registry;
pub use table::{Column, Table, TableState};
