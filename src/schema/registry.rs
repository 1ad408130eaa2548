//! The authoritative map from table name to [`Table`].

use indexmap::IndexMap;

use crate::config::{Config, OutputMode};
use crate::errors::Error;

use super::table::{Column, Table};

/// Tracks every table referenced by the dump, in first-reference order.
///
/// The registry also enforces the output policy: with
/// [`OutputMode::Single`] only one table may ever be written, and with a
/// table filter every other table is discarded before it is written.
#[derive(Debug, Clone)]
pub struct Registry {
    tables: IndexMap<String, Table>,
    mode: OutputMode,
    filter: Option<String>,
    writer: Option<String>,
}

impl Registry {
    /// Create an empty registry applying the policy of `config`.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            tables: IndexMap::new(),
            mode: config.mode(),
            filter: config.table_filter().map(str::to_owned),
            writer: None,
        }
    }

    /// Record the columns declared for `name`, creating the table if needed.
    pub fn declare_schema(&mut self, name: &str, columns: Option<Vec<Column>>) -> &mut Table {
        let table = self.resolve(name);
        table.declare(columns);
        table
    }

    /// Look up `name`, creating the table on first reference.
    pub fn resolve(&mut self, name: &str) -> &mut Table {
        // Avoid allocating the key on the common lookup path.
        if let Some(index) = self.tables.get_index_of(name) {
            return &mut self.tables[index];
        }
        self.tables
            .entry(name.to_owned())
            .or_insert_with(|| Table::new(name))
    }

    /// Look up `name` for writing rows of the `INSERT` at byte `position`.
    ///
    /// Returns `Ok(None)` when the table filter discards the table; no entry
    /// is created in that case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TableConflict`] when single-table output is active
    /// and another table was already written.
    pub fn resolve_for_write(
        &mut self,
        name: &str,
        position: u64,
    ) -> Result<Option<&mut Table>, Error> {
        if self.filter.as_deref().is_some_and(|only| only != name) {
            return Ok(None);
        }
        if self.mode == OutputMode::Single {
            match &self.writer {
                Some(first) if first != name => {
                    return Err(Error::TableConflict {
                        first: first.clone(),
                        second: name.to_owned(),
                        position,
                    });
                }
                Some(_) => {}
                None => self.writer = Some(name.to_owned()),
            }
        }
        Ok(Some(self.resolve(name)))
    }

    /// Look up `name` without creating it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    /// All tables, in first-reference order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    /// All tables mutably, in first-reference order.
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.tables.values_mut()
    }

    /// Number of tables referenced so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether no table was referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// `(table, rows written)` pairs in first-reference order.
    #[must_use]
    pub fn summary(&self) -> Vec<(String, u64)> {
        self.tables
            .values()
            .map(|table| (table.name().to_owned(), table.rows()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableState;

    #[test]
    fn test_resolve_creates_once() {
        let mut registry = Registry::new(&Config::default());
        registry.resolve("page").record_rows(1);
        registry.resolve("page").record_rows(1);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("page").map(Table::rows), Some(2));
    }

    #[test]
    fn test_declare_schema_then_resolve() {
        let mut registry = Registry::new(&Config::default());
        registry.declare_schema("page", Some(vec![Column::new("id", 0)]));
        let table = registry.resolve("page");
        assert_eq!(table.state(), TableState::SchemaKnown);
        assert_eq!(table.columns().map(<[Column]>::len), Some(1));
    }

    #[test]
    fn test_single_mode_rejects_second_written_table() {
        let mut registry = Registry::new(&Config::default());
        assert!(registry.resolve_for_write("page", 0).unwrap().is_some());
        assert!(registry.resolve_for_write("page", 0).unwrap().is_some());

        let err = registry.resolve_for_write("user", 64).unwrap_err();
        match err {
            Error::TableConflict {
                first,
                second,
                position,
            } => {
                assert_eq!(first, "page");
                assert_eq!(second, "user");
                assert_eq!(position, 64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_single_mode_allows_declaring_many_tables() {
        let mut registry = Registry::new(&Config::default());
        registry.declare_schema("page", None);
        registry.declare_schema("user", None);
        assert!(registry.resolve_for_write("user", 0).unwrap().is_some());
    }

    #[test]
    fn test_multi_mode_allows_many_written_tables() {
        let mut registry = Registry::new(&Config::default().with_mode(OutputMode::Multi));
        assert!(registry.resolve_for_write("page", 0).unwrap().is_some());
        assert!(registry.resolve_for_write("user", 0).unwrap().is_some());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_filter_discards_other_tables() {
        let mut registry = Registry::new(&Config::default().with_table_filter("page"));
        assert!(registry.resolve_for_write("user", 0).unwrap().is_none());
        assert!(registry.resolve_for_write("page", 0).unwrap().is_some());
        // Filtered tables do not claim the single output either.
        assert!(registry.resolve_for_write("other", 0).unwrap().is_none());
        assert!(registry.get("user").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_summary_in_first_reference_order() {
        let mut registry = Registry::new(&Config::default().with_mode(OutputMode::Multi));
        registry.resolve("b").record_rows(2);
        registry.resolve("a").record_rows(1);
        assert_eq!(
            registry.summary(),
            vec![("b".to_owned(), 2), ("a".to_owned(), 1)]
        );
    }
}
