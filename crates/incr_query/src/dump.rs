//! Diagnostic snapshots of a database's storage.
//!
//! Dumps are meant for debugging and test assertions. The rendered text is not
//! a stable format.

use crate::revision::Revision;
use core::fmt;

/// Whether an entry was assigned or computed.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EntryKind {
    Input,
    Derived,
}

/// One stored entry.
#[derive(Clone, Debug)]
pub struct EntryDump {
    /// The argument, rendered with `Debug`.
    pub key: String,
    /// The stored value, rendered with `Debug`.
    pub value: String,
    pub kind: EntryKind,
    pub changed_at: Revision,
    /// `None` for inputs.
    pub verified_at: Option<Revision>,
    /// Dependencies rendered as `name(argument)`, empty for inputs.
    pub dependencies: Vec<String>,
}

/// All stored entries of one query definition.
#[derive(Clone, Debug)]
pub struct QueryDump {
    pub name: &'static str,
    pub entries: Vec<EntryDump>,
}

impl QueryDump {
    /// Find an entry by its rendered argument.
    pub fn entry(&self, key: &str) -> Option<&EntryDump> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

/// Snapshot of every query table, in the order queries were first used.
#[derive(Clone, Debug)]
pub struct DatabaseDump {
    pub revision: Revision,
    pub queries: Vec<QueryDump>,
}

impl DatabaseDump {
    /// Find a query's entries by name.
    pub fn query(&self, name: &str) -> Option<&QueryDump> {
        self.queries.iter().find(|query| query.name == name)
    }

    /// Find a single entry by query name and rendered argument.
    pub fn entry(&self, name: &str, key: &str) -> Option<&EntryDump> {
        self.query(name)?.entry(key)
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.queries.iter().map(|query| query.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for DatabaseDump {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "current revision = {}", self.revision)?;
        for query in &self.queries {
            writeln!(formatter, "query {}", query.name)?;
            for entry in &query.entries {
                match entry.kind {
                    EntryKind::Input => writeln!(
                        formatter,
                        "  {} = {} [input changed={}]",
                        entry.key, entry.value, entry.changed_at
                    )?,
                    EntryKind::Derived => {
                        let verified = entry
                            .verified_at
                            .map_or_else(|| "-".to_owned(), |revision| revision.to_string());
                        writeln!(
                            formatter,
                            "  {} = {} [derived changed={} verified={} deps=[{}]]",
                            entry.key,
                            entry.value,
                            entry.changed_at,
                            verified,
                            entry.dependencies.join(", ")
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Entry counts across all tables.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct DatabaseStats {
    /// Query definitions that have a table.
    pub queries: usize,
    pub inputs: usize,
    pub derived: usize,
    pub revision: Revision,
}
