//! Named-variable tables with parent inheritance.
//!
//! A [`VariableTable`] maps case-insensitive variable names to raw template
//! source strings. Tables form an inheritance chain: when a name is absent,
//! lookup continues in the parent table. Parents are referenced by
//! [`TableId`] through an owning [`VariableRegistry`], never by pointer, and
//! the registry refuses links that would create a cycle.
//!
//! The template engine only sees the [`VariableLookup`] trait.

use std::collections::HashMap;

use crate::error::HookhubError;

/// Keys that configure a table itself and are never exposed as variables.
pub const RESERVED_KEYS: [&str; 3] = ["destination", "template", "parent"];

/// Name of the section every other section inherits from when it names no parent.
pub const DEFAULT_SECTION: &str = "default";

/// The lookup interface the template engine consumes for `config.*` references.
pub trait VariableLookup {
    /// Returns the raw template source bound to `name`, if any.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Case-insensitive lookup over a flat map, mostly useful in tests and tools.
impl VariableLookup for HashMap<String, String> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name)
            .or_else(|| {
                self.iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .cloned()
    }
}

/// Identifies a table inside a [`VariableRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(usize);

/// One section of variables, e.g. the configuration for a single event type.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    name: String,
    variables: HashMap<String, String>,
    destination: Option<String>,
    template: Option<String>,
    parent: Option<TableId>,
}

impl VariableTable {
    /// Builds a table from raw `key = value` entries.
    ///
    /// Keys are lower-cased. Reserved keys are split out: `destination` and
    /// `template` become table properties, `parent` is left to the registry.
    pub fn new<K, V>(name: impl Into<String>, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self {
            name: name.into(),
            ..Self::default()
        };

        for (key, value) in entries {
            let key = key.as_ref().to_lowercase();
            let value = value.into();
            match key.as_str() {
                "destination" => table.destination = Some(value).filter(|v| !v.is_empty()),
                "template" => table.template = Some(value).filter(|v| !v.is_empty()),
                "parent" => {}
                _ => {
                    table.variables.insert(key, value);
                }
            }
        }

        table
    }

    /// The section name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The parent table, if linked.
    pub const fn parent(&self) -> Option<TableId> {
        self.parent
    }

    /// Number of variables defined directly on this table.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Returns `true` if the table defines no variables of its own.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Looks up a variable on this table only, ignoring parents.
    pub fn get_own(&self, name: &str) -> Option<&str> {
        self.variables.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Owns a set of [`VariableTable`]s and resolves lookups along their parent chains.
///
/// # Examples
///
/// ```
/// use hookhub_core::variables::{VariableLookup, VariableRegistry};
///
/// let registry = VariableRegistry::from_sections(vec![
///     ("default".to_string(), vec![("greeting".to_string(), "hello".to_string())]),
///     ("push".to_string(), vec![("branch".to_string(), "${data.ref}".to_string())]),
/// ])
/// .unwrap();
///
/// let push = registry.table_for("push").unwrap();
/// let scoped = registry.scoped(push);
/// assert_eq!(scoped.lookup("GREETING").as_deref(), Some("hello"));
/// assert_eq!(scoped.lookup("branch").as_deref(), Some("${data.ref}"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    tables: Vec<VariableTable>,
    names: HashMap<String, TableId>,
}

impl VariableRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from named sections and links their parents.
    ///
    /// A section's parent is the section named by its `parent` entry when that
    /// section exists; otherwise the `default` section (unless it is the
    /// section itself); otherwise none.
    pub fn from_sections<I, E>(sections: I) -> Result<Self, HookhubError>
    where
        I: IntoIterator<Item = (String, E)>,
        E: IntoIterator<Item = (String, String)>,
    {
        let mut registry = Self::new();
        let mut declared_parents = Vec::new();

        for (name, entries) in sections {
            let entries: Vec<(String, String)> = entries.into_iter().collect();
            let parent = entries
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("parent"))
                .map(|(_, v)| v.clone());
            let id = registry.insert(VariableTable::new(name, entries))?;
            declared_parents.push((id, parent));
        }

        let default_id = registry.id_of(DEFAULT_SECTION);
        for (id, declared) in declared_parents {
            let parent = declared
                .and_then(|name| registry.id_of(&name))
                .or(default_id.filter(|&d| d != id));
            if let Some(parent) = parent {
                registry.set_parent(id, parent)?;
            }
        }

        Ok(registry)
    }

    /// Adds a table. Section names must be unique.
    pub fn insert(&mut self, table: VariableTable) -> Result<TableId, HookhubError> {
        if self.names.contains_key(table.name()) {
            return Err(HookhubError::VariableTableError(format!(
                "section '{}' is defined more than once",
                table.name()
            )));
        }
        let id = TableId(self.tables.len());
        self.names.insert(table.name().to_string(), id);
        self.tables.push(table);
        Ok(id)
    }

    /// Links `child` to inherit from `parent`, refusing links that form a cycle.
    pub fn set_parent(&mut self, child: TableId, parent: TableId) -> Result<(), HookhubError> {
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return Err(HookhubError::VariableTableError(format!(
                    "making '{}' the parent of '{}' would create an inheritance cycle",
                    self.get(parent).name(),
                    self.get(child).name()
                )));
            }
            cursor = self.get(id).parent;
        }
        self.tables[child.0].parent = Some(parent);
        Ok(())
    }

    /// Returns the id of the section with the given name.
    pub fn id_of(&self, name: &str) -> Option<TableId> {
        self.names.get(name).copied()
    }

    /// Returns the table for `id`.
    ///
    /// Ids are only minted by this registry, so indexing cannot fail for them.
    pub fn get(&self, id: TableId) -> &VariableTable {
        &self.tables[id.0]
    }

    /// Returns the table configured for `event_key`, falling back to `default`.
    pub fn table_for(&self, event_key: &str) -> Option<TableId> {
        self.id_of(event_key).or_else(|| self.id_of(DEFAULT_SECTION))
    }

    /// Resolves `name` starting at `id` and walking up the parent chain.
    pub fn get_variable(&self, id: TableId, name: &str) -> Option<&str> {
        self.find_inherited(id, |table| table.get_own(name))
    }

    /// The inherited `destination` property for `id`.
    pub fn get_destination(&self, id: TableId) -> Option<&str> {
        self.find_inherited(id, |table| table.destination.as_deref())
    }

    /// The inherited `template` property for `id`.
    pub fn get_template(&self, id: TableId) -> Option<&str> {
        self.find_inherited(id, |table| table.template.as_deref())
    }

    /// A [`VariableLookup`] view rooted at `id`.
    pub const fn scoped(&self, id: TableId) -> ScopedVariables<'_> {
        ScopedVariables { registry: self, id }
    }

    /// Number of tables in the registry.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` if the registry holds no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn find_inherited<'a, T: ?Sized>(
        &'a self,
        id: TableId,
        pick: impl Fn(&'a VariableTable) -> Option<&'a T>,
    ) -> Option<&'a T> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let table = self.get(current);
            if let Some(found) = pick(table) {
                return Some(found);
            }
            cursor = table.parent;
        }
        None
    }
}

/// A registry viewed from one table; the handle passed to the template engine.
#[derive(Debug, Clone, Copy)]
pub struct ScopedVariables<'a> {
    registry: &'a VariableRegistry,
    id: TableId,
}

impl ScopedVariables<'_> {
    /// The table this view starts from.
    pub const fn table(&self) -> TableId {
        self.id
    }
}

impl VariableLookup for ScopedVariables<'_> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.registry.get_variable(self.id, name).map(str::to_string)
    }
}
