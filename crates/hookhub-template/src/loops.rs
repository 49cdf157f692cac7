//! Loop symbol table.
//!
//! A [`LoopStack`] tracks every `for` loop enclosing the item being
//! evaluated. Each entry maps an index name to the ordered domain of keys it
//! ranges over. The Cartesian product of all live domains is enumerated by a
//! single *combination index*: a mixed-radix number whose most significant
//! digit belongs to the outermost loop.

use std::collections::HashMap;
use std::fmt;

use hookhub_core::error::TemplateError;

use crate::value::Value;

/// One key of a loop domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LoopKey {
    /// A position in a sequence.
    Index(usize),
    /// A key of a map.
    Key(String),
}

impl LoopKey {
    /// The value a `key.X` reference evaluates to.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Index(i) => Value::from(*i),
            Self::Key(k) => Value::from(k.as_str()),
        }
    }
}

impl fmt::Display for LoopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

/// The loop bindings of one combination: index name to current key.
pub type Bindings = HashMap<String, LoopKey>;

/// Returns the domain a loop over `value` ranges over.
///
/// Sequences range over `0..len`, maps over their keys in order. Any other
/// kind of value cannot be iterated.
pub fn domain_of(value: &Value) -> Option<Vec<LoopKey>> {
    match value {
        Value::Sequence(items) => Some((0..items.len()).map(LoopKey::Index).collect()),
        Value::Map(map) => Some(map.keys().cloned().map(LoopKey::Key).collect()),
        _ => None,
    }
}

#[derive(Debug, Clone)]
struct LoopEntry {
    name: String,
    domain: Vec<LoopKey>,
}

/// The stack of active loops.
///
/// # Examples
///
/// ```
/// use hookhub_template::loops::{LoopKey, LoopStack};
///
/// let mut stack = LoopStack::new();
/// stack.push("i", vec![LoopKey::Index(0), LoopKey::Index(1)]).unwrap();
/// stack.push("j", vec![LoopKey::Index(0), LoopKey::Index(1), LoopKey::Index(2)]).unwrap();
/// assert_eq!(stack.combination_count(), 6);
///
/// let bindings = stack.bindings_for(4).unwrap();
/// assert_eq!(bindings["i"], LoopKey::Index(1));
/// assert_eq!(bindings["j"], LoopKey::Index(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoopStack {
    entries: Vec<LoopEntry>,
}

impl LoopStack {
    /// Creates an empty stack (one combination, no bindings).
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns `true` if a loop with this index name is active.
    pub fn is_active(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Number of active loops.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Enters a loop.
    pub fn push(&mut self, name: impl Into<String>, domain: Vec<LoopKey>) -> Result<(), TemplateError> {
        let name = name.into();
        if self.is_active(&name) {
            return Err(TemplateError::LoopError(format!(
                "cannot add index symbol \"{name}\", it already exists"
            )));
        }
        let sizes = self.entries.iter().map(|e| e.domain.len());
        if checked_product(sizes.chain([domain.len()])).is_none() {
            return Err(TemplateError::LoopError(format!(
                "cannot add index symbol \"{name}\", too many for-loop combinations"
            )));
        }
        tracing::debug!(index = %name, size = domain.len(), "entering loop");
        self.entries.push(LoopEntry { name, domain });
        Ok(())
    }

    /// Leaves the innermost loop, which must be `name`.
    pub fn pop(&mut self, name: &str) -> Result<(), TemplateError> {
        match self.entries.last() {
            Some(entry) if entry.name == name => {
                self.entries.pop();
                tracing::debug!(index = %name, "leaving loop");
                Ok(())
            }
            Some(_) if self.is_active(name) => Err(TemplateError::LoopError(format!(
                "cannot remove index symbol \"{name}\", it is not the innermost loop"
            ))),
            _ => Err(TemplateError::LoopError(format!(
                "cannot remove index symbol \"{name}\", it doesn't exist"
            ))),
        }
    }

    /// The number of live combinations: the product of all domain sizes.
    ///
    /// [`push`](Self::push) refuses a domain that would overflow this product.
    pub fn combination_count(&self) -> usize {
        self.entries.iter().map(|e| e.domain.len()).product()
    }

    /// Size of the innermost loop's domain, or 1 when no loop is active.
    pub fn innermost_size(&self) -> usize {
        self.entries.last().map_or(1, |e| e.domain.len())
    }

    /// Returns the binding of every active loop for one combination index.
    pub fn bindings_for(&self, index: usize) -> Result<Bindings, TemplateError> {
        let count = self.combination_count();
        if index >= count {
            return Err(TemplateError::LoopError(format!(
                "invalid for-loop combination index: {index} (of {count})"
            )));
        }

        let mut bindings = Bindings::with_capacity(self.entries.len());
        let mut rest = index;
        for entry in self.entries.iter().rev() {
            let radix = entry.domain.len();
            bindings.insert(entry.name.clone(), entry.domain[rest % radix].clone());
            rest /= radix;
        }
        Ok(bindings)
    }
}

/// Product of `sizes`, or `None` if it overflows.
fn checked_product(sizes: impl IntoIterator<Item = usize>) -> Option<usize> {
    sizes.into_iter().try_fold(1_usize, usize::checked_mul)
}
