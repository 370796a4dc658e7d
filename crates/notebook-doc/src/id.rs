//! Cell identifiers and the generators that mint them.
//!
//! Generation is an injected capability: everything that needs a fresh id
//! takes a `&dyn CellIdGenerator`, so tests can pin ids with
//! [`SequentialCellIds`] while real callers use [`UuidCellIds`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Opaque identity of a cell within a notebook.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CellId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for CellId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CellId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<uuid::Uuid> for CellId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

/// Source of fresh cell identifiers.
///
/// The only contract is uniqueness: no two calls, across the process or across
/// files, should return the same id.
pub trait CellIdGenerator: Send + Sync {
    fn next_id(&self) -> CellId;
}

/// Random v4 UUIDs. The default generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidCellIds;

impl CellIdGenerator for UuidCellIds {
    fn next_id(&self) -> CellId {
        uuid::Uuid::new_v4().into()
    }
}

/// Deterministic ids of the form `{prefix}{n}`, counting up from zero.
#[derive(Debug)]
pub struct SequentialCellIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialCellIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialCellIds {
    fn default() -> Self {
        Self::new("cell-")
    }
}

impl CellIdGenerator for SequentialCellIds {
    fn next_id(&self) -> CellId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        CellId(format!("{}{}", self.prefix, n))
    }
}
