//! The in-memory notebook document.
//!
//! A [`Notebook`] is never mutated in place. Every edit returns a new value,
//! so older versions stay valid for anyone still holding them.
//!
//! Sharing is per cell, not per index. Each edit copies whole indexes, O(n)
//! in the number of cells: inserting or removing copies both the id order and
//! the id → cell map, moving copies the order, and replacing copies the map.
//! Only the cells themselves (behind `Arc`) are shared with the notebook the
//! edit was derived from. [`Notebook::with_metadata`] and
//! [`Notebook::with_version`] copy neither index.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cell::Cell;
use crate::error::{NotebookError, Result};
use crate::id::CellId;
use crate::json::JsonMap;

/// `(nbformat, nbformat_minor)`, ordered major first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotebookVersion {
    pub major: i64,
    pub minor: i64,
}

impl NotebookVersion {
    pub const CURRENT: NotebookVersion = NotebookVersion::new(4, 5);

    /// First version whose schema has a per-cell `id`.
    pub const CELL_IDS: NotebookVersion = NotebookVersion::new(4, 5);

    pub const fn new(major: i64, minor: i64) -> Self {
        Self { major, minor }
    }

    pub fn supports_cell_ids(&self) -> bool {
        *self >= Self::CELL_IDS
    }
}

impl Default for NotebookVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for NotebookVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    // Invariant: `cell_order` holds exactly the keys of `cell_map`, each once.
    cell_order: Arc<Vec<CellId>>,
    cell_map: Arc<HashMap<CellId, Arc<Cell>>>,
    metadata: Arc<JsonMap>,
    version: NotebookVersion,
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new(NotebookVersion::CURRENT)
    }
}

impl Notebook {
    /// An empty notebook with no metadata.
    pub fn new(version: NotebookVersion) -> Self {
        Self {
            cell_order: Arc::default(),
            cell_map: Arc::default(),
            metadata: Arc::default(),
            version,
        }
    }

    /// Build a notebook holding `cells` in the given order.
    pub fn from_cells(
        version: NotebookVersion,
        cells: impl IntoIterator<Item = Cell>,
    ) -> Result<Self> {
        let mut cell_order = Vec::new();
        let mut cell_map = HashMap::new();
        for cell in cells {
            let id = cell.id().clone();
            if cell_map.contains_key(&id) {
                return Err(NotebookError::DuplicateCellId(id.to_string()));
            }
            cell_order.push(id.clone());
            cell_map.insert(id, Arc::new(cell));
        }

        Ok(Self {
            cell_order: Arc::new(cell_order),
            cell_map: Arc::new(cell_map),
            metadata: Arc::default(),
            version,
        })
    }

    pub fn version(&self) -> NotebookVersion {
        self.version
    }

    pub fn metadata(&self) -> &JsonMap {
        &self.metadata
    }

    pub fn cell_order(&self) -> &[CellId] {
        &self.cell_order
    }

    pub fn cell(&self, id: &CellId) -> Option<&Arc<Cell>> {
        self.cell_map.get(id)
    }

    /// Cells in display order.
    pub fn cells(&self) -> impl Iterator<Item = &Arc<Cell>> + '_ {
        self.cell_order.iter().filter_map(|id| self.cell_map.get(id))
    }

    pub fn len(&self) -> usize {
        self.cell_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_order.is_empty()
    }

    pub fn contains(&self, id: &CellId) -> bool {
        self.cell_map.contains_key(id)
    }

    pub fn position(&self, id: &CellId) -> Option<usize> {
        self.cell_order.iter().position(|candidate| candidate == id)
    }

    pub fn with_metadata(&self, metadata: JsonMap) -> Self {
        Self {
            metadata: Arc::new(metadata),
            ..self.clone()
        }
    }

    pub fn with_version(&self, version: NotebookVersion) -> Self {
        Self {
            version,
            ..self.clone()
        }
    }

    pub fn append_cell(&self, cell: Cell) -> Result<Self> {
        self.insert_cell_at(self.len(), cell)
    }

    pub fn insert_cell_at(&self, index: usize, cell: Cell) -> Result<Self> {
        if index > self.len() {
            return Err(NotebookError::IndexOutOfBounds {
                index,
                len: self.len(),
            });
        }
        let id = cell.id().clone();
        if self.contains(&id) {
            return Err(NotebookError::DuplicateCellId(id.to_string()));
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.cell_order).insert(index, id.clone());
        Arc::make_mut(&mut next.cell_map).insert(id, Arc::new(cell));
        Ok(next)
    }

    pub fn insert_cell_after(&self, after: &CellId, cell: Cell) -> Result<Self> {
        let index = self
            .position(after)
            .ok_or_else(|| NotebookError::CellNotFound(after.to_string()))?;
        self.insert_cell_at(index + 1, cell)
    }

    pub fn remove_cell(&self, id: &CellId) -> Result<Self> {
        let index = self
            .position(id)
            .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?;

        let mut next = self.clone();
        Arc::make_mut(&mut next.cell_order).remove(index);
        Arc::make_mut(&mut next.cell_map).remove(id);
        Ok(next)
    }

    /// Swap in a new value for the cell with the same id. Its position is kept.
    pub fn replace_cell(&self, cell: Cell) -> Result<Self> {
        let id = cell.id().clone();
        if !self.contains(&id) {
            return Err(NotebookError::CellNotFound(id.to_string()));
        }

        let mut next = self.clone();
        Arc::make_mut(&mut next.cell_map).insert(id, Arc::new(cell));
        Ok(next)
    }

    /// Move a cell so that it ends up at `to_index` in the new order.
    pub fn move_cell(&self, id: &CellId, to_index: usize) -> Result<Self> {
        let from_index = self
            .position(id)
            .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))?;
        if to_index >= self.len() {
            return Err(NotebookError::IndexOutOfBounds {
                index: to_index,
                len: self.len(),
            });
        }

        let mut next = self.clone();
        let order = Arc::make_mut(&mut next.cell_order);
        let moved = order.remove(from_index);
        order.insert(to_index, moved);
        Ok(next)
    }
}
