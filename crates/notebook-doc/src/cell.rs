//! Code, markdown and raw cells.
//!
//! Cells are plain values. Constructors fill in defaults and a fresh id, and
//! the `with_*` methods consume and return the cell, so an edited cell is
//! always a new value.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{NotebookError, Result};
use crate::id::{CellId, CellIdGenerator};
use crate::json::{execution_count_field, execution_count_value, json_kind, object_field, JsonMap};
use crate::media::{demultiline, split_lines, MediaBundle, MultilineText};
use crate::output::Output;

/// `cell_type` tags matching nbformat
pub mod cell_types {
    pub const CODE: &str = "code";
    pub const MARKDOWN: &str = "markdown";
    pub const RAW: &str = "raw";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Code,
    Markdown,
    Raw,
}

impl CellType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellType::Code => cell_types::CODE,
            CellType::Markdown => cell_types::MARKDOWN,
            CellType::Raw => cell_types::RAW,
        }
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CellType {
    type Err = NotebookError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            cell_types::CODE => Ok(CellType::Code),
            cell_types::MARKDOWN => Ok(CellType::Markdown),
            cell_types::RAW => Ok(CellType::Raw),
            other => Err(NotebookError::UnknownCellType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeCell {
    pub id: CellId,
    pub source: String,
    pub metadata: JsonMap,
    /// `None` until the cell has been executed.
    pub execution_count: Option<i64>,
    pub outputs: Vec<Output>,
}

impl CodeCell {
    /// An empty, unexecuted code cell with a freshly generated id.
    pub fn new(ids: &dyn CellIdGenerator) -> Self {
        Self::with_id(ids.next_id())
    }

    pub fn with_id(id: CellId) -> Self {
        Self {
            id,
            source: String::new(),
            metadata: JsonMap::new(),
            execution_count: None,
            outputs: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_execution_count(mut self, execution_count: Option<i64>) -> Self {
        self.execution_count = execution_count;
        self
    }

    pub fn with_outputs(mut self, outputs: impl IntoIterator<Item = Output>) -> Self {
        self.outputs = outputs.into_iter().collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkdownCell {
    pub id: CellId,
    pub source: String,
    pub metadata: JsonMap,
    /// Filename → media bundle. `None` when the cell has no `attachments` key.
    pub attachments: Option<BTreeMap<String, MediaBundle>>,
}

impl MarkdownCell {
    pub fn new(ids: &dyn CellIdGenerator) -> Self {
        Self::with_id(ids.next_id())
    }

    pub fn with_id(id: CellId) -> Self {
        Self {
            id,
            source: String::new(),
            metadata: JsonMap::new(),
            attachments: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_attachment(mut self, filename: impl Into<String>, bundle: MediaBundle) -> Self {
        self.attachments
            .get_or_insert_with(BTreeMap::new)
            .insert(filename.into(), bundle);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub id: CellId,
    pub source: String,
    pub metadata: JsonMap,
}

impl RawCell {
    pub fn new(ids: &dyn CellIdGenerator) -> Self {
        Self::with_id(ids.next_id())
    }

    pub fn with_id(id: CellId) -> Self {
        Self {
            id,
            source: String::new(),
            metadata: JsonMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Code(CodeCell),
    Markdown(MarkdownCell),
    Raw(RawCell),
}

impl Cell {
    pub fn id(&self) -> &CellId {
        match self {
            Cell::Code(cell) => &cell.id,
            Cell::Markdown(cell) => &cell.id,
            Cell::Raw(cell) => &cell.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Cell::Code(cell) => &cell.source,
            Cell::Markdown(cell) => &cell.source,
            Cell::Raw(cell) => &cell.source,
        }
    }

    pub fn metadata(&self) -> &JsonMap {
        match self {
            Cell::Code(cell) => &cell.metadata,
            Cell::Markdown(cell) => &cell.metadata,
            Cell::Raw(cell) => &cell.metadata,
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            Cell::Code(_) => CellType::Code,
            Cell::Markdown(_) => CellType::Markdown,
            Cell::Raw(_) => CellType::Raw,
        }
    }

    pub fn with_id(self, id: CellId) -> Self {
        match self {
            Cell::Code(cell) => Cell::Code(CodeCell { id, ..cell }),
            Cell::Markdown(cell) => Cell::Markdown(MarkdownCell { id, ..cell }),
            Cell::Raw(cell) => Cell::Raw(RawCell { id, ..cell }),
        }
    }

    /// Parse an on-disk cell object, giving it `id`.
    ///
    /// Which id a cell gets is the caller's decision; any `id` key in `value`
    /// is ignored here.
    pub fn from_json(value: &Value, id: CellId) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            NotebookError::InvalidFormat(format!("cell must be an object, found {}", json_kind(value)))
        })?;
        let cell_type: CellType = obj
            .get("cell_type")
            .and_then(Value::as_str)
            .ok_or(NotebookError::MissingField("cell_type"))?
            .parse()?;

        let source = match obj.get("source") {
            None | Some(Value::Null) => String::new(),
            Some(source) => demultiline(&MultilineText::deserialize(source)?),
        };
        let metadata = object_field(obj, "metadata")?;

        match cell_type {
            CellType::Code => Ok(Cell::Code(CodeCell {
                id,
                source,
                metadata,
                execution_count: execution_count_field(obj)?,
                outputs: outputs_from_json(obj)?,
            })),
            CellType::Markdown => Ok(Cell::Markdown(MarkdownCell {
                id,
                source,
                metadata,
                attachments: attachments_from_json(obj)?,
            })),
            CellType::Raw => Ok(Cell::Raw(RawCell {
                id,
                source,
                metadata,
            })),
        }
    }

    /// The on-disk object for this cell. `id` is emitted only when `include_id`.
    pub fn to_json(&self, include_id: bool) -> Value {
        let mut obj = JsonMap::new();
        obj.insert("cell_type".into(), self.cell_type().as_str().into());
        if include_id {
            obj.insert("id".into(), self.id().as_str().into());
        }
        obj.insert("metadata".into(), Value::Object(self.metadata().clone()));
        obj.insert(
            "source".into(),
            Value::Array(split_lines(self.source()).into_iter().map(Value::String).collect()),
        );

        match self {
            Cell::Code(cell) => {
                obj.insert(
                    "execution_count".into(),
                    execution_count_value(cell.execution_count),
                );
                obj.insert(
                    "outputs".into(),
                    Value::Array(cell.outputs.iter().map(Output::to_json).collect()),
                );
            }
            Cell::Markdown(cell) => {
                if let Some(attachments) = &cell.attachments {
                    let attachments: JsonMap = attachments
                        .iter()
                        .map(|(name, bundle)| (name.clone(), Value::Object(bundle.to_on_disk())))
                        .collect();
                    obj.insert("attachments".into(), Value::Object(attachments));
                }
            }
            Cell::Raw(_) => {}
        }

        Value::Object(obj)
    }
}

impl From<CodeCell> for Cell {
    fn from(cell: CodeCell) -> Self {
        Cell::Code(cell)
    }
}

impl From<MarkdownCell> for Cell {
    fn from(cell: MarkdownCell) -> Self {
        Cell::Markdown(cell)
    }
}

impl From<RawCell> for Cell {
    fn from(cell: RawCell) -> Self {
        Cell::Raw(cell)
    }
}

fn outputs_from_json(obj: &JsonMap) -> Result<Vec<Output>> {
    match obj.get("outputs") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(outputs)) => outputs.iter().map(Output::from_json).collect(),
        Some(other) => Err(NotebookError::InvalidFormat(format!(
            "`outputs` must be an array, found {}",
            json_kind(other)
        ))),
    }
}

fn attachments_from_json(obj: &JsonMap) -> Result<Option<BTreeMap<String, MediaBundle>>> {
    let attachments = match obj.get("attachments") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Object(attachments)) => attachments,
        Some(other) => {
            return Err(NotebookError::InvalidFormat(format!(
                "`attachments` must be an object, found {}",
                json_kind(other)
            )))
        }
    };

    attachments
        .iter()
        .map(|(filename, bundle)| match bundle {
            Value::Object(bundle) => Ok((filename.clone(), MediaBundle::from_on_disk(bundle))),
            other => Err(NotebookError::InvalidFormat(format!(
                "attachment `{}` must be an object, found {}",
                filename,
                json_kind(other)
            ))),
        })
        .collect::<Result<BTreeMap<_, _>>>()
        .map(Some)
}
