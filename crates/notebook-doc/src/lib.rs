//! # notebook-doc
//!
//! An immutable in-memory model of Jupyter v4 notebooks, and the conversion to
//! and from the on-disk `.ipynb` JSON format.
//!
//! ## What it does
//!
//! - **Notebook**: cells kept as an ordered list of [`CellId`]s plus an id → cell
//!   map, edited only by producing new values that share untouched cells
//! - **Cells and outputs**: closed enums for the three cell kinds and the four
//!   output kinds; anything else is rejected when parsing
//! - **Media bundles**: text payloads are joined from their on-disk line
//!   fragments and re-split on write, JSON payloads and unknown shapes pass
//!   through as-is
//! - **Version gate**: cell ids are read from and written to disk only for
//!   nbformat 4.5 and later
//!
//! ## Example
//!
//! ```rust
//! use notebook_doc::{parse_notebook, serialize_notebook, CellId};
//!
//! let json = r##"{
//!  "cells": [
//!   {"cell_type": "markdown", "id": "intro", "metadata": {}, "source": ["# Hello"]}
//!  ],
//!  "metadata": {},
//!  "nbformat": 4,
//!  "nbformat_minor": 5
//! }"##;
//!
//! let notebook = parse_notebook(json)?;
//! assert_eq!(notebook.cell_order(), &[CellId::new("intro")]);
//!
//! let text = serialize_notebook(&notebook)?;
//! assert!(text.contains("\"id\": \"intro\""));
//! # Ok::<(), notebook_doc::NotebookError>(())
//! ```

pub mod cell;
pub mod config;
pub mod convert;
pub mod error;
pub mod id;
pub mod json;
pub mod media;
pub mod notebook;
pub mod output;

use serde::Serialize as _;

pub use cell::{cell_types, Cell, CellType, CodeCell, MarkdownCell, RawCell};
pub use config::SerializeOptions;
pub use convert::{read_notebook, read_notebook_with, write_notebook};
pub use error::{NotebookError, Result};
pub use id::{CellId, CellIdGenerator, SequentialCellIds, UuidCellIds};
pub use json::JsonMap;
pub use media::{demultiline, is_json_mimetype, remultiline, MediaBundle, MediaValue, MultilineText};
pub use notebook::{Notebook, NotebookVersion};
pub use output::{output_types, DisplayData, ErrorOutput, ExecuteResult, Output};

/// Parse `.ipynb` text, generating any needed cell ids with random UUIDs.
pub fn parse_notebook(json: &str) -> Result<Notebook> {
    parse_notebook_with(json, &UuidCellIds)
}

pub fn parse_notebook_with(json: &str, ids: &dyn CellIdGenerator) -> Result<Notebook> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    read_notebook_with(&value, ids)
}

/// Serialize to `.ipynb` text the way the reference Python writer does.
pub fn serialize_notebook(notebook: &Notebook) -> Result<String> {
    serialize_notebook_with(notebook, &SerializeOptions::default())
}

pub fn serialize_notebook_with(notebook: &Notebook, options: &SerializeOptions) -> Result<String> {
    let value = write_notebook(notebook)?;

    let indent = " ".repeat(options.indent);
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    if options.trailing_newline {
        buf.push(b'\n');
    }

    String::from_utf8(buf)
        .map_err(|e| NotebookError::InvalidFormat(format!("serialized notebook is not UTF-8: {}", e)))
}
