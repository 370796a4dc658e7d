//! Conversion between on-disk notebook JSON and [`Notebook`].
//!
//! The only version-dependent rule is the cell id: from 4.5 on, ids are read
//! from and written to disk; before that they are generated on read and
//! dropped on write.

use log::{debug, trace};
use serde_json::{json, Value};

use crate::cell::Cell;
use crate::error::{NotebookError, Result};
use crate::id::{CellId, CellIdGenerator, UuidCellIds};
use crate::json::{json_kind, object_field};
use crate::notebook::{Notebook, NotebookVersion};

/// Read an on-disk notebook, minting any needed cell ids with random UUIDs.
pub fn read_notebook(value: &Value) -> Result<Notebook> {
    read_notebook_with(value, &UuidCellIds)
}

/// Read an on-disk notebook, taking fresh cell ids from `ids`.
///
/// Fails without producing a document if the top level is not an object
/// with a `cells` array and an integer `nbformat_minor`, if the major
/// version is not 4, or if any cell fails to parse.
pub fn read_notebook_with(value: &Value, ids: &dyn CellIdGenerator) -> Result<Notebook> {
    let obj = value.as_object().ok_or_else(|| {
        NotebookError::InvalidFormat(format!(
            "notebook must be an object, found {}",
            json_kind(value)
        ))
    })?;
    let cells = match obj.get("cells") {
        Some(Value::Array(cells)) => cells,
        Some(other) => {
            return Err(NotebookError::InvalidFormat(format!(
                "`cells` must be an array, found {}",
                json_kind(other)
            )))
        }
        None => {
            return Err(NotebookError::InvalidFormat(
                "notebook has no `cells` array".into(),
            ))
        }
    };

    let major = obj.get("nbformat").and_then(Value::as_i64).unwrap_or(0);
    if major != 4 {
        let minor = obj.get("nbformat_minor").and_then(Value::as_i64).unwrap_or(0);
        return Err(NotebookError::UnsupportedVersion(major, minor));
    }
    let minor = match obj.get("nbformat_minor") {
        Some(minor) => minor.as_i64().ok_or_else(|| {
            NotebookError::InvalidFormat(format!(
                "`nbformat_minor` must be an integer, found {}",
                json_kind(minor)
            ))
        })?,
        None => {
            return Err(NotebookError::InvalidFormat(
                "notebook has no `nbformat_minor`".into(),
            ))
        }
    };
    let version = NotebookVersion::new(major, minor);
    debug!(
        "[notebook-read] reading v{} notebook with {} cells",
        version,
        cells.len()
    );

    let parsed = cells
        .iter()
        .enumerate()
        .map(|(index, cell)| Cell::from_json(cell, cell_id_for(cell, index, version, ids)?))
        .collect::<Result<Vec<_>>>()?;

    let notebook = Notebook::from_cells(version, parsed)?;
    Ok(notebook.with_metadata(object_field(obj, "metadata")?))
}

fn cell_id_for(
    cell: &Value,
    index: usize,
    version: NotebookVersion,
    ids: &dyn CellIdGenerator,
) -> Result<CellId> {
    let on_disk = cell.get("id");
    match on_disk {
        Some(Value::String(id)) if version.supports_cell_ids() => Ok(CellId::from(id.as_str())),
        Some(other) if version.supports_cell_ids() => Err(NotebookError::InvalidFormat(format!(
            "`id` of cell {} must be a string, found {}",
            index,
            json_kind(other)
        ))),
        _ => {
            if on_disk.is_some() {
                debug!(
                    "[notebook-read] ignoring on-disk id of cell {} in a v{} notebook",
                    index, version
                );
            }
            let id = ids.next_id();
            trace!("[notebook-read] generated id {} for cell {}", id, index);
            Ok(id)
        }
    }
}

/// Produce the on-disk JSON for `notebook`.
///
/// Cells carry `id` only when the notebook's version is 4.5 or later.
pub fn write_notebook(notebook: &Notebook) -> Result<Value> {
    let version = notebook.version();
    let include_ids = version.supports_cell_ids();
    debug!(
        "[notebook-write] writing v{} notebook with {} cells",
        version,
        notebook.len()
    );
    if !include_ids && !notebook.is_empty() {
        debug!("[notebook-write] dropping cell ids, v{} has no id field", version);
    }

    let cells = notebook
        .cell_order()
        .iter()
        .map(|id| {
            notebook
                .cell(id)
                .map(|cell| cell.to_json(include_ids))
                .ok_or_else(|| NotebookError::CellNotFound(id.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(json!({
        "nbformat": version.major,
        "nbformat_minor": version.minor,
        "metadata": notebook.metadata(),
        "cells": cells,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CodeCell, MarkdownCell, RawCell};
    use crate::id::SequentialCellIds;
    use crate::media::{MediaBundle, MediaValue};
    use crate::json::JsonMap;
    use crate::output::{DisplayData, Output};

    fn single_cell_notebook(minor: i64, cell: Value) -> Value {
        json!({
            "nbformat": 4,
            "nbformat_minor": minor,
            "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3"}},
            "cells": [cell]
        })
    }

    fn test_cell() -> Value {
        json!({
            "cell_type": "code",
            "id": "test-cell-id",
            "execution_count": 1,
            "metadata": {"tags": ["a"]},
            "outputs": [],
            "source": ["print(\"hi\")"]
        })
    }

    #[test]
    fn test_read_reuses_id_at_4_5() {
        let ids = SequentialCellIds::default();
        let notebook = read_notebook_with(&single_cell_notebook(5, test_cell()), &ids).unwrap();

        let id = CellId::new("test-cell-id");
        assert_eq!(notebook.cell_order(), &[id.clone()]);
        match notebook.cell(&id).unwrap().as_ref() {
            Cell::Code(code) => {
                assert_eq!(code.id, id);
                assert_eq!(code.source, "print(\"hi\")");
                assert_eq!(code.execution_count, Some(1));
                assert_eq!(code.metadata.get("tags"), Some(&json!(["a"])));
                assert!(code.outputs.is_empty());
            }
            other => panic!("Expected code cell, got {:?}", other),
        }
        assert_eq!(ids.next_id().as_str(), "cell-0", "no id should have been generated");
    }

    #[test]
    fn test_read_ignores_id_before_4_5() {
        let ids = SequentialCellIds::default();
        let notebook = read_notebook_with(&single_cell_notebook(4, test_cell()), &ids).unwrap();
        assert_eq!(notebook.cell_order(), &[CellId::new("cell-0")]);
        assert!(!notebook.contains(&CellId::new("test-cell-id")));
    }

    #[test]
    fn test_read_generates_missing_id_at_4_5() {
        let mut cell = test_cell();
        cell.as_object_mut().unwrap().remove("id");
        let ids = SequentialCellIds::new("fresh-");
        let notebook = read_notebook_with(&single_cell_notebook(5, cell), &ids).unwrap();
        assert_eq!(notebook.cell_order(), &[CellId::new("fresh-0")]);
    }

    #[test]
    fn test_read_default_generator_gives_uuids() {
        let notebook = read_notebook(&single_cell_notebook(4, test_cell())).unwrap();
        let id = &notebook.cell_order()[0];
        assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_read_carries_metadata_and_version() {
        let notebook = read_notebook(&single_cell_notebook(5, test_cell())).unwrap();
        assert_eq!(notebook.version(), NotebookVersion::new(4, 5));
        assert_eq!(notebook.metadata()["kernelspec"]["name"], "python3");
    }

    #[test]
    fn test_read_rejects_bad_top_level() {
        for bad in [
            json!([]),
            json!("notebook"),
            json!({"nbformat": 4, "nbformat_minor": 5}),
            json!({"nbformat": 4, "nbformat_minor": 5, "cells": {}}),
        ] {
            let err = read_notebook(&bad).unwrap_err();
            assert!(
                matches!(err, NotebookError::InvalidFormat(_)),
                "expected format error for {}, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_read_rejects_non_string_id_at_4_5() {
        let mut cell = test_cell();
        cell["id"] = json!(7);
        let err = read_notebook(&single_cell_notebook(5, cell.clone())).unwrap_err();
        assert!(matches!(err, NotebookError::InvalidFormat(ref msg) if msg.contains("a number")));

        // before 4.5 the id is ignored whatever its shape
        let ids = SequentialCellIds::default();
        let notebook = read_notebook_with(&single_cell_notebook(4, cell), &ids).unwrap();
        assert_eq!(notebook.cell_order(), &[CellId::new("cell-0")]);
    }

    #[test]
    fn test_read_requires_minor_version() {
        let mut notebook = single_cell_notebook(5, test_cell());
        notebook.as_object_mut().unwrap().remove("nbformat_minor");
        let err = read_notebook(&notebook).unwrap_err();
        assert!(matches!(err, NotebookError::InvalidFormat(ref msg) if msg.contains("nbformat_minor")));

        notebook["nbformat_minor"] = json!("5");
        let err = read_notebook(&notebook).unwrap_err();
        assert!(matches!(err, NotebookError::InvalidFormat(_)));
    }

    #[test]
    fn test_caller_built_bundles_survive_write_then_read() {
        let ids = SequentialCellIds::default();
        let notebook = Notebook::from_cells(
            NotebookVersion::CURRENT,
            vec![
                MarkdownCell::new(&ids)
                    .with_attachment(
                        "a.json",
                        MediaBundle::new().with("application/json", "hello"),
                    )
                    .into(),
                CodeCell::new(&ids)
                    .with_outputs(vec![Output::from(DisplayData {
                        data: MediaBundle::new().with("text/plain", json!("a\nb")),
                        metadata: JsonMap::new(),
                    })])
                    .into(),
            ],
        )
        .unwrap();

        let written = write_notebook(&notebook).unwrap();
        assert_eq!(
            written["cells"][0]["attachments"]["a.json"]["application/json"],
            json!("hello")
        );
        assert_eq!(
            written["cells"][1]["outputs"][0]["data"]["text/plain"],
            json!(["a\n", "b"])
        );
        assert_eq!(read_notebook(&written).unwrap(), notebook);
    }

    #[test]
    fn test_read_rejects_other_major_versions() {
        let mut notebook = single_cell_notebook(0, test_cell());
        notebook["nbformat"] = json!(3);
        let err = read_notebook(&notebook).unwrap_err();
        assert!(matches!(err, NotebookError::UnsupportedVersion(3, 0)));
    }

    #[test]
    fn test_read_fails_atomically_on_bad_cell() {
        let notebook = json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                {"cell_type": "raw", "id": "ok", "metadata": {}, "source": "fine"},
                {"cell_type": "not_real", "id": "bad", "metadata": {}, "source": ""}
            ]
        });
        let err = read_notebook(&notebook).unwrap_err();
        assert!(matches!(err, NotebookError::UnknownCellType(ref t) if t == "not_real"));
    }

    #[test]
    fn test_read_rejects_duplicate_ids_at_4_5() {
        let notebook = json!({
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [
                {"cell_type": "raw", "id": "twin", "metadata": {}, "source": ""},
                {"cell_type": "raw", "id": "twin", "metadata": {}, "source": ""}
            ]
        });
        let err = read_notebook(&notebook).unwrap_err();
        assert!(matches!(err, NotebookError::DuplicateCellId(ref id) if id == "twin"));
    }

    #[test]
    fn test_write_gates_ids_on_version() {
        let ids = SequentialCellIds::default();
        let cells: Vec<Cell> = vec![
            CodeCell::new(&ids).into(),
            MarkdownCell::new(&ids).into(),
            RawCell::new(&ids).into(),
        ];

        let old = Notebook::from_cells(NotebookVersion::new(4, 4), cells.clone()).unwrap();
        let written = write_notebook(&old).unwrap();
        assert_eq!(written["nbformat_minor"], 4);
        for cell in written["cells"].as_array().unwrap() {
            assert!(cell.get("id").is_none(), "unexpected id in {}", cell);
        }

        let current = Notebook::from_cells(NotebookVersion::new(4, 5), cells).unwrap();
        let written = write_notebook(&current).unwrap();
        let written_ids: Vec<&str> = written["cells"]
            .as_array()
            .unwrap()
            .iter()
            .map(|cell| cell["id"].as_str().unwrap())
            .collect();
        assert_eq!(written_ids, vec!["cell-0", "cell-1", "cell-2"]);
    }

    #[test]
    fn test_write_follows_cell_order() {
        let ids = SequentialCellIds::default();
        let notebook = Notebook::from_cells(
            NotebookVersion::CURRENT,
            vec![
                RawCell::new(&ids).with_source("first").into(),
                RawCell::new(&ids).with_source("second").into(),
            ],
        )
        .unwrap();
        let moved = notebook.move_cell(&CellId::new("cell-1"), 0).unwrap();

        let written = write_notebook(&moved).unwrap();
        assert_eq!(written["cells"][0]["source"], json!(["second"]));
        assert_eq!(written["cells"][1]["source"], json!(["first"]));
    }

    #[test]
    fn test_stream_text_survives_write_byte_for_byte() {
        let text = "line1\r\nline2\rline3\nline4\n\n\r\n\r\r\n";
        let ids = SequentialCellIds::default();
        let notebook = Notebook::from_cells(
            NotebookVersion::CURRENT,
            vec![CodeCell::new(&ids)
                .with_outputs(vec![Output::stream("stdout", text)])
                .into()],
        )
        .unwrap();

        let written = write_notebook(&notebook).unwrap();
        assert_eq!(written["cells"][0]["outputs"][0]["text"], json!(text));
    }

    #[test]
    fn test_round_trip_preserves_every_cell_kind() {
        let ids = SequentialCellIds::default();
        let cells: Vec<Cell> = vec![
            CodeCell::new(&ids)
                .with_source("import sys\nprint(sys.version)\n")
                .with_execution_count(Some(2))
                .with_outputs(vec![
                    Output::stream("stdout", "3.12\n"),
                    Output::error("KeyError", "'x'", vec!["KeyError: 'x'".to_string()]),
                ])
                .into(),
            MarkdownCell::new(&ids)
                .with_source("## Notes\n\n![](attachment:plot.png)")
                .with_attachment("plot.png", MediaBundle::new().with("image/png", "AAAA\nBBBB\n"))
                .into(),
            RawCell::new(&ids).with_source("\\documentclass{article}").into(),
        ];
        let notebook = Notebook::from_cells(NotebookVersion::CURRENT, cells.clone()).unwrap();

        let reread = read_notebook(&write_notebook(&notebook).unwrap()).unwrap();
        assert_eq!(reread, notebook);
        for cell in &cells {
            assert_eq!(reread.cell(cell.id()).unwrap().as_ref(), cell);
        }
    }

    #[test]
    fn test_attachment_split_points_are_normalised() {
        let disk = single_cell_notebook(
            5,
            json!({
                "cell_type": "markdown",
                "id": "md",
                "metadata": {},
                "source": "",
                "attachments": {"notes.txt": {"text/plain": ["one", " line\ntw", "o\n"]}}
            }),
        );
        let notebook = read_notebook(&disk).unwrap();
        let Cell::Markdown(markdown) = notebook.cell(&CellId::new("md")).unwrap().as_ref() else {
            panic!("Expected markdown cell");
        };
        let attachments = markdown.attachments.as_ref().unwrap();
        assert_eq!(
            attachments["notes.txt"].get("text/plain"),
            Some(&MediaValue::Text("one line\ntwo\n".into()))
        );

        let written = write_notebook(&notebook).unwrap();
        let fragments = &written["cells"][0]["attachments"]["notes.txt"]["text/plain"];
        assert_eq!(fragments, &json!(["one line\n", "two\n"]));
    }
}
