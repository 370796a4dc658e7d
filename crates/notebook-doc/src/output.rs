//! The four kinds of code cell output.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{NotebookError, Result};
use crate::json::{execution_count_field, execution_count_value, json_kind, object_field, JsonMap};
use crate::media::{demultiline, MediaBundle, MultilineText};

/// `output_type` tags matching nbformat
pub mod output_types {
    pub const EXECUTE_RESULT: &str = "execute_result";
    pub const DISPLAY_DATA: &str = "display_data";
    pub const STREAM: &str = "stream";
    pub const ERROR: &str = "error";
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteResult {
    pub execution_count: Option<i64>,
    pub data: MediaBundle,
    pub metadata: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayData {
    pub data: MediaBundle,
    pub metadata: JsonMap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorOutput {
    pub ename: String,
    pub evalue: String,
    #[serde(default)]
    pub traceback: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    ExecuteResult(ExecuteResult),
    DisplayData(DisplayData),
    /// Literal console output. `text` is never split into line fragments.
    Stream { name: String, text: String },
    Error(ErrorOutput),
}

#[derive(Deserialize)]
struct StreamFields {
    name: String,
    text: MultilineText,
}

impl Output {
    pub fn stream(name: impl Into<String>, text: impl Into<String>) -> Self {
        Output::Stream {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn error(
        ename: impl Into<String>,
        evalue: impl Into<String>,
        traceback: impl IntoIterator<Item = String>,
    ) -> Self {
        Output::Error(ErrorOutput {
            ename: ename.into(),
            evalue: evalue.into(),
            traceback: traceback.into_iter().collect(),
        })
    }

    pub fn output_type(&self) -> &'static str {
        match self {
            Output::ExecuteResult(_) => output_types::EXECUTE_RESULT,
            Output::DisplayData(_) => output_types::DISPLAY_DATA,
            Output::Stream { .. } => output_types::STREAM,
            Output::Error(_) => output_types::ERROR,
        }
    }

    /// Parse an on-disk output object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            NotebookError::InvalidFormat(format!(
                "output must be an object, found {}",
                json_kind(value)
            ))
        })?;
        let output_type = obj
            .get("output_type")
            .and_then(Value::as_str)
            .ok_or(NotebookError::MissingField("output_type"))?;

        match output_type {
            output_types::EXECUTE_RESULT => Ok(Output::ExecuteResult(ExecuteResult {
                execution_count: execution_count_field(obj)?,
                data: MediaBundle::from_on_disk(&object_field(obj, "data")?),
                metadata: object_field(obj, "metadata")?,
            })),
            output_types::DISPLAY_DATA => Ok(Output::DisplayData(DisplayData {
                data: MediaBundle::from_on_disk(&object_field(obj, "data")?),
                metadata: object_field(obj, "metadata")?,
            })),
            output_types::STREAM => {
                let fields = StreamFields::deserialize(value)?;
                Ok(Output::Stream {
                    name: fields.name,
                    text: demultiline(&fields.text),
                })
            }
            output_types::ERROR => Ok(Output::Error(ErrorOutput::deserialize(value)?)),
            other => Err(NotebookError::UnknownOutputType(other.to_string())),
        }
    }

    /// The on-disk object for this output, with only the fields its kind defines.
    pub fn to_json(&self) -> Value {
        match self {
            Output::ExecuteResult(result) => json!({
                "output_type": output_types::EXECUTE_RESULT,
                "execution_count": execution_count_value(result.execution_count),
                "data": result.data.to_on_disk(),
                "metadata": result.metadata,
            }),
            Output::DisplayData(display) => json!({
                "output_type": output_types::DISPLAY_DATA,
                "data": display.data.to_on_disk(),
                "metadata": display.metadata,
            }),
            Output::Stream { name, text } => json!({
                "output_type": output_types::STREAM,
                "name": name,
                "text": text,
            }),
            Output::Error(error) => json!({
                "output_type": output_types::ERROR,
                "ename": error.ename,
                "evalue": error.evalue,
                "traceback": error.traceback,
            }),
        }
    }
}

impl From<ExecuteResult> for Output {
    fn from(result: ExecuteResult) -> Self {
        Output::ExecuteResult(result)
    }
}

impl From<DisplayData> for Output {
    fn from(display: DisplayData) -> Self {
        Output::DisplayData(display)
    }
}

impl From<ErrorOutput> for Output {
    fn from(error: ErrorOutput) -> Self {
        Output::Error(error)
    }
}
