//! Media bundles and the multiline string encoding.
//!
//! On disk, text content may be stored as an array of line fragments so that
//! line-oriented diffs stay readable. In memory it is always one string.
//! Structured (JSON) mimetypes are never split or joined, and anything this
//! module does not recognise is carried through untouched.

use std::collections::BTreeMap;
use std::fmt;

use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A text field as it appears on disk: one string, or its line fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MultilineText {
    Joined(String),
    Lines(Vec<String>),
}

impl From<&str> for MultilineText {
    fn from(s: &str) -> Self {
        MultilineText::Joined(s.to_string())
    }
}

impl From<String> for MultilineText {
    fn from(s: String) -> Self {
        MultilineText::Joined(s)
    }
}

impl From<Vec<String>> for MultilineText {
    fn from(lines: Vec<String>) -> Self {
        MultilineText::Lines(lines)
    }
}

impl<'de> Deserialize<'de> for MultilineText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct MultilineVisitor;

        impl<'de> serde::de::Visitor<'de> for MultilineVisitor {
            type Value = MultilineText;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or an array of strings")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(MultilineText::Joined(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(MultilineText::Joined(v))
            }

            fn visit_seq<A: serde::de::SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> Result<Self::Value, A::Error> {
                let mut lines = Vec::new();
                while let Some(line) = seq.next_element::<String>()? {
                    lines.push(line);
                }
                Ok(MultilineText::Lines(lines))
            }
        }

        deserializer.deserialize_any(MultilineVisitor)
    }
}

/// Flatten on-disk text into a single string.
///
/// Fragments are concatenated in order with no separator added.
pub fn demultiline(value: &MultilineText) -> String {
    match value {
        MultilineText::Joined(s) => s.clone(),
        MultilineText::Lines(lines) => lines.concat(),
    }
}

/// Split text into on-disk line fragments.
///
/// A sequence is returned as-is. A string is split immediately after every
/// `\n`, each fragment keeping its terminator, so `\r\n` stays whole and a
/// lone `\r` does not end a line. An unterminated tail becomes the last
/// fragment. The empty string yields no fragments.
pub fn remultiline(value: &MultilineText) -> Vec<String> {
    match value {
        MultilineText::Lines(lines) => lines.clone(),
        MultilineText::Joined(s) => split_lines(s),
    }
}

pub(crate) fn split_lines(s: &str) -> Vec<String> {
    s.split_inclusive('\n').map(str::to_string).collect()
}

/// Whether payloads of this mimetype are structured JSON rather than text.
pub fn is_json_mimetype(mimetype: &str) -> bool {
    mimetype == "application/json" || mimetype.ends_with("+json")
}

/// A single entry of a [`MediaBundle`].
#[derive(Debug, Clone, PartialEq)]
pub enum MediaValue {
    Text(String),
    Json(Value),
}

impl MediaValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MediaValue::Text(s) => Some(s),
            MediaValue::Json(_) => None,
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            MediaValue::Json(v) => Some(v),
            MediaValue::Text(_) => None,
        }
    }
}

impl From<&str> for MediaValue {
    fn from(s: &str) -> Self {
        MediaValue::Text(s.to_string())
    }
}

impl From<String> for MediaValue {
    fn from(s: String) -> Self {
        MediaValue::Text(s)
    }
}

impl From<Value> for MediaValue {
    fn from(v: Value) -> Self {
        MediaValue::Json(v)
    }
}

/// Mimetype → content for one output or attachment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaBundle(BTreeMap<String, MediaValue>);

impl MediaBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this bundle with `mimetype` set to `value`.
    ///
    /// The value is stored in the shape its mimetype dictates: JSON
    /// mimetypes always hold [`MediaValue::Json`], and text mimetypes given a
    /// string or an array of strings hold [`MediaValue::Text`].
    pub fn with(mut self, mimetype: impl Into<String>, value: impl Into<MediaValue>) -> Self {
        let mimetype = mimetype.into();
        let value = canonical_value(&mimetype, value.into());
        self.0.insert(mimetype, value);
        self
    }

    pub fn get(&self, mimetype: &str) -> Option<&MediaValue> {
        self.0.get(mimetype)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MediaValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build the in-memory bundle from its on-disk object.
    ///
    /// Text mimetypes holding a string or an array of strings are flattened.
    /// Everything else is kept as JSON exactly as found.
    pub fn from_on_disk(bundle: &serde_json::Map<String, Value>) -> Self {
        let entries = bundle
            .iter()
            .map(|(mimetype, value)| (mimetype.clone(), media_value_from_disk(mimetype, value)))
            .collect();
        Self(entries)
    }

    /// The on-disk object for this bundle.
    ///
    /// Text under a text mimetype is re-split into fragments. Payloads of JSON
    /// mimetypes are never split.
    pub fn to_on_disk(&self) -> serde_json::Map<String, Value> {
        self.0
            .iter()
            .map(|(mimetype, value)| {
                let value = match value {
                    MediaValue::Json(json) => json.clone(),
                    MediaValue::Text(text) if is_json_mimetype(mimetype) => {
                        Value::String(text.clone())
                    }
                    MediaValue::Text(text) => Value::Array(
                        split_lines(text).into_iter().map(Value::String).collect(),
                    ),
                };
                (mimetype.clone(), value)
            })
            .collect()
    }
}

impl FromIterator<(String, MediaValue)> for MediaBundle {
    fn from_iter<I: IntoIterator<Item = (String, MediaValue)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(mimetype, value)| {
                    let value = canonical_value(&mimetype, value);
                    (mimetype, value)
                })
                .collect(),
        )
    }
}

fn canonical_value(mimetype: &str, value: MediaValue) -> MediaValue {
    match value {
        MediaValue::Text(text) if is_json_mimetype(mimetype) => MediaValue::Json(Value::String(text)),
        MediaValue::Json(json) if !is_json_mimetype(mimetype) => media_value_from_disk(mimetype, &json),
        value => value,
    }
}

fn media_value_from_disk(mimetype: &str, value: &Value) -> MediaValue {
    if is_json_mimetype(mimetype) {
        return MediaValue::Json(value.clone());
    }
    match MultilineText::deserialize(value) {
        Ok(text) => MediaValue::Text(demultiline(&text)),
        Err(_) => {
            trace!("[media] keeping {} payload verbatim", mimetype);
            MediaValue::Json(value.clone())
        }
    }
}
