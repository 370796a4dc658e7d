/// How [`serialize_notebook_with`](crate::serialize_notebook_with) lays out JSON text.
///
/// The defaults reproduce the reference Python writer: one-space indent,
/// sorted keys and a trailing newline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    pub indent: usize,
    pub trailing_newline: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            indent: 1,
            trailing_newline: true,
        }
    }
}

impl SerializeOptions {
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_trailing_newline(mut self, trailing_newline: bool) -> Self {
        self.trailing_newline = trailing_newline;
        self
    }
}
