//! Text-editing component contract.
//!
//! The controller treats the editor as opaque: it can read and replace the
//! whole content and pick a syntax mode. Change notifications flow the other
//! way, through [`crate::files::FileBrowser::notify_changed`].

/// Syntax mode selected from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    PlainText,
    Json,
    Python,
}

impl EditorMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EditorMode::PlainText => "plain_text",
            EditorMode::Json => "json",
            EditorMode::Python => "python",
        }
    }

    /// Mode for a file name, by extension. Unmapped extensions (and names
    /// without one) are plain text.
    pub fn for_name(name: &str) -> Self {
        match file_ext(name) {
            Some("txt") => EditorMode::PlainText,
            Some("json") => EditorMode::Json,
            Some("py") => EditorMode::Python,
            _ => EditorMode::PlainText,
        }
    }
}

impl std::str::FromStr for EditorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain_text" | "text" => Ok(EditorMode::PlainText),
            "json" => Ok(EditorMode::Json),
            "python" => Ok(EditorMode::Python),
            other => Err(format!(
                "unknown mode '{other}' (expected plain_text, json or python)"
            )),
        }
    }
}

/// Text after the last `.` of the final path segment.
fn file_ext(name: &str) -> Option<&str> {
    let base = name.rsplit('/').next().unwrap_or(name);
    base.rfind('.').map(|idx| &base[idx + 1..])
}

/// The editing widget.
pub trait Editor {
    fn value(&self) -> String;
    fn set_value(&mut self, content: String);
    fn set_mode(&mut self, mode: EditorMode);
}

/// In-memory editor used by the terminal front-end.
#[derive(Debug, Default)]
pub struct TextBuffer {
    content: String,
    mode: EditorMode,
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.content
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }
}

impl Editor for TextBuffer {
    fn value(&self) -> String {
        self.content.clone()
    }

    fn set_value(&mut self, content: String) {
        self.content = content;
    }

    fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }
}
