//! Line-classified text documents
//!
//! Emitters build a [`Document`] where every line is either an entity line or
//! an annotation line. Rendering without annotations simply skips the latter,
//! so entity lines are byte-identical with comments on or off.

/// Classification of an emitted line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Program structure or geometry
    Entity,
    /// Human-readable annotation
    Comment,
}

/// Ordered lines of one emitted artifact
#[derive(Debug, Clone, Default)]
pub struct Document {
    lines: Vec<(LineClass, String)>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entity line
    pub fn entity(&mut self, line: impl Into<String>) {
        self.lines.push((LineClass::Entity, line.into()));
    }

    /// Append an annotation line
    pub fn comment(&mut self, line: impl Into<String>) {
        self.lines.push((LineClass::Comment, line.into()));
    }

    /// Append `key=value`
    pub fn field(&mut self, key: &str, value: impl AsRef<str>) {
        self.entity(format!("{}={}", key, value.as_ref()));
    }

    /// Append `key="value"`
    pub fn quoted(&mut self, key: &str, value: impl AsRef<str>) {
        self.entity(format!("{}=\"{}\"", key, value.as_ref()));
    }

    /// Number of lines of either class
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether nothing has been emitted
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render to text with a trailing newline
    pub fn render(&self, include_comments: bool) -> String {
        let mut output = String::new();
        for (class, line) in &self.lines {
            if *class == LineClass::Comment && !include_comments {
                continue;
            }
            output.push_str(line);
            output.push('\n');
        }
        output
    }
}
