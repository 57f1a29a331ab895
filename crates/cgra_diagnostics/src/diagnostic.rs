//! Structured diagnostic messages.

use crate::severity::Severity;
use serde::{Deserialize, Serialize};

/// A structured diagnostic message with severity and optional footnotes.
///
/// Placement diagnostics have no source locations; the `message` names
/// the entity involved (cluster ID, block ID, position) directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The main diagnostic message.
    pub message: String,
    /// Explanatory footnotes (rendered as "note: ...").
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Creates a new note diagnostic.
    pub fn note(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Note,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Creates a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    /// Adds a footnote to this diagnostic.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_warning() {
        let diag = Diagnostic::warning("failed to de-overlap cluster 3");
        assert_eq!(diag.severity, Severity::Warning);
        assert_eq!(diag.message, "failed to de-overlap cluster 3");
        assert!(diag.notes.is_empty());
    }

    #[test]
    fn with_note_appends() {
        let diag = Diagnostic::note("placement done")
            .with_note("initial energy 120")
            .with_note("final energy 84");
        assert_eq!(diag.notes.len(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let diag = Diagnostic::error("no empty space left on the board");
        let json = serde_json::to_string(&diag).unwrap();
        let restored: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.severity, Severity::Error);
        assert_eq!(restored.message, diag.message);
    }
}
