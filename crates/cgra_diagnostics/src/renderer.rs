//! Plain-text rendering of diagnostics.

use crate::diagnostic::Diagnostic;

/// Renders a diagnostic as plain text, one line per message plus one
/// indented line per footnote.
pub fn render(diag: &Diagnostic) -> String {
    let mut out = format!("{}: {}", diag.severity, diag.message);
    for note in &diag.notes {
        out.push_str(&format!("\n  note: {note}"));
    }
    out
}
