//! Diagnostics for the CGRA placement toolchain.
//!
//! Placement stages report progress and recoverable oddities (a cluster
//! that needed the free-space fallback, per-phase energy improvements)
//! as structured diagnostics rather than by writing to stdout. The
//! [`DiagnosticSink`] is thread-safe so parallel annealing chains can
//! emit concurrently; the CLI renders accumulated diagnostics at the end
//! of a run.

#![warn(missing_docs)]

mod diagnostic;
mod renderer;
mod severity;
mod sink;

pub use diagnostic::Diagnostic;
pub use renderer::render;
pub use severity::Severity;
pub use sink::DiagnosticSink;
