//! The diagnostic data model shared between analysis front ends and the
//! assertion layer, plus the trait boundary a front end implements.
//!
//! A [`Diagnostic`] is immutable once produced: an identifier aligning it
//! with the rule that reported it, a severity, a human-readable message and
//! the span it points at. Front ends hand lists of them across the
//! [`host::AnalysisHost`] boundary; nothing downstream ever mutates one.

pub use crate::diagnostic::{Diagnostic, DiagnosticId, RuleName, Severity};

mod diagnostic;
pub mod host;
#[cfg(feature = "testing")]
pub mod testing;
