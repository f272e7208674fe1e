//! The boundary with the analysis front end.
//!
//! The assertion layer is front-end agnostic: it drives an implementation of
//! [`AnalysisHost`] and never looks inside documents, compilations or rules.
//! The host decides what those are; the only shared currency is source text
//! in and [`Diagnostic`]s out.

use camino::{Utf8Path, Utf8PathBuf};

use crate::Diagnostic;

/// A front end capable of analyzing a source snippet with a single rule.
///
/// The contract keeps the front end's two diagnostic buckets apart:
/// [`compile_diagnostics`](Self::compile_diagnostics) describes problems
/// with the input itself, [`analyzer_diagnostics`](Self::analyzer_diagnostics)
/// carries the rule's findings. Implementations must never mix the two.
pub trait AnalysisHost {
    /// A parsed unit of source text.
    type Document;

    /// A fully analyzed program, ready to run rules against.
    type Compilation;

    /// The front end's plugin contract for a single analysis rule.
    type Rule;

    /// Wraps source text into the unit the front end analyzes.
    fn create_document(&self, code: &str) -> Self::Document;

    /// Compiles `document`.
    ///
    /// Returns `None` when the project cannot be compiled at all. Callers
    /// treat that as "zero diagnostics", not as an error.
    fn compilation(&self, document: &Self::Document) -> Option<Self::Compilation>;

    /// Compile-time diagnostics for the document itself.
    fn compile_diagnostics(&self, compilation: &Self::Compilation) -> Vec<Diagnostic>;

    /// Runs `rule` to completion over `compilation` and returns its findings.
    ///
    /// A fault inside the rule must not propagate: the host reports it as a
    /// [`DiagnosticId::Panic`](crate::DiagnosticId::Panic) diagnostic in the
    /// returned list, where the runner picks it up as the crash sentinel.
    fn analyzer_diagnostics(
        &self,
        compilation: &Self::Compilation,
        rule: &Self::Rule,
        options: &AnalyzerOptions,
    ) -> Vec<Diagnostic>;
}

/// Per-run options handed through to the front end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalyzerOptions {
    additional_files: Vec<AdditionalFile>,
}

impl AnalyzerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an additional input file visible to the rule during analysis,
    /// e.g. a configuration file the rule reads.
    #[must_use]
    pub fn with_additional_file(
        mut self,
        path: impl Into<Utf8PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        self.additional_files
            .push(AdditionalFile::new(path, contents));
        self
    }

    pub fn additional_files(&self) -> &[AdditionalFile] {
        &self.additional_files
    }
}

/// An extra input file available to the rule during analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalFile {
    path: Utf8PathBuf,
    contents: String,
}

impl AdditionalFile {
    pub fn new(path: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}
