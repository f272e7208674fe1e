//! The assertion engine.
//!
//! [`AnalyzerFixture`] owns everything one assertion needs: the front end,
//! a factory producing a fresh rule per call, the analyzer options and the
//! compile-error toggle. Each `expect_*` call is a single run–filter–assert
//! transaction; no state survives between calls.

use std::fmt;

use rulekit_diagnostics::host::{AnalysisHost, AnalyzerOptions};
use rulekit_diagnostics::{Diagnostic, Severity};
use rulekit_source_file::{LineColumn, LineIndex, Spanned, TextSpan};

use crate::locator::{LineLocator, Locator, LocatorError};
use crate::markup::{CodeMarkup, MarkupError};
use crate::runner;

type RuleFactory<H> = Box<dyn Fn() -> <H as AnalysisHost>::Rule>;

/// A test fixture asserting on the diagnostics a single rule reports.
///
/// The rule is constructed through a factory on every assertion, so rules
/// cannot leak state from one call into the next even if they are mutable
/// internally. The fixture itself holds no results; two calls with the same
/// snippet always perform two independent analysis passes.
pub struct AnalyzerFixture<H: AnalysisHost> {
    host: H,
    create_rule: RuleFactory<H>,
    options: AnalyzerOptions,
    error_on_compile_error: bool,
}

impl<H: AnalysisHost> AnalyzerFixture<H> {
    /// Creates a fixture running rules built by `create_rule` through
    /// `host`.
    ///
    /// By default a snippet that itself fails to compile fails the
    /// assertion with [`Failure::UnexpectedCompileError`]; see
    /// [`tolerate_compile_errors`](Self::tolerate_compile_errors).
    pub fn new(host: H, create_rule: impl Fn() -> H::Rule + 'static) -> Self {
        Self {
            host,
            create_rule: Box::new(create_rule),
            options: AnalyzerOptions::new(),
            error_on_compile_error: true,
        }
    }

    /// Makes an additional input file visible to the rule during analysis.
    #[must_use]
    pub fn with_additional_file(
        mut self,
        path: impl Into<camino::Utf8PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        self.options = self.options.with_additional_file(path, contents);
        self
    }

    /// Accepts snippets that do not compile.
    ///
    /// The default treats compile errors in the input as fatal, so a broken
    /// test snippet cannot masquerade as "the rule reported nothing".
    #[must_use]
    pub fn tolerate_compile_errors(mut self) -> Self {
        self.error_on_compile_error = false;
        self
    }

    /// Asserts that the rule does not fault while analyzing `code`.
    pub fn expect_no_exception(&self, code: &str) -> Result<(), Failure> {
        self.rule_diagnostics(code).map(drop)
    }

    /// Asserts that no diagnostic with identifier `id` is reported anywhere
    /// in `code`.
    pub fn expect_no_diagnostic(&self, code: &str, id: &str) -> Result<(), Failure> {
        self.no_diagnostic_impl(code, &[id], None)
    }

    /// Asserts that none of the identifiers in `ids` is reported anywhere
    /// in `code`.
    pub fn expect_no_diagnostics(&self, code: &str, ids: &[&str]) -> Result<(), Failure> {
        self.no_diagnostic_impl(code, ids, None)
    }

    /// Asserts that `id` is not reported on the 1-based line `line_number`.
    pub fn expect_no_diagnostic_at_line(
        &self,
        code: &str,
        id: &str,
        line_number: usize,
    ) -> Result<(), Failure> {
        let locator = LineLocator::from_code(code, line_number)?;
        self.no_diagnostic_impl(code, &[id], Some(&[locator.into()]))
    }

    /// Asserts that `id` is not reported at the marker annotated in
    /// `markup`.
    pub fn expect_no_diagnostic_at_marker(&self, markup: &str, id: &str) -> Result<(), Failure> {
        let markup = CodeMarkup::parse(markup)?;
        let locator = markup.locator()?;
        self.no_diagnostic_impl(markup.code(), &[id], Some(&[locator]))
    }

    /// Asserts that `id` is not reported at any of the markers annotated in
    /// `markup`.
    pub fn expect_no_diagnostic_at_all_markers(
        &self,
        markup: &str,
        id: &str,
    ) -> Result<(), Failure> {
        let markup = CodeMarkup::parse(markup)?;
        let locators = markup.all_locators();
        if locators.is_empty() {
            return Err(MarkupError::NoMarkers.into());
        }
        self.no_diagnostic_impl(markup.code(), &[id], Some(&locators))
    }

    /// Asserts that none of `ids` is reported at a location matching any of
    /// `locators`.
    pub fn expect_no_diagnostic_matching(
        &self,
        code: &str,
        ids: &[&str],
        locators: &[Locator],
    ) -> Result<(), Failure> {
        self.no_diagnostic_impl(code, ids, Some(locators))
    }

    /// Asserts that `id` is reported at the marker annotated in `markup`.
    ///
    /// The markup must contain exactly one marker group; markers sharing a
    /// name count as one group matching at any of its spans.
    pub fn expect_diagnostic(&self, markup: &str, id: &str) -> Result<(), Failure> {
        let markup = CodeMarkup::parse(markup)?;
        let locator = markup.locator()?;
        self.has_diagnostic_impl(markup.code(), id, &[locator])
    }

    /// Asserts that `id` is reported on the 1-based line `line_number`.
    pub fn expect_diagnostic_at_line(
        &self,
        code: &str,
        id: &str,
        line_number: usize,
    ) -> Result<(), Failure> {
        let locator = LineLocator::from_code(code, line_number)?;
        self.has_diagnostic_impl(code, id, &[locator.into()])
    }

    /// Asserts that `id` is reported within `span`.
    pub fn expect_diagnostic_at_span(
        &self,
        code: &str,
        id: &str,
        span: TextSpan,
    ) -> Result<(), Failure> {
        self.has_diagnostic_impl(code, id, &[Locator::span(span)])
    }

    /// Asserts that `id` is reported at a location matching `locator`.
    pub fn expect_diagnostic_at(
        &self,
        code: &str,
        id: &str,
        locator: Locator,
    ) -> Result<(), Failure> {
        self.has_diagnostic_impl(code, id, &[locator])
    }

    /// Asserts that `id` is reported at *every* marker annotated in
    /// `markup`, independently.
    ///
    /// Stops at the first marker lacking the diagnostic; the failure names
    /// that marker and lists what was found there instead.
    pub fn expect_diagnostic_at_all_markers(&self, markup: &str, id: &str) -> Result<(), Failure> {
        let markup = CodeMarkup::parse(markup)?;
        let locators = markup.all_locators();
        if locators.is_empty() {
            return Err(MarkupError::NoMarkers.into());
        }
        self.has_diagnostic_impl(markup.code(), id, &locators)
    }

    fn no_diagnostic_impl(
        &self,
        code: &str,
        ids: &[&str],
        locators: Option<&[Locator]>,
    ) -> Result<(), Failure> {
        let diagnostics = self.rule_diagnostics(code)?;

        let offending: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter(|diagnostic| match locators {
                Some(locators) => locators
                    .iter()
                    .any(|locator| locator.matches(diagnostic.span())),
                None => true,
            })
            .filter(|diagnostic| ids.contains(&diagnostic.id().as_str()))
            .collect();

        if offending.is_empty() {
            Ok(())
        } else {
            Err(Failure::unexpected_diagnostic(code, &offending))
        }
    }

    fn has_diagnostic_impl(
        &self,
        code: &str,
        id: &str,
        locators: &[Locator],
    ) -> Result<(), Failure> {
        let diagnostics = self.rule_diagnostics(code)?;

        for locator in locators {
            let found: Vec<&Diagnostic> = diagnostics
                .iter()
                .filter(|diagnostic| locator.matches(diagnostic.span()))
                .collect();

            if !found
                .iter()
                .any(|diagnostic| diagnostic.id().as_str() == id)
            {
                return Err(Failure::diagnostic_not_found(
                    code,
                    id,
                    locator.clone(),
                    &found,
                ));
            }
        }
        Ok(())
    }

    /// Runs one analysis pass and surfaces front-end trouble before any
    /// rule diagnostic is considered.
    fn rule_diagnostics(&self, code: &str) -> Result<Vec<Diagnostic>, Failure> {
        let rule = (self.create_rule)();
        let result = runner::run(&self.host, code, &rule, &self.options);

        if self.error_on_compile_error && !result.compile_errors().is_empty() {
            return Err(Failure::unexpected_compile_error(
                code,
                result.compile_errors(),
            ));
        }
        if let Some(crash) = result.crash() {
            return Err(Failure::analyzer_crashed(code, crash));
        }

        Ok(result.into_rule_diagnostics())
    }
}

/// A violated expectation, carrying enough structured data to produce a
/// human-readable report.
///
/// Every variant is raised out of the assertion call that observed it;
/// nothing is retried — one analysis pass is deterministic for a given
/// snippet and rule, so a retry could never change the outcome.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    /// The rule under test faulted during analysis. Always fatal, whatever
    /// the assertion was.
    #[error("the rule under test raised an unhandled fault during analysis: {}", .diagnostic.message())]
    AnalyzerCrashed { diagnostic: ReportedDiagnostic },

    /// The input snippet itself does not compile and the fixture treats
    /// that as fatal (the default).
    #[error("the input snippet does not compile:\n{}", render_list(.errors))]
    UnexpectedCompileError { errors: Vec<ReportedDiagnostic> },

    /// A forbidden identifier was reported, optionally at a forbidden
    /// location.
    #[error("unexpected diagnostics reported:\n{}", render_list(.diagnostics))]
    UnexpectedDiagnostic { diagnostics: Vec<ReportedDiagnostic> },

    /// An expected identifier was absent at the required location. `found`
    /// lists every diagnostic that *was* reported there, distinguishing
    /// "nothing fired" from "something else fired".
    #[error("expected diagnostic `{id}` at {location}, {}", render_found(.found))]
    DiagnosticNotFound {
        id: String,
        location: Locator,
        found: Vec<ReportedDiagnostic>,
    },

    /// The test's markup is malformed.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// The test's location description is invalid.
    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl Failure {
    fn analyzer_crashed(code: &str, crash: &Diagnostic) -> Self {
        let index = LineIndex::from_source_text(code);
        Failure::AnalyzerCrashed {
            diagnostic: ReportedDiagnostic::new(code, &index, crash),
        }
    }

    fn unexpected_compile_error(code: &str, errors: &[Diagnostic]) -> Self {
        let index = LineIndex::from_source_text(code);
        Failure::UnexpectedCompileError {
            errors: errors
                .iter()
                .map(|error| ReportedDiagnostic::new(code, &index, error))
                .collect(),
        }
    }

    fn unexpected_diagnostic(code: &str, diagnostics: &[Diagnostic]) -> Self {
        let index = LineIndex::from_source_text(code);
        Failure::UnexpectedDiagnostic {
            diagnostics: diagnostics
                .iter()
                .map(|diagnostic| ReportedDiagnostic::new(code, &index, diagnostic))
                .collect(),
        }
    }

    fn diagnostic_not_found(code: &str, id: &str, location: Locator, found: &[&Diagnostic]) -> Self {
        let index = LineIndex::from_source_text(code);
        Failure::DiagnosticNotFound {
            id: id.to_string(),
            location,
            found: found
                .iter()
                .map(|diagnostic| ReportedDiagnostic::new(code, &index, diagnostic))
                .collect(),
        }
    }
}

/// A diagnostic as recorded in a [`Failure`] payload: the identifying data
/// plus the resolved line:column, so reports stay readable without the
/// snippet at hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedDiagnostic {
    id: String,
    severity: Severity,
    span: TextSpan,
    location: LineColumn,
    message: String,
}

impl ReportedDiagnostic {
    fn new(code: &str, index: &LineIndex, diagnostic: &Diagnostic) -> Self {
        Self {
            id: diagnostic.id().as_str().to_string(),
            severity: diagnostic.severity(),
            span: diagnostic.span(),
            location: index.line_column(diagnostic.span().start(), code),
            message: diagnostic.message().to_string(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn location(&self) -> LineColumn {
        self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Spanned for ReportedDiagnostic {
    fn span(&self) -> TextSpan {
        self.span
    }
}

impl fmt::Display for ReportedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{severity}[{id}] {location} ({span}): {message}",
            severity = self.severity,
            id = self.id,
            location = self.location,
            span = self.span,
            message = self.message
        )
    }
}

fn render_list(diagnostics: &[ReportedDiagnostic]) -> String {
    let lines: Vec<String> = diagnostics
        .iter()
        .map(|diagnostic| format!("  {diagnostic}"))
        .collect();
    lines.join("\n")
}

fn render_found(found: &[ReportedDiagnostic]) -> String {
    if found.is_empty() {
        "found no diagnostics at that location".to_string()
    } else {
        format!("found only:\n{}", render_list(found))
    }
}
