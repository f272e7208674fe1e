//! One analysis pass over a snippet, with the front end's output classified.
//!
//! The runner is the only place that talks to the
//! [`AnalysisHost`] directly. It never decides what counts as a test
//! failure; it only keeps the three kinds of front-end output apart so the
//! assertion engine can: rule findings, compile errors in the snippet
//! itself, and the crash sentinel raised when the rule faults.

use rulekit_diagnostics::host::{AnalysisHost, AnalyzerOptions};
use rulekit_diagnostics::{Diagnostic, DiagnosticId};

/// The classified outcome of one analysis pass.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    rule_diagnostics: Vec<Diagnostic>,
    compile_errors: Vec<Diagnostic>,
    crash: Option<Diagnostic>,
}

impl RunResult {
    /// The findings the rule reported, crash sentinel excluded.
    pub fn rule_diagnostics(&self) -> &[Diagnostic] {
        &self.rule_diagnostics
    }

    pub fn into_rule_diagnostics(self) -> Vec<Diagnostic> {
        self.rule_diagnostics
    }

    /// Error-severity compile diagnostics for the snippet itself.
    pub fn compile_errors(&self) -> &[Diagnostic] {
        &self.compile_errors
    }

    /// The crash sentinel, if the rule faulted during analysis.
    pub fn crash(&self) -> Option<&Diagnostic> {
        self.crash.as_ref()
    }

    pub fn crashed(&self) -> bool {
        self.crash.is_some()
    }
}

/// Runs `rule` over `code` through `host` and classifies the output.
///
/// Stateless and side-effect free beyond invoking the front end: nothing is
/// cached, so the same inputs always produce the same classification and
/// the function is safe to call repeatedly with different rules and
/// snippets.
pub fn run<H: AnalysisHost>(
    host: &H,
    code: &str,
    rule: &H::Rule,
    options: &AnalyzerOptions,
) -> RunResult {
    let document = host.create_document(code);
    let Some(compilation) = host.compilation(&document) else {
        tracing::debug!("front end produced no compilation; reporting zero diagnostics");
        return RunResult::default();
    };

    let compile_errors: Vec<_> = host
        .compile_diagnostics(&compilation)
        .into_iter()
        .filter(|diagnostic| diagnostic.severity().is_error())
        .collect();

    let mut rule_diagnostics = Vec::new();
    let mut crash = None;
    for diagnostic in host.analyzer_diagnostics(&compilation, rule, options) {
        if diagnostic.id() == DiagnosticId::Panic {
            tracing::debug!(
                payload = diagnostic.message(),
                "rule raised the crash sentinel"
            );
            // Keep the first sentinel; repeats add nothing.
            crash.get_or_insert(diagnostic);
        } else {
            rule_diagnostics.push(diagnostic);
        }
    }

    tracing::trace!(
        rule_diagnostics = rule_diagnostics.len(),
        compile_errors = compile_errors.len(),
        crashed = crash.is_some(),
        "analysis pass classified"
    );

    RunResult {
        rule_diagnostics,
        compile_errors,
        crash,
    }
}

#[cfg(test)]
mod tests {
    use rulekit_diagnostics::host::AnalyzerOptions;
    use rulekit_diagnostics::testing::ScriptedHost;
    use rulekit_diagnostics::{Diagnostic, DiagnosticId, Severity};
    use rulekit_source_file::TextSpan;

    use crate::runner::run;

    #[test]
    fn classifies_rule_findings() {
        let host = ScriptedHost::new();
        let rule = ScriptedHost::rule(|_code, _options| {
            vec![Diagnostic::rule(
                "always-fires",
                Severity::Warning,
                "fired",
                TextSpan::new(0, 1),
            )]
        });

        let result = run(&host, "abc", &rule, &AnalyzerOptions::new());
        assert_eq!(result.rule_diagnostics().len(), 1);
        assert!(result.compile_errors().is_empty());
        assert!(!result.crashed());
    }

    #[test]
    fn absent_compilation_means_zero_diagnostics() {
        let host = ScriptedHost::new().without_compilation();
        let rule = ScriptedHost::rule(|_code, _options| panic!("never reached"));

        let result = run(&host, "abc", &rule, &AnalyzerOptions::new());
        assert!(result.rule_diagnostics().is_empty());
        assert!(result.compile_errors().is_empty());
        assert!(!result.crashed());
    }

    #[test]
    fn compile_errors_keep_their_own_bucket() {
        let host = ScriptedHost::new()
            .with_compile_error(Diagnostic::invalid_syntax(
                "unexpected token",
                TextSpan::new(0, 1),
            ))
            .with_compile_error(Diagnostic::new(
                DiagnosticId::InvalidSyntax,
                Severity::Warning,
                "deprecated syntax",
                TextSpan::new(2, 3),
            ));
        let rule = ScriptedHost::rule(|_code, _options| Vec::new());

        let result = run(&host, "abc", &rule, &AnalyzerOptions::new());
        // Only error severity counts as a compile error.
        assert_eq!(result.compile_errors().len(), 1);
        assert_eq!(result.compile_errors()[0].message(), "unexpected token");
        assert!(result.rule_diagnostics().is_empty());
    }

    #[test]
    fn crash_sentinel_is_extracted_from_findings() {
        let host = ScriptedHost::new();
        let rule = ScriptedHost::rule(|_code, _options| {
            vec![
                Diagnostic::rule("other", Severity::Warning, "real finding", TextSpan::new(0, 1)),
                Diagnostic::panic("index out of bounds"),
            ]
        });

        let result = run(&host, "abc", &rule, &AnalyzerOptions::new());
        assert!(result.crashed());
        assert_eq!(result.crash().unwrap().message(), "index out of bounds");
        // The sentinel never shows up as an ordinary finding.
        assert_eq!(result.rule_diagnostics().len(), 1);
        assert_eq!(result.rule_diagnostics()[0].message(), "real finding");
    }
}
