//! Test helpers: a scripted front end and tracing setup.
//!
//! [`ScriptedHost`] stands in for a real analysis front end. Its documents
//! and compilations are plain strings and its rules are ordinary functions
//! from source text to diagnostics, which makes it easy to script any
//! front-end behavior an assertion needs to observe: findings at chosen
//! spans, compile errors, a project that does not compile at all, or a rule
//! that panics mid-analysis.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

use crate::Diagnostic;
use crate::host::{AnalysisHost, AnalyzerOptions};

/// A rule for [`ScriptedHost`]: any function from the source text and the
/// analyzer options to a list of diagnostics.
pub type ScriptedRule = Box<dyn Fn(&str, &AnalyzerOptions) -> Vec<Diagnostic>>;

/// An in-memory [`AnalysisHost`] with scripted behavior.
#[derive(Default)]
pub struct ScriptedHost {
    compile_errors: Vec<Diagnostic>,
    never_compiles: bool,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Surfaces `diagnostic` as a compile-time diagnostic on every run.
    #[must_use]
    pub fn with_compile_error(mut self, diagnostic: Diagnostic) -> Self {
        self.compile_errors.push(diagnostic);
        self
    }

    /// Makes every compilation attempt fail, i.e.
    /// [`AnalysisHost::compilation`] returns `None`.
    #[must_use]
    pub fn without_compilation(mut self) -> Self {
        self.never_compiles = true;
        self
    }

    /// Boxes a closure into a [`ScriptedRule`].
    pub fn rule(
        rule: impl Fn(&str, &AnalyzerOptions) -> Vec<Diagnostic> + 'static,
    ) -> ScriptedRule {
        Box::new(rule)
    }
}

impl AnalysisHost for ScriptedHost {
    type Document = String;
    type Compilation = String;
    type Rule = ScriptedRule;

    fn create_document(&self, code: &str) -> String {
        code.to_owned()
    }

    fn compilation(&self, document: &String) -> Option<String> {
        if self.never_compiles {
            None
        } else {
            Some(document.clone())
        }
    }

    fn compile_diagnostics(&self, _compilation: &String) -> Vec<Diagnostic> {
        self.compile_errors.clone()
    }

    fn analyzer_diagnostics(
        &self,
        compilation: &String,
        rule: &ScriptedRule,
        options: &AnalyzerOptions,
    ) -> Vec<Diagnostic> {
        match catch_unwind(AssertUnwindSafe(|| rule(compilation, options))) {
            Ok(diagnostics) => diagnostics,
            Err(payload) => {
                // Mimic the default panic hook's rendering of a non-string
                // payload.
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|message| (*message).to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Box<dyn Any>".to_string());
                vec![Diagnostic::panic(message)]
            }
        }
    }
}

/// Sets up logging for the current thread, capturing all `rulekit` events.
///
/// Useful for capturing the tracing output in a failing test.
pub fn setup_logging() -> LoggingGuard {
    let filter = EnvFilter::default().add_directive(
        "rulekit=trace"
            .parse()
            .expect("hardcoded directive to be valid"),
    );

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr),
    );

    LoggingGuard {
        _guard: tracing::subscriber::set_default(subscriber),
    }
}

#[must_use = "dropping the guard unregisters the tracing subscriber"]
pub struct LoggingGuard {
    _guard: tracing::subscriber::DefaultGuard,
}

#[cfg(test)]
mod tests {
    use rulekit_source_file::TextSpan;

    use crate::host::{AnalysisHost, AnalyzerOptions};
    use crate::testing::ScriptedHost;
    use crate::{Diagnostic, DiagnosticId, Severity};

    #[test]
    fn scripted_rule_sees_the_source() {
        let host = ScriptedHost::new();
        let rule = ScriptedHost::rule(|code, _options| {
            vec![Diagnostic::rule(
                "snippet-length",
                Severity::Info,
                format!("{} bytes", code.len()),
                TextSpan::new(0, code.len() as u32),
            )]
        });

        let document = host.create_document("abc");
        let compilation = host.compilation(&document).unwrap();
        let diagnostics = host.analyzer_diagnostics(&compilation, &rule, &AnalyzerOptions::new());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message(), "3 bytes");
    }

    #[test]
    fn panicking_rule_becomes_the_crash_sentinel() {
        let host = ScriptedHost::new();
        let rule = ScriptedHost::rule(|_code, _options| panic!("rule exploded"));

        let document = host.create_document("abc");
        let compilation = host.compilation(&document).unwrap();
        let diagnostics = host.analyzer_diagnostics(&compilation, &rule, &AnalyzerOptions::new());

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id(), DiagnosticId::Panic);
        assert_eq!(diagnostics[0].message(), "rule exploded");
    }

    #[test]
    fn without_compilation_yields_none() {
        let host = ScriptedHost::new().without_compilation();
        let document = host.create_document("abc");
        assert!(host.compilation(&document).is_none());
    }
}
